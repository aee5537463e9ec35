//! PathCORE-T demo server
//!
//! Serves a pathway co-occurrence network built from unsupervised models of a
//! gene expression compendium. Users open an edge of the network to see the
//! samples that most and least express the edge genes, drill into a single
//! experiment, and export the heatmap values as CSV.
//!
//! # Layout
//!
//! - [`model`]: documents of the six backing collections
//! - [`store`]: in-memory and RocksDB backends plus the dataset loader
//! - [`report`]: reshaping of documents into page data and CSV rows
//! - [`session`]: server-side cache of the edge a browser is viewing
//! - [`http`]: axum router, pages, download and JSON API
//!
//! ## Example Usage
//!
//! ```rust
//! use pathcore::model::EdgeName;
//! use pathcore::report::{edge_view, EdgeView};
//! use pathcore::store::{Dataset, MemoryStore};
//!
//! let store = MemoryStore::from_dataset(Dataset::new());
//! let edge = EdgeName::parse("PAO1 Glycolysis&PAO1 Biofilm").unwrap();
//! assert_eq!(edge.lookup_names().0, "PA01 Glycolysis");
//! assert!(edge_view(&store, &edge).is_err());
//! ```

#![allow(missing_docs)]
#![warn(clippy::all)]

pub mod config;
pub mod http;
pub mod model;
pub mod network;
pub mod report;
pub mod session;
pub mod store;

// Re-export main types for convenience
pub use config::{ConfigError, ServerConfig};

pub use http::{build_router, AppError, AppState, HttpServer};

pub use model::{EdgeData, EdgeName, EdgeSide, Gene, Pathway, PathwayId, SampleAnnotation};

pub use report::{ReportError, ReportResult};

pub use session::{Session, SessionId, SessionStore};

pub use store::{
    load_dataset, Dataset, LoadError, MemoryStore, PathcoreStore, PersistentStore, StoreError,
    StoreResult, StoreStatistics,
};

/// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Get version string
pub fn version() -> &'static str {
    VERSION
}
