//! Document model for the PathCORE-T demo collections
//!
//! The demo server reads six collections:
//! - `pathways`: pathway names with a stable id
//! - `genes`: expression vectors over the compendium samples
//! - `sample_annotations`: free-form metadata keyed by CEL file
//! - `pathcore_edge_data`: precomputed heatmaps for each network edge
//! - `network_edges` / `network_nodes`: per-model network structure

pub mod documents;
pub mod edge_name;
pub mod types;

pub use documents::{
    EdgeData, Gene, HeatmapCell, HeatmapKind, NetworkEdge, NetworkNode, Pathway,
    SampleAnnotation,
};
pub use edge_name::{EdgeName, EdgeNameError};
pub use types::{EdgeSide, GeneId, PathwayId};
