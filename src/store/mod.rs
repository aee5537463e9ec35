//! Storage layer for the demo collections
//!
//! Two backends implement [`PathcoreStore`]:
//! - [`MemoryStore`]: hash-indexed collections built from a [`Dataset`]
//! - [`PersistentStore`]: RocksDB with one column family per collection
//!
//! Lookups mirror the queries the page handlers issue: one edge document by
//! its ordered pathway pair, annotations by CEL file or experiment, genes by
//! name or common name.

pub mod loader;
pub mod memory;
pub mod storage;

pub use loader::{load_dataset, LoadError, LoadResult};
pub use memory::MemoryStore;
pub use storage::PersistentStore;

use crate::model::{
    EdgeData, EdgeSide, Gene, NetworkEdge, NetworkNode, Pathway, PathwayId, SampleAnnotation,
};
use serde::Serialize;
use thiserror::Error;

/// Storage errors
#[derive(Error, Debug)]
pub enum StoreError {
    /// RocksDB error
    #[error("RocksDB error: {0}")]
    RocksDb(#[from] rocksdb::Error),

    /// Document encoding error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Column family missing from an opened database
    #[error("Column family error: {0}")]
    ColumnFamily(String),
}

pub type StoreResult<T> = Result<T, StoreError>;

/// Document counts per collection
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct StoreStatistics {
    pub pathways: usize,
    pub genes: usize,
    pub sample_annotations: usize,
    pub pathcore_edge_data: usize,
    pub network_edges: usize,
    pub network_nodes: usize,
}

/// Read access to the demo collections
pub trait PathcoreStore: Send + Sync {
    /// Edge document whose `edge` field equals `[pw0, pw1]` (order matters)
    fn find_edge(&self, pw0: &str, pw1: &str) -> StoreResult<Option<EdgeData>>;

    /// Annotation whose `CEL file` equals `cel_file`
    fn find_annotation(&self, cel_file: &str) -> StoreResult<Option<SampleAnnotation>>;

    /// All annotations of an experiment, in load order
    fn find_annotations_by_experiment(
        &self,
        experiment: &str,
    ) -> StoreResult<Vec<SampleAnnotation>>;

    /// Gene by systematic name, falling back to its common name
    fn find_gene(&self, name: &str) -> StoreResult<Option<Gene>>;

    fn find_pathway(&self, name: &str) -> StoreResult<Option<Pathway>>;

    /// Network edges stored for exactly `(pw0, pw1)`, optionally of one side
    fn find_network_edges(
        &self,
        pw0: PathwayId,
        pw1: PathwayId,
        side: Option<EdgeSide>,
    ) -> StoreResult<Vec<NetworkEdge>>;

    /// All nodes of one model's network
    fn find_network_nodes(&self, network: u32) -> StoreResult<Vec<NetworkNode>>;

    fn statistics(&self) -> StoreResult<StoreStatistics>;
}

/// Every collection, fully materialised.
///
/// Produced by the dataset loader and consumed by both backends.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Dataset {
    pub pathways: Vec<Pathway>,
    pub genes: Vec<Gene>,
    pub sample_annotations: Vec<SampleAnnotation>,
    pub edge_data: Vec<EdgeData>,
    pub network_edges: Vec<NetworkEdge>,
    pub network_nodes: Vec<NetworkNode>,
}

impl Dataset {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn statistics(&self) -> StoreStatistics {
        StoreStatistics {
            pathways: self.pathways.len(),
            genes: self.genes.len(),
            sample_annotations: self.sample_annotations.len(),
            pathcore_edge_data: self.edge_data.len(),
            network_edges: self.network_edges.len(),
            network_nodes: self.network_nodes.len(),
        }
    }
}
