//! In-memory backend
//!
//! Uses hash maps for O(1) lookups over vectors that keep load order:
//! - edges: (pw0, pw1) -> EdgeData
//! - cel_index: CEL file -> annotation position
//! - experiment_index: experiment -> annotation positions
//! - gene_index / alias_index: name / common name -> gene position

use super::{Dataset, PathcoreStore, StoreResult, StoreStatistics};
use crate::model::{
    EdgeData, EdgeSide, Gene, NetworkEdge, NetworkNode, Pathway, PathwayId, SampleAnnotation,
};
use std::collections::{HashMap, HashSet};
use tracing::info;

#[derive(Debug, Default)]
pub struct MemoryStore {
    pathways: HashMap<String, Pathway>,
    genes: Vec<Gene>,
    gene_index: HashMap<String, usize>,
    alias_index: HashMap<String, usize>,
    annotations: Vec<SampleAnnotation>,
    cel_index: HashMap<String, usize>,
    experiment_index: HashMap<String, Vec<usize>>,
    edges: HashMap<(String, String), EdgeData>,
    network_edges: HashMap<(PathwayId, PathwayId), Vec<NetworkEdge>>,
    network_nodes: HashMap<u32, Vec<NetworkNode>>,
}

impl MemoryStore {
    /// Index a dataset. When two documents share a lookup key the first one
    /// wins.
    pub fn from_dataset(dataset: Dataset) -> Self {
        let mut store = Self::default();

        for pathway in dataset.pathways {
            store
                .pathways
                .entry(pathway.pathway.clone())
                .or_insert(pathway);
        }

        for (position, gene) in dataset.genes.into_iter().enumerate() {
            store.gene_index.entry(gene.gene.clone()).or_insert(position);
            if let Some(common_name) = &gene.common_name {
                store.alias_index.entry(common_name.clone()).or_insert(position);
            }
            store.genes.push(gene);
        }

        for (position, annotation) in dataset.sample_annotations.into_iter().enumerate() {
            if let Some(cel_file) = annotation.cel_file() {
                store.cel_index.entry(cel_file.to_string()).or_insert(position);
            }
            if let Some(experiment) = annotation.experiment() {
                store
                    .experiment_index
                    .entry(experiment.to_string())
                    .or_default()
                    .push(position);
            }
            store.annotations.push(annotation);
        }

        for edge in dataset.edge_data {
            store.edges.entry(edge.edge.clone()).or_insert(edge);
        }

        for network_edge in dataset.network_edges {
            store
                .network_edges
                .entry(network_edge.edge)
                .or_default()
                .push(network_edge);
        }

        let mut seen_nodes = HashSet::new();
        for node in dataset.network_nodes {
            if seen_nodes.insert((node.network, node.node)) {
                store.network_nodes.entry(node.network).or_default().push(node);
            }
        }

        info!(
            "Memory store ready: {} edges, {} genes, {} annotations",
            store.edges.len(),
            store.genes.len(),
            store.annotations.len()
        );
        store
    }
}

impl PathcoreStore for MemoryStore {
    fn find_edge(&self, pw0: &str, pw1: &str) -> StoreResult<Option<EdgeData>> {
        Ok(self.edges.get(&(pw0.to_string(), pw1.to_string())).cloned())
    }

    fn find_annotation(&self, cel_file: &str) -> StoreResult<Option<SampleAnnotation>> {
        Ok(self
            .cel_index
            .get(cel_file)
            .map(|&position| self.annotations[position].clone()))
    }

    fn find_annotations_by_experiment(
        &self,
        experiment: &str,
    ) -> StoreResult<Vec<SampleAnnotation>> {
        Ok(self
            .experiment_index
            .get(experiment)
            .map(|positions| {
                positions
                    .iter()
                    .map(|&position| self.annotations[position].clone())
                    .collect()
            })
            .unwrap_or_default())
    }

    fn find_gene(&self, name: &str) -> StoreResult<Option<Gene>> {
        let position = self
            .gene_index
            .get(name)
            .or_else(|| self.alias_index.get(name));
        Ok(position.map(|&p| self.genes[p].clone()))
    }

    fn find_pathway(&self, name: &str) -> StoreResult<Option<Pathway>> {
        Ok(self.pathways.get(name).cloned())
    }

    fn find_network_edges(
        &self,
        pw0: PathwayId,
        pw1: PathwayId,
        side: Option<EdgeSide>,
    ) -> StoreResult<Vec<NetworkEdge>> {
        Ok(self
            .network_edges
            .get(&(pw0, pw1))
            .map(|edges| {
                edges
                    .iter()
                    .filter(|e| side.map_or(true, |s| e.side == s))
                    .cloned()
                    .collect()
            })
            .unwrap_or_default())
    }

    fn find_network_nodes(&self, network: u32) -> StoreResult<Vec<NetworkNode>> {
        Ok(self.network_nodes.get(&network).cloned().unwrap_or_default())
    }

    fn statistics(&self) -> StoreResult<StoreStatistics> {
        Ok(StoreStatistics {
            pathways: self.pathways.len(),
            genes: self.gene_index.len(),
            sample_annotations: self.annotations.len(),
            pathcore_edge_data: self.edges.len(),
            network_edges: self.network_edges.values().map(Vec::len).sum(),
            network_nodes: self.network_nodes.values().map(Vec::len).sum(),
        })
    }
}
