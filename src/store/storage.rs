//! RocksDB backend
//!
//! Each collection lives in its own column family; documents are stored as
//! JSON so free-form annotation fields survive unchanged. Secondary lookups
//! go through small index column families.

use super::{Dataset, PathcoreStore, StoreError, StoreResult, StoreStatistics};
use crate::model::{
    EdgeData, EdgeSide, Gene, NetworkEdge, NetworkNode, Pathway, PathwayId, SampleAnnotation,
};
use rocksdb::{ColumnFamilyDescriptor, IteratorMode, Options, WriteBatch, DB};
use serde::de::DeserializeOwned;
use std::collections::HashSet;
use std::path::Path;
use std::sync::Arc;
use tracing::{debug, info};

const CF_PATHWAYS: &str = "pathways";
const CF_GENES: &str = "genes";
const CF_GENE_ALIASES: &str = "gene_aliases";
const CF_ANNOTATIONS: &str = "sample_annotations";
const CF_CEL_FILES: &str = "cel_files";
const CF_EXPERIMENT_SAMPLES: &str = "experiment_samples";
const CF_EDGE_DATA: &str = "pathcore_edge_data";
const CF_NETWORK_EDGES: &str = "network_edges";
const CF_NETWORK_NODES: &str = "network_nodes";

const COLUMN_FAMILIES: [&str; 9] = [
    CF_PATHWAYS,
    CF_GENES,
    CF_GENE_ALIASES,
    CF_ANNOTATIONS,
    CF_CEL_FILES,
    CF_EXPERIMENT_SAMPLES,
    CF_EDGE_DATA,
    CF_NETWORK_EDGES,
    CF_NETWORK_NODES,
];

/// Separator between key components that may contain arbitrary text
const KEY_SEP: char = '\u{1f}';

/// RocksDB-based persistent store
pub struct PersistentStore {
    db: Arc<DB>,
    path: String,
}

impl PersistentStore {
    /// Open or create a store
    pub fn open(path: impl AsRef<Path>) -> StoreResult<Self> {
        let path_str = path.as_ref().to_string_lossy().into_owned();

        info!("Opening persistent store at: {}", path_str);

        let mut opts = Options::default();
        opts.create_if_missing(true);
        opts.create_missing_column_families(true);
        opts.set_compression_type(rocksdb::DBCompressionType::Lz4);
        opts.set_wal_recovery_mode(rocksdb::DBRecoveryMode::PointInTime);

        let mut cf_descriptors = vec![ColumnFamilyDescriptor::new("default", Options::default())];
        for name in COLUMN_FAMILIES {
            cf_descriptors.push(ColumnFamilyDescriptor::new(name, Self::collection_cf_options()));
        }

        let db = DB::open_cf_descriptors(&opts, &path_str, cf_descriptors)?;

        info!("Persistent store opened successfully");

        Ok(Self {
            db: Arc::new(db),
            path: path_str,
        })
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    fn collection_cf_options() -> Options {
        let mut opts = Options::default();
        // Expression vectors compress well; annotation text even more so.
        opts.set_compression_type(rocksdb::DBCompressionType::Zstd);
        opts
    }

    /// Replace the stored collections with a dataset, in one batch.
    ///
    /// Whatever an earlier import left behind is deleted first. As in the
    /// memory backend, the first document wins when two share a lookup key.
    pub fn import(&self, dataset: &Dataset) -> StoreResult<StoreStatistics> {
        let mut batch = WriteBatch::default();
        for name in COLUMN_FAMILIES {
            self.clear_cf(&mut batch, name)?;
        }
        let mut seen: HashSet<(&str, Vec<u8>)> = HashSet::new();

        let cf = self.cf(CF_PATHWAYS)?;
        for pathway in &dataset.pathways {
            let key = pathway.pathway.as_bytes().to_vec();
            if seen.insert((CF_PATHWAYS, key.clone())) {
                batch.put_cf(&cf, key, serde_json::to_vec(pathway)?);
            }
        }

        let cf = self.cf(CF_GENES)?;
        let aliases = self.cf(CF_GENE_ALIASES)?;
        for gene in &dataset.genes {
            let key = gene.gene.as_bytes().to_vec();
            if seen.insert((CF_GENES, key.clone())) {
                batch.put_cf(&cf, key, serde_json::to_vec(gene)?);
            }
            if let Some(common_name) = &gene.common_name {
                let alias = common_name.as_bytes().to_vec();
                if seen.insert((CF_GENE_ALIASES, alias.clone())) {
                    batch.put_cf(&aliases, alias, gene.gene.as_bytes());
                }
            }
        }

        let cf = self.cf(CF_ANNOTATIONS)?;
        let cel_files = self.cf(CF_CEL_FILES)?;
        let experiments = self.cf(CF_EXPERIMENT_SAMPLES)?;
        for (seq, annotation) in dataset.sample_annotations.iter().enumerate() {
            let key = Self::seq_key(seq as u64);
            batch.put_cf(&cf, &key, serde_json::to_vec(annotation)?);
            if let Some(cel_file) = annotation.cel_file() {
                if seen.insert((CF_CEL_FILES, cel_file.as_bytes().to_vec())) {
                    batch.put_cf(&cel_files, cel_file.as_bytes(), &key);
                }
            }
            if let Some(experiment) = annotation.experiment() {
                batch.put_cf(&experiments, Self::experiment_key(experiment, seq as u64), &key);
            }
        }

        let cf = self.cf(CF_EDGE_DATA)?;
        for edge in &dataset.edge_data {
            let key = Self::edge_key(&edge.edge.0, &edge.edge.1);
            if seen.insert((CF_EDGE_DATA, key.clone())) {
                batch.put_cf(&cf, key, serde_json::to_vec(edge)?);
            }
        }

        let cf = self.cf(CF_NETWORK_EDGES)?;
        for (seq, network_edge) in dataset.network_edges.iter().enumerate() {
            let key = Self::network_edge_key(network_edge, seq as u64);
            batch.put_cf(&cf, key, serde_json::to_vec(network_edge)?);
        }

        let cf = self.cf(CF_NETWORK_NODES)?;
        for node in &dataset.network_nodes {
            let key = Self::network_node_key(node.network, node.node);
            if seen.insert((CF_NETWORK_NODES, key.clone())) {
                batch.put_cf(&cf, key, serde_json::to_vec(node)?);
            }
        }

        self.db.write(batch)?;
        self.db.flush()?;

        let statistics = self.statistics()?;
        info!("Imported dataset: {:?}", statistics);
        Ok(statistics)
    }

    /// Flush all data to disk
    pub fn flush(&self) -> StoreResult<()> {
        self.db.flush()?;
        debug!("Flushed store to disk");
        Ok(())
    }

    /// Queue a delete for every key of a column family
    fn clear_cf(&self, batch: &mut WriteBatch, name: &str) -> StoreResult<()> {
        let cf = self.cf(name)?;
        for item in self.db.iterator_cf(&cf, IteratorMode::Start) {
            let (key, _) = item?;
            batch.delete_cf(&cf, key);
        }
        Ok(())
    }

    fn cf(&self, name: &str) -> StoreResult<&rocksdb::ColumnFamily> {
        self.db
            .cf_handle(name)
            .ok_or_else(|| StoreError::ColumnFamily(name.to_string()))
    }

    fn get_document<T: DeserializeOwned>(&self, cf_name: &str, key: &[u8]) -> StoreResult<Option<T>> {
        let cf = self.cf(cf_name)?;
        match self.db.get_cf(&cf, key)? {
            Some(value) => Ok(Some(serde_json::from_slice(&value)?)),
            None => Ok(None),
        }
    }

    fn get_raw(&self, cf_name: &str, key: &[u8]) -> StoreResult<Option<Vec<u8>>> {
        let cf = self.cf(cf_name)?;
        Ok(self.db.get_cf(&cf, key)?)
    }

    /// Values of every key starting with `prefix`, in key order
    fn scan_prefix(&self, cf_name: &str, prefix: &[u8]) -> StoreResult<Vec<Vec<u8>>> {
        let cf = self.cf(cf_name)?;
        let mut values = Vec::new();
        let iter = self
            .db
            .iterator_cf(&cf, IteratorMode::From(prefix, rocksdb::Direction::Forward));
        for item in iter {
            let (key, value) = item?;
            if !key.starts_with(prefix) {
                break;
            }
            values.push(value.to_vec());
        }
        Ok(values)
    }

    fn count(&self, cf_name: &str) -> StoreResult<usize> {
        let cf = self.cf(cf_name)?;
        let mut count = 0;
        for item in self.db.iterator_cf(&cf, IteratorMode::Start) {
            item?;
            count += 1;
        }
        Ok(count)
    }

    fn decode_all<T: DeserializeOwned>(values: Vec<Vec<u8>>) -> StoreResult<Vec<T>> {
        values
            .iter()
            .map(|v| serde_json::from_slice(v).map_err(StoreError::from))
            .collect()
    }

    fn seq_key(seq: u64) -> Vec<u8> {
        format!("{:016x}", seq).into_bytes()
    }

    fn experiment_key(experiment: &str, seq: u64) -> Vec<u8> {
        format!("{}{}{:016x}", experiment, KEY_SEP, seq).into_bytes()
    }

    fn edge_key(pw0: &str, pw1: &str) -> Vec<u8> {
        format!("{}{}{}", pw0, KEY_SEP, pw1).into_bytes()
    }

    fn network_edge_prefix(pw0: PathwayId, pw1: PathwayId) -> Vec<u8> {
        format!("{:08x}:{:08x}:", pw0.as_u32(), pw1.as_u32()).into_bytes()
    }

    fn network_edge_key(edge: &NetworkEdge, seq: u64) -> Vec<u8> {
        let mut key = Self::network_edge_prefix(edge.edge.0, edge.edge.1);
        key.extend(format!("{:08x}:{:016x}", edge.network, seq).into_bytes());
        key
    }

    fn network_node_key(network: u32, node: u32) -> Vec<u8> {
        format!("{:08x}:{:08x}", network, node).into_bytes()
    }
}

impl PathcoreStore for PersistentStore {
    fn find_edge(&self, pw0: &str, pw1: &str) -> StoreResult<Option<EdgeData>> {
        self.get_document(CF_EDGE_DATA, &Self::edge_key(pw0, pw1))
    }

    fn find_annotation(&self, cel_file: &str) -> StoreResult<Option<SampleAnnotation>> {
        match self.get_raw(CF_CEL_FILES, cel_file.as_bytes())? {
            Some(key) => self.get_document(CF_ANNOTATIONS, &key),
            None => Ok(None),
        }
    }

    fn find_annotations_by_experiment(
        &self,
        experiment: &str,
    ) -> StoreResult<Vec<SampleAnnotation>> {
        let mut prefix = experiment.as_bytes().to_vec();
        prefix.extend(KEY_SEP.to_string().into_bytes());

        let mut annotations = Vec::new();
        for key in self.scan_prefix(CF_EXPERIMENT_SAMPLES, &prefix)? {
            if let Some(annotation) = self.get_document(CF_ANNOTATIONS, &key)? {
                annotations.push(annotation);
            }
        }
        Ok(annotations)
    }

    fn find_gene(&self, name: &str) -> StoreResult<Option<Gene>> {
        if let Some(gene) = self.get_document(CF_GENES, name.as_bytes())? {
            return Ok(Some(gene));
        }
        match self.get_raw(CF_GENE_ALIASES, name.as_bytes())? {
            Some(gene_name) => self.get_document(CF_GENES, &gene_name),
            None => Ok(None),
        }
    }

    fn find_pathway(&self, name: &str) -> StoreResult<Option<Pathway>> {
        self.get_document(CF_PATHWAYS, name.as_bytes())
    }

    fn find_network_edges(
        &self,
        pw0: PathwayId,
        pw1: PathwayId,
        side: Option<EdgeSide>,
    ) -> StoreResult<Vec<NetworkEdge>> {
        let values = self.scan_prefix(CF_NETWORK_EDGES, &Self::network_edge_prefix(pw0, pw1))?;
        let edges: Vec<NetworkEdge> = Self::decode_all(values)?;
        Ok(edges
            .into_iter()
            .filter(|e| side.map_or(true, |s| e.side == s))
            .collect())
    }

    fn find_network_nodes(&self, network: u32) -> StoreResult<Vec<NetworkNode>> {
        let prefix = format!("{:08x}:", network).into_bytes();
        Self::decode_all(self.scan_prefix(CF_NETWORK_NODES, &prefix)?)
    }

    fn statistics(&self) -> StoreResult<StoreStatistics> {
        Ok(StoreStatistics {
            pathways: self.count(CF_PATHWAYS)?,
            genes: self.count(CF_GENES)?,
            sample_annotations: self.count(CF_ANNOTATIONS)?,
            pathcore_edge_data: self.count(CF_EDGE_DATA)?,
            network_edges: self.count(CF_NETWORK_EDGES)?,
            network_nodes: self.count(CF_NETWORK_NODES)?,
        })
    }
}
