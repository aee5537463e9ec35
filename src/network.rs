//! PathCORE-T network files
//!
//! A network file is a TSV with one row per edge (`pw0`, `pw1`, `weight`).
//! The viewer needs the links plus the unique pathway list.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum NetworkFileError {
    #[error("Network file name is not allowed: {0}")]
    InvalidName(String),

    #[error("Network file not found: {0}")]
    NotFound(PathBuf),

    #[error("Failed to read network file: {0}")]
    Csv(#[from] csv::Error),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NetworkLink {
    pub pw0: String,
    pub pw1: String,
    pub weight: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NetworkGraph {
    pub nodes: Vec<String>,
    pub links: Vec<NetworkLink>,
}

impl NetworkGraph {
    pub fn from_links(links: Vec<NetworkLink>) -> Self {
        let nodes: BTreeSet<&String> = links.iter().flat_map(|l| [&l.pw0, &l.pw1]).collect();
        Self {
            nodes: nodes.into_iter().cloned().collect(),
            links,
        }
    }
}

/// Parse network TSV content
pub fn parse_network<R: std::io::Read>(reader: R) -> Result<NetworkGraph, NetworkFileError> {
    let mut csv_reader = csv::ReaderBuilder::new()
        .delimiter(b'\t')
        .trim(csv::Trim::All)
        .from_reader(reader);
    let links = csv_reader
        .deserialize()
        .collect::<Result<Vec<NetworkLink>, _>>()?;
    Ok(NetworkGraph::from_links(links))
}

/// Resolve a network file name inside `data_dir`.
///
/// Only bare `.tsv` file names are accepted.
pub fn network_path(data_dir: &Path, name: &str) -> Result<PathBuf, NetworkFileError> {
    let bare = Path::new(name).file_name().and_then(|f| f.to_str()) == Some(name);
    if !bare || !name.ends_with(".tsv") || name.starts_with('.') {
        return Err(NetworkFileError::InvalidName(name.to_string()));
    }
    let path = data_dir.join(name);
    if !path.is_file() {
        return Err(NetworkFileError::NotFound(path));
    }
    Ok(path)
}

/// Read and parse a network file from `data_dir`
pub fn load_network(data_dir: &Path, name: &str) -> Result<NetworkGraph, NetworkFileError> {
    let path = network_path(data_dir, name)?;
    let file = std::fs::File::open(&path).map_err(|_| NetworkFileError::NotFound(path.clone()))?;
    parse_network(file)
}
