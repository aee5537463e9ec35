//! Dataset directory loader
//!
//! A dataset directory holds the files the demo collections are built from:
//!
//! | file                       | collection           | format                 |
//! |----------------------------|----------------------|------------------------|
//! | `genes.pcl` (required)     | `genes`              | TSV, gene × sample     |
//! | `gene_names.tsv`           | `genes.common_name`  | TSV, gene, common name |
//! | `sample_annotations.tsv`   | `sample_annotations` | TSV with header        |
//! | `pathways.tsv`             | `pathways`           | TSV, name, size, genes |
//! | `pathcore_edge_data.jsonl` | `pathcore_edge_data` | one JSON doc per line  |
//! | `network_edges.jsonl`      | `network_edges`      | one JSON doc per line  |
//! | `network_nodes.jsonl`      | `network_nodes`      | one JSON doc per line  |
//!
//! Annotations receive a `sample_id` pointing at their CEL file's column in
//! the compendium.

use super::Dataset;
use crate::model::{EdgeData, EdgeSide, Gene, GeneId, NetworkEdge, NetworkNode, Pathway, PathwayId, SampleAnnotation};
use csv::ReaderBuilder;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use std::collections::HashMap;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, info, warn};

pub const COMPENDIUM_FILE: &str = "genes.pcl";
pub const GENE_NAMES_FILE: &str = "gene_names.tsv";
pub const ANNOTATIONS_FILE: &str = "sample_annotations.tsv";
pub const PATHWAYS_FILE: &str = "pathways.tsv";
pub const EDGE_DATA_FILE: &str = "pathcore_edge_data.jsonl";
pub const NETWORK_EDGES_FILE: &str = "network_edges.jsonl";
pub const NETWORK_NODES_FILE: &str = "network_nodes.jsonl";

/// Dataset loading errors
#[derive(Error, Debug)]
pub enum LoadError {
    #[error("Missing required file: {0}")]
    MissingFile(PathBuf),

    #[error("I/O error reading {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("CSV error in {path}: {source}")]
    Csv {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },

    #[error("Invalid JSON in {path} line {line}: {source}")]
    Json {
        path: PathBuf,
        line: usize,
        #[source]
        source: serde_json::Error,
    },

    #[error("Invalid value in {path}: {message}")]
    InvalidValue { path: PathBuf, message: String },

    #[error("Network edge references unknown pathway: {0}")]
    UnknownPathway(String),
}

pub type LoadResult<T> = Result<T, LoadError>;

/// Network edge as written in `network_edges.jsonl`, with pathway names
#[derive(Debug, Deserialize)]
struct RawNetworkEdge {
    network: u32,
    edge: (String, String),
    nodes: Vec<u32>,
    #[serde(rename = "type")]
    side: EdgeSide,
}

/// Load every collection from a dataset directory
pub fn load_dataset(dir: impl AsRef<Path>) -> LoadResult<Dataset> {
    let dir = dir.as_ref();
    info!("Loading dataset from: {}", dir.display());

    let compendium = dir.join(COMPENDIUM_FILE);
    if !compendium.exists() {
        return Err(LoadError::MissingFile(compendium));
    }
    let (mut genes, samples) = read_compendium(&compendium)?;
    info!("Read {} genes over {} samples", genes.len(), samples.len());

    let gene_names = dir.join(GENE_NAMES_FILE);
    if gene_names.exists() {
        apply_common_names(&gene_names, &mut genes)?;
    }

    let sample_index: HashMap<&str, usize> = samples
        .iter()
        .enumerate()
        .map(|(i, s)| (s.as_str(), i))
        .collect();

    let annotations_path = dir.join(ANNOTATIONS_FILE);
    let sample_annotations = if annotations_path.exists() {
        read_annotations(&annotations_path, &sample_index)?
    } else {
        warn!("No {} found; sample metadata will be empty", ANNOTATIONS_FILE);
        Vec::new()
    };

    let pathways_path = dir.join(PATHWAYS_FILE);
    let pathways = if pathways_path.exists() {
        read_pathways(&pathways_path)?
    } else {
        Vec::new()
    };

    let edge_data: Vec<EdgeData> = read_json_lines_if_present(&dir.join(EDGE_DATA_FILE))?;
    let network_nodes: Vec<NetworkNode> =
        read_json_lines_if_present(&dir.join(NETWORK_NODES_FILE))?;

    let pathway_ids: HashMap<&str, PathwayId> = pathways
        .iter()
        .map(|p| (p.pathway.as_str(), p.id))
        .collect();
    let raw_edges: Vec<RawNetworkEdge> =
        read_json_lines_if_present(&dir.join(NETWORK_EDGES_FILE))?;
    let network_edges = raw_edges
        .into_iter()
        .map(|raw| {
            let pw0 = lookup_pathway(&pathway_ids, &raw.edge.0)?;
            let pw1 = lookup_pathway(&pathway_ids, &raw.edge.1)?;
            Ok(NetworkEdge {
                network: raw.network,
                edge: (pw0, pw1),
                nodes: raw.nodes,
                side: raw.side,
            })
        })
        .collect::<LoadResult<Vec<_>>>()?;

    let dataset = Dataset {
        pathways,
        genes,
        sample_annotations,
        edge_data,
        network_edges,
        network_nodes,
    };
    info!("Dataset loaded: {:?}", dataset.statistics());
    Ok(dataset)
}

fn lookup_pathway(ids: &HashMap<&str, PathwayId>, name: &str) -> LoadResult<PathwayId> {
    ids.get(name)
        .copied()
        .ok_or_else(|| LoadError::UnknownPathway(name.to_string()))
}

fn open(path: &Path) -> LoadResult<File> {
    File::open(path).map_err(|source| LoadError::Io {
        path: path.to_path_buf(),
        source,
    })
}

fn tsv_reader(path: &Path, has_headers: bool) -> LoadResult<csv::Reader<File>> {
    Ok(ReaderBuilder::new()
        .delimiter(b'\t')
        .has_headers(has_headers)
        .flexible(true)
        .from_reader(open(path)?))
}

fn csv_error(path: &Path) -> impl Fn(csv::Error) -> LoadError + '_ {
    move |source| LoadError::Csv {
        path: path.to_path_buf(),
        source,
    }
}

/// Gene expression compendium: first column gene names, one column per sample
fn read_compendium(path: &Path) -> LoadResult<(Vec<Gene>, Vec<String>)> {
    let mut reader = tsv_reader(path, true)?;
    let samples: Vec<String> = reader
        .headers()
        .map_err(csv_error(path))?
        .iter()
        .skip(1)
        .map(str::to_string)
        .collect();

    let mut genes = Vec::new();
    for (row, record) in reader.records().enumerate() {
        let record = record.map_err(csv_error(path))?;
        let name = record.get(0).unwrap_or_default().trim().to_string();
        if name.is_empty() {
            continue;
        }
        let expression = record
            .iter()
            .skip(1)
            .map(|v| match v.trim().parse::<f64>() {
                Ok(value) if value.is_finite() => Ok(value),
                _ => Err(LoadError::InvalidValue {
                    path: path.to_path_buf(),
                    message: format!("row {} gene {}: {:?} is not a finite number", row + 2, name, v),
                }),
            })
            .collect::<LoadResult<Vec<f64>>>()?;
        if expression.len() != samples.len() {
            return Err(LoadError::InvalidValue {
                path: path.to_path_buf(),
                message: format!(
                    "gene {} has {} values for {} samples",
                    name,
                    expression.len(),
                    samples.len()
                ),
            });
        }
        genes.push(Gene {
            id: GeneId::new(genes.len() as u32),
            gene: name,
            common_name: None,
            expression,
        });
    }
    Ok((genes, samples))
}

fn apply_common_names(path: &Path, genes: &mut [Gene]) -> LoadResult<()> {
    let mut reader = tsv_reader(path, false)?;
    let mut common_names = HashMap::new();
    for record in reader.records() {
        let record = record.map_err(csv_error(path))?;
        if let (Some(gene), Some(common)) = (record.get(0), record.get(1)) {
            let common = common.trim();
            if !common.is_empty() {
                common_names.insert(gene.trim().to_string(), common.to_string());
            }
        }
    }
    for gene in genes.iter_mut() {
        gene.common_name = common_names.remove(&gene.gene);
    }
    debug!("Applied common names from {}", path.display());
    Ok(())
}

/// Annotation sheet; blank cells are left out of the document
fn read_annotations(
    path: &Path,
    sample_index: &HashMap<&str, usize>,
) -> LoadResult<Vec<SampleAnnotation>> {
    let mut reader = tsv_reader(path, true)?;
    let headers = reader.headers().map_err(csv_error(path))?.clone();

    let mut annotations = Vec::new();
    let mut unmatched = 0usize;
    for record in reader.records() {
        let record = record.map_err(csv_error(path))?;
        let mut annotation = SampleAnnotation::new();
        for (column, value) in headers.iter().zip(record.iter()) {
            let value = value.trim();
            if !value.is_empty() {
                annotation.set(column, value);
            }
        }
        if annotation.is_empty() {
            continue;
        }
        match annotation.cel_file().and_then(|cel| sample_index.get(cel)) {
            Some(&index) => annotation.set(SampleAnnotation::SAMPLE_ID, index),
            None => unmatched += 1,
        }
        annotations.push(annotation);
    }
    if unmatched > 0 {
        warn!("{} annotations do not match a compendium sample", unmatched);
    }
    Ok(annotations)
}

/// Pathway definitions: name, size, `;`-separated genes (only the name is kept)
fn read_pathways(path: &Path) -> LoadResult<Vec<Pathway>> {
    let mut reader = tsv_reader(path, false)?;
    let mut pathways = Vec::new();
    for record in reader.records() {
        let record = record.map_err(csv_error(path))?;
        let name = record.get(0).unwrap_or_default().trim();
        if name.is_empty() {
            continue;
        }
        pathways.push(Pathway {
            id: PathwayId::new(pathways.len() as u32),
            pathway: name.to_string(),
        });
    }
    Ok(pathways)
}

fn read_json_lines_if_present<T: DeserializeOwned>(path: &Path) -> LoadResult<Vec<T>> {
    if !path.exists() {
        debug!("Optional file {} not present", path.display());
        return Ok(Vec::new());
    }
    let reader = BufReader::new(open(path)?);
    let mut documents = Vec::new();
    for (number, line) in reader.lines().enumerate() {
        let line = line.map_err(|source| LoadError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        if line.trim().is_empty() {
            continue;
        }
        let document = serde_json::from_str(&line).map_err(|source| LoadError::Json {
            path: path.to_path_buf(),
            line: number + 1,
            source,
        })?;
        documents.push(document);
    }
    Ok(documents)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn write(dir: &Path, name: &str, contents: &str) {
        fs::write(dir.join(name), contents).unwrap();
    }

    #[test]
    fn test_missing_compendium() {
        let temp_dir = TempDir::new().unwrap();
        let err = load_dataset(temp_dir.path()).unwrap_err();
        assert!(matches!(err, LoadError::MissingFile(_)));
    }

    #[test]
    fn test_load_full_dataset() {
        let temp_dir = TempDir::new().unwrap();
        let dir = temp_dir.path();
        write(dir, COMPENDIUM_FILE, "\tA.CEL\tB.CEL\nPA0001\t0.1\t0.9\nPA0002\t0.5\t0.4\n");
        write(dir, GENE_NAMES_FILE, "PA0001\tdnaA\n");
        write(
            dir,
            ANNOTATIONS_FILE,
            "CEL file\tExperiment\tStrain\nB.CEL\tE-1\tPAO1\nZ.CEL\tE-2\t\n",
        );
        write(dir, PATHWAYS_FILE, "PA01 Glycolysis\t2\tPA0001;PA0002\nPA01 Biofilm\t1\tPA0002\n");
        write(
            dir,
            NETWORK_EDGES_FILE,
            "{\"network\":1,\"edge\":[\"PA01 Glycolysis\",\"PA01 Biofilm\"],\"nodes\":[3],\"type\":-1}\n",
        );
        write(dir, EDGE_DATA_FILE, "{\"edge\":[\"PA01 Glycolysis\",\"PA01 Biofilm\"],\"flag\":1}\n\n");

        let dataset = load_dataset(dir).unwrap();
        assert_eq!(dataset.genes.len(), 2);
        assert_eq!(dataset.genes[0].common_name.as_deref(), Some("dnaA"));
        assert_eq!(dataset.genes[1].expression, vec![0.5, 0.4]);

        assert_eq!(dataset.sample_annotations[0].sample_id(), Some(1));
        assert_eq!(dataset.sample_annotations[1].sample_id(), None);
        assert!(!dataset.sample_annotations[1].contains("Strain"));

        assert_eq!(dataset.network_edges[0].edge, (PathwayId::new(0), PathwayId::new(1)));
        assert_eq!(dataset.network_edges[0].side, EdgeSide::Negative);
        assert!(dataset.edge_data[0].is_flagged());
        assert!(dataset.network_nodes.is_empty());
    }

    #[test]
    fn test_unknown_pathway_in_network_edge() {
        let temp_dir = TempDir::new().unwrap();
        let dir = temp_dir.path();
        write(dir, COMPENDIUM_FILE, "\tA.CEL\nPA0001\t0.1\n");
        write(
            dir,
            NETWORK_EDGES_FILE,
            "{\"network\":1,\"edge\":[\"X\",\"Y\"],\"nodes\":[],\"type\":1}\n",
        );
        let err = load_dataset(dir).unwrap_err();
        assert!(matches!(err, LoadError::UnknownPathway(name) if name == "X"));
    }

    #[test]
    fn test_bad_expression_value() {
        let temp_dir = TempDir::new().unwrap();
        write(temp_dir.path(), COMPENDIUM_FILE, "\tA.CEL\nPA0001\tabc\n");
        let err = load_dataset(temp_dir.path()).unwrap_err();
        assert!(matches!(err, LoadError::InvalidValue { .. }));
    }

    #[test]
    fn test_non_finite_expression_value() {
        for value in ["NaN", "inf", "-inf"] {
            let temp_dir = TempDir::new().unwrap();
            write(
                temp_dir.path(),
                COMPENDIUM_FILE,
                &format!("\tA.CEL\tB.CEL\nPA0001\t0.1\t{}\n", value),
            );
            let err = load_dataset(temp_dir.path()).unwrap_err();
            assert!(matches!(err, LoadError::InvalidValue { .. }), "{} accepted", value);
        }
    }
}
