//! Collection documents
//!
//! Field names follow the stored JSON so that dataset files and the
//! RocksDB column families share one encoding.

use super::types::{EdgeSide, GeneId, PathwayId};
use indexmap::IndexMap;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};

/// A curated pathway
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Pathway {
    #[serde(rename = "_id")]
    pub id: PathwayId,
    pub pathway: String,
}

/// A gene and its expression values across the compendium samples
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Gene {
    #[serde(rename = "_id")]
    pub id: GeneId,
    pub gene: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub common_name: Option<String>,
    pub expression: Vec<f64>,
}

impl Gene {
    /// Expression value for the sample at `sample_id`
    pub fn expression_at(&self, sample_id: usize) -> Option<f64> {
        self.expression.get(sample_id).copied()
    }
}

/// Free-form sample metadata, keyed by column name.
///
/// Key order is preserved so pages list fields the way the annotation
/// sheet does.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SampleAnnotation(pub Map<String, Value>);

impl SampleAnnotation {
    pub const CEL_FILE: &'static str = "CEL file";
    pub const SAMPLE_ID: &'static str = "sample_id";
    pub const EXPERIMENT: &'static str = "Experiment";
    pub const SUMMARY: &'static str = "EXPT SUMMARY";

    pub fn new() -> Self {
        Self(Map::new())
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    /// String form of a field; numbers are rendered, null/absent give None
    pub fn get_text(&self, key: &str) -> Option<String> {
        match self.0.get(key)? {
            Value::String(s) => Some(s.clone()),
            Value::Null => None,
            other => Some(other.to_string()),
        }
    }

    pub fn set(&mut self, key: impl Into<String>, value: impl Into<Value>) {
        self.0.insert(key.into(), value.into());
    }

    pub fn remove(&mut self, key: &str) -> Option<Value> {
        self.0.shift_remove(key)
    }

    pub fn contains(&self, key: &str) -> bool {
        self.0.contains_key(key)
    }

    pub fn cel_file(&self) -> Option<&str> {
        self.0.get(Self::CEL_FILE).and_then(Value::as_str)
    }

    pub fn experiment(&self) -> Option<&str> {
        self.0.get(Self::EXPERIMENT).and_then(Value::as_str)
    }

    /// Column index of the sample in the expression compendium
    pub fn sample_id(&self) -> Option<usize> {
        match self.0.get(Self::SAMPLE_ID)? {
            Value::Number(n) => n.as_u64().map(|v| v as usize),
            Value::String(s) => s.trim().parse().ok(),
            _ => None,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// One cell of a precomputed heatmap
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HeatmapCell {
    pub col_index: usize,
    pub row_index: usize,
    pub value: f64,
}

/// The two heatmaps drawn on an edge page
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HeatmapKind {
    Most,
    Least,
}

impl HeatmapKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            HeatmapKind::Most => "most",
            HeatmapKind::Least => "least",
        }
    }
}

/// Precomputed data for one network edge (`pathcore_edge_data`)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EdgeData {
    pub edge: (String, String),
    #[serde(default)]
    pub gene_names: Vec<String>,
    #[serde(default)]
    pub odds_ratios: Vec<f64>,
    #[serde(default, deserialize_with = "deserialize_owner")]
    pub pathway_owner: Vec<i64>,
    #[serde(default)]
    pub most_expressed_samples: Vec<String>,
    #[serde(default)]
    pub least_expressed_samples: Vec<String>,
    #[serde(default)]
    pub most_expressed_heatmap: Vec<HeatmapCell>,
    #[serde(default)]
    pub least_expressed_heatmap: Vec<HeatmapCell>,
    /// Present when the edge has no heatmap data to show
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub flag: Option<Value>,
}

impl EdgeData {
    pub fn is_flagged(&self) -> bool {
        self.flag.is_some()
    }

    /// Gene name to odds ratio, in `gene_names` order.
    ///
    /// A repeated gene keeps its first position and takes its last value.
    pub fn gene_odds_ratios(&self) -> IndexMap<String, f64> {
        let mut map = IndexMap::with_capacity(self.gene_names.len());
        for (gene, odds_ratio) in self.gene_names.iter().zip(&self.odds_ratios) {
            map.insert(gene.clone(), *odds_ratio);
        }
        map
    }

    pub fn samples(&self, kind: HeatmapKind) -> &[String] {
        match kind {
            HeatmapKind::Most => &self.most_expressed_samples,
            HeatmapKind::Least => &self.least_expressed_samples,
        }
    }

    pub fn heatmap(&self, kind: HeatmapKind) -> &[HeatmapCell] {
        match kind {
            HeatmapKind::Most => &self.most_expressed_heatmap,
            HeatmapKind::Least => &self.least_expressed_heatmap,
        }
    }
}

/// Accepts owner indices written as integers, floats or numeric strings
fn deserialize_owner<'de, D>(deserializer: D) -> Result<Vec<i64>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Vec::<Value>::deserialize(deserializer)?;
    raw.into_iter()
        .map(|value| match &value {
            Value::Number(n) => n
                .as_i64()
                .or_else(|| n.as_f64().map(|f| f.trunc() as i64))
                .ok_or_else(|| serde::de::Error::custom(format!("invalid owner {}", value))),
            Value::String(s) => s
                .trim()
                .parse::<f64>()
                .map(|f| f.trunc() as i64)
                .map_err(|_| serde::de::Error::custom(format!("invalid owner {:?}", s))),
            _ => Err(serde::de::Error::custom(format!("invalid owner {}", value))),
        })
        .collect()
}

/// An edge observed in one model's network (`network_edges`)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NetworkEdge {
    pub network: u32,
    pub edge: (PathwayId, PathwayId),
    /// Model features (nodes) in which both pathways were enriched
    pub nodes: Vec<u32>,
    #[serde(rename = "type")]
    pub side: EdgeSide,
}

/// One feature of one model (`network_nodes`)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NetworkNode {
    pub network: u32,
    pub node: u32,
    #[serde(default)]
    pub pos_genes: Vec<String>,
    #[serde(default)]
    pub neg_genes: Vec<String>,
}

impl NetworkNode {
    /// Whether the gene is in this node, optionally on one side only
    pub fn has_gene(&self, gene: &str, side: Option<EdgeSide>) -> bool {
        let pos = || self.pos_genes.iter().any(|g| g == gene);
        let neg = || self.neg_genes.iter().any(|g| g == gene);
        match side {
            Some(EdgeSide::Positive) => pos(),
            Some(EdgeSide::Negative) => neg(),
            None => pos() || neg(),
        }
    }

    pub fn genes(&self) -> impl Iterator<Item = &String> {
        self.pos_genes.iter().chain(self.neg_genes.iter())
    }
}
