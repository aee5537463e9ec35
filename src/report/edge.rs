//! Edge page data

use super::annotations::sample_annotations;
use super::{ReportError, ReportResult};
use crate::model::{EdgeData, EdgeName, HeatmapKind, SampleAnnotation};
use crate::store::PathcoreStore;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Experiments behind each heatmap, mapping experiment to its samples
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct HeatmapExperiments {
    pub most: IndexMap<String, Vec<String>>,
    pub least: IndexMap<String, Vec<String>>,
}

/// What the session remembers about the edge a user is viewing.
///
/// The experiment page is a drill-down from this edge and reuses its genes
/// and odds ratios instead of reading the edge document again.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EdgeSession {
    pub edge_name: EdgeName,
    pub experiments: HeatmapExperiments,
    pub genes: Vec<String>,
    pub odds_ratios: IndexMap<String, f64>,
    pub ownership: Vec<i64>,
}

/// Edge document plus the metadata drawn beside the heatmaps
#[derive(Debug, Clone, Serialize)]
pub struct EdgeInfo {
    #[serde(flatten)]
    pub data: EdgeData,
    pub most_metadata: IndexMap<String, Option<SampleAnnotation>>,
    pub least_metadata: IndexMap<String, Option<SampleAnnotation>>,
    pub ownership: Vec<i64>,
}

#[derive(Debug, Clone, Serialize)]
pub struct EdgePage {
    pub pw0: String,
    pub pw1: String,
    pub n_samples: usize,
    pub edge_info: EdgeInfo,
}

#[derive(Debug, Clone)]
pub enum EdgeView {
    Found {
        page: Box<EdgePage>,
        session: EdgeSession,
    },
    /// The edge exists but was flagged as having nothing to show
    NoEdge(EdgeName),
}

/// Read the edge document, applying the stored-name rewrite
pub fn fetch_edge(store: &dyn PathcoreStore, edge_name: &EdgeName) -> ReportResult<EdgeData> {
    let (pw0, pw1) = edge_name.lookup_names();
    store
        .find_edge(&pw0, &pw1)?
        .ok_or_else(|| ReportError::EdgeNotFound(edge_name.clone()))
}

/// Assemble the edge page and the session snapshot that goes with it
pub fn edge_view(store: &dyn PathcoreStore, edge_name: &EdgeName) -> ReportResult<EdgeView> {
    let data = fetch_edge(store, edge_name)?;
    if data.is_flagged() {
        debug!("Edge {} is flagged", edge_name);
        return Ok(EdgeView::NoEdge(edge_name.clone()));
    }

    let most = sample_annotations(store, data.samples(HeatmapKind::Most))?;
    let least = sample_annotations(store, data.samples(HeatmapKind::Least))?;
    let ownership = data.pathway_owner.clone();

    let session = EdgeSession {
        edge_name: edge_name.clone(),
        experiments: HeatmapExperiments {
            most: most.experiments,
            least: least.experiments,
        },
        genes: data.gene_names.clone(),
        odds_ratios: data.gene_odds_ratios(),
        ownership: ownership.clone(),
    };

    let page = EdgePage {
        pw0: edge_name.pw0.clone(),
        pw1: edge_name.pw1.clone(),
        n_samples: data.most_expressed_samples.len(),
        edge_info: EdgeInfo {
            data,
            most_metadata: most.metadata,
            least_metadata: least.metadata,
            ownership,
        },
    };

    Ok(EdgeView::Found {
        page: Box::new(page),
        session,
    })
}
