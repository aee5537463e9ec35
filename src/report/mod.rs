//! Page data assembly
//!
//! Every page handler funnels through one of these functions. They read the
//! store, reshape documents into the JSON embedded in the pages, and never
//! touch HTTP types.

pub mod annotations;
pub mod edge;
pub mod experiment;
pub mod export;
pub mod odds;

pub use annotations::{cleanup_annotation, sample_annotations, SampleMetadata};
pub use edge::{edge_view, fetch_edge, EdgeInfo, EdgePage, EdgeSession, EdgeView, HeatmapExperiments};
pub use experiment::{
    experiment_view, rank_samples, sort_by_odds_ratio, ExperimentInfo, ExperimentPage,
    ExperimentRef, SortedMatrix,
};
pub use export::{edge_export, export_rows, write_csv, EdgeExport, ExportRow};
pub use odds::{edge_gene_odds_ratios, gene_odds_ratio, GeneOddsRatio};

use crate::model::{EdgeName, EdgeNameError};
use crate::store::StoreError;
use thiserror::Error;

/// Errors raised while assembling page data
#[derive(Error, Debug)]
pub enum ReportError {
    #[error("No data stored for edge {0}")]
    EdgeNotFound(EdgeName),

    #[error("Edge {0} is flagged as having no heatmap data")]
    EdgeFlagged(EdgeName),

    #[error("Gene not found: {0}")]
    GeneNotFound(String),

    #[error("Pathway not found: {0}")]
    PathwayNotFound(String),

    #[error("Gene {gene} has no expression value for sample {sample}")]
    MissingExpression { gene: String, sample: String },

    #[error("Heatmap data for edge {edge} is inconsistent: {message}")]
    InvalidHeatmap { edge: EdgeName, message: String },

    #[error("Experiment reference must look like '<experiment>&<tag>': {0}")]
    MalformedExperiment(String),

    #[error(transparent)]
    EdgeName(#[from] EdgeNameError),

    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
}

pub type ReportResult<T> = Result<T, ReportError>;
