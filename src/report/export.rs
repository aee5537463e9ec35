//! Spreadsheet export of the two edge heatmaps

use super::annotations::sample_annotations;
use super::edge::fetch_edge;
use super::{ReportError, ReportResult};
use crate::model::{EdgeData, EdgeName, HeatmapKind, SampleAnnotation};
use crate::store::PathcoreStore;
use indexmap::IndexMap;
use serde::Serialize;
use std::io::Write;

/// Column headers of the exported file
pub const EXPORT_HEADER: [&str; 8] = [
    "which_heatmap",
    "sample",
    "gene",
    "normalized_expression",
    "pathway",
    "odds_ratio",
    "experiment",
    "info (strain; genotype; medium; biotic interactor 1 \
     (plant/human/bacteria); biotic interactor 2; treatment",
];

/// Annotation fields summarised in the `info` column, in order
pub const SAMPLE_INFO_FIELDS: [&str; 6] = [
    "Strain",
    "Genotype",
    "Medium (biosynthesis/energy)",
    "Biotic interactor_level 1 (Plant, Human, Bacteria)",
    "Biotic interactor_level 2 (Lung, epithelial cells, Staphylococcus aureus, etc)",
    "Treatment (drug/small molecule)",
];

const NOT_AVAILABLE: &str = "N/A";

/// One heatmap cell as a spreadsheet row
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ExportRow {
    pub which_heatmap: &'static str,
    pub sample: String,
    pub gene: String,
    pub normalized_expression: f64,
    pub pathway: i64,
    pub odds_ratio: f64,
    pub experiment: String,
    pub info: String,
}

#[derive(Debug, Clone)]
pub struct EdgeExport {
    pub file_name: String,
    pub rows: Vec<ExportRow>,
}

/// `; `-joined summary of the info fields, ASCII only.
///
/// Returns `N/A` when none of the fields is present.
pub fn sample_info_field(annotation: &SampleAnnotation) -> String {
    let values: Vec<String> = SAMPLE_INFO_FIELDS
        .iter()
        .map(|field| {
            annotation
                .get_text(field)
                .unwrap_or_else(|| NOT_AVAILABLE.to_string())
        })
        .collect();
    if values.iter().all(|v| v == NOT_AVAILABLE) {
        return NOT_AVAILABLE.to_string();
    }
    values.join("; ").chars().filter(char::is_ascii).collect()
}

fn heatmap_rows(
    edge_name: &EdgeName,
    edge: &EdgeData,
    odds_ratios: &IndexMap<String, f64>,
    metadata: &IndexMap<String, Option<SampleAnnotation>>,
    kind: HeatmapKind,
) -> ReportResult<Vec<ExportRow>> {
    let samples = edge.samples(kind);
    let invalid = |message: String| ReportError::InvalidHeatmap {
        edge: edge_name.clone(),
        message,
    };

    let mut rows = Vec::with_capacity(edge.heatmap(kind).len());
    for cell in edge.heatmap(kind) {
        let sample = samples.get(cell.col_index).ok_or_else(|| {
            invalid(format!("{} heatmap column {} has no sample", kind.as_str(), cell.col_index))
        })?;
        let gene = edge.gene_names.get(cell.row_index).ok_or_else(|| {
            invalid(format!("{} heatmap row {} has no gene", kind.as_str(), cell.row_index))
        })?;
        let pathway = *edge
            .pathway_owner
            .get(cell.row_index)
            .ok_or_else(|| invalid(format!("gene {} has no pathway owner", gene)))?;
        let odds_ratio = *odds_ratios
            .get(gene)
            .ok_or_else(|| invalid(format!("gene {} has no odds ratio", gene)))?;

        let (experiment, info) = match metadata.get(sample).and_then(Option::as_ref) {
            Some(annotation) if !annotation.is_empty() => (
                annotation
                    .experiment()
                    .unwrap_or(NOT_AVAILABLE)
                    .to_string(),
                sample_info_field(annotation),
            ),
            _ => (NOT_AVAILABLE.to_string(), NOT_AVAILABLE.to_string()),
        };

        rows.push(ExportRow {
            which_heatmap: kind.as_str(),
            sample: sample.clone(),
            gene: gene.clone(),
            normalized_expression: cell.value,
            pathway,
            odds_ratio,
            experiment,
            info,
        });
    }
    rows.reverse();
    Ok(rows)
}

/// Rows for the most-expressed heatmap followed by the least-expressed one
pub fn export_rows(
    edge_name: &EdgeName,
    edge: &EdgeData,
    most_metadata: &IndexMap<String, Option<SampleAnnotation>>,
    least_metadata: &IndexMap<String, Option<SampleAnnotation>>,
) -> ReportResult<Vec<ExportRow>> {
    let odds_ratios = edge.gene_odds_ratios();
    let mut rows = heatmap_rows(edge_name, edge, &odds_ratios, most_metadata, HeatmapKind::Most)?;
    rows.extend(heatmap_rows(
        edge_name,
        edge,
        &odds_ratios,
        least_metadata,
        HeatmapKind::Least,
    )?);
    Ok(rows)
}

/// Build the export for an edge straight from the store
pub fn edge_export(store: &dyn PathcoreStore, edge_name: &EdgeName) -> ReportResult<EdgeExport> {
    let edge = fetch_edge(store, edge_name)?;
    if edge.is_flagged() {
        return Err(ReportError::EdgeFlagged(edge_name.clone()));
    }
    let most = sample_annotations(store, edge.samples(HeatmapKind::Most))?;
    let least = sample_annotations(store, edge.samples(HeatmapKind::Least))?;
    let rows = export_rows(edge_name, &edge, &most.metadata, &least.metadata)?;
    Ok(EdgeExport {
        file_name: format!("{}.csv", edge_name.export_stem()),
        rows,
    })
}

/// Write the header and rows as CSV
pub fn write_csv<W: Write>(rows: &[ExportRow], writer: W) -> ReportResult<()> {
    let mut csv_writer = csv::WriterBuilder::new().has_headers(false).from_writer(writer);
    csv_writer.write_record(EXPORT_HEADER)?;
    for row in rows {
        csv_writer.serialize(row)?;
    }
    csv_writer.flush().map_err(csv::Error::from)?;
    Ok(())
}
