//! Sample annotation lookup and cleanup

use super::ReportResult;
use crate::model::SampleAnnotation;
use crate::store::PathcoreStore;
use indexmap::IndexMap;
use serde::Serialize;

/// Longest experiment summary shown next to a heatmap
pub const SUMMARY_MAX_CHARS: usize = 240;

/// Fields that only matter to storage
const HIDDEN_FIELDS: [&str; 3] = ["_id", SampleAnnotation::CEL_FILE, SampleAnnotation::SAMPLE_ID];

/// Drop storage-only fields and shorten the experiment summary
pub fn cleanup_annotation(mut annotation: SampleAnnotation) -> SampleAnnotation {
    for field in HIDDEN_FIELDS {
        annotation.remove(field);
    }
    if let Some(summary) = annotation.get_text(SampleAnnotation::SUMMARY) {
        if summary.chars().count() > SUMMARY_MAX_CHARS {
            let mut trimmed: String = summary.chars().take(SUMMARY_MAX_CHARS).collect();
            trimmed.push_str("...");
            annotation.set(SampleAnnotation::SUMMARY, trimmed);
        }
    }
    annotation
}

/// Metadata for the samples of one heatmap
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct SampleMetadata {
    /// Cleaned annotation per sample; `None` when the sample is unannotated
    pub metadata: IndexMap<String, Option<SampleAnnotation>>,
    /// Samples grouped by their experiment, in first-seen order
    pub experiments: IndexMap<String, Vec<String>>,
}

/// Look up and clean the annotation of every sample
pub fn sample_annotations(
    store: &dyn PathcoreStore,
    samples: &[String],
) -> ReportResult<SampleMetadata> {
    let mut result = SampleMetadata::default();
    for sample in samples {
        let annotation = store.find_annotation(sample)?.map(cleanup_annotation);
        if let Some(experiment) = annotation.as_ref().and_then(|a| a.experiment()) {
            result
                .experiments
                .entry(experiment.to_string())
                .or_default()
                .push(sample.clone());
        }
        result.metadata.insert(sample.clone(), annotation);
    }
    Ok(result)
}
