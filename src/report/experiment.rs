//! Experiment page data
//!
//! An experiment page shows every sample of one experiment against the genes
//! of the edge the user came from. Genes are ordered by their odds ratio and
//! samples by an odds-ratio-weighted expression score, both descending.

use super::annotations::cleanup_annotation;
use super::edge::EdgeSession;
use super::{ReportError, ReportResult};
use crate::model::{EdgeName, SampleAnnotation};
use crate::store::PathcoreStore;
use indexmap::IndexMap;
use serde::Serialize;
use tracing::{debug, warn};

/// Tag attached to experiment links from the most-expressed heatmap
pub const MOST_EXPRESSED_TAG: &str = "most_expressed";

/// The `<experiment>&<tag>` route segment
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExperimentRef {
    pub experiment: String,
    pub tag: String,
}

impl ExperimentRef {
    pub fn parse(raw: &str) -> ReportResult<Self> {
        let mut parts = raw.split('&');
        match (parts.next(), parts.next(), parts.next()) {
            (Some(experiment), Some(tag), None) => Ok(Self {
                experiment: experiment.to_string(),
                tag: tag.to_string(),
            }),
            _ => Err(ReportError::MalformedExperiment(raw.to_string())),
        }
    }

    /// `R` when the user came from the most-expressed heatmap, `B` otherwise
    pub fn heatmap_color(&self) -> &'static str {
        if self.tag == MOST_EXPRESSED_TAG {
            "R"
        } else {
            "B"
        }
    }
}

/// Experiment samples from the edge page heatmaps
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Whitelist {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub most: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub least: Option<Vec<String>>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ExperimentInfo {
    pub genes: Vec<String>,
    pub odds_ratios: Vec<f64>,
    pub samples: Vec<String>,
    pub samples_expression: IndexMap<String, Vec<f64>>,
    pub metadata: IndexMap<String, SampleAnnotation>,
    pub ownership: Vec<i64>,
    pub whitelist_samples: Whitelist,
    pub heatmap_color: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct ExperimentPage {
    pub edge: EdgeName,
    pub experiment_name: String,
    pub experiment_info: ExperimentInfo,
}

/// Genes, odds ratios and sample rows after co-sorting
#[derive(Debug, Clone, PartialEq)]
pub struct SortedMatrix {
    pub genes: Vec<String>,
    pub odds_ratios: Vec<f64>,
    pub samples: Vec<String>,
    pub samples_expression: IndexMap<String, Vec<f64>>,
}

/// Sort `(key, value)` pairs by value, descending.
///
/// Ties come out in reverse input order: an ascending stable sort followed by
/// a reversal. NaN values end up grouped at one end.
fn sort_descending<K>(pairs: &mut Vec<(K, f64)>) {
    pairs.sort_by(|a, b| a.1.total_cmp(&b.1));
    pairs.reverse();
}

/// Reorder genes by odds ratio and each sample's expression row to match.
///
/// `genes` is the column order of the rows in `sample_expression`.
pub fn sort_by_odds_ratio(
    odds_ratios: &IndexMap<String, f64>,
    sample_expression: &IndexMap<String, Vec<f64>>,
    genes: &[String],
) -> SortedMatrix {
    let mut ranked: Vec<(&String, f64)> = odds_ratios.iter().map(|(g, &or)| (g, or)).collect();
    sort_descending(&mut ranked);

    let mut sorted_genes = Vec::with_capacity(ranked.len());
    let mut sorted_odds_ratios = Vec::with_capacity(ranked.len());
    let mut gene_columns = Vec::with_capacity(ranked.len());
    for (gene, odds_ratio) in ranked {
        if let Some(column) = genes.iter().position(|g| g == gene) {
            sorted_genes.push(gene.clone());
            sorted_odds_ratios.push(odds_ratio);
            gene_columns.push(column);
        }
    }

    let samples_expression: IndexMap<String, Vec<f64>> = sample_expression
        .iter()
        .map(|(sample, row)| {
            let sorted_row = gene_columns
                .iter()
                .filter_map(|&column| row.get(column).copied())
                .collect();
            (sample.clone(), sorted_row)
        })
        .collect();

    let samples = rank_samples(odds_ratios, &samples_expression, &sorted_genes);

    SortedMatrix {
        genes: sorted_genes,
        odds_ratios: sorted_odds_ratios,
        samples,
        samples_expression,
    }
}

/// Rank samples by `Σ (or_g / Σ or) · expression_g`, descending.
///
/// A zero odds-ratio total gives every sample a score of zero.
pub fn rank_samples(
    odds_ratios: &IndexMap<String, f64>,
    sample_expression: &IndexMap<String, Vec<f64>>,
    genes: &[String],
) -> Vec<String> {
    let total: f64 = odds_ratios.values().sum();
    let weights: Vec<f64> = genes
        .iter()
        .map(|gene| {
            let odds_ratio = odds_ratios.get(gene).copied().unwrap_or(0.0);
            if total == 0.0 {
                0.0
            } else {
                odds_ratio / total
            }
        })
        .collect();

    let mut scores: Vec<(&String, f64)> = sample_expression
        .iter()
        .map(|(sample, row)| {
            let score = row.iter().zip(&weights).map(|(expr, w)| w * expr).sum();
            (sample, score)
        })
        .collect();
    sort_descending(&mut scores);
    scores.into_iter().map(|(sample, _)| sample.clone()).collect()
}

/// Assemble the experiment page for the edge held in the session
pub fn experiment_view(
    store: &dyn PathcoreStore,
    session: &EdgeSession,
    reference: &ExperimentRef,
) -> ReportResult<ExperimentPage> {
    let experiment = reference.experiment.as_str();

    let mut sample_columns: IndexMap<String, usize> = IndexMap::new();
    let mut metadata: IndexMap<String, SampleAnnotation> = IndexMap::new();
    for annotation in store.find_annotations_by_experiment(experiment)? {
        let Some(sample) = annotation.cel_file().map(str::to_string) else {
            continue;
        };
        match annotation.sample_id() {
            Some(column) => {
                sample_columns.insert(sample.clone(), column);
                metadata.insert(sample, cleanup_annotation(annotation));
            }
            None => warn!("Sample {} of {} has no expression column", sample, experiment),
        }
    }
    debug!("Experiment {} has {} samples", experiment, sample_columns.len());

    let mut sample_expression: IndexMap<String, Vec<f64>> = sample_columns
        .keys()
        .map(|s| (s.clone(), Vec::with_capacity(session.genes.len())))
        .collect();
    for gene_name in &session.genes {
        let gene = store
            .find_gene(gene_name)?
            .ok_or_else(|| ReportError::GeneNotFound(gene_name.clone()))?;
        for (sample, &column) in &sample_columns {
            let value = gene
                .expression_at(column)
                .ok_or_else(|| ReportError::MissingExpression {
                    gene: gene_name.clone(),
                    sample: sample.clone(),
                })?;
            if let Some(row) = sample_expression.get_mut(sample) {
                row.push(value);
            }
        }
    }

    let sorted = sort_by_odds_ratio(&session.odds_ratios, &sample_expression, &session.genes);

    let whitelist = Whitelist {
        most: session.experiments.most.get(experiment).cloned(),
        least: session.experiments.least.get(experiment).cloned(),
    };

    Ok(ExperimentPage {
        edge: session.edge_name.clone(),
        experiment_name: experiment.to_string(),
        experiment_info: ExperimentInfo {
            genes: sorted.genes,
            odds_ratios: sorted.odds_ratios,
            samples: sorted.samples,
            samples_expression: sorted.samples_expression,
            metadata,
            ownership: session.ownership.clone(),
            whitelist_samples: whitelist,
            heatmap_color: reference.heatmap_color().to_string(),
        },
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Gene, GeneId};
    use crate::report::edge::HeatmapExperiments;
    use crate::store::{Dataset, MemoryStore};
    use serde_json::json;

    fn odds(pairs: &[(&str, f64)]) -> IndexMap<String, f64> {
        pairs.iter().map(|(g, v)| (g.to_string(), *v)).collect()
    }

    fn rows(pairs: &[(&str, Vec<f64>)]) -> IndexMap<String, Vec<f64>> {
        pairs.iter().map(|(s, r)| (s.to_string(), r.clone())).collect()
    }

    fn names(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_parse_experiment_ref() {
        let reference = ExperimentRef::parse("E-GEOD-10&most_expressed").unwrap();
        assert_eq!(reference.experiment, "E-GEOD-10");
        assert_eq!(reference.heatmap_color(), "R");
        assert_eq!(ExperimentRef::parse("E1&least_expressed").unwrap().heatmap_color(), "B");
        assert!(ExperimentRef::parse("E1").is_err());
    }

    #[test]
    fn test_sort_by_odds_ratio_reorders_rows() {
        let odds_ratios = odds(&[("g1", 1.0), ("g2", 3.0), ("g3", 2.0)]);
        let expression = rows(&[("s1", vec![10.0, 20.0, 30.0]), ("s2", vec![1.0, 2.0, 3.0])]);
        let sorted = sort_by_odds_ratio(&odds_ratios, &expression, &names(&["g1", "g2", "g3"]));

        assert_eq!(sorted.genes, names(&["g2", "g3", "g1"]));
        assert_eq!(sorted.odds_ratios, vec![3.0, 2.0, 1.0]);
        assert_eq!(sorted.samples_expression["s1"], vec![20.0, 30.0, 10.0]);
        assert_eq!(sorted.samples_expression["s2"], vec![2.0, 3.0, 1.0]);
        assert_eq!(sorted.samples, names(&["s1", "s2"]));
    }

    #[test]
    fn test_ties_come_out_in_reverse_input_order() {
        let odds_ratios = odds(&[("a", 1.0), ("b", 1.0), ("c", 2.0)]);
        let expression = rows(&[("s1", vec![0.0, 0.0, 0.0]), ("s2", vec![0.0, 0.0, 0.0])]);
        let sorted = sort_by_odds_ratio(&odds_ratios, &expression, &names(&["a", "b", "c"]));
        assert_eq!(sorted.genes, names(&["c", "b", "a"]));
        assert_eq!(sorted.samples, names(&["s2", "s1"]));
    }

    #[test]
    fn test_rank_samples_weights_by_odds_ratio() {
        let odds_ratios = odds(&[("g1", 3.0), ("g2", 1.0)]);
        // s1: 0.75 * 1 + 0.25 * 0 = 0.75; s2: 0.75 * 0 + 0.25 * 2 = 0.5
        let expression = rows(&[("s2", vec![0.0, 2.0]), ("s1", vec![1.0, 0.0])]);
        let ranked = rank_samples(&odds_ratios, &expression, &names(&["g1", "g2"]));
        assert_eq!(ranked, names(&["s1", "s2"]));
    }

    #[test]
    fn test_rank_samples_zero_total() {
        let odds_ratios = odds(&[("g1", 0.0)]);
        let expression = rows(&[("s1", vec![5.0]), ("s2", vec![1.0])]);
        let ranked = rank_samples(&odds_ratios, &expression, &names(&["g1"]));
        assert_eq!(ranked, names(&["s2", "s1"]));
    }

    #[test]
    fn test_rank_samples_with_nan_scores() {
        let odds_ratios = odds(&[("g1", 1.0)]);
        let mut pairs = Vec::new();
        for i in 0..30 {
            let value = if i % 3 == 0 { f64::NAN } else { i as f64 };
            pairs.push((format!("s{}", i), vec![value]));
        }
        let expression: IndexMap<String, Vec<f64>> = pairs.into_iter().collect();
        let ranked = rank_samples(&odds_ratios, &expression, &names(&["g1"]));

        let numbers: Vec<f64> = ranked
            .iter()
            .map(|s| expression[s][0])
            .filter(|v| !v.is_nan())
            .collect();
        assert_eq!(numbers.len(), 20);
        assert!(numbers.windows(2).all(|w| w[0] > w[1]));
    }

    fn session() -> EdgeSession {
        let mut most = IndexMap::new();
        most.insert("E1".to_string(), names(&["a.CEL"]));
        EdgeSession {
            edge_name: EdgeName::new("P1", "P2"),
            experiments: HeatmapExperiments {
                most,
                least: IndexMap::new(),
            },
            genes: names(&["PA0001", "dnaB"]),
            odds_ratios: odds(&[("PA0001", 1.0), ("dnaB", 4.0)]),
            ownership: vec![0, 1],
        }
    }

    fn experiment_store() -> MemoryStore {
        let mut dataset = Dataset::new();
        dataset.genes.push(Gene {
            id: GeneId::new(0),
            gene: "PA0001".into(),
            common_name: None,
            expression: vec![0.1, 0.2, 0.3],
        });
        dataset.genes.push(Gene {
            id: GeneId::new(1),
            gene: "PA0002".into(),
            common_name: Some("dnaB".into()),
            expression: vec![0.9, 0.5, 0.0],
        });
        for (cel, column) in [("a.CEL", 0), ("b.CEL", 2)] {
            dataset.sample_annotations.push(
                serde_json::from_value(json!({
                    "CEL file": cel,
                    "sample_id": column,
                    "Experiment": "E1",
                    "Strain": "PAO1",
                }))
                .unwrap(),
            );
        }
        MemoryStore::from_dataset(dataset)
    }

    #[test]
    fn test_experiment_view() {
        let store = experiment_store();
        let reference = ExperimentRef::parse("E1&least_expressed").unwrap();
        let page = experiment_view(&store, &session(), &reference).unwrap();
        let info = &page.experiment_info;

        assert_eq!(page.experiment_name, "E1");
        assert_eq!(info.genes, names(&["dnaB", "PA0001"]));
        assert_eq!(info.odds_ratios, vec![4.0, 1.0]);
        assert_eq!(info.samples_expression["a.CEL"], vec![0.9, 0.1]);
        assert_eq!(info.samples_expression["b.CEL"], vec![0.0, 0.3]);
        assert_eq!(info.samples, names(&["a.CEL", "b.CEL"]));
        assert_eq!(info.whitelist_samples.most, Some(names(&["a.CEL"])));
        assert!(info.whitelist_samples.least.is_none());
        assert_eq!(info.heatmap_color, "B");
        assert!(!info.metadata["a.CEL"].contains("sample_id"));
    }

    #[test]
    fn test_experiment_view_missing_gene() {
        let store = experiment_store();
        let mut session = session();
        session.genes.push("PA9999".into());
        let reference = ExperimentRef::parse("E1&most_expressed").unwrap();
        let err = experiment_view(&store, &session, &reference).unwrap_err();
        assert!(matches!(err, ReportError::GeneNotFound(g) if g == "PA9999"));
    }

    #[test]
    fn test_experiment_view_skips_samples_without_column() {
        let mut dataset = Dataset::new();
        dataset.genes.push(Gene {
            id: GeneId::new(0),
            gene: "PA0001".into(),
            common_name: None,
            expression: vec![0.1],
        });
        dataset.genes.push(Gene {
            id: GeneId::new(1),
            gene: "PA0002".into(),
            common_name: Some("dnaB".into()),
            expression: vec![0.9],
        });
        dataset.sample_annotations.push(
            serde_json::from_value(json!({"CEL file": "a.CEL", "sample_id": 0, "Experiment": "E1"}))
                .unwrap(),
        );
        dataset.sample_annotations.push(
            serde_json::from_value(json!({"CEL file": "orphan.CEL", "Experiment": "E1"})).unwrap(),
        );
        let store = MemoryStore::from_dataset(dataset);

        let reference = ExperimentRef::parse("E1&most_expressed").unwrap();
        let page = experiment_view(&store, &session(), &reference).unwrap();
        let info = &page.experiment_info;
        assert_eq!(info.samples, names(&["a.CEL"]));
        assert!(!info.metadata.contains_key("orphan.CEL"));
        assert!(!info.samples_expression.contains_key("orphan.CEL"));
    }

    #[test]
    fn test_experiment_view_missing_expression() {
        let mut dataset = Dataset::new();
        dataset.genes.push(Gene {
            id: GeneId::new(0),
            gene: "PA0001".into(),
            common_name: None,
            expression: vec![0.1, 0.2],
        });
        dataset.genes.push(Gene {
            id: GeneId::new(1),
            gene: "PA0002".into(),
            common_name: Some("dnaB".into()),
            expression: vec![0.9, 0.5],
        });
        // column 5 is past the end of every expression vector
        dataset.sample_annotations.push(
            serde_json::from_value(json!({"CEL file": "a.CEL", "sample_id": 5, "Experiment": "E1"}))
                .unwrap(),
        );
        let store = MemoryStore::from_dataset(dataset);

        let reference = ExperimentRef::parse("E1&most_expressed").unwrap();
        let err = experiment_view(&store, &session(), &reference).unwrap_err();
        assert!(matches!(
            err,
            ReportError::MissingExpression { ref gene, ref sample }
                if gene == "PA0001" && sample == "a.CEL"
        ));
    }
}
