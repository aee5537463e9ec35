use pathcore::model::{EdgeSide, PathwayId};
use pathcore::{load_dataset, Dataset, LoadError, MemoryStore, PathcoreStore, PersistentStore};
use std::fs;
use std::path::Path;
use tempfile::TempDir;

fn write_dataset(dir: &Path) {
    fs::write(
        dir.join("genes.pcl"),
        "Gene\ts1.CEL\ts2.CEL\ts3.CEL\n\
         PA0001\t0.1\t0.2\t0.3\n\
         PA0002\t0.4\t0.5\t0.6\n",
    )
    .unwrap();
    fs::write(dir.join("gene_names.tsv"), "PA0001\tdnaA\nPA0002\t\n").unwrap();
    fs::write(
        dir.join("sample_annotations.tsv"),
        "CEL file\tExperiment\tStrain\tEXPT SUMMARY\n\
         s1.CEL\tE1\tPAO1\tshort\n\
         s2.CEL\tE1\t\t\n\
         s3.CEL\tE2\tPA14\t\n\
         orphan.CEL\tE3\t\t\n",
    )
    .unwrap();
    fs::write(
        dir.join("pathways.tsv"),
        "PA01 Glycolysis\t2\tPA0001;PA0002\nPA01 Biofilm\t1\tPA0002\n",
    )
    .unwrap();
    fs::write(
        dir.join("pathcore_edge_data.jsonl"),
        concat!(
            r#"{"edge": ["PA01 Glycolysis", "PA01 Biofilm"], "gene_names": ["PA0001"], "odds_ratios": [2.5], "pathway_owner": ["0"], "most_expressed_samples": ["s1.CEL"], "least_expressed_samples": ["s3.CEL"], "most_expressed_heatmap": [{"col_index": 0, "row_index": 0, "value": 0.9}], "least_expressed_heatmap": []}"#,
            "\n\n",
            r#"{"edge": ["A", "B"], "flag": true}"#,
            "\n"
        ),
    )
    .unwrap();
    fs::write(
        dir.join("network_edges.jsonl"),
        r#"{"network": 3, "edge": ["PA01 Glycolysis", "PA01 Biofilm"], "nodes": [1, 2], "type": -1}"#,
    )
    .unwrap();
    fs::write(
        dir.join("network_nodes.jsonl"),
        concat!(
            r#"{"network": 3, "node": 1, "pos_genes": ["PA0001"], "neg_genes": []}"#,
            "\n",
            r#"{"network": 3, "node": 2, "pos_genes": [], "neg_genes": ["PA0002"]}"#,
            "\n",
            r#"{"network": 4, "node": 1, "pos_genes": ["PA0002"]}"#,
            "\n"
        ),
    )
    .unwrap();
}

fn loaded() -> (TempDir, Dataset) {
    let dir = TempDir::new().unwrap();
    write_dataset(dir.path());
    let dataset = load_dataset(dir.path()).unwrap();
    (dir, dataset)
}

fn check_lookups(store: &dyn PathcoreStore) {
    let statistics = store.statistics().unwrap();
    assert_eq!(statistics.pathways, 2);
    assert_eq!(statistics.genes, 2);
    assert_eq!(statistics.sample_annotations, 4);
    assert_eq!(statistics.pathcore_edge_data, 2);
    assert_eq!(statistics.network_edges, 1);
    assert_eq!(statistics.network_nodes, 3);

    let edge = store
        .find_edge("PA01 Glycolysis", "PA01 Biofilm")
        .unwrap()
        .unwrap();
    assert_eq!(edge.pathway_owner, vec![0]);
    assert!(!edge.is_flagged());
    assert!(store.find_edge("PA01 Biofilm", "PA01 Glycolysis").unwrap().is_none());
    assert!(store.find_edge("A", "B").unwrap().unwrap().is_flagged());

    let annotation = store.find_annotation("s3.CEL").unwrap().unwrap();
    assert_eq!(annotation.sample_id(), Some(2));
    assert_eq!(annotation.get_text("Strain").as_deref(), Some("PA14"));
    let orphan = store.find_annotation("orphan.CEL").unwrap().unwrap();
    assert_eq!(orphan.sample_id(), None);

    let e1: Vec<String> = store
        .find_annotations_by_experiment("E1")
        .unwrap()
        .iter()
        .filter_map(|a| a.cel_file().map(str::to_string))
        .collect();
    assert_eq!(e1, vec!["s1.CEL", "s2.CEL"]);
    assert!(store.find_annotations_by_experiment("E9").unwrap().is_empty());

    let by_alias = store.find_gene("dnaA").unwrap().unwrap();
    assert_eq!(by_alias.gene, "PA0001");
    assert_eq!(by_alias.expression, vec![0.1, 0.2, 0.3]);
    assert!(store.find_gene("PA0002").unwrap().unwrap().common_name.is_none());
    assert!(store.find_gene("PA9999").unwrap().is_none());

    let pathway = store.find_pathway("PA01 Biofilm").unwrap().unwrap();
    assert_eq!(pathway.id, PathwayId::new(1));

    let edges = store
        .find_network_edges(PathwayId::new(0), PathwayId::new(1), None)
        .unwrap();
    assert_eq!(edges.len(), 1);
    assert_eq!(edges[0].side, EdgeSide::Negative);
    assert!(store
        .find_network_edges(PathwayId::new(0), PathwayId::new(1), Some(EdgeSide::Positive))
        .unwrap()
        .is_empty());

    assert_eq!(store.find_network_nodes(3).unwrap().len(), 2);
    assert_eq!(store.find_network_nodes(4).unwrap().len(), 1);
    assert!(store.find_network_nodes(5).unwrap().is_empty());
}

#[test]
fn test_memory_store_from_files() {
    let (_dir, dataset) = loaded();
    let store = MemoryStore::from_dataset(dataset);
    check_lookups(&store);
}

#[test]
fn test_persistent_store_matches_memory_store() {
    let (_dir, dataset) = loaded();
    let db_dir = TempDir::new().unwrap();
    {
        let store = PersistentStore::open(db_dir.path()).unwrap();
        let statistics = store.import(&dataset).unwrap();
        assert_eq!(statistics, store.statistics().unwrap());
        assert_eq!(statistics.sample_annotations, 4);
        store.flush().unwrap();
    }

    // reopen to read back from disk
    let store = PersistentStore::open(db_dir.path()).unwrap();
    check_lookups(&store);
}

#[test]
fn test_second_import_replaces_first() {
    let (_dir, dataset) = loaded();
    let db_dir = TempDir::new().unwrap();
    let store = PersistentStore::open(db_dir.path()).unwrap();
    store.import(&dataset).unwrap();

    let replacement = Dataset {
        sample_annotations: vec![serde_json::from_value(
            serde_json::json!({"CEL file": "x.CEL", "Experiment": "E9"}),
        )
        .unwrap()],
        ..Dataset::new()
    };
    let statistics = store.import(&replacement).unwrap();
    assert_eq!(statistics.sample_annotations, 1);
    assert_eq!(statistics.pathcore_edge_data, 0);

    assert!(store.find_annotation("s1.CEL").unwrap().is_none());
    assert!(store.find_annotations_by_experiment("E1").unwrap().is_empty());
    let e9 = store.find_annotations_by_experiment("E9").unwrap();
    assert_eq!(e9.len(), 1);
    assert_eq!(e9[0].cel_file(), Some("x.CEL"));
    assert_eq!(store.find_annotation("x.CEL").unwrap(), Some(e9[0].clone()));
    assert!(store.find_gene("dnaA").unwrap().is_none());
    assert!(store.find_edge("A", "B").unwrap().is_none());

    // loading the same dataset again gives the same store
    store.import(&dataset).unwrap();
    check_lookups(&store);
}

#[test]
fn test_unknown_pathway_in_network_edges() {
    let dir = TempDir::new().unwrap();
    write_dataset(dir.path());
    fs::write(
        dir.path().join("network_edges.jsonl"),
        r#"{"network": 3, "edge": ["PA01 Glycolysis", "PA01 Nowhere"], "nodes": [1], "type": 1}"#,
    )
    .unwrap();
    let err = load_dataset(dir.path()).unwrap_err();
    assert!(matches!(err, LoadError::UnknownPathway(name) if name == "PA01 Nowhere"));
}
