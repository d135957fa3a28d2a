//! Integration tests for trove-store
//!
//! These tests build real directory trees in temp dirs and exercise scanning,
//! selection, listings and bundle round trips at every schema version.

use std::fs;
use std::path::Path;
use std::sync::Arc;
use tempfile::TempDir;
use trove_domain::{
    ChainError, DataValue, Invocation, NoLineage, ProvenanceChain, RecordOrigin, StaticLineage, Table,
    Transform, TransformRegistry,
};
use trove_store::{DirectoryNode, FormatRegistry, LoadOptions, ProvenanceCodec, ScanOptions, StoreError};

fn codec() -> ProvenanceCodec {
    ProvenanceCodec::standard(FormatRegistry::standard())
}

fn build(path: &Path) -> DirectoryNode {
    DirectoryNode::build(path, &codec(), &ScanOptions::default()).unwrap()
}

fn transforms() -> TransformRegistry {
    let mut registry = TransformRegistry::new();
    registry
        .register(Transform::new(
            "drop_empty",
            1,
            "keep rows whose score column is not empty",
            |value: &DataValue, _| {
                let table = value.as_table().cloned().unwrap_or_default();
                let score = table.column_index("score").unwrap_or(0);
                let rows = table
                    .rows
                    .into_iter()
                    .filter(|row| row.get(score).map(|s| !s.is_empty()).unwrap_or(false))
                    .collect();
                Ok(DataValue::Table(Table::new(table.columns, rows)))
            },
        ))
        .unwrap();
    registry
        .register(Transform::new(
            "scale",
            1,
            "multiply the score column by `factor`",
            |value: &DataValue, params| {
                let factor = params.get("factor").and_then(|f| f.as_i64()).unwrap_or(1);
                let mut table = value.as_table().cloned().unwrap_or_default();
                let score = table.column_index("score").unwrap_or(0);
                for row in &mut table.rows {
                    if let Some(cell) = row.get_mut(score) {
                        let n: i64 = cell.parse().unwrap_or(0);
                        *cell = (n * factor).to_string();
                    }
                }
                Ok(DataValue::Table(table))
            },
        ))
        .unwrap();
    registry
}

fn raw_scores() -> DataValue {
    DataValue::Table(Table::new(
        vec!["id".into(), "score".into()],
        vec![
            vec!["1".into(), "10".into()],
            vec!["2".into(), "".into()],
            vec!["3".into(), "7".into()],
        ],
    ))
}

fn clean_then_aggregate(registry: &TransformRegistry) -> ProvenanceChain {
    ProvenanceChain::new(raw_scores())
        .transform(
            &Invocation::new(registry.get("drop_empty").unwrap()).with_tag("clean"),
            &StaticLineage("abc123".into()),
        )
        .unwrap()
        .transform(
            &Invocation::new(registry.get("scale").unwrap())
                .with_tag("aggregate")
                .with_param("factor", 3),
            &StaticLineage("abc123".into()),
        )
        .unwrap()
}

#[test]
fn test_saved_leaf_is_selectable() {
    let dir = TempDir::new().unwrap();
    let formats = FormatRegistry::standard();
    let top_path = dir.path().join("top");
    fs::create_dir(&top_path).unwrap();

    let mut top = build(&top_path);
    top.save(&DataValue::from("hi"), "a.txt", &formats).unwrap();

    let node = top.select("a").unwrap();
    assert!(node.is_leaf());
    assert_eq!(node.load(&formats, None).unwrap(), DataValue::from("hi"));
    assert!(top_path.join("a.txt").is_file());
}

#[test]
fn test_listing_collapses_only_below_root() {
    let dir = TempDir::new().unwrap();
    let raw = dir.path().join("raw");
    fs::create_dir(&raw).unwrap();
    fs::write(raw.join("1.csv"), "a\n1\n").unwrap();
    fs::write(raw.join("2.csv"), "a\n2\n").unwrap();

    let root = build(&raw);
    assert_eq!(root.render_listing(false), "raw/\n    1.csv\n    2.csv\n");

    let parent = build(dir.path());
    let listing = parent.render_listing(false);
    assert!(listing.contains("\n    raw/\n        2 csv items\n"), "got:\n{}", listing);

    let full = parent.render_listing(true);
    assert!(full.contains("        1.csv\n        2.csv\n"), "got:\n{}", full);
}

#[test]
fn test_select_reports_every_candidate() {
    let dir = TempDir::new().unwrap();
    fs::write(dir.path().join("scores_2023.csv"), "a\n").unwrap();
    fs::write(dir.path().join("scores_2024.csv"), "a\n").unwrap();

    let tree = build(dir.path());
    match tree.select("scores") {
        Err(StoreError::AmbiguousSelection { hint, candidates }) => {
            assert_eq!(hint, "scores");
            assert_eq!(candidates, vec!["scores_2023.csv", "scores_2024.csv"]);
        }
        other => panic!("expected ambiguity, got {:?}", other.map(|n| n.name().to_string())),
    }
    assert_eq!(tree.latest().unwrap().name(), "scores_2024.csv");
}

#[test]
fn test_bundle_roundtrip_every_version() {
    let registry = transforms();
    let formats = FormatRegistry::standard();
    let chain = clean_then_aggregate(&registry);

    for version in codec().known_versions() {
        let dir = TempDir::new().unwrap();
        let mut tree = build(dir.path());
        let bundle = tree
            .save_chain(&chain, "features.csv", &codec(), Some(version))
            .unwrap()
            .clone();
        assert!(bundle.is_bundle());
        assert_eq!(bundle.kind(), "csv");
        assert_eq!(bundle.bundle_version(), Some(version));

        let loaded = bundle.load_chain(&codec(), &registry, &LoadOptions::default()).unwrap();
        assert_eq!(loaded.value(), chain.value());

        // The data artifact re-encodes to the same bytes.
        let original = fs::read(bundle.path().join("data.csv")).unwrap();
        let copy = formats
            .select("csv", None)
            .unwrap()
            .save(loaded.value(), "copy.csv", dir.path())
            .unwrap();
        assert_eq!(fs::read(copy).unwrap(), original);

        // Version 0 keeps only the last step.
        let expected = if version == 0 { &chain.steps()[1..] } else { chain.steps() };
        assert_eq!(loaded.steps().len(), expected.len());
        for (restored, step) in loaded.steps().iter().zip(expected) {
            assert_eq!(restored.tag, step.tag);
            assert_eq!(restored.parameters, step.parameters);
            assert_eq!(restored.code_text, step.code_text);
            assert!(matches!(restored.origin, RecordOrigin::Replayed(_)));
        }
    }
}

#[test]
fn test_metadata_only_load_cannot_rerun() {
    let dir = TempDir::new().unwrap();
    let registry = transforms();
    let chain = clean_then_aggregate(&registry);

    let mut tree = build(dir.path());
    let bundle = tree.save_chain(&chain, "features.csv", &codec(), None).unwrap().clone();

    let loaded = bundle
        .load_chain(&codec(), &registry, &LoadOptions::metadata_only())
        .unwrap();
    let described = loaded.describe();
    assert_eq!(described.len(), 2);
    assert_eq!(described[0].tag, "clean");
    assert_eq!(described[1].tag, "aggregate");
    assert_eq!(described[1].parameters, chain.describe()[1].parameters);

    let err = loaded.rerun(raw_scores()).unwrap_err();
    assert!(matches!(err, ChainError::NotReplayable { ref tag } if tag == "clean"));
}

#[test]
fn test_replayed_chain_reruns_on_new_input() {
    let dir = TempDir::new().unwrap();
    let registry = transforms();
    let mut tree = build(dir.path());
    let bundle = tree
        .save_chain(&clean_then_aggregate(&registry), "features.csv", &codec(), None)
        .unwrap()
        .clone();

    let loaded = bundle.load_chain(&codec(), &registry, &LoadOptions::default()).unwrap();
    let fresh = DataValue::Table(Table::new(
        vec!["id".into(), "score".into()],
        vec![vec!["9".into(), "2".into()], vec!["8".into(), "".into()]],
    ));
    let rerun = loaded.rerun(fresh).unwrap();
    assert_eq!(rerun.as_table().unwrap().rows, vec![vec!["9".to_string(), "6".to_string()]]);
}

#[test]
fn test_five_component_bundle_name_fails_build() {
    let dir = TempDir::new().unwrap();
    let bundle = dir.path().join("trove_bundle__2024-01-02_03-04-05__abc123__tag__extra");
    fs::create_dir(&bundle).unwrap();
    fs::write(bundle.join("data.txt"), "x").unwrap();

    let err = DirectoryNode::build(dir.path(), &codec(), &ScanOptions::default()).unwrap_err();
    match err {
        StoreError::Parse { name, .. } => assert!(name.contains("__extra")),
        other => panic!("expected parse error, got {}", other),
    }
}

#[test]
fn test_bundle_missing_data_fails_build() {
    let dir = TempDir::new().unwrap();
    let bundle = dir.path().join("trove_bundle__2024-01-02_03-04-05__abc123__tag");
    fs::create_dir(&bundle).unwrap();
    fs::write(bundle.join("code.txt"), "x").unwrap();

    let err = DirectoryNode::build(dir.path(), &codec(), &ScanOptions::default()).unwrap_err();
    assert!(matches!(err, StoreError::Structural { .. }), "got {}", err);
}

#[test]
fn test_hand_written_legacy_bundle_is_read() {
    let dir = TempDir::new().unwrap();
    let bundle = dir.path().join("trove_bundle__2021-06-01_12-00-00__9f8e7d__summary");
    fs::create_dir(&bundle).unwrap();
    fs::write(bundle.join("data.txt"), "legacy").unwrap();
    fs::write(bundle.join("code.txt"), "def summarize(df): ...").unwrap();

    let tree = build(dir.path());
    let node = tree.select("summary").unwrap();
    assert_eq!(node.bundle_version(), Some(0));
    assert_eq!(node.kind(), "txt");
    assert_eq!(tree.render_listing(false), format!("{}/\n    summary.txt\n", tree.name()));

    let info = codec().info(node.path()).unwrap();
    assert_eq!(info.steps.len(), 1);
    assert_eq!(info.steps[0].lineage_hash, "9f8e7d");
    assert_eq!(info.steps[0].code, "def summarize(df): ...");
    assert!(info.steps[0].transform.is_none());

    let loaded = node
        .load_chain(&codec(), &TransformRegistry::new(), &LoadOptions::default())
        .unwrap();
    assert_eq!(loaded.value(), &DataValue::from("legacy"));
    assert!(matches!(loaded.steps()[0].origin, RecordOrigin::ReferenceOnly));
}

#[test]
fn test_saved_bundle_matches_rescan() {
    let dir = TempDir::new().unwrap();
    let registry = transforms();
    let mut tree = build(dir.path());

    let key = tree
        .save_transformed(
            &ProvenanceChain::new(raw_scores()),
            &Invocation::new(registry.get("drop_empty").unwrap()).with_tag("clean"),
            &NoLineage,
            "cleaned.csv",
            &codec(),
        )
        .unwrap()
        .name()
        .to_string();
    assert_eq!(tree.kind(), "csv");

    let rescanned = build(dir.path());
    let found = rescanned.get(&key).unwrap();
    assert!(found.is_bundle());
    assert_eq!(found.kind(), "csv");
    assert_eq!(found.children().len(), tree.get(&key).unwrap().children().len());
}

#[test]
fn test_source_leaf_loads_as_rooted_chain() {
    let dir = TempDir::new().unwrap();
    fs::write(dir.path().join("raw.csv"), "id,score\n1,10\n").unwrap();

    let tree = build(dir.path());
    let chain = tree
        .select("raw")
        .unwrap()
        .load_chain(&codec(), &TransformRegistry::new(), &LoadOptions::default())
        .unwrap();
    assert!(matches!(chain.steps()[0].origin, RecordOrigin::SourceFile { .. }));

    let next = chain
        .transform(&Invocation::new(transforms().get("scale").unwrap()).with_param("factor", 2), &NoLineage)
        .unwrap();
    assert_eq!(next.value().as_table().unwrap().rows[0][1], "20");
}

#[test]
fn test_data_hint_loads_unregistered_extension() {
    let dir = TempDir::new().unwrap();
    fs::write(dir.path().join("notes.log"), "plain words").unwrap();

    let formats = FormatRegistry::standard();
    let tree = build(dir.path());
    let leaf = tree.select("notes").unwrap();
    assert_eq!(leaf.kind(), "log");
    assert!(matches!(leaf.load(&formats, None), Err(StoreError::UnknownFormat { .. })));
    assert_eq!(leaf.load(&formats, Some("txt")).unwrap(), DataValue::from("plain words"));
}

#[test]
fn test_custom_format_registration() {
    struct Upper;
    impl trove_store::Format for Upper {
        fn extension(&self) -> &str {
            "up"
        }
        fn write(&self, value: &DataValue, path: &Path) -> trove_store::Result<()> {
            fs::write(path, value.as_text().unwrap_or_default().to_uppercase())?;
            Ok(())
        }
        fn load(&self, path: &Path) -> trove_store::Result<DataValue> {
            Ok(DataValue::Text(fs::read_to_string(path)?))
        }
    }

    let dir = TempDir::new().unwrap();
    let mut formats = FormatRegistry::standard();
    formats.register("up", Arc::new(Upper));

    let mut tree = build(dir.path());
    tree.save(&DataValue::from("quiet"), "x.up", &formats).unwrap();
    assert_eq!(tree.select("x").unwrap().load(&formats, None).unwrap(), DataValue::from("QUIET"));
}
