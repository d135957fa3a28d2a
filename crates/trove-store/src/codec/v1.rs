//! Version 1: the full step list in `provenance.yaml`

use super::components::{self, DATA, FUNC};
use super::naming::{validate_tag, BundleName};
use super::{metadata_path, BundleInfo, BundleSchema};
use crate::error::{Result, StoreError};
use crate::format::{CallableSnapshot, FormatRegistry};
use crate::tree::node_kind_of;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use trove_domain::{DataValue, ProvenanceChain, RecordInfo, Timestamp};

const VERSION: u32 = 1;

/// Contents of `provenance.yaml`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProvenanceDocument {
    /// Schema version marker
    pub interface_version: u32,
    /// Kind of the data artifact, checked against the file on load
    pub data_kind: String,
    /// Every step, in chain order
    pub transform_steps: Vec<RecordInfo>,
}

/// Layout with a version marker and the whole history in one file.
#[derive(Debug, Clone, Copy, Default)]
pub struct StepListSchema;

impl BundleSchema for StepListSchema {
    fn version(&self) -> u32 {
        VERSION
    }

    fn parse_name(&self, name: &str) -> Result<BundleName> {
        BundleName::parse_current(name)
    }

    fn save(&self, chain: &ProvenanceChain, parent: &Path, file_name: &str, formats: &FormatRegistry) -> Result<PathBuf> {
        let (tag, extension) = components::split_file_name(file_name)?;
        validate_tag(&tag)?;
        let data_format = formats.select(&extension, None)?;

        let name = BundleName::current(Timestamp::now(), tag);
        let bundle = components::create_bundle_dir(parent, &name.to_string())?;

        let data_path = data_format.save(chain.value(), DATA, &bundle)?;

        let snapshots: Vec<CallableSnapshot> = chain
            .steps()
            .iter()
            .map(|step| CallableSnapshot {
                tag: step.tag.clone(),
                transform: step.transform_ref.clone(),
                parameters: step.parameters.clone(),
            })
            .collect();
        formats
            .select("fnref", None)?
            .save(&CallableSnapshot::pack(&snapshots)?, FUNC, &bundle)?;

        let document = ProvenanceDocument {
            interface_version: VERSION,
            data_kind: node_kind_of(&data_path),
            transform_steps: chain.describe(),
        };
        formats
            .select("yaml", None)?
            .write(&DataValue::Object(serde_json::to_value(&document)?), &metadata_path(&bundle))?;

        Ok(bundle)
    }

    fn info(&self, bundle: &Path, formats: &FormatRegistry) -> Result<BundleInfo> {
        let name = self.parse_name(&components::dir_name(bundle)?)?;
        let data_path = components::required(bundle, DATA)?;
        let metadata = components::required(bundle, components::PROVENANCE)?;

        let raw = match formats.load(&metadata, Some("yaml"))? {
            DataValue::Object(raw) => raw,
            other => {
                return Err(StoreError::ValueMismatch {
                    format: "yaml".to_string(),
                    actual: other.kind().to_string(),
                })
            }
        };
        let document: ProvenanceDocument = serde_json::from_value(raw)?;

        let data_kind = node_kind_of(&data_path);
        if document.data_kind != data_kind {
            return Err(StoreError::Structural {
                bundle: bundle.to_path_buf(),
                component: format!("{}.{}", DATA, document.data_kind),
                candidates: vec![components::dir_name(&data_path)?],
            });
        }

        Ok(BundleInfo {
            path: bundle.to_path_buf(),
            version: document.interface_version,
            name,
            data_kind,
            data_path,
            steps: document.transform_steps,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;
    use trove_domain::{Invocation, NoLineage, Table, Transform};

    fn chain() -> ProvenanceChain {
        let drop_first = std::sync::Arc::new(Transform::new("drop_first", 1, "drop first row", |v: &DataValue, _| {
            let table = v.as_table().cloned().unwrap_or_default();
            Ok(DataValue::Table(Table::new(table.columns, table.rows.into_iter().skip(1).collect())))
        }));
        let table = Table::new(
            vec!["id".into(), "score".into()],
            vec![vec!["1".into(), "10".into()], vec!["2".into(), "20".into()]],
        );
        ProvenanceChain::with_source(DataValue::Table(table), "/data/raw.csv")
            .transform(&Invocation::new(drop_first).with_tag("clean"), &NoLineage)
            .unwrap()
    }

    #[test]
    fn test_save_writes_marker_and_steps() {
        let dir = TempDir::new().unwrap();
        let formats = FormatRegistry::standard();
        let bundle = StepListSchema.save(&chain(), dir.path(), "features.csv", &formats).unwrap();

        let name = bundle.file_name().unwrap().to_string_lossy().into_owned();
        assert!(name.ends_with("__features"));
        assert_eq!(name.split("__").count(), 3);

        let yaml = fs::read_to_string(bundle.join("provenance.yaml")).unwrap();
        assert!(yaml.contains("interface_version: 1"));
        assert!(yaml.contains("data_kind: csv"));

        let info = StepListSchema.info(&bundle, &formats).unwrap();
        assert_eq!(info.steps.len(), 2);
        assert_eq!(info.steps[0].source_path.as_deref(), Some(Path::new("/data/raw.csv")));
        assert_eq!(info.steps[1].tag, "clean");
    }

    #[test]
    fn test_kind_disagreement_is_structural() {
        let dir = TempDir::new().unwrap();
        let formats = FormatRegistry::standard();
        let bundle = StepListSchema.save(&chain(), dir.path(), "features.csv", &formats).unwrap();
        fs::rename(bundle.join("data.csv"), bundle.join("data.txt")).unwrap();

        let err = StepListSchema.info(&bundle, &formats).unwrap_err();
        assert!(matches!(err, StoreError::Structural { .. }));
        assert!(err.to_string().contains("data.txt"));
    }
}
