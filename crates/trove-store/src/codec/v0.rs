//! Version 0: one step per bundle, no version marker
//!
//! The lineage hash lives in the directory name. `code.txt` holds the code
//! text of the last step and `func.fnref` a single snapshot with its
//! transform reference and parameters.

use super::components::{self, CODE, DATA, FUNC};
use super::naming::{validate_tag, BundleName};
use super::{BundleInfo, BundleSchema};
use crate::error::Result;
use crate::format::{CallableSnapshot, FormatRegistry};
use crate::tree::node_kind_of;
use std::path::{Path, PathBuf};
use tracing::warn;
use trove_domain::{DataValue, ProvenanceChain, RecordInfo, StepId, Timestamp, NO_LINEAGE_HASH};

/// The single-step legacy layout.
#[derive(Debug, Clone, Copy, Default)]
pub struct LegacySchema;

impl BundleSchema for LegacySchema {
    fn version(&self) -> u32 {
        0
    }

    fn parse_name(&self, name: &str) -> Result<BundleName> {
        BundleName::parse_legacy(name)
    }

    fn save(&self, chain: &ProvenanceChain, parent: &Path, file_name: &str, formats: &FormatRegistry) -> Result<PathBuf> {
        let (tag, extension) = components::split_file_name(file_name)?;
        validate_tag(&tag)?;
        let data_format = formats.select(&extension, None)?;

        let last = chain.last_step();
        let hash = last
            .map(|step| step.lineage_hash.clone())
            .filter(|hash| !hash.is_empty())
            .unwrap_or_else(|| NO_LINEAGE_HASH.to_string());
        validate_tag(&hash)?;

        let name = BundleName::legacy(Timestamp::now(), hash, tag);
        let bundle = components::create_bundle_dir(parent, &name.to_string())?;

        data_format.save(chain.value(), DATA, &bundle)?;

        let snapshots: Vec<CallableSnapshot> = last
            .map(|step| CallableSnapshot {
                tag: step.tag.clone(),
                transform: step.transform_ref.clone(),
                parameters: step.parameters.clone(),
            })
            .into_iter()
            .collect();
        formats
            .select("fnref", None)?
            .save(&CallableSnapshot::pack(&snapshots)?, FUNC, &bundle)?;

        let code = last.map(|step| step.code_text.clone()).unwrap_or_default();
        formats.select("txt", None)?.save(&DataValue::Text(code), CODE, &bundle)?;

        Ok(bundle)
    }

    fn info(&self, bundle: &Path, formats: &FormatRegistry) -> Result<BundleInfo> {
        let name = self.parse_name(&components::dir_name(bundle)?)?;
        let data_path = components::required(bundle, DATA)?;

        let code = match components::optional(bundle, CODE)? {
            Some(path) => formats
                .load(&path, Some("txt"))?
                .as_text()
                .unwrap_or_default()
                .to_string(),
            None => String::new(),
        };

        let snapshot = match components::optional(bundle, FUNC)? {
            Some(path) => match formats.load(&path, None).and_then(CallableSnapshot::unpack) {
                Ok(entries) => entries.into_iter().next(),
                Err(e) => {
                    warn!(bundle = %bundle.display(), error = %e, "unreadable transform snapshot");
                    None
                }
            },
            None => None,
        };

        let steps = if snapshot.is_some() || !code.is_empty() {
            let snapshot = snapshot.unwrap_or_default();
            let tag = if snapshot.tag.is_empty() {
                name.tag.clone()
            } else {
                snapshot.tag
            };
            vec![RecordInfo {
                id: StepId::new(),
                tag,
                timestamp: name.timestamp,
                lineage_hash: name.lineage_hash.clone().unwrap_or_default(),
                code,
                parameters: snapshot.parameters,
                transform: snapshot.transform,
                source_path: None,
            }]
        } else {
            Vec::new()
        };

        Ok(BundleInfo {
            path: bundle.to_path_buf(),
            version: self.version(),
            data_kind: node_kind_of(&data_path),
            data_path,
            name,
            steps,
        })
    }
}
