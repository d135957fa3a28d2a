//! Versioned persistence of provenance chains as bundle directories
//!
//! Each on-disk layout is a [`BundleSchema`] registered under an integer
//! version. The highest registered version is current and is used by
//! [`ProvenanceCodec::save`] unless another version is requested. Loading
//! reads the version marker (`provenance.yaml`); a bundle without one is a
//! legacy version 0 bundle.
//!
//! | version | name | files |
//! |---|---|---|
//! | 0 | `trove_bundle__<ts>__<hash>[__<tag>]` | `data.<ext>`, `func.fnref`, `code.txt` |
//! | 1 | `trove_bundle__<ts>[__<tag>]` | `data.<ext>`, `func.fnref`, `provenance.yaml` |

pub mod components;
pub mod naming;
mod v0;
mod v1;

pub use naming::{is_bundle_name, BundleName, BUNDLE_PREFIX};
pub use v0::LegacySchema;
pub use v1::{ProvenanceDocument, StepListSchema};

use crate::error::{Result, StoreError};
use crate::format::{CallableSnapshot, FormatRegistry};
use components::{METADATA_FILE, PROVENANCE};
use serde::Serialize;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, info, warn};
use trove_domain::{DataValue, ProvenanceChain, RecordInfo, TransformRecord, TransformRegistry};

/// Key in `provenance.yaml` holding the schema version.
pub const VERSION_KEY: &str = "interface_version";

/// One on-disk bundle layout.
pub trait BundleSchema: Send + Sync {
    /// Version this schema writes and reads
    fn version(&self) -> u32;

    /// Parse a bundle directory name in this layout
    fn parse_name(&self, name: &str) -> Result<BundleName>;

    /// Write `chain` as a new bundle under `parent`, returning its path
    ///
    /// `file_name` supplies the tag (its stem) and the data format (its extension).
    fn save(&self, chain: &ProvenanceChain, parent: &Path, file_name: &str, formats: &FormatRegistry) -> Result<PathBuf>;

    /// Read everything but the data value
    fn info(&self, bundle: &Path, formats: &FormatRegistry) -> Result<BundleInfo>;
}

/// Metadata of a bundle, read without loading its data value.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BundleInfo {
    /// Bundle directory
    pub path: PathBuf,
    /// Schema version that wrote it
    pub version: u32,
    /// Parsed directory name
    pub name: BundleName,
    /// Kind of the data artifact
    pub data_kind: String,
    /// The data artifact
    pub data_path: PathBuf,
    /// Step records in chain order
    pub steps: Vec<RecordInfo>,
}

/// How much of a bundle to restore.
#[derive(Debug, Clone)]
pub struct LoadOptions {
    /// Resolve transform references so the chain can be replayed
    pub load_function: bool,
    /// Format to fall back to when the data extension is not registered
    pub data_hint: Option<String>,
}

impl Default for LoadOptions {
    fn default() -> Self {
        Self {
            load_function: true,
            data_hint: None,
        }
    }
}

impl LoadOptions {
    /// Metadata only; every step comes back reference-only
    pub fn metadata_only() -> Self {
        Self {
            load_function: false,
            data_hint: None,
        }
    }
}

/// Strategy table of bundle schemas keyed by version.
#[derive(Clone)]
pub struct ProvenanceCodec {
    schemas: BTreeMap<u32, Arc<dyn BundleSchema>>,
    formats: FormatRegistry,
}

impl ProvenanceCodec {
    /// Codec with no schemas registered
    pub fn new(formats: FormatRegistry) -> Self {
        Self {
            schemas: BTreeMap::new(),
            formats,
        }
    }

    /// Codec with versions 0 and 1
    pub fn standard(formats: FormatRegistry) -> Self {
        let mut codec = Self::new(formats);
        codec.schemas.insert(0, Arc::new(LegacySchema));
        codec.schemas.insert(1, Arc::new(StepListSchema));
        codec
    }

    /// Register a schema; a version may only be registered once
    pub fn register(&mut self, schema: Arc<dyn BundleSchema>) -> Result<()> {
        let version = schema.version();
        if self.schemas.contains_key(&version) {
            return Err(StoreError::DuplicateSchema(version));
        }
        self.schemas.insert(version, schema);
        Ok(())
    }

    /// Formats used for data and metadata files
    pub fn formats(&self) -> &FormatRegistry {
        &self.formats
    }

    /// Highest registered version
    pub fn current_version(&self) -> Option<u32> {
        self.schemas.keys().next_back().copied()
    }

    /// Registered versions, ascending
    pub fn known_versions(&self) -> Vec<u32> {
        self.schemas.keys().copied().collect()
    }

    /// Schema registered for a version
    pub fn schema(&self, version: u32) -> Result<&Arc<dyn BundleSchema>> {
        self.schemas.get(&version).ok_or_else(|| StoreError::UnsupportedSchema {
            version,
            known: self.known_versions(),
        })
    }

    /// Read the version marker of a bundle; no marker means version 0
    pub fn detect_version(&self, bundle: &Path) -> Result<u32> {
        if !bundle.is_dir() {
            return Err(StoreError::missing_path(bundle));
        }
        let marker = match components::optional(bundle, PROVENANCE)? {
            Some(path) => path,
            None => return Ok(0),
        };
        let document = self.formats.load(&marker, Some("yaml"))?;
        document
            .as_object()
            .and_then(|doc| doc.get(VERSION_KEY))
            .and_then(|v| v.as_u64())
            .and_then(|v| u32::try_from(v).ok())
            .ok_or_else(|| StoreError::Parse {
                name: marker.display().to_string(),
                reason: format!("missing or invalid '{}'", VERSION_KEY),
            })
    }

    /// Version and parsed directory name of a bundle
    pub fn parse_bundle(&self, bundle: &Path) -> Result<(u32, BundleName)> {
        let version = self.detect_version(bundle)?;
        let name = self.schema(version)?.parse_name(&components::dir_name(bundle)?)?;
        Ok((version, name))
    }

    /// Write a chain as a bundle under `parent`
    ///
    /// Uses the current version unless `version` is given.
    pub fn save(&self, chain: &ProvenanceChain, parent: &Path, file_name: &str, version: Option<u32>) -> Result<PathBuf> {
        let version = match version.or_else(|| self.current_version()) {
            Some(v) => v,
            None => {
                return Err(StoreError::UnsupportedSchema {
                    version: 0,
                    known: Vec::new(),
                })
            }
        };
        let path = self.schema(version)?.save(chain, parent, file_name, &self.formats)?;
        info!(bundle = %path.display(), version, steps = chain.steps().len(), "saved bundle");
        Ok(path)
    }

    /// Read a bundle's metadata without loading the data value
    pub fn info(&self, bundle: &Path) -> Result<BundleInfo> {
        let version = self.detect_version(bundle)?;
        self.schema(version)?.info(bundle, &self.formats)
    }

    /// Restore a chain from a bundle
    pub fn load(&self, bundle: &Path, transforms: &TransformRegistry, options: &LoadOptions) -> Result<ProvenanceChain> {
        let info = self.info(bundle)?;
        debug!(bundle = %bundle.display(), version = info.version, "loading bundle");

        let value: DataValue = self.formats.load(&info.data_path, options.data_hint.as_deref())?;
        let snapshots = if options.load_function {
            self.read_snapshots(bundle)
        } else {
            None
        };
        let steps = attach(info.steps, snapshots, transforms);
        Ok(ProvenanceChain::from_parts(value, steps))
    }

    /// Decode the transform-reference snapshot, if there is a readable one
    fn read_snapshots(&self, bundle: &Path) -> Option<Vec<CallableSnapshot>> {
        let decoded = components::optional(bundle, components::FUNC).and_then(|found| match found {
            Some(path) => CallableSnapshot::unpack(self.formats.load(&path, None)?).map(Some),
            None => Ok(None),
        });
        match decoded {
            Ok(Some(snapshots)) => Some(snapshots),
            Ok(None) => {
                warn!(bundle = %bundle.display(), "no transform snapshot; steps are reference-only");
                None
            }
            Err(e) => {
                warn!(bundle = %bundle.display(), error = %e, "unreadable transform snapshot; steps are reference-only");
                None
            }
        }
    }
}

impl std::fmt::Debug for ProvenanceCodec {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProvenanceCodec")
            .field("versions", &self.known_versions())
            .field("formats", &self.formats)
            .finish()
    }
}

/// Rebuild records, resolving snapshot references against the registry.
///
/// Snapshots align with the last steps of the chain; a legacy bundle carries
/// a single snapshot for its single step.
fn attach(
    steps: Vec<RecordInfo>,
    snapshots: Option<Vec<CallableSnapshot>>,
    transforms: &TransformRegistry,
) -> Vec<TransformRecord> {
    let snapshots = snapshots.unwrap_or_default();
    let offset = steps.len().saturating_sub(snapshots.len());

    steps
        .into_iter()
        .enumerate()
        .map(|(i, step)| {
            let reference = i
                .checked_sub(offset)
                .and_then(|j| snapshots.get(j))
                .and_then(|s| s.transform.as_ref());
            let transform = reference.and_then(|r| {
                let resolved = transforms.resolve(r);
                if resolved.is_none() {
                    warn!(transform = %r, tag = %step.tag, "transform not registered; step is reference-only");
                }
                resolved
            });
            TransformRecord::from_info(step, transform)
        })
        .collect()
}

/// Path to the metadata file inside a bundle
pub(crate) fn metadata_path(bundle: &Path) -> PathBuf {
    bundle.join(METADATA_FILE)
}
