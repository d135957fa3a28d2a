//! Extension-keyed registry of save/load strategies
//!
//! Every file Trove reads or writes goes through a [`Format`] selected by
//! extension. Registration is an explicit table; [`FormatRegistry::standard`]
//! installs the built-in formats.

mod snapshot;
mod structured;
mod tabular;
mod text;

pub use snapshot::{CallableSnapshot, ObjectSnapshotFormat, PayloadKind, TransformSnapshotFormat};
pub use structured::{JsonFormat, YamlFormat};
pub use tabular::CsvFormat;
pub use text::TextFormat;

use crate::error::{Result, StoreError};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::debug;
use trove_domain::{DataValue, ProvenanceChain};

/// A save/load strategy for one kind of file.
pub trait Format: Send + Sync {
    /// Extension written by this format, without the dot
    fn extension(&self) -> &str;

    /// Write a value to an exact path
    fn write(&self, value: &DataValue, path: &Path) -> Result<()>;

    /// Read a value from a path
    fn load(&self, path: &Path) -> Result<DataValue>;

    /// Path `save` writes to for a given name
    ///
    /// A name already ending in this format's extension, in any case, is
    /// kept as given.
    fn file_path(&self, name: &str, dir: &Path) -> PathBuf {
        let has_extension = Path::new(name)
            .extension()
            .and_then(|e| e.to_str())
            .is_some_and(|e| e.eq_ignore_ascii_case(self.extension()));
        if has_extension {
            dir.join(name)
        } else {
            dir.join(format!("{}.{}", name, self.extension()))
        }
    }

    /// Write `value` as `<dir>/<name>.<ext>`, returning the written path
    fn save(&self, value: &DataValue, name: &str, dir: &Path) -> Result<PathBuf> {
        let path = self.file_path(name, dir);
        self.write(value, &path)?;
        debug!(path = %path.display(), format = self.extension(), "wrote file");
        Ok(path)
    }
}

/// Build the mismatch error for a format that was handed the wrong variant.
pub(crate) fn mismatch(format: &str, value: &DataValue) -> StoreError {
    StoreError::ValueMismatch {
        format: format.to_string(),
        actual: value.kind().to_string(),
    }
}

/// Table of formats keyed by extension.
#[derive(Clone, Default)]
pub struct FormatRegistry {
    formats: BTreeMap<String, Arc<dyn Format>>,
}

impl FormatRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry with every built-in format
    ///
    /// | extension | value |
    /// |---|---|
    /// | `csv` | table |
    /// | `txt` | text |
    /// | `json` | object |
    /// | `yaml`, `yml` | object |
    /// | `snap` | any value, binary snapshot |
    /// | `fnref` | transform references, binary snapshot |
    pub fn standard() -> Self {
        let mut registry = Self::new();
        registry.register("csv", Arc::new(CsvFormat));
        registry.register("txt", Arc::new(TextFormat));
        registry.register("json", Arc::new(JsonFormat));
        registry.register("yaml", Arc::new(YamlFormat::new("yaml")));
        registry.register("yml", Arc::new(YamlFormat::new("yml")));
        registry.register("snap", Arc::new(ObjectSnapshotFormat));
        registry.register("fnref", Arc::new(TransformSnapshotFormat));
        registry
    }

    /// Register or replace the format for an extension
    pub fn register(&mut self, extension: &str, format: Arc<dyn Format>) {
        self.formats.insert(extension.to_lowercase(), format);
    }

    /// Registered extensions in sorted order
    pub fn extensions(&self) -> Vec<String> {
        self.formats.keys().cloned().collect()
    }

    /// Whether an extension is registered
    pub fn contains(&self, extension: &str) -> bool {
        self.formats.contains_key(&extension.to_lowercase())
    }

    /// Select a format from an extension, file name or path
    ///
    /// Falls back to `default` when the hint is not registered.
    pub fn select(&self, hint: &str, default: Option<&str>) -> Result<Arc<dyn Format>> {
        let extension = parse_hint(hint);
        if let Some(format) = self.formats.get(&extension) {
            return Ok(Arc::clone(format));
        }
        if let Some(fallback) = default {
            if let Some(format) = self.formats.get(&parse_hint(fallback)) {
                debug!(hint, fallback, "using fallback format");
                return Ok(Arc::clone(format));
            }
        }
        Err(StoreError::UnknownFormat {
            hint: hint.to_string(),
            known: self.extensions(),
        })
    }

    /// Load a file by dispatching on its extension
    pub fn load(&self, path: &Path, default: Option<&str>) -> Result<DataValue> {
        let hint = path.to_string_lossy();
        self.select(&hint, default)?.load(path)
    }

    /// Load a file as the root of a new provenance chain
    pub fn load_source(&self, path: &Path) -> Result<ProvenanceChain> {
        if !path.exists() {
            return Err(StoreError::missing_path(path));
        }
        let value = self.load(path, None)?;
        Ok(ProvenanceChain::with_source(value, path))
    }
}

impl std::fmt::Debug for FormatRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FormatRegistry")
            .field("extensions", &self.extensions())
            .finish()
    }
}

/// Extension named by a hint: `csv`, `.csv`, `table.csv` and `/x/table.csv` all give `csv`.
fn parse_hint(hint: &str) -> String {
    Path::new(hint)
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or_else(|| hint.trim_start_matches('.'))
        .to_lowercase()
}
