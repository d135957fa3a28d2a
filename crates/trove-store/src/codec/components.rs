//! Locating the files that make up a bundle

use crate::error::{Result, StoreError};
use crate::tree::{node_kind_of, select::resolve, select::Selection};
use std::fs;
use std::path::{Path, PathBuf};

/// Data artifact, `data.<ext>`
pub const DATA: &str = "data";
/// Transform-reference snapshot, `func.fnref`
pub const FUNC: &str = "func";
/// Legacy code text, `code.txt`
pub const CODE: &str = "code";
/// Step metadata and version marker, `provenance.yaml`
pub const PROVENANCE: &str = "provenance";

/// File name of the metadata document written by current schemas.
pub const METADATA_FILE: &str = "provenance.yaml";

/// Regular files directly inside a bundle, as `(name, kind)` pairs
fn files(bundle: &Path) -> Result<Vec<(String, String)>> {
    let mut entries = Vec::new();
    for entry in fs::read_dir(bundle)? {
        let entry = entry?;
        if !entry.file_type()?.is_file() {
            continue;
        }
        let name = entry.file_name().to_string_lossy().into_owned();
        let kind = node_kind_of(Path::new(&name));
        entries.push((name, kind));
    }
    entries.sort();
    Ok(entries)
}

/// Find exactly one file for a component, or fail listing what was found.
pub fn required(bundle: &Path, component: &str) -> Result<PathBuf> {
    optional(bundle, component)?.ok_or_else(|| StoreError::Structural {
        bundle: bundle.to_path_buf(),
        component: component.to_string(),
        candidates: Vec::new(),
    })
}

/// Find at most one file for a component.
///
/// Zero matches is `None`; several unresolved matches is still an error.
pub fn optional(bundle: &Path, component: &str) -> Result<Option<PathBuf>> {
    let entries = files(bundle)?;
    let selection = resolve(
        entries.iter().map(|(name, kind)| (name.as_str(), kind.as_str())),
        component,
    );
    match selection {
        Selection::One(name) => Ok(Some(bundle.join(name))),
        Selection::Missing => Ok(None),
        Selection::Ambiguous(names) => Err(StoreError::Structural {
            bundle: bundle.to_path_buf(),
            component: component.to_string(),
            candidates: names.into_iter().map(str::to_string).collect(),
        }),
    }
}

/// Create a bundle directory, refusing to reuse an existing one.
pub fn create_bundle_dir(parent: &Path, name: &str) -> Result<PathBuf> {
    if !parent.is_dir() {
        return Err(StoreError::missing_path(parent));
    }
    let path = parent.join(name);
    match fs::create_dir(&path) {
        Ok(()) => Ok(path),
        Err(e) if e.kind() == std::io::ErrorKind::AlreadyExists => Err(StoreError::AlreadyExists(path)),
        Err(e) => Err(e.into()),
    }
}

/// Split `tag.ext` into its tag and extension.
pub fn split_file_name(file_name: &str) -> Result<(String, String)> {
    let path = Path::new(file_name);
    match (
        path.file_stem().and_then(|s| s.to_str()),
        path.extension().and_then(|e| e.to_str()),
    ) {
        (Some(stem), Some(ext)) => Ok((stem.to_string(), ext.to_lowercase())),
        _ => Err(StoreError::Parse {
            name: file_name.to_string(),
            reason: "expected a file name with an extension, such as 'features.csv'".to_string(),
        }),
    }
}

/// Directory name of a bundle path
pub fn dir_name(bundle: &Path) -> Result<String> {
    bundle
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .ok_or_else(|| StoreError::Parse {
            name: bundle.display().to_string(),
            reason: "path has no final component".to_string(),
        })
}
