//! Typed view of a directory tree
//!
//! [`DirectoryNode::build`] scans a path once. Directories whose names follow
//! the bundle convention become [`DirectoryNode::Bundle`], other directories
//! become folders and files become leaves. The tree does not watch the
//! filesystem; call [`DirectoryNode::rebuild`] to pick up outside changes.
//! Nodes written through `save`, `save_chain` or `save_transformed` are
//! inserted in place without a rescan.

pub mod listing;
pub(crate) mod select;

pub use listing::ListingEntry;

use crate::codec::components::{self, DATA};
use crate::codec::{is_bundle_name, BundleName, LoadOptions, ProvenanceCodec};
use crate::error::{Result, StoreError};
use crate::format::FormatRegistry;
use select::Selection;
use std::collections::{BTreeMap, BTreeSet};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};
use trove_domain::{DataValue, Invocation, LineageSource, ProvenanceChain, TransformRegistry};

/// Kind of a file with no extension.
pub const UNKNOWN_KIND: &str = "unknown";
/// Kind of a folder with no children.
pub const EMPTY_KIND: &str = "empty";
/// Kind of a folder whose children disagree.
pub const MIXED_KIND: &str = "mixed";

/// Kind of a file path: its lowercased extension, or `unknown`
pub fn node_kind_of(path: &Path) -> String {
    path.extension()
        .and_then(|e| e.to_str())
        .map(str::to_lowercase)
        .unwrap_or_else(|| UNKNOWN_KIND.to_string())
}

/// Names skipped while scanning.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScanOptions {
    /// Exact entry names to ignore at every depth
    pub ignored: BTreeSet<String>,
}

impl Default for ScanOptions {
    fn default() -> Self {
        Self {
            ignored: ["__pycache__", ".git", "target", ".DS_Store"]
                .into_iter()
                .map(String::from)
                .collect(),
        }
    }
}

impl ScanOptions {
    /// Ignore nothing
    pub fn none() -> Self {
        Self {
            ignored: BTreeSet::new(),
        }
    }

    /// Add a name to the ignore set
    pub fn ignore(mut self, name: impl Into<String>) -> Self {
        self.ignored.insert(name.into());
        self
    }

    /// Whether an entry name is skipped
    pub fn is_ignored(&self, name: &str) -> bool {
        self.ignored.contains(name)
    }
}

/// A plain directory.
#[derive(Debug, Clone)]
pub struct FolderNode {
    path: PathBuf,
    name: String,
    kind: String,
    children: BTreeMap<String, DirectoryNode>,
}

impl FolderNode {
    fn new(path: PathBuf, children: BTreeMap<String, DirectoryNode>) -> Self {
        let name = name_of(&path);
        let kind = folder_kind(&children);
        Self {
            path,
            name,
            kind,
            children,
        }
    }

    /// Insert a child under its name and recompute the folder's kind
    fn insert(&mut self, node: DirectoryNode) -> Result<&DirectoryNode> {
        let key = node.name().to_string();
        self.children.insert(key.clone(), node);
        self.kind = folder_kind(&self.children);
        self.children
            .get(&key)
            .ok_or_else(|| StoreError::NotFound(format!("{} in {}", key, self.path.display())))
    }
}

/// A single file.
#[derive(Debug, Clone)]
pub struct LeafNode {
    path: PathBuf,
    name: String,
    kind: String,
}

/// A provenance bundle directory.
#[derive(Debug, Clone)]
pub struct BundleNode {
    path: PathBuf,
    name: String,
    kind: String,
    version: u32,
    header: BundleName,
    children: BTreeMap<String, DirectoryNode>,
}

static NO_CHILDREN: BTreeMap<String, DirectoryNode> = BTreeMap::new();

/// A node in a scanned directory tree.
#[derive(Debug, Clone)]
pub enum DirectoryNode {
    /// Directory of other nodes
    Folder(FolderNode),
    /// File
    Leaf(LeafNode),
    /// Bundle directory holding a data artifact and its provenance
    Bundle(BundleNode),
}

impl DirectoryNode {
    /// Scan `path` into a tree
    ///
    /// Fails with `NotFound` if the path does not exist, and with the
    /// codec's error if a bundle inside it is malformed.
    pub fn build(path: &Path, codec: &ProvenanceCodec, options: &ScanOptions) -> Result<Self> {
        if !path.exists() {
            return Err(StoreError::missing_path(path));
        }
        let path = path.canonicalize()?;
        let node = scan(&path, codec, options)?;
        debug!(path = %path.display(), kind = node.kind(), children = node.children().len(), "scanned tree");
        Ok(node)
    }

    /// Leaf for a file path, without touching the filesystem
    pub fn leaf(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        DirectoryNode::Leaf(LeafNode {
            name: name_of(&path),
            kind: node_kind_of(&path),
            path,
        })
    }

    /// Folder holding the given nodes, without touching the filesystem
    pub fn folder(path: impl Into<PathBuf>, children: impl IntoIterator<Item = DirectoryNode>) -> Self {
        let children = children
            .into_iter()
            .map(|child| (child.name().to_string(), child))
            .collect();
        DirectoryNode::Folder(FolderNode::new(path.into(), children))
    }

    /// Absolute location
    pub fn path(&self) -> &Path {
        match self {
            DirectoryNode::Folder(n) => &n.path,
            DirectoryNode::Leaf(n) => &n.path,
            DirectoryNode::Bundle(n) => &n.path,
        }
    }

    /// Final path segment
    pub fn name(&self) -> &str {
        match self {
            DirectoryNode::Folder(n) => &n.name,
            DirectoryNode::Leaf(n) => &n.name,
            DirectoryNode::Bundle(n) => &n.name,
        }
    }

    /// Inferred content type
    pub fn kind(&self) -> &str {
        match self {
            DirectoryNode::Folder(n) => &n.kind,
            DirectoryNode::Leaf(n) => &n.kind,
            DirectoryNode::Bundle(n) => &n.kind,
        }
    }

    /// Children by name; always empty for a leaf
    pub fn children(&self) -> &BTreeMap<String, DirectoryNode> {
        match self {
            DirectoryNode::Folder(n) => &n.children,
            DirectoryNode::Bundle(n) => &n.children,
            DirectoryNode::Leaf(_) => &NO_CHILDREN,
        }
    }

    /// Whether this is a plain directory
    pub fn is_folder(&self) -> bool {
        matches!(self, DirectoryNode::Folder(_))
    }

    /// Whether this is a file
    pub fn is_leaf(&self) -> bool {
        matches!(self, DirectoryNode::Leaf(_))
    }

    /// Whether this is a bundle directory
    pub fn is_bundle(&self) -> bool {
        matches!(self, DirectoryNode::Bundle(_))
    }

    /// Parsed bundle name, for bundles
    pub fn bundle_name(&self) -> Option<&BundleName> {
        match self {
            DirectoryNode::Bundle(n) => Some(&n.header),
            _ => None,
        }
    }

    /// Schema version, for bundles
    pub fn bundle_version(&self) -> Option<u32> {
        match self {
            DirectoryNode::Bundle(n) => Some(n.version),
            _ => None,
        }
    }

    /// Child with exactly this name
    pub fn get(&self, name: &str) -> Result<&DirectoryNode> {
        if self.is_leaf() {
            return Err(StoreError::NotAFolder(self.path().to_path_buf()));
        }
        self.children().get(name).ok_or_else(|| {
            StoreError::NotFound(format!(
                "'{}' in {} (entries: {})",
                name,
                self.path().display(),
                self.children().keys().cloned().collect::<Vec<_>>().join(", ")
            ))
        })
    }

    /// The single child whose name contains `hint`
    ///
    /// Several substring matches are narrowed to those whose kind equals the
    /// hint exactly. Anything other than one survivor is an error listing the
    /// candidates.
    pub fn select(&self, hint: &str) -> Result<&DirectoryNode> {
        if self.is_leaf() {
            return Err(StoreError::NotAFolder(self.path().to_path_buf()));
        }
        let children = self.children();
        let entries = children.values().map(|c| (c.name(), c.kind()));
        match select::resolve(entries, hint) {
            Selection::One(name) => self.get(name),
            Selection::Missing => Err(StoreError::NotFound(format!(
                "no entry matching '{}' in {}",
                hint,
                self.path().display()
            ))),
            Selection::Ambiguous(names) => Err(StoreError::AmbiguousSelection {
                hint: hint.to_string(),
                candidates: names.into_iter().map(str::to_string).collect(),
            }),
        }
    }

    /// The child whose name sorts last, if there are any children
    pub fn latest(&self) -> Option<&DirectoryNode> {
        self.children().values().next_back()
    }

    /// Load the data value of a leaf, or the data artifact of a bundle
    ///
    /// `hint` picks the format when the extension is not registered.
    pub fn load(&self, formats: &FormatRegistry, hint: Option<&str>) -> Result<DataValue> {
        match self {
            DirectoryNode::Leaf(n) => formats.load(&n.path, hint),
            DirectoryNode::Bundle(n) => formats.load(&components::required(&n.path, DATA)?, hint),
            DirectoryNode::Folder(n) => Err(StoreError::NotLoadable(n.path.clone())),
        }
    }

    /// Load a provenance chain
    ///
    /// A bundle restores its recorded steps; a leaf becomes a chain rooted at
    /// a source-file record.
    pub fn load_chain(
        &self,
        codec: &ProvenanceCodec,
        transforms: &TransformRegistry,
        options: &LoadOptions,
    ) -> Result<ProvenanceChain> {
        match self {
            DirectoryNode::Bundle(n) => codec.load(&n.path, transforms, options),
            DirectoryNode::Leaf(n) => codec.formats().load_source(&n.path),
            DirectoryNode::Folder(n) => Err(StoreError::NotLoadable(n.path.clone())),
        }
    }

    /// Write `value` as a file in this folder and add it as a leaf
    ///
    /// The format is chosen from `name`'s extension. `name` must be a plain
    /// file name; separators and `.`/`..` are rejected.
    pub fn save(&mut self, value: &DataValue, name: &str, formats: &FormatRegistry) -> Result<&DirectoryNode> {
        validate_file_name(name)?;
        let folder = self.folder_mut()?;
        let path = formats.select(name, None)?.save(value, name, &folder.path)?;
        info!(path = %path.display(), "saved file");
        folder.insert(DirectoryNode::leaf(path))
    }

    /// Write `chain` as a bundle in this folder and add it as a child
    ///
    /// `file_name` gives the tag and data format, e.g. `features.csv`.
    /// `version` overrides the codec's current schema.
    pub fn save_chain(
        &mut self,
        chain: &ProvenanceChain,
        file_name: &str,
        codec: &ProvenanceCodec,
        version: Option<u32>,
    ) -> Result<&DirectoryNode> {
        let folder = self.folder_mut()?;
        let path = codec.save(chain, &folder.path, file_name, version)?;
        let bundle = scan_bundle(path, codec)?;
        folder.insert(bundle)
    }

    /// Apply a transform to `input` and save the result as a bundle
    pub fn save_transformed(
        &mut self,
        input: &ProvenanceChain,
        invocation: &Invocation,
        lineage: &dyn LineageSource,
        file_name: &str,
        codec: &ProvenanceCodec,
    ) -> Result<&DirectoryNode> {
        let chain = input.transform(invocation, lineage)?;
        self.save_chain(&chain, file_name, codec, None)
    }

    /// Rescan this node's path, replacing its contents
    pub fn rebuild(&mut self, codec: &ProvenanceCodec, options: &ScanOptions) -> Result<()> {
        let fresh = DirectoryNode::build(self.path(), codec, options)?;
        *self = fresh;
        Ok(())
    }

    /// Nested summary; see [`ListingEntry::of`]
    pub fn listing(&self, full: bool) -> ListingEntry {
        ListingEntry::of(self, full)
    }

    /// Printable nested summary
    pub fn render_listing(&self, full: bool) -> String {
        self.listing(full).render()
    }

    fn folder_mut(&mut self) -> Result<&mut FolderNode> {
        match self {
            DirectoryNode::Folder(folder) => Ok(folder),
            other => Err(StoreError::NotAFolder(other.path().to_path_buf())),
        }
    }
}

fn name_of(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

fn validate_file_name(name: &str) -> Result<()> {
    if name.is_empty() || name == "." || name == ".." || name.contains('/') || name.contains('\\') {
        return Err(StoreError::Parse {
            name: name.to_string(),
            reason: "expected a plain file name without path separators".to_string(),
        });
    }
    Ok(())
}

fn folder_kind(children: &BTreeMap<String, DirectoryNode>) -> String {
    let kinds: BTreeSet<&str> = children.values().map(DirectoryNode::kind).collect();
    let mut iter = kinds.iter();
    match (iter.next(), iter.next()) {
        (None, _) => EMPTY_KIND.to_string(),
        (Some(kind), None) => kind.to_string(),
        (Some(_), Some(_)) => MIXED_KIND.to_string(),
    }
}

fn scan(path: &Path, codec: &ProvenanceCodec, options: &ScanOptions) -> Result<DirectoryNode> {
    if path.is_file() {
        return Ok(DirectoryNode::leaf(path));
    }
    if is_bundle_name(&name_of(path)) {
        return scan_bundle(path.to_path_buf(), codec);
    }

    let mut children = BTreeMap::new();
    for entry in fs::read_dir(path)? {
        let entry = entry?;
        let name = entry.file_name().to_string_lossy().into_owned();
        if options.is_ignored(&name) {
            continue;
        }
        let child = entry.path();
        if !child.is_dir() && !child.is_file() {
            warn!(path = %child.display(), "skipping entry that is neither file nor directory");
            continue;
        }
        children.insert(name, scan(&child, codec, options)?);
    }
    Ok(DirectoryNode::Folder(FolderNode::new(path.to_path_buf(), children)))
}

fn scan_bundle(path: PathBuf, codec: &ProvenanceCodec) -> Result<DirectoryNode> {
    let (version, header) = codec.parse_bundle(&path)?;
    let kind = node_kind_of(&components::required(&path, DATA)?);

    let mut children = BTreeMap::new();
    for entry in fs::read_dir(&path)? {
        let entry = entry?;
        if entry.path().is_file() {
            let leaf = DirectoryNode::leaf(entry.path());
            children.insert(leaf.name().to_string(), leaf);
        }
    }

    Ok(DirectoryNode::Bundle(BundleNode {
        name: name_of(&path),
        path,
        kind,
        version,
        header,
        children,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn codec() -> ProvenanceCodec {
        ProvenanceCodec::standard(FormatRegistry::standard())
    }

    #[test]
    fn test_save_rejects_paths_outside_folder() {
        let dir = TempDir::new().unwrap();
        fs::create_dir(dir.path().join("sub")).unwrap();
        let formats = FormatRegistry::standard();
        let mut tree = DirectoryNode::build(dir.path(), &codec(), &ScanOptions::default()).unwrap();

        for name in ["sub/a.txt", "../x.txt", "..\\x.txt", ".."] {
            let err = tree.save(&DataValue::from("hi"), name, &formats).unwrap_err();
            assert!(matches!(err, StoreError::Parse { .. }), "{name}: {err}");
        }
        assert!(!dir.path().join("sub").join("a.txt").exists());
        assert_eq!(tree.children().len(), 1);
    }

    #[test]
    fn test_save_keeps_requested_name_case() {
        let dir = TempDir::new().unwrap();
        let formats = FormatRegistry::standard();
        let mut tree = DirectoryNode::build(dir.path(), &codec(), &ScanOptions::default()).unwrap();
        let table = DataValue::Table(trove_domain::Table::new(vec!["a".into()], vec![vec!["1".into()]]));

        let node = tree.save(&table, "scores.CSV", &formats).unwrap();
        assert_eq!(node.name(), "scores.CSV");
        assert_eq!(node.kind(), "csv");
        let names: Vec<String> = fs::read_dir(dir.path())
            .unwrap()
            .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
            .collect();
        assert_eq!(names, vec!["scores.CSV"]);
    }

    #[test]
    fn test_leaf_kind_from_extension() {
        assert_eq!(DirectoryNode::leaf("/d/table.CSV").kind(), "csv");
        assert_eq!(DirectoryNode::leaf("/d/Makefile").kind(), UNKNOWN_KIND);
    }

    #[test]
    fn test_folder_kind_rules() {
        assert_eq!(DirectoryNode::folder("/d", Vec::new()).kind(), EMPTY_KIND);
        let same = DirectoryNode::folder("/d", vec![DirectoryNode::leaf("/d/a.csv"), DirectoryNode::leaf("/d/b.csv")]);
        assert_eq!(same.kind(), "csv");
        let mixed = DirectoryNode::folder("/d", vec![DirectoryNode::leaf("/d/a.csv"), DirectoryNode::leaf("/d/b.txt")]);
        assert_eq!(mixed.kind(), MIXED_KIND);
    }

    #[test]
    fn test_select_exact_kind_tiebreak() {
        let folder = DirectoryNode::folder(
            "/d",
            vec![DirectoryNode::leaf("/d/query.sql"), DirectoryNode::leaf("/d/db.sqlite")],
        );
        assert_eq!(folder.select("sql").unwrap().name(), "query.sql");
        match folder.select("q") {
            Err(StoreError::AmbiguousSelection { candidates, .. }) => {
                assert_eq!(candidates, vec!["db.sqlite".to_string(), "query.sql".to_string()])
            }
            other => panic!("expected ambiguity, got {:?}", other.map(|n| n.name().to_string())),
        }
    }

    #[test]
    fn test_select_missing_and_on_leaf() {
        let folder = DirectoryNode::folder("/d", vec![DirectoryNode::leaf("/d/a.txt")]);
        assert!(matches!(folder.select("zzz"), Err(StoreError::NotFound(_))));
        let leaf = DirectoryNode::leaf("/d/a.txt");
        assert!(matches!(leaf.select("a"), Err(StoreError::NotAFolder(_))));
    }

    #[test]
    fn test_latest_is_lexicographic_max() {
        let folder = DirectoryNode::folder(
            "/d",
            vec![
                DirectoryNode::leaf("/d/2024-01-09.csv"),
                DirectoryNode::leaf("/d/2024-01-10.csv"),
                DirectoryNode::leaf("/d/2023-12-31.csv"),
            ],
        );
        assert_eq!(folder.latest().unwrap().name(), "2024-01-10.csv");
        assert!(DirectoryNode::folder("/d", Vec::new()).latest().is_none());
    }

    #[test]
    fn test_build_missing_path() {
        let err = DirectoryNode::build(Path::new("/definitely/not/here"), &codec(), &ScanOptions::default()).unwrap_err();
        assert!(matches!(err, StoreError::NotFound(_)));
    }

    #[test]
    fn test_build_skips_ignored_names() {
        let dir = TempDir::new().unwrap();
        fs::create_dir(dir.path().join("__pycache__")).unwrap();
        fs::write(dir.path().join("keep.txt"), "k").unwrap();

        let tree = DirectoryNode::build(dir.path(), &codec(), &ScanOptions::default()).unwrap();
        assert_eq!(tree.children().keys().collect::<Vec<_>>(), vec!["keep.txt"]);

        let tree = DirectoryNode::build(dir.path(), &codec(), &ScanOptions::none()).unwrap();
        assert_eq!(tree.children().len(), 2);
    }

    #[test]
    fn test_save_updates_kind_without_rescan() {
        let dir = TempDir::new().unwrap();
        let formats = FormatRegistry::standard();
        let mut tree = DirectoryNode::build(dir.path(), &codec(), &ScanOptions::default()).unwrap();
        assert_eq!(tree.kind(), EMPTY_KIND);

        tree.save(&DataValue::from("hi"), "a.txt", &formats).unwrap();
        assert_eq!(tree.kind(), "txt");

        fs::write(dir.path().join("outside.csv"), "x\n1\n").unwrap();
        assert_eq!(tree.children().len(), 1);

        tree.rebuild(&codec(), &ScanOptions::default()).unwrap();
        assert_eq!(tree.children().len(), 2);
        assert_eq!(tree.kind(), MIXED_KIND);
    }

    #[test]
    fn test_save_into_leaf_fails() {
        let mut leaf = DirectoryNode::leaf("/d/a.txt");
        let err = leaf
            .save(&DataValue::from("x"), "b.txt", &FormatRegistry::standard())
            .unwrap_err();
        assert!(matches!(err, StoreError::NotAFolder(_)));
    }

    #[test]
    fn test_load_folder_is_not_loadable() {
        let folder = DirectoryNode::folder("/d", Vec::new());
        let err = folder.load(&FormatRegistry::standard(), None).unwrap_err();
        assert!(matches!(err, StoreError::NotLoadable(_)));
    }
}
