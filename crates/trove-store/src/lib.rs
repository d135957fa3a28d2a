//! Trove Store Layer
//!
//! Filesystem side of Trove: formats, the scanned directory tree and the
//! versioned bundle codec.
//!
//! ## Modules
//!
//! - [`format`]: extension-keyed save/load strategies
//! - [`tree`]: [`DirectoryNode`] scanning, selection, saving and listings
//! - [`codec`]: [`ProvenanceCodec`] and its schema versions
//! - [`lineage`]: git-backed [`LineageSource`](trove_domain::LineageSource)
//!
//! ## Example
//!
//! ```no_run
//! use std::path::Path;
//! use trove_store::{DirectoryNode, FormatRegistry, ProvenanceCodec, ScanOptions};
//!
//! let codec = ProvenanceCodec::standard(FormatRegistry::standard());
//! let tree = DirectoryNode::build(Path::new("data"), &codec, &ScanOptions::default())?;
//! print!("{}", tree.render_listing(false));
//!
//! let latest = tree.select("raw")?.latest();
//! # Ok::<(), trove_store::StoreError>(())
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod codec;
pub mod error;
pub mod format;
pub mod lineage;
pub mod tree;

pub use codec::{BundleInfo, BundleName, BundleSchema, LoadOptions, ProvenanceCodec};
pub use error::{Result, StoreError};
pub use format::{CallableSnapshot, Format, FormatRegistry};
pub use lineage::GitLineage;
pub use tree::{DirectoryNode, ListingEntry, ScanOptions};

use std::path::Path;
use trove_domain::ProvenanceChain;

/// Load a file as the root of a new provenance chain
pub fn load_source(path: &Path) -> Result<ProvenanceChain> {
    FormatRegistry::standard().load_source(path)
}
