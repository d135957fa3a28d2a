//! Command implementations.

pub mod describe;
pub mod latest;
pub mod ls;
pub mod project;
pub mod select;
pub mod show;

pub use self::describe::execute_describe;
pub use self::latest::execute_latest;
pub use self::ls::execute_ls;
pub use self::project::execute_project;
pub use self::select::execute_select;
pub use self::show::execute_show;

use crate::cli::TargetArgs;
use crate::config::Config;
use crate::error::Result;
use tracing::debug;
use trove_store::{DirectoryNode, FormatRegistry, ProvenanceCodec};

/// Codec with the built-in formats and schemas.
pub(crate) fn standard_codec() -> ProvenanceCodec {
    ProvenanceCodec::standard(FormatRegistry::standard())
}

/// Scan the target location and follow its hints.
pub(crate) fn open_target(target: &TargetArgs, config: &Config, codec: &ProvenanceCodec) -> Result<DirectoryNode> {
    let root_path = config.resolve_location(&target.location);
    debug!(location = %target.location, path = %root_path.display(), "resolved location");

    let mut node = DirectoryNode::build(&root_path, codec, &config.scan_options())?;
    for hint in &target.hints {
        node = node.select(hint)?.clone();
    }
    Ok(node)
}
