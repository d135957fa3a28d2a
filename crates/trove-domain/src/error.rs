//! Errors raised while building or replaying provenance chains

use thiserror::Error;

/// Result type alias for chain operations.
pub type Result<T> = std::result::Result<T, ChainError>;

/// Errors that can occur while transforming or replaying a chain
#[derive(Error, Debug)]
pub enum ChainError {
    /// The lineage policy requires a clean state and none was available
    #[error("Lineage is not clean ({reason}); dirty paths: [{}]", .dirty_paths.join(", "))]
    DirtyLineage {
        /// Why the lineage state was rejected
        reason: String,
        /// Paths reported as uncommitted by the lineage source
        dirty_paths: Vec<String>,
    },

    /// A step has no callable attached, so the chain cannot be replayed
    #[error("Step '{tag}' has no transform attached and cannot be replayed")]
    NotReplayable {
        /// Tag of the first step lacking a callable
        tag: String,
    },

    /// The chain holds no steps to replay
    #[error("Chain contains no replayable steps")]
    EmptyChain,

    /// A transformation returned an error
    #[error("Transform '{name}' failed: {reason}")]
    TransformFailed {
        /// Registered name of the failing transform
        name: String,
        /// Message reported by the transform
        reason: String,
    },

    /// A transform with this name is already registered
    #[error("A transform named '{0}' is already registered")]
    DuplicateTransform(String),

    /// The lineage source itself failed
    #[error("Lineage source error: {0}")]
    Lineage(String),
}
