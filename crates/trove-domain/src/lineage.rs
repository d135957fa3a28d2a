//! Lineage sources and the clean-lineage policy
//!
//! A lineage hash identifies the state of the code that produced a step.
//! Where it comes from is injectable; `trove-store` ships a git-backed source.

use crate::error::{ChainError, Result};

/// Hash recorded when no lineage information is available.
pub const NO_LINEAGE_HASH: &str = "no_lineage_hash";

/// Snapshot of the producing code's state.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LineageState {
    /// Identifier of the code state, if one could be determined
    pub hash: Option<String>,
    /// Paths with uncommitted changes
    pub dirty_paths: Vec<String>,
}

impl LineageState {
    /// A clean state at the given hash
    pub fn clean(hash: impl Into<String>) -> Self {
        Self {
            hash: Some(hash.into()),
            dirty_paths: Vec::new(),
        }
    }

    /// Whether the state has a hash and no uncommitted changes
    pub fn is_clean(&self) -> bool {
        self.hash.is_some() && self.dirty_paths.is_empty()
    }

    /// The hash to record, or the sentinel
    pub fn recorded_hash(&self) -> String {
        self.hash.clone().unwrap_or_else(|| NO_LINEAGE_HASH.to_string())
    }
}

/// Something that can report the current lineage state.
pub trait LineageSource {
    /// Resolve the current state
    fn resolve(&self) -> Result<LineageState>;
}

/// Lineage source that always reports the same clean hash.
#[derive(Debug, Clone)]
pub struct StaticLineage(pub String);

impl LineageSource for StaticLineage {
    fn resolve(&self) -> Result<LineageState> {
        Ok(LineageState::clean(self.0.clone()))
    }
}

/// Lineage source that never knows a hash.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoLineage;

impl LineageSource for NoLineage {
    fn resolve(&self) -> Result<LineageState> {
        Ok(LineageState::default())
    }
}

/// Whether a transformation may be recorded without a clean lineage state.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum LineagePolicy {
    /// Refuse to record unless the lineage is known and clean
    RequireClean,
    /// Record whatever is available
    #[default]
    AllowDirty,
}

impl LineagePolicy {
    /// Check a state against the policy, returning the hash to record
    pub fn enforce(&self, state: &LineageState) -> Result<String> {
        if *self == LineagePolicy::RequireClean && !state.is_clean() {
            let reason = if state.hash.is_none() {
                "no lineage hash available; use AllowDirty to override".to_string()
            } else {
                "uncommitted changes present; commit them or use AllowDirty".to_string()
            };
            return Err(ChainError::DirtyLineage {
                reason,
                dirty_paths: state.dirty_paths.clone(),
            });
        }
        Ok(state.recorded_hash())
    }
}
