//! Bundle directory naming
//!
//! `trove_bundle__<YYYY-MM-DD_HH-MM-SS>__<lineage-hash>[__<tag>]` (version 0)
//! `trove_bundle__<YYYY-MM-DD_HH-MM-SS>[__<tag>]` (version 1 onward)

use crate::error::{Result, StoreError};
use serde::Serialize;
use std::fmt;
use trove_domain::Timestamp;

/// Leading component of every bundle directory name.
pub const BUNDLE_PREFIX: &str = "trove_bundle";

/// Separator between name components.
pub const DELIMITER: &str = "__";

/// Whether a directory name follows the bundle convention
pub fn is_bundle_name(name: &str) -> bool {
    name.split(DELIMITER).next() == Some(BUNDLE_PREFIX) && name.contains(DELIMITER)
}

/// Parsed components of a bundle directory name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BundleName {
    /// When the bundle was written
    pub timestamp: Timestamp,
    /// Lineage hash; only legacy names carry it
    #[serde(skip_serializing_if = "Option::is_none")]
    pub lineage_hash: Option<String>,
    /// Tag, empty when none was given
    pub tag: String,
}

impl BundleName {
    /// Name in the legacy layout, lineage hash included
    pub fn legacy(timestamp: Timestamp, lineage_hash: impl Into<String>, tag: impl Into<String>) -> Self {
        Self {
            timestamp,
            lineage_hash: Some(lineage_hash.into()),
            tag: tag.into(),
        }
    }

    /// Name in the current layout
    pub fn current(timestamp: Timestamp, tag: impl Into<String>) -> Self {
        Self {
            timestamp,
            lineage_hash: None,
            tag: tag.into(),
        }
    }

    /// Parse a legacy name: 3 components, or 4 with a tag
    pub fn parse_legacy(name: &str) -> Result<Self> {
        let parts = split(name)?;
        match parts.as_slice() {
            [_, ts, hash] => Ok(Self::legacy(parse_timestamp(name, ts)?, *hash, "")),
            [_, ts, hash, tag] => Ok(Self::legacy(parse_timestamp(name, ts)?, *hash, *tag)),
            _ => Err(component_count(name, parts.len(), "3 or 4")),
        }
    }

    /// Parse a current name: 2 components, or 3 with a tag
    pub fn parse_current(name: &str) -> Result<Self> {
        let parts = split(name)?;
        match parts.as_slice() {
            [_, ts] => Ok(Self::current(parse_timestamp(name, ts)?, "")),
            [_, ts, tag] => Ok(Self::current(parse_timestamp(name, ts)?, *tag)),
            _ => Err(component_count(name, parts.len(), "2 or 3")),
        }
    }
}

impl fmt::Display for BundleName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}{}", BUNDLE_PREFIX, DELIMITER, self.timestamp)?;
        if let Some(hash) = &self.lineage_hash {
            write!(f, "{}{}", DELIMITER, hash)?;
        }
        if !self.tag.is_empty() {
            write!(f, "{}{}", DELIMITER, self.tag)?;
        }
        Ok(())
    }
}

/// Reject tags that would break the naming grammar
pub fn validate_tag(tag: &str) -> Result<()> {
    if tag.contains(DELIMITER) || tag.contains('/') || tag.contains('\\') {
        return Err(StoreError::Parse {
            name: tag.to_string(),
            reason: format!("tags may not contain '{}' or path separators", DELIMITER),
        });
    }
    Ok(())
}

fn split(name: &str) -> Result<Vec<&str>> {
    let parts: Vec<&str> = name.split(DELIMITER).collect();
    if parts[0] != BUNDLE_PREFIX {
        return Err(StoreError::Parse {
            name: name.to_string(),
            reason: format!("expected prefix '{}'", BUNDLE_PREFIX),
        });
    }
    Ok(parts)
}

fn parse_timestamp(name: &str, raw: &str) -> Result<Timestamp> {
    Timestamp::parse(raw).map_err(|reason| StoreError::Parse {
        name: name.to_string(),
        reason,
    })
}

fn component_count(name: &str, found: usize, expected: &str) -> StoreError {
    StoreError::Parse {
        name: name.to_string(),
        reason: format!("expected {} '{}'-delimited components, found {}", expected, DELIMITER, found),
    }
}
