//! Transform records - one entry per step in a provenance chain

use crate::transform::{Transform, TransformRef};
use crate::value::Parameters;
use chrono::{Local, NaiveDateTime, Timelike};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;

/// Format used for timestamps in records and bundle names.
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d_%H-%M-%S";

/// Unique identifier for a step, based on UUIDv7
///
/// Time-ordered, so sorting ids sorts steps by creation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct StepId(u128);

impl StepId {
    /// Generate a new UUIDv7-based StepId
    pub fn new() -> Self {
        Self(uuid::Uuid::now_v7().as_u128())
    }

    /// Create a StepId from a raw value
    pub fn from_value(value: u128) -> Self {
        Self(value)
    }

    /// Raw u128 value
    pub fn value(&self) -> u128 {
        self.0
    }
}

impl Default for StepId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for StepId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", uuid::Uuid::from_u128(self.0))
    }
}

impl std::str::FromStr for StepId {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        uuid::Uuid::parse_str(s)
            .map(|u| Self(u.as_u128()))
            .map_err(|e| format!("Invalid step id '{}': {}", s, e))
    }
}

impl Serialize for StepId {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for StepId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}

/// Creation instant of a record, second precision, local time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Timestamp(NaiveDateTime);

impl Timestamp {
    /// Current local time truncated to the second
    pub fn now() -> Self {
        Self::from_datetime(Local::now().naive_local())
    }

    /// Wrap a datetime, dropping sub-second precision
    pub fn from_datetime(datetime: NaiveDateTime) -> Self {
        Self(datetime.with_nanosecond(0).unwrap_or(datetime))
    }

    /// Parse the `YYYY-MM-DD_HH-MM-SS` form
    pub fn parse(s: &str) -> Result<Self, String> {
        NaiveDateTime::parse_from_str(s, TIMESTAMP_FORMAT)
            .map(Self)
            .map_err(|e| format!("Invalid timestamp '{}': {}", s, e))
    }

    /// Underlying datetime
    pub fn datetime(&self) -> NaiveDateTime {
        self.0
    }
}

impl fmt::Display for Timestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.format(TIMESTAMP_FORMAT))
    }
}

impl Serialize for Timestamp {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for Timestamp {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        Timestamp::parse(&raw).map_err(serde::de::Error::custom)
    }
}

/// How a record came to exist, and whether it can run.
#[derive(Debug, Clone)]
pub enum RecordOrigin {
    /// Produced in this process; callable present
    Live(Arc<Transform>),
    /// Restored from a bundle with its transform resolved
    Replayed(Arc<Transform>),
    /// Root record pointing at an externally authored input file
    SourceFile {
        /// Path of the source file
        path: PathBuf,
    },
    /// Metadata only; the callable was not loaded
    ReferenceOnly,
}

impl RecordOrigin {
    /// The attached transform, for Live and Replayed records
    pub fn transform(&self) -> Option<&Arc<Transform>> {
        match self {
            RecordOrigin::Live(t) | RecordOrigin::Replayed(t) => Some(t),
            _ => None,
        }
    }

    /// Short label for listings
    pub fn label(&self) -> &'static str {
        match self {
            RecordOrigin::Live(_) => "live",
            RecordOrigin::Replayed(_) => "replayed",
            RecordOrigin::SourceFile { .. } => "source_file",
            RecordOrigin::ReferenceOnly => "reference_only",
        }
    }
}

/// One step of a provenance chain. Immutable once created.
#[derive(Debug, Clone)]
pub struct TransformRecord {
    /// Unique step id
    pub id: StepId,
    /// Short human label, may be empty
    pub tag: String,
    /// When the step ran
    pub timestamp: Timestamp,
    /// Opaque identifier of the producing code state
    pub lineage_hash: String,
    /// Source text of the transform, for audit only
    pub code_text: String,
    /// Parameters the transform was called with
    pub parameters: Parameters,
    /// Persisted identity of the transform, if this step ran one
    pub transform_ref: Option<TransformRef>,
    /// How the record was obtained
    pub origin: RecordOrigin,
}

impl TransformRecord {
    /// Record for a transform that just ran
    pub fn live(
        transform: Arc<Transform>,
        tag: String,
        lineage_hash: String,
        parameters: Parameters,
    ) -> Self {
        Self {
            id: StepId::new(),
            tag,
            timestamp: Timestamp::now(),
            lineage_hash,
            code_text: transform.source().to_string(),
            parameters,
            transform_ref: Some(transform.reference()),
            origin: RecordOrigin::Live(transform),
        }
    }

    /// Root record for data read from a file
    pub fn source_file(path: PathBuf) -> Self {
        Self {
            id: StepId::new(),
            tag: String::new(),
            timestamp: Timestamp::now(),
            lineage_hash: String::new(),
            code_text: format!("Source file: {}", path.display()),
            parameters: Parameters::new(),
            transform_ref: None,
            origin: RecordOrigin::SourceFile { path },
        }
    }

    /// Rebuild a record from persisted metadata
    ///
    /// The origin is decided by the caller: `Replayed` when the transform
    /// resolved, `ReferenceOnly` otherwise. Source-file records keep their path.
    pub fn from_info(info: RecordInfo, transform: Option<Arc<Transform>>) -> Self {
        let origin = match (&info.source_path, transform) {
            (Some(path), _) => RecordOrigin::SourceFile { path: path.clone() },
            (None, Some(t)) => RecordOrigin::Replayed(t),
            (None, None) => RecordOrigin::ReferenceOnly,
        };
        Self {
            id: info.id,
            tag: info.tag,
            timestamp: info.timestamp,
            lineage_hash: info.lineage_hash,
            code_text: info.code,
            parameters: info.parameters,
            transform_ref: info.transform,
            origin,
        }
    }

    /// Whether this step can be re-executed
    pub fn is_replayable(&self) -> bool {
        self.origin.transform().is_some()
    }

    /// Public, serializable view of this record (never the callable)
    pub fn info(&self) -> RecordInfo {
        RecordInfo {
            id: self.id,
            tag: self.tag.clone(),
            timestamp: self.timestamp,
            lineage_hash: self.lineage_hash.clone(),
            code: self.code_text.clone(),
            parameters: self.parameters.clone(),
            transform: self.transform_ref.clone(),
            source_path: match &self.origin {
                RecordOrigin::SourceFile { path } => Some(path.clone()),
                _ => None,
            },
        }
    }
}

/// Serializable public fields of a [`TransformRecord`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecordInfo {
    /// Step id
    #[serde(rename = "step_id", default)]
    pub id: StepId,
    /// Tag
    #[serde(default)]
    pub tag: String,
    /// Creation time
    pub timestamp: Timestamp,
    /// Lineage hash
    #[serde(default)]
    pub lineage_hash: String,
    /// Code text
    #[serde(default)]
    pub code: String,
    /// Parameters
    #[serde(default)]
    pub parameters: Parameters,
    /// Transform reference, absent for source-file records
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub transform: Option<TransformRef>,
    /// Source path, present only for source-file records
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_path: Option<PathBuf>,
}
