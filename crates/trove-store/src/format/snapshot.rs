//! Binary snapshots of values and transform references
//!
//! # Layout
//! Big endian:
//! - Magic (`TRSN`): 4 bytes
//! - Snapshot version (u8): 1 byte
//! - Payload kind (u8): 1 byte
//! - Reserved (u16): 2 bytes
//! - Payload length (u32): 4 bytes
//! - Payload: JSON
//!
//! Total header: 12 bytes

use super::{mismatch, Format};
use crate::error::{Result, StoreError};
use byteorder::{BigEndian, ReadBytesExt, WriteBytesExt};
use serde::{Deserialize, Serialize};
use std::fs;
use std::io::Cursor;
use std::path::Path;
use trove_domain::{DataValue, Parameters, TransformRef};

const MAGIC: &[u8; 4] = b"TRSN";
const SNAPSHOT_VERSION: u8 = 1;
const HEADER_SIZE: usize = 12;

/// What a snapshot payload holds
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum PayloadKind {
    /// A serialized `DataValue`
    Value = 1,
    /// A list of [`CallableSnapshot`] entries
    TransformRefs = 2,
}

impl PayloadKind {
    fn from_u8(value: u8) -> Option<Self> {
        match value {
            1 => Some(PayloadKind::Value),
            2 => Some(PayloadKind::TransformRefs),
            _ => None,
        }
    }
}

fn encode(kind: PayloadKind, payload: &[u8]) -> std::io::Result<Vec<u8>> {
    let len = u32::try_from(payload.len()).map_err(|_| {
        std::io::Error::new(std::io::ErrorKind::InvalidInput, "snapshot payload exceeds 4GB")
    })?;
    let mut buf = Vec::with_capacity(HEADER_SIZE + payload.len());
    buf.extend_from_slice(MAGIC);
    buf.write_u8(SNAPSHOT_VERSION)?;
    buf.write_u8(kind as u8)?;
    buf.write_u16::<BigEndian>(0)?;
    buf.write_u32::<BigEndian>(len)?;
    buf.extend_from_slice(payload);
    Ok(buf)
}

fn decode<'a>(path: &Path, bytes: &'a [u8], expected: PayloadKind) -> Result<&'a [u8]> {
    let invalid = |reason: String| StoreError::Snapshot {
        path: path.to_path_buf(),
        reason,
    };

    if bytes.len() < HEADER_SIZE {
        return Err(invalid(format!(
            "header too short: expected {} bytes, got {}",
            HEADER_SIZE,
            bytes.len()
        )));
    }
    if &bytes[..4] != MAGIC {
        return Err(invalid("missing TRSN magic".to_string()));
    }

    let mut cursor = Cursor::new(&bytes[4..HEADER_SIZE]);
    let version = cursor.read_u8()?;
    let kind_raw = cursor.read_u8()?;
    let _reserved = cursor.read_u16::<BigEndian>()?;
    let payload_len = cursor.read_u32::<BigEndian>()? as usize;

    if version != SNAPSHOT_VERSION {
        return Err(invalid(format!(
            "snapshot version mismatch: expected {}, got {}",
            SNAPSHOT_VERSION, version
        )));
    }
    match PayloadKind::from_u8(kind_raw) {
        Some(kind) if kind == expected => {}
        _ => {
            return Err(invalid(format!(
                "payload kind {} does not match expected {:?}",
                kind_raw, expected
            )))
        }
    }

    let payload = &bytes[HEADER_SIZE..];
    if payload.len() != payload_len {
        return Err(invalid(format!(
            "payload length mismatch: expected {}, got {}",
            payload_len,
            payload.len()
        )));
    }
    Ok(payload)
}

/// Any value, snapshotted; extension `snap`.
#[derive(Debug, Clone, Copy, Default)]
pub struct ObjectSnapshotFormat;

impl Format for ObjectSnapshotFormat {
    fn extension(&self) -> &str {
        "snap"
    }

    fn write(&self, value: &DataValue, path: &Path) -> Result<()> {
        let payload = serde_json::to_vec(value)?;
        fs::write(path, encode(PayloadKind::Value, &payload)?)?;
        Ok(())
    }

    fn load(&self, path: &Path) -> Result<DataValue> {
        let bytes = fs::read(path)?;
        let payload = decode(path, &bytes, PayloadKind::Value)?;
        Ok(serde_json::from_slice(payload)?)
    }
}

/// What is persisted in place of a callable: the transform to resolve and
/// the parameters it was bound with.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CallableSnapshot {
    /// Tag of the step this snapshot was taken from
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub tag: String,
    /// Transform identity, absent for steps that ran no transform
    #[serde(default)]
    pub transform: Option<TransformRef>,
    /// Parameters bound at execution time
    #[serde(default)]
    pub parameters: Parameters,
}

impl CallableSnapshot {
    /// Pack a list of snapshots into the value this format writes
    pub fn pack(entries: &[CallableSnapshot]) -> Result<DataValue> {
        Ok(DataValue::Object(serde_json::to_value(entries)?))
    }

    /// Unpack a value read by this format
    pub fn unpack(value: DataValue) -> Result<Vec<CallableSnapshot>> {
        match value {
            DataValue::Object(raw) => Ok(serde_json::from_value(raw)?),
            other => Err(mismatch("fnref", &other)),
        }
    }
}

/// Transform-reference snapshots; extension `fnref`.
///
/// Accepts only values produced by [`CallableSnapshot::pack`].
#[derive(Debug, Clone, Copy, Default)]
pub struct TransformSnapshotFormat;

impl Format for TransformSnapshotFormat {
    fn extension(&self) -> &str {
        "fnref"
    }

    fn write(&self, value: &DataValue, path: &Path) -> Result<()> {
        let entries = match value {
            DataValue::Object(raw @ serde_json::Value::Array(_)) => raw,
            other => return Err(mismatch(self.extension(), other)),
        };
        let payload = serde_json::to_vec(entries)?;
        fs::write(path, encode(PayloadKind::TransformRefs, &payload)?)?;
        Ok(())
    }

    fn load(&self, path: &Path) -> Result<DataValue> {
        let bytes = fs::read(path)?;
        let payload = decode(path, &bytes, PayloadKind::TransformRefs)?;
        Ok(DataValue::Object(serde_json::from_slice(payload)?))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;
    use trove_domain::Table;

    #[test]
    fn test_object_snapshot_roundtrip_all_variants() {
        let dir = TempDir::new().unwrap();
        let values = [
            DataValue::from("text"),
            DataValue::Table(Table::new(vec!["a".into()], vec![vec!["1".into()]])),
            DataValue::Object(serde_json::json!({"k": [1, 2, 3]})),
        ];
        for (i, value) in values.iter().enumerate() {
            let path = ObjectSnapshotFormat.save(value, &format!("v{}", i), dir.path()).unwrap();
            assert_eq!(&ObjectSnapshotFormat.load(&path).unwrap(), value);
        }
    }

    #[test]
    fn test_header_layout() {
        let bytes = encode(PayloadKind::Value, b"{}").unwrap();
        assert_eq!(bytes.len(), HEADER_SIZE + 2);
        assert_eq!(&bytes[..4], b"TRSN");
        assert_eq!(bytes[4], SNAPSHOT_VERSION);
        assert_eq!(bytes[5], PayloadKind::Value as u8);
        assert_eq!(&bytes[8..12], &[0, 0, 0, 2]);
    }

    #[test]
    fn test_decode_rejects_wrong_kind() {
        let bytes = encode(PayloadKind::Value, b"{}").unwrap();
        let err = decode(Path::new("x.fnref"), &bytes, PayloadKind::TransformRefs).unwrap_err();
        assert!(matches!(err, StoreError::Snapshot { .. }));
    }

    #[test]
    fn test_decode_rejects_truncated_payload() {
        let mut bytes = encode(PayloadKind::Value, b"{\"a\":1}").unwrap();
        bytes.truncate(bytes.len() - 2);
        let err = decode(Path::new("x.snap"), &bytes, PayloadKind::Value).unwrap_err();
        assert!(err.to_string().contains("payload length mismatch"));
    }

    #[test]
    fn test_decode_rejects_foreign_file() {
        let err = decode(Path::new("x.snap"), b"not a snapshot at all", PayloadKind::Value).unwrap_err();
        assert!(err.to_string().contains("magic"));
    }

    #[test]
    fn test_callable_snapshot_roundtrip() {
        let dir = TempDir::new().unwrap();
        let mut parameters = Parameters::new();
        parameters.insert("factor".into(), serde_json::json!(2));
        let entries = vec![
            CallableSnapshot {
                tag: "scaled".into(),
                transform: Some(TransformRef { name: "scale".into(), version: 1 }),
                parameters,
            },
            CallableSnapshot::default(),
        ];

        let path = TransformSnapshotFormat
            .save(&CallableSnapshot::pack(&entries).unwrap(), "func", dir.path())
            .unwrap();
        let loaded = CallableSnapshot::unpack(TransformSnapshotFormat.load(&path).unwrap()).unwrap();
        assert_eq!(loaded, entries);
    }
}
