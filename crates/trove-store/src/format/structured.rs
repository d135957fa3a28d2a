//! Structured key-value text: JSON and YAML

use super::{mismatch, Format};
use crate::error::Result;
use std::fs;
use std::path::Path;
use trove_domain::DataValue;

/// Pretty-printed JSON; extension `json`.
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonFormat;

impl Format for JsonFormat {
    fn extension(&self) -> &str {
        "json"
    }

    fn write(&self, value: &DataValue, path: &Path) -> Result<()> {
        let object = value.as_object().ok_or_else(|| mismatch(self.extension(), value))?;
        let mut rendered = serde_json::to_string_pretty(object)?;
        rendered.push('\n');
        fs::write(path, rendered)?;
        Ok(())
    }

    fn load(&self, path: &Path) -> Result<DataValue> {
        let raw = fs::read_to_string(path)?;
        Ok(DataValue::Object(serde_json::from_str(&raw)?))
    }
}

/// YAML documents; registered under both `yaml` and `yml`.
#[derive(Debug, Clone)]
pub struct YamlFormat {
    extension: String,
}

impl YamlFormat {
    /// YAML format writing the given extension
    pub fn new(extension: &str) -> Self {
        Self {
            extension: extension.to_string(),
        }
    }
}

impl Default for YamlFormat {
    fn default() -> Self {
        Self::new("yaml")
    }
}

impl Format for YamlFormat {
    fn extension(&self) -> &str {
        &self.extension
    }

    fn write(&self, value: &DataValue, path: &Path) -> Result<()> {
        let object = value.as_object().ok_or_else(|| mismatch(self.extension(), value))?;
        fs::write(path, serde_yaml::to_string(object)?)?;
        Ok(())
    }

    fn load(&self, path: &Path) -> Result<DataValue> {
        let raw = fs::read_to_string(path)?;
        Ok(DataValue::Object(serde_yaml::from_str(&raw)?))
    }
}
