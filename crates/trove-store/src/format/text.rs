//! Plain text files

use super::{mismatch, Format};
use crate::error::Result;
use std::fs;
use std::path::Path;
use trove_domain::DataValue;

/// Text written verbatim; extension `txt`.
#[derive(Debug, Clone, Copy, Default)]
pub struct TextFormat;

impl Format for TextFormat {
    fn extension(&self) -> &str {
        "txt"
    }

    fn write(&self, value: &DataValue, path: &Path) -> Result<()> {
        let text = value.as_text().ok_or_else(|| mismatch(self.extension(), value))?;
        fs::write(path, text)?;
        Ok(())
    }

    fn load(&self, path: &Path) -> Result<DataValue> {
        Ok(DataValue::Text(fs::read_to_string(path)?))
    }
}
