//! Comma-separated tables

use super::{mismatch, Format};
use crate::error::Result;
use csv::{ReaderBuilder, WriterBuilder};
use std::path::Path;
use trove_domain::{DataValue, Table};

/// CSV with a header row; extension `csv`.
#[derive(Debug, Clone, Copy, Default)]
pub struct CsvFormat;

impl Format for CsvFormat {
    fn extension(&self) -> &str {
        "csv"
    }

    fn write(&self, value: &DataValue, path: &Path) -> Result<()> {
        let table = value.as_table().ok_or_else(|| mismatch(self.extension(), value))?;
        let mut writer = WriterBuilder::new().flexible(true).from_path(path)?;
        writer.write_record(&table.columns)?;
        for row in &table.rows {
            writer.write_record(row)?;
        }
        writer.flush()?;
        Ok(())
    }

    fn load(&self, path: &Path) -> Result<DataValue> {
        let mut reader = ReaderBuilder::new()
            .has_headers(true)
            .flexible(true)
            .from_path(path)?;

        let columns = reader
            .headers()?
            .iter()
            .map(|s: &str| s.to_string())
            .collect();

        let mut rows = Vec::new();
        for record in reader.records() {
            let record = record?;
            rows.push(record.iter().map(|s: &str| s.to_string()).collect());
        }
        Ok(DataValue::Table(Table::new(columns, rows)))
    }
}
