//! Data payloads carried by provenance chains

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Keyword parameters captured when a transform runs.
pub type Parameters = BTreeMap<String, serde_json::Value>;

/// A rectangular table of string cells with a header row.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Table {
    /// Column names, in order
    pub columns: Vec<String>,
    /// Data rows; each row has one cell per column
    pub rows: Vec<Vec<String>>,
}

impl Table {
    /// Create a table from column names and rows
    pub fn new(columns: Vec<String>, rows: Vec<Vec<String>>) -> Self {
        Self { columns, rows }
    }

    /// Index of a column by name
    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == name)
    }

    /// Number of data rows
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// Whether the table has no data rows
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

/// A dataset held in memory.
///
/// Formats in `trove-store` decide which variants they can write; the
/// binary snapshot format accepts all of them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "snake_case")]
pub enum DataValue {
    /// Plain text
    Text(String),
    /// Tabular data
    Table(Table),
    /// Structured key-value data
    Object(serde_json::Value),
}

impl DataValue {
    /// Name of the variant, used in error messages
    pub fn kind(&self) -> &'static str {
        match self {
            DataValue::Text(_) => "text",
            DataValue::Table(_) => "table",
            DataValue::Object(_) => "object",
        }
    }

    /// Borrow the text payload, if this is text
    pub fn as_text(&self) -> Option<&str> {
        match self {
            DataValue::Text(text) => Some(text),
            _ => None,
        }
    }

    /// Borrow the table payload, if this is a table
    pub fn as_table(&self) -> Option<&Table> {
        match self {
            DataValue::Table(table) => Some(table),
            _ => None,
        }
    }

    /// Borrow the object payload, if this is an object
    pub fn as_object(&self) -> Option<&serde_json::Value> {
        match self {
            DataValue::Object(value) => Some(value),
            _ => None,
        }
    }
}

impl From<String> for DataValue {
    fn from(text: String) -> Self {
        DataValue::Text(text)
    }
}

impl From<&str> for DataValue {
    fn from(text: &str) -> Self {
        DataValue::Text(text.to_string())
    }
}

impl From<Table> for DataValue {
    fn from(table: Table) -> Self {
        DataValue::Table(table)
    }
}

impl From<serde_json::Value> for DataValue {
    fn from(value: serde_json::Value) -> Self {
        DataValue::Object(value)
    }
}

impl fmt::Display for DataValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DataValue::Text(text) => write!(f, "{}", text),
            DataValue::Table(table) => {
                writeln!(f, "{}", table.columns.join("\t"))?;
                for row in &table.rows {
                    writeln!(f, "{}", row.join("\t"))?;
                }
                Ok(())
            }
            DataValue::Object(value) => {
                let rendered = serde_json::to_string_pretty(value).map_err(|_| fmt::Error)?;
                write!(f, "{}", rendered)
            }
        }
    }
}
