//! Output formatting for the CLI.

use crate::config::{OutputFormat, Project};
use crate::error::Result;
use colored::*;
use std::collections::BTreeMap;
use tabled::{
    builder::Builder,
    settings::{object::Rows, Alignment, Modify, Style},
};
use trove_domain::{DataValue, Parameters, RecordInfo};
use trove_store::{BundleInfo, DirectoryNode, ListingEntry};

/// Output formatter.
pub struct Formatter {
    format: OutputFormat,
    color_enabled: bool,
}

impl Formatter {
    /// Create a new formatter.
    pub fn new(format: OutputFormat, color_enabled: bool) -> Self {
        Self {
            format,
            color_enabled,
        }
    }

    /// Selected output format.
    pub fn format(&self) -> OutputFormat {
        self.format
    }

    /// Format a directory listing.
    pub fn format_listing(&self, node: &DirectoryNode, listing: &ListingEntry) -> Result<String> {
        match self.format {
            OutputFormat::Json => Ok(serde_json::to_string_pretty(&listing.to_json())?),
            OutputFormat::Table => Ok(listing.render().trim_end().to_string()),
            OutputFormat::Quiet => Ok(node
                .children()
                .values()
                .map(|c| c.path().display().to_string())
                .collect::<Vec<_>>()
                .join("\n")),
        }
    }

    /// Format a single node.
    pub fn format_node(&self, node: &DirectoryNode) -> Result<String> {
        match self.format {
            OutputFormat::Json => {
                let mut value = serde_json::json!({
                    "name": node.name(),
                    "type": node_type(node),
                    "kind": node.kind(),
                    "path": node.path(),
                    "children": node.children().keys().collect::<Vec<_>>(),
                });
                if let Some(version) = node.bundle_version() {
                    value["version"] = version.into();
                }
                Ok(serde_json::to_string_pretty(&value)?)
            }
            OutputFormat::Table => {
                let mut builder = Builder::default();
                builder.push_record(["Name", "Type", "Kind", "Entries", "Path"]);
                builder.push_record([
                    node.name().to_string(),
                    node_type(node).to_string(),
                    node.kind().to_string(),
                    node.children().len().to_string(),
                    node.path().display().to_string(),
                ]);
                Ok(self.finish_table(builder))
            }
            OutputFormat::Quiet => Ok(node.path().display().to_string()),
        }
    }

    /// Format bundle metadata as a step table.
    pub fn format_bundle_info(&self, info: &BundleInfo) -> Result<String> {
        match self.format {
            OutputFormat::Json => Ok(serde_json::to_string_pretty(info)?),
            OutputFormat::Quiet => Ok(info.path.display().to_string()),
            OutputFormat::Table => {
                let header = format!(
                    "{} (schema v{}, {} data, {} step(s))",
                    info.path.display(),
                    info.version,
                    info.data_kind,
                    info.steps.len()
                );
                if info.steps.is_empty() {
                    return Ok(format!("{}\n{}", header, self.colorize("No recorded steps.", "yellow")));
                }
                Ok(format!("{}\n{}", self.colorize(&header, "cyan"), self.format_steps(&info.steps)))
            }
        }
    }

    /// Format step records as a table.
    pub fn format_steps(&self, steps: &[RecordInfo]) -> String {
        let mut builder = Builder::default();
        builder.push_record(["#", "Tag", "Timestamp", "Lineage", "Transform", "Parameters"]);
        for (i, step) in steps.iter().enumerate() {
            let transform = match (&step.transform, &step.source_path) {
                (Some(reference), _) => reference.to_string(),
                (None, Some(path)) => format!("source: {}", path.display()),
                (None, None) => "-".to_string(),
            };
            builder.push_record([
                i.to_string(),
                step.tag.clone(),
                step.timestamp.to_string(),
                step.lineage_hash.clone(),
                transform,
                format_parameters(&step.parameters),
            ]);
        }
        self.finish_table(builder)
    }

    /// Format a loaded value.
    pub fn format_value(&self, value: &DataValue, limit: usize) -> Result<String> {
        if self.format == OutputFormat::Json {
            return Ok(serde_json::to_string_pretty(value)?);
        }
        match value {
            DataValue::Text(text) => Ok(text.clone()),
            DataValue::Object(object) => Ok(serde_json::to_string_pretty(object)?),
            DataValue::Table(table) => {
                let mut builder = Builder::default();
                builder.push_record(table.columns.iter().cloned());
                for row in table.rows.iter().take(limit) {
                    builder.push_record(row.iter().cloned());
                }
                let mut out = self.finish_table(builder);
                if table.len() > limit {
                    out.push('\n');
                    out.push_str(&self.info(&format!("{} of {} rows shown", limit, table.len())));
                }
                Ok(out)
            }
        }
    }

    /// Format registered projects.
    pub fn format_projects(&self, projects: &BTreeMap<String, Project>) -> Result<String> {
        match self.format {
            OutputFormat::Json => Ok(serde_json::to_string_pretty(projects)?),
            OutputFormat::Quiet => Ok(projects.keys().cloned().collect::<Vec<_>>().join("\n")),
            OutputFormat::Table => {
                if projects.is_empty() {
                    return Ok(self.info("No projects configured"));
                }
                let mut builder = Builder::default();
                builder.push_record(["Project", "Path", "Exists"]);
                for (name, project) in projects {
                    let exists = if project.path.is_dir() { "yes" } else { "no" };
                    builder.push_record([
                        name.clone(),
                        project.path.display().to_string(),
                        exists.to_string(),
                    ]);
                }
                Ok(self.finish_table(builder))
            }
        }
    }

    /// Format a success message.
    pub fn success(&self, message: &str) -> String {
        self.colorize(&format!("✓ {}", message), "green")
    }

    /// Format an info message.
    pub fn info(&self, message: &str) -> String {
        self.colorize(&format!("ℹ {}", message), "blue")
    }

    fn finish_table(&self, builder: Builder) -> String {
        let mut table = builder.build();
        table
            .with(Style::rounded())
            .with(Modify::new(Rows::first()).with(Alignment::center()));
        table.to_string()
    }

    /// Colorize text if color is enabled.
    fn colorize(&self, text: &str, color: &str) -> String {
        if !self.color_enabled {
            return text.to_string();
        }

        match color {
            "green" => text.green().to_string(),
            "blue" => text.blue().to_string(),
            "yellow" => text.yellow().to_string(),
            "cyan" => text.cyan().to_string(),
            _ => text.to_string(),
        }
    }
}

fn node_type(node: &DirectoryNode) -> &'static str {
    match node {
        DirectoryNode::Folder(_) => "folder",
        DirectoryNode::Leaf(_) => "file",
        DirectoryNode::Bundle(_) => "bundle",
    }
}

fn format_parameters(parameters: &Parameters) -> String {
    if parameters.is_empty() {
        return "-".to_string();
    }
    parameters
        .iter()
        .map(|(k, v)| format!("{}={}", k, v))
        .collect::<Vec<_>>()
        .join(", ")
}
