//! Nested summaries of a tree for display

use super::DirectoryNode;
use serde_json::{Map, Value};

/// Indentation per nesting level when rendering.
const INDENT: &str = "    ";

/// One line of a listing, possibly with nested lines under it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ListingEntry {
    /// A folder, rendered with a trailing `/` when it has entries
    Dir {
        /// Folder name
        name: String,
        /// Nested lines
        entries: Vec<ListingEntry>,
    },
    /// A file name, a bundle description or a collapsed summary
    Item(String),
}

impl ListingEntry {
    /// Summarize a node, treating it as the root of the listing
    ///
    /// Folders holding subfolders (bundles count) always expand; folders
    /// holding only files collapse to `"<n> <kind> items"` unless `full` is set
    /// or they are the root.
    pub fn of(node: &DirectoryNode, full: bool) -> Self {
        build(node, full, true)
    }

    /// Render with four spaces per level, one line per entry
    pub fn render(&self) -> String {
        let mut out = String::new();
        self.render_into(&mut out, 0);
        out
    }

    fn render_into(&self, out: &mut String, depth: usize) {
        let indent = INDENT.repeat(depth);
        match self {
            ListingEntry::Item(text) => {
                out.push_str(&format!("{}{}\n", indent, text));
            }
            ListingEntry::Dir { name, entries } if entries.is_empty() => {
                out.push_str(&format!("{}{}\n", indent, name));
            }
            ListingEntry::Dir { name, entries } => {
                out.push_str(&format!("{}{}/\n", indent, name));
                for entry in entries {
                    entry.render_into(out, depth + 1);
                }
            }
        }
    }

    /// JSON form: folders become `{name: [entries]}`, items plain strings
    pub fn to_json(&self) -> Value {
        match self {
            ListingEntry::Item(text) => Value::String(text.clone()),
            ListingEntry::Dir { name, entries } => {
                let mut object = Map::new();
                object.insert(name.clone(), entries.iter().map(ListingEntry::to_json).collect());
                Value::Object(object)
            }
        }
    }
}

fn build(node: &DirectoryNode, full: bool, top: bool) -> ListingEntry {
    match node {
        DirectoryNode::Leaf(_) => ListingEntry::Item(node.name().to_string()),
        DirectoryNode::Bundle(bundle) => {
            let label = if bundle.header.tag.is_empty() {
                node.name()
            } else {
                bundle.header.tag.as_str()
            };
            ListingEntry::Item(format!("{}.{}", label, node.kind()))
        }
        DirectoryNode::Folder(folder) => {
            let children = &folder.children;
            let mut entries = Vec::new();
            if !children.is_empty() {
                let has_subdirs = children.values().any(|c| !c.is_leaf());
                if has_subdirs || full || top {
                    entries.extend(
                        children
                            .values()
                            .filter(|c| !c.is_leaf())
                            .map(|c| build(c, full, false)),
                    );
                    entries.extend(
                        children
                            .values()
                            .filter(|c| c.is_leaf())
                            .map(|c| ListingEntry::Item(c.name().to_string())),
                    );
                } else {
                    entries.push(ListingEntry::Item(format!("{} {} items", children.len(), node.kind())));
                }
            }
            ListingEntry::Dir {
                name: node.name().to_string(),
                entries,
            }
        }
    }
}
