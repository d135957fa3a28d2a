//! Error taxonomy for the filesystem layer

use std::path::PathBuf;
use thiserror::Error;
use trove_domain::ChainError;

/// Result type alias for store operations.
pub type Result<T> = std::result::Result<T, StoreError>;

/// Errors that can occur while scanning, loading or saving
#[derive(Error, Debug)]
pub enum StoreError {
    /// Missing path or zero selection matches
    #[error("Not found: {0}")]
    NotFound(String),

    /// Several children matched a hint and exact-kind narrowing did not settle it
    #[error("More than one match for '{hint}': [{}]", .candidates.join(", "))]
    AmbiguousSelection {
        /// The hint that was searched for
        hint: String,
        /// Names of the remaining candidates
        candidates: Vec<String>,
    },

    /// Bundle written by a schema version this build does not know
    #[error("Bundle schema version {version} is not supported; known versions: {known:?}")]
    UnsupportedSchema {
        /// Version found in the bundle
        version: u32,
        /// Versions registered with the codec
        known: Vec<u32>,
    },

    /// Bundle is missing a component file, has more than one, or has one of the wrong kind
    #[error("Bundle {}: {}", .bundle.display(), structural_detail(.component, .candidates))]
    Structural {
        /// Bundle directory
        bundle: PathBuf,
        /// Component that was searched for
        component: String,
        /// Files that matched, empty when none did
        candidates: Vec<String>,
    },

    /// Bundle directory name does not fit any naming grammar
    #[error("Bundle name could not be parsed: {name} ({reason})")]
    Parse {
        /// The offending name
        name: String,
        /// What was wrong with it
        reason: String,
    },

    /// No format registered for an extension
    #[error("Format '{hint}' not recognized; registered formats: [{}]", .known.join(", "))]
    UnknownFormat {
        /// Extension or file name that was looked up
        hint: String,
        /// Registered extensions
        known: Vec<String>,
    },

    /// Refusing to overwrite an existing file or bundle
    #[error("Already exists: {}", .0.display())]
    AlreadyExists(PathBuf),

    /// A schema version was registered twice
    #[error("A bundle schema is already registered as version {0}")]
    DuplicateSchema(u32),

    /// Node type cannot be loaded as a value
    #[error("{} is a folder and cannot be loaded", .0.display())]
    NotLoadable(PathBuf),

    /// Operation needs a folder
    #[error("{} is not a folder", .0.display())]
    NotAFolder(PathBuf),

    /// A format was handed a value it cannot write
    #[error("Format '{format}' cannot store a {actual} value")]
    ValueMismatch {
        /// Format extension
        format: String,
        /// Kind of value that was supplied
        actual: String,
    },

    /// Binary snapshot is malformed
    #[error("Invalid snapshot {}: {reason}", .path.display())]
    Snapshot {
        /// Snapshot file
        path: PathBuf,
        /// What was wrong
        reason: String,
    },

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// CSV error
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// JSON error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// YAML error
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// Error from the provenance model
    #[error(transparent)]
    Chain(#[from] ChainError),
}

fn structural_detail(component: &str, candidates: &[String]) -> String {
    match candidates {
        [] => format!("no '{}' file found", component),
        [only] => format!("expected '{}', found {}", component, only),
        several => format!("more than one '{}' file: [{}]", component, several.join(", ")),
    }
}

impl StoreError {
    /// NotFound for a path
    pub fn missing_path(path: &std::path::Path) -> Self {
        StoreError::NotFound(format!("path {} does not exist", path.display()))
    }
}
