//! Error types for schema generation and persistence
//!
//! Only whole-run failures live here. A schema whose artifact drifted or
//! whose identifier would change is reported as an [`Outcome`] instead, so
//! a single run can surface every problem at once.
//!
//! [`Outcome`]: crate::pipeline::Outcome

use std::path::{Path, PathBuf};

use thiserror::Error;

/// Result type for schema operations
pub type Result<T> = std::result::Result<T, SchemaError>;

/// Schema tool errors
#[derive(Error, Debug)]
pub enum SchemaError {
    #[error("IO error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Not a directory: {0} exists but is not a directory")]
    NotADirectory(PathBuf),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Git error: {0}")]
    Git(#[from] git2::Error),

    #[error("Invalid schema descriptor {filename}: {reason}")]
    InvalidDescriptor { filename: String, reason: String },

    #[error("Duplicate schema path {path}: declared by both {first} and {second}")]
    DuplicatePath {
        path: PathBuf,
        first: String,
        second: String,
    },

    #[error("Unknown schema definition: {0}")]
    UnknownDefinition(String),

    #[error("Configuration error: {0}")]
    Config(#[from] config_crate::ConfigError),

    #[error("Fixture synchronization `{command}` failed ({status}):\n{output}")]
    Sync {
        command: String,
        status: String,
        output: String,
    },

    #[error("Diff rendering failed: {0}")]
    Diff(String),
}

/// Attach the offending path to an IO error.
pub(crate) fn io_err(path: &Path, source: std::io::Error) -> SchemaError {
    SchemaError::Io {
        path: path.to_path_buf(),
        source,
    }
}
