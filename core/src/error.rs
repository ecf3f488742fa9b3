//! Error taxonomy shared by the indexing and search runs.
//!
//! Every variant is fatal for the run that produced it. The binaries log the
//! error with its stage and propagate it; nothing is retried.

use std::path::PathBuf;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, VsmError>;

#[derive(Error, Debug)]
pub enum VsmError {
    /// Missing or malformed configuration key.
    #[error("configuration error in {file}: {message}")]
    Config { file: String, message: String },

    #[error("file not found: {}", .path.display())]
    NotFound { path: PathBuf },

    /// Malformed row, field or list literal. `line` is 1-based.
    #[error("parse error in {source_name} at line {line}: {message}")]
    Parse {
        source_name: String,
        line: usize,
        message: String,
    },

    /// Empty collection or zero document frequency.
    #[error("arithmetic fault: {0}")]
    Arithmetic(String),

    #[error("I/O error on {}: {}", .path.display(), .source)]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
}

impl VsmError {
    pub(crate) fn parse(source_name: &str, line: usize, message: impl Into<String>) -> Self {
        VsmError::Parse { source_name: source_name.to_string(), line, message: message.into() }
    }

    /// Maps an `open` failure to `NotFound` when the file is absent.
    pub(crate) fn from_io(path: &std::path::Path, source: std::io::Error) -> Self {
        if source.kind() == std::io::ErrorKind::NotFound {
            VsmError::NotFound { path: path.to_path_buf() }
        } else {
            VsmError::Io { path: path.to_path_buf(), source }
        }
    }
}
