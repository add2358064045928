//! Error types for the document layer.

use janosh_kv::KvError;

use crate::path::{Path, PathError};
use crate::value::ValueError;

/// Errors raised by records and the tree engine.
///
/// Each error names the path it originated from. Multi-step mutations may
/// have written part of their work before failing; the enclosing transaction
/// is what undoes it.
#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error("path error: {0}")]
    Path(#[from] PathError),

    #[error("corrupt value at {path}: {source}")]
    Value { path: Path, source: ValueError },

    #[error("index {index} out of bounds at {path} (size {size})")]
    OutOfBounds {
        path: Path,
        index: usize,
        size: usize,
    },

    #[error("invalid target {path}: {message}")]
    InvalidTarget { path: Path, message: String },

    #[error("{from} is an ancestor of {to}")]
    Cycle { from: Path, to: Path },

    #[error("corrupt container {path}: {message}")]
    CorruptContainer { path: Path, message: String },

    #[error("store error: {0}")]
    Store(#[from] KvError),

    #[error("config error: {message}")]
    Config { message: String },

    #[error("visitor error: {message}")]
    Visitor { message: String },
}

impl Error {
    pub fn invalid_target(path: &Path, message: impl Into<String>) -> Self {
        Error::InvalidTarget {
            path: path.clone(),
            message: message.into(),
        }
    }

    pub fn corrupt(path: &Path, message: impl Into<String>) -> Self {
        Error::CorruptContainer {
            path: path.clone(),
            message: message.into(),
        }
    }

    /// The path the error originated from, when there is one.
    pub fn path(&self) -> Option<&Path> {
        match self {
            Error::Value { path, .. }
            | Error::OutOfBounds { path, .. }
            | Error::InvalidTarget { path, .. }
            | Error::CorruptContainer { path, .. } => Some(path),
            Error::Cycle { from, .. } => Some(from),
            _ => None,
        }
    }
}
