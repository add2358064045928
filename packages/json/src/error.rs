//! Errors for the JSON bridge.

use janosh_core::Path;

/// Errors from converting between JSON and the tree.
#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error(transparent)]
    Tree(#[from] janosh_core::Error),

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),

    /// A stored number that JSON cannot represent.
    #[error("number {text} cannot be represented in JSON")]
    Number { text: String },

    #[error("{path} produced no document")]
    Empty { path: Path },
}
