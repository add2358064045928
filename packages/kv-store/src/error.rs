//! Error types for the KV layer.
//!
//! Errors at this level are engine-focused. No semantic errors like
//! "invalid path" or "size mismatch" - those belong in the document layer.

/// Errors raised by an ordered key-value engine.
#[derive(Debug)]
pub enum KvError {
    /// Generic I/O or engine failure.
    Transport(Box<dyn std::error::Error + Send + Sync>),

    /// The operation is not supported by this engine.
    NotSupported,

    /// `begin_transaction` was called while a transaction was open.
    TransactionActive,

    /// `end_transaction` was called with no open transaction.
    NoTransaction,

    /// A lock guarding the keyspace was poisoned by a panicking writer.
    Poisoned,

    /// A snapshot file could not be read or written.
    Snapshot { message: String },
}

impl std::fmt::Display for KvError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            KvError::Transport(e) => write!(f, "transport error: {}", e),
            KvError::NotSupported => write!(f, "operation not supported"),
            KvError::TransactionActive => write!(f, "a transaction is already active"),
            KvError::NoTransaction => write!(f, "no transaction is active"),
            KvError::Poisoned => write!(f, "keyspace lock poisoned"),
            KvError::Snapshot { message } => write!(f, "snapshot error: {}", message),
        }
    }
}

impl std::error::Error for KvError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            KvError::Transport(e) => Some(e.as_ref()),
            _ => None,
        }
    }
}

impl From<std::io::Error> for KvError {
    fn from(e: std::io::Error) -> Self {
        KvError::Transport(Box::new(e))
    }
}

impl From<serde_json::Error> for KvError {
    fn from(e: serde_json::Error) -> Self {
        KvError::Snapshot {
            message: e.to_string(),
        }
    }
}
