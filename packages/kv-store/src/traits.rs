//! Core traits for the KV layer.

use bytes::Bytes;

use crate::KvError;

/// A handle to an ordered key-value engine.
///
/// Keys and values are opaque byte strings. Iteration through a cursor is
/// byte-wise lexicographic. Methods take `&self`: a handle is a connection,
/// and the engine serializes access internally.
///
/// # Object Safety
///
/// This trait is object-safe: you can use `Arc<dyn KvStore>`.
pub trait KvStore: Send + Sync {
    /// Read the value stored at `key`.
    ///
    /// * `Ok(None)` - The key does not exist (not an error condition).
    /// * `Ok(Some(bytes))` - The stored value.
    fn get(&self, key: &[u8]) -> Result<Option<Bytes>, KvError>;

    /// Write `value` at `key`, overwriting any previous value.
    fn set(&self, key: &[u8], value: Bytes) -> Result<(), KvError>;

    /// Write `value` only if `key` is absent. Returns `false` if it existed.
    fn add(&self, key: &[u8], value: Bytes) -> Result<bool, KvError>;

    /// Overwrite `value` only if `key` exists. Returns `false` if it was absent.
    fn replace(&self, key: &[u8], value: Bytes) -> Result<bool, KvError>;

    /// Delete `key`. Returns `false` if it was absent.
    fn remove(&self, key: &[u8]) -> Result<bool, KvError>;

    /// Number of stored keys.
    fn count(&self) -> Result<usize, KvError>;

    /// Delete every key.
    fn clear(&self) -> Result<(), KvError>;

    /// Open a new, unpositioned cursor.
    fn cursor(&self) -> Box<dyn KvCursor>;

    /// Open the single coarse-grained transaction.
    fn begin_transaction(&self) -> Result<(), KvError>;

    /// Close the open transaction, keeping its writes if `commit` is set.
    fn end_transaction(&self, commit: bool) -> Result<(), KvError>;
}

/// A positioned walker over the keyspace.
///
/// Positioning methods return `Ok(false)` when they run off either end of
/// the keyspace, leaving the cursor unpositioned.
pub trait KvCursor: Send {
    /// Position at the first key greater than or equal to `key`.
    fn jump(&mut self, key: &[u8]) -> Result<bool, KvError>;

    /// Position at the smallest key.
    fn jump_to_first(&mut self) -> Result<bool, KvError>;

    /// Position at the greatest key.
    fn jump_to_last(&mut self) -> Result<bool, KvError>;

    /// Advance to the next key.
    fn step(&mut self) -> Result<bool, KvError>;

    /// Retreat to the previous key.
    fn step_back(&mut self) -> Result<bool, KvError>;

    /// The key and value under the cursor, or `None` if unpositioned or the
    /// key was deleted through another handle.
    fn get(&self) -> Result<Option<(Bytes, Bytes)>, KvError>;

    /// Overwrite the value under the cursor. Returns `false` if unpositioned.
    fn set_value(&mut self, value: Bytes) -> Result<bool, KvError>;

    /// Delete the key under the cursor and move to its successor.
    ///
    /// Returns `false` if there was nothing to delete.
    fn remove(&mut self) -> Result<bool, KvError>;
}

impl<T: KvStore + ?Sized> KvStore for std::sync::Arc<T> {
    fn get(&self, key: &[u8]) -> Result<Option<Bytes>, KvError> {
        self.as_ref().get(key)
    }

    fn set(&self, key: &[u8], value: Bytes) -> Result<(), KvError> {
        self.as_ref().set(key, value)
    }

    fn add(&self, key: &[u8], value: Bytes) -> Result<bool, KvError> {
        self.as_ref().add(key, value)
    }

    fn replace(&self, key: &[u8], value: Bytes) -> Result<bool, KvError> {
        self.as_ref().replace(key, value)
    }

    fn remove(&self, key: &[u8]) -> Result<bool, KvError> {
        self.as_ref().remove(key)
    }

    fn count(&self) -> Result<usize, KvError> {
        self.as_ref().count()
    }

    fn clear(&self) -> Result<(), KvError> {
        self.as_ref().clear()
    }

    fn cursor(&self) -> Box<dyn KvCursor> {
        self.as_ref().cursor()
    }

    fn begin_transaction(&self) -> Result<(), KvError> {
        self.as_ref().begin_transaction()
    }

    fn end_transaction(&self, commit: bool) -> Result<(), KvError> {
        self.as_ref().end_transaction(commit)
    }
}

impl<T: KvStore + ?Sized> KvStore for Box<T> {
    fn get(&self, key: &[u8]) -> Result<Option<Bytes>, KvError> {
        self.as_ref().get(key)
    }

    fn set(&self, key: &[u8], value: Bytes) -> Result<(), KvError> {
        self.as_ref().set(key, value)
    }

    fn add(&self, key: &[u8], value: Bytes) -> Result<bool, KvError> {
        self.as_ref().add(key, value)
    }

    fn replace(&self, key: &[u8], value: Bytes) -> Result<bool, KvError> {
        self.as_ref().replace(key, value)
    }

    fn remove(&self, key: &[u8]) -> Result<bool, KvError> {
        self.as_ref().remove(key)
    }

    fn count(&self) -> Result<usize, KvError> {
        self.as_ref().count()
    }

    fn clear(&self) -> Result<(), KvError> {
        self.as_ref().clear()
    }

    fn cursor(&self) -> Box<dyn KvCursor> {
        self.as_ref().cursor()
    }

    fn begin_transaction(&self) -> Result<(), KvError> {
        self.as_ref().begin_transaction()
    }

    fn end_transaction(&self, commit: bool) -> Result<(), KvError> {
        self.as_ref().end_transaction(commit)
    }
}
