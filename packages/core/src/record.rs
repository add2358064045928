//! The Record type - a path bound to a cursor position.

use std::sync::Arc;

use bytes::Bytes;
use janosh_kv::{KvCursor, KvStore};

use crate::path::{Marker, SCRATCH_PREFIX};
use crate::{Error, Path, Value};

/// A live binding of a path, its decoded value, and a cursor position.
///
/// A record starts unbound from any position; `fetch` seeks and decodes once.
/// Navigation (`step`, `next`, `previous`, ...) moves the cursor and rebinds
/// the path and value to whatever key it lands on.
///
/// Each record owns its cursor. `try_clone` opens a fresh cursor at the same
/// key, so two walkers over one subtree never share a position.
///
/// # Paths and markers
///
/// A node is addressed the same way whether or not its path carries the
/// directory marker: after `fetch` the record's path is retagged to match
/// what is stored (`/a` becomes `/a/.` when `/a` holds a container header).
/// A wildcard path keeps its marker and decodes to `Value::Range`.
pub struct Record {
    store: Arc<dyn KvStore>,
    cursor: Box<dyn KvCursor>,
    path: Path,
    value: Option<Value>,
    fetched: bool,
}

impl Record {
    /// Bind to `path` without touching the store.
    pub fn new(store: Arc<dyn KvStore>, path: Path) -> Self {
        let cursor = store.cursor();
        Self {
            store,
            cursor,
            path,
            value: None,
            fetched: false,
        }
    }

    /// Rebind to another path, dropping the current position.
    pub fn rebind(&mut self, path: Path) {
        self.path = path;
        self.value = None;
        self.fetched = false;
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// The decoded value. `None` before `fetch` or when nothing is stored.
    pub fn value(&self) -> Option<&Value> {
        self.value.as_ref()
    }

    /// Whether the bound entry exists. Only meaningful after `fetch`.
    pub fn exists(&self) -> bool {
        self.value.is_some()
    }

    pub fn is_fetched(&self) -> bool {
        self.fetched
    }

    /// True when the bound entry is a container header (or a range over one).
    pub fn is_container(&self) -> bool {
        self.value.as_ref().is_some_and(Value::is_container)
    }

    /// Declared child count of a container, 0 otherwise.
    pub fn size(&self) -> usize {
        self.value.as_ref().and_then(Value::size).unwrap_or(0)
    }

    /// Seek and decode the bound path. Idempotent.
    ///
    /// Returns whether the entry exists; a miss is not an error.
    pub fn fetch(&mut self) -> Result<bool, Error> {
        if self.fetched {
            return Ok(self.exists());
        }

        let found = if self.cursor.jump(self.path.key())? {
            match self.cursor.get()? {
                Some((key, bytes)) if key[..] == self.path.key()[..] => Some(bytes),
                _ => None,
            }
        } else {
            None
        };

        self.fetched = true;
        self.value = match found {
            Some(bytes) => Some(self.decode(&bytes)?),
            None => None,
        };
        Ok(self.exists())
    }

    fn decode(&mut self, bytes: &[u8]) -> Result<Value, Error> {
        let value = Value::decode(bytes, false, false).map_err(|source| Error::Value {
            path: self.path.clone(),
            source,
        })?;

        if let (Some(kind), Some(size)) = (value.container_kind(), value.size()) {
            if self.path.is_wildcard() {
                return Ok(Value::Range(kind, size));
            }
            if !self.path.is_directory() {
                self.path = self.path.as_directory();
            }
        } else if self.path.marker() != Marker::None {
            self.path = self.path.base_path();
        }
        Ok(value)
    }

    /// Rebind to whatever key the cursor currently sits on.
    ///
    /// Returns `false` (and leaves the record not existing) when the cursor
    /// is off the end of the tree.
    pub fn refresh(&mut self) -> Result<bool, Error> {
        self.fetched = true;
        let Some((key, bytes)) = self.cursor.get()? else {
            self.value = None;
            return Ok(false);
        };
        if key.first() == Some(&SCRATCH_PREFIX) {
            self.value = None;
            return Ok(false);
        }

        self.path = Path::from_key(&key)?;
        self.value = Some(self.decode(&bytes)?);
        Ok(true)
    }

    /// Advance one physical key.
    pub fn step(&mut self) -> Result<bool, Error> {
        self.fetch()?;
        if !self.cursor.step()? {
            self.value = None;
            return Ok(false);
        }
        self.refresh()
    }

    /// Retreat one physical key.
    pub fn step_back(&mut self) -> Result<bool, Error> {
        self.fetch()?;
        if !self.cursor.step_back()? {
            self.value = None;
            return Ok(false);
        }
        self.refresh()
    }

    /// Move past this node: for a container, past its header and every
    /// declared descendant; for a scalar, one step.
    pub fn next(&mut self) -> Result<bool, Error> {
        self.fetch()?;
        let size = self.size();
        if !self.step()? {
            return Ok(false);
        }
        for _ in 0..size {
            if !self.next()? {
                return Ok(false);
            }
        }
        Ok(true)
    }

    /// Move to the preceding sibling, skipping the descendants of an earlier
    /// sibling.
    ///
    /// Returns `false` when there is none; the record is then left on
    /// the parent's header (or off the front of the store).
    pub fn previous(&mut self) -> Result<bool, Error> {
        self.fetch()?;
        let Some(parent) = self.path.parent() else {
            return Ok(false);
        };

        while self.step_back()? {
            if self.path.same_node(&parent) {
                return Ok(false);
            }
            let candidate_parent = self.path.parent();
            if candidate_parent.is_some_and(|p| p.same_node(&parent)) {
                return Ok(true);
            }
            if !parent.above(&self.path) {
                return Ok(false);
            }
        }
        Ok(false)
    }

    /// True when `other` lies in this record's subtree.
    pub fn is_ancestor_of(&self, other: &Record) -> bool {
        self.path.above(&other.path)
    }

    /// Delete the key the cursor points at. Descendants are untouched.
    ///
    /// The cursor moves to the successor key; call `refresh` to bind to it.
    pub fn remove(&mut self) -> Result<(), Error> {
        self.fetch()?;
        if !self.exists() {
            return Err(Error::invalid_target(&self.path, "nothing to remove"));
        }
        self.cursor.remove()?;
        self.value = None;
        Ok(())
    }

    /// Overwrite the stored bytes under the cursor and rebind the value.
    pub fn write(&mut self, value: &Value) -> Result<Bytes, Error> {
        self.fetch()?;
        let bytes = value.encode();
        if !self.cursor.set_value(bytes.clone())? {
            return Err(Error::invalid_target(&self.path, "nothing to overwrite"));
        }
        self.value = Some(value.clone());
        Ok(bytes)
    }

    /// Open an independent cursor at the same logical place.
    pub fn try_clone(&self) -> Result<Record, Error> {
        let mut clone = Record::new(Arc::clone(&self.store), self.path.clone());
        if self.fetched {
            clone.cursor.jump(self.path.key())?;
            clone.value = self.value.clone();
            clone.fetched = true;
        }
        Ok(clone)
    }
}

impl std::fmt::Debug for Record {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Record")
            .field("path", &self.path)
            .field("value", &self.value)
            .field("fetched", &self.fetched)
            .finish()
    }
}
