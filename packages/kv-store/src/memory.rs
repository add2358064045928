//! In-memory ordered engine backed by a `BTreeMap`.

use std::collections::BTreeMap;
use std::ops::Bound;
use std::sync::{Arc, Mutex, MutexGuard};

use bytes::Bytes;

use crate::{KvCursor, KvError, KvStore};

pub(crate) type Keyspace = BTreeMap<Bytes, Bytes>;

#[derive(Default)]
pub(crate) struct Inner {
    pub(crate) map: Keyspace,
    /// Copy of the keyspace taken when the open transaction began.
    saved: Option<Keyspace>,
}

/// An in-memory ordered key-value engine.
///
/// Cloning a `MemoryStore` yields another handle onto the same keyspace, so
/// several contexts can share one engine the way several connections share
/// one database file.
///
/// # Example
///
/// ```rust
/// use janosh_kv::{KvStore, MemoryStore};
/// use bytes::Bytes;
///
/// let store = MemoryStore::new();
/// store.begin_transaction().unwrap();
/// store.set(b"k", Bytes::from_static(b"v")).unwrap();
/// store.end_transaction(false).unwrap();
///
/// // Rolled back
/// assert_eq!(store.get(b"k").unwrap(), None);
/// ```
#[derive(Clone, Default)]
pub struct MemoryStore {
    inner: Arc<Mutex<Inner>>,
}

impl MemoryStore {
    /// Create a new empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store holding the given entries.
    pub fn with_entries(entries: impl IntoIterator<Item = (Bytes, Bytes)>) -> Result<Self, KvError> {
        let store = Self::new();
        store.lock()?.map.extend(entries);
        Ok(store)
    }

    /// Copy out every entry in key order.
    pub fn entries(&self) -> Result<Vec<(Bytes, Bytes)>, KvError> {
        let inner = self.lock()?;
        Ok(inner
            .map
            .iter()
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect())
    }

    pub(crate) fn lock(&self) -> Result<MutexGuard<'_, Inner>, KvError> {
        lock(&self.inner)
    }
}

fn lock(inner: &Arc<Mutex<Inner>>) -> Result<MutexGuard<'_, Inner>, KvError> {
    inner.lock().map_err(|_| KvError::Poisoned)
}

impl KvStore for MemoryStore {
    fn get(&self, key: &[u8]) -> Result<Option<Bytes>, KvError> {
        Ok(self.lock()?.map.get(key).cloned())
    }

    fn set(&self, key: &[u8], value: Bytes) -> Result<(), KvError> {
        self.lock()?.map.insert(Bytes::copy_from_slice(key), value);
        Ok(())
    }

    fn add(&self, key: &[u8], value: Bytes) -> Result<bool, KvError> {
        let mut inner = self.lock()?;
        if inner.map.contains_key(key) {
            return Ok(false);
        }
        inner.map.insert(Bytes::copy_from_slice(key), value);
        Ok(true)
    }

    fn replace(&self, key: &[u8], value: Bytes) -> Result<bool, KvError> {
        let mut inner = self.lock()?;
        match inner.map.get_mut(key) {
            Some(slot) => {
                *slot = value;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    fn remove(&self, key: &[u8]) -> Result<bool, KvError> {
        Ok(self.lock()?.map.remove(key).is_some())
    }

    fn count(&self) -> Result<usize, KvError> {
        Ok(self.lock()?.map.len())
    }

    fn clear(&self) -> Result<(), KvError> {
        self.lock()?.map.clear();
        Ok(())
    }

    fn cursor(&self) -> Box<dyn KvCursor> {
        Box::new(MemoryCursor {
            inner: Arc::clone(&self.inner),
            position: None,
        })
    }

    fn begin_transaction(&self) -> Result<(), KvError> {
        let mut inner = self.lock()?;
        if inner.saved.is_some() {
            return Err(KvError::TransactionActive);
        }
        inner.saved = Some(inner.map.clone());
        Ok(())
    }

    fn end_transaction(&self, commit: bool) -> Result<(), KvError> {
        let mut inner = self.lock()?;
        let saved = inner.saved.take().ok_or(KvError::NoTransaction)?;
        if !commit {
            log::debug!("rolling back transaction ({} keys restored)", saved.len());
            inner.map = saved;
        }
        Ok(())
    }
}

/// Cursor over a `MemoryStore`.
///
/// The cursor remembers the key it sits on rather than a map position, so
/// writes through other handles never invalidate it: each step re-seeks
/// relative to the remembered key.
pub struct MemoryCursor {
    inner: Arc<Mutex<Inner>>,
    position: Option<Bytes>,
}

impl MemoryCursor {
    fn seek(&mut self, found: Option<Bytes>) -> bool {
        self.position = found;
        self.position.is_some()
    }
}

impl KvCursor for MemoryCursor {
    fn jump(&mut self, key: &[u8]) -> Result<bool, KvError> {
        let found = lock(&self.inner)?
            .map
            .range::<[u8], _>((Bound::Included(key), Bound::Unbounded))
            .next()
            .map(|(k, _)| k.clone());
        Ok(self.seek(found))
    }

    fn jump_to_first(&mut self) -> Result<bool, KvError> {
        let found = lock(&self.inner)?.map.keys().next().cloned();
        Ok(self.seek(found))
    }

    fn jump_to_last(&mut self) -> Result<bool, KvError> {
        let found = lock(&self.inner)?.map.keys().next_back().cloned();
        Ok(self.seek(found))
    }

    fn step(&mut self) -> Result<bool, KvError> {
        let Some(current) = self.position.take() else {
            return Ok(false);
        };
        let found = lock(&self.inner)?
            .map
            .range::<[u8], _>((Bound::Excluded(&current[..]), Bound::Unbounded))
            .next()
            .map(|(k, _)| k.clone());
        Ok(self.seek(found))
    }

    fn step_back(&mut self) -> Result<bool, KvError> {
        let Some(current) = self.position.take() else {
            return Ok(false);
        };
        let found = lock(&self.inner)?
            .map
            .range::<[u8], _>((Bound::Unbounded, Bound::Excluded(&current[..])))
            .next_back()
            .map(|(k, _)| k.clone());
        Ok(self.seek(found))
    }

    fn get(&self) -> Result<Option<(Bytes, Bytes)>, KvError> {
        let Some(current) = &self.position else {
            return Ok(None);
        };
        Ok(lock(&self.inner)?
            .map
            .get(current)
            .map(|v| (current.clone(), v.clone())))
    }

    fn set_value(&mut self, value: Bytes) -> Result<bool, KvError> {
        let Some(current) = &self.position else {
            return Ok(false);
        };
        let mut inner = lock(&self.inner)?;
        match inner.map.get_mut(current) {
            Some(slot) => {
                *slot = value;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    fn remove(&mut self) -> Result<bool, KvError> {
        let Some(current) = self.position.take() else {
            return Ok(false);
        };
        let mut inner = lock(&self.inner)?;
        let removed = inner.map.remove(&current).is_some();
        self.position = inner
            .map
            .range::<[u8], _>((Bound::Excluded(&current[..]), Bound::Unbounded))
            .next()
            .map(|(k, _)| k.clone());
        Ok(removed)
    }
}
