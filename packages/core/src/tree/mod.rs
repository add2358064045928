//! The tree engine: structural mutation and traversal built from records.
//!
//! Every mutation checks bounds first and rewrites the nearest enclosing
//! container's size header before returning. Nothing here opens a
//! transaction; callers wrap one logical operation in
//! `Context::transaction` (or use `Command::execute`, which does).

mod check;
mod ingest;
mod mutate;
mod remove;
mod shift;
mod traverse;

use bytes::Bytes;

use crate::hook::Operation;
use crate::path::{key_in_subtree, Component};
use crate::value::ContainerKind;
use crate::{Context, Error, Path, Record, Value};

/// Tree operations over one context.
pub struct Tree<'a> {
    ctx: &'a Context,
}

impl<'a> Tree<'a> {
    pub fn new(ctx: &'a Context) -> Self {
        Self { ctx }
    }

    pub fn context(&self) -> &Context {
        self.ctx
    }

    /// Bind and fetch a record.
    pub fn fetch(&self, path: &Path) -> Result<Record, Error> {
        let mut record = self.ctx.record(path.clone());
        record.fetch()?;
        Ok(record)
    }

    /// Declared child count of the container at `path`.
    pub fn size(&self, path: &Path) -> Result<usize, Error> {
        let record = self.fetch(&path.base_path())?;
        if !record.exists() {
            return Err(Error::invalid_target(path, "does not exist"));
        }
        if !record.is_container() {
            return Err(Error::invalid_target(path, "not a directory"));
        }
        Ok(record.size())
    }

    /// Delete every key, then recreate the empty root when configured to.
    ///
    /// Returns the number of keys removed.
    pub fn truncate(&self) -> Result<usize, Error> {
        let count = self.ctx.store().count()?;
        self.ctx.store().clear()?;
        log::debug!("truncated {} keys", count);
        self.ctx.notify(&Path::root(), None, Operation::Delete);
        self.ensure_root()?;
        Ok(count)
    }

    fn ensure_root(&self) -> Result<(), Error> {
        if !self.ctx.config().auto_create_root {
            return Ok(());
        }
        let root = Path::root();
        let header = Value::Object(0).encode();
        if self.ctx.store().add(root.key(), header.clone())? {
            log::debug!("created empty root");
            self.ctx.notify(&root, Some(header), Operation::Write);
        }
        Ok(())
    }

    /// Write `value` at `path`, overwriting.
    fn put(&self, path: &Path, value: &Value) -> Result<(), Error> {
        let bytes = value.encode();
        self.ctx.store().set(path.key(), bytes.clone())?;
        self.ctx.notify(path, Some(bytes), Operation::Write);
        Ok(())
    }

    /// Write `value` at `path`, failing if anything is stored there.
    fn put_new(&self, path: &Path, value: &Value) -> Result<(), Error> {
        let bytes = value.encode();
        if !self.ctx.store().add(path.key(), bytes.clone())? {
            return Err(Error::invalid_target(path, "already exists"));
        }
        self.ctx.notify(path, Some(bytes), Operation::Write);
        Ok(())
    }

    /// Delete the key under `record`'s cursor.
    fn delete(&self, record: &mut Record) -> Result<(), Error> {
        let path = record.path().clone();
        record.remove()?;
        self.ctx.notify(&path, None, Operation::Delete);
        Ok(())
    }

    fn write_header(&self, dir: &mut Record, kind: ContainerKind, size: usize) -> Result<(), Error> {
        let bytes = dir.write(&Value::header(kind, size))?;
        self.ctx
            .notify(&dir.path().as_directory(), Some(bytes), Operation::Write);
        Ok(())
    }

    /// Rewrite a container's declared size, keeping its kind.
    fn rewrite_size(&self, dir: &mut Record, size: usize) -> Result<(), Error> {
        let kind = dir
            .value()
            .and_then(Value::container_kind)
            .ok_or_else(|| Error::invalid_target(dir.path(), "not a directory"))?;
        self.write_header(dir, kind, size)
    }

    /// Validate `target`'s position under its parent.
    ///
    /// Returns the fetched parent, or `None` for the root. An index may be
    /// at most the parent array's size (equal means append).
    fn check_bounds(&self, target: &Path) -> Result<Option<Record>, Error> {
        let Some(parent_path) = target.parent() else {
            return Ok(None);
        };
        let parent = self.fetch(&parent_path)?;
        if !parent.exists() {
            return Err(Error::invalid_target(
                target,
                format!("parent {} does not exist", parent_path),
            ));
        }
        let kind = parent
            .value()
            .and_then(Value::container_kind)
            .ok_or_else(|| {
                Error::invalid_target(target, format!("parent {} is not a directory", parent_path))
            })?;

        match (kind, target.last()) {
            (ContainerKind::Array, Some(Component::Index(index))) => {
                if *index > parent.size() {
                    return Err(Error::OutOfBounds {
                        path: target.base_path(),
                        index: *index,
                        size: parent.size(),
                    });
                }
            }
            (ContainerKind::Array, _) => {
                return Err(Error::invalid_target(
                    target,
                    "array elements are addressed as #index",
                ));
            }
            (ContainerKind::Object, Some(Component::Index(_))) => {
                return Err(Error::invalid_target(
                    target,
                    "object members are addressed by name",
                ));
            }
            (ContainerKind::Object, _) => {}
        }
        Ok(Some(parent))
    }

    fn relocate(&self, from: &Path, to: &Path) -> Result<usize, Error> {
        self.relocate_keys(from.key(), to.key())
    }

    /// Move the entry at `from` and every descendant key under `to`.
    ///
    /// The destination range must be empty.
    fn relocate_keys(&self, from: &[u8], to: &[u8]) -> Result<usize, Error> {
        let store = self.ctx.store();
        let mut cursor = store.cursor();
        let mut moved = 0;

        cursor.jump(from)?;
        while let Some((key, value)) = cursor.get()? {
            if !key_in_subtree(from, &key) {
                break;
            }
            let mut target = Vec::with_capacity(to.len() + key.len() - from.len());
            target.extend_from_slice(to);
            target.extend_from_slice(&key[from.len()..]);

            store.set(&target, value.clone())?;
            self.ctx.notify_key(&target, Some(value), Operation::Write);
            cursor.remove()?;
            self.ctx.notify_key(&key, None, Operation::Delete);
            moved += 1;
        }
        Ok(moved)
    }
}

/// Stored bytes of a record's value, for read notifications.
fn encoded(record: &Record) -> Option<Bytes> {
    record.value().map(Value::encode)
}

#[cfg(test)]
pub(crate) mod test_support {
    use std::sync::Arc;

    use janosh_kv::{KvStore, MemoryStore};

    use crate::path::key_in_subtree;
    use crate::{Context, Path, Value};

    pub fn context() -> (Context, MemoryStore) {
        let store = MemoryStore::new();
        (Context::with_shared(Arc::new(store.clone())), store)
    }

    /// Every stored entry under `path`, decoded, in key order.
    pub fn entries_under(store: &MemoryStore, path: &Path) -> Vec<(Path, Value)> {
        store
            .entries()
            .unwrap()
            .into_iter()
            .filter(|(k, _)| key_in_subtree(path.key(), k))
            .map(|(k, v)| {
                (
                    Path::from_key(&k).unwrap(),
                    Value::decode(&v, false, false).unwrap(),
                )
            })
            .collect()
    }

    pub fn stored(store: &MemoryStore, path: &Path) -> Option<Value> {
        store
            .get(path.key())
            .unwrap()
            .map(|v| Value::decode(&v, false, false).unwrap())
    }
}
