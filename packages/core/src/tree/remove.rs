//! Removal and array packing.

use crate::value::ContainerKind;
use crate::{Error, Path, Record, Value};

use super::Tree;

impl Tree<'_> {
    /// Remove the node bound to `record` together with its subtree.
    ///
    /// A wildcard record removes only the children and leaves an empty
    /// container. With `pack`, a removal from an array renumbers the
    /// remaining elements so indices stay dense. Returns the number of
    /// direct children removed from the enclosing container.
    pub fn remove(&self, record: &mut Record, pack: bool) -> Result<usize, Error> {
        let wildcard = record.path().is_wildcard();
        record.fetch()?;
        if !record.exists() {
            return Err(Error::invalid_target(record.path(), "nothing to remove"));
        }
        log::debug!("remove {} (pack: {})", record.path(), pack);

        if wildcard {
            if !record.is_container() {
                return Err(Error::invalid_target(record.path(), "wildcards select directory children"));
            }
            let removed = self.remove_children(record)?;
            let mut dir = self.fetch(&record.path().as_directory())?;
            self.rewrite_size(&mut dir, 0)?;
            return Ok(removed);
        }

        let path = record.path().clone();
        if record.is_container() {
            self.remove_children(record)?;
        }
        self.delete(record)?;

        let Some(parent_path) = path.parent() else {
            return Ok(1);
        };
        let mut parent = self.fetch(&parent_path)?;
        if !parent.is_container() {
            return Err(Error::corrupt(&parent_path, "parent of a removed entry is not a directory"));
        }
        let size = parent
            .size()
            .checked_sub(1)
            .ok_or_else(|| Error::corrupt(&parent_path, "declared size is already 0"))?;
        self.rewrite_size(&mut parent, size)?;

        if pack && parent.value().and_then(Value::container_kind) == Some(ContainerKind::Array) {
            self.pack(&mut parent)?;
        }
        Ok(1)
    }

    /// Remove `path`, packing arrays as configured.
    pub fn remove_path(&self, path: &Path) -> Result<usize, Error> {
        let mut record = self.ctx.record(path.clone());
        self.remove(&mut record, self.ctx.config().pack_on_remove)
    }

    /// Delete every descendant of `dir`, deepest first within each child.
    fn remove_children(&self, dir: &Record) -> Result<usize, Error> {
        let mut child = dir.try_clone()?;
        let mut removed = 0;
        let mut more = child.step()?;
        while more && dir.path().above(child.path()) && !child.path().same_node(dir.path()) {
            if child.is_container() {
                self.remove_children(&child)?;
            }
            self.delete(&mut child)?;
            removed += 1;
            more = child.refresh()?;
        }
        Ok(removed)
    }

    /// Renumber the elements of an array so indices run `0..n` in order,
    /// then write `n` as its size.
    pub(crate) fn pack(&self, array: &mut Record) -> Result<(), Error> {
        let dir = array.path().as_directory();
        let base = dir.base_path();
        let mut child = array.try_clone()?;
        let mut expected = 0;

        let mut more = child.step()?;
        while more && dir.above(child.path()) && !child.path().same_node(&dir) {
            let is_child = child.path().parent().is_some_and(|p| p.same_node(&dir));
            if !is_child {
                return Err(Error::corrupt(&dir, format!("{} is not a direct child", child.path())));
            }
            let Some(index) = child.path().index() else {
                return Err(Error::corrupt(&dir, format!("member {} inside an array", child.path())));
            };
            if index < expected {
                return Err(Error::corrupt(&dir, format!("index {} appears twice", index)));
            }
            if index > expected {
                let target = base.with_index(expected)?;
                log::trace!("pack {} -> {}", child.path(), target);
                self.relocate(child.path(), &target)?;
                child.rebind(target);
                child.fetch()?;
            }
            expected += 1;
            more = child.next()?;
        }
        self.rewrite_size(array, expected)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::super::test_support::{context, entries_under, stored};
    use crate::hook::{Operation, RecordingHook};
    use crate::{path, Config, Context, Error, Path, Value};
    use janosh_kv::{KvStore, MemoryStore};

    fn setup() -> (Context, MemoryStore) {
        let (ctx, store) = context();
        let tree = ctx.tree();
        tree.make_array(&path!("/a/.")).unwrap();
        for i in 0..3 {
            tree.add(&path!("/a").with_index(i).unwrap(), &Value::from(i as i64 + 1))
                .unwrap();
        }
        tree.make_object(&path!("/a/#3/.")).unwrap();
        tree.add(&path!("/a/#3/k"), &Value::from("v")).unwrap();
        (ctx, store)
    }

    #[test]
    fn remove_packs_array() {
        let (ctx, store) = setup();
        let tree = ctx.tree();
        assert_eq!(tree.remove_path(&path!("/a/#1")).unwrap(), 1);

        let entries: Vec<String> = entries_under(&store, &path!("/a"))
            .into_iter()
            .map(|(p, v)| format!("{}={}", p, v))
            .collect();
        assert_eq!(
            entries,
            vec![
                "/a=array[3]",
                "/a/#0=1",
                "/a/#1=3",
                "/a/#2=object[1]",
                "/a/#2/k=\"v\""
            ]
        );
        assert_eq!(tree.check(&Path::root()).unwrap(), 6);
    }

    #[test]
    fn remove_without_packing_leaves_gap() {
        let (ctx, store) = context();
        let ctx = ctx.with_config(Config {
            pack_on_remove: false,
            ..Config::default()
        });
        let tree = ctx.tree();
        tree.make_array(&path!("/a/.")).unwrap();
        tree.add(&path!("/a/#0"), &Value::from(1i64)).unwrap();
        tree.add(&path!("/a/#1"), &Value::from(2i64)).unwrap();
        tree.remove_path(&path!("/a/#0")).unwrap();
        assert_eq!(stored(&store, &path!("/a/#1")), Some(Value::from(2i64)));
        assert_eq!(tree.size(&path!("/a")).unwrap(), 1);
        assert!(matches!(
            tree.check(&path!("/a")),
            Err(Error::CorruptContainer { .. })
        ));
    }

    #[test]
    fn remove_container_takes_subtree() {
        let (ctx, store) = setup();
        let tree = ctx.tree();
        tree.remove_path(&path!("/a")).unwrap();
        assert!(entries_under(&store, &path!("/a")).is_empty());
        assert_eq!(stored(&store, &Path::root()), Some(Value::Object(0)));
    }

    #[test]
    fn wildcard_clears_children_only() {
        let (ctx, store) = setup();
        let tree = ctx.tree();
        let mut all = ctx.record(path!("/a/*"));
        assert_eq!(tree.remove(&mut all, true).unwrap(), 4);
        assert_eq!(
            entries_under(&store, &path!("/a"))
                .into_iter()
                .map(|(_, v)| v)
                .collect::<Vec<_>>(),
            vec![Value::Array(0)]
        );
        assert_eq!(tree.size(&Path::root()).unwrap(), 1);
    }

    #[test]
    fn remove_root_empties_store() {
        let (ctx, store) = setup();
        ctx.tree().remove_path(&Path::root()).unwrap();
        assert_eq!(store.entries().unwrap().len(), 0);
    }

    #[test]
    fn removing_missing_entry_fails() {
        let (ctx, _) = setup();
        assert!(matches!(
            ctx.tree().remove_path(&path!("/nope")),
            Err(Error::InvalidTarget { .. })
        ));
    }

    #[test]
    fn corrupt_parent_size_is_reported() {
        let (ctx, store) = setup();
        store.set(path!("/a").key(), Value::Array(0).encode()).unwrap();
        assert!(matches!(
            ctx.tree().remove_path(&path!("/a/#0")),
            Err(Error::CorruptContainer { .. })
        ));
    }

    #[test]
    fn hooks_see_deletes() {
        let store = MemoryStore::new();
        let hook = Arc::new(RecordingHook::new());
        let ctx = Context::new(store).with_hook(hook.clone());
        let tree = ctx.tree();
        tree.add(&path!("/x"), &Value::from(1i64)).unwrap();
        hook.take();
        tree.remove_path(&path!("/x")).unwrap();
        let changes = hook.take();
        assert!(changes
            .iter()
            .any(|c| c.path == path!("/x") && c.operation == Operation::Delete));
    }
}
