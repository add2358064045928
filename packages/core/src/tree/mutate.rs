//! Writes: add, replace, set, directories, append, copy and move.

use crate::hook::Operation;
use crate::path::Component;
use crate::value::ContainerKind;
use crate::{Error, Path, Record, Value};

use super::Tree;

impl Tree<'_> {
    /// Insert a scalar at a path that must not exist yet.
    pub fn add(&self, dest: &Path, value: &Value) -> Result<(), Error> {
        log::debug!("add {}", dest);
        if dest.is_directory() || dest.is_wildcard() {
            return Err(Error::invalid_target(dest, "values are added at plain paths"));
        }
        if value.is_container() {
            return Err(Error::invalid_target(
                dest,
                "containers are created with make_array or make_object",
            ));
        }
        self.ensure_root()?;
        let parent = self.check_bounds(dest)?;
        if self.fetch(dest)?.exists() {
            return Err(Error::invalid_target(dest, "already exists"));
        }
        self.put_new(dest, value)?;
        if let Some(mut parent) = parent {
            let size = parent.size() + 1;
            self.rewrite_size(&mut parent, size)?;
        }
        Ok(())
    }

    /// Overwrite an existing scalar.
    pub fn replace(&self, dest: &Path, value: &Value) -> Result<(), Error> {
        log::debug!("replace {}", dest);
        if dest.is_directory() || dest.is_wildcard() {
            return Err(Error::invalid_target(dest, "only values can be replaced"));
        }
        if value.is_container() {
            return Err(Error::invalid_target(dest, "cannot replace with a container header"));
        }
        self.check_bounds(dest)?;
        let mut record = self.fetch(dest)?;
        if !record.exists() {
            return Err(Error::invalid_target(dest, "does not exist"));
        }
        if record.is_container() {
            return Err(Error::invalid_target(dest, "is a directory"));
        }
        let bytes = record.write(value)?;
        self.ctx.notify(dest, Some(bytes), Operation::Write);
        Ok(())
    }

    /// Replace when present, add otherwise.
    pub fn set(&self, dest: &Path, value: &Value) -> Result<(), Error> {
        if dest.is_directory() || dest.is_wildcard() {
            return Err(Error::invalid_target(dest, "values are set at plain paths"));
        }
        if self.fetch(dest)?.exists() {
            self.replace(dest, value)
        } else {
            self.add(dest, value)
        }
    }

    /// Create an empty array at a directory path.
    pub fn make_array(&self, target: &Path) -> Result<(), Error> {
        self.make_directory(target, ContainerKind::Array, 0)
    }

    /// Create an empty object at a directory path.
    pub fn make_object(&self, target: &Path) -> Result<(), Error> {
        self.make_directory(target, ContainerKind::Object, 0)
    }

    /// Write a container header at `target`, which must be tagged as a
    /// directory and must not exist.
    pub fn make_directory(&self, target: &Path, kind: ContainerKind, size: usize) -> Result<(), Error> {
        log::debug!("make {:?} {}", kind, target);
        if !target.is_directory() {
            return Err(Error::invalid_target(target, "directories are created at /. paths"));
        }
        let header = Value::header(kind, size);

        if target.is_root() {
            if self.fetch(target)?.exists() {
                return Err(Error::invalid_target(target, "root already exists"));
            }
            return self.put_new(target, &header);
        }

        self.ensure_root()?;
        let parent = self.check_bounds(target)?;
        let existing = self.fetch(&target.base_path())?;
        if existing.exists() {
            let message = if existing.is_container() {
                "already exists"
            } else {
                "already holds a value"
            };
            return Err(Error::invalid_target(target, message));
        }
        self.put_new(target, &header)?;
        if let Some(mut parent) = parent {
            let size = parent.size() + 1;
            self.rewrite_size(&mut parent, size)?;
        }
        Ok(())
    }

    /// Copy every child of `source` into the directory at `dest`.
    ///
    /// Array destinations take the children as consecutive new indices
    /// after their current elements; object destinations take them under
    /// the same member names. Returns the number of direct children copied.
    pub fn append(&self, source: &mut Record, dest: &Path) -> Result<usize, Error> {
        source.fetch()?;
        if !source.exists() {
            return Err(Error::invalid_target(source.path(), "does not exist"));
        }
        let Some(source_kind) = source.value().and_then(Value::container_kind) else {
            return Err(Error::invalid_target(source.path(), "append source must be a directory"));
        };
        if source.path().above(dest) {
            return Err(Error::Cycle {
                from: source.path().base_path(),
                to: dest.base_path(),
            });
        }

        let mut target = self.fetch(&dest.as_directory())?;
        let Some(dest_kind) = target.value().and_then(Value::container_kind) else {
            return Err(Error::invalid_target(dest, "append destination must be an existing directory"));
        };
        if dest_kind == ContainerKind::Object && source_kind == ContainerKind::Array {
            return Err(Error::invalid_target(dest, "array elements have no member names"));
        }

        log::debug!("append {} -> {}", source.path(), dest);
        let start = target.size();
        let copied = self.copy_children(source, &dest.base_path(), dest_kind, start)?;
        self.rewrite_size(&mut target, start + copied)?;
        Ok(copied)
    }

    fn copy_children(
        &self,
        source: &Record,
        dest: &Path,
        dest_kind: ContainerKind,
        start: usize,
    ) -> Result<usize, Error> {
        let declared = source.size();
        if declared == 0 {
            return Ok(0);
        }

        let mut child = source.try_clone()?;
        let mut copied = 0;
        let mut more = child.step()?;
        while copied < declared {
            let is_child = child
                .path()
                .parent()
                .is_some_and(|p| p.same_node(source.path()));
            if !more || !is_child {
                return Err(Error::corrupt(
                    source.path(),
                    format!("declared {} children, found {}", declared, copied),
                ));
            }

            let name = match dest_kind {
                ContainerKind::Array => Component::index(start + copied)?,
                ContainerKind::Object => child
                    .path()
                    .last()
                    .cloned()
                    .ok_or_else(|| Error::corrupt(source.path(), "child without a name"))?,
            };
            let target = dest.with_child(name);
            let value = child
                .value()
                .cloned()
                .ok_or_else(|| Error::corrupt(child.path(), "vanished while copying"))?;

            match value.container_kind() {
                Some(kind) => {
                    let dir = target.as_directory();
                    self.put_new(&dir, &Value::header(kind, 0))?;
                    let nested = self.copy_children(&child, &target, kind, 0)?;
                    if nested > 0 {
                        self.put(&dir, &Value::header(kind, nested))?;
                    }
                }
                None => self.put_new(&target, &value)?,
            }

            copied += 1;
            more = child.next()?;
        }
        Ok(copied)
    }

    /// Deep copy `src` onto `dest`.
    ///
    /// A missing destination is created with the source's shape. Copying a
    /// directory onto a directory replaces the destination's children; a
    /// value onto a value overwrites it. Mixed shapes are rejected.
    pub fn copy(&self, src: &Path, dest: &Path) -> Result<(), Error> {
        log::debug!("copy {} -> {}", src, dest);
        let mut source = self.fetch(&src.base_path())?;
        if !source.exists() {
            return Err(Error::invalid_target(src, "does not exist"));
        }
        if source.path().above(dest) {
            return Err(Error::Cycle {
                from: src.base_path(),
                to: dest.base_path(),
            });
        }
        if dest.base_path().above(source.path()) {
            return Err(Error::invalid_target(dest, "the destination contains the source"));
        }

        let existing = self.fetch(&dest.base_path())?;
        let source_kind = source.value().and_then(Value::container_kind);

        match (source_kind, existing.exists(), existing.is_container()) {
            (Some(kind), false, _) => {
                self.make_directory(&dest.as_directory(), kind, 0)?;
                self.append(&mut source, dest)?;
            }
            (Some(kind), true, true) => {
                let mut children = self.fetch(&dest.as_wildcard())?;
                self.remove(&mut children, false)?;
                let mut header = self.fetch(&dest.as_directory())?;
                self.write_header(&mut header, kind, 0)?;
                self.append(&mut source, dest)?;
            }
            (None, exists, false) => {
                let value = source
                    .value()
                    .cloned()
                    .ok_or_else(|| Error::invalid_target(src, "does not exist"))?;
                if exists {
                    self.replace(&dest.base_path(), &value)?;
                } else {
                    self.add(&dest.base_path(), &value)?;
                }
            }
            (Some(_), true, false) => {
                return Err(Error::invalid_target(dest, "cannot copy a directory onto a value"));
            }
            (None, _, true) => {
                return Err(Error::invalid_target(dest, "cannot copy a value onto a directory"));
            }
        }
        Ok(())
    }

    /// Copy, then remove the source and pack its array.
    ///
    /// Returns where the moved node ended up: when the source and the
    /// destination share an array and the destination sat after the
    /// source, packing shifts it down by one.
    pub fn move_to(&self, src: &Path, dest: &Path) -> Result<Path, Error> {
        if src.is_root() {
            return Err(Error::invalid_target(src, "the root cannot be moved"));
        }
        if dest.is_root() {
            return Err(Error::invalid_target(dest, "cannot move onto the root"));
        }
        log::debug!("move {} -> {}", src, dest);

        self.copy(src, dest)?;
        let mut source = self.ctx.record(src.base_path());
        self.remove(&mut source, true)?;

        let mut moved = dest.base_path();
        if let Some(removed) = src.index() {
            let depth = src.depth() - 1;
            let shares_array = moved.depth() > depth
                && moved.components()[..depth] == src.components()[..depth];
            if shares_array {
                if let Some(&Component::Index(index)) = moved.components().get(depth) {
                    if index > removed {
                        moved = moved.with_component_at(depth, Component::Index(index - 1));
                    }
                }
            }
        }
        Ok(moved)
    }
}

#[cfg(test)]
mod tests {
    use super::super::test_support::{context, entries_under, stored};
    use crate::{path, Context, Error, Path, Value};

    fn numbers(ctx: &Context, dir: &Path, values: &[i64]) {
        let tree = ctx.tree();
        tree.make_array(&dir.as_directory()).unwrap();
        for (i, v) in values.iter().enumerate() {
            tree.add(&dir.with_index(i).unwrap(), &Value::from(*v)).unwrap();
        }
    }

    #[test]
    fn add_creates_root_and_counts() {
        let (ctx, store) = context();
        let tree = ctx.tree();
        tree.add(&path!("/a"), &Value::from(1i64)).unwrap();
        tree.add(&path!("/b"), &Value::from("x")).unwrap();
        assert_eq!(stored(&store, &Path::root()), Some(Value::Object(2)));
        assert_eq!(tree.size(&Path::root()).unwrap(), 2);
    }

    #[test]
    fn add_rejects_existing_and_containers() {
        let (ctx, _) = context();
        let tree = ctx.tree();
        tree.add(&path!("/a"), &Value::from(1i64)).unwrap();
        assert!(matches!(
            tree.add(&path!("/a"), &Value::from(2i64)),
            Err(Error::InvalidTarget { .. })
        ));
        assert!(matches!(
            tree.add(&path!("/c"), &Value::Array(0)),
            Err(Error::InvalidTarget { .. })
        ));
        assert!(matches!(
            tree.add(&path!("/missing/x"), &Value::Null),
            Err(Error::InvalidTarget { .. })
        ));
    }

    #[test]
    fn array_bounds_allow_append_only() {
        let (ctx, _) = context();
        numbers(&ctx, &path!("/a"), &[1, 2]);
        let tree = ctx.tree();
        tree.add(&path!("/a/#2"), &Value::from(3i64)).unwrap();
        let err = tree.add(&path!("/a/#5"), &Value::from(9i64)).unwrap_err();
        assert!(matches!(err, Error::OutOfBounds { index: 5, size: 3, .. }));
        assert!(matches!(
            tree.add(&path!("/a/name"), &Value::Null),
            Err(Error::InvalidTarget { .. })
        ));
    }

    #[test]
    fn replace_and_set() {
        let (ctx, store) = context();
        let tree = ctx.tree();
        assert!(tree.replace(&path!("/a"), &Value::from(1i64)).is_err());
        tree.set(&path!("/a"), &Value::from(1i64)).unwrap();
        tree.set(&path!("/a"), &Value::from("two")).unwrap();
        assert_eq!(stored(&store, &path!("/a")), Some(Value::from("two")));
        assert_eq!(tree.size(&Path::root()).unwrap(), 1);

        tree.make_object(&path!("/o/.")).unwrap();
        assert!(matches!(
            tree.replace(&path!("/o"), &Value::Null),
            Err(Error::InvalidTarget { .. })
        ));
    }

    #[test]
    fn make_directory_requires_marker_and_absence() {
        let (ctx, _) = context();
        let tree = ctx.tree();
        assert!(tree.make_array(&path!("/a")).is_err());
        tree.make_array(&path!("/a/.")).unwrap();
        assert!(tree.make_object(&path!("/a/.")).is_err());
        tree.add(&path!("/s"), &Value::from(1i64)).unwrap();
        assert!(tree.make_object(&path!("/s/.")).is_err());
        tree.make_object(&path!("/a/#0/.")).unwrap();
        assert_eq!(tree.size(&path!("/a")).unwrap(), 1);
    }

    #[test]
    fn append_array_into_array() {
        let (ctx, store) = context();
        numbers(&ctx, &path!("/a"), &[1, 2]);
        numbers(&ctx, &path!("/b"), &[3, 4]);
        let tree = ctx.tree();
        let mut source = ctx.record(path!("/b"));
        assert_eq!(tree.append(&mut source, &path!("/a")).unwrap(), 2);

        let values: Vec<Value> = entries_under(&store, &path!("/a"))
            .into_iter()
            .map(|(_, v)| v)
            .collect();
        assert_eq!(
            values,
            vec![
                Value::Array(4),
                Value::from(1i64),
                Value::from(2i64),
                Value::from(3i64),
                Value::from(4i64)
            ]
        );
        // The source is untouched.
        assert_eq!(tree.size(&path!("/b")).unwrap(), 2);
    }

    #[test]
    fn append_rejects_cycles_and_shape_mismatch() {
        let (ctx, _) = context();
        numbers(&ctx, &path!("/a"), &[1]);
        let tree = ctx.tree();
        tree.make_object(&path!("/a/#1/.")).unwrap();

        let mut source = ctx.record(path!("/a"));
        assert!(matches!(
            tree.append(&mut source, &path!("/a/#1")),
            Err(Error::Cycle { .. })
        ));

        tree.make_object(&path!("/o/.")).unwrap();
        let mut source = ctx.record(path!("/a"));
        assert!(matches!(
            tree.append(&mut source, &path!("/o")),
            Err(Error::InvalidTarget { .. })
        ));
    }

    #[test]
    fn copy_creates_nested_structure() {
        let (ctx, store) = context();
        let tree = ctx.tree();
        tree.make_object(&path!("/src/.")).unwrap();
        tree.add(&path!("/src/k"), &Value::from("v")).unwrap();
        numbers(&ctx, &path!("/src/list"), &[7, 8]);

        tree.copy(&path!("/src"), &path!("/dst")).unwrap();
        let src: Vec<Value> = entries_under(&store, &path!("/src"))
            .into_iter()
            .map(|(_, v)| v)
            .collect();
        let dst: Vec<Value> = entries_under(&store, &path!("/dst"))
            .into_iter()
            .map(|(_, v)| v)
            .collect();
        assert_eq!(src, dst);
        assert_eq!(tree.size(&Path::root()).unwrap(), 2);
        assert_eq!(tree.check(&Path::root()).unwrap(), 11);
    }

    #[test]
    fn copy_onto_existing_directory_replaces_children() {
        let (ctx, store) = context();
        numbers(&ctx, &path!("/a"), &[1, 2, 3]);
        numbers(&ctx, &path!("/b"), &[9]);
        let tree = ctx.tree();
        tree.copy(&path!("/b"), &path!("/a")).unwrap();
        assert_eq!(tree.size(&path!("/a")).unwrap(), 1);
        assert_eq!(stored(&store, &path!("/a/#0")), Some(Value::from(9i64)));
        assert_eq!(stored(&store, &path!("/a/#1")), None);
    }

    #[test]
    fn copy_mixed_shapes_fail() {
        let (ctx, _) = context();
        numbers(&ctx, &path!("/a"), &[1]);
        let tree = ctx.tree();
        tree.add(&path!("/s"), &Value::from(1i64)).unwrap();
        assert!(tree.copy(&path!("/a"), &path!("/s")).is_err());
        assert!(tree.copy(&path!("/s"), &path!("/a")).is_err());
        assert!(matches!(
            tree.copy(&path!("/a"), &path!("/a/#1")),
            Err(Error::Cycle { .. })
        ));
    }

    #[test]
    fn copy_and_move_onto_an_ancestor_fail_and_keep_the_source() {
        let (ctx, store) = context();
        let tree = ctx.tree();
        tree.make_object(&path!("/a/.")).unwrap();
        numbers(&ctx, &path!("/a/b"), &[1, 2]);
        let before = entries_under(&store, &Path::root());

        assert!(matches!(
            tree.copy(&path!("/a/b"), &path!("/a")),
            Err(Error::InvalidTarget { .. })
        ));
        assert!(matches!(
            tree.move_to(&path!("/a/b/#0"), &path!("/a")),
            Err(Error::InvalidTarget { .. })
        ));
        assert!(matches!(
            tree.copy(&path!("/a/b"), &Path::root()),
            Err(Error::InvalidTarget { .. })
        ));

        assert_eq!(entries_under(&store, &Path::root()), before);
        assert_eq!(tree.check(&Path::root()).unwrap(), 5);
    }

    #[test]
    fn move_within_array_reports_final_path() {
        let (ctx, store) = context();
        numbers(&ctx, &path!("/a"), &[10, 20, 30]);
        let tree = ctx.tree();
        let moved = tree.move_to(&path!("/a/#0"), &path!("/a/#3")).unwrap();
        assert_eq!(moved, path!("/a/#2"));
        let values: Vec<Value> = entries_under(&store, &path!("/a"))
            .into_iter()
            .map(|(_, v)| v)
            .collect();
        assert_eq!(
            values,
            vec![
                Value::Array(3),
                Value::from(20i64),
                Value::from(30i64),
                Value::from(10i64)
            ]
        );
    }

    #[test]
    fn move_between_containers() {
        let (ctx, store) = context();
        let tree = ctx.tree();
        tree.add(&path!("/x"), &Value::from("v")).unwrap();
        tree.make_object(&path!("/o/.")).unwrap();
        let moved = tree.move_to(&path!("/x"), &path!("/o/x")).unwrap();
        assert_eq!(moved, path!("/o/x"));
        assert_eq!(stored(&store, &path!("/x")), None);
        assert_eq!(tree.size(&Path::root()).unwrap(), 1);
        assert_eq!(tree.size(&path!("/o")).unwrap(), 1);
        assert!(tree.move_to(&Path::root(), &path!("/y")).is_err());
    }
}
