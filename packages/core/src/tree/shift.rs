//! Reordering elements inside one array.

use crate::value::ContainerKind;
use crate::{Error, Path, Value};

use super::Tree;

impl Tree<'_> {
    /// Move element `src` to index `dest` of the same array, sliding the
    /// elements in between by one toward the vacated slot.
    ///
    /// The moving element is parked under a scratch key while its
    /// neighbors slide, so keys never collide.
    pub fn shift(&self, src: &Path, dest: &Path) -> Result<(), Error> {
        log::debug!("shift {} -> {}", src, dest);
        let (Some(array_path), Some(dest_parent)) = (src.parent(), dest.parent()) else {
            return Err(Error::invalid_target(src, "the root cannot be shifted"));
        };
        if !array_path.same_node(&dest_parent) {
            return Err(Error::invalid_target(dest, "shift stays within one array"));
        }

        let mut array = self.fetch(&array_path)?;
        if array.value().and_then(Value::container_kind) != Some(ContainerKind::Array) {
            return Err(Error::invalid_target(&array_path, "shift requires an array"));
        }
        let (Some(from), Some(to)) = (src.index(), dest.index()) else {
            return Err(Error::invalid_target(src, "shift addresses elements by #index"));
        };
        let size = array.size();
        for (path, index) in [(src, from), (dest, to)] {
            if index >= size {
                return Err(Error::OutOfBounds {
                    path: path.base_path(),
                    index,
                    size,
                });
            }
        }
        if from == to {
            return Ok(());
        }

        let base = array_path.base_path();
        let moving = base.with_index(from)?;
        let scratch = moving.scratch_key();
        self.relocate_keys(moving.key(), &scratch)?;

        // `vacant` is the open slot; `walker` is the neighbor pulled into it.
        let mut vacant = moving;
        let mut walker = self.ctx.record(vacant.clone());
        let mut index = from;
        for _ in 0..from.abs_diff(to) {
            index = if from < to { index + 1 } else { index - 1 };
            walker.rebind(base.with_index(index)?);
            if !walker.fetch()? {
                return Err(Error::corrupt(
                    &array_path,
                    format!("element {} is missing", walker.path()),
                ));
            }
            log::trace!("shift {} -> {}", walker.path(), vacant);
            self.relocate(walker.path(), &vacant)?;
            vacant = walker.path().base_path();
        }

        self.relocate_keys(&scratch, vacant.key())?;
        self.rewrite_size(&mut array, size)
    }
}

#[cfg(test)]
mod tests {
    use super::super::test_support::{context, entries_under};
    use crate::{path, Context, Error, Path, Value};

    fn letters(ctx: &Context, values: &[&str]) {
        let tree = ctx.tree();
        tree.make_array(&path!("/x/.")).unwrap();
        for (i, v) in values.iter().enumerate() {
            tree.add(&path!("/x").with_index(i).unwrap(), &Value::from(*v))
                .unwrap();
        }
    }

    fn rendered(store: &janosh_kv::MemoryStore, path: &Path) -> Vec<String> {
        entries_under(store, path)
            .into_iter()
            .map(|(p, v)| format!("{}={}", p, v))
            .collect()
    }

    #[test]
    fn shift_two_elements() {
        let (ctx, store) = context();
        letters(&ctx, &["v", "w"]);
        ctx.tree().shift(&path!("/x/#0"), &path!("/x/#1")).unwrap();
        assert_eq!(
            rendered(&store, &path!("/x")),
            vec!["/x=array[2]", "/x/#0=\"w\"", "/x/#1=\"v\""]
        );
    }

    #[test]
    fn shift_forward_and_back() {
        let (ctx, store) = context();
        letters(&ctx, &["a", "b", "c", "d"]);
        let tree = ctx.tree();
        tree.shift(&path!("/x/#0"), &path!("/x/#2")).unwrap();
        assert_eq!(
            rendered(&store, &path!("/x"))[1..],
            ["/x/#0=\"b\"", "/x/#1=\"c\"", "/x/#2=\"a\"", "/x/#3=\"d\""]
        );
        tree.shift(&path!("/x/#3"), &path!("/x/#0")).unwrap();
        assert_eq!(
            rendered(&store, &path!("/x"))[1..],
            ["/x/#0=\"d\"", "/x/#1=\"b\"", "/x/#2=\"c\"", "/x/#3=\"a\""]
        );
        assert_eq!(tree.check(&Path::root()).unwrap(), 6);
    }

    #[test]
    fn shift_carries_subtrees() {
        let (ctx, store) = context();
        letters(&ctx, &["a", "b"]);
        let tree = ctx.tree();
        tree.make_object(&path!("/x/#2/.")).unwrap();
        tree.add(&path!("/x/#2/k"), &Value::from(1i64)).unwrap();
        tree.shift(&path!("/x/#2"), &path!("/x/#0")).unwrap();
        assert_eq!(
            rendered(&store, &path!("/x")),
            vec![
                "/x=array[3]",
                "/x/#0=object[1]",
                "/x/#0/k=1",
                "/x/#1=\"a\"",
                "/x/#2=\"b\""
            ]
        );
        assert!(store
            .entries()
            .unwrap()
            .iter()
            .all(|(k, _)| k.first() != Some(&crate::path::SCRATCH_PREFIX)));
    }

    #[test]
    fn shift_checks_bounds_and_parents() {
        let (ctx, _) = context();
        letters(&ctx, &["a", "b"]);
        let tree = ctx.tree();
        assert!(matches!(
            tree.shift(&path!("/x/#0"), &path!("/x/#2")),
            Err(Error::OutOfBounds { index: 2, size: 2, .. })
        ));
        tree.make_array(&path!("/y/.")).unwrap();
        assert!(matches!(
            tree.shift(&path!("/x/#0"), &path!("/y/#0")),
            Err(Error::InvalidTarget { .. })
        ));
        tree.shift(&path!("/x/#1"), &path!("/x/#1")).unwrap();
    }
}
