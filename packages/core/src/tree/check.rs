//! Structural consistency checks.

use crate::path::Component;
use crate::value::ContainerKind;
use crate::{Error, Path, Record, Value};

use super::Tree;

impl Tree<'_> {
    /// Verify that every container under `path` declares exactly as many
    /// children as are stored, and that array indices run `0..size`.
    ///
    /// Returns the number of nodes checked.
    pub fn check(&self, path: &Path) -> Result<usize, Error> {
        let record = self.fetch(&path.base_path())?;
        if !record.exists() {
            return Err(Error::invalid_target(path, "does not exist"));
        }
        self.check_node(&record)
    }

    fn check_node(&self, node: &Record) -> Result<usize, Error> {
        let Some(kind) = node.value().and_then(Value::container_kind) else {
            return Ok(1);
        };
        let dir = node.path().clone();
        let mut child = node.try_clone()?;
        let mut count = 0;
        let mut checked = 1;

        let mut more = child.step()?;
        while more && dir.above(child.path()) && !child.path().same_node(&dir) {
            let is_child = child.path().parent().is_some_and(|p| p.same_node(&dir));
            if !is_child {
                return Err(Error::corrupt(&dir, format!("{} has no header", child.path())));
            }
            match (kind, child.path().last()) {
                (ContainerKind::Array, Some(Component::Index(i))) if *i == count => {}
                (ContainerKind::Array, _) => {
                    return Err(Error::corrupt(
                        &dir,
                        format!("expected #{} but found {}", count, child.path()),
                    ));
                }
                (ContainerKind::Object, Some(Component::Member(_))) => {}
                (ContainerKind::Object, _) => {
                    return Err(Error::corrupt(&dir, format!("{} is not a member", child.path())));
                }
            }
            checked += self.check_node(&child)?;
            count += 1;
            more = skip_subtree(&mut child)?;
        }

        if count != node.size() {
            return Err(Error::corrupt(
                &dir,
                format!("declared size {} but {} children are stored", node.size(), count),
            ));
        }
        Ok(checked)
    }
}

/// Step physically past everything under the record's current node.
fn skip_subtree(record: &mut Record) -> Result<bool, Error> {
    let top = record.path().clone();
    while record.step()? {
        if !top.above(record.path()) {
            return Ok(true);
        }
    }
    Ok(false)
}
