//! Depth-first reads that drive a `Visitor`.

use crate::hook::Operation;
use crate::value::ContainerKind;
use crate::{Error, Path, Record, Visitor};

use super::{encoded, Tree};

/// An open container on the traversal stack.
struct Frame {
    path: Path,
    kind: ContainerKind,
    size: usize,
}

fn open(visitor: &mut dyn Visitor, frame: &Frame, parent_is_array: bool, first: bool) -> Result<(), Error> {
    match frame.kind {
        ContainerKind::Array => visitor.begin_array(&frame.path, frame.size, parent_is_array, first),
        ContainerKind::Object => visitor.begin_object(&frame.path, frame.size, parent_is_array, first),
    }
}

fn close(visitor: &mut dyn Visitor, frame: &Frame) -> Result<(), Error> {
    match frame.kind {
        ContainerKind::Array => visitor.end_array(&frame.path, frame.size),
        ContainerKind::Object => visitor.end_object(&frame.path, frame.size),
    }
}

impl Tree<'_> {
    /// Emit the subtree at `path` (a wildcard selects the same subtree).
    pub fn get(&self, path: &Path, visitor: &mut dyn Visitor) -> Result<(), Error> {
        let record = self.readable(path)?;
        visitor.begin()?;
        self.walk(record, None, visitor)?;
        visitor.close()
    }

    /// Emit the whole tree.
    pub fn dump(&self, visitor: &mut dyn Visitor) -> Result<(), Error> {
        self.get(&Path::root(), visitor)
    }

    /// Like `get`, but wraps the output in begin/end events for every
    /// ancestor from the root down, so the output keeps its position in the
    /// full document.
    pub fn get_nested(&self, path: &Path, visitor: &mut dyn Visitor) -> Result<(), Error> {
        let record = self.readable(path)?;

        let mut ancestors = Vec::new();
        let mut next = record.path().parent();
        while let Some(dir) = next {
            let ancestor = self.fetch(&dir)?;
            let kind = ancestor
                .value()
                .and_then(crate::Value::container_kind)
                .ok_or_else(|| Error::corrupt(&dir, "ancestor is not a directory"))?;
            next = dir.parent();
            ancestors.push(Frame {
                path: ancestor.path().clone(),
                kind,
                size: ancestor.size(),
            });
        }
        ancestors.reverse();

        visitor.begin()?;
        let mut enclosing = None;
        for frame in &ancestors {
            open(visitor, frame, enclosing == Some(ContainerKind::Array), true)?;
            enclosing = Some(frame.kind);
        }
        self.walk(record, enclosing, visitor)?;
        for frame in ancestors.iter().rev() {
            close(visitor, frame)?;
        }
        visitor.close()
    }

    fn readable(&self, path: &Path) -> Result<Record, Error> {
        let record = self.fetch(&path.base_path())?;
        if !record.exists() {
            return Err(Error::invalid_target(path, "does not exist"));
        }
        self.ctx.notify(record.path(), encoded(&record), Operation::Read);
        Ok(record)
    }

    /// Walk the subtree starting at `record` in key order.
    ///
    /// `enclosing` is the kind of container around the start node, when the
    /// caller has already opened one.
    fn walk(
        &self,
        mut record: Record,
        enclosing: Option<ContainerKind>,
        visitor: &mut dyn Visitor,
    ) -> Result<(), Error> {
        let start = record.path().clone();
        let mut frames: Vec<Frame> = Vec::new();
        let mut previous: Option<Path> = None;

        while record.exists() && start.above(record.path()) {
            let path = record.path().clone();
            while let Some(top) = frames.last() {
                if top.path.above(&path) && !top.path.same_node(&path) {
                    break;
                }
                if let Some(frame) = frames.pop() {
                    close(visitor, &frame)?;
                }
            }

            let first = match &previous {
                None => true,
                Some(prev) => path.parent().is_some_and(|p| p.same_node(prev)),
            };
            let parent_is_array =
                frames.last().map(|f| f.kind).or(enclosing) == Some(ContainerKind::Array);

            let value = record
                .value()
                .cloned()
                .ok_or_else(|| Error::corrupt(&path, "vanished during traversal"))?;
            match (value.container_kind(), value.size()) {
                (Some(kind), Some(size)) => {
                    let frame = Frame {
                        path: path.clone(),
                        kind,
                        size,
                    };
                    open(visitor, &frame, parent_is_array, first)?;
                    frames.push(frame);
                }
                _ => visitor.record(&path, &value, parent_is_array, first)?,
            }

            previous = Some(path);
            if !record.step()? {
                break;
            }
        }

        while let Some(frame) = frames.pop() {
            close(visitor, &frame)?;
        }
        Ok(())
    }
}
