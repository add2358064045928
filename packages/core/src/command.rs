//! One-shot operations, each run inside its own transaction.

use crate::{Context, Error, Path, Source, Value, Visitor};

/// A single tree operation.
#[derive(Clone, Debug, PartialEq)]
pub enum Command {
    /// Ingest a nested source at a path (the root when loading a document).
    Load { dest: Path, source: Source },
    /// Emit the subtree at `path`; `nested` wraps it in its ancestors.
    Get { path: Path, nested: bool },
    /// Emit the whole tree.
    Dump,
    Add { path: Path, value: Value },
    Replace { path: Path, value: Value },
    Set { path: Path, value: Value },
    MakeArray { path: Path },
    MakeObject { path: Path },
    /// Copy the children of `src` onto the end of the directory `dest`.
    Append { src: Path, dest: Path },
    Copy { src: Path, dest: Path },
    Move { src: Path, dest: Path },
    /// Remove a node, packing arrays as configured.
    Remove { path: Path },
    Shift { src: Path, dest: Path },
    Size { path: Path },
    Truncate,
}

/// What a command produced besides visitor events.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Reply {
    Done,
    Size(usize),
    /// Where a moved node ended up.
    Moved(Path),
}

impl Command {
    /// Stable lowercase label for log lines.
    pub fn name(&self) -> &'static str {
        match self {
            Command::Load { .. } => "load",
            Command::Get { .. } => "get",
            Command::Dump => "dump",
            Command::Add { .. } => "add",
            Command::Replace { .. } => "replace",
            Command::Set { .. } => "set",
            Command::MakeArray { .. } => "mkarr",
            Command::MakeObject { .. } => "mkobj",
            Command::Append { .. } => "append",
            Command::Copy { .. } => "copy",
            Command::Move { .. } => "move",
            Command::Remove { .. } => "remove",
            Command::Shift { .. } => "shift",
            Command::Size { .. } => "size",
            Command::Truncate => "truncate",
        }
    }

    /// Whether the command writes to the store.
    pub fn is_mutation(&self) -> bool {
        !matches!(
            self,
            Command::Get { .. } | Command::Dump | Command::Size { .. }
        )
    }

    /// Run the command inside one transaction.
    ///
    /// Read commands send their events to `visitor`; other commands ignore it.
    pub fn execute(&self, ctx: &Context, visitor: &mut dyn Visitor) -> Result<Reply, Error> {
        log::debug!("{}: start", self.name());
        let reply = ctx.transaction(|ctx| self.run(ctx, visitor))?;
        log::debug!("{}: {:?}", self.name(), reply);
        Ok(reply)
    }

    fn run(&self, ctx: &Context, visitor: &mut dyn Visitor) -> Result<Reply, Error> {
        let tree = ctx.tree();
        match self {
            Command::Load { dest, source } => {
                tree.load(dest, source)?;
            }
            Command::Get { path, nested: false } => tree.get(path, visitor)?,
            Command::Get { path, nested: true } => tree.get_nested(path, visitor)?,
            Command::Dump => tree.dump(visitor)?,
            Command::Add { path, value } => tree.add(path, value)?,
            Command::Replace { path, value } => tree.replace(path, value)?,
            Command::Set { path, value } => tree.set(path, value)?,
            Command::MakeArray { path } => tree.make_array(&path.as_directory())?,
            Command::MakeObject { path } => tree.make_object(&path.as_directory())?,
            Command::Append { src, dest } => {
                let mut source = ctx.record(src.base_path());
                tree.append(&mut source, dest)?;
            }
            Command::Copy { src, dest } => tree.copy(src, dest)?,
            Command::Move { src, dest } => return Ok(Reply::Moved(tree.move_to(src, dest)?)),
            Command::Remove { path } => {
                tree.remove_path(path)?;
            }
            Command::Shift { src, dest } => tree.shift(src, dest)?,
            Command::Size { path } => return Ok(Reply::Size(tree.size(path)?)),
            Command::Truncate => {
                tree.truncate()?;
            }
        }
        Ok(Reply::Done)
    }
}
