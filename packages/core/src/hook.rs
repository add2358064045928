//! Change notification for tracking and trigger collaborators.

use std::sync::Mutex;

use bytes::Bytes;

use crate::Path;

/// What happened to an entry.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Operation {
    Read,
    Write,
    Delete,
}

/// One entry-level change.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Change {
    pub path: Path,
    /// The raw stored bytes after the change; `None` for deletes.
    pub value: Option<Bytes>,
    pub operation: Operation,
}

/// Receives one call per written, deleted or read entry.
///
/// The engine does not depend on what a hook does with the change.
pub trait ChangeHook: Send + Sync {
    fn on_change(&self, change: &Change);
}

/// A hook that keeps every change it sees.
#[derive(Default)]
pub struct RecordingHook {
    changes: Mutex<Vec<Change>>,
}

impl RecordingHook {
    pub fn new() -> Self {
        Self::default()
    }

    /// Drain the collected changes.
    pub fn take(&self) -> Vec<Change> {
        match self.changes.lock() {
            Ok(mut changes) => std::mem::take(&mut *changes),
            Err(poisoned) => std::mem::take(&mut *poisoned.into_inner()),
        }
    }
}

impl ChangeHook for RecordingHook {
    fn on_change(&self, change: &Change) {
        match self.changes.lock() {
            Ok(mut changes) => changes.push(change.clone()),
            Err(poisoned) => poisoned.into_inner().push(change.clone()),
        }
    }
}
