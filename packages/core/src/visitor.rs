//! Depth-first traversal events for output renderers.

use crate::{Error, Path, Value};

/// Receives the events of one read traversal, in matching begin/end order.
///
/// `parent_is_array` tells whether the enclosing container is an array;
/// `first` whether this is the first child the traversal emits inside it.
pub trait Visitor {
    fn begin(&mut self) -> Result<(), Error> {
        Ok(())
    }

    fn begin_array(
        &mut self,
        path: &Path,
        size: usize,
        parent_is_array: bool,
        first: bool,
    ) -> Result<(), Error>;

    fn end_array(&mut self, path: &Path, size: usize) -> Result<(), Error>;

    fn begin_object(
        &mut self,
        path: &Path,
        size: usize,
        parent_is_array: bool,
        first: bool,
    ) -> Result<(), Error>;

    fn end_object(&mut self, path: &Path, size: usize) -> Result<(), Error>;

    fn record(
        &mut self,
        path: &Path,
        value: &Value,
        parent_is_array: bool,
        first: bool,
    ) -> Result<(), Error>;

    fn close(&mut self) -> Result<(), Error> {
        Ok(())
    }
}

/// A visitor that ignores every event.
///
/// Useful for commands that produce no output.
pub struct NoVisitor;

impl Visitor for NoVisitor {
    fn begin_array(&mut self, _: &Path, _: usize, _: bool, _: bool) -> Result<(), Error> {
        Ok(())
    }

    fn end_array(&mut self, _: &Path, _: usize) -> Result<(), Error> {
        Ok(())
    }

    fn begin_object(&mut self, _: &Path, _: usize, _: bool, _: bool) -> Result<(), Error> {
        Ok(())
    }

    fn end_object(&mut self, _: &Path, _: usize) -> Result<(), Error> {
        Ok(())
    }

    fn record(&mut self, _: &Path, _: &Value, _: bool, _: bool) -> Result<(), Error> {
        Ok(())
    }
}

/// One traversal event, as captured by `EventRecorder`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Event {
    Begin,
    BeginArray {
        path: Path,
        size: usize,
        parent_is_array: bool,
        first: bool,
    },
    EndArray {
        path: Path,
        size: usize,
    },
    BeginObject {
        path: Path,
        size: usize,
        parent_is_array: bool,
        first: bool,
    },
    EndObject {
        path: Path,
        size: usize,
    },
    Record {
        path: Path,
        value: Value,
        parent_is_array: bool,
        first: bool,
    },
    Close,
}

/// Collects events for inspection.
#[derive(Debug, Default)]
pub struct EventRecorder {
    pub events: Vec<Event>,
}

impl EventRecorder {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Visitor for EventRecorder {
    fn begin(&mut self) -> Result<(), Error> {
        self.events.push(Event::Begin);
        Ok(())
    }

    fn begin_array(
        &mut self,
        path: &Path,
        size: usize,
        parent_is_array: bool,
        first: bool,
    ) -> Result<(), Error> {
        self.events.push(Event::BeginArray {
            path: path.clone(),
            size,
            parent_is_array,
            first,
        });
        Ok(())
    }

    fn end_array(&mut self, path: &Path, size: usize) -> Result<(), Error> {
        self.events.push(Event::EndArray {
            path: path.clone(),
            size,
        });
        Ok(())
    }

    fn begin_object(
        &mut self,
        path: &Path,
        size: usize,
        parent_is_array: bool,
        first: bool,
    ) -> Result<(), Error> {
        self.events.push(Event::BeginObject {
            path: path.clone(),
            size,
            parent_is_array,
            first,
        });
        Ok(())
    }

    fn end_object(&mut self, path: &Path, size: usize) -> Result<(), Error> {
        self.events.push(Event::EndObject {
            path: path.clone(),
            size,
        });
        Ok(())
    }

    fn record(
        &mut self,
        path: &Path,
        value: &Value,
        parent_is_array: bool,
        first: bool,
    ) -> Result<(), Error> {
        self.events.push(Event::Record {
            path: path.clone(),
            value: value.clone(),
            parent_is_array,
            first,
        });
        Ok(())
    }

    fn close(&mut self) -> Result<(), Error> {
        self.events.push(Event::Close);
        Ok(())
    }
}
