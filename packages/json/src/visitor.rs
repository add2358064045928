//! A visitor that rebuilds traversal events into a `serde_json::Value`.

use janosh_core::{Path, Value, Visitor};

use crate::convert::scalar_to_json;

/// Collects one traversal into a JSON document.
///
/// Array elements are appended in event order; object members are keyed by
/// the last component of their path.
#[derive(Debug, Default)]
pub struct JsonVisitor {
    stack: Vec<(String, serde_json::Value)>,
    done: Option<serde_json::Value>,
}

impl JsonVisitor {
    pub fn new() -> Self {
        Self::default()
    }

    /// The finished document, if a traversal completed.
    pub fn into_value(self) -> Option<serde_json::Value> {
        self.done
    }

    fn open(&mut self, path: &Path, container: serde_json::Value) {
        self.stack.push((member_name(path), container));
    }

    fn pop_container(&mut self) -> Result<(), janosh_core::Error> {
        let (name, container) = self.stack.pop().ok_or_else(|| janosh_core::Error::Visitor {
            message: "unbalanced end event".to_string(),
        })?;
        self.attach(name, container);
        Ok(())
    }

    fn attach(&mut self, name: String, value: serde_json::Value) {
        match self.stack.last_mut() {
            Some((_, serde_json::Value::Array(items))) => items.push(value),
            Some((_, serde_json::Value::Object(members))) => {
                members.insert(name, value);
            }
            Some(_) | None => self.done = Some(value),
        }
    }
}

fn member_name(path: &Path) -> String {
    path.last().map(|c| c.to_string()).unwrap_or_default()
}

impl Visitor for JsonVisitor {
    fn begin(&mut self) -> Result<(), janosh_core::Error> {
        self.stack.clear();
        self.done = None;
        Ok(())
    }

    fn begin_array(&mut self, path: &Path, size: usize, _: bool, _: bool) -> Result<(), janosh_core::Error> {
        self.open(path, serde_json::Value::Array(Vec::with_capacity(size)));
        Ok(())
    }

    fn end_array(&mut self, _: &Path, _: usize) -> Result<(), janosh_core::Error> {
        self.pop_container()
    }

    fn begin_object(&mut self, path: &Path, _: usize, _: bool, _: bool) -> Result<(), janosh_core::Error> {
        self.open(path, serde_json::Value::Object(serde_json::Map::new()));
        Ok(())
    }

    fn end_object(&mut self, _: &Path, _: usize) -> Result<(), janosh_core::Error> {
        self.pop_container()
    }

    fn record(&mut self, path: &Path, value: &Value, _: bool, _: bool) -> Result<(), janosh_core::Error> {
        let json = scalar_to_json(value).map_err(|e| janosh_core::Error::Visitor {
            message: e.to_string(),
        })?;
        self.attach(member_name(path), json);
        Ok(())
    }

    fn close(&mut self) -> Result<(), janosh_core::Error> {
        if self.stack.is_empty() {
            Ok(())
        } else {
            Err(janosh_core::Error::Visitor {
                message: format!("{} containers left open", self.stack.len()),
            })
        }
    }
}
