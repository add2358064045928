//! JSON and typed access on a `Context`.

use serde::de::DeserializeOwned;
use serde::Serialize;

use janosh_core::{Command, Context, Path};

use crate::convert::json_to_source;
use crate::{Error, JsonVisitor};

/// Extension trait for reading and writing whole subtrees as JSON.
///
/// Every method runs in one transaction.
///
/// # Example
///
/// ```rust
/// use janosh_core::{path, Context, MemoryStore};
/// use janosh_json::JsonContext;
/// use serde_json::json;
///
/// let ctx = Context::new(MemoryStore::new());
/// ctx.load_json(&path!("/"), &json!({"users": [{"name": "ada"}]})).unwrap();
/// assert_eq!(ctx.get_json(&path!("/users/#0/name")).unwrap(), json!("ada"));
/// ```
pub trait JsonContext {
    /// Ingest a JSON document at `dest`. Returns the number of entries written.
    fn load_json(&self, dest: &Path, json: &serde_json::Value) -> Result<usize, Error>;

    /// Parse `text` and ingest it at `dest`.
    fn load_json_str(&self, dest: &Path, text: &str) -> Result<usize, Error> {
        let json: serde_json::Value = serde_json::from_str(text)?;
        self.load_json(dest, &json)
    }

    /// Read the subtree at `path` back as JSON.
    fn get_json(&self, path: &Path) -> Result<serde_json::Value, Error>;

    /// Read the whole tree as JSON.
    fn dump_json(&self) -> Result<serde_json::Value, Error> {
        self.get_json(&Path::root())
    }

    /// Read the subtree at `path` into a Rust type.
    fn read_as<T: DeserializeOwned>(&self, path: &Path) -> Result<T, Error> {
        Ok(serde_json::from_value(self.get_json(path)?)?)
    }

    /// Serialize `data` and store it at `path`, replacing whatever is there.
    fn write_as<T: Serialize>(&self, path: &Path, data: &T) -> Result<usize, Error>;
}

impl JsonContext for Context {
    fn load_json(&self, dest: &Path, json: &serde_json::Value) -> Result<usize, Error> {
        let source = json_to_source(json)?;
        let written = source.entry_count();
        Command::Load {
            dest: dest.clone(),
            source,
        }
        .execute(self, &mut janosh_core::NoVisitor)?;
        log::debug!("loaded {} entries at {}", written, dest);
        Ok(written)
    }

    fn get_json(&self, path: &Path) -> Result<serde_json::Value, Error> {
        let mut visitor = JsonVisitor::new();
        Command::Get {
            path: path.clone(),
            nested: false,
        }
        .execute(self, &mut visitor)?;
        visitor
            .into_value()
            .ok_or_else(|| Error::Empty { path: path.clone() })
    }

    fn write_as<T: Serialize>(&self, path: &Path, data: &T) -> Result<usize, Error> {
        let json = serde_json::to_value(data)?;
        let source = json_to_source(&json)?;
        let written = self.transaction(|ctx| {
            let tree = ctx.tree();
            let mut existing = tree.fetch(&path.base_path())?;
            if existing.exists() {
                tree.remove(&mut existing, false)?;
            }
            tree.load(path, &source)
        })?;
        Ok(written)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use janosh_core::{path, MemoryStore};
    use serde::Deserialize;
    use serde_json::json;

    #[derive(Debug, PartialEq, Serialize, Deserialize)]
    struct User {
        name: String,
        age: u32,
        active: bool,
    }

    #[test]
    fn typed_round_trip() {
        let ctx = Context::new(MemoryStore::new());
        let alice = User {
            name: "Alice".to_string(),
            age: 30,
            active: true,
        };
        assert_eq!(ctx.write_as(&path!("/users"), &vec![&alice]).unwrap(), 5);
        let back: User = ctx.read_as(&path!("/users/#0")).unwrap();
        assert_eq!(back, alice);
    }

    #[test]
    fn write_as_replaces_in_place() {
        let ctx = Context::new(MemoryStore::new());
        ctx.load_json(&Path::root(), &json!({"list": [1, 2, 3]}))
            .unwrap();
        ctx.write_as(&path!("/list/#1"), &json!({"two": 2})).unwrap();
        ctx.write_as(&path!("/list/#2"), &"three").unwrap();
        assert_eq!(
            ctx.dump_json().unwrap(),
            json!({"list": [1, {"two": 2}, "three"]})
        );
        assert!(ctx.tree().check(&Path::root()).is_ok());
    }

    #[test]
    fn write_as_replaces_root() {
        let ctx = Context::new(MemoryStore::new());
        ctx.load_json(&Path::root(), &json!({"a": 1})).unwrap();
        ctx.write_as(&Path::root(), &json!(["x"])).unwrap();
        assert_eq!(ctx.dump_json().unwrap(), json!(["x"]));
    }

    #[test]
    fn bad_json_text_is_reported() {
        let ctx = Context::new(MemoryStore::new());
        assert!(matches!(
            ctx.load_json_str(&Path::root(), "{nope"),
            Err(Error::Json(_))
        ));
        assert!(matches!(
            ctx.get_json(&path!("/missing")),
            Err(Error::Tree(janosh_core::Error::InvalidTarget { .. }))
        ));
    }
}
