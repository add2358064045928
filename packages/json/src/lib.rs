//! JSON integration for Janosh
//!
//! This layer moves whole documents in and out of the tree via serde_json:
//! - `json_to_source`: JSON into an ingestion source
//! - `JsonVisitor`: traversal events back into a `serde_json::Value`
//! - `JsonContext`: load, read and write JSON or serde types on a `Context`
//!
//! # Example
//!
//! ```rust
//! use janosh_core::{path, Context, MemoryStore};
//! use janosh_json::JsonContext;
//! use serde::{Deserialize, Serialize};
//!
//! #[derive(Serialize, Deserialize)]
//! struct User {
//!     name: String,
//!     age: u32,
//! }
//!
//! let ctx = Context::new(MemoryStore::new());
//! ctx.write_as(&path!("/users"), &vec![User { name: "ada".into(), age: 36 }])
//!     .unwrap();
//! let user: User = ctx.read_as(&path!("/users/#0")).unwrap();
//! assert_eq!(user.age, 36);
//! ```

mod convert;
mod error;
mod typed;
mod visitor;

pub use convert::{json_to_source, scalar_to_json};
pub use error::Error;
pub use typed::JsonContext;
pub use visitor::JsonVisitor;

// Re-export core types for convenience
pub use janosh_core::{Context, Path, Source, Value};
