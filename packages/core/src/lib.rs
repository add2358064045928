//! Janosh Core: nested documents over a flat ordered keyspace
//!
//! This layer gives the sorted bytes of `janosh-kv` a tree shape:
//! - `Path`: validated slash paths with an order-preserving key encoding
//! - `Value`: the typed payload stored at one key (scalars and size headers)
//! - `Record`: a path bound to its own cursor, the unit of navigation
//! - `Tree`: structural mutation and traversal that keep container sizes
//!   and array indices consistent
//!
//! Every container stores a header at its own key declaring its kind and
//! child count; children follow it in key order. `/a/.` names the header,
//! `/a/*` all of its direct children, and `#n` an array index.
//!
//! # Example
//!
//! ```rust
//! use janosh_core::{path, Command, Context, EventRecorder, NoVisitor, Reply, Value};
//! use janosh_kv::MemoryStore;
//!
//! let ctx = Context::new(MemoryStore::new());
//! let mut out = NoVisitor;
//! Command::MakeArray { path: path!("/x") }.execute(&ctx, &mut out).unwrap();
//! Command::Add { path: path!("/x/#0"), value: Value::from("v") }
//!     .execute(&ctx, &mut out)
//!     .unwrap();
//!
//! let size = Command::Size { path: path!("/x") }.execute(&ctx, &mut out).unwrap();
//! assert_eq!(size, Reply::Size(1));
//!
//! let mut events = EventRecorder::new();
//! ctx.tree().get(&path!("/x"), &mut events).unwrap();
//! ```

pub use bytes::Bytes;

mod command;
mod config;
mod context;
mod error;
mod hook;
mod path;
mod record;
mod source;
mod tree;
mod value;
mod visitor;

pub use command::{Command, Reply};
pub use config::Config;
pub use context::Context;
pub use error::Error;
pub use hook::{Change, ChangeHook, Operation, RecordingHook};
pub use path::{Component, Marker, Path, PathError, MAX_INDEX};
pub use record::Record;
pub use source::Source;
pub use tree::Tree;
pub use value::{ContainerKind, Number, Value, ValueError, ValueType};
pub use visitor::{Event, EventRecorder, NoVisitor, Visitor};

// Re-export the engine contract for convenience
pub use janosh_kv::{KvCursor, KvError, KvStore, MemoryStore};
