//! Janosh KV: the ordered key-value engine underneath the document store.
//!
//! This is the narrow waist of the Janosh stack. Everything at this level is
//! flat bytes - sorted keys, opaque values, no tree semantics.
//!
//! The contract is the one a sorted on-disk engine offers:
//! - `KvStore`: point reads and writes, one coarse transaction at a time
//! - `KvCursor`: positioned iteration in byte-wise lexicographic key order
//!
//! `MemoryStore` implements both on top of a `BTreeMap` and can persist the
//! whole keyspace to a snapshot file.
//!
//! # Example
//!
//! ```rust
//! use janosh_kv::{KvCursor, KvStore, MemoryStore};
//! use bytes::Bytes;
//!
//! let store = MemoryStore::new();
//! store.set(b"b", Bytes::from_static(b"2")).unwrap();
//! store.set(b"a", Bytes::from_static(b"1")).unwrap();
//!
//! let mut cursor = store.cursor();
//! assert!(cursor.jump_to_first().unwrap());
//! let (key, _) = cursor.get().unwrap().unwrap();
//! assert_eq!(&key[..], b"a");
//! ```

pub use bytes::Bytes;

mod error;
mod memory;
mod snapshot;
mod traits;

pub use error::KvError;
pub use memory::{MemoryCursor, MemoryStore};
pub use snapshot::SNAPSHOT_VERSION;
pub use traits::{KvCursor, KvStore};
