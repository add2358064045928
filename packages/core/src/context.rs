//! Per-execution-context state: store handle, hooks, configuration.

use std::sync::Arc;

use bytes::Bytes;
use janosh_kv::KvStore;

use crate::hook::{Change, ChangeHook, Operation};
use crate::{Config, Error, Path, Record, Tree};

/// Everything one execution context needs to run operations.
///
/// There is no global engine: each thread or connection builds its own
/// `Context` around its own store handle and passes it explicitly.
///
/// # Example
///
/// ```rust
/// use janosh_core::{path, Context, Value};
/// use janosh_kv::MemoryStore;
///
/// let ctx = Context::new(MemoryStore::new());
/// ctx.tree().add(&path!("/greeting"), &Value::from("hello")).unwrap();
///
/// let mut record = ctx.record(path!("/greeting"));
/// assert!(record.fetch().unwrap());
/// assert_eq!(record.value(), Some(&Value::from("hello")));
/// ```
pub struct Context {
    store: Arc<dyn KvStore>,
    hooks: Vec<Arc<dyn ChangeHook>>,
    config: Config,
}

impl Context {
    /// Wrap a store handle with the default configuration.
    pub fn new(store: impl KvStore + 'static) -> Self {
        Self::with_shared(Arc::new(store))
    }

    /// Use an already shared store handle.
    pub fn with_shared(store: Arc<dyn KvStore>) -> Self {
        Self {
            store,
            hooks: Vec::new(),
            config: Config::default(),
        }
    }

    #[must_use]
    pub fn with_config(mut self, config: Config) -> Self {
        self.config = config;
        self
    }

    #[must_use]
    pub fn with_hook(mut self, hook: Arc<dyn ChangeHook>) -> Self {
        self.hooks.push(hook);
        self
    }

    pub fn store(&self) -> &Arc<dyn KvStore> {
        &self.store
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Bind a new record (no seek happens until it is fetched).
    pub fn record(&self, path: Path) -> Record {
        Record::new(Arc::clone(&self.store), path)
    }

    /// The tree engine over this context.
    pub fn tree(&self) -> Tree<'_> {
        Tree::new(self)
    }

    /// Run `f` inside one store transaction, committing only if it succeeds.
    pub fn transaction<T>(&self, f: impl FnOnce(&Context) -> Result<T, Error>) -> Result<T, Error> {
        self.store.begin_transaction()?;
        match f(self) {
            Ok(result) => {
                self.store.end_transaction(true)?;
                Ok(result)
            }
            Err(e) => {
                log::warn!("rolling back: {}", e);
                if let Err(rollback) = self.store.end_transaction(false) {
                    log::warn!("rollback failed: {}", rollback);
                }
                Err(e)
            }
        }
    }

    pub(crate) fn notify(&self, path: &Path, value: Option<Bytes>, operation: Operation) {
        if self.hooks.is_empty() {
            return;
        }
        let change = Change {
            path: path.clone(),
            value,
            operation,
        };
        for hook in &self.hooks {
            hook.on_change(&change);
        }
    }

    pub(crate) fn notify_key(&self, key: &[u8], value: Option<Bytes>, operation: Operation) {
        if self.hooks.is_empty() {
            return;
        }
        // Scratch keys are not part of the tree.
        if let Ok(path) = Path::from_key(key) {
            self.notify(&path, value, operation);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hook::RecordingHook;
    use crate::{path, Value};
    use janosh_kv::MemoryStore;

    #[test]
    fn transaction_commits_on_success() {
        let store = MemoryStore::new();
        let ctx = Context::new(store.clone());
        ctx.transaction(|ctx| ctx.tree().add(&path!("/a"), &Value::from(1i64)))
            .unwrap();
        assert!(store.get(path!("/a").key()).unwrap().is_some());
    }

    #[test]
    fn transaction_rolls_back_on_error() {
        let store = MemoryStore::new();
        let ctx = Context::new(store.clone());
        let result = ctx.transaction(|ctx| {
            ctx.tree().add(&path!("/a"), &Value::from(1i64))?;
            ctx.tree().add(&path!("/a"), &Value::from(2i64))
        });
        assert!(matches!(result, Err(Error::InvalidTarget { .. })));
        assert_eq!(store.count().unwrap(), 0);
    }

    #[test]
    fn hooks_see_writes() {
        let hook = Arc::new(RecordingHook::new());
        let ctx = Context::new(MemoryStore::new()).with_hook(hook.clone());
        ctx.tree().add(&path!("/a"), &Value::from("x")).unwrap();

        let changes = hook.take();
        assert!(changes
            .iter()
            .any(|c| c.path == path!("/a") && c.operation == Operation::Write));
    }

    #[test]
    fn scratch_keys_are_not_notified() {
        let hook = Arc::new(RecordingHook::new());
        let ctx = Context::new(MemoryStore::new()).with_hook(hook.clone());
        ctx.notify_key(&path!("/a").scratch_key(), None, Operation::Delete);
        assert!(hook.take().is_empty());
    }
}
