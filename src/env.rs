use std::any::Any;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

/// Named environment threaded through the middleware chain.
///
/// Values are opaque to the engine; middlewares communicate through typed
/// reads and writes on named entries. Cloning is shallow, which is how the
/// per-connection seed environment becomes each request's starting
/// environment.
///
/// Two names have engine-defined meaning: `listener` always carries the
/// acceptor's address, and `result` is read as [`HandlerResult`] when the
/// chain completes.
#[derive(Clone, Default)]
pub struct Env {
    map: HashMap<Box<str>, Arc<dyn Any + Send + Sync>>,
}

impl Env {
    /// Create a new empty [`Env`].
    #[inline]
    pub fn new() -> Self {
        Self { map: HashMap::new() }
    }

    /// Set `name` to `value`, replacing any previous entry.
    pub fn insert<V: Any + Send + Sync>(&mut self, name: impl Into<Box<str>>, value: V) {
        self.map.insert(name.into(), Arc::new(value));
    }

    /// Typed read of the entry named `name`.
    ///
    /// `None` when the entry is absent or holds another type.
    pub fn get<V: Any>(&self, name: &str) -> Option<&V> {
        self.map.get(name).and_then(|value| value.downcast_ref())
    }

    /// Returns `true` if an entry named `name` exists.
    #[inline]
    pub fn contains(&self, name: &str) -> bool {
        self.map.contains_key(name)
    }

    /// The handler result recorded under `result`, defaulting to
    /// [`HandlerResult::Ok`].
    pub fn handler_result(&self) -> HandlerResult {
        self.get::<HandlerResult>("result")
            .copied()
            .unwrap_or_default()
    }
}

impl fmt::Debug for Env {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_set().entries(self.map.keys()).finish()
    }
}

/// Final disposition a handler records under the env entry `result`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum HandlerResult {
    /// The request was handled; the connection may be kept alive.
    #[default]
    Ok,
    /// Close the connection after the response.
    Close,
}
