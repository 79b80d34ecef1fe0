use std::collections::HashMap;
use std::fmt::Debug;
use std::hash::Hash;

use parking_lot::RwLock;

/// In-memory key/value map shared between request handlers.
///
/// Many readers may hold the lock at once; a writer excludes everyone.
/// Entries live until the process exits.
#[derive(Debug)]
pub struct KeyValueStore<K, V> {
    entries: RwLock<HashMap<K, V>>,
}

impl<K, V> Default for KeyValueStore<K, V> {
    fn default() -> Self {
        Self {
            entries: RwLock::new(HashMap::new()),
        }
    }
}

impl<K, V> KeyValueStore<K, V>
where
    K: Eq + Hash + Debug,
    V: Clone + Debug,
{
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts or overwrites `key`.
    pub fn add(&self, key: K, value: V) {
        tracing::trace!(?key, ?value, "store add");
        self.entries.write().insert(key, value);
    }

    /// Returns a copy of the value for `key`, if any.
    #[must_use]
    pub fn read(&self, key: &K) -> Option<V> {
        let value = self.entries.read().get(key).cloned();
        tracing::trace!(?key, found = value.is_some(), "store read");
        value
    }

    #[must_use]
    pub fn contains(&self, key: &K) -> bool {
        self.entries.read().contains_key(key)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }
}
