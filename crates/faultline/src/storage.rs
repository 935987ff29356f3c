// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

use std::{collections::HashMap, hash::Hash, sync::Arc};

use parking_lot::Mutex;

/// The observable in-memory stand-in for a durable tier.
///
/// An unbounded key→value map that never evicts. The handle is cheap to
/// clone and all clones share the same map, so a test can pre-seed state
/// before driving the cache and inspect what the store persisted afterwards.
/// Individual operations are atomic at single-key granularity; batch
/// operations provide no transactional isolation.
///
/// # Examples
///
/// ```
/// use faultline::StorageMap;
///
/// let storage = StorageMap::new();
/// storage.insert("k".to_string(), 1);
///
/// let view = storage.clone();
/// assert_eq!(view.get(&"k".to_string()), Some(1));
/// assert_eq!(view.len(), 1);
/// ```
#[derive(Clone, Debug)]
pub struct StorageMap<K, V> {
    data: Arc<Mutex<HashMap<K, V>>>,
}

impl<K, V> Default for StorageMap<K, V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<K, V> StorageMap<K, V> {
    /// Creates an empty map.
    #[must_use]
    pub fn new() -> Self {
        Self {
            data: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    /// Returns the number of stored mappings.
    #[must_use]
    pub fn len(&self) -> usize {
        self.data.lock().len()
    }

    /// Returns `true` when no mappings are stored.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.data.lock().is_empty()
    }

    /// Removes all mappings.
    pub fn clear(&self) {
        self.data.lock().clear();
    }
}

impl<K, V> StorageMap<K, V>
where
    K: Eq + Hash,
{
    /// Returns `true` when `key` has a mapping.
    #[must_use]
    pub fn contains_key(&self, key: &K) -> bool {
        self.data.lock().contains_key(key)
    }

    /// Upserts `value` under `key`, returning the previous value.
    pub fn insert(&self, key: K, value: V) -> Option<V> {
        self.data.lock().insert(key, value)
    }

    /// Removes the mapping for `key`, returning the removed value.
    pub fn remove(&self, key: &K) -> Option<V> {
        self.data.lock().remove(key)
    }

    /// Inserts every pair from `entries`. Used by tests to pre-seed state.
    pub fn extend(&self, entries: impl IntoIterator<Item = (K, V)>) {
        self.data.lock().extend(entries);
    }
}

impl<K, V> StorageMap<K, V>
where
    K: Eq + Hash,
    V: Clone,
{
    /// Returns a copy of the value stored under `key`.
    #[must_use]
    pub fn get(&self, key: &K) -> Option<V> {
        self.data.lock().get(key).cloned()
    }
}

impl<K, V> StorageMap<K, V>
where
    K: Clone + Eq + Hash,
    V: Clone,
{
    /// Returns a copy of all stored keys.
    #[must_use]
    pub fn keys(&self) -> Vec<K> {
        self.data.lock().keys().cloned().collect()
    }

    /// Returns a copy of the whole map.
    #[must_use]
    pub fn snapshot(&self) -> HashMap<K, V> {
        self.data.lock().clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn insert_get_remove_round_trip() {
        let storage = StorageMap::new();
        assert!(storage.insert("k", 1).is_none());
        assert_eq!(storage.insert("k", 2), Some(1));
        assert_eq!(storage.get(&"k"), Some(2));
        assert_eq!(storage.remove(&"k"), Some(2));
        assert!(storage.is_empty());
    }

    #[test]
    fn clones_observe_the_same_map() {
        let storage = StorageMap::new();
        let view = storage.clone();
        storage.extend([("a", 1), ("b", 2)]);

        assert_eq!(view.len(), 2);
        assert!(view.contains_key(&"a"));
        assert_eq!(view.snapshot().get("b"), Some(&2));
    }
}
