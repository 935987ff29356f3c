// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

use std::{collections::HashMap, fmt::Display, hash::Hash, sync::Arc};

use faultline_store::{CacheStore, OpKind, Result};

use crate::{InvocationStats, StorageMap, StoreConfig, StoreCore, fault::Interrupter};

/// The synchronous whole-value adapter.
///
/// Implements [`CacheStore`] against the shared in-memory tier. Every
/// operation follows the same template: log when verbose, count the
/// invocation, run the injected delay, check the failure key, then perform
/// the mapping operation. The caller is blocked for the delay's duration.
///
/// # Examples
///
/// ```
/// use faultline::SimStore;
/// use faultline_store::CacheStore;
/// use tick::Clock;
///
/// # futures::executor::block_on(async {
/// let store = SimStore::new(Clock::new_frozen());
/// store.store(&"k".to_string(), 7).await?;
/// assert_eq!(store.load(&"k".to_string()).await?, Some(7));
/// # Ok::<(), faultline::StoreError>(())
/// # });
/// ```
#[derive(Debug)]
pub struct SimStore<K, V> {
    core: Arc<StoreCore<K, V>>,
}

impl<K, V> SimStore<K, V> {
    /// Creates an adapter with its own core: default configuration, empty
    /// tier.
    #[must_use]
    pub fn new(clock: tick::Clock) -> Self {
        Self::with_core(Arc::new(StoreCore::new(clock)))
    }

    /// Creates an adapter over an existing core, sharing its tier,
    /// configuration, and statistics with sibling adapters.
    #[must_use]
    pub fn with_core(core: Arc<StoreCore<K, V>>) -> Self {
        Self { core }
    }

    /// Returns the shared core.
    #[must_use]
    pub fn core(&self) -> &Arc<StoreCore<K, V>> {
        &self.core
    }

    /// Returns the configuration handle.
    #[must_use]
    pub fn config(&self) -> &StoreConfig {
        self.core.config()
    }

    /// Returns the statistics handle.
    #[must_use]
    pub fn stats(&self) -> &InvocationStats {
        self.core.stats()
    }

    /// Returns the observable storage map.
    #[must_use]
    pub fn storage(&self) -> &StorageMap<K, V> {
        self.core.storage()
    }

    /// Returns the interrupter delivering wake-ups to injected delays.
    #[must_use]
    pub fn interrupter(&self) -> &Interrupter {
        self.core.interrupter()
    }
}

impl<K, V> CacheStore<K, V> for SimStore<K, V>
where
    K: Clone + Display + Eq + Hash + Send + Sync,
    V: Clone + Send + Sync,
{
    async fn load(&self, key: &K) -> Result<Option<V>> {
        self.core.begin(OpKind::Load).await?;
        self.core.check(OpKind::Load, key)?;
        Ok(self.core.storage.get(key))
    }

    async fn load_all(&self, keys: &[K]) -> Result<HashMap<K, V>> {
        self.core.begin(OpKind::LoadAll).await?;
        let mut resolved = HashMap::new();
        for key in keys {
            self.core.check(OpKind::LoadAll, key)?;
            // Unresolved keys are omitted from the result.
            if let Some(value) = self.core.storage.get(key) {
                resolved.insert(key.clone(), value);
            }
        }
        Ok(resolved)
    }

    async fn store(&self, key: &K, value: V) -> Result<()> {
        self.core.begin(OpKind::Store).await?;
        self.core.check(OpKind::Store, key)?;
        self.core.storage.insert(key.clone(), value);
        Ok(())
    }

    async fn store_all(&self, batch: &mut Vec<(K, V)>) -> Result<()> {
        self.core.begin(OpKind::StoreAll).await?;
        while let Some((key, value)) = batch.first() {
            self.core.check(OpKind::StoreAll, key)?;
            self.core.storage.insert(key.clone(), value.clone());
            let _ = batch.remove(0);
        }
        Ok(())
    }

    async fn erase(&self, key: &K) -> Result<()> {
        self.core.begin(OpKind::Erase).await?;
        self.core.check(OpKind::Erase, key)?;
        self.core.storage.remove(key);
        Ok(())
    }

    async fn erase_all(&self, keys: &mut Vec<K>) -> Result<()> {
        self.core.begin(OpKind::EraseAll).await?;
        while let Some(key) = keys.first() {
            self.core.check(OpKind::EraseAll, key)?;
            self.core.storage.remove(key);
            let _ = keys.remove(0);
        }
        Ok(())
    }
}
