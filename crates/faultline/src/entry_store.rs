// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

use std::{fmt, fmt::Display, hash::Hash, sync::Arc};

use parking_lot::Mutex;

use faultline_store::{EntryProcessor, EntryStore, NoopProcessor, OpKind, Result, StoreEntry};

use crate::{InvocationStats, StorageMap, StoreConfig, StoreCore, fault::Interrupter};

type SharedProcessor<K, V> = Arc<dyn EntryProcessor<K, V>>;

/// The synchronous entry-handle adapter.
///
/// Implements [`EntryStore`] against the shared in-memory tier. The same
/// operation template as the whole-value adapter, but operating on mutable
/// [`StoreEntry`] handles: loads fill in the value and (when configured) the
/// expiry deadline, and every successful store additionally invokes the
/// installed [`EntryProcessor`] on the entry. The processor hook exists only
/// on this shape because only an entry handle exposes enough context for a
/// processor to act on.
///
/// # Examples
///
/// ```
/// use std::sync::Arc;
/// use faultline::SimEntryStore;
/// use faultline_store::{EntryStore, RevertOrRemove, StoreEntry};
/// use tick::Clock;
///
/// # futures::executor::block_on(async {
/// let store = SimEntryStore::new(Clock::new_frozen());
/// store.set_processor(Arc::new(RevertOrRemove));
///
/// let mut entry = StoreEntry::with_value("k".to_string(), 1);
/// entry.set_value(2);
/// store.store(&mut entry).await?;
///
/// // The tier saw the new value; the processor reverted the handle.
/// assert_eq!(store.storage().get(&"k".to_string()), Some(2));
/// assert_eq!(entry.value(), Some(&1));
/// # Ok::<(), faultline::StoreError>(())
/// # });
/// ```
pub struct SimEntryStore<K, V> {
    core: Arc<StoreCore<K, V>>,
    processor: Mutex<SharedProcessor<K, V>>,
}

impl<K, V> fmt::Debug for SimEntryStore<K, V>
where
    K: fmt::Debug,
    V: fmt::Debug,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SimEntryStore").field("core", &self.core).finish_non_exhaustive()
    }
}

impl<K, V> SimEntryStore<K, V>
where
    K: Send + Sync,
    V: Send + Sync,
{
    /// Creates an adapter with its own core and the no-op processor.
    #[must_use]
    pub fn new(clock: tick::Clock) -> Self {
        Self::with_core(Arc::new(StoreCore::new(clock)))
    }

    /// Creates an adapter over an existing core, sharing its tier,
    /// configuration, and statistics with sibling adapters.
    #[must_use]
    pub fn with_core(core: Arc<StoreCore<K, V>>) -> Self {
        Self {
            core,
            processor: Mutex::new(Arc::new(NoopProcessor)),
        }
    }

    /// Installs the processor invoked on every successfully stored entry.
    pub fn set_processor(&self, processor: SharedProcessor<K, V>) {
        *self.processor.lock() = processor;
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

impl<K, V> SimEntryStore<K, V>
where
    K: Clone + Display + Eq + Hash + Send + Sync,
    V: Clone + Send + Sync,
{
    fn load_one(&self, op: OpKind, entry: &mut StoreEntry<K, V>) -> Result<()> {
        self.core.check(op, entry.key())?;
        if let Some(value) = self.core.storage.get(entry.key()) {
            entry.set_value(value);
            if let Some(deadline) = self.core.expiry_deadline() {
                entry.set_expiry(deadline);
            }
        }
        Ok(())
    }

    fn store_one(&self, op: OpKind, entry: &mut StoreEntry<K, V>) -> Result<()> {
        self.core.check(op, entry.key())?;
        if let Some(value) = entry.value() {
            self.core.storage.insert(entry.key().clone(), value.clone());
        }
        if let Some(deadline) = self.core.expiry_deadline() {
            entry.set_expiry(deadline);
        }
        let processor = Arc::clone(&self.processor.lock());
        processor.process(entry);
        Ok(())
    }

    fn erase_one(&self, op: OpKind, entry: &mut StoreEntry<K, V>) -> Result<()> {
        self.core.check(op, entry.key())?;
        self.core.storage.remove(entry.key());
        entry.mark_removed();
        Ok(())
    }
}

impl<K, V> EntryStore<K, V> for SimEntryStore<K, V>
where
    K: Clone + Display + Eq + Hash + Send + Sync,
    V: Clone + Send + Sync,
{
    async fn load(&self, entry: &mut StoreEntry<K, V>) -> Result<()> {
        self.core.begin(OpKind::Load).await?;
        self.load_one(OpKind::Load, entry)
    }

    async fn load_all(&self, entries: &mut [StoreEntry<K, V>]) -> Result<()> {
        self.core.begin(OpKind::LoadAll).await?;
        // Unresolved entries stay in the collection, untouched.
        for entry in entries.iter_mut() {
            self.load_one(OpKind::LoadAll, entry)?;
        }
        Ok(())
    }

    async fn store(&self, entry: &mut StoreEntry<K, V>) -> Result<()> {
        self.core.begin(OpKind::Store).await?;
        self.store_one(OpKind::Store, entry)
    }

    async fn store_all(&self, entries: &mut Vec<StoreEntry<K, V>>) -> Result<()> {
        self.core.begin(OpKind::StoreAll).await?;
        while let Some(entry) = entries.first_mut() {
            self.store_one(OpKind::StoreAll, entry)?;
            let _ = entries.remove(0);
        }
        Ok(())
    }

    async fn erase(&self, entry: &mut StoreEntry<K, V>) -> Result<()> {
        self.core.begin(OpKind::Erase).await?;
        self.erase_one(OpKind::Erase, entry)
    }

    async fn erase_all(&self, entries: &mut Vec<StoreEntry<K, V>>) -> Result<()> {
        self.core.begin(OpKind::EraseAll).await?;
        while let Some(entry) = entries.first_mut() {
            self.erase_one(OpKind::EraseAll, entry)?;
            let _ = entries.remove(0);
        }
        Ok(())
    }
}
