// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! The three call shapes a backing store is consumed through.
//!
//! A cache's read-through / write-through layer invokes a store through one
//! of three traits, all covering the same six operations (load, load-all,
//! store, store-all, erase, erase-all) at different levels of context:
//! whole values, mutable entry handles, or background dispatch with observer
//! callbacks.

use std::{collections::HashMap, sync::Arc};

use crate::{StoreEntry, StoreObserver, error::Result};

/// Whole-value store operations with synchronous discipline.
///
/// Each returned future completes only when the operation has fully finished,
/// including any injected delay; the caller is blocked for the duration.
/// Failures abort the remainder of a batch and propagate as a single error
/// per call.
///
/// # Partial success
///
/// `store_all` and `erase_all` remove each processed item from the
/// caller-supplied collection as it completes. After a failed call the
/// collection holds exactly the items that still need to be retried: the
/// failing item and everything after it in iteration order.
pub trait CacheStore<K, V>: Send + Sync {
    /// Loads the value for `key`, or `None` when no mapping exists.
    fn load(&self, key: &K) -> impl Future<Output = Result<Option<V>>> + Send;

    /// Loads the values for `keys`.
    ///
    /// The result contains only keys that resolved to a present value; keys
    /// with no stored value are omitted.
    fn load_all(&self, keys: &[K]) -> impl Future<Output = Result<HashMap<K, V>>> + Send;

    /// Upserts `value` under `key`.
    fn store(&self, key: &K, value: V) -> impl Future<Output = Result<()>> + Send;

    /// Upserts each pair in `batch`, removing pairs from `batch` as they are
    /// persisted.
    fn store_all(&self, batch: &mut Vec<(K, V)>) -> impl Future<Output = Result<()>> + Send;

    /// Deletes the mapping for `key`, if any.
    fn erase(&self, key: &K) -> impl Future<Output = Result<()>> + Send;

    /// Deletes the mappings for `keys`, removing keys from `keys` as they are
    /// processed.
    fn erase_all(&self, keys: &mut Vec<K>) -> impl Future<Output = Result<()>> + Send;
}

/// Entry-handle store operations with synchronous discipline.
///
/// The same six operations as [`CacheStore`], operating on mutable
/// [`StoreEntry`] handles that also carry an expiry deadline and an
/// original-value snapshot. Successful stores additionally invoke the
/// installed [`EntryProcessor`](crate::EntryProcessor).
pub trait EntryStore<K, V>: Send + Sync {
    /// Loads the stored value into `entry`. When no mapping exists the entry
    /// is left untouched.
    fn load(&self, entry: &mut StoreEntry<K, V>) -> impl Future<Output = Result<()>> + Send;

    /// Loads stored values into each entry. Entries with no stored value are
    /// left untouched and are NOT removed from the collection (deliberate
    /// contrast with [`CacheStore::load_all`], which omits unresolved keys).
    fn load_all(&self, entries: &mut [StoreEntry<K, V>]) -> impl Future<Output = Result<()>> + Send;

    /// Upserts `entry`'s value, applies the configured expiry, then invokes
    /// the processor on the entry.
    fn store(&self, entry: &mut StoreEntry<K, V>) -> impl Future<Output = Result<()>> + Send;

    /// Stores each entry, removing entries from the collection as they are
    /// persisted.
    fn store_all(&self, entries: &mut Vec<StoreEntry<K, V>>) -> impl Future<Output = Result<()>> + Send;

    /// Deletes `entry`'s mapping and marks the handle removed.
    fn erase(&self, entry: &mut StoreEntry<K, V>) -> impl Future<Output = Result<()>> + Send;

    /// Deletes each entry's mapping, removing entries from the collection as
    /// they are processed.
    fn erase_all(&self, entries: &mut Vec<StoreEntry<K, V>>) -> impl Future<Output = Result<()>> + Send;
}

/// Store operations dispatched in the background.
///
/// Read and write operations are handed to a bounded worker pool and report
/// outcomes through a [`StoreObserver`]; the returned future resolves once
/// the work has been submitted (and, for `load_all` only, once all submitted
/// work has reported). Failures after dispatch never propagate to the
/// caller; they are delivered via [`StoreObserver::on_error`].
///
/// Erase operations are performed in-line with entry-handle semantics and no
/// observer involvement.
pub trait NonBlockingStore<K, V>: Send + Sync {
    /// Dispatches a load for `entry`. The observer receives one terminal
    /// signal for the entry followed by `on_complete` for this single-entry
    /// call.
    fn load(&self, entry: StoreEntry<K, V>, observer: Arc<dyn StoreObserver<K, V>>) -> impl Future<Output = ()> + Send;

    /// Dispatches one load per entry and waits until every dispatched task
    /// has reported before invoking `on_complete` once for the whole batch.
    fn load_all(
        &self,
        entries: Vec<StoreEntry<K, V>>,
        observer: Arc<dyn StoreObserver<K, V>>,
    ) -> impl Future<Output = ()> + Send;

    /// Dispatches a store for `entry`: upsert, expiry, processor, then the
    /// terminal signal and `on_complete`.
    fn store(&self, entry: StoreEntry<K, V>, observer: Arc<dyn StoreObserver<K, V>>)
    -> impl Future<Output = ()> + Send;

    /// Decides per entry whether to skip it, fail the whole batch, or
    /// dispatch it, then invokes `on_complete` once, without waiting for
    /// dispatched work to finish (deliberate contrast with
    /// [`load_all`](Self::load_all)). Dispatched entries are removed from the
    /// caller's collection; skipped entries remain.
    fn store_all(
        &self,
        entries: &mut Vec<StoreEntry<K, V>>,
        observer: Arc<dyn StoreObserver<K, V>>,
    ) -> impl Future<Output = ()> + Send;

    /// Deletes `entry`'s mapping in-line.
    fn erase(&self, entry: &mut StoreEntry<K, V>) -> impl Future<Output = Result<()>> + Send;

    /// Deletes each entry's mapping in-line, removing entries from the
    /// collection as they are processed.
    fn erase_all(&self, entries: &mut Vec<StoreEntry<K, V>>) -> impl Future<Output = Result<()>> + Send;
}
