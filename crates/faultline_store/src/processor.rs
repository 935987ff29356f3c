// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

use std::fmt;

use crate::StoreEntry;

/// A hook invoked once per successfully stored entry.
///
/// Only entry-aware adapters invoke the processor, because only an entry
/// handle exposes enough context (expiry, mutability, identity) for a
/// processor to act on. The processor runs after the value has been written
/// to the backing tier and may mutate the handle; the caller observes the
/// mutation.
pub trait EntryProcessor<K, V>: Send + Sync {
    /// Processes one stored entry.
    fn process(&self, entry: &mut StoreEntry<K, V>);
}

/// The default processor. Does nothing.
#[derive(Clone, Copy, Debug, Default)]
pub struct NoopProcessor;

impl<K, V> EntryProcessor<K, V> for NoopProcessor {
    fn process(&self, _entry: &mut StoreEntry<K, V>) {}
}

type PutPredicate<K, V> = Box<dyn Fn(&StoreEntry<K, V>) -> bool + Send + Sync>;

/// Overwrites an entry's value when a predicate holds.
///
/// The conditional-put analog: tests install it to verify that processor
/// side effects performed during a store become visible on the handle.
///
/// # Examples
///
/// ```
/// use faultline_store::{ConditionalPut, EntryProcessor, StoreEntry};
///
/// let processor = ConditionalPut::new(|entry: &StoreEntry<String, i32>| *entry.key() == "7", 99);
///
/// let mut entry = StoreEntry::with_value("7".to_string(), 1);
/// processor.process(&mut entry);
/// assert_eq!(entry.value(), Some(&99));
///
/// let mut other = StoreEntry::with_value("8".to_string(), 1);
/// processor.process(&mut other);
/// assert_eq!(other.value(), Some(&1));
/// ```
pub struct ConditionalPut<K, V> {
    predicate: PutPredicate<K, V>,
    value: V,
}

impl<K, V> ConditionalPut<K, V> {
    /// Creates a processor that overwrites the value with `value` whenever
    /// `predicate` holds for the entry.
    pub fn new<F>(predicate: F, value: V) -> Self
    where
        F: Fn(&StoreEntry<K, V>) -> bool + Send + Sync + 'static,
    {
        Self {
            predicate: Box::new(predicate),
            value,
        }
    }
}

impl<K, V> fmt::Debug for ConditionalPut<K, V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConditionalPut").finish_non_exhaustive()
    }
}

impl<K, V> EntryProcessor<K, V> for ConditionalPut<K, V>
where
    K: Send + Sync,
    V: Clone + Send + Sync,
{
    fn process(&self, entry: &mut StoreEntry<K, V>) {
        if (self.predicate)(entry) {
            entry.set_value(self.value.clone());
        }
    }
}

/// Restores the original-value snapshot, or flags removal when no snapshot
/// exists.
///
/// Installed by tests that verify a store can undo the caller's mutation:
/// an entry stored with a prior value reverts to it, a freshly created entry
/// is marked removed.
#[derive(Clone, Copy, Debug, Default)]
pub struct RevertOrRemove;

impl<K, V> EntryProcessor<K, V> for RevertOrRemove
where
    K: Send + Sync,
    V: Clone + Send + Sync,
{
    fn process(&self, entry: &mut StoreEntry<K, V>) {
        if entry.original_value().is_some() {
            entry.revert();
        } else {
            entry.mark_removed();
        }
    }
}
