// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

use std::time::SystemTime;

use crate::Scenario;

/// A mutable entry handle passed to entry-aware store adapters.
///
/// The handle bundles a key with its current value, an original-value
/// snapshot taken at construction, an optional absolute expiry deadline, and
/// a presence flag. The adapter reads and mutates the handle in place; the
/// caller inspects it afterwards. Handles are created per operation
/// invocation and not retained by the store.
///
/// # Examples
///
/// ```
/// use faultline_store::StoreEntry;
///
/// let mut entry = StoreEntry::with_value("user:7".to_string(), 42);
/// assert!(entry.is_present());
/// assert_eq!(entry.original_value(), Some(&42));
///
/// entry.set_value(43);
/// assert_eq!(entry.value(), Some(&43));
/// // The snapshot is immutable for the handle's lifetime.
/// assert_eq!(entry.original_value(), Some(&42));
/// ```
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct StoreEntry<K, V> {
    key: K,
    value: Option<V>,
    original: Option<V>,
    expiry: Option<SystemTime>,
    present: bool,
    scenario: Scenario,
}

impl<K, V> StoreEntry<K, V> {
    /// Creates a handle for a key with no current mapping.
    pub fn new(key: K) -> Self {
        Self {
            key,
            value: None,
            original: None,
            expiry: None,
            present: false,
            scenario: Scenario::None,
        }
    }

    /// Creates a handle for a key that currently maps to `value`.
    ///
    /// The original-value snapshot is taken here.
    pub fn with_value(key: K, value: V) -> Self
    where
        V: Clone,
    {
        Self {
            key,
            original: Some(value.clone()),
            value: Some(value),
            expiry: None,
            present: true,
            scenario: Scenario::None,
        }
    }

    /// Returns the key. Immutable for the handle's lifetime.
    pub fn key(&self) -> &K {
        &self.key
    }

    /// Returns the current value, if any.
    pub fn value(&self) -> Option<&V> {
        self.value.as_ref()
    }

    /// Sets the current value and marks the key present.
    pub fn set_value(&mut self, value: V) {
        self.value = Some(value);
        self.present = true;
    }

    /// Returns the original-value snapshot taken at construction.
    pub fn original_value(&self) -> Option<&V> {
        self.original.as_ref()
    }

    /// Restores the current value from the original-value snapshot.
    ///
    /// A handle constructed without a value reverts to absent.
    pub fn revert(&mut self)
    where
        V: Clone,
    {
        self.value = self.original.clone();
        self.present = self.value.is_some();
    }

    /// Returns the absolute expiry deadline, if one is set.
    pub fn expiry(&self) -> Option<SystemTime> {
        self.expiry
    }

    /// Sets the absolute expiry deadline.
    pub fn set_expiry(&mut self, expiry: SystemTime) {
        self.expiry = Some(expiry);
    }

    /// Clears the expiry deadline.
    pub fn clear_expiry(&mut self) {
        self.expiry = None;
    }

    /// Returns whether the key currently has a mapping.
    pub fn is_present(&self) -> bool {
        self.present
    }

    /// Clears the value and the presence flag.
    ///
    /// Used by erase operations and by processors that flag an entry for
    /// removal.
    pub fn mark_removed(&mut self) {
        self.value = None;
        self.present = false;
    }

    /// Returns the scenario attached to this entry.
    pub fn scenario(&self) -> Scenario {
        self.scenario
    }

    /// Attaches a [`Scenario`] selecting a simulated misbehavior.
    pub fn set_scenario(&mut self, scenario: Scenario) {
        self.scenario = scenario;
    }
}

#[cfg(test)]
mod tests {
    use std::time::{Duration, SystemTime};

    use super::*;

    #[test]
    fn new_entry_is_absent() {
        let entry = StoreEntry::<_, String>::new("k");
        assert!(!entry.is_present());
        assert!(entry.value().is_none());
        assert!(entry.original_value().is_none());
        assert!(entry.expiry().is_none());
    }

    #[test]
    fn snapshot_survives_mutation() {
        let mut entry = StoreEntry::with_value("k", "v1".to_string());
        entry.set_value("v2".to_string());
        assert_eq!(entry.original_value().map(String::as_str), Some("v1"));

        entry.revert();
        assert_eq!(entry.value().map(String::as_str), Some("v1"));
        assert!(entry.is_present());
    }

    #[test]
    fn revert_without_snapshot_clears_value() {
        let mut entry = StoreEntry::new("k");
        entry.set_value(1);
        entry.revert();
        assert!(entry.value().is_none());
        assert!(!entry.is_present());
    }

    #[test]
    fn mark_removed_clears_presence() {
        let mut entry = StoreEntry::with_value("k", 1);
        entry.mark_removed();
        assert!(!entry.is_present());
        assert!(entry.value().is_none());
    }

    #[test]
    fn expiry_round_trips() {
        let mut entry = StoreEntry::with_value("k", 1);
        let deadline = SystemTime::UNIX_EPOCH + Duration::from_secs(60);
        entry.set_expiry(deadline);
        assert_eq!(entry.expiry(), Some(deadline));
        entry.clear_expiry();
        assert!(entry.expiry().is_none());
    }
}
