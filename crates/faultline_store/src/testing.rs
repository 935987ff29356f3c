// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! Observer implementation for testing non-blocking stores.

use parking_lot::Mutex;
use tokio::sync::Notify;

use crate::{ErrorKind, OpKind, StoreEntry, StoreError, StoreObserver};

/// One recorded terminal signal.
#[derive(Clone, Debug)]
pub enum Signal<K, V> {
    /// The entry's operation succeeded.
    Next(StoreEntry<K, V>),
    /// The entry's operation failed.
    Error {
        /// The entry whose operation failed.
        entry: StoreEntry<K, V>,
        /// The error classification.
        kind: ErrorKind,
        /// The operation the error occurred in.
        op: OpKind,
    },
}

/// A [`StoreObserver`] that records every signal for later assertion.
///
/// Terminal signals arriving after `on_complete` are segregated into a
/// separate late-signal list rather than rejected, so tests can assert that
/// the at-most-once contract was exercised.
///
/// # Examples
///
/// ```
/// use std::sync::Arc;
/// use faultline_store::{StoreEntry, StoreObserver, testing::RecordingObserver};
///
/// let observer = Arc::new(RecordingObserver::<String, i32>::new());
/// observer.on_next(StoreEntry::with_value("k".to_string(), 1));
/// observer.on_complete();
///
/// assert_eq!(observer.next_entries().len(), 1);
/// assert_eq!(observer.completion_count(), 1);
/// ```
#[derive(Debug)]
pub struct RecordingObserver<K, V> {
    signals: Mutex<Vec<Signal<K, V>>>,
    late: Mutex<Vec<Signal<K, V>>>,
    completions: Mutex<u32>,
    notify: Notify,
}

impl<K, V> Default for RecordingObserver<K, V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<K, V> RecordingObserver<K, V> {
    /// Creates an observer with no recorded signals.
    #[must_use]
    pub fn new() -> Self {
        Self {
            signals: Mutex::new(Vec::new()),
            late: Mutex::new(Vec::new()),
            completions: Mutex::new(0),
            notify: Notify::new(),
        }
    }

    /// Returns how many times `on_complete` has been called.
    #[must_use]
    pub fn completion_count(&self) -> u32 {
        *self.completions.lock()
    }

    /// Returns whether `on_complete` has been called at least once.
    #[must_use]
    pub fn is_completed(&self) -> bool {
        self.completion_count() > 0
    }

    /// Returns the number of terminal signals recorded before completion.
    #[must_use]
    pub fn signal_count(&self) -> usize {
        self.signals.lock().len()
    }

    /// Waits until `on_complete` has been called.
    pub async fn wait_complete(&self) {
        loop {
            let notified = self.notify.notified();
            if self.is_completed() {
                return;
            }
            notified.await;
        }
    }

    /// Waits until at least `count` terminal signals have been recorded,
    /// late signals included. Needed for the fire-and-forget batch shape,
    /// where completion does not imply the dispatched work has reported.
    pub async fn wait_for_signals(&self, count: usize) {
        loop {
            let notified = self.notify.notified();
            if self.signals.lock().len() + self.late.lock().len() >= count {
                return;
            }
            notified.await;
        }
    }

    fn record(&self, signal: Signal<K, V>) {
        if self.is_completed() {
            self.late.lock().push(signal);
        } else {
            self.signals.lock().push(signal);
        }
        self.notify.notify_waiters();
    }
}

impl<K, V> RecordingObserver<K, V>
where
    K: Clone,
    V: Clone,
{
    /// Returns all signals recorded before completion, in arrival order.
    #[must_use]
    pub fn signals(&self) -> Vec<Signal<K, V>> {
        self.signals.lock().clone()
    }

    /// Returns the entries delivered through `on_next` before completion.
    #[must_use]
    pub fn next_entries(&self) -> Vec<StoreEntry<K, V>> {
        self.signals
            .lock()
            .iter()
            .filter_map(|signal| match signal {
                Signal::Next(entry) => Some(entry.clone()),
                Signal::Error { .. } => None,
            })
            .collect()
    }

    /// Returns the entries and classifications delivered through `on_error`
    /// before completion.
    #[must_use]
    pub fn errors(&self) -> Vec<(StoreEntry<K, V>, ErrorKind, OpKind)> {
        self.signals
            .lock()
            .iter()
            .filter_map(|signal| match signal {
                Signal::Next(_) => None,
                Signal::Error { entry, kind, op } => Some((entry.clone(), *kind, *op)),
            })
            .collect()
    }

    /// Returns the signals that arrived after `on_complete`.
    #[must_use]
    pub fn late_signals(&self) -> Vec<Signal<K, V>> {
        self.late.lock().clone()
    }
}

impl<K, V> StoreObserver<K, V> for RecordingObserver<K, V>
where
    K: Send + Sync,
    V: Send + Sync,
{
    fn on_next(&self, entry: StoreEntry<K, V>) {
        self.record(Signal::Next(entry));
    }

    fn on_error(&self, entry: StoreEntry<K, V>, error: StoreError) {
        self.record(Signal::Error {
            entry,
            kind: error.kind,
            op: error.op,
        });
    }

    fn on_complete(&self) {
        *self.completions.lock() += 1;
        self.notify.notify_waiters();
    }
}
