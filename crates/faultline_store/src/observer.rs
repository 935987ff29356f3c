// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

use crate::{StoreEntry, error::StoreError};

/// Receives completion signals from a [`NonBlockingStore`](crate::NonBlockingStore).
///
/// One observer is supplied per call. Each entry accepted by the call
/// eventually produces exactly one terminal signal ([`on_next`](Self::on_next)
/// or [`on_error`](Self::on_error)), and the call as a whole produces exactly
/// one [`on_complete`](Self::on_complete) once every entry has been accounted
/// for (success, error, or explicitly skipped).
///
/// Per-entry signal order within a batch is not guaranteed. Whether
/// `on_complete` is observed after all terminal signals depends on the
/// operation: `load_all` waits for all dispatched work, `store_all` does not.
///
/// Implementations must tolerate signals arriving after `on_complete`; the
/// store deliberately produces such a signal for the
/// [`LateCompletion`](crate::Scenario::LateCompletion) scenario and does not
/// suppress it.
pub trait StoreObserver<K, V>: Send + Sync {
    /// Signals that `entry`'s operation finished successfully. The entry
    /// carries whatever mutations the operation performed.
    fn on_next(&self, entry: StoreEntry<K, V>);

    /// Signals that `entry`'s operation failed with `error`.
    fn on_error(&self, entry: StoreEntry<K, V>, error: StoreError);

    /// Signals that every entry submitted in this call has been accounted
    /// for.
    fn on_complete(&self);
}
