// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

use std::{collections::HashMap, sync::Arc};

use parking_lot::Mutex;

use faultline_store::OpKind;

/// Per-operation invocation counters.
///
/// Safe for concurrent increment from many caller threads; the handle is
/// cheap to clone and all clones share the same counters. Tests inspect
/// counts to verify how often the cache called through to the store.
///
/// # Examples
///
/// ```
/// use faultline::{InvocationStats, OpKind};
///
/// let stats = InvocationStats::new();
/// stats.record(OpKind::Load);
/// stats.record(OpKind::Load);
/// assert_eq!(stats.count(OpKind::Load), 2);
///
/// stats.reset();
/// assert_eq!(stats.count(OpKind::Load), 0);
/// ```
#[derive(Clone, Debug, Default)]
pub struct InvocationStats {
    counts: Arc<Mutex<HashMap<OpKind, u64>>>,
}

impl InvocationStats {
    /// Creates statistics with all counters at zero.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Increments the counter for `op`.
    pub fn record(&self, op: OpKind) {
        *self.counts.lock().entry(op).or_insert(0) += 1;
    }

    /// Returns the invocation count for `op`.
    #[must_use]
    pub fn count(&self, op: OpKind) -> u64 {
        self.counts.lock().get(&op).copied().unwrap_or(0)
    }

    /// Returns a copy of all non-zero counters.
    #[must_use]
    pub fn snapshot(&self) -> HashMap<OpKind, u64> {
        self.counts.lock().clone()
    }

    /// Clears all counters.
    pub fn reset(&self) {
        self.counts.lock().clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn counts_start_at_zero() {
        let stats = InvocationStats::new();
        for op in OpKind::ALL {
            assert_eq!(stats.count(op), 0);
        }
    }

    #[test]
    fn clones_share_counters() {
        let stats = InvocationStats::new();
        stats.clone().record(OpKind::StoreAll);
        assert_eq!(stats.count(OpKind::StoreAll), 1);
        assert_eq!(stats.snapshot().len(), 1);
    }
}
