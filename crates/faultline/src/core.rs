// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

use std::{fmt::Display, time::SystemTime};

use tick::Clock;

use faultline_store::{OpKind, Result};

use crate::{InvocationStats, StorageMap, StoreConfig, fault, fault::Interrupter};

/// State and plumbing shared by the three adapters.
///
/// Holds the configuration, statistics, storage map, clock, and interrupter,
/// and implements the common operation preamble: verbose logging, invocation
/// counting, the injected delay, and the failure-key check. Adapters embed a
/// `StoreCore` behind an `Arc`; siblings built from the same core operate on
/// one shared tier with one set of options and counters.
#[derive(Debug)]
pub struct StoreCore<K, V> {
    pub(crate) config: StoreConfig,
    pub(crate) stats: InvocationStats,
    pub(crate) storage: StorageMap<K, V>,
    pub(crate) clock: Clock,
    pub(crate) interrupter: Interrupter,
}

impl<K, V> StoreCore<K, V> {
    /// Creates a core with default configuration and an empty tier.
    #[must_use]
    pub fn new(clock: Clock) -> Self {
        Self {
            config: StoreConfig::new(),
            stats: InvocationStats::new(),
            storage: StorageMap::new(),
            clock,
            interrupter: Interrupter::new(),
        }
    }

    /// Returns the configuration handle.
    #[must_use]
    pub fn config(&self) -> &StoreConfig {
        &self.config
    }

    /// Returns the statistics handle.
    #[must_use]
    pub fn stats(&self) -> &InvocationStats {
        &self.stats
    }

    /// Returns the storage map handle.
    #[must_use]
    pub fn storage(&self) -> &StorageMap<K, V> {
        &self.storage
    }

    /// Returns the clock.
    #[must_use]
    pub fn clock(&self) -> &Clock {
        &self.clock
    }

    /// Returns the interrupter delivering wake-ups to injected delays.
    #[must_use]
    pub fn interrupter(&self) -> &Interrupter {
        &self.interrupter
    }

    /// Logs and counts one invocation of `op`.
    pub(crate) fn enter(&self, op: OpKind) {
        if self.config.verbose(op) {
            tracing::info!(op = %op, "simulated store operation");
        }
        self.stats.record(op);
    }

    /// Runs the injected delay configured for `op`.
    pub(crate) async fn inject(&self, op: OpKind) -> Result<()> {
        fault::delay(
            &self.clock,
            &self.interrupter,
            self.config.delay(op),
            self.config.interrupt_threshold(op),
            op,
        )
        .await
    }

    /// The full preamble: log, count, delay.
    pub(crate) async fn begin(&self, op: OpKind) -> Result<()> {
        self.enter(op);
        self.inject(op).await
    }

    /// Fails when `key` matches the failure key configured for `op`.
    pub(crate) fn check(&self, op: OpKind, key: &K) -> Result<()>
    where
        K: Display,
    {
        fault::check_failure(self.config.failure_key(op).as_deref(), key, op)
    }

    /// Returns the expiry deadline for an entry touched now, if expiry
    /// mutation is configured.
    pub(crate) fn expiry_deadline(&self) -> Option<SystemTime> {
        self.config.entry_expiry().map(|offset| self.clock.system_time() + offset)
    }
}
