// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

use std::{sync::Arc, time::Duration};

use parking_lot::RwLock;

use faultline_store::OpKind;

/// Default extra delay applied by the
/// [`ContentionDelay`](faultline_store::Scenario::ContentionDelay) scenario.
const DEFAULT_CONTENTION_DELAY: Duration = Duration::from_millis(500);

#[derive(Clone, Debug, Default)]
struct OpSettings {
    verbose: bool,
    delay: Duration,
    failure_key: Option<String>,
    interrupt_threshold: u32,
}

#[derive(Debug)]
struct ConfigState {
    ops: [OpSettings; 6],
    verbose: bool,
    heartbeat: Duration,
    entry_expiry: Option<Duration>,
    contention_delay: Duration,
}

impl Default for ConfigState {
    fn default() -> Self {
        Self {
            ops: Default::default(),
            verbose: false,
            heartbeat: Duration::ZERO,
            entry_expiry: None,
            contention_delay: DEFAULT_CONTENTION_DELAY,
        }
    }
}

fn slot(op: OpKind) -> usize {
    match op {
        OpKind::Load => 0,
        OpKind::LoadAll => 1,
        OpKind::Store => 2,
        OpKind::StoreAll => 3,
        OpKind::Erase => 4,
        OpKind::EraseAll => 5,
    }
}

/// Tunable options of a simulated store.
///
/// The handle is cheap to clone and shared between the adapters and the
/// test driving them; setters may be called at any time through any clone.
/// Configuration is typically seeded once before concurrent use begins and
/// then adjusted between test phases.
///
/// Per operation kind: a verbose flag (ORed with the global flag), a delay to
/// sleep before performing the operation, an optional failure key whose
/// string form deterministically raises a failure, and the number of
/// tolerated delay interruptions (`0` = unlimited tolerance).
///
/// # Examples
///
/// ```
/// use std::time::Duration;
/// use faultline::{OpKind, StoreConfig};
///
/// let config = StoreConfig::new();
/// config.set_delay(OpKind::Store, Duration::from_secs(1));
/// config.set_failure_key(OpKind::Store, Some("Key0".to_string()));
///
/// assert_eq!(config.delay(OpKind::Store), Duration::from_secs(1));
/// assert_eq!(config.delay(OpKind::Load), Duration::ZERO);
/// ```
#[derive(Clone, Debug, Default)]
pub struct StoreConfig {
    state: Arc<RwLock<ConfigState>>,
}

impl StoreConfig {
    /// Creates a configuration with all delays at zero, no failure keys,
    /// unlimited interruption tolerance, and expiry mutation disabled.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns whether `op` should be logged: the operation's own flag ORed
    /// with the global verbose flag.
    #[must_use]
    pub fn verbose(&self, op: OpKind) -> bool {
        let state = self.state.read();
        state.verbose || state.ops[slot(op)].verbose
    }

    /// Sets the verbose flag for one operation kind.
    pub fn set_verbose(&self, op: OpKind, verbose: bool) {
        self.state.write().ops[slot(op)].verbose = verbose;
    }

    /// Sets the global verbose flag, which applies to every operation kind.
    pub fn set_global_verbose(&self, verbose: bool) {
        self.state.write().verbose = verbose;
    }

    /// Returns the delay injected before performing `op`.
    #[must_use]
    pub fn delay(&self, op: OpKind) -> Duration {
        self.state.read().ops[slot(op)].delay
    }

    /// Sets the delay injected before performing `op`.
    pub fn set_delay(&self, op: OpKind, delay: Duration) {
        self.state.write().ops[slot(op)].delay = delay;
    }

    /// Returns the failure key configured for `op`, if any.
    #[must_use]
    pub fn failure_key(&self, op: OpKind) -> Option<String> {
        self.state.read().ops[slot(op)].failure_key.clone()
    }

    /// Sets or clears the failure key for `op`. A key whose string form
    /// equals the failure key deterministically fails the operation.
    pub fn set_failure_key(&self, op: OpKind, key: Option<String>) {
        self.state.write().ops[slot(op)].failure_key = key;
    }

    /// Returns the number of delay interruptions tolerated for `op` before
    /// the delay fails. `0` means unlimited tolerance.
    #[must_use]
    pub fn interrupt_threshold(&self, op: OpKind) -> u32 {
        self.state.read().ops[slot(op)].interrupt_threshold
    }

    /// Sets the interruption tolerance for `op`.
    pub fn set_interrupt_threshold(&self, op: OpKind, threshold: u32) {
        self.state.write().ops[slot(op)].interrupt_threshold = threshold;
    }

    /// Returns the heartbeat duration. Informational; not consulted by the
    /// adapters.
    #[must_use]
    pub fn heartbeat(&self) -> Duration {
        self.state.read().heartbeat
    }

    /// Sets the heartbeat duration.
    pub fn set_heartbeat(&self, heartbeat: Duration) {
        self.state.write().heartbeat = heartbeat;
    }

    /// Returns the offset added to every stored or loaded entry's expiry
    /// deadline. `None` disables expiry mutation.
    #[must_use]
    pub fn entry_expiry(&self) -> Option<Duration> {
        self.state.read().entry_expiry
    }

    /// Sets or clears the entry-expiry offset.
    pub fn set_entry_expiry(&self, expiry: Option<Duration>) {
        self.state.write().entry_expiry = expiry;
    }

    /// Returns the extra delay applied by the
    /// [`ContentionDelay`](faultline_store::Scenario::ContentionDelay)
    /// scenario.
    #[must_use]
    pub fn contention_delay(&self) -> Duration {
        self.state.read().contention_delay
    }

    /// Sets the extra delay applied by the `ContentionDelay` scenario.
    pub fn set_contention_delay(&self, delay: Duration) {
        self.state.write().contention_delay = delay;
    }
}
