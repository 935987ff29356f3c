// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! The fault/latency injection primitive.
//!
//! Two building blocks shared by all adapters: [`delay`], a sleep with
//! bounded interruption tolerance, and [`check_failure`], a deterministic
//! per-key failure. Interruptions are delivered through an [`Interrupter`]
//! handle held by the test, standing in for guard or heartbeat threads that
//! wake a blocked worker.

use std::{fmt::Display, sync::Arc, time::Duration};

use parking_lot::Mutex;
use tick::Clock;
use tokio::sync::Notify;

use faultline_store::{OpKind, Result, StoreError};

#[derive(Debug, Default)]
struct InterrupterState {
    pending: Mutex<u32>,
    notify: Notify,
}

/// Delivers spurious wake-ups to a [`delay`] in progress.
///
/// Each [`interrupt`](Self::interrupt) call queues one wake-up. A delay
/// consumes queued wake-ups as it runs; wake-ups queued while no delay is
/// active are consumed by the next delay. The handle is cheap to clone and
/// all clones share the same queue.
#[derive(Clone, Debug, Default)]
pub struct Interrupter {
    state: Arc<InterrupterState>,
}

impl Interrupter {
    /// Creates an interrupter with no queued wake-ups.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Queues one spurious wake-up, waking a delay in progress.
    pub fn interrupt(&self) {
        *self.state.pending.lock() += 1;
        self.state.notify.notify_waiters();
    }

    /// Consumes one queued wake-up, if any.
    fn take(&self) -> bool {
        let mut pending = self.state.pending.lock();
        if *pending > 0 {
            *pending -= 1;
            true
        } else {
            false
        }
    }
}

/// Sleeps for `duration`, tolerating up to `threshold` interruptions.
///
/// On each wake-up delivered through `interrupter` the remaining time is
/// recomputed and the sleep resumes, so the full duration elapses in
/// aggregate. Once the number of wake-ups exceeds `threshold` the delay
/// gives up and fails with [`ErrorKind::Interrupted`]. A `threshold` of `0`
/// tolerates any number of wake-ups.
///
/// A zero `duration` with no queued wake-ups returns immediately.
///
/// # Errors
///
/// Returns [`ErrorKind::Interrupted`] when interrupted more than `threshold`
/// times.
///
/// [`ErrorKind::Interrupted`]: faultline_store::ErrorKind::Interrupted
pub async fn delay(clock: &Clock, interrupter: &Interrupter, duration: Duration, threshold: u32, op: OpKind) -> Result<()> {
    let stopwatch = clock.stopwatch();
    let mut wakeups: u32 = 0;
    loop {
        if interrupter.take() {
            wakeups += 1;
            if threshold > 0 && wakeups > threshold {
                return Err(StoreError::interrupted(op));
            }
            continue;
        }

        let elapsed = stopwatch.elapsed();
        if elapsed >= duration {
            return Ok(());
        }

        tokio::select! {
            () = clock.delay(duration - elapsed) => return Ok(()),
            () = interrupter.state.notify.notified() => {}
        }
    }
}

/// Fails with [`ErrorKind::Simulated`] when `key`'s string form equals the
/// configured failure key.
///
/// An unset failure key never matches.
///
/// # Errors
///
/// Returns [`ErrorKind::Simulated`] carrying `op` on a match.
///
/// [`ErrorKind::Simulated`]: faultline_store::ErrorKind::Simulated
pub fn check_failure<K: Display>(failure_key: Option<&str>, key: &K, op: OpKind) -> Result<()> {
    match failure_key {
        Some(failure_key) if key.to_string() == failure_key => Err(StoreError::simulated(op)),
        _ => Ok(()),
    }
}
