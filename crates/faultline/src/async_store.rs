// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

use std::{
    fmt,
    fmt::Display,
    hash::Hash,
    sync::{
        Arc,
        atomic::{AtomicU32, Ordering},
    },
};

use anyspawn::Spawner;
use futures::future::join_all;
use parking_lot::Mutex;
use tokio::sync::{OwnedSemaphorePermit, Semaphore};

use faultline_store::{
    EntryProcessor, NonBlockingStore, NoopProcessor, OpKind, Result, Scenario, StoreEntry, StoreError, StoreObserver,
};

use crate::{InvocationStats, StorageMap, StoreConfig, StoreCore, fault, fault::Interrupter};

/// Default bound on concurrently executing dispatched units of work.
const DEFAULT_WORKER_LIMIT: usize = 200;

type SharedProcessor<K, V> = Arc<dyn EntryProcessor<K, V>>;
type SharedObserver<K, V> = Arc<dyn StoreObserver<K, V>>;

/// The asynchronous adapter.
///
/// Implements [`NonBlockingStore`]: read and write operations are dispatched
/// onto a bounded worker pool and report outcomes through a
/// [`StoreObserver`]; failures after dispatch never reach the caller. Erase
/// operations run in-line with entry-handle semantics.
///
/// Two completion disciplines coexist and callers must tolerate both:
/// `load_all` waits for every dispatched task before its single
/// `on_complete`, while `store_all` signals completion as soon as its
/// per-entry dispatch decisions are made.
///
/// Per-entry [`Scenario`] descriptors select simulated misbehavior: immediate
/// batch failure, partial incremental progress keyed by a batch-attempt
/// counter, artificial contention delay, and a late duplicate terminal
/// signal.
///
/// # Examples
///
/// ```
/// use std::sync::Arc;
/// use anyspawn::Spawner;
/// use faultline::SimNonBlockingStore;
/// use faultline_store::{NonBlockingStore, StoreEntry, testing::RecordingObserver};
/// use tick::Clock;
///
/// # #[tokio::main(flavor = "current_thread")]
/// # async fn main() {
/// let store = SimNonBlockingStore::new(Clock::new_frozen(), Spawner::new_tokio());
/// let observer = Arc::new(RecordingObserver::new());
///
/// store.store(StoreEntry::with_value("k".to_string(), 7), Arc::clone(&observer) as _).await;
/// observer.wait_complete().await;
///
/// assert_eq!(store.storage().get(&"k".to_string()), Some(7));
/// # }
/// ```
pub struct SimNonBlockingStore<K, V> {
    core: Arc<StoreCore<K, V>>,
    processor: Mutex<SharedProcessor<K, V>>,
    spawner: Spawner,
    permits: Arc<Semaphore>,
    attempts: AtomicU32,
}

impl<K, V> fmt::Debug for SimNonBlockingStore<K, V>
where
    K: fmt::Debug,
    V: fmt::Debug,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SimNonBlockingStore")
            .field("core", &self.core)
            .field("attempts", &self.attempts)
            .finish_non_exhaustive()
    }
}

impl<K, V> SimNonBlockingStore<K, V>
where
    K: Send + Sync,
    V: Send + Sync,
{
    /// Creates an adapter with its own core, the no-op processor, and the
    /// default worker limit.
    #[must_use]
    pub fn new(clock: tick::Clock, spawner: Spawner) -> Self {
        Self::with_core(Arc::new(StoreCore::new(clock)), spawner)
    }

    /// Creates an adapter over an existing core, sharing its tier,
    /// configuration, and statistics with sibling adapters.
    #[must_use]
    pub fn with_core(core: Arc<StoreCore<K, V>>, spawner: Spawner) -> Self {
        Self {
            core,
            processor: Mutex::new(Arc::new(NoopProcessor)),
            spawner,
            permits: Arc::new(Semaphore::new(DEFAULT_WORKER_LIMIT)),
            attempts: AtomicU32::new(0),
        }
    }

    /// Sets the bound on concurrently executing dispatched work. Dispatch
    /// waits for a free worker once the bound is reached.
    #[must_use]
    pub fn worker_limit(mut self, limit: usize) -> Self {
        self.permits = Arc::new(Semaphore::new(limit));
        self
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

    async fn acquire(&self) -> Option<OwnedSemaphorePermit> {
        Arc::clone(&self.permits).acquire_owned().await.ok()
    }
}

/// The dispatched portion of a load: delay, failure check, then fill the
/// entry from the tier.
async fn run_load<K, V>(core: &StoreCore<K, V>, op: OpKind, entry: &mut StoreEntry<K, V>) -> Result<()>
where
    K: Clone + Display + Eq + Hash,
    V: Clone,
{
    core.inject(op).await?;
    core.check(op, entry.key())?;
    if let Some(value) = core.storage.get(entry.key()) {
        entry.set_value(value);
        if let Some(deadline) = core.expiry_deadline() {
            entry.set_expiry(deadline);
        }
    }
    Ok(())
}

/// The dispatched portion of a store: delay (plus the contention delay when
/// the scenario asks for it), failure check, upsert, expiry, processor.
async fn run_store<K, V>(
    core: &StoreCore<K, V>,
    processor: &SharedProcessor<K, V>,
    op: OpKind,
    entry: &mut StoreEntry<K, V>,
) -> Result<()>
where
    K: Clone + Display + Eq + Hash,
    V: Clone,
{
    core.inject(op).await?;
    if entry.scenario() == Scenario::ContentionDelay {
        fault::delay(
            &core.clock,
            &core.interrupter,
            core.config.contention_delay(),
            core.config.interrupt_threshold(op),
            op,
        )
        .await?;
    }
    core.check(op, entry.key())?;
    if let Some(value) = entry.value() {
        core.storage.insert(entry.key().clone(), value.clone());
    }
    if let Some(deadline) = core.expiry_deadline() {
        entry.set_expiry(deadline);
    }
    processor.process(entry);
    Ok(())
}

impl<K, V> NonBlockingStore<K, V> for SimNonBlockingStore<K, V>
where
    K: Clone + Display + Eq + Hash + Send + Sync + 'static,
    V: Clone + Send + Sync + 'static,
{
    async fn load(&self, mut entry: StoreEntry<K, V>, observer: SharedObserver<K, V>) {
        self.core.enter(OpKind::Load);
        let Some(permit) = self.acquire().await else { return };
        let core = Arc::clone(&self.core);
        let spawner = self.spawner.clone();
        let _detached = self.spawner.spawn(async move {
            let _worker = permit;
            match run_load(&core, OpKind::Load, &mut entry).await {
                Ok(()) if entry.scenario() == Scenario::LateCompletion => {
                    observer.on_next(entry.clone());
                    observer.on_complete();
                    // A second, delayed terminal signal for the same entry.
                    // Rejecting it is the observer's job, not this adapter's.
                    let extra = core.config.contention_delay();
                    let _late = spawner.spawn(async move {
                        core.clock.delay(extra).await;
                        observer.on_next(entry);
                    });
                }
                Ok(()) => {
                    observer.on_next(entry);
                    observer.on_complete();
                }
                Err(error) => {
                    observer.on_error(entry, StoreError::downstream(OpKind::Load, error));
                    observer.on_complete();
                }
            }
        });
    }

    async fn load_all(&self, entries: Vec<StoreEntry<K, V>>, observer: SharedObserver<K, V>) {
        self.core.enter(OpKind::LoadAll);
        let mut workers = Vec::with_capacity(entries.len());
        for mut entry in entries {
            if entry.scenario() == Scenario::FailBatch {
                // Short-circuit: one error, one completion, nothing further
                // dispatched.
                observer.on_error(entry, StoreError::simulated(OpKind::LoadAll));
                observer.on_complete();
                return;
            }
            let Some(permit) = self.acquire().await else { return };
            let core = Arc::clone(&self.core);
            let task_observer = Arc::clone(&observer);
            workers.push(self.spawner.spawn(async move {
                let _worker = permit;
                match run_load(&core, OpKind::LoadAll, &mut entry).await {
                    Ok(()) => task_observer.on_next(entry),
                    Err(error) => task_observer.on_error(entry, StoreError::downstream(OpKind::LoadAll, error)),
                }
            }));
        }
        // Wait-for-all discipline: the batch completion signal trails every
        // per-entry terminal signal.
        join_all(workers).await;
        observer.on_complete();
    }

    async fn store(&self, mut entry: StoreEntry<K, V>, observer: SharedObserver<K, V>) {
        self.core.enter(OpKind::Store);
        let Some(permit) = self.acquire().await else { return };
        let core = Arc::clone(&self.core);
        let processor = Arc::clone(&self.processor.lock());
        let _detached = self.spawner.spawn(async move {
            let _worker = permit;
            match run_store(&core, &processor, OpKind::Store, &mut entry).await {
                Ok(()) => observer.on_next(entry),
                Err(error) => observer.on_error(entry, StoreError::downstream(OpKind::Store, error)),
            }
            observer.on_complete();
        });
    }

    async fn store_all(&self, entries: &mut Vec<StoreEntry<K, V>>, observer: SharedObserver<K, V>) {
        self.core.enter(OpKind::StoreAll);
        let attempt = self.attempts.fetch_add(1, Ordering::SeqCst) + 1;
        let mut index = 0;
        while index < entries.len() {
            match entries[index].scenario() {
                // Incremental progress: below the threshold the entry is
                // skipped and stays in the caller's collection for the next
                // attempt.
                Scenario::PartialProgress { threshold } if attempt < threshold => index += 1,
                Scenario::FailBatch => {
                    let entry = entries[index].clone();
                    observer.on_error(entry, StoreError::simulated(OpKind::StoreAll));
                    observer.on_complete();
                    return;
                }
                _ => {
                    let mut entry = entries.remove(index);
                    let Some(permit) = self.acquire().await else { return };
                    let core = Arc::clone(&self.core);
                    let processor = Arc::clone(&self.processor.lock());
                    let task_observer = Arc::clone(&observer);
                    let _detached = self.spawner.spawn(async move {
                        let _worker = permit;
                        match run_store(&core, &processor, OpKind::StoreAll, &mut entry).await {
                            Ok(()) => task_observer.on_next(entry),
                            Err(error) => task_observer.on_error(entry, StoreError::downstream(OpKind::StoreAll, error)),
                        }
                    });
                }
            }
        }
        // Fire-and-forget discipline: completion means dispatch decisions
        // are made, not that dispatched work has finished.
        observer.on_complete();
    }

    async fn erase(&self, entry: &mut StoreEntry<K, V>) -> Result<()> {
        self.core.begin(OpKind::Erase).await?;
        self.core.check(OpKind::Erase, entry.key())?;
        self.core.storage.remove(entry.key());
        entry.mark_removed();
        Ok(())
    }

    async fn erase_all(&self, entries: &mut Vec<StoreEntry<K, V>>) -> Result<()> {
        self.core.begin(OpKind::EraseAll).await?;
        while let Some(entry) = entries.first_mut() {
            self.core.check(OpKind::EraseAll, entry.key())?;
            self.core.storage.remove(entry.key());
            entry.mark_removed();
            let _ = entries.remove(0);
        }
        Ok(())
    }
}
