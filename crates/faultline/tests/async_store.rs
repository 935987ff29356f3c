// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! Integration tests for `SimNonBlockingStore`, the dispatching adapter.

use std::{sync::Arc, time::Duration};

use anyspawn::Spawner;
use faultline::SimNonBlockingStore;
use faultline_store::{ErrorKind, NonBlockingStore, OpKind, Scenario, StoreEntry, testing::RecordingObserver};
use tick::{Clock, ClockControl};

type Observer = Arc<RecordingObserver<String, i32>>;

fn store_and_observer(clock: Clock) -> (SimNonBlockingStore<String, i32>, Observer) {
    (
        SimNonBlockingStore::new(clock, Spawner::new_tokio()),
        Arc::new(RecordingObserver::new()),
    )
}

#[tokio::test(flavor = "multi_thread")]
async fn store_reports_through_the_observer() {
    let (store, observer) = store_and_observer(Clock::new_frozen());

    store.store(StoreEntry::with_value("k".to_string(), 7), observer.clone() as _).await;
    observer.wait_complete().await;

    assert_eq!(store.storage().get(&"k".to_string()), Some(7));
    assert_eq!(observer.next_entries().len(), 1);
    assert_eq!(observer.completion_count(), 1);
    assert!(observer.errors().is_empty());
}

#[tokio::test(flavor = "multi_thread")]
async fn load_fills_the_entry_before_signaling() {
    let (store, observer) = store_and_observer(Clock::new_frozen());
    store.storage().insert("k".to_string(), 42);

    store.load(StoreEntry::new("k".to_string()), observer.clone() as _).await;
    observer.wait_complete().await;

    let entries = observer.next_entries();
    assert_eq!(entries.len(), 1);
    assert!(entries[0].is_present());
    assert_eq!(entries[0].value(), Some(&42));
}

#[tokio::test(flavor = "multi_thread")]
async fn dispatched_failures_reach_the_observer_not_the_caller() {
    let (store, observer) = store_and_observer(Clock::new_frozen());
    store.config().set_failure_key(OpKind::Load, Some("13".to_string()));

    store.load(StoreEntry::new("13".to_string()), observer.clone() as _).await;
    observer.wait_complete().await;

    let errors = observer.errors();
    assert_eq!(errors.len(), 1);
    let (entry, kind, op) = &errors[0];
    assert_eq!(entry.key(), "13");
    assert_eq!(*kind, ErrorKind::Downstream);
    assert_eq!(*op, OpKind::Load);
    assert!(observer.next_entries().is_empty());
}

#[tokio::test(flavor = "multi_thread")]
async fn load_all_signals_every_entry_before_completing() {
    let (store, observer) = store_and_observer(Clock::new_frozen());
    store.storage().extend([("a".to_string(), 1), ("b".to_string(), 2), ("c".to_string(), 3)]);

    let entries = vec![
        StoreEntry::new("a".to_string()),
        StoreEntry::new("b".to_string()),
        StoreEntry::new("c".to_string()),
    ];
    store.load_all(entries, observer.clone() as _).await;
    observer.wait_complete().await;

    // Wait-for-all discipline: by completion time every signal has landed.
    assert_eq!(observer.signal_count(), 3);
    assert_eq!(observer.completion_count(), 1);
    assert!(observer.late_signals().is_empty());
}

#[tokio::test(flavor = "multi_thread")]
async fn empty_load_all_completes_with_no_signals() {
    let (store, observer) = store_and_observer(Clock::new_frozen());

    store.load_all(Vec::new(), observer.clone() as _).await;
    observer.wait_complete().await;

    assert_eq!(observer.signal_count(), 0);
    assert_eq!(observer.completion_count(), 1);
}

#[tokio::test(flavor = "multi_thread")]
async fn load_all_fail_batch_short_circuits() {
    let (store, observer) = store_and_observer(Clock::new_frozen());
    store.storage().insert("a".to_string(), 1);

    let mut failing = StoreEntry::new("a".to_string());
    failing.set_scenario(Scenario::FailBatch);
    store
        .load_all(vec![failing, StoreEntry::new("b".to_string())], observer.clone() as _)
        .await;
    observer.wait_complete().await;

    let errors = observer.errors();
    assert_eq!(errors.len(), 1);
    assert_eq!(errors[0].1, ErrorKind::Simulated);
    assert_eq!(errors[0].2, OpKind::LoadAll);
    assert!(observer.next_entries().is_empty());
    assert_eq!(observer.completion_count(), 1);
}

#[tokio::test(flavor = "multi_thread")]
async fn store_all_empties_the_batch_and_persists_everything() {
    let (store, observer) = store_and_observer(Clock::new_frozen());

    let mut entries = vec![
        StoreEntry::with_value("1".to_string(), 10),
        StoreEntry::with_value("2".to_string(), 20),
        StoreEntry::with_value("3".to_string(), 30),
    ];
    store.store_all(&mut entries, observer.clone() as _).await;

    // Dispatch decisions are made by the time the call returns.
    assert!(entries.is_empty());
    assert_eq!(observer.completion_count(), 1);

    // Fire-and-forget discipline: the dispatched work reports on its own
    // schedule, possibly after completion.
    observer.wait_for_signals(3).await;
    assert_eq!(store.storage().get(&"1".to_string()), Some(10));
    assert_eq!(store.storage().get(&"2".to_string()), Some(20));
    assert_eq!(store.storage().get(&"3".to_string()), Some(30));
}

#[tokio::test(flavor = "multi_thread")]
async fn store_all_partial_progress_skips_until_threshold() {
    let (store, observer) = store_and_observer(Clock::new_frozen());

    let mut slow = StoreEntry::with_value("slow".to_string(), 1);
    slow.set_scenario(Scenario::PartialProgress { threshold: 2 });
    let mut entries = vec![slow, StoreEntry::with_value("fast".to_string(), 2)];

    // First attempt: the partial-progress entry stays behind.
    store.store_all(&mut entries, observer.clone() as _).await;
    observer.wait_for_signals(1).await;
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0].key(), "slow");
    assert_eq!(store.storage().get(&"fast".to_string()), Some(2));
    assert!(!store.storage().contains_key(&"slow".to_string()));

    // Second attempt reaches the threshold and accepts it.
    let retry_observer: Observer = Arc::new(RecordingObserver::new());
    store.store_all(&mut entries, retry_observer.clone() as _).await;
    retry_observer.wait_for_signals(1).await;
    assert!(entries.is_empty());
    assert_eq!(store.storage().get(&"slow".to_string()), Some(1));
}

#[tokio::test(flavor = "multi_thread")]
async fn store_all_fail_batch_keeps_the_failing_entry() {
    let (store, observer) = store_and_observer(Clock::new_frozen());

    let mut failing = StoreEntry::with_value("bad".to_string(), 2);
    failing.set_scenario(Scenario::FailBatch);
    let mut entries = vec![
        StoreEntry::with_value("ok".to_string(), 1),
        failing,
        StoreEntry::with_value("after".to_string(), 3),
    ];
    store.store_all(&mut entries, observer.clone() as _).await;
    observer.wait_complete().await;

    // Entries dispatched before the failing one were removed; the failing
    // entry and everything after it remain.
    assert_eq!(entries.len(), 2);
    assert_eq!(entries[0].key(), "bad");
    assert_eq!(entries[1].key(), "after");

    let errors = observer.errors();
    assert_eq!(errors.len(), 1);
    assert_eq!(errors[0].1, ErrorKind::Simulated);
    assert_eq!(errors[0].2, OpKind::StoreAll);
}

#[tokio::test(flavor = "multi_thread")]
async fn contention_delay_scenario_extends_the_store() {
    let control = ClockControl::new().auto_advance_timers(true);
    let clock = control.to_clock();
    let stopwatch = clock.stopwatch();
    let (store, observer) = store_and_observer(clock);
    store.config().set_contention_delay(Duration::from_secs(2));

    let mut entry = StoreEntry::with_value("k".to_string(), 1);
    entry.set_scenario(Scenario::ContentionDelay);
    store.store(entry, observer.clone() as _).await;
    observer.wait_complete().await;

    assert!(stopwatch.elapsed() >= Duration::from_secs(2));
    assert_eq!(store.storage().get(&"k".to_string()), Some(1));
}

#[tokio::test(flavor = "multi_thread")]
async fn late_completion_delivers_a_second_terminal_signal() {
    let (store, observer) = store_and_observer(Clock::new_frozen());
    store.config().set_contention_delay(Duration::ZERO);
    store.storage().insert("k".to_string(), 5);

    let mut entry = StoreEntry::new("k".to_string());
    entry.set_scenario(Scenario::LateCompletion);
    store.load(entry, observer.clone() as _).await;

    // One signal lands before completion, the duplicate after it.
    observer.wait_for_signals(2).await;
    assert_eq!(observer.signal_count(), 1);
    assert_eq!(observer.late_signals().len(), 1);
    assert_eq!(observer.completion_count(), 1);
}

#[tokio::test(flavor = "multi_thread")]
async fn erase_runs_in_line_and_returns_its_result() {
    let (store, _observer) = store_and_observer(Clock::new_frozen());
    store.storage().insert("k".to_string(), 1);

    let mut entry = StoreEntry::with_value("k".to_string(), 1);
    store.erase(&mut entry).await.expect("erase failed");

    assert!(!store.storage().contains_key(&"k".to_string()));
    assert!(!entry.is_present());
}

#[tokio::test(flavor = "multi_thread")]
async fn erase_all_reports_partial_success_in_line() {
    let (store, _observer) = store_and_observer(Clock::new_frozen());
    store.storage().extend([("1".to_string(), 1), ("2".to_string(), 2)]);
    store.config().set_failure_key(OpKind::EraseAll, Some("2".to_string()));

    let mut entries = vec![
        StoreEntry::with_value("1".to_string(), 1),
        StoreEntry::with_value("2".to_string(), 2),
    ];
    let error = store.erase_all(&mut entries).await.unwrap_err();
    assert_eq!(error.kind, ErrorKind::Simulated);

    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0].key(), "2");
    assert!(!store.storage().contains_key(&"1".to_string()));
    assert!(store.storage().contains_key(&"2".to_string()));
}

#[tokio::test(flavor = "multi_thread")]
async fn a_single_worker_still_drains_a_batch() {
    let store = SimNonBlockingStore::new(Clock::new_frozen(), Spawner::new_tokio()).worker_limit(1);
    let observer: Observer = Arc::new(RecordingObserver::new());
    store.storage().extend([("a".to_string(), 1), ("b".to_string(), 2), ("c".to_string(), 3)]);

    let entries = vec![
        StoreEntry::new("a".to_string()),
        StoreEntry::new("b".to_string()),
        StoreEntry::new("c".to_string()),
    ];
    store.load_all(entries, observer.clone() as _).await;
    observer.wait_complete().await;

    assert_eq!(observer.next_entries().len(), 3);
    assert_eq!(observer.completion_count(), 1);
}
