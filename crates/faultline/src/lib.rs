// Copyright (c) Microsoft Corporation.

#![cfg_attr(coverage_nightly, feature(coverage_attribute))]
#![cfg_attr(docsrs, feature(doc_cfg))]

//! A fault- and latency-injecting backing-store simulator.
//!
//! `faultline` implements all three store call shapes defined by
//! [`faultline_store`] against a single in-memory tier, letting a test
//! deterministically inject latency, transient interruption, per-key
//! failures, and partial-batch outcomes into a cache's read-through /
//! write-through layer, without a real persistent backend.
//!
//! # Components
//!
//! - [`StoreConfig`]: per-operation delay, failure key, interrupt threshold,
//!   and verbosity, plus entry-expiry and scenario tuning.
//! - [`InvocationStats`]: concurrent per-operation invocation counters.
//! - [`fault`]: the injection primitive, an interruption-tolerant delay and
//!   a deterministic failure-key check.
//! - [`StorageMap`]: the observable in-memory stand-in for a durable tier,
//!   shared with tests for pre-seeding and inspection.
//! - [`SimStore`] / [`SimEntryStore`] / [`SimNonBlockingStore`]: the three
//!   adapters. Adapters built from one [`StoreCore`] share a single tier,
//!   configuration, and statistics.
//!
//! # Example
//!
//! ```
//! use faultline::{SimStore, StoreError};
//! use faultline_store::{CacheStore, ErrorKind, OpKind};
//! use tick::Clock;
//!
//! # futures::executor::block_on(async {
//! let store = SimStore::new(Clock::new_frozen());
//! store.config().set_failure_key(OpKind::Store, Some("13".to_string()));
//!
//! store.store(&"7".to_string(), "ok".to_string()).await?;
//! let error = store.store(&"13".to_string(), "boom".to_string()).await.unwrap_err();
//! assert_eq!(error.kind, ErrorKind::Simulated);
//! assert!(store.load(&"13".to_string()).await?.is_none());
//! # Ok::<(), StoreError>(())
//! # });
//! ```

mod async_store;
mod config;
mod core;
mod entry_store;
pub mod fault;
mod stats;
mod storage;
mod value_store;

#[doc(inline)]
pub use async_store::SimNonBlockingStore;
#[doc(inline)]
pub use config::StoreConfig;
#[doc(inline)]
pub use core::StoreCore;
#[doc(inline)]
pub use entry_store::SimEntryStore;
pub use faultline_store::{
    CacheStore, ConditionalPut, EntryProcessor, EntryStore, ErrorKind, NonBlockingStore, NoopProcessor, OpKind, Result,
    RevertOrRemove, Scenario, StoreEntry, StoreError, StoreObserver,
};
#[doc(inline)]
pub use fault::Interrupter;
#[doc(inline)]
pub use stats::InvocationStats;
#[doc(inline)]
pub use storage::StorageMap;
#[doc(inline)]
pub use value_store::SimStore;
