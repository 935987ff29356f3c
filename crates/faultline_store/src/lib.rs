// Copyright (c) Microsoft Corporation.

#![cfg_attr(coverage_nightly, feature(coverage_attribute))]
#![cfg_attr(docsrs, feature(doc_cfg))]

//! Backing-store contracts for cache read-through / write-through layers.
//!
//! A cache delegates persistence of entries to a pluggable store. This crate
//! defines the three call shapes a store can be consumed through, along with
//! the data types that flow across that boundary:
//!
//! - [`CacheStore`]: whole-value operations that complete in-line.
//! - [`EntryStore`]: the same operations over a mutable [`StoreEntry`] handle
//!   that also carries an expiry deadline and an original-value snapshot.
//! - [`NonBlockingStore`]: operations dispatched in the background, reporting
//!   outcomes through a [`StoreObserver`].
//!
//! The `faultline` crate provides a simulator that implements all three
//! shapes against a single in-memory tier, with deterministic latency and
//! failure injection for exercising a cache's integration layer.
//!
//! # Batch semantics
//!
//! Batch operations follow a partial-success contract: items are removed from
//! the caller-supplied collection as they are processed, so after a failed
//! call the collection holds exactly the work that still needs to be retried.
//!
//! # Completion signals
//!
//! For the non-blocking shape, every accepted unit of work produces exactly
//! one terminal signal ([`StoreObserver::on_next`] or
//! [`StoreObserver::on_error`]), and every batch call produces exactly one
//! [`StoreObserver::on_complete`]. Two completion disciplines exist and are
//! deliberately distinct: `load_all` completes only after all dispatched work
//! has reported, while `store_all` completes once dispatch decisions are made.

mod entry;
pub mod error;
mod observer;
mod processor;
mod scenario;
pub(crate) mod store;
#[cfg(any(feature = "test-util", test))]
pub mod testing;

#[doc(inline)]
pub use entry::StoreEntry;
#[doc(inline)]
pub use error::{ErrorKind, OpKind, Result, StoreError};
#[doc(inline)]
pub use observer::StoreObserver;
#[doc(inline)]
pub use processor::{ConditionalPut, EntryProcessor, NoopProcessor, RevertOrRemove};
#[doc(inline)]
pub use scenario::Scenario;
#[doc(inline)]
pub use store::{CacheStore, EntryStore, NonBlockingStore};
