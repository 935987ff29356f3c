// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! Error types for store operations.

use std::fmt;

/// The six store operation kinds.
///
/// Used to select per-operation configuration, to key invocation statistics,
/// and to report which operation an error occurred in. The `Display` form is
/// the operation name used by statistics.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum OpKind {
    /// A single-key read.
    Load,
    /// A batch read.
    LoadAll,
    /// A single-entry upsert.
    Store,
    /// A batch upsert.
    StoreAll,
    /// A single-key deletion.
    Erase,
    /// A batch deletion.
    EraseAll,
}

impl OpKind {
    /// All operation kinds, in the order they are usually configured.
    pub const ALL: [Self; 6] = [
        Self::Load,
        Self::LoadAll,
        Self::Store,
        Self::StoreAll,
        Self::Erase,
        Self::EraseAll,
    ];

    /// Returns the operation name.
    #[must_use]
    pub fn name(self) -> &'static str {
        match self {
            Self::Load => "load",
            Self::LoadAll => "loadAll",
            Self::Store => "store",
            Self::StoreAll => "storeAll",
            Self::Erase => "erase",
            Self::EraseAll => "eraseAll",
        }
    }
}

impl fmt::Display for OpKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Classifies a [`StoreError`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ErrorKind {
    /// The operation's key matched the configured failure key.
    Simulated,
    /// A delay was interrupted more times than the configured threshold
    /// permits.
    Interrupted,
    /// A dispatched unit of work failed; the underlying cause is attached as
    /// the error source. Only delivered through
    /// [`StoreObserver::on_error`](crate::StoreObserver::on_error), never
    /// thrown back across the dispatch boundary.
    Downstream,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Simulated => "simulated failure",
            Self::Interrupted => "interrupted",
            Self::Downstream => "downstream failure",
        })
    }
}

/// An error from a store operation.
///
/// Carries the [`ErrorKind`] and the [`OpKind`] it occurred in for
/// diagnostics. Use [`std::error::Error::source()`] to access the underlying
/// cause of a [`ErrorKind::Downstream`] error.
///
/// # Example
///
/// ```
/// use faultline_store::{ErrorKind, OpKind, StoreError};
///
/// let error = StoreError::simulated(OpKind::Store);
/// assert_eq!(error.kind, ErrorKind::Simulated);
/// assert_eq!(error.op, OpKind::Store);
/// ```
#[ohno::error]
#[display("{kind} during {op}")]
pub struct StoreError {
    /// What went wrong.
    pub kind: ErrorKind,
    /// The operation the error occurred in.
    pub op: OpKind,
}

impl StoreError {
    /// Creates the deterministic failure raised when an operation's key
    /// matches the configured failure key.
    #[must_use]
    pub fn simulated(op: OpKind) -> Self {
        Self::new(ErrorKind::Simulated, op)
    }

    /// Creates the failure raised when a delay is interrupted past the
    /// configured tolerance.
    #[must_use]
    pub fn interrupted(op: OpKind) -> Self {
        Self::new(ErrorKind::Interrupted, op)
    }

    /// Wraps a failure raised while performing a dispatched unit of work.
    pub fn downstream(op: OpKind, cause: impl Into<Box<dyn std::error::Error + Send + Sync>>) -> Self {
        Self::caused_by(ErrorKind::Downstream, op, cause)
    }
}

/// A specialized [`Result`] type for store operations.
pub type Result<T> = std::result::Result<T, StoreError>;
