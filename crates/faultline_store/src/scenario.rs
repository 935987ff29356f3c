// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

/// Selects a simulated misbehavior for one entry.
///
/// A scenario travels alongside the entry (see
/// [`StoreEntry::set_scenario`](crate::StoreEntry::set_scenario)) and is
/// interpreted by the non-blocking adapter. The default is [`Scenario::None`];
/// everything else exists purely to exercise a cache's failure paths.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Scenario {
    /// Normal processing.
    #[default]
    None,
    /// Fail the whole batch immediately: one `on_error` for this entry, then
    /// `on_complete`, with no further entries attempted. Simulates an
    /// upstream validation failure.
    FailBatch,
    /// Skip this entry until the store has made `threshold` batch attempts.
    /// Simulates a store that makes incremental progress across repeated
    /// calls; a skipped entry stays in the caller's collection.
    PartialProgress {
        /// The number of batch attempts after which the entry is accepted.
        threshold: u32,
    },
    /// Insert an artificial extra delay before completion. Simulates
    /// contention for backing-map ownership.
    ContentionDelay,
    /// After the primary completion path has run, schedule a second, delayed
    /// terminal signal for the same entry. Exercises an observer's handling
    /// of signals arriving after the batch already completed.
    LateCompletion,
}
