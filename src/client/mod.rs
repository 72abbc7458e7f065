//! Client-side reconciliation.
//!
//! Merges page loads and polling deltas into one locally consistent,
//! re-sorted view. The folds are pure (old state + delta → new state) and
//! idempotent; the [`FeedView`] state machine layers pending-buffer,
//! newest-entry, and pagination-drift bookkeeping on top; the [`Poller`]
//! drives a [`DeltaFetcher`] on a server-governed cadence.

mod poller;
mod reducer;
mod view;

pub use poller::{DeltaFetcher, Poller, PollerConfig};
pub use reducer::{fold_entries, fold_key_events};
pub use view::{FeedView, ViewEntry};
