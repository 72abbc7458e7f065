//! # liveline
//!
//! An entry synchronization core for live feeds: many readers follow a
//! frequently-updated feed by polling while editors concurrently append,
//! revise, and retract entries, and every reader's local view converges on
//! the authoritative one without ever needing a full resync.
//!
//! ## Core Concepts
//!
//! - **Entry log**: append-only change records over mutable display
//!   entries. A direct read by display id is always current; the records
//!   exist to announce changes to pollers.
//! - **Visible set**: the deduplicated current state of a container, one
//!   record per display id, served in stable pages.
//! - **Bucketized polling**: delta windows derived by flooring timestamps
//!   to the refresh interval, so concurrently polling clients share one
//!   cacheable response.
//! - **Reconciliation**: idempotent client-side folds merging page loads
//!   and polling deltas into one consistent, ordered view.
//!
//! ## Example
//!
//! ```ignore
//! use liveline::{EntryInput, Feed, FeedView, PollWindow, Timestamp};
//!
//! let feed = Feed::in_memory();
//! let container = feed.create_container("match-day")?.id;
//!
//! // Editor side: append and revise.
//! let receipt = feed.insert(container, EntryInput::new("Kickoff!"))?;
//! feed.update(container, receipt.record.id, EntryInput::new("Kickoff, 1-0!"))?;
//!
//! // Reader side: page load, then polled deltas folded into the view.
//! let mut view = FeedView::new();
//! view.apply_page(&feed.get_page(container, 1, 20, None)?);
//!
//! let window = PollWindow::bucketed(view.last_record_time(), Timestamp::now(), 10);
//! view.apply_poll(&feed.poll(container, window, 20)?, true);
//! ```

pub mod cache;
pub mod client;
pub mod containers;
pub mod content;
pub mod entries;
pub mod error;
pub mod feed;
pub mod query;
pub mod transform;
pub mod types;

// Re-exports
pub use cache::{DeltaCache, EncodedDelta, SnapshotCache};
pub use client::{fold_entries, fold_key_events, DeltaFetcher, FeedView, Poller, PollerConfig, ViewEntry};
pub use containers::ContainerManager;
pub use content::{ContentStore, MemoryStore, NewRecord, RecordFilter, RecordOrder, StoredRecord};
pub use entries::{resolve_visible, EntryLog};
pub use error::{FeedError, Result};
pub use feed::{Feed, FeedConfig};
pub use query::{paginate, PollWindow};
pub use transform::{EntryTransform, TransformRegistry};
pub use types::*;
