//! Content store collaborator interface.
//!
//! The core does not own persistence. It talks to an external record store
//! through [`ContentStore`], and keeps its own semantics (supersession,
//! contributor lists, key-event flags) in per-record key/value metadata so
//! no particular storage schema is assumed.

mod memory;

pub use memory::MemoryStore;

use crate::error::Result;
use crate::types::{ContainerId, EntryId, Timestamp};
use std::collections::HashMap;

/// Metadata key holding the display id a change record supersedes.
pub const META_REPLACES: &str = "replaces";

/// Metadata key holding the JSON-encoded contributor list.
pub const META_AUTHORS: &str = "authors";

/// Metadata key holding the key-event flag ("1" when set).
pub const META_KEY_EVENT: &str = "key_event";

/// Input for creating a record (before an id is assigned).
#[derive(Clone, Debug)]
pub struct NewRecord {
    pub container: ContainerId,
    pub content: String,
    pub created_at: Timestamp,
    pub meta: HashMap<String, String>,
}

/// A record as returned by the store.
#[derive(Clone, Debug)]
pub struct StoredRecord {
    pub id: EntryId,
    pub container: ContainerId,
    pub content: String,
    pub created_at: Timestamp,
    pub meta: HashMap<String, String>,
}

impl StoredRecord {
    /// Look up a metadata value.
    pub fn meta(&self, key: &str) -> Option<&str> {
        self.meta.get(key).map(String::as_str)
    }
}

/// Filter criteria for record queries.
#[derive(Clone, Debug, Default)]
pub struct RecordFilter {
    /// Inclusive range on record creation time.
    pub created_between: Option<(Timestamp, Timestamp)>,

    /// Only records whose `replaces` metadata points at this display id.
    pub replaces: Option<EntryId>,

    /// Include soft-deleted (trashed) records.
    pub include_trashed: bool,
}

impl RecordFilter {
    /// All live records.
    pub fn all() -> Self {
        Self::default()
    }

    /// Records created in the inclusive `[start, end]` range.
    pub fn between(start: Timestamp, end: Timestamp) -> Self {
        Self {
            created_between: Some((start, end)),
            ..Default::default()
        }
    }

    /// Change records superseding the given display id, trashed included.
    pub fn replacing(display: EntryId) -> Self {
        Self {
            replaces: Some(display),
            include_trashed: true,
            ..Default::default()
        }
    }
}

/// Query ordering on record creation time. Ties break on record id.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RecordOrder {
    CreatedAsc,
    CreatedDesc,
}

/// The external record store the core is composed over.
pub trait ContentStore: Send + Sync {
    /// Create a record, assigning it a monotonically increasing id.
    fn create_record(&self, record: NewRecord) -> Result<StoredRecord>;

    /// Mutate a record's content and contributor metadata in place.
    /// `authors` is the encoded contributor list stored under
    /// [`META_AUTHORS`]. The record's creation time is untouched.
    fn mutate_record(&self, id: EntryId, content: &str, authors: &str) -> Result<()>;

    /// Delete a record. `hard` bypasses any trash semantics and removes the
    /// record permanently.
    fn delete_record(&self, id: EntryId, hard: bool) -> Result<()>;

    /// Query a container's records.
    fn query_records(
        &self,
        container: ContainerId,
        filter: &RecordFilter,
        order: RecordOrder,
    ) -> Result<Vec<StoredRecord>>;

    /// Get a single record by id, trashed records included.
    fn get_record(&self, id: EntryId) -> Result<Option<StoredRecord>>;

    /// Read one metadata value.
    fn get_meta(&self, id: EntryId, key: &str) -> Result<Option<String>>;

    /// Write one metadata value.
    fn set_meta(&self, id: EntryId, key: &str, value: &str) -> Result<()>;
}
