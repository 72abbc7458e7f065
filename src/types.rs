//! Core types for the synchronization protocol.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::{SystemTime, UNIX_EPOCH};

/// Unique identifier for a log record.
///
/// Change records get their own id; the id a reader addresses an entry by
/// is the *display id* (see [`Entry::display_id`]).
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct EntryId(pub u64);

impl fmt::Debug for EntryId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "EntryId({})", self.0)
    }
}

impl fmt::Display for EntryId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Unique identifier for a container (one feed).
#[derive(Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ContainerId(pub u64);

impl fmt::Debug for ContainerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ContainerId({})", self.0)
    }
}

impl fmt::Display for ContainerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Seconds since Unix epoch.
///
/// Second resolution is what the polling bucketizer works in; ordering ties
/// are broken by insertion order, never by sub-second precision.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default, Serialize, Deserialize)]
pub struct Timestamp(pub i64);

impl Timestamp {
    /// Current time.
    pub fn now() -> Self {
        let duration = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .expect("Time went backwards");
        Timestamp(duration.as_secs() as i64)
    }
}

impl fmt::Debug for Timestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Timestamp({})", self.0)
    }
}

/// Author reference. The first author in an entry's list is the primary one.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Author {
    pub id: u64,
    pub name: String,
}

impl Author {
    pub fn new(id: u64, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
        }
    }
}

/// Derived record type. Not stored; computed from `replaces` and content.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntryKind {
    New,
    Update,
    Delete,
}

/// A single log record.
///
/// A record with no `replaces` is a fresh display entry. A record with
/// `replaces` set is a change record announcing an update (non-empty
/// content) or a delete (empty content) of the entry at that display id.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Entry {
    /// Unique identifier (assigned by the content store, monotonic).
    pub id: EntryId,

    /// Which container this entry belongs to.
    pub container: ContainerId,

    /// Text/markup payload. Empty for a delete record.
    pub content: String,

    /// Ordered author list (first = primary).
    pub authors: Vec<Author>,

    /// When this log record was created (not when the display content was).
    pub created_at: Timestamp,

    /// The display entry this record supersedes, if any.
    pub replaces: Option<EntryId>,

    /// Opaque key-event flag, supplied externally.
    pub key_event: bool,
}

impl Entry {
    /// Derived record type.
    pub fn kind(&self) -> EntryKind {
        match (&self.replaces, self.content.is_empty()) {
            (None, _) => EntryKind::New,
            (Some(_), false) => EntryKind::Update,
            (Some(_), true) => EntryKind::Delete,
        }
    }

    /// The stable identifier readers address this entry by.
    pub fn display_id(&self) -> EntryId {
        self.replaces.unwrap_or(self.id)
    }
}

/// Input for an authoring action (before an id is assigned).
#[derive(Clone, Debug, Default)]
pub struct EntryInput {
    pub content: String,
    pub authors: Vec<Author>,
    pub key_event: bool,
    /// Timestamp override. `None` means the write time.
    pub at: Option<Timestamp>,
}

impl EntryInput {
    pub fn new(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            ..Default::default()
        }
    }

    pub fn with_authors(mut self, authors: Vec<Author>) -> Self {
        self.authors = authors;
        self
    }

    pub fn with_key_event(mut self, flag: bool) -> Self {
        self.key_event = flag;
        self
    }

    pub fn with_timestamp(mut self, at: Timestamp) -> Self {
        self.at = Some(at);
        self
    }
}

/// Container lifecycle state.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ContainerStatus {
    /// Not accepting writes.
    Disabled,
    /// Accepting writes.
    Enabled,
    /// Read-only, but still resolvable and pollable.
    Archived,
}

impl ContainerStatus {
    pub fn accepts_writes(&self) -> bool {
        matches!(self, ContainerStatus::Enabled)
    }
}

/// Container metadata.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Container {
    pub id: ContainerId,
    pub name: String,
    pub status: ContainerStatus,
    pub created_at: Timestamp,
    /// Latest modification timestamp, bumped on every successful write.
    /// Callers use it to detect staleness of cached responses.
    pub updated_at: Timestamp,
}

/// Wire shape of one entry in a page or polling delta.
///
/// Addressed by display id throughout: a `new`, `update` and `delete`
/// referencing the same visible item all carry the same `id`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct EntryEvent {
    /// Display id.
    pub id: EntryId,

    /// The underlying log record.
    pub record_id: EntryId,

    pub kind: EntryKind,

    pub content: String,

    pub authors: Vec<Author>,

    /// The display entry's timestamp; governs ordering in the client view.
    pub entry_time: Timestamp,

    /// The log record's own timestamp; governs polling windows and the
    /// client's last-known position.
    pub record_time: Timestamp,

    pub key_event: bool,
}

/// A known point in the feed used to anchor page 1 against drift.
#[derive(Clone, Copy, Debug, Serialize, Deserialize)]
pub struct Watermark {
    pub id: EntryId,
    pub at: Timestamp,
}

/// One page of the visible set.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct EntryPage {
    pub entries: Vec<EntryEvent>,
    pub page: u32,
    pub pages: u32,
}

/// A polling delta: raw change records in a bucketized window.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct DeltaBatch {
    pub events: Vec<EntryEvent>,

    /// Server-reported page count at the delta's page size.
    pub pages: u32,

    /// Refresh-interval signal, in seconds. Clients recompute their polling
    /// cadence and bucket width from this.
    pub refresh_interval: u64,

    /// The container's latest modification timestamp.
    pub modified: Timestamp,
}

/// Outcome of a successful write.
#[derive(Clone, Debug)]
pub struct WriteReceipt {
    /// The new log record.
    pub record: Entry,

    /// The container's latest modification timestamp after this write.
    pub modified: Timestamp,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(id: u64, replaces: Option<u64>, content: &str) -> Entry {
        Entry {
            id: EntryId(id),
            container: ContainerId(1),
            content: content.to_string(),
            authors: vec![],
            created_at: Timestamp(100),
            replaces: replaces.map(EntryId),
            key_event: false,
        }
    }

    #[test]
    fn test_kind_derivation() {
        assert_eq!(entry(1, None, "hello").kind(), EntryKind::New);
        assert_eq!(entry(2, Some(1), "edit").kind(), EntryKind::Update);
        assert_eq!(entry(3, Some(1), "").kind(), EntryKind::Delete);
        // A fresh entry with empty content is still new, not a delete.
        assert_eq!(entry(4, None, "").kind(), EntryKind::New);
    }

    #[test]
    fn test_display_id_stability() {
        assert_eq!(entry(1, None, "a").display_id(), EntryId(1));
        assert_eq!(entry(2, Some(1), "b").display_id(), EntryId(1));
        assert_eq!(entry(3, Some(1), "").display_id(), EntryId(1));
    }

    #[test]
    fn test_input_builder() {
        let input = EntryInput::new("post")
            .with_authors(vec![Author::new(7, "ada")])
            .with_key_event(true)
            .with_timestamp(Timestamp(42));

        assert_eq!(input.content, "post");
        assert_eq!(input.authors[0].name, "ada");
        assert!(input.key_event);
        assert_eq!(input.at, Some(Timestamp(42)));
    }

    #[test]
    fn test_container_status_writes() {
        assert!(ContainerStatus::Enabled.accepts_writes());
        assert!(!ContainerStatus::Disabled.accepts_writes());
        assert!(!ContainerStatus::Archived.accepts_writes());
    }
}
