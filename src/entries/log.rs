//! Entry log writes.
//!
//! Every write is a log append. Updates and deletes additionally touch the
//! referenced display record: an update mutates its content and authors in
//! place so direct reads are always current, a delete purges it and any
//! change records that pointed at it.
//!
//! The (append change record, mutate display record) pair must be atomic
//! with respect to readers, and writes to one display id must be
//! serialized. Both are enforced with a per-container write gate: writers
//! hold the exclusive side for the whole logical unit, snapshot reads hold
//! the shared side.

use crate::content::{
    ContentStore, NewRecord, RecordFilter, RecordOrder, StoredRecord, META_AUTHORS,
    META_KEY_EVENT, META_REPLACES,
};
use crate::error::{FeedError, Result};
use crate::types::{Author, ContainerId, Entry, EntryId, EntryInput, Timestamp};
use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, trace};

/// Append + mutate + cleanup over the content store.
pub struct EntryLog {
    store: Arc<dyn ContentStore>,

    /// Per-container write gates.
    gates: RwLock<HashMap<ContainerId, Arc<RwLock<()>>>>,
}

impl EntryLog {
    pub fn new(store: Arc<dyn ContentStore>) -> Self {
        Self {
            store,
            gates: RwLock::new(HashMap::new()),
        }
    }

    fn gate(&self, container: ContainerId) -> Arc<RwLock<()>> {
        if let Some(gate) = self.gates.read().get(&container) {
            return Arc::clone(gate);
        }
        Arc::clone(
            self.gates
                .write()
                .entry(container)
                .or_insert_with(|| Arc::new(RwLock::new(()))),
        )
    }

    /// Create a fresh display entry.
    pub fn insert(&self, container: ContainerId, input: &EntryInput) -> Result<Entry> {
        let gate = self.gate(container);
        let _guard = gate.write();

        let entry = self.append(container, input, None)?;
        debug!(container = %container, entry = %entry.id, "inserted entry");
        Ok(entry)
    }

    /// Append an update change record and mutate the display entry in place.
    pub fn update(
        &self,
        container: ContainerId,
        display: EntryId,
        input: &EntryInput,
    ) -> Result<Entry> {
        let gate = self.gate(container);
        let _guard = gate.write();

        self.live_display(container, display)?;

        let record = self.append(container, input, Some(display))?;
        self.store
            .mutate_record(display, &input.content, &encode_authors(&input.authors)?)?;
        self.store.set_meta(
            display,
            META_KEY_EVENT,
            if input.key_event { "1" } else { "0" },
        )?;

        debug!(container = %container, display = %display, record = %record.id, "updated entry");
        Ok(record)
    }

    /// Append a delete change record, purge dangling change records, then
    /// permanently remove the display entry.
    ///
    /// The display entry is only removed once orphan cleanup has fully
    /// succeeded; a partial cleanup fails the delete as a whole and the
    /// caller retries.
    pub fn delete(&self, container: ContainerId, display: EntryId) -> Result<Entry> {
        let gate = self.gate(container);
        let _guard = gate.write();

        self.live_display(container, display)?;

        let input = EntryInput::new("");
        let record = self.append(container, &input, Some(display))?;

        self.collect_orphans(container, display, record.id)?;

        self.store.delete_record(display, true)?;
        debug!(container = %container, display = %display, record = %record.id, "deleted entry");
        Ok(record)
    }

    /// Remove change records referencing a display entry that is about to
    /// be purged, except the delete record just created.
    fn collect_orphans(
        &self,
        container: ContainerId,
        display: EntryId,
        keep: EntryId,
    ) -> Result<()> {
        let orphans: Vec<StoredRecord> = self
            .store
            .query_records(container, &RecordFilter::replacing(display), RecordOrder::CreatedAsc)?
            .into_iter()
            .filter(|r| r.id != keep)
            .collect();

        let total = orphans.len();
        for (removed, orphan) in orphans.into_iter().enumerate() {
            match self.store.delete_record(orphan.id, true) {
                Ok(()) => {
                    trace!(container = %container, orphan = %orphan.id, display = %display, "removed orphan change record");
                }
                // Already gone; a retried delete may race its own earlier
                // partial cleanup.
                Err(FeedError::NotFound(_)) => {}
                Err(_) => {
                    return Err(FeedError::PartialOrphanFailure {
                        display,
                        remaining: total - removed,
                    });
                }
            }
        }

        Ok(())
    }

    fn append(
        &self,
        container: ContainerId,
        input: &EntryInput,
        replaces: Option<EntryId>,
    ) -> Result<Entry> {
        let mut meta = HashMap::new();
        meta.insert(META_AUTHORS.to_string(), encode_authors(&input.authors)?);
        meta.insert(
            META_KEY_EVENT.to_string(),
            if input.key_event { "1" } else { "0" }.to_string(),
        );
        if let Some(target) = replaces {
            meta.insert(META_REPLACES.to_string(), target.0.to_string());
        }

        let stored = self.store.create_record(NewRecord {
            container,
            content: input.content.clone(),
            created_at: input.at.unwrap_or_else(Timestamp::now),
            meta,
        })?;

        decode_entry(stored)
    }

    /// Ensure `display` resolves to an existing display entry in this
    /// container. Change records are not valid update/delete targets.
    fn live_display(&self, container: ContainerId, display: EntryId) -> Result<Entry> {
        let record = self
            .store
            .get_record(display)?
            .ok_or(FeedError::NotFound(display))?;

        if record.container != container || record.meta(META_REPLACES).is_some() {
            return Err(FeedError::NotFound(display));
        }

        decode_entry(record)
    }

    /// Direct read of a display entry's current content.
    pub fn get(&self, container: ContainerId, display: EntryId) -> Result<Option<Entry>> {
        let gate = self.gate(container);
        let _guard = gate.read();

        match self.live_display(container, display) {
            Ok(entry) => Ok(Some(entry)),
            Err(FeedError::NotFound(_)) => Ok(None),
            Err(e) => Err(e),
        }
    }

    /// Snapshot of all live records in a container, ascending by record
    /// time. This is the raw batch the resolver and the polling window
    /// slice both start from.
    pub fn all_ascending(&self, container: ContainerId) -> Result<Vec<Entry>> {
        let gate = self.gate(container);
        let _guard = gate.read();

        self.store
            .query_records(container, &RecordFilter::all(), RecordOrder::CreatedAsc)?
            .into_iter()
            .map(decode_entry)
            .collect()
    }
}

fn encode_authors(authors: &[Author]) -> Result<String> {
    Ok(serde_json::to_string(authors)?)
}

fn decode_authors(encoded: Option<&str>) -> Result<Vec<Author>> {
    match encoded {
        None | Some("") => Ok(Vec::new()),
        Some(json) => serde_json::from_str(json)
            .map_err(|e| FeedError::Deserialization(format!("authors metadata: {e}"))),
    }
}

fn decode_entry(record: StoredRecord) -> Result<Entry> {
    let replaces = match record.meta(META_REPLACES) {
        None => None,
        Some(raw) => Some(EntryId(raw.parse().map_err(|_| {
            FeedError::Deserialization(format!("replaces metadata on {}: {raw:?}", record.id))
        })?)),
    };

    Ok(Entry {
        id: record.id,
        container: record.container,
        authors: decode_authors(record.meta(META_AUTHORS))?,
        key_event: record.meta(META_KEY_EVENT) == Some("1"),
        content: record.content,
        created_at: record.created_at,
        replaces,
    })
}
