//! In-memory content store.
//!
//! The reference [`ContentStore`] used by tests and default composition.

use super::{ContentStore, NewRecord, RecordFilter, RecordOrder, StoredRecord, META_AUTHORS, META_REPLACES};
use crate::error::{FeedError, Result};
use crate::types::{ContainerId, EntryId};
use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};

/// A stored record plus its trash flag.
struct Slot {
    record: StoredRecord,
    trashed: bool,
}

/// In-memory record store with monotonic id assignment and trash semantics
/// for soft deletes.
pub struct MemoryStore {
    records: RwLock<HashMap<EntryId, Slot>>,
    next_id: AtomicU64,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self {
            records: RwLock::new(HashMap::new()),
            next_id: AtomicU64::new(1),
        }
    }

    /// Total records held, trashed included. Test visibility.
    pub fn record_count(&self) -> usize {
        self.records.read().len()
    }

    fn matches(slot: &Slot, container: ContainerId, filter: &RecordFilter) -> bool {
        if slot.record.container != container {
            return false;
        }
        if slot.trashed && !filter.include_trashed {
            return false;
        }
        if let Some((start, end)) = filter.created_between {
            if slot.record.created_at < start || slot.record.created_at > end {
                return false;
            }
        }
        if let Some(display) = filter.replaces {
            match slot.record.meta(META_REPLACES) {
                Some(value) if value == display.0.to_string() => {}
                _ => return false,
            }
        }
        true
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl ContentStore for MemoryStore {
    fn create_record(&self, record: NewRecord) -> Result<StoredRecord> {
        let id = EntryId(self.next_id.fetch_add(1, Ordering::SeqCst));

        let stored = StoredRecord {
            id,
            container: record.container,
            content: record.content,
            created_at: record.created_at,
            meta: record.meta,
        };

        self.records.write().insert(
            id,
            Slot {
                record: stored.clone(),
                trashed: false,
            },
        );

        Ok(stored)
    }

    fn mutate_record(&self, id: EntryId, content: &str, authors: &str) -> Result<()> {
        let mut records = self.records.write();
        let slot = records.get_mut(&id).ok_or(FeedError::NotFound(id))?;
        slot.record.content = content.to_string();
        slot.record
            .meta
            .insert(META_AUTHORS.to_string(), authors.to_string());
        Ok(())
    }

    fn delete_record(&self, id: EntryId, hard: bool) -> Result<()> {
        let mut records = self.records.write();
        if hard {
            records.remove(&id).ok_or(FeedError::NotFound(id))?;
        } else {
            let slot = records.get_mut(&id).ok_or(FeedError::NotFound(id))?;
            slot.trashed = true;
        }
        Ok(())
    }

    fn query_records(
        &self,
        container: ContainerId,
        filter: &RecordFilter,
        order: RecordOrder,
    ) -> Result<Vec<StoredRecord>> {
        let records = self.records.read();

        let mut matched: Vec<StoredRecord> = records
            .values()
            .filter(|slot| Self::matches(slot, container, filter))
            .map(|slot| slot.record.clone())
            .collect();

        match order {
            RecordOrder::CreatedAsc => {
                matched.sort_by_key(|r| (r.created_at, r.id));
            }
            RecordOrder::CreatedDesc => {
                matched.sort_by_key(|r| (std::cmp::Reverse(r.created_at), std::cmp::Reverse(r.id)));
            }
        }

        Ok(matched)
    }

    fn get_record(&self, id: EntryId) -> Result<Option<StoredRecord>> {
        Ok(self.records.read().get(&id).map(|slot| slot.record.clone()))
    }

    fn get_meta(&self, id: EntryId, key: &str) -> Result<Option<String>> {
        let records = self.records.read();
        let slot = records.get(&id).ok_or(FeedError::NotFound(id))?;
        Ok(slot.record.meta.get(key).cloned())
    }

    fn set_meta(&self, id: EntryId, key: &str, value: &str) -> Result<()> {
        let mut records = self.records.write();
        let slot = records.get_mut(&id).ok_or(FeedError::NotFound(id))?;
        slot.record.meta.insert(key.to_string(), value.to_string());
        Ok(())
    }
}
