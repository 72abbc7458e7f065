//! Main Feed struct tying all components together.

use crate::cache::{DeltaCache, EncodedDelta, SnapshotCache};
use crate::containers::ContainerManager;
use crate::content::{ContentStore, MemoryStore};
use crate::entries::{resolve_visible, EntryLog};
use crate::error::Result;
use crate::query::{paginate, PollWindow};
use crate::query::pages_for;
use crate::transform::{EntryTransform, TransformRegistry};
use crate::types::{
    Container, ContainerId, ContainerStatus, DeltaBatch, Entry, EntryEvent, EntryId, EntryInput,
    EntryKind, EntryPage, Timestamp, Watermark, WriteReceipt,
};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::debug;

/// Feed configuration.
#[derive(Clone, Debug)]
pub struct FeedConfig {
    /// Refresh-interval signal embedded in poll responses, in seconds.
    /// Clients derive their polling cadence and bucket width from it.
    pub refresh_interval: u64,

    /// Page size used when a caller passes zero.
    pub default_per_page: usize,

    /// Containers with a cached ascending snapshot.
    pub snapshot_cache_size: usize,

    /// Memoized encoded poll responses.
    pub delta_cache_size: usize,
}

impl Default for FeedConfig {
    fn default() -> Self {
        Self {
            refresh_interval: 10,
            default_per_page: 20,
            snapshot_cache_size: 64,
            delta_cache_size: 256,
        }
    }
}

/// The synchronization core for a set of live feeds.
///
/// Provides a unified interface for:
/// - Container lifecycle
/// - Entry writes (insert, in-place update, delete with orphan cleanup)
/// - Resolved page reads and raw polling deltas
pub struct Feed {
    config: FeedConfig,

    containers: ContainerManager,

    log: EntryLog,

    /// Per-container ascending snapshots, invalidated on every write.
    snapshots: SnapshotCache,

    /// Memoized encoded poll responses for bucketized windows.
    deltas: DeltaCache,

    /// Outgoing-entry transformers, fixed at composition time.
    transforms: TransformRegistry,
}

impl Feed {
    pub fn new(config: FeedConfig, store: Arc<dyn ContentStore>) -> Self {
        let snapshots = SnapshotCache::new(config.snapshot_cache_size);
        let deltas = DeltaCache::new(config.delta_cache_size);

        Self {
            containers: ContainerManager::new(),
            log: EntryLog::new(store),
            snapshots,
            deltas,
            transforms: TransformRegistry::new(),
            config,
        }
    }

    /// A feed over the in-memory store, with default configuration.
    pub fn in_memory() -> Self {
        Self::new(FeedConfig::default(), Arc::new(MemoryStore::new()))
    }

    pub fn config(&self) -> &FeedConfig {
        &self.config
    }

    /// Register an outgoing-entry transformer. Composition time only: the
    /// registry is fixed once the feed is shared.
    pub fn register_transform(&mut self, name: impl Into<String>, transform: Box<dyn EntryTransform>) {
        self.transforms.register(name, transform);
    }

    // --- Container Operations ---

    pub fn create_container(&self, name: &str) -> Result<Container> {
        self.containers.create(name)
    }

    pub fn container(&self, id: ContainerId) -> Result<Container> {
        self.containers.require(id)
    }

    pub fn container_by_name(&self, name: &str) -> Option<Container> {
        self.containers.get_by_name(name)
    }

    pub fn set_container_status(&self, id: ContainerId, status: ContainerStatus) -> Result<Container> {
        self.containers.set_status(id, status)
    }

    pub fn list_containers(&self) -> Vec<Container> {
        self.containers.list()
    }

    /// The container's latest modification timestamp.
    pub fn latest_modified(&self, id: ContainerId) -> Result<Timestamp> {
        Ok(self.containers.require(id)?.updated_at)
    }

    // --- Write Operations ---

    /// Create a fresh display entry.
    pub fn insert(&self, container: ContainerId, input: EntryInput) -> Result<WriteReceipt> {
        self.containers.writable(container)?;
        let record = self.log.insert(container, &input)?;
        self.commit_write(container, record)
    }

    /// Revise the entry at a display id in place.
    pub fn update(
        &self,
        container: ContainerId,
        display: EntryId,
        input: EntryInput,
    ) -> Result<WriteReceipt> {
        self.containers.writable(container)?;
        let record = self.log.update(container, display, &input)?;
        self.commit_write(container, record)
    }

    /// Retract the entry at a display id. The entry and every change record
    /// that referenced it are permanently removed; the delete record stays
    /// in the log to announce the retraction to pollers.
    pub fn delete(&self, container: ContainerId, display: EntryId) -> Result<WriteReceipt> {
        self.containers.writable(container)?;
        let record = self.log.delete(container, display)?;
        self.commit_write(container, record)
    }

    fn commit_write(&self, container: ContainerId, record: Entry) -> Result<WriteReceipt> {
        let version = self.snapshots.invalidate(container);
        let modified = self.containers.touch(container, record.created_at)?;
        debug!(container = %container, record = %record.id, version, "committed write");
        Ok(WriteReceipt { record, modified })
    }

    // --- Read Operations ---

    /// Direct read of the current content at a display id.
    pub fn get_entry(&self, container: ContainerId, display: EntryId) -> Result<Option<EntryEvent>> {
        self.containers.require(container)?;
        Ok(self.log.get(container, display)?.map(|entry| {
            let at = entry.created_at;
            self.finish_event(&entry, at)
        }))
    }

    /// One resolved, ordered page of the visible set. A `per_page` of zero
    /// means the configured default.
    pub fn get_page(
        &self,
        container: ContainerId,
        page: u32,
        per_page: usize,
        watermark: Option<&Watermark>,
    ) -> Result<EntryPage> {
        self.containers.require(container)?;
        let per_page = self.per_page_or_default(per_page);

        let snapshot = self.snapshot(container)?;
        let descending: Vec<Entry> = snapshot.entries.iter().rev().cloned().collect();
        let visible: Vec<Entry> = resolve_visible(&descending, 0)
            .into_iter()
            .filter(|e| e.kind() != EntryKind::Delete)
            .collect();

        let (slice, pages) = paginate(&visible, page, per_page, watermark)?;
        let entries = slice
            .iter()
            .map(|entry| self.finish_event(entry, entry.created_at))
            .collect();

        Ok(EntryPage { entries, page, pages })
    }

    /// Raw change records in a polling window, every kind included.
    ///
    /// No visible-set resolution happens here: the client depends on the
    /// redundant update and delete records to know what to merge.
    pub fn poll(
        &self,
        container: ContainerId,
        window: PollWindow,
        per_page: usize,
    ) -> Result<DeltaBatch> {
        let meta = self.containers.require(container)?;
        let per_page = self.per_page_or_default(per_page);
        let snapshot = self.snapshot(container)?;

        // Display-entry timestamps, for addressing change records by the
        // effective time of the entry they announce.
        let display_times: HashMap<EntryId, Timestamp> = snapshot
            .entries
            .iter()
            .filter(|e| e.replaces.is_none())
            .map(|e| (e.id, e.created_at))
            .collect();

        let lo = snapshot
            .entries
            .partition_point(|e| e.created_at < window.start);
        let hi = snapshot
            .entries
            .partition_point(|e| e.created_at <= window.end);

        let events = snapshot.entries[lo..hi]
            .iter()
            .map(|entry| {
                let entry_time = display_times
                    .get(&entry.display_id())
                    .copied()
                    .unwrap_or(entry.created_at);
                self.finish_event(entry, entry_time)
            })
            .collect();

        let visible_total = resolve_visible(
            &snapshot.entries.iter().rev().cloned().collect::<Vec<_>>(),
            0,
        )
        .into_iter()
        .filter(|e| e.kind() != EntryKind::Delete)
        .count();

        Ok(DeltaBatch {
            events,
            pages: pages_for(visible_total, per_page),
            refresh_interval: self.config.refresh_interval,
            modified: meta.updated_at,
        })
    }

    /// The memoized wire form of a poll response.
    ///
    /// Bucketized windows make concurrently polling clients issue identical
    /// requests; this serves them the identical encoded body and ETag, and
    /// any write to the container invalidates the memo.
    pub fn poll_encoded(
        &self,
        container: ContainerId,
        window: PollWindow,
        per_page: usize,
    ) -> Result<EncodedDelta> {
        let version = self.snapshots.version(container);
        let per_page = self.per_page_or_default(per_page);
        let key = (window.start.0, window.end.0, per_page);

        if let Some(cached) = self.deltas.get(container, key, version) {
            return Ok(cached);
        }

        let batch = self.poll(container, window, per_page)?;
        let encoded = EncodedDelta::encode(&batch, version)?;
        self.deltas.put(container, key, encoded.clone());
        Ok(encoded)
    }

    // --- Internals ---

    fn per_page_or_default(&self, per_page: usize) -> usize {
        if per_page == 0 {
            self.config.default_per_page.max(1)
        } else {
            per_page
        }
    }

    /// Read-through snapshot of the container's raw records, ascending.
    fn snapshot(&self, container: ContainerId) -> Result<Arc<crate::cache::AscendingSnapshot>> {
        if let Some(snapshot) = self.snapshots.get(container) {
            return Ok(snapshot);
        }

        let version = self.snapshots.version(container);
        let entries = self.log.all_ascending(container)?;
        Ok(self.snapshots.put(container, version, entries))
    }

    fn finish_event(&self, entry: &Entry, entry_time: Timestamp) -> EntryEvent {
        let mut event = EntryEvent {
            id: entry.display_id(),
            record_id: entry.id,
            kind: entry.kind(),
            content: entry.content.clone(),
            authors: entry.authors.clone(),
            entry_time,
            record_time: entry.created_at,
            key_event: entry.key_event,
        };
        self.transforms.apply(&mut event);
        event
    }
}
