//! The per-container client view state machine.

use super::reducer::{fold_entries, fold_key_events};
use crate::types::{Author, DeltaBatch, EntryEvent, EntryId, EntryKind, EntryPage, Timestamp};

/// One rendered entry in the client view.
#[derive(Clone, Debug, PartialEq)]
pub struct ViewEntry {
    /// Display id.
    pub id: EntryId,
    pub content: String,
    pub authors: Vec<Author>,
    pub entry_time: Timestamp,
    pub key_event: bool,
}

impl From<&EntryEvent> for ViewEntry {
    fn from(event: &EntryEvent) -> Self {
        Self {
            id: event.id,
            content: event.content.clone(),
            authors: event.authors.clone(),
            entry_time: event.entry_time,
            key_event: event.key_event,
        }
    }
}

/// Client view of one container.
///
/// Steady state is the rendered entry list (descending by timestamp), the
/// page position, and the parallel key-events list. Polling adds pending
/// state: buffered not-yet-rendered entries and the newest entry seen from
/// any source.
#[derive(Default)]
pub struct FeedView {
    entries: Vec<ViewEntry>,
    key_events: Vec<ViewEntry>,
    pages: u32,
    page: u32,

    /// New entries seen by polling but not yet rendered.
    pending: Vec<EntryEvent>,

    /// Highest-timestamp entry seen from page loads or polling.
    newest: Option<ViewEntry>,

    /// Highest record time seen; the `T` the next poll window buckets from.
    last_record_time: Timestamp,
}

impl FeedView {
    pub fn new() -> Self {
        Self::default()
    }

    /// Rendered entries, descending by timestamp.
    pub fn entries(&self) -> &[ViewEntry] {
        &self.entries
    }

    /// Key-flagged entries, maintained independently of the main list.
    pub fn key_events(&self) -> &[ViewEntry] {
        &self.key_events
    }

    pub fn pages(&self) -> u32 {
        self.pages
    }

    pub fn page(&self) -> u32 {
        self.page
    }

    /// Unread entries held back from rendering.
    pub fn pending_count(&self) -> usize {
        self.pending.len()
    }

    /// The newest entry seen from any source.
    pub fn newest(&self) -> Option<&ViewEntry> {
        self.newest.as_ref()
    }

    /// The timestamp the next poll window should bucket from.
    pub fn last_record_time(&self) -> Timestamp {
        self.last_record_time
    }

    /// Merge a page load into the view.
    pub fn apply_page(&mut self, page: &EntryPage) {
        self.entries = fold_entries(std::mem::take(&mut self.entries), &page.entries);
        self.key_events = fold_key_events(std::mem::take(&mut self.key_events), &page.entries);
        self.track_batch(&page.entries);

        self.pages = page.pages.max(1);
        self.page = page.page;
    }

    /// Merge a polling delta.
    ///
    /// `render_now` is the caller's signal that new entries may enter the
    /// rendered list immediately (the viewer is at the top of page 1).
    /// Otherwise new entries are buffered and surface through
    /// [`FeedView::pending_count`] until [`FeedView::merge_pending`];
    /// updates and deletes always apply immediately, to the rendered list
    /// and the buffer both.
    pub fn apply_poll(&mut self, batch: &DeltaBatch, render_now: bool) {
        if render_now {
            self.drain_pending_into(&batch.events);
            self.pages = self.pages.max(batch.pages);
        } else {
            let mut render: Vec<EntryEvent> = Vec::new();
            for event in &batch.events {
                match event.kind {
                    EntryKind::New if !self.is_rendered(event.id) => self.buffer(event),
                    EntryKind::Update if self.is_buffered(event.id) => self.buffer(event),
                    EntryKind::Delete => {
                        self.pending.retain(|p| p.id != event.id);
                        render.push(event.clone());
                    }
                    _ => render.push(event.clone()),
                }
            }
            self.entries = fold_entries(std::mem::take(&mut self.entries), &render);
            // Page count stays put until the buffer is merged; a stale
            // polling total must not move the pager.
        }

        self.key_events = fold_key_events(std::mem::take(&mut self.key_events), &batch.events);
        self.track_batch(&batch.events);
    }

    /// Merge buffered entries into the rendered list.
    ///
    /// `refreshed` is a fresh page-1 fetch; when given, the page count is
    /// recomputed from it instead of trusting totals that were reported
    /// while the buffer accumulated.
    pub fn merge_pending(&mut self, refreshed: Option<&EntryPage>) {
        let pending = std::mem::take(&mut self.pending);
        self.entries = fold_entries(std::mem::take(&mut self.entries), &pending);

        if let Some(page) = refreshed {
            self.apply_page(page);
        }
    }

    fn drain_pending_into(&mut self, batch: &[EntryEvent]) {
        let pending = std::mem::take(&mut self.pending);
        self.entries = fold_entries(std::mem::take(&mut self.entries), &pending);
        self.entries = fold_entries(std::mem::take(&mut self.entries), batch);
    }

    fn is_rendered(&self, id: EntryId) -> bool {
        self.entries.iter().any(|e| e.id == id)
    }

    fn is_buffered(&self, id: EntryId) -> bool {
        self.pending.iter().any(|p| p.id == id)
    }

    fn buffer(&mut self, event: &EntryEvent) {
        match self.pending.iter_mut().find(|p| p.id == event.id) {
            Some(existing) => *existing = event.clone(),
            None => self.pending.push(event.clone()),
        }
    }

    /// Advance last-known and newest-entry tracking over a merged batch.
    fn track_batch(&mut self, batch: &[EntryEvent]) {
        for event in batch {
            if event.record_time > self.last_record_time {
                self.last_record_time = event.record_time;
            }

            match event.kind {
                EntryKind::Delete => {
                    // If the newest-known entry is the one deleted, fall
                    // back to the top of the rendered set.
                    if self.newest.as_ref().is_some_and(|n| n.id == event.id) {
                        self.newest = self.entries.first().cloned();
                    }
                }
                EntryKind::New | EntryKind::Update => {
                    let newer = match &self.newest {
                        Some(n) => event.entry_time > n.entry_time,
                        None => true,
                    };
                    if newer {
                        self.newest = Some(ViewEntry::from(event));
                    }
                }
            }
        }
    }
}
