//! Visible-set resolution.

use crate::types::{Entry, EntryId};
use std::collections::HashSet;

/// Collapse a raw batch into the current visible set.
///
/// The batch is ordered descending by record time. A change record whose
/// target is present in the same batch is dropped: the display entry
/// already carries the current content, the change record only exists to
/// announce the change to pollers. At most one record survives per display
/// id. `max > 0` truncates to the first `max` records in batch order.
///
/// Polling deltas never go through here; they return the raw records the
/// client merge depends on.
pub fn resolve_visible(batch: &[Entry], max: usize) -> Vec<Entry> {
    let present: HashSet<EntryId> = batch.iter().map(|e| e.id).collect();

    let mut seen = HashSet::new();
    let mut visible = Vec::new();

    for entry in batch {
        if let Some(target) = entry.replaces {
            if present.contains(&target) {
                continue;
            }
        }
        if !seen.insert(entry.display_id()) {
            continue;
        }
        visible.push(entry.clone());
        if max > 0 && visible.len() == max {
            break;
        }
    }

    visible
}
