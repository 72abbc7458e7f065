//! Stable, ordered pages over the visible set.

use crate::error::{FeedError, Result};
use crate::types::{Entry, Timestamp, Watermark};

/// Slice one page out of the visible set.
///
/// `visible` is the resolved set, descending by effective timestamp, delete
/// stubs already excluded. Returns the page slice and the total page count:
/// `ceil(total / per_page)`, minimum 1. A page number past the end yields
/// an empty page, not an error; `page < 1` is an error.
///
/// A watermark anchors page 1 at a known display id (or, failing that, at
/// the first entry not newer than the watermark time) so the page holds
/// still while new entries land ahead of it. The page count is computed
/// from the full set either way; the anchor stabilizes contents, not the
/// total.
pub fn paginate<'a>(
    visible: &'a [Entry],
    page: u32,
    per_page: usize,
    watermark: Option<&Watermark>,
) -> Result<(&'a [Entry], u32)> {
    if page < 1 {
        return Err(FeedError::InvalidPage(page));
    }

    let per_page = per_page.max(1);
    let pages = pages_for(visible.len(), per_page);

    let anchored = match watermark {
        Some(mark) => anchor(visible, mark),
        None => visible,
    };

    let offset = (page as usize - 1).saturating_mul(per_page);
    if offset >= anchored.len() {
        return Ok((&[], pages));
    }

    let end = (offset + per_page).min(anchored.len());
    Ok((&anchored[offset..end], pages))
}

/// Total page count for a visible-set size.
pub(crate) fn pages_for(total: usize, per_page: usize) -> u32 {
    let per_page = per_page.max(1);
    (total.div_ceil(per_page)).max(1) as u32
}

fn anchor<'a>(visible: &'a [Entry], mark: &Watermark) -> &'a [Entry] {
    if let Some(idx) = visible.iter().position(|e| e.display_id() == mark.id) {
        return &visible[idx..];
    }
    // The anchor entry is gone (deleted, or drifted out): fall back to the
    // first entry at or before the watermark time.
    let idx = visible.partition_point(|e| effective_time(e) > mark.at);
    &visible[idx..]
}

fn effective_time(entry: &Entry) -> Timestamp {
    entry.created_at
}
