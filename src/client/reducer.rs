//! Reconciliation folds.
//!
//! Pure functions from old state plus a delta to new state. Applying the
//! same delta twice yields the same state, which is what makes at-least-
//! once delivery safe; deleting an id that is not present is a silent
//! no-op, which is what makes out-of-order buckets safe.

use super::view::ViewEntry;
use crate::types::{EntryEvent, EntryKind};

/// Fold a batch of events into the rendered entry list.
///
/// - `new`: insert, or overwrite the entry already at that display id.
/// - `update`: overwrite if present, otherwise treat as an insert.
/// - `delete`: remove; absent ids are ignored.
///
/// The list is re-sorted by timestamp descending after every step. The
/// sort is stable and overwrites happen in place, so entries with equal
/// timestamps never move relative to each other: last-write-wins applies
/// to content, not to position.
pub fn fold_entries(mut entries: Vec<ViewEntry>, batch: &[EntryEvent]) -> Vec<ViewEntry> {
    for event in batch {
        match event.kind {
            EntryKind::New | EntryKind::Update => upsert(&mut entries, event),
            EntryKind::Delete => entries.retain(|e| e.id != event.id),
        }
        entries.sort_by(|a, b| b.entry_time.cmp(&a.entry_time));
    }
    entries
}

/// Fold a batch into the parallel key-events list.
///
/// An entry enters (or stays) when it arrives flagged as key with type
/// `new` or `update`; it leaves when deleted or when an update clears the
/// flag.
pub fn fold_key_events(mut keyed: Vec<ViewEntry>, batch: &[EntryEvent]) -> Vec<ViewEntry> {
    for event in batch {
        match event.kind {
            EntryKind::Delete => keyed.retain(|e| e.id != event.id),
            EntryKind::New | EntryKind::Update if event.key_event => upsert(&mut keyed, event),
            EntryKind::Update => keyed.retain(|e| e.id != event.id),
            EntryKind::New => {}
        }
        keyed.sort_by(|a, b| b.entry_time.cmp(&a.entry_time));
    }
    keyed
}

fn upsert(entries: &mut Vec<ViewEntry>, event: &EntryEvent) {
    match entries.iter_mut().find(|e| e.id == event.id) {
        Some(existing) => *existing = ViewEntry::from(event),
        None => entries.push(ViewEntry::from(event)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{EntryId, Timestamp};
    use proptest::prelude::*;

    fn event(id: u64, kind: EntryKind, content: &str, at: i64) -> EntryEvent {
        EntryEvent {
            id: EntryId(id),
            record_id: EntryId(id),
            kind,
            content: content.to_string(),
            authors: vec![],
            entry_time: Timestamp(at),
            record_time: Timestamp(at),
            key_event: false,
        }
    }

    fn keyed_event(id: u64, kind: EntryKind, content: &str, at: i64) -> EntryEvent {
        let mut e = event(id, kind, content, at);
        e.key_event = true;
        e
    }

    fn ids(entries: &[ViewEntry]) -> Vec<u64> {
        entries.iter().map(|e| e.id.0).collect()
    }

    #[test]
    fn test_merge_type_semantics() {
        // Steady state {1,2,3}; delta [new 4, update 3 -> "x", delete 2]
        // yields exactly {1,3,4} with 3's content replaced.
        let state = fold_entries(
            Vec::new(),
            &[
                event(1, EntryKind::New, "a", 100),
                event(2, EntryKind::New, "b", 200),
                event(3, EntryKind::New, "c", 300),
            ],
        );

        let state = fold_entries(
            state,
            &[
                event(4, EntryKind::New, "d", 400),
                event(3, EntryKind::Update, "x", 300),
                event(2, EntryKind::Delete, "", 200),
            ],
        );

        assert_eq!(ids(&state), vec![4, 3, 1]);
        let three = state.iter().find(|e| e.id == EntryId(3)).unwrap();
        assert_eq!(three.content, "x");
    }

    #[test]
    fn test_update_of_absent_entry_inserts() {
        let state = fold_entries(Vec::new(), &[event(7, EntryKind::Update, "late", 700)]);
        assert_eq!(ids(&state), vec![7]);
    }

    #[test]
    fn test_delete_of_absent_entry_is_noop() {
        let state = fold_entries(
            vec![ViewEntry::from(&event(1, EntryKind::New, "a", 100))],
            &[event(9, EntryKind::Delete, "", 900)],
        );
        assert_eq!(ids(&state), vec![1]);
    }

    #[test]
    fn test_sorted_descending_with_stable_ties() {
        let state = fold_entries(
            Vec::new(),
            &[
                event(1, EntryKind::New, "a", 100),
                event(2, EntryKind::New, "b", 100),
                event(3, EntryKind::New, "c", 200),
            ],
        );
        // 3 leads; 1 and 2 share a timestamp and keep insertion order.
        assert_eq!(ids(&state), vec![3, 1, 2]);

        // Updating 1 rewrites content without moving it past 2.
        let state = fold_entries(state, &[event(1, EntryKind::Update, "a2", 100)]);
        assert_eq!(ids(&state), vec![3, 1, 2]);
        assert_eq!(state[1].content, "a2");
    }

    #[test]
    fn test_key_events_transitions() {
        // Enters flagged, survives flagged updates, leaves when the flag
        // clears or the entry is deleted.
        let keyed = fold_key_events(Vec::new(), &[keyed_event(1, EntryKind::New, "goal", 100)]);
        assert_eq!(ids(&keyed), vec![1]);

        let keyed = fold_key_events(keyed, &[keyed_event(1, EntryKind::Update, "goal!", 100)]);
        assert_eq!(keyed[0].content, "goal!");

        let keyed = fold_key_events(keyed, &[event(1, EntryKind::Update, "plain", 100)]);
        assert!(keyed.is_empty());

        let keyed = fold_key_events(
            vec![ViewEntry::from(&keyed_event(2, EntryKind::New, "k", 200))],
            &[event(2, EntryKind::Delete, "", 200)],
        );
        assert!(keyed.is_empty());
    }

    #[test]
    fn test_unflagged_new_never_enters_key_list() {
        let keyed = fold_key_events(Vec::new(), &[event(1, EntryKind::New, "plain", 100)]);
        assert!(keyed.is_empty());
    }

    // --- Property: fold(fold(S, D), D) == fold(S, D) ---

    fn arb_event() -> impl Strategy<Value = EntryEvent> {
        (0u64..8, 0usize..3, 0i64..6, any::<bool>(), "[a-z]{0,6}").prop_map(
            |(id, kind, at, key, content)| {
                let kind = match kind {
                    0 => EntryKind::New,
                    1 => EntryKind::Update,
                    _ => EntryKind::Delete,
                };
                EntryEvent {
                    id: EntryId(id),
                    record_id: EntryId(id + 100),
                    kind,
                    content: if kind == EntryKind::Delete {
                        String::new()
                    } else {
                        content
                    },
                    authors: vec![],
                    entry_time: Timestamp(at),
                    record_time: Timestamp(at),
                    key_event: key,
                }
            },
        )
    }

    proptest! {
        #[test]
        fn prop_fold_entries_idempotent(
            seed in proptest::collection::vec(arb_event(), 0..12),
            batch in proptest::collection::vec(arb_event(), 0..12),
        ) {
            let state = fold_entries(Vec::new(), &seed);
            let once = fold_entries(state.clone(), &batch);
            let twice = fold_entries(once.clone(), &batch);
            prop_assert_eq!(once, twice);
        }

        #[test]
        fn prop_fold_key_events_idempotent(
            seed in proptest::collection::vec(arb_event(), 0..12),
            batch in proptest::collection::vec(arb_event(), 0..12),
        ) {
            let keyed = fold_key_events(Vec::new(), &seed);
            let once = fold_key_events(keyed.clone(), &batch);
            let twice = fold_key_events(once.clone(), &batch);
            prop_assert_eq!(once, twice);
        }

        #[test]
        fn prop_fold_output_sorted_descending(
            batch in proptest::collection::vec(arb_event(), 0..16),
        ) {
            let state = fold_entries(Vec::new(), &batch);
            for pair in state.windows(2) {
                prop_assert!(pair[0].entry_time >= pair[1].entry_time);
            }
        }
    }
}
