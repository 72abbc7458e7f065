//! Error handling and edge case tests.

use liveline::{
    ContainerId, ContainerStatus, EntryId, EntryInput, Feed, FeedError, PollWindow, Timestamp,
};

fn test_feed() -> (Feed, ContainerId) {
    let feed = Feed::in_memory();
    let container = feed.create_container("liveblog").unwrap();
    (feed, container.id)
}

// --- Container Errors ---

#[test]
fn test_write_to_missing_container() {
    let feed = Feed::in_memory();

    let result = feed.insert(ContainerId(99), EntryInput::new("nope"));
    assert!(matches!(result, Err(FeedError::InvalidContainer(_))));
}

#[test]
fn test_write_to_disabled_container() {
    let (feed, container) = test_feed();
    feed.set_container_status(container, ContainerStatus::Disabled)
        .unwrap();

    let result = feed.insert(container, EntryInput::new("nope"));
    assert!(matches!(result, Err(FeedError::InvalidContainer(_))));
}

#[test]
fn test_archived_container_is_read_only_but_pollable() {
    let (feed, container) = test_feed();

    let id = feed
        .insert(
            container,
            EntryInput::new("frozen").with_timestamp(Timestamp(100)),
        )
        .unwrap()
        .record
        .id;

    feed.set_container_status(container, ContainerStatus::Archived)
        .unwrap();

    // Writes of every kind are rejected.
    assert!(matches!(
        feed.insert(container, EntryInput::new("more")),
        Err(FeedError::InvalidContainer(_))
    ));
    assert!(matches!(
        feed.update(container, id, EntryInput::new("edit")),
        Err(FeedError::InvalidContainer(_))
    ));
    assert!(matches!(
        feed.delete(container, id),
        Err(FeedError::InvalidContainer(_))
    ));

    // Reads and polls still resolve.
    let page = feed.get_page(container, 1, 10, None).unwrap();
    assert_eq!(page.entries.len(), 1);

    let batch = feed
        .poll(container, PollWindow::between(Timestamp(0), Timestamp(1000)), 10)
        .unwrap();
    assert_eq!(batch.events.len(), 1);
}

#[test]
fn test_duplicate_container_name() {
    let feed = Feed::in_memory();
    feed.create_container("liveblog").unwrap();

    let result = feed.create_container("liveblog");
    assert!(matches!(result, Err(FeedError::ContainerExists(_))));
}

// --- Display-Id Errors ---

#[test]
fn test_update_of_missing_display_id_is_hard_failure() {
    let (feed, container) = test_feed();

    let result = feed.update(container, EntryId(42), EntryInput::new("x"));
    assert!(matches!(result, Err(FeedError::NotFound(_))));
}

#[test]
fn test_delete_is_idempotent_at_the_caller() {
    let (feed, container) = test_feed();

    let id = feed
        .insert(container, EntryInput::new("once"))
        .unwrap()
        .record
        .id;

    feed.delete(container, id).unwrap();

    // A retried delete reports NotFound; callers treat that as "already
    // deleted" and succeed.
    let retry = feed.delete(container, id);
    assert!(matches!(retry, Err(FeedError::NotFound(_))));
}

#[test]
fn test_update_cannot_target_a_change_record() {
    let (feed, container) = test_feed();

    let id = feed
        .insert(container, EntryInput::new("v1"))
        .unwrap()
        .record
        .id;
    let change = feed
        .update(container, id, EntryInput::new("v2"))
        .unwrap()
        .record
        .id;

    let result = feed.update(container, change, EntryInput::new("v3"));
    assert!(matches!(result, Err(FeedError::NotFound(_))));
}

#[test]
fn test_update_cannot_cross_containers() {
    let feed = Feed::in_memory();
    let a = feed.create_container("a").unwrap().id;
    let b = feed.create_container("b").unwrap().id;

    let id = feed.insert(a, EntryInput::new("in a")).unwrap().record.id;

    let result = feed.update(b, id, EntryInput::new("from b"));
    assert!(matches!(result, Err(FeedError::NotFound(_))));
}

// --- Page Errors ---

#[test]
fn test_page_zero_is_an_error() {
    let (feed, container) = test_feed();

    let result = feed.get_page(container, 0, 10, None);
    assert!(matches!(result, Err(FeedError::InvalidPage(0))));
}

#[test]
fn test_page_past_the_end_is_empty() {
    let (feed, container) = test_feed();
    feed.insert(container, EntryInput::new("only one")).unwrap();

    let page = feed.get_page(container, 7, 10, None).unwrap();
    assert!(page.entries.is_empty());
    assert_eq!(page.pages, 1);
    assert_eq!(page.page, 7);
}

#[test]
fn test_empty_container_pages() {
    let (feed, container) = test_feed();

    let page = feed.get_page(container, 1, 10, None).unwrap();
    assert!(page.entries.is_empty());
    assert_eq!(page.pages, 1);
}

#[test]
fn test_read_of_missing_container() {
    let feed = Feed::in_memory();

    assert!(matches!(
        feed.get_page(ContainerId(5), 1, 10, None),
        Err(FeedError::InvalidContainer(_))
    ));
    assert!(matches!(
        feed.poll(
            ContainerId(5),
            PollWindow::between(Timestamp(0), Timestamp(10)),
            10
        ),
        Err(FeedError::InvalidContainer(_))
    ));
}
