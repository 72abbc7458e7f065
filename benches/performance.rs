//! Performance benchmarks for the synchronization core.

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use liveline::{
    fold_entries, resolve_visible, ContainerId, Entry, EntryEvent, EntryId, EntryInput, EntryKind,
    Feed, Timestamp,
};

fn raw_batch(len: u64) -> Vec<Entry> {
    // Descending by record time, every third record a change record.
    (0..len)
        .rev()
        .map(|i| Entry {
            id: EntryId(i + 1),
            container: ContainerId(1),
            content: format!("entry {i}"),
            authors: vec![],
            created_at: Timestamp(i as i64),
            replaces: if i % 3 == 0 && i > 0 { Some(EntryId(i)) } else { None },
            key_event: false,
        })
        .collect()
}

fn event_batch(len: u64) -> Vec<EntryEvent> {
    (0..len)
        .map(|i| EntryEvent {
            id: EntryId(i % 64 + 1),
            record_id: EntryId(i + 1),
            kind: match i % 5 {
                4 => EntryKind::Delete,
                2 | 3 => EntryKind::Update,
                _ => EntryKind::New,
            },
            content: if i % 5 == 4 { String::new() } else { format!("entry {i}") },
            authors: vec![],
            entry_time: Timestamp((i % 64) as i64),
            record_time: Timestamp(i as i64),
            key_event: false,
        })
        .collect()
}

/// Benchmark visible-set resolution over growing batches.
fn bench_resolver(c: &mut Criterion) {
    let mut group = c.benchmark_group("resolve_visible");

    for size in [100, 1_000, 10_000] {
        let batch = raw_batch(size);
        group.bench_with_input(BenchmarkId::new("batch", size), &batch, |b, batch| {
            b.iter(|| resolve_visible(black_box(batch), 0));
        });
    }

    group.finish();
}

/// Benchmark the client fold over delta batches of varying size.
fn bench_client_fold(c: &mut Criterion) {
    let mut group = c.benchmark_group("fold_entries");

    for size in [10, 100, 1_000] {
        let batch = event_batch(size);
        group.bench_with_input(BenchmarkId::new("delta", size), &batch, |b, batch| {
            b.iter(|| fold_entries(Vec::new(), black_box(batch)));
        });
    }

    group.finish();
}

/// Benchmark page reads against a populated feed, cold and warm cache.
fn bench_page_reads(c: &mut Criterion) {
    let feed = Feed::in_memory();
    let container = feed.create_container("bench").unwrap().id;
    for i in 0..2_000i64 {
        feed.insert(
            container,
            EntryInput::new(format!("entry {i}")).with_timestamp(Timestamp(i)),
        )
        .unwrap();
    }

    c.bench_function("get_page_warm", |b| {
        // First read primes the snapshot cache.
        feed.get_page(container, 1, 20, None).unwrap();
        b.iter(|| feed.get_page(black_box(container), 1, 20, None).unwrap());
    });
}

criterion_group!(benches, bench_resolver, bench_client_fold, bench_page_reads);
criterion_main!(benches);
