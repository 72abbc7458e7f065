//! Versioned read-through caches, keyed by container.
//!
//! Both caches are derived indexes with explicit invalidation: every write
//! to a container bumps its version, and stale reads are discarded rather
//! than served. Nothing here is ambient state; the feed owns the instances
//! and invalidates synchronously inside the write path.

use crate::error::Result;
use crate::types::{ContainerId, DeltaBatch, Entry};
use lru::LruCache;
use parking_lot::{Mutex, RwLock};
use sha2::{Digest, Sha256};
use std::collections::HashMap;
use std::num::NonZeroUsize;
use std::sync::Arc;
use tracing::trace;

/// A container's raw records, ascending by record time, stamped with the
/// container version they were built against.
pub struct AscendingSnapshot {
    pub version: u64,
    pub entries: Vec<Entry>,
}

/// Read-through cache of per-container ascending snapshots.
pub struct SnapshotCache {
    /// Current version per container. Bumped on every write.
    versions: RwLock<HashMap<ContainerId, u64>>,

    snapshots: Mutex<LruCache<ContainerId, Arc<AscendingSnapshot>>>,
}

impl SnapshotCache {
    pub fn new(capacity: usize) -> Self {
        let capacity = NonZeroUsize::new(capacity.max(1)).unwrap();
        Self {
            versions: RwLock::new(HashMap::new()),
            snapshots: Mutex::new(LruCache::new(capacity)),
        }
    }

    /// The container's current version. Containers start at 0.
    pub fn version(&self, container: ContainerId) -> u64 {
        self.versions.read().get(&container).copied().unwrap_or(0)
    }

    /// Bump the container version and drop its snapshot. Called inside the
    /// write path, synchronously with the write itself.
    pub fn invalidate(&self, container: ContainerId) -> u64 {
        let mut versions = self.versions.write();
        let version = versions.entry(container).or_insert(0);
        *version += 1;
        let version = *version;
        drop(versions);

        self.snapshots.lock().pop(&container);
        trace!(container = %container, version, "invalidated container caches");
        version
    }

    /// A fresh snapshot, if one is cached.
    pub fn get(&self, container: ContainerId) -> Option<Arc<AscendingSnapshot>> {
        let current = self.version(container);
        let mut snapshots = self.snapshots.lock();
        match snapshots.get(&container) {
            Some(snapshot) if snapshot.version == current => Some(Arc::clone(snapshot)),
            Some(_) => {
                // Built against an older version; a write raced the build.
                snapshots.pop(&container);
                None
            }
            None => None,
        }
    }

    /// Store a snapshot built against `version`. If the container has moved
    /// on since the build started, the snapshot is returned uncached.
    pub fn put(
        &self,
        container: ContainerId,
        version: u64,
        entries: Vec<Entry>,
    ) -> Arc<AscendingSnapshot> {
        let snapshot = Arc::new(AscendingSnapshot { version, entries });
        if self.version(container) == version {
            self.snapshots
                .lock()
                .put(container, Arc::clone(&snapshot));
        }
        snapshot
    }
}

/// An encoded poll response: MessagePack body plus a digest ETag.
#[derive(Clone, Debug)]
pub struct EncodedDelta {
    pub etag: String,
    pub body: Vec<u8>,
    version: u64,
}

impl EncodedDelta {
    /// Encode a delta batch, deriving the ETag from the body digest.
    pub fn encode(batch: &DeltaBatch, version: u64) -> Result<Self> {
        let body = rmp_serde::to_vec(batch)?;
        let etag = hex::encode(Sha256::digest(&body));
        Ok(Self {
            etag,
            body,
            version,
        })
    }

    /// Decode back into a batch. Exercised by clients consuming the cached
    /// wire form.
    pub fn decode(&self) -> Result<DeltaBatch> {
        Ok(rmp_serde::from_slice(&self.body)?)
    }
}

/// Cache key for one poll response: window bounds plus page size.
pub type DeltaKey = (i64, i64, usize);

/// Memo of encoded poll responses keyed by container, window, and page
/// size.
///
/// Bucketized windows make concurrently polling clients issue identical
/// requests; serving the identical encoded body keeps the shared path
/// cheap and gives edge caches a stable ETag to revalidate against.
pub struct DeltaCache {
    entries: Mutex<LruCache<(ContainerId, DeltaKey), EncodedDelta>>,
}

impl DeltaCache {
    pub fn new(capacity: usize) -> Self {
        let capacity = NonZeroUsize::new(capacity.max(1)).unwrap();
        Self {
            entries: Mutex::new(LruCache::new(capacity)),
        }
    }

    /// A cached response for this key, if still valid at `version`.
    pub fn get(&self, container: ContainerId, key: DeltaKey, version: u64) -> Option<EncodedDelta> {
        let full_key = (container, key);
        let mut entries = self.entries.lock();
        match entries.get(&full_key) {
            Some(cached) if cached.version == version => Some(cached.clone()),
            Some(_) => {
                entries.pop(&full_key);
                None
            }
            None => None,
        }
    }

    pub fn put(&self, container: ContainerId, key: DeltaKey, encoded: EncodedDelta) {
        self.entries.lock().put((container, key), encoded);
    }
}
