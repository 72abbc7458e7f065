//! Container manager implementation.

use crate::error::{FeedError, Result};
use crate::types::{Container, ContainerId, ContainerStatus, Timestamp};
use parking_lot::RwLock;
use std::collections::HashMap;

/// In-memory container index.
#[derive(Default)]
struct ContainerIndex {
    containers: HashMap<ContainerId, Container>,

    /// Container name to id mapping.
    name_to_id: HashMap<String, ContainerId>,

    /// Next container id to assign.
    next_id: u64,
}

/// Manages containers: creation, lifecycle, modification timestamps.
pub struct ContainerManager {
    index: RwLock<ContainerIndex>,
}

impl ContainerManager {
    pub fn new() -> Self {
        Self {
            index: RwLock::new(ContainerIndex {
                next_id: 1,
                ..Default::default()
            }),
        }
    }

    /// Create a new enabled container.
    pub fn create(&self, name: &str) -> Result<Container> {
        let mut index = self.index.write();

        if index.name_to_id.contains_key(name) {
            return Err(FeedError::ContainerExists(name.to_string()));
        }

        let id = ContainerId(index.next_id);
        index.next_id += 1;

        let now = Timestamp::now();
        let container = Container {
            id,
            name: name.to_string(),
            status: ContainerStatus::Enabled,
            created_at: now,
            updated_at: now,
        };

        index.containers.insert(id, container.clone());
        index.name_to_id.insert(name.to_string(), id);

        Ok(container)
    }

    /// Get a container by id.
    pub fn get(&self, id: ContainerId) -> Option<Container> {
        self.index.read().containers.get(&id).cloned()
    }

    /// Get a container by name.
    pub fn get_by_name(&self, name: &str) -> Option<Container> {
        let index = self.index.read();
        let id = index.name_to_id.get(name)?;
        index.containers.get(id).cloned()
    }

    /// Change a container's lifecycle state.
    pub fn set_status(&self, id: ContainerId, status: ContainerStatus) -> Result<Container> {
        let mut index = self.index.write();
        let container = index
            .containers
            .get_mut(&id)
            .ok_or(FeedError::InvalidContainer(id))?;
        container.status = status;
        Ok(container.clone())
    }

    /// Bump the container's modification timestamp. The timestamp never
    /// moves backwards even when a write carries an older record time.
    pub fn touch(&self, id: ContainerId, at: Timestamp) -> Result<Timestamp> {
        let mut index = self.index.write();
        let container = index
            .containers
            .get_mut(&id)
            .ok_or(FeedError::InvalidContainer(id))?;
        if at > container.updated_at {
            container.updated_at = at;
        }
        Ok(container.updated_at)
    }

    /// The container, if it exists and accepts writes.
    pub fn writable(&self, id: ContainerId) -> Result<Container> {
        let container = self.get(id).ok_or(FeedError::InvalidContainer(id))?;
        if !container.status.accepts_writes() {
            return Err(FeedError::InvalidContainer(id));
        }
        Ok(container)
    }

    /// The container, if it exists. Reads are allowed in every lifecycle
    /// state.
    pub fn require(&self, id: ContainerId) -> Result<Container> {
        self.get(id).ok_or(FeedError::InvalidContainer(id))
    }

    /// List all containers.
    pub fn list(&self) -> Vec<Container> {
        let mut all: Vec<Container> = self.index.read().containers.values().cloned().collect();
        all.sort_by_key(|c| c.id.0);
        all
    }

    pub fn count(&self) -> usize {
        self.index.read().containers.len()
    }
}

impl Default for ContainerManager {
    fn default() -> Self {
        Self::new()
    }
}
