//! Error types for the synchronization core.

use crate::types::{ContainerId, EntryId};
use thiserror::Error;

/// Main error type for feed operations.
#[derive(Debug, Error)]
pub enum FeedError {
    #[error("container not found or not accepting writes: {0}")]
    InvalidContainer(ContainerId),

    #[error("container already exists: {0}")]
    ContainerExists(String),

    #[error("entry not found: {0}")]
    NotFound(EntryId),

    #[error("invalid page number: {0}")]
    InvalidPage(u32),

    #[error("fetch exceeded its deadline")]
    Timeout,

    #[error("orphan cleanup incomplete for display entry {display}: {remaining} change records remain")]
    PartialOrphanFailure { display: EntryId, remaining: usize },

    #[error("storage error: {0}")]
    Storage(String),

    #[error("serialization error: {0}")]
    Serialization(String),

    #[error("deserialization error: {0}")]
    Deserialization(String),
}

impl From<serde_json::Error> for FeedError {
    fn from(e: serde_json::Error) -> Self {
        FeedError::Serialization(e.to_string())
    }
}

impl From<rmp_serde::encode::Error> for FeedError {
    fn from(e: rmp_serde::encode::Error) -> Self {
        FeedError::Serialization(e.to_string())
    }
}

impl From<rmp_serde::decode::Error> for FeedError {
    fn from(e: rmp_serde::decode::Error) -> Self {
        FeedError::Deserialization(e.to_string())
    }
}

/// Result type for feed operations.
pub type Result<T> = std::result::Result<T, FeedError>;
