//! Named content transformers.
//!
//! Outgoing entries pass through a registry of transformers fixed at
//! composition time. Surrounding systems hang their own presentation
//! concerns here (author decoration, key-event formatting) instead of
//! patching the core with ambient callbacks.

use crate::types::EntryEvent;

/// A transformation applied to every outgoing entry event.
pub trait EntryTransform: Send + Sync {
    fn apply(&self, event: &mut EntryEvent);
}

impl<F> EntryTransform for F
where
    F: Fn(&mut EntryEvent) + Send + Sync,
{
    fn apply(&self, event: &mut EntryEvent) {
        self(event)
    }
}

/// Registry of named transformers, applied in registration order.
#[derive(Default)]
pub struct TransformRegistry {
    transforms: Vec<(String, Box<dyn EntryTransform>)>,
}

impl TransformRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a transformer under a name. Later registrations run after
    /// earlier ones.
    pub fn register(&mut self, name: impl Into<String>, transform: Box<dyn EntryTransform>) {
        self.transforms.push((name.into(), transform));
    }

    /// Registered transformer names, in application order.
    pub fn names(&self) -> Vec<&str> {
        self.transforms.iter().map(|(name, _)| name.as_str()).collect()
    }

    pub fn is_empty(&self) -> bool {
        self.transforms.is_empty()
    }

    /// Run every transformer over the event.
    pub fn apply(&self, event: &mut EntryEvent) {
        for (_, transform) in &self.transforms {
            transform.apply(event);
        }
    }
}
