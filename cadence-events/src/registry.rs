//! Handler registry
//!
//! Typed handlers live in per-type buckets; global handlers in a single
//! list. Registration order is preserved within each.

use crate::error::{EventError, Result};
use crate::event::{Event, EventType};
use crate::handler::{Handler, HandlerId};
use dashmap::DashMap;
use parking_lot::RwLock;
use std::sync::Arc;
use tracing::debug;

/// Registered handlers, keyed by event type.
///
/// The global write lock serializes registration and removal. Resolution
/// never holds the bucket map and the global list at the same time.
#[derive(Debug, Default)]
pub struct HandlerRegistry {
    buckets: DashMap<EventType, Vec<Arc<Handler>>>,
    global: RwLock<Vec<Arc<Handler>>>,
}

impl HandlerRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a handler. Ids must be unique across the registry.
    pub fn register(&self, handler: Handler) -> Result<HandlerId> {
        let mut global = self.global.write();

        if self.contains_locked(&global, &handler.id) {
            return Err(EventError::InvalidHandler(format!(
                "handler id {} is already registered",
                handler.id
            )));
        }

        let id = handler.id.clone();
        let handler = Arc::new(handler);

        match handler.event_type {
            Some(event_type) => {
                debug!(handler_id = %id, event_type = %event_type, "Registered handler");
                self.buckets.entry(event_type).or_default().push(handler);
            }
            None => {
                debug!(handler_id = %id, "Registered global handler");
                global.push(handler);
            }
        }

        Ok(id)
    }

    /// Remove a handler by id. Returns whether anything was removed.
    pub fn unregister(&self, id: &HandlerId) -> bool {
        let mut global = self.global.write();

        let owner = self
            .buckets
            .iter()
            .find(|bucket| bucket.iter().any(|h| &h.id == id))
            .map(|bucket| *bucket.key());

        if let Some(event_type) = owner {
            if let Some(mut bucket) = self.buckets.get_mut(&event_type) {
                bucket.retain(|h| &h.id != id);
            }
            self.buckets
                .remove_if(&event_type, |_, handlers| handlers.is_empty());
            debug!(handler_id = %id, event_type = %event_type, "Unregistered handler");
            return true;
        }

        if let Some(pos) = global.iter().position(|h| &h.id == id) {
            global.remove(pos);
            debug!(handler_id = %id, "Unregistered global handler");
            return true;
        }

        false
    }

    /// Handlers that should see `event`: typed first, then global, each in
    /// registration order, skipping disabled or filtered-out handlers.
    pub fn resolve(&self, event: &Event) -> Vec<Arc<Handler>> {
        let typed = self
            .buckets
            .get(&event.event_type)
            .map(|bucket| bucket.value().clone())
            .unwrap_or_default();

        let global = self.global.read().clone();

        typed
            .into_iter()
            .chain(global)
            .filter(|handler| handler.accepts(event))
            .collect()
    }

    /// Flip a handler's enabled flag. Returns `false` for an unknown id.
    pub fn set_enabled(&self, id: &HandlerId, enabled: bool) -> bool {
        match self.find(id) {
            Some(handler) => {
                handler.set_enabled(enabled);
                true
            }
            None => false,
        }
    }

    pub fn find(&self, id: &HandlerId) -> Option<Arc<Handler>> {
        let global = self.global.read();
        if let Some(handler) = global.iter().find(|h| &h.id == id) {
            return Some(Arc::clone(handler));
        }
        drop(global);

        self.buckets
            .iter()
            .find_map(|bucket| bucket.iter().find(|h| &h.id == id).cloned())
    }

    pub fn contains(&self, id: &HandlerId) -> bool {
        self.find(id).is_some()
    }

    /// Total registered handlers, typed and global.
    pub fn len(&self) -> usize {
        let typed: usize = self.buckets.iter().map(|bucket| bucket.len()).sum();
        typed + self.global.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Handlers registered for one type, excluding global handlers.
    pub fn count_for(&self, event_type: EventType) -> usize {
        self.buckets
            .get(&event_type)
            .map(|bucket| bucket.len())
            .unwrap_or(0)
    }

    pub fn global_count(&self) -> usize {
        self.global.read().len()
    }

    pub fn clear(&self) {
        let mut global = self.global.write();
        global.clear();
        self.buckets.clear();
    }

    fn contains_locked(&self, global: &[Arc<Handler>], id: &HandlerId) -> bool {
        global.iter().any(|h| &h.id == id)
            || self
                .buckets
                .iter()
                .any(|bucket| bucket.iter().any(|h| &h.id == id))
    }
}
