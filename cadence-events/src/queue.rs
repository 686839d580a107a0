//! Priority-ordered pending event buffer.

use crate::event::{Event, Priority};
use std::collections::VecDeque;
use std::sync::Arc;

/// Pending events, one FIFO tier per priority.
///
/// `dequeue` always yields the oldest event of the most urgent non-empty
/// tier. The queue itself is unbounded; backpressure is reported by the
/// health check, never enforced here.
#[derive(Debug, Default)]
pub struct PriorityQueue {
    tiers: [VecDeque<Arc<Event>>; 4],
    len: usize,
}

impl PriorityQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert behind every queued event of the same priority.
    pub fn enqueue(&mut self, event: Arc<Event>) {
        self.tiers[event.priority.rank()].push_back(event);
        self.len += 1;
    }

    /// Remove the next event to process.
    pub fn dequeue(&mut self) -> Option<Arc<Event>> {
        let event = self.tiers.iter_mut().find_map(VecDeque::pop_front)?;
        self.len -= 1;
        Some(event)
    }

    /// Remove up to `max` events in dequeue order.
    pub fn drain(&mut self, max: usize) -> Vec<Arc<Event>> {
        let mut batch = Vec::with_capacity(max.min(self.len));
        while batch.len() < max {
            match self.dequeue() {
                Some(event) => batch.push(event),
                None => break,
            }
        }
        batch
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Number of events queued at one priority.
    pub fn len_at(&self, priority: Priority) -> usize {
        self.tiers[priority.rank()].len()
    }

    /// Drop every pending event, returning how many were dropped.
    pub fn clear(&mut self) -> usize {
        let dropped = self.len;
        self.tiers.iter_mut().for_each(VecDeque::clear);
        self.len = 0;
        dropped
    }
}
