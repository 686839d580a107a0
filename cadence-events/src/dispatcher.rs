//! Batch dispatch of queued events to their handlers.

use crate::event::Event;
use crate::queue::PriorityQueue;
use crate::registry::HandlerRegistry;
use crate::result::{BatchReport, EventResult};
use crate::retry::RetryExecutor;
use futures::future::join_all;
use parking_lot::Mutex;
use std::sync::Arc;
use tracing::{debug, trace};

/// Drains the queue in batches and fans each event out to its handlers.
///
/// Events in a batch run concurrently with each other, and so do the
/// handlers of one event. A dequeued event is never requeued.
#[derive(Debug, Clone)]
pub struct Dispatcher {
    queue: Arc<Mutex<PriorityQueue>>,
    registry: Arc<HandlerRegistry>,
    executor: RetryExecutor,
    batch_size: usize,
}

impl Dispatcher {
    pub fn new(
        queue: Arc<Mutex<PriorityQueue>>,
        registry: Arc<HandlerRegistry>,
        executor: RetryExecutor,
        batch_size: usize,
    ) -> Self {
        Self {
            queue,
            registry,
            executor,
            batch_size,
        }
    }

    pub fn batch_size(&self) -> usize {
        self.batch_size
    }

    /// Take up to `batch_size` events and process them to completion.
    pub async fn tick(&self) -> BatchReport {
        let batch = self.queue.lock().drain(self.batch_size);
        if batch.is_empty() {
            return BatchReport::default();
        }

        let events = batch.len();
        trace!(events, "Dispatching batch");

        let results: Vec<EventResult> = join_all(batch.into_iter().map(|event| self.process(event)))
            .await
            .into_iter()
            .flatten()
            .collect();

        BatchReport { events, results }
    }

    /// Run every applicable handler for one event.
    pub async fn process(&self, event: Arc<Event>) -> Vec<EventResult> {
        let handlers = self.registry.resolve(&event);
        if handlers.is_empty() {
            trace!(event_id = %event.id, event_type = %event.event_type, "No handlers for event");
            return Vec::new();
        }

        debug!(
            event_id = %event.id,
            event_type = %event.event_type,
            handlers = handlers.len(),
            "Processing event"
        );

        join_all(
            handlers
                .into_iter()
                .map(|handler| self.executor.execute(Arc::clone(&event), handler)),
        )
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::HandlerError;
    use crate::event::{EmitOptions, EventType, Priority};
    use crate::handler::{EventHandler, Handler, HandlerOptions, handler_fn};
    use crate::retry::BackoffStrategy;
    use serde_json::{Value, json};
    use std::time::Duration;

    fn setup(batch_size: usize) -> (Arc<Mutex<PriorityQueue>>, Arc<HandlerRegistry>, Dispatcher) {
        let queue = Arc::new(Mutex::new(PriorityQueue::new()));
        let registry = Arc::new(HandlerRegistry::new());
        let dispatcher = Dispatcher::new(
            Arc::clone(&queue),
            Arc::clone(&registry),
            RetryExecutor::new(BackoffStrategy::None),
            batch_size,
        );
        (queue, registry, dispatcher)
    }

    fn register(
        registry: &HandlerRegistry,
        id: &str,
        event_type: Option<EventType>,
        callable: impl EventHandler,
        retries: u32,
    ) {
        let handler = Handler::new(
            event_type,
            Arc::new(callable),
            HandlerOptions::new().with_id(id).with_retries(retries),
            3,
            Duration::from_secs(5),
        )
        .unwrap();
        registry.register(handler).unwrap();
    }

    fn push(queue: &Mutex<PriorityQueue>, event_type: EventType, priority: Priority) {
        queue.lock().enqueue(Arc::new(Event::new(
            event_type,
            None,
            EmitOptions::new().with_priority(priority),
        )));
    }

    #[tokio::test]
    async fn test_one_result_per_applicable_handler() {
        let (queue, registry, dispatcher) = setup(50);
        for id in ["a", "b", "c"] {
            register(
                &registry,
                id,
                Some(EventType::UserLogin),
                handler_fn(|_e| async { Ok(json!(true)) }),
                1,
            );
        }
        register(
            &registry,
            "other",
            Some(EventType::UserLogout),
            handler_fn(|_e| async { Ok(Value::Null) }),
            1,
        );

        push(&queue, EventType::UserLogin, Priority::Normal);
        let report = dispatcher.tick().await;

        assert_eq!(report.events, 1);
        assert_eq!(report.results.len(), 3);
        assert!(report.results.iter().all(|r| r.success));
        assert!(queue.lock().is_empty());
    }

    #[tokio::test]
    async fn test_failure_does_not_abort_siblings() {
        let (queue, registry, dispatcher) = setup(50);
        register(
            &registry,
            "bad",
            Some(EventType::DbQueryError),
            handler_fn(|_e| async { Err::<Value, _>(HandlerError::failed("nope")) }),
            2,
        );
        register(
            &registry,
            "good",
            None,
            handler_fn(|_e| async { Ok(json!("fine")) }),
            1,
        );

        push(&queue, EventType::DbQueryError, Priority::High);
        let report = dispatcher.tick().await;

        assert_eq!(report.results.len(), 2);
        assert_eq!(report.failure_count(), 1);
        let bad = report.failures().next().unwrap();
        assert_eq!(bad.handler_id.as_str(), "bad");
        assert_eq!(bad.attempts, 2);
    }

    #[tokio::test]
    async fn test_batch_size_bounds_each_tick() {
        let (queue, _registry, dispatcher) = setup(2);
        for _ in 0..5 {
            push(&queue, EventType::DevTestRun, Priority::Low);
        }

        assert_eq!(dispatcher.tick().await.events, 2);
        assert_eq!(dispatcher.tick().await.events, 2);
        assert_eq!(dispatcher.tick().await.events, 1);
        assert!(dispatcher.tick().await.is_empty());
    }

    #[tokio::test]
    async fn test_event_without_handlers_is_consumed() {
        let (queue, _registry, dispatcher) = setup(10);
        push(&queue, EventType::UiThemeChange, Priority::Normal);

        let report = dispatcher.tick().await;
        assert_eq!(report.events, 1);
        assert!(report.results.is_empty());
        assert!(queue.lock().is_empty());
    }
}
