//! The event system facade.
//!
//! [`EventSystem`] owns the queue, the handler registry, the dispatch loop
//! and the statistics. It is a cheap handle: clones share the same system,
//! so a handler can hold one and emit follow-up events.
//!
//! ```rust,no_run
//! use cadence_events::prelude::*;
//! use serde_json::{Value, json};
//!
//! # #[tokio::main]
//! # async fn main() -> cadence_events::Result<()> {
//! let events = EventSystem::new();
//!
//! events.on(
//!     EventType::UserLogin,
//!     handler_fn(|event| async move {
//!         tracing::info!(user = ?event.user_id, "user logged in");
//!         Ok(Value::Null)
//!     }),
//!     HandlerOptions::default(),
//! )?;
//!
//! events.start();
//! events.emit(EventType::UserLogin, json!({"name": "alice"}), EmitOptions::new().with_user_id("u-1"));
//! events.stop().await;
//! # Ok(())
//! # }
//! ```

use crate::dispatcher::Dispatcher;
use crate::emitters::{ApiEvents, ComputeEvents, UiEvents};
use crate::error::Result;
use crate::event::{EmitOptions, Event, EventId, EventType, Priority};
use crate::handler::{EventHandler, Handler, HandlerId, HandlerOptions, HandlerOutput, typed_handler};
use crate::queue::PriorityQueue;
use crate::registry::HandlerRegistry;
use crate::result::{BatchReport, EventResult};
use crate::retry::{BackoffStrategy, RetryExecutor};
use crate::stats::{EventStats, StatsCollector};
use cadence_config::{EventSystemConfig, Validate};
use parking_lot::Mutex;
use serde::de::DeserializeOwned;
use serde_json::{Value, json};
use std::fmt;
use std::future::Future;
use std::sync::{Arc, Weak};
use std::time::Duration;
use tokio::sync::{broadcast, watch};
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior, interval_at};
use tracing::{debug, info, trace, warn};

/// Source recorded on events the system emits about its own failures.
pub const FAILURE_SOURCE: &str = "event-system";

/// In-process event system.
#[derive(Clone)]
pub struct EventSystem {
    inner: Arc<Inner>,
}

struct Inner {
    config: EventSystemConfig,
    queue: Arc<Mutex<PriorityQueue>>,
    registry: Arc<HandlerRegistry>,
    dispatcher: Dispatcher,
    stats: StatsCollector,
    results: broadcast::Sender<EventResult>,
    lifecycle: Mutex<Option<Lifecycle>>,
}

/// Handles of a running dispatch loop. Present exactly while running.
struct Lifecycle {
    shutdown: watch::Sender<bool>,
    handle: JoinHandle<()>,
}

impl EventSystem {
    /// Create a stopped system with default settings.
    pub fn new() -> Self {
        let config = EventSystemConfig::default();
        let backoff = default_backoff(&config);
        Self::from_parts(config, backoff)
    }

    /// Create a stopped system from validated settings.
    pub fn from_config(config: EventSystemConfig) -> Result<Self> {
        config.validate()?;
        let backoff = default_backoff(&config);
        Ok(Self::from_parts(config, backoff))
    }

    pub fn builder() -> EventSystemBuilder {
        EventSystemBuilder::new()
    }

    fn from_parts(config: EventSystemConfig, backoff: BackoffStrategy) -> Self {
        let queue = Arc::new(Mutex::new(PriorityQueue::new()));
        let registry = Arc::new(HandlerRegistry::new());
        let dispatcher = Dispatcher::new(
            Arc::clone(&queue),
            Arc::clone(&registry),
            RetryExecutor::new(backoff),
            config.batch_size,
        );
        let (results, _) = broadcast::channel(config.result_channel_capacity);

        debug!(
            tick_interval = ?config.tick_interval(),
            batch_size = config.batch_size,
            max_queue_size = config.max_queue_size,
            "Event system created"
        );

        Self {
            inner: Arc::new(Inner {
                config,
                queue,
                registry,
                dispatcher,
                stats: StatsCollector::new(),
                results,
                lifecycle: Mutex::new(None),
            }),
        }
    }

    // ------------------------------------------------------------------
    // Lifecycle
    // ------------------------------------------------------------------

    /// Start the dispatch loop.
    ///
    /// Does nothing if already running. Must be called from within a Tokio
    /// runtime.
    pub fn start(&self) {
        let mut lifecycle = self.inner.lifecycle.lock();
        if lifecycle.is_some() {
            debug!("Event system already running");
            return;
        }

        self.inner.stats.reset();

        let (shutdown, shutdown_rx) = watch::channel(false);
        let handle = tokio::spawn(run_loop(
            Arc::downgrade(&self.inner),
            self.inner.config.tick_interval(),
            shutdown_rx,
        ));
        *lifecycle = Some(Lifecycle { shutdown, handle });
        drop(lifecycle);

        let handlers = self.handler_count();
        info!(handlers, "Event system started");
        self.emit(
            EventType::SystemStartup,
            json!({ "handlers": handlers }),
            EmitOptions::default(),
        );
    }

    /// Stop the dispatch loop, letting an in-flight tick finish.
    ///
    /// Does nothing if not running. Events still queued stay queued. The
    /// system reports stopped as soon as this is called; a `start` issued
    /// while the old loop drains brings up a fresh loop.
    pub async fn stop(&self) {
        let (Lifecycle { shutdown, handle }, uptime) = {
            let mut lifecycle = self.inner.lifecycle.lock();
            let Some(taken) = lifecycle.take() else {
                debug!("Event system not running");
                return;
            };
            (taken, self.inner.stats.freeze())
        };

        let _ = shutdown.send(true);
        if let Err(err) = handle.await {
            warn!(error = %err, "Dispatch loop ended abnormally");
        }

        let total_events = self.inner.stats.total_events();
        self.emit(
            EventType::SystemShutdown,
            json!({
                "uptime": uptime.as_millis() as u64,
                "totalEvents": total_events,
            }),
            EmitOptions::default(),
        );

        info!(uptime = ?uptime, total_events, "Event system stopped");
    }

    pub fn is_running(&self) -> bool {
        self.inner.lifecycle.lock().is_some()
    }

    // ------------------------------------------------------------------
    // Emitting
    // ------------------------------------------------------------------

    /// Queue an event. Never blocks on handlers.
    pub fn emit(
        &self,
        event_type: EventType,
        data: impl Into<Option<Value>>,
        options: EmitOptions,
    ) -> EventId {
        self.emit_event(Event::new(event_type, data.into(), options))
    }

    /// Queue a fully built event.
    pub fn emit_event(&self, event: Event) -> EventId {
        let id = event.id;
        trace!(
            event_id = %id,
            event_type = %event.event_type,
            priority = %event.priority,
            "Event queued"
        );
        self.inner.queue.lock().enqueue(Arc::new(event));
        id
    }

    /// Queue an event by its wire name, e.g. `"user.login"`.
    pub fn emit_named(
        &self,
        event_type: &str,
        data: impl Into<Option<Value>>,
        options: EmitOptions,
    ) -> Result<EventId> {
        let event_type: EventType = event_type.parse()?;
        Ok(self.emit(event_type, data, options))
    }

    // ------------------------------------------------------------------
    // Handlers
    // ------------------------------------------------------------------

    /// Register a handler for one event type.
    pub fn on<H: EventHandler>(
        &self,
        event_type: EventType,
        handler: H,
        options: HandlerOptions,
    ) -> Result<HandlerId> {
        self.register(Some(event_type), Arc::new(handler), options)
    }

    /// Register a handler for every event type.
    pub fn on_all<H: EventHandler>(&self, handler: H, options: HandlerOptions) -> Result<HandlerId> {
        self.register(None, Arc::new(handler), options)
    }

    /// Register a handler that receives the payload decoded as `T`.
    pub fn on_typed<T, F, Fut>(
        &self,
        event_type: EventType,
        f: F,
        options: HandlerOptions,
    ) -> Result<HandlerId>
    where
        T: DeserializeOwned + Send + 'static,
        F: Fn(T) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = HandlerOutput> + Send + 'static,
    {
        self.on(event_type, typed_handler(f), options)
    }

    /// Remove a handler. Returns whether it was registered.
    pub fn off(&self, id: &HandlerId) -> bool {
        self.inner.registry.unregister(id)
    }

    /// Enable or disable a handler in place. Returns `false` for an unknown id.
    pub fn set_handler_enabled(&self, id: &HandlerId, enabled: bool) -> bool {
        self.inner.registry.set_enabled(id, enabled)
    }

    pub fn handler_count(&self) -> usize {
        self.inner.registry.len()
    }

    fn register(
        &self,
        event_type: Option<EventType>,
        callable: Arc<dyn EventHandler>,
        options: HandlerOptions,
    ) -> Result<HandlerId> {
        let config = &self.inner.config;
        let handler = Handler::new(
            event_type,
            callable,
            options,
            config.default_retries,
            config.default_timeout(),
        )?;
        self.inner.registry.register(handler)
    }

    // ------------------------------------------------------------------
    // Introspection
    // ------------------------------------------------------------------

    /// Probe liveness and backpressure.
    ///
    /// Queues a `system.health_check` event, waits the configured delay and
    /// reports healthy when running with fewer than `max_queue_size` events
    /// pending.
    pub async fn health_check(&self) -> bool {
        self.emit(EventType::SystemHealthCheck, None, EmitOptions::default());
        tokio::time::sleep(self.inner.config.health_check_delay()).await;

        let queue_size = self.queue_size();
        let healthy = self.is_running() && queue_size < self.inner.config.max_queue_size;
        debug!(healthy, queue_size, "Health check");
        healthy
    }

    pub fn stats(&self) -> EventStats {
        self.inner.stats.snapshot(self.queue_size(), self.handler_count())
    }

    pub fn queue_size(&self) -> usize {
        self.inner.queue.lock().len()
    }

    /// Drop every pending event, returning how many were dropped.
    pub fn clear_queue(&self) -> usize {
        let dropped = self.inner.queue.lock().clear();
        if dropped > 0 {
            warn!(dropped, "Cleared pending events");
        }
        dropped
    }

    /// Receive every handler outcome produced from now on.
    ///
    /// A receiver that falls behind by more than `result_channel_capacity`
    /// results loses the oldest ones.
    pub fn subscribe_results(&self) -> broadcast::Receiver<EventResult> {
        self.inner.results.subscribe()
    }

    pub fn config(&self) -> &EventSystemConfig {
        &self.inner.config
    }

    /// Run one dispatch tick now, whether or not the loop is running.
    pub async fn dispatch_once(&self) -> BatchReport {
        self.inner.tick().await
    }

    // ------------------------------------------------------------------
    // Namespaced emitters
    // ------------------------------------------------------------------

    pub fn compute(&self) -> ComputeEvents<'_> {
        ComputeEvents::new(self)
    }

    pub fn ui(&self) -> UiEvents<'_> {
        UiEvents::new(self)
    }

    pub fn api(&self) -> ApiEvents<'_> {
        ApiEvents::new(self)
    }
}

impl Default for EventSystem {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for EventSystem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventSystem")
            .field("running", &self.is_running())
            .field("queue_size", &self.queue_size())
            .field("handlers", &self.handler_count())
            .finish()
    }
}

impl Inner {
    async fn tick(&self) -> BatchReport {
        let report = self.dispatcher.tick().await;
        if report.is_empty() {
            return report;
        }

        self.stats.record(&report);

        if self.results.receiver_count() > 0 {
            for result in &report.results {
                let _ = self.results.send(result.clone());
            }
        }

        if self.config.report_failures {
            self.report_failures(&report);
        }

        report
    }

    /// Queue a `system.error` event per failed result.
    ///
    /// Failures of `system.error` handlers are not reported.
    fn report_failures(&self, report: &BatchReport) {
        let mut queue = self.queue.lock();
        for failure in report
            .failures()
            .filter(|r| r.event_type != EventType::SystemError)
        {
            let event = Event::new(
                EventType::SystemError,
                Some(json!({
                    "eventId": failure.event_id,
                    "eventType": failure.event_type,
                    "handlerId": failure.handler_id,
                    "error": failure.error,
                    "attempts": failure.attempts,
                })),
                EmitOptions::new()
                    .with_priority(Priority::High)
                    .with_source(FAILURE_SOURCE)
                    .with_correlation_id(failure.event_id.to_string()),
            );
            queue.enqueue(Arc::new(event));
        }
    }
}

async fn run_loop(inner: Weak<Inner>, period: Duration, mut shutdown: watch::Receiver<bool>) {
    let mut ticker = interval_at(Instant::now() + period, period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            _ = ticker.tick() => {
                let Some(inner) = inner.upgrade() else { break };
                let tick = tokio::spawn(async move {
                    inner.tick().await;
                });
                if let Err(err) = tick.await {
                    warn!(error = %err, "Dispatch tick failed");
                }
            }
            changed = shutdown.changed() => {
                if changed.is_err() || *shutdown.borrow() {
                    break;
                }
            }
        }
    }

    debug!("Dispatch loop exited");
}

fn default_backoff(config: &EventSystemConfig) -> BackoffStrategy {
    BackoffStrategy::exponential(config.backoff_base()).with_max(config.max_backoff())
}

/// Fluent construction of an [`EventSystem`].
///
/// ```rust
/// use cadence_events::EventSystem;
/// use std::time::Duration;
///
/// let events = EventSystem::builder()
///     .tick_interval(Duration::from_millis(5))
///     .batch_size(100)
///     .report_failures(true)
///     .build()?;
/// assert_eq!(events.config().batch_size, 100);
/// # Ok::<(), cadence_events::EventError>(())
/// ```
#[derive(Debug, Clone, Default)]
pub struct EventSystemBuilder {
    config: EventSystemConfig,
    backoff: Option<BackoffStrategy>,
}

impl EventSystemBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start from loaded settings.
    pub fn config(mut self, config: EventSystemConfig) -> Self {
        self.config = config;
        self
    }

    pub fn tick_interval(mut self, interval: Duration) -> Self {
        self.config.tick_interval_ms = interval.as_millis() as u64;
        self
    }

    pub fn batch_size(mut self, size: usize) -> Self {
        self.config.batch_size = size;
        self
    }

    pub fn max_queue_size(mut self, size: usize) -> Self {
        self.config.max_queue_size = size;
        self
    }

    pub fn health_check_delay(mut self, delay: Duration) -> Self {
        self.config.health_check_delay_ms = delay.as_millis() as u64;
        self
    }

    pub fn default_retries(mut self, retries: u32) -> Self {
        self.config.default_retries = retries;
        self
    }

    pub fn default_timeout(mut self, timeout: Duration) -> Self {
        self.config.default_timeout_ms = timeout.as_millis() as u64;
        self
    }

    /// Replace the exponential backoff derived from the settings.
    pub fn backoff(mut self, backoff: BackoffStrategy) -> Self {
        self.backoff = Some(backoff);
        self
    }

    pub fn report_failures(mut self, enabled: bool) -> Self {
        self.config.report_failures = enabled;
        self
    }

    pub fn result_channel_capacity(mut self, capacity: usize) -> Self {
        self.config.result_channel_capacity = capacity;
        self
    }

    pub fn build(self) -> Result<EventSystem> {
        self.config.validate()?;
        let backoff = self
            .backoff
            .unwrap_or_else(|| default_backoff(&self.config));
        Ok(EventSystem::from_parts(self.config, backoff))
    }
}
