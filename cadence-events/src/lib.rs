//! Prioritized in-process events for Cadence
//!
//! Producers emit events into a priority queue; a background loop drains it
//! in batches and fans each event out to every matching handler, with
//! per-handler timeouts and bounded retries.
//!
//! ## Features
//!
//! - **Priority queue** - Critical before high before normal before low, FIFO within a level
//! - **Typed and global handlers** - Subscribe to one event type or to all of them
//! - **Retries** - Per-attempt timeouts and exponential backoff
//! - **Observability** - Statistics, health checks and a result stream
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use cadence_events::prelude::*;
//! use serde_json::{Value, json};
//! use std::time::Duration;
//!
//! #[tokio::main]
//! async fn main() -> cadence_events::Result<()> {
//!     let events = EventSystem::new();
//!
//!     events.on(
//!         EventType::ComputeJobFailed,
//!         handler_fn(|event| async move {
//!             tracing::warn!(job = ?event.correlation_id, "job failed");
//!             Ok(Value::Null)
//!         }),
//!         HandlerOptions::new()
//!             .with_retries(2)
//!             .with_timeout(Duration::from_secs(1)),
//!     )?;
//!
//!     events.start();
//!     events.compute().job_failed(JobEvent::new("job-42").with_error("out of memory"));
//!
//!     assert!(events.health_check().await);
//!     println!("{:?}", events.stats());
//!     events.stop().await;
//!     Ok(())
//! }
//! ```
//!
//! ## Typed Payloads
//!
//! ```rust,ignore
//! #[derive(Deserialize)]
//! struct Login { name: String }
//!
//! events.on_typed(EventType::UserLogin, |login: Login| async move {
//!     Ok(json!(login.name))
//! }, HandlerOptions::default())?;
//! ```
//!
//! ## Observing Failures
//!
//! ```rust,ignore
//! let mut results = events.subscribe_results();
//! while let Ok(result) = results.recv().await {
//!     if !result.success {
//!         eprintln!("{} failed on {}: {:?}", result.handler_id, result.event_type, result.error);
//!     }
//! }
//! ```

pub mod dispatcher;
pub mod emitters;
pub mod error;
pub mod event;
pub mod handler;
pub mod queue;
pub mod registry;
pub mod result;
pub mod retry;
pub mod stats;
pub mod system;

pub use dispatcher::Dispatcher;
pub use emitters::{
    ApiEvents, ComputeEvents, ComputeSystemEvent, JobEvent, ResourceEvent, UiEvents,
};
pub use error::{EventError, HandlerError, Result};
pub use event::{EmitOptions, Event, EventDomain, EventId, EventType, Priority};
pub use handler::{
    EventFilter, EventHandler, FnHandler, Handler, HandlerId, HandlerOptions, HandlerOutput,
    TypedHandler, handler_fn, typed_handler,
};
pub use queue::PriorityQueue;
pub use registry::HandlerRegistry;
pub use result::{BatchReport, EventResult};
pub use retry::{BackoffStrategy, RetryExecutor};
pub use stats::{EventStats, StatsCollector};
pub use system::{EventSystem, EventSystemBuilder};

/// Everything needed to register handlers and emit events.
pub mod prelude {
    pub use crate::emitters::{ComputeSystemEvent, JobEvent, ResourceEvent};
    pub use crate::error::{EventError, HandlerError};
    pub use crate::event::{EmitOptions, Event, EventType, Priority};
    pub use crate::handler::{EventHandler, HandlerId, HandlerOptions, handler_fn, typed_handler};
    pub use crate::result::EventResult;
    pub use crate::system::EventSystem;
}
