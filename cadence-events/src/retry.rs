//! Bounded retries with per-attempt timeouts.
//!
//! ## Example
//!
//! ```rust,ignore
//! let executor = RetryExecutor::new(BackoffStrategy::exponential(Duration::from_millis(100)));
//! let result = executor.execute(event, handler).await;
//! if !result.success {
//!     eprintln!("{} gave up after {} attempts", result.handler_id, result.attempts);
//! }
//! ```

use crate::error::HandlerError;
use crate::event::Event;
use crate::handler::Handler;
use crate::result::EventResult;
use chrono::Utc;
use std::any::Any;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;
use tracing::{debug, warn};

/// Delay between failed attempts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BackoffStrategy {
    /// Retry immediately.
    None,
    /// Same delay after every failure.
    Constant(Duration),
    /// `base × 2^attempt`, capped at `max`.
    Exponential {
        base: Duration,
        max: Duration,
    },
}

impl BackoffStrategy {
    pub fn constant(delay: Duration) -> Self {
        Self::Constant(delay)
    }

    /// Exponential backoff capped at 30 seconds.
    pub fn exponential(base: Duration) -> Self {
        Self::Exponential {
            base,
            max: Duration::from_secs(30),
        }
    }

    /// Set maximum delay.
    pub fn with_max(self, max: Duration) -> Self {
        match self {
            Self::Exponential { base, .. } => Self::Exponential { base, max },
            other => other,
        }
    }

    /// Delay after the given failed attempt (1-indexed).
    ///
    /// With a 100 ms base the sequence is 200, 400, 800 ms and so on.
    pub fn delay_for_attempt(&self, attempt: u32) -> Duration {
        match self {
            Self::None => Duration::ZERO,
            Self::Constant(delay) => *delay,
            Self::Exponential { base, max } => {
                let factor = 1u32.checked_shl(attempt).unwrap_or(u32::MAX);
                base.checked_mul(factor).unwrap_or(*max).min(*max)
            }
        }
    }
}

impl Default for BackoffStrategy {
    fn default() -> Self {
        Self::exponential(Duration::from_millis(100))
    }
}

/// Runs one handler against one event until it succeeds or runs out of attempts.
///
/// Each attempt is spawned so that a timed-out attempt can be aborted and a
/// panicking handler fails only its own attempt.
#[derive(Debug, Clone, Default)]
pub struct RetryExecutor {
    backoff: BackoffStrategy,
}

impl RetryExecutor {
    pub fn new(backoff: BackoffStrategy) -> Self {
        Self { backoff }
    }

    pub fn backoff(&self) -> BackoffStrategy {
        self.backoff
    }

    /// Execute `handler` for `event`. Never fails; the outcome is the result.
    pub async fn execute(&self, event: Arc<Event>, handler: Arc<Handler>) -> EventResult {
        let started = Instant::now();
        let mut last_error = HandlerError::failed("handler was never attempted");

        for attempt in 1..=handler.retries {
            match self.attempt(&event, &handler).await {
                Ok(value) => {
                    if attempt > 1 {
                        debug!(
                            event_id = %event.id,
                            handler_id = %handler.id,
                            attempt,
                            "Retry succeeded"
                        );
                    }
                    return EventResult {
                        event_id: event.id,
                        event_type: event.event_type,
                        handler_id: handler.id.clone(),
                        success: true,
                        processing_time: started.elapsed(),
                        error: None,
                        result: Some(value),
                        attempts: attempt,
                        timestamp: Utc::now(),
                    };
                }
                Err(err) => {
                    if attempt == handler.retries {
                        warn!(
                            event_id = %event.id,
                            event_type = %event.event_type,
                            handler_id = %handler.id,
                            attempts = attempt,
                            error = %err,
                            "Handler failed after all attempts"
                        );
                    } else {
                        let delay = self.backoff.delay_for_attempt(attempt);
                        debug!(
                            event_id = %event.id,
                            handler_id = %handler.id,
                            attempt,
                            delay = ?delay,
                            error = %err,
                            "Handler attempt failed, waiting before retry"
                        );
                        if !delay.is_zero() {
                            tokio::time::sleep(delay).await;
                        }
                    }
                    last_error = err;
                }
            }
        }

        EventResult {
            event_id: event.id,
            event_type: event.event_type,
            handler_id: handler.id.clone(),
            success: false,
            processing_time: started.elapsed(),
            error: Some(last_error.to_string()),
            result: None,
            attempts: handler.retries,
            timestamp: Utc::now(),
        }
    }

    async fn attempt(
        &self,
        event: &Arc<Event>,
        handler: &Handler,
    ) -> Result<serde_json::Value, HandlerError> {
        let callable = handler.callable();
        let event = Arc::clone(event);
        let mut task = tokio::spawn(async move { callable.handle(event).await });

        match tokio::time::timeout(handler.timeout, &mut task).await {
            Ok(Ok(outcome)) => outcome,
            Ok(Err(join_err)) if join_err.is_panic() => {
                Err(HandlerError::Panicked(panic_message(join_err.into_panic())))
            }
            Ok(Err(join_err)) => Err(HandlerError::failed(join_err.to_string())),
            Err(_) => {
                task.abort();
                Err(HandlerError::Timeout(handler.timeout))
            }
        }
    }
}

fn panic_message(payload: Box<dyn Any + Send>) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        message.to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "unknown panic".to_string()
    }
}
