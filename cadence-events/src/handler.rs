//! Handler traits and registration records

use crate::error::{EventError, HandlerError, Result};
use crate::event::{Event, EventType, Priority};
use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::fmt;
use std::future::Future;
use std::marker::PhantomData;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;
use tracing::warn;
use uuid::Uuid;

/// What a handler invocation produces.
pub type HandlerOutput = std::result::Result<Value, HandlerError>;

/// Predicate deciding whether a handler sees an event.
pub type EventFilter = Arc<dyn Fn(&Event) -> bool + Send + Sync>;

/// Event handler trait
///
/// Handlers may be invoked several times for the same event when an
/// attempt fails or times out.
#[async_trait]
pub trait EventHandler: Send + Sync + 'static {
    /// Handle the event
    async fn handle(&self, event: Arc<Event>) -> HandlerOutput;
}

/// Adapter turning an async closure into an [`EventHandler`].
pub struct FnHandler<F> {
    f: F,
}

/// Wrap an async closure as a handler.
///
/// ```rust,ignore
/// system.on(EventType::UserLogin, handler_fn(|event| async move {
///     println!("login from {}", event.source);
///     Ok(Value::Null)
/// }), HandlerOptions::default())?;
/// ```
pub fn handler_fn<F, Fut>(f: F) -> FnHandler<F>
where
    F: Fn(Arc<Event>) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = HandlerOutput> + Send + 'static,
{
    FnHandler { f }
}

#[async_trait]
impl<F, Fut> EventHandler for FnHandler<F>
where
    F: Fn(Arc<Event>) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = HandlerOutput> + Send + 'static,
{
    async fn handle(&self, event: Arc<Event>) -> HandlerOutput {
        (self.f)(event).await
    }
}

/// Handler receiving the decoded payload instead of the raw event.
///
/// A payload that does not decode into `T` fails the attempt with
/// [`HandlerError::Payload`].
pub struct TypedHandler<T, F> {
    f: F,
    _phantom: PhantomData<fn() -> T>,
}

/// Wrap an async closure taking a typed payload.
pub fn typed_handler<T, F, Fut>(f: F) -> TypedHandler<T, F>
where
    T: DeserializeOwned + Send + 'static,
    F: Fn(T) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = HandlerOutput> + Send + 'static,
{
    TypedHandler {
        f,
        _phantom: PhantomData,
    }
}

#[async_trait]
impl<T, F, Fut> EventHandler for TypedHandler<T, F>
where
    T: DeserializeOwned + Send + 'static,
    F: Fn(T) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = HandlerOutput> + Send + 'static,
{
    async fn handle(&self, event: Arc<Event>) -> HandlerOutput {
        let payload: T = event.payload()?;
        (self.f)(payload).await
    }
}

/// Handler identifier, caller-supplied or generated.
#[derive(Debug, Clone, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(transparent)]
pub struct HandlerId(pub String);

impl HandlerId {
    pub fn generate() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for HandlerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for HandlerId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

impl From<String> for HandlerId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

/// Registration options for [`on`](crate::EventSystem::on).
///
/// Unset retries and timeout fall back to the system defaults.
#[derive(Clone, Default)]
pub struct HandlerOptions {
    pub id: Option<HandlerId>,
    pub priority: Priority,
    pub disabled: bool,
    pub retries: Option<u32>,
    pub timeout: Option<Duration>,
    pub filter: Option<EventFilter>,
}

impl HandlerOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_id(mut self, id: impl Into<HandlerId>) -> Self {
        self.id = Some(id.into());
        self
    }

    pub fn with_priority(mut self, priority: Priority) -> Self {
        self.priority = priority;
        self
    }

    pub fn enabled(mut self, enabled: bool) -> Self {
        self.disabled = !enabled;
        self
    }

    /// Maximum attempts, including the first.
    pub fn with_retries(mut self, retries: u32) -> Self {
        self.retries = Some(retries);
        self
    }

    /// Per-attempt time budget.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    pub fn with_filter<F>(mut self, filter: F) -> Self
    where
        F: Fn(&Event) -> bool + Send + Sync + 'static,
    {
        self.filter = Some(Arc::new(filter));
        self
    }
}

impl fmt::Debug for HandlerOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HandlerOptions")
            .field("id", &self.id)
            .field("priority", &self.priority)
            .field("disabled", &self.disabled)
            .field("retries", &self.retries)
            .field("timeout", &self.timeout)
            .field("filter", &self.filter.is_some())
            .finish()
    }
}

/// A registered handler.
pub struct Handler {
    pub id: HandlerId,
    /// `None` for handlers that see every event.
    pub event_type: Option<EventType>,
    /// Informational; does not affect scheduling.
    pub priority: Priority,
    pub retries: u32,
    pub timeout: Duration,
    enabled: AtomicBool,
    filter: Option<EventFilter>,
    callable: Arc<dyn EventHandler>,
}

impl Handler {
    /// Build a registration, filling unset options from the defaults.
    pub fn new(
        event_type: Option<EventType>,
        callable: Arc<dyn EventHandler>,
        options: HandlerOptions,
        default_retries: u32,
        default_timeout: Duration,
    ) -> Result<Self> {
        let id = options.id.unwrap_or_else(HandlerId::generate);
        let retries = options.retries.unwrap_or(default_retries);
        let timeout = options.timeout.unwrap_or(default_timeout);

        if retries == 0 {
            return Err(EventError::InvalidHandler(format!(
                "handler {} must allow at least one attempt",
                id
            )));
        }
        if timeout.is_zero() {
            return Err(EventError::InvalidHandler(format!(
                "handler {} needs a non-zero timeout",
                id
            )));
        }

        Ok(Self {
            id,
            event_type,
            priority: options.priority,
            retries,
            timeout,
            enabled: AtomicBool::new(!options.disabled),
            filter: options.filter,
            callable,
        })
    }

    pub fn is_global(&self) -> bool {
        self.event_type.is_none()
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled.load(Ordering::Acquire)
    }

    pub fn set_enabled(&self, enabled: bool) {
        self.enabled.store(enabled, Ordering::Release);
    }

    /// Enabled and accepted by the filter, if any.
    ///
    /// A filter that panics rejects the event.
    pub fn accepts(&self, event: &Event) -> bool {
        if !self.is_enabled() {
            return false;
        }
        let Some(filter) = self.filter.as_ref() else {
            return true;
        };

        match panic::catch_unwind(AssertUnwindSafe(|| filter(event))) {
            Ok(accepted) => accepted,
            Err(_) => {
                warn!(
                    handler_id = %self.id,
                    event_id = %event.id,
                    event_type = %event.event_type,
                    "Handler filter panicked, skipping handler"
                );
                false
            }
        }
    }

    pub(crate) fn callable(&self) -> Arc<dyn EventHandler> {
        Arc::clone(&self.callable)
    }
}

impl fmt::Debug for Handler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Handler")
            .field("id", &self.id)
            .field("event_type", &self.event_type)
            .field("priority", &self.priority)
            .field("enabled", &self.is_enabled())
            .field("retries", &self.retries)
            .field("timeout", &self.timeout)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event::EmitOptions;
    use serde::Deserialize;
    use serde_json::json;

    fn noop() -> Arc<dyn EventHandler> {
        Arc::new(handler_fn(|_event| async { Ok(Value::Null) }))
    }

    #[test]
    fn test_defaults_fill_unset_options() {
        let handler = Handler::new(
            Some(EventType::UserLogin),
            noop(),
            HandlerOptions::default(),
            3,
            Duration::from_secs(5),
        )
        .unwrap();

        assert_eq!(handler.retries, 3);
        assert_eq!(handler.timeout, Duration::from_secs(5));
        assert!(handler.is_enabled());
        assert!(!handler.is_global());
        assert!(!handler.id.as_str().is_empty());
    }

    #[test]
    fn test_zero_retries_rejected() {
        let result = Handler::new(
            None,
            noop(),
            HandlerOptions::new().with_retries(0),
            3,
            Duration::from_secs(5),
        );
        assert!(matches!(result, Err(EventError::InvalidHandler(_))));
    }

    #[test]
    fn test_zero_timeout_rejected() {
        let result = Handler::new(
            None,
            noop(),
            HandlerOptions::new().with_timeout(Duration::ZERO),
            3,
            Duration::from_secs(5),
        );
        assert!(matches!(result, Err(EventError::InvalidHandler(_))));
    }

    #[test]
    fn test_accepts_respects_enabled_and_filter() {
        let handler = Handler::new(
            None,
            noop(),
            HandlerOptions::new()
                .with_id("vip")
                .with_filter(|event| event.user_id.as_deref() == Some("vip")),
            3,
            Duration::from_secs(5),
        )
        .unwrap();

        let vip = Event::new(
            EventType::UserAction,
            None,
            EmitOptions::new().with_user_id("vip"),
        );
        let other = Event::new(EventType::UserAction, None, EmitOptions::default());

        assert!(handler.accepts(&vip));
        assert!(!handler.accepts(&other));

        handler.set_enabled(false);
        assert!(!handler.accepts(&vip));
    }

    #[test]
    fn test_panicking_filter_rejects_event() {
        let handler = Handler::new(
            Some(EventType::DevTestRun),
            noop(),
            HandlerOptions::new().with_filter(|event| {
                if event.data.is_none() {
                    panic!("filter expects a payload");
                }
                true
            }),
            3,
            Duration::from_secs(5),
        )
        .unwrap();

        let bare = Event::new(EventType::DevTestRun, None, EmitOptions::default());
        let with_data = Event::new(
            EventType::DevTestRun,
            Some(json!({"suite": "unit"})),
            EmitOptions::default(),
        );

        assert!(!handler.accepts(&bare));
        // the handler stays usable after its filter panicked
        assert!(handler.accepts(&with_data));
        assert!(handler.is_enabled());
    }

    #[tokio::test]
    async fn test_typed_handler_decodes_payload() {
        #[derive(Deserialize)]
        struct Job {
            job_id: String,
        }

        let handler = typed_handler(|job: Job| async move { Ok(json!(job.job_id)) });

        let event = Arc::new(Event::new(
            EventType::ComputeJobStarted,
            Some(json!({"job_id": "j-1"})),
            EmitOptions::default(),
        ));
        assert_eq!(handler.handle(event).await.unwrap(), json!("j-1"));

        let bad = Arc::new(Event::new(
            EventType::ComputeJobStarted,
            Some(json!({"other": 1})),
            EmitOptions::default(),
        ));
        assert!(matches!(
            handler.handle(bad).await,
            Err(HandlerError::Payload(_))
        ));
    }
}
