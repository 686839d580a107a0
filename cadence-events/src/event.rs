//! Event definitions

use crate::error::EventError;
use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

/// Source recorded on events emitted without an explicit one.
pub const DEFAULT_SOURCE: &str = "system";

macro_rules! event_types {
    ($( $(#[$doc:meta])* $variant:ident => $name:literal ),+ $(,)?) => {
        /// The closed set of event types.
        ///
        /// Serializes as its dotted wire name (`compute.job_started`).
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
        pub enum EventType {
            $( $(#[$doc])* #[serde(rename = $name)] $variant, )+
        }

        impl EventType {
            /// Every event type, in declaration order.
            pub const ALL: &'static [EventType] = &[$(EventType::$variant),+];

            /// Dotted wire name.
            pub fn as_str(&self) -> &'static str {
                match self {
                    $(EventType::$variant => $name,)+
                }
            }
        }
    };
}

event_types! {
    SystemStartup => "system.startup",
    SystemShutdown => "system.shutdown",
    SystemError => "system.error",
    SystemHealthCheck => "system.health_check",

    UserLogin => "user.login",
    UserLogout => "user.logout",
    UserAction => "user.action",
    UserPreferenceChange => "user.preference_change",

    ComputeJobStarted => "compute.job_started",
    ComputeJobCompleted => "compute.job_completed",
    ComputeJobFailed => "compute.job_failed",
    ComputeJobQueued => "compute.job_queued",
    ComputeJobSubmitted => "compute.job_submitted",
    ComputeJobCancelled => "compute.job_cancelled",
    ComputeResourceAllocated => "compute.resource_allocated",
    ComputeResourceReleased => "compute.resource_released",
    ComputeResourceHighUsage => "compute.resource_high_usage",
    ComputeSystemStarted => "compute.system_started",
    ComputeSystemStopped => "compute.system_stopped",
    ComputeSystemOverload => "compute.system_overload",

    UiPageLoad => "ui.page_load",
    UiComponentRender => "ui.component_render",
    UiInteraction => "ui.interaction",
    UiThemeChange => "ui.theme_change",

    ApiRequestStart => "api.request_start",
    ApiRequestComplete => "api.request_complete",
    ApiRequestError => "api.request_error",
    ApiRateLimit => "api.rate_limit",

    DbConnectionOpen => "db.connection_open",
    DbConnectionClose => "db.connection_close",
    DbQueryStart => "db.query_start",
    DbQueryComplete => "db.query_complete",
    DbQueryError => "db.query_error",

    DevHotReload => "dev.hot_reload",
    DevBuildStart => "dev.build_start",
    DevBuildComplete => "dev.build_complete",
    DevTestRun => "dev.test_run",
}

/// Top-level grouping of event types.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EventDomain {
    System,
    User,
    Compute,
    Ui,
    Api,
    Db,
    Dev,
}

impl EventType {
    /// Domain this type belongs to.
    pub fn domain(&self) -> EventDomain {
        match self.as_str().split_once('.').map(|(domain, _)| domain) {
            Some("user") => EventDomain::User,
            Some("compute") => EventDomain::Compute,
            Some("ui") => EventDomain::Ui,
            Some("api") => EventDomain::Api,
            Some("db") => EventDomain::Db,
            Some("dev") => EventDomain::Dev,
            _ => EventDomain::System,
        }
    }
}

impl fmt::Display for EventType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EventType {
    type Err = EventError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        EventType::ALL
            .iter()
            .copied()
            .find(|t| t.as_str() == s)
            .ok_or_else(|| EventError::UnknownEventType(s.to_string()))
    }
}

/// Event priority levels.
///
/// Ordered by urgency: `Critical > High > Normal > Low`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    /// Lowest priority
    Low = 0,
    /// Normal priority (default)
    #[default]
    Normal = 1,
    /// High priority
    High = 2,
    /// Critical priority
    Critical = 3,
}

impl Priority {
    /// All priorities, most urgent first.
    pub const BY_URGENCY: [Priority; 4] = [
        Priority::Critical,
        Priority::High,
        Priority::Normal,
        Priority::Low,
    ];

    /// Position in [`Priority::BY_URGENCY`]; 0 is most urgent.
    pub fn rank(&self) -> usize {
        match self {
            Priority::Critical => 0,
            Priority::High => 1,
            Priority::Normal => 2,
            Priority::Low => 3,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Priority::Critical => "critical",
            Priority::High => "high",
            Priority::Normal => "normal",
            Priority::Low => "low",
        }
    }
}

impl fmt::Display for Priority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Newtype for event IDs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EventId(pub Uuid);

impl EventId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for EventId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for EventId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Optional fields for [`emit`](crate::EventSystem::emit).
#[derive(Debug, Clone, Default)]
pub struct EmitOptions {
    pub priority: Priority,
    pub source: Option<String>,
    pub metadata: HashMap<String, String>,
    pub correlation_id: Option<String>,
    pub user_id: Option<String>,
    pub session_id: Option<String>,
}

impl EmitOptions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set event priority.
    pub fn with_priority(mut self, priority: Priority) -> Self {
        self.priority = priority;
        self
    }

    /// Set the emitter name.
    pub fn with_source(mut self, source: impl Into<String>) -> Self {
        self.source = Some(source.into());
        self
    }

    /// Add metadata.
    pub fn with_metadata(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.metadata.insert(key.into(), value.into());
        self
    }

    pub fn with_correlation_id(mut self, id: impl Into<String>) -> Self {
        self.correlation_id = Some(id.into());
        self
    }

    pub fn with_user_id(mut self, id: impl Into<String>) -> Self {
        self.user_id = Some(id.into());
        self
    }

    pub fn with_session_id(mut self, id: impl Into<String>) -> Self {
        self.session_id = Some(id.into());
        self
    }
}

/// Something that happened.
///
/// Handlers receive events as `Arc<Event>`; an event is never modified
/// once it has been queued.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Event {
    /// Unique event ID
    pub id: EventId,

    #[serde(rename = "type")]
    pub event_type: EventType,

    pub priority: Priority,

    /// Timestamp when event was created
    pub timestamp: DateTime<Utc>,

    /// Who emitted the event
    pub source: String,

    /// Payload. The event system does not interpret it.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<serde_json::Value>,

    #[serde(default, skip_serializing_if = "HashMap::is_empty")]
    pub metadata: HashMap<String, String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub correlation_id: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_id: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub session_id: Option<String>,
}

impl Event {
    /// Create a new event.
    pub fn new(event_type: EventType, data: Option<serde_json::Value>, options: EmitOptions) -> Self {
        Self {
            id: EventId::new(),
            event_type,
            priority: options.priority,
            timestamp: Utc::now(),
            source: options.source.unwrap_or_else(|| DEFAULT_SOURCE.to_string()),
            data,
            metadata: options.metadata,
            correlation_id: options.correlation_id,
            user_id: options.user_id,
            session_id: options.session_id,
        }
    }

    /// Decode the payload into a typed value.
    ///
    /// A missing payload decodes as JSON `null`.
    pub fn payload<T: DeserializeOwned>(&self) -> Result<T, serde_json::Error> {
        match &self.data {
            Some(value) => T::deserialize(value),
            None => T::deserialize(serde_json::Value::Null),
        }
    }
}
