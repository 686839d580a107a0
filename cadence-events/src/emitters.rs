//! Namespaced shortcuts over [`EventSystem::emit`].
//!
//! Each method fixes the event type, priority and source, and shapes the
//! payload. Nothing here changes how events are processed.

use crate::event::{EmitOptions, EventId, EventType, Priority};
use crate::system::EventSystem;
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use std::time::Duration;
use tracing::warn;

pub const COMPUTE_SOURCE: &str = "compute";
pub const UI_SOURCE: &str = "ui";
pub const API_SOURCE: &str = "api";

fn to_payload<T: Serialize>(payload: &T) -> Option<Value> {
    match serde_json::to_value(payload) {
        Ok(value) => Some(value),
        Err(err) => {
            warn!(error = %err, "Dropping unserializable event payload");
            None
        }
    }
}

// ============================================================================
// Compute
// ============================================================================

/// Payload of `compute.job_*` events.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JobEvent {
    pub job_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub job_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_id: Option<String>,
    /// Completion in `0.0..=1.0`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub progress: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration_ms: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub details: Option<Value>,
}

impl JobEvent {
    pub fn new(job_id: impl Into<String>) -> Self {
        Self {
            job_id: job_id.into(),
            ..Default::default()
        }
    }

    pub fn with_job_type(mut self, job_type: impl Into<String>) -> Self {
        self.job_type = Some(job_type.into());
        self
    }

    pub fn with_user_id(mut self, user_id: impl Into<String>) -> Self {
        self.user_id = Some(user_id.into());
        self
    }

    pub fn with_progress(mut self, progress: f64) -> Self {
        self.progress = Some(progress);
        self
    }

    pub fn with_duration(mut self, duration: Duration) -> Self {
        self.duration_ms = Some(duration.as_millis() as u64);
        self
    }

    pub fn with_error(mut self, error: impl Into<String>) -> Self {
        self.error = Some(error.into());
        self
    }

    pub fn with_details(mut self, details: Value) -> Self {
        self.details = Some(details);
        self
    }
}

/// Payload of `compute.resource_*` events.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResourceEvent {
    pub resource_id: String,
    pub resource_type: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub job_id: Option<String>,
    /// Utilization in `0.0..=1.0`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub usage: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub threshold: Option<f64>,
}

impl ResourceEvent {
    pub fn new(resource_id: impl Into<String>, resource_type: impl Into<String>) -> Self {
        Self {
            resource_id: resource_id.into(),
            resource_type: resource_type.into(),
            ..Default::default()
        }
    }

    pub fn for_job(mut self, job_id: impl Into<String>) -> Self {
        self.job_id = Some(job_id.into());
        self
    }

    pub fn with_usage(mut self, usage: f64, threshold: f64) -> Self {
        self.usage = Some(usage);
        self.threshold = Some(threshold);
        self
    }
}

/// Payload of `compute.system_*` events.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ComputeSystemEvent {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub node_id: Option<String>,
    pub active_jobs: usize,
    pub queued_jobs: usize,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl ComputeSystemEvent {
    pub fn new(active_jobs: usize, queued_jobs: usize) -> Self {
        Self {
            active_jobs,
            queued_jobs,
            ..Default::default()
        }
    }

    pub fn with_node_id(mut self, node_id: impl Into<String>) -> Self {
        self.node_id = Some(node_id.into());
        self
    }

    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }
}

/// `compute.*` events. Job events correlate by job id.
#[derive(Debug, Clone, Copy)]
pub struct ComputeEvents<'a> {
    system: &'a EventSystem,
}

impl<'a> ComputeEvents<'a> {
    pub(crate) fn new(system: &'a EventSystem) -> Self {
        Self { system }
    }

    pub fn job_submitted(&self, job: JobEvent) -> EventId {
        self.job(EventType::ComputeJobSubmitted, Priority::Normal, job)
    }

    pub fn job_queued(&self, job: JobEvent) -> EventId {
        self.job(EventType::ComputeJobQueued, Priority::Normal, job)
    }

    pub fn job_started(&self, job: JobEvent) -> EventId {
        self.job(EventType::ComputeJobStarted, Priority::Normal, job)
    }

    pub fn job_completed(&self, job: JobEvent) -> EventId {
        self.job(EventType::ComputeJobCompleted, Priority::Normal, job)
    }

    pub fn job_failed(&self, job: JobEvent) -> EventId {
        self.job(EventType::ComputeJobFailed, Priority::High, job)
    }

    pub fn job_cancelled(&self, job: JobEvent) -> EventId {
        self.job(EventType::ComputeJobCancelled, Priority::Normal, job)
    }

    pub fn resource_allocated(&self, resource: ResourceEvent) -> EventId {
        self.resource(EventType::ComputeResourceAllocated, Priority::Normal, resource)
    }

    pub fn resource_released(&self, resource: ResourceEvent) -> EventId {
        self.resource(EventType::ComputeResourceReleased, Priority::Normal, resource)
    }

    pub fn high_usage(&self, resource: ResourceEvent) -> EventId {
        self.resource(EventType::ComputeResourceHighUsage, Priority::High, resource)
    }

    pub fn system_started(&self, status: ComputeSystemEvent) -> EventId {
        self.status(EventType::ComputeSystemStarted, Priority::Normal, status)
    }

    pub fn system_stopped(&self, status: ComputeSystemEvent) -> EventId {
        self.status(EventType::ComputeSystemStopped, Priority::Normal, status)
    }

    pub fn overload(&self, status: ComputeSystemEvent) -> EventId {
        self.status(EventType::ComputeSystemOverload, Priority::Critical, status)
    }

    fn job(&self, event_type: EventType, priority: Priority, job: JobEvent) -> EventId {
        let mut options = self
            .options(priority)
            .with_correlation_id(job.job_id.clone());
        if let Some(user_id) = &job.user_id {
            options = options.with_user_id(user_id.clone());
        }
        self.system.emit(event_type, to_payload(&job), options)
    }

    fn resource(&self, event_type: EventType, priority: Priority, resource: ResourceEvent) -> EventId {
        let mut options = self.options(priority);
        if let Some(job_id) = &resource.job_id {
            options = options.with_correlation_id(job_id.clone());
        }
        self.system.emit(event_type, to_payload(&resource), options)
    }

    fn status(&self, event_type: EventType, priority: Priority, status: ComputeSystemEvent) -> EventId {
        self.system
            .emit(event_type, to_payload(&status), self.options(priority))
    }

    fn options(&self, priority: Priority) -> EmitOptions {
        EmitOptions::new()
            .with_priority(priority)
            .with_source(COMPUTE_SOURCE)
    }
}

// ============================================================================
// UI
// ============================================================================

/// `ui.*` events, all low priority.
#[derive(Debug, Clone, Copy)]
pub struct UiEvents<'a> {
    system: &'a EventSystem,
}

impl<'a> UiEvents<'a> {
    pub(crate) fn new(system: &'a EventSystem) -> Self {
        Self { system }
    }

    pub fn page_load(&self, page: &str, load_time: Duration) -> EventId {
        self.emit(
            EventType::UiPageLoad,
            json!({ "page": page, "loadTime": load_time.as_millis() as u64 }),
        )
    }

    pub fn component_render(&self, component: &str, render_time: Duration) -> EventId {
        self.emit(
            EventType::UiComponentRender,
            json!({ "component": component, "renderTime": render_time.as_millis() as u64 }),
        )
    }

    pub fn interaction(&self, element: &str, action: &str) -> EventId {
        self.emit(
            EventType::UiInteraction,
            json!({ "element": element, "action": action }),
        )
    }

    pub fn theme_change(&self, theme: &str) -> EventId {
        self.emit(EventType::UiThemeChange, json!({ "theme": theme }))
    }

    fn emit(&self, event_type: EventType, data: Value) -> EventId {
        self.system.emit(
            event_type,
            data,
            EmitOptions::new()
                .with_priority(Priority::Low)
                .with_source(UI_SOURCE),
        )
    }
}

// ============================================================================
// API
// ============================================================================

/// `api.*` events, correlated by request id.
#[derive(Debug, Clone, Copy)]
pub struct ApiEvents<'a> {
    system: &'a EventSystem,
}

impl<'a> ApiEvents<'a> {
    pub(crate) fn new(system: &'a EventSystem) -> Self {
        Self { system }
    }

    pub fn request_start(&self, request_id: &str, method: &str, path: &str) -> EventId {
        self.emit(
            EventType::ApiRequestStart,
            Priority::Normal,
            request_id,
            json!({ "requestId": request_id, "method": method, "path": path }),
        )
    }

    pub fn request_complete(&self, request_id: &str, status: u16, duration: Duration) -> EventId {
        self.emit(
            EventType::ApiRequestComplete,
            Priority::Normal,
            request_id,
            json!({
                "requestId": request_id,
                "status": status,
                "duration": duration.as_millis() as u64,
            }),
        )
    }

    pub fn error(&self, request_id: &str, error: &str, status: Option<u16>) -> EventId {
        self.emit(
            EventType::ApiRequestError,
            Priority::High,
            request_id,
            json!({ "requestId": request_id, "error": error, "status": status }),
        )
    }

    pub fn rate_limit(&self, request_id: &str, client: &str, retry_after: Duration) -> EventId {
        self.emit(
            EventType::ApiRateLimit,
            Priority::High,
            request_id,
            json!({
                "requestId": request_id,
                "client": client,
                "retryAfter": retry_after.as_millis() as u64,
            }),
        )
    }

    fn emit(&self, event_type: EventType, priority: Priority, request_id: &str, data: Value) -> EventId {
        self.system.emit(
            event_type,
            data,
            EmitOptions::new()
                .with_priority(priority)
                .with_source(API_SOURCE)
                .with_correlation_id(request_id),
        )
    }
}
