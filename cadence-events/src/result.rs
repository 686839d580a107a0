//! Outcome records for handler invocations.

use crate::event::{EventId, EventType};
use crate::handler::HandlerId;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::time::Duration;

/// Outcome of one handler for one event, after all retries.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EventResult {
    pub event_id: EventId,
    pub event_type: EventType,
    pub handler_id: HandlerId,
    pub success: bool,

    /// Wall time from the first attempt to the final outcome, backoff included.
    #[serde(with = "millis")]
    pub processing_time: Duration,

    /// Last error message, when every attempt failed.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,

    /// Value returned by the successful attempt.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub result: Option<Value>,

    /// Attempts made, including the first.
    pub attempts: u32,

    pub timestamp: DateTime<Utc>,
}

impl EventResult {
    pub fn is_failure(&self) -> bool {
        !self.success
    }
}

/// Everything one dispatch tick produced.
#[derive(Debug, Clone, Default)]
pub struct BatchReport {
    /// Events taken off the queue.
    pub events: usize,
    pub results: Vec<EventResult>,
}

impl BatchReport {
    pub fn is_empty(&self) -> bool {
        self.events == 0
    }

    pub fn failures(&self) -> impl Iterator<Item = &EventResult> {
        self.results.iter().filter(|r| r.is_failure())
    }

    pub fn failure_count(&self) -> usize {
        self.failures().count()
    }

    /// Summed processing time over all results.
    pub fn processing_time(&self) -> Duration {
        self.results.iter().map(|r| r.processing_time).sum()
    }
}

mod millis {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S: Serializer>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u64(duration.as_millis() as u64)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        u64::deserialize(deserializer).map(Duration::from_millis)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn result(success: bool, millis: u64) -> EventResult {
        EventResult {
            event_id: EventId::new(),
            event_type: EventType::DbQueryComplete,
            handler_id: HandlerId::from("h"),
            success,
            processing_time: Duration::from_millis(millis),
            error: (!success).then(|| "boom".to_string()),
            result: success.then(|| json!(1)),
            attempts: 1,
            timestamp: Utc::now(),
        }
    }

    #[test]
    fn test_batch_report_failures() {
        let report = BatchReport {
            events: 2,
            results: vec![result(true, 10), result(false, 30), result(true, 5)],
        };

        assert!(!report.is_empty());
        assert_eq!(report.failure_count(), 1);
        assert_eq!(report.processing_time(), Duration::from_millis(45));
        assert!(BatchReport::default().is_empty());
    }

    #[test]
    fn test_serializes_processing_time_as_millis() {
        let value = serde_json::to_value(result(false, 250)).unwrap();

        assert_eq!(value["processingTime"], json!(250));
        assert_eq!(value["eventType"], json!("db.query_complete"));
        assert_eq!(value["error"], json!("boom"));
        assert!(value.get("result").is_none());
    }
}
