// Event system settings

use crate::validation::{ConfigValidator, Validate};
use crate::Result;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Tunables for the event system.
///
/// Every field has a default, so partial files and environments are fine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EventSystemConfig {
    /// Dispatch tick cadence in milliseconds.
    pub tick_interval_ms: u64,

    /// Maximum events drained per tick.
    pub batch_size: usize,

    /// Queue depth at which the health check reports unhealthy.
    pub max_queue_size: usize,

    /// How long the health check waits after emitting its probe event.
    pub health_check_delay_ms: u64,

    /// Attempts for handlers registered without an explicit retry count.
    pub default_retries: u32,

    /// Per-attempt budget for handlers registered without an explicit timeout.
    pub default_timeout_ms: u64,

    /// Base of the exponential backoff between attempts.
    pub backoff_base_ms: u64,

    /// Upper bound for a single backoff delay.
    pub max_backoff_ms: u64,

    /// Emit `system.error` events for failed handler results.
    pub report_failures: bool,

    /// Buffered results per lagging result subscriber.
    pub result_channel_capacity: usize,
}

impl Default for EventSystemConfig {
    fn default() -> Self {
        Self {
            tick_interval_ms: 10,
            batch_size: 50,
            max_queue_size: 1000,
            health_check_delay_ms: 100,
            default_retries: 3,
            default_timeout_ms: 5000,
            backoff_base_ms: 100,
            max_backoff_ms: 30_000,
            report_failures: false,
            result_channel_capacity: 1024,
        }
    }
}

impl EventSystemConfig {
    pub fn tick_interval(&self) -> Duration {
        Duration::from_millis(self.tick_interval_ms)
    }

    pub fn health_check_delay(&self) -> Duration {
        Duration::from_millis(self.health_check_delay_ms)
    }

    pub fn default_timeout(&self) -> Duration {
        Duration::from_millis(self.default_timeout_ms)
    }

    pub fn backoff_base(&self) -> Duration {
        Duration::from_millis(self.backoff_base_ms)
    }

    pub fn max_backoff(&self) -> Duration {
        Duration::from_millis(self.max_backoff_ms)
    }
}

impl Validate for EventSystemConfig {
    fn validate(&self) -> Result<()> {
        ConfigValidator::at_least(self.tick_interval_ms, 1, "tick_interval_ms")?;
        ConfigValidator::at_least(self.batch_size, 1, "batch_size")?;
        ConfigValidator::at_least(self.max_queue_size, 1, "max_queue_size")?;
        ConfigValidator::at_least(self.default_retries, 1, "default_retries")?;
        ConfigValidator::at_least(self.default_timeout_ms, 1, "default_timeout_ms")?;
        ConfigValidator::not_above(
            self.backoff_base_ms,
            self.max_backoff_ms,
            "backoff_base_ms",
            "max_backoff_ms",
        )?;
        ConfigValidator::at_least(self.result_channel_capacity, 1, "result_channel_capacity")?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        let config = EventSystemConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.tick_interval(), Duration::from_millis(10));
        assert_eq!(config.default_timeout(), Duration::from_secs(5));
        assert_eq!(config.batch_size, 50);
        assert_eq!(config.max_queue_size, 1000);
    }

    #[test]
    fn test_zero_retries_rejected() {
        let config = EventSystemConfig {
            default_retries: 0,
            ..Default::default()
        };
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("default_retries"));
    }

    #[test]
    fn test_backoff_bounds_checked() {
        let config = EventSystemConfig {
            backoff_base_ms: 60_000,
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_partial_document_uses_defaults() {
        let config: EventSystemConfig =
            serde_json::from_value(serde_json::json!({"batch_size": 5})).unwrap();
        assert_eq!(config.batch_size, 5);
        assert_eq!(config.tick_interval_ms, 10);
    }
}
