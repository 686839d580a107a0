//! Processing statistics.

use crate::result::BatchReport;
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;
use tokio::time::Instant;

/// Point-in-time view of the event system.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EventStats {
    /// Events taken off the queue and fully processed.
    pub total_events: u64,
    pub events_per_second: f64,
    /// Mean processing time per result, in milliseconds.
    pub average_processing_time: f64,
    pub success_rate: f64,
    pub error_rate: f64,
    pub queue_size: usize,
    /// Typed and global handlers currently registered.
    pub active_handlers: usize,
    /// Milliseconds since the last start, held at its final value once
    /// stopped; 0 if never started.
    pub uptime: u64,
    pub total_results: u64,
    pub failed_results: u64,
}

/// Counters fed by the dispatch loop.
#[derive(Debug, Default)]
pub struct StatsCollector {
    total_events: AtomicU64,
    total_results: AtomicU64,
    failed_results: AtomicU64,
    processing_nanos: AtomicU64,
    clock: Mutex<Clock>,
}

#[derive(Debug, Default, Clone, Copy)]
struct Clock {
    started_at: Option<Instant>,
    stopped_at: Option<Instant>,
}

impl StatsCollector {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fold one tick into the counters.
    pub fn record(&self, report: &BatchReport) {
        if report.is_empty() {
            return;
        }
        let nanos = u64::try_from(report.processing_time().as_nanos()).unwrap_or(u64::MAX);

        self.total_events
            .fetch_add(report.events as u64, Ordering::Relaxed);
        self.total_results
            .fetch_add(report.results.len() as u64, Ordering::Relaxed);
        self.failed_results
            .fetch_add(report.failure_count() as u64, Ordering::Relaxed);
        self.processing_nanos.fetch_add(nanos, Ordering::Relaxed);
    }

    /// Zero every counter and restart the uptime clock.
    pub fn reset(&self) {
        self.total_events.store(0, Ordering::Relaxed);
        self.total_results.store(0, Ordering::Relaxed);
        self.failed_results.store(0, Ordering::Relaxed);
        self.processing_nanos.store(0, Ordering::Relaxed);
        *self.clock.lock() = Clock {
            started_at: Some(Instant::now()),
            stopped_at: None,
        };
    }

    /// Stop the uptime clock and return the final uptime.
    pub fn freeze(&self) -> Duration {
        let mut clock = self.clock.lock();
        if clock.started_at.is_some() && clock.stopped_at.is_none() {
            clock.stopped_at = Some(Instant::now());
        }
        uptime_of(&clock)
    }

    pub fn total_events(&self) -> u64 {
        self.total_events.load(Ordering::Relaxed)
    }

    pub fn uptime(&self) -> Duration {
        uptime_of(&self.clock.lock())
    }

    pub fn snapshot(&self, queue_size: usize, active_handlers: usize) -> EventStats {
        let total_events = self.total_events();
        let total_results = self.total_results.load(Ordering::Relaxed);
        let failed_results = self.failed_results.load(Ordering::Relaxed);
        let processing = Duration::from_nanos(self.processing_nanos.load(Ordering::Relaxed));
        let uptime = self.uptime();

        let events_per_second = if uptime.is_zero() {
            0.0
        } else {
            total_events as f64 / uptime.as_secs_f64()
        };

        let (average_processing_time, success_rate, error_rate) = if total_results == 0 {
            (0.0, 1.0, 0.0)
        } else {
            let results = total_results as f64;
            let failed = failed_results as f64;
            (
                processing.as_secs_f64() * 1000.0 / results,
                (results - failed) / results,
                failed / results,
            )
        };

        EventStats {
            total_events,
            events_per_second,
            average_processing_time,
            success_rate,
            error_rate,
            queue_size,
            active_handlers,
            uptime: uptime.as_millis() as u64,
            total_results,
            failed_results,
        }
    }
}

fn uptime_of(clock: &Clock) -> Duration {
    match (clock.started_at, clock.stopped_at) {
        (Some(started), Some(stopped)) => stopped.saturating_duration_since(started),
        (Some(started), None) => started.elapsed(),
        _ => Duration::ZERO,
    }
}
