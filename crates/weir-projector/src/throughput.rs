//! Processed-item rate measurement and reporting.

use std::time::{Duration, Instant};

use weir_core::observe;

/// Tracks events processed and stalls observed by one driver run, logging a
/// throughput line every `report_batch` events.
pub struct ThroughputTracker {
    started: Instant,
    report_batch: u64,
    count: u64,
    stalls: u64,
    window_started: Instant,
    window_count: u64,
}

impl ThroughputTracker {
    pub fn new(report_batch: u64) -> Self {
        let now = Instant::now();
        Self {
            started: now,
            report_batch,
            count: 0,
            stalls: 0,
            window_started: now,
            window_count: 0,
        }
    }

    pub fn record_one(&mut self) {
        self.count += 1;
        self.window_count += 1;
        observe::record_projected(1);
        if self.report_batch > 0 && self.window_count >= self.report_batch {
            self.report_window();
        }
    }

    pub fn record_stall(&mut self) {
        self.stalls += 1;
        observe::record_stall();
    }

    pub fn count(&self) -> u64 {
        self.count
    }

    pub fn stalls(&self) -> u64 {
        self.stalls
    }

    pub fn elapsed(&self) -> Duration {
        self.started.elapsed()
    }

    /// Overall rate since the run started.
    pub fn events_per_second(&self) -> f64 {
        let secs = self.started.elapsed().as_secs_f64();
        if secs <= 0.0 {
            return self.count as f64;
        }
        self.count as f64 / secs
    }

    fn report_window(&mut self) {
        let secs = self.window_started.elapsed().as_secs_f64();
        let rate = if secs > 0.0 {
            self.window_count as f64 / secs
        } else {
            self.window_count as f64
        };
        tracing::info!(events = self.count, rate_per_sec = rate, "throughput");
        self.window_started = Instant::now();
        self.window_count = 0;
    }

    pub fn report_final(&self) {
        tracing::info!(
            events = self.count,
            stalls = self.stalls,
            elapsed_ms = self.started.elapsed().as_millis() as u64,
            rate_per_sec = self.events_per_second(),
            "projector driver finished"
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_counts_events_and_stalls_independently() {
        let mut tracker = ThroughputTracker::new(0);
        tracker.record_one();
        tracker.record_one();
        tracker.record_stall();
        assert_eq!(tracker.count(), 2);
        assert_eq!(tracker.stalls(), 1);
    }

    #[test]
    fn test_rate_is_finite() {
        let mut tracker = ThroughputTracker::new(0);
        for _ in 0..100 {
            tracker.record_one();
        }
        assert!(tracker.events_per_second().is_finite());
        assert!(tracker.events_per_second() > 0.0);
    }
}
