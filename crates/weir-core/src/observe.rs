//! Optional metrics instrumentation for Weir.
//!
//! When the `observe` feature is enabled, key operations emit counters and
//! gauges via the [`metrics`] crate. A downstream application must install a
//! metrics recorder (e.g. `metrics-exporter-prometheus`) to collect the data.
//!
//! When the feature is **not** enabled every function in this module is a
//! zero-cost no-op.

/// Record events handed to the transformation by a driver.
///
/// - `weir.driver.events_projected_total` – counter
#[inline]
pub fn record_projected(count: u64) {
    #[cfg(feature = "observe")]
    {
        metrics::counter!("weir.driver.events_projected_total").increment(count);
    }
    #[cfg(not(feature = "observe"))]
    {
        let _ = count;
    }
}

/// Record a poll that returned no event within its timeout.
///
/// - `weir.driver.stalls_total` – counter
#[inline]
pub fn record_stall() {
    #[cfg(feature = "observe")]
    {
        metrics::counter!("weir.driver.stalls_total").increment(1);
    }
}

/// Record a completed chunk recombination.
///
/// - `weir.combine.recombined_total` – counter
#[inline]
pub fn record_recombined() {
    #[cfg(feature = "observe")]
    {
        metrics::counter!("weir.combine.recombined_total").increment(1);
    }
}

/// Record an event diverted to (or raised for lack of) a dead-letter sink.
///
/// - `weir.combine.dead_letter_total` – counter
#[inline]
pub fn record_dead_letter() {
    #[cfg(feature = "observe")]
    {
        metrics::counter!("weir.combine.dead_letter_total").increment(1);
    }
}

/// Set the current count of in-flight chunk collectors.
///
/// - `weir.combine.pending_correlations` – gauge
#[inline]
pub fn set_pending_correlations(count: usize) {
    #[cfg(feature = "observe")]
    {
        metrics::gauge!("weir.combine.pending_correlations").set(count as f64);
    }
    #[cfg(not(feature = "observe"))]
    {
        let _ = count;
    }
}

/// Record a batch acknowledgement flush.
///
/// - `weir.source.acknowledged_total` – counter
#[inline]
pub fn record_acknowledged(count: u64) {
    #[cfg(feature = "observe")]
    {
        metrics::counter!("weir.source.acknowledged_total").increment(count);
    }
    #[cfg(not(feature = "observe"))]
    {
        let _ = count;
    }
}
