//! The supervised control loop turning a source, a transformation and a sink
//! into a long-running task.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use thiserror::Error;
use weir_core::{observe, AckToken, DriverConfig, Event, EventSource, Interrupt, Sink, WeirError};

use crate::projector::Projector;
use crate::throughput::ThroughputTracker;

#[derive(Error, Debug)]
pub enum DriverError {
    #[error("engine error: {0}")]
    Engine(#[from] WeirError),

    #[error("event source closed while the driver was running")]
    SourceClosed,

    #[error("event source contract violation: {0}")]
    ContractViolation(String),

    #[error("driver configuration error: {0}")]
    Config(String),
}

/// Why a driver run ended cleanly.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopReason {
    /// The configured event limit was reached.
    LimitReached,
    /// The source reported exhaustion.
    Exhausted,
    /// The configured maximum of consecutive stalls was reached.
    Stalled,
    /// `cancel()` was called, or the poll was interrupted.
    Cancelled,
}

/// Final accounting for one driver run.
#[derive(Debug, Clone)]
pub struct DriverReport {
    pub events_projected: u64,
    pub total_stalls: u64,
    pub elapsed: Duration,
    pub stop_reason: StopReason,
}

/// Cloneable handle for cancelling a running driver from another thread.
///
/// Cancellation is cooperative: the flag is observed between loop iterations
/// and the source's interrupt handle is fired to unblock a pending poll, so
/// `run()` returns within roughly one poll-timeout interval.
#[derive(Clone)]
pub struct CancelHandle {
    should_run: Arc<AtomicBool>,
    interrupt: Arc<dyn Interrupt>,
}

impl CancelHandle {
    pub fn cancel(&self) {
        self.should_run.store(false, Ordering::SeqCst);
        self.interrupt.interrupt();
    }

    pub fn is_cancelled(&self) -> bool {
        !self.should_run.load(Ordering::SeqCst)
    }
}

/// Builder for [`ProjectorDriver`].
///
/// # Example
///
/// ```ignore
/// let driver = ProjectorDriverBuilder::new(source, project_fn(|event, sink| {
///         sink.accept(event)
///     }))
///     .destination(sink)
///     .poll_timeout(Duration::from_secs(1))
///     .limit(100_000)
///     .max_stalls(10)
///     .build()?;
///
/// let cancel = driver.cancel_handle();
/// let report = driver.run()?;
/// ```
pub struct ProjectorDriverBuilder<S, P, O> {
    source: S,
    projector: P,
    destination: Option<Box<dyn FnOnce() -> O + Send>>,
    config: DriverConfig,
}

impl<S, P, O> ProjectorDriverBuilder<S, P, O> {
    pub fn new(source: S, projector: P) -> Self {
        Self {
            source,
            projector,
            destination: None,
            config: DriverConfig::default(),
        }
    }

    /// Use `sink` as the destination.
    pub fn destination(mut self, sink: O) -> Self
    where
        O: Send + 'static,
    {
        self.destination = Some(Box::new(move || sink));
        self
    }

    /// Defer destination construction until the driver actually runs, on the
    /// worker that runs it.
    pub fn destination_supplier(mut self, supplier: impl FnOnce() -> O + Send + 'static) -> Self {
        self.destination = Some(Box::new(supplier));
        self
    }

    pub fn poll_timeout(mut self, timeout: Duration) -> Self {
        self.config.poll_timeout_ms = timeout.as_millis() as u64;
        self
    }

    /// Stop cleanly after this many events; negative means unlimited.
    pub fn limit(mut self, limit: i64) -> Self {
        self.config.limit = limit;
        self
    }

    /// Abort cleanly after this many consecutive stalls; 0 means unlimited.
    pub fn max_stalls(mut self, max: u64) -> Self {
        self.config.max_stalls = max;
        self
    }

    pub fn report_batch_size(mut self, size: u64) -> Self {
        self.config.report_batch_size = size;
        self
    }

    /// Replace the whole configuration at once.
    pub fn config(mut self, config: DriverConfig) -> Self {
        self.config = config;
        self
    }

    pub fn build(self) -> Result<ProjectorDriver<S, P, O>, DriverError>
    where
        S: EventSource,
        O: Sink,
        P: Projector<Event<S::Key, S::Value>, O::Item>,
    {
        let destination = self
            .destination
            .ok_or_else(|| DriverError::Config("no destination configured".to_string()))?;
        let interrupt = self.source.interrupt_handle();
        Ok(ProjectorDriver {
            source: self.source,
            projector: self.projector,
            destination,
            config: self.config,
            should_run: Arc::new(AtomicBool::new(true)),
            interrupt,
        })
    }
}

/// The control loop: polls a source, feeds a transformation, tracks
/// throughput and stalls, enforces limits and honors cancellation.
///
/// The driver performs no internal parallelism; it is designed to run as a
/// single task on one dedicated worker. A [`CancelHandle`] taken before
/// `run()` is the only cross-thread entry point.
pub struct ProjectorDriver<S, P, O> {
    source: S,
    projector: P,
    destination: Box<dyn FnOnce() -> O + Send>,
    config: DriverConfig,
    should_run: Arc<AtomicBool>,
    interrupt: Arc<dyn Interrupt>,
}

impl<S, P, O> ProjectorDriver<S, P, O>
where
    S: EventSource,
    O: Sink,
    P: Projector<Event<S::Key, S::Value>, O::Item>,
{
    pub fn cancel_handle(&self) -> CancelHandle {
        CancelHandle {
            should_run: Arc::clone(&self.should_run),
            interrupt: Arc::clone(&self.interrupt),
        }
    }

    /// Run until a limit, exhaustion, a stall budget, cancellation or a fault
    /// ends the loop. Every exit path closes the source and the destination
    /// and reports final throughput.
    pub fn run(mut self) -> Result<DriverReport, DriverError> {
        let mut sink = (self.destination)();
        let poll_timeout = Duration::from_millis(self.config.poll_timeout_ms);
        let limit = self.config.effective_limit();
        let mut tracker = ThroughputTracker::new(self.config.report_batch_size);
        let mut consecutive_stalls: u64 = 0;
        let mut staged_acks: Vec<AckToken> = Vec::new();

        tracing::info!(
            poll_timeout_ms = self.config.poll_timeout_ms,
            limit = self.config.limit,
            max_stalls = self.config.max_stalls,
            "projector driver started"
        );

        let outcome = loop {
            if !self.should_run.load(Ordering::SeqCst) {
                tracing::info!("projector driver cancelled");
                break Ok(StopReason::Cancelled);
            }
            if self.source.is_closed() {
                break Err(DriverError::SourceClosed);
            }
            if tracker.count() >= limit {
                tracing::info!(limit, "configured event limit reached");
                break Ok(StopReason::LimitReached);
            }
            if self.source.is_exhausted() {
                tracing::info!("event source exhausted");
                break Ok(StopReason::Exhausted);
            }

            let claimed_available = self.source.available_immediately();
            match self.source.poll(poll_timeout) {
                Ok(Some(event)) => {
                    consecutive_stalls = 0;
                    tracker.record_one();
                    let token = event.ack_token().cloned();
                    if let Err(e) = self.projector.project(event, &mut sink) {
                        tracing::error!(error = %e, "transformation failed");
                        break Err(e.into());
                    }
                    if let Some(token) = token {
                        staged_acks.push(token);
                    }
                    if self.config.report_batch_size > 0
                        && staged_acks.len() as u64 >= self.config.report_batch_size
                    {
                        let batch = std::mem::take(&mut staged_acks);
                        observe::record_acknowledged(batch.len() as u64);
                        if let Err(e) = self.source.processed(batch) {
                            tracing::error!(error = %e, "acknowledgement failed");
                            break Err(e.into());
                        }
                    }
                }
                Ok(None) => {
                    tracker.record_stall();
                    consecutive_stalls += 1;
                    if claimed_available {
                        break Err(DriverError::ContractViolation(
                            "source claimed an event was immediately available but poll \
                             returned none"
                                .to_string(),
                        ));
                    }
                    if consecutive_stalls == 1 {
                        if let Err(e) = self.projector.stalled(&mut sink) {
                            tracing::error!(error = %e, "stall hook failed");
                            break Err(e.into());
                        }
                    }
                    match self.source.remaining() {
                        Some(remaining) => {
                            let rate = tracker.events_per_second();
                            if rate > remaining as f64 {
                                tracing::warn!(
                                    remaining,
                                    rate_per_sec = rate,
                                    "processing outpaces the upstream producer"
                                );
                            } else {
                                tracing::debug!(
                                    remaining,
                                    consecutive_stalls,
                                    "stalled waiting for events"
                                );
                            }
                        }
                        None => {
                            tracing::debug!(consecutive_stalls, "stalled waiting for events");
                        }
                    }
                    if self.config.max_stalls > 0 && consecutive_stalls >= self.config.max_stalls {
                        tracing::warn!(
                            stalls = consecutive_stalls,
                            "maximum consecutive stalls reached, stopping"
                        );
                        break Ok(StopReason::Stalled);
                    }
                }
                Err(e) if e.is_interruption() => {
                    tracing::debug!("poll interrupted, treating as cancellation");
                    break Ok(StopReason::Cancelled);
                }
                Err(e) => {
                    tracing::error!(error = %e, "event source fault");
                    break Err(e.into());
                }
            }
        };

        // Terminal path, taken on every exit.
        self.should_run.store(false, Ordering::SeqCst);
        if !staged_acks.is_empty() {
            observe::record_acknowledged(staged_acks.len() as u64);
            if let Err(e) = self.source.processed(staged_acks) {
                tracing::warn!(error = %e, "final acknowledgement flush failed");
            }
        }
        tracker.report_final();
        if !self.source.is_closed() {
            self.source.close();
        }
        if let Err(e) = sink.close() {
            tracing::warn!(error = %e, "failed to close destination sink");
        }

        match outcome {
            Ok(stop_reason) => Ok(DriverReport {
                events_projected: tracker.count(),
                total_stalls: tracker.stalls(),
                elapsed: tracker.elapsed(),
                stop_reason,
            }),
            Err(e) => Err(e),
        }
    }
}
