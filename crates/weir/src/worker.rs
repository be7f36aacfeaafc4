//! Tokio integration for the blocking driver loop.

use tokio::task::JoinHandle;
use weir_core::{Event, EventSource, Sink};
use weir_projector::{DriverError, DriverReport, Projector, ProjectorDriver};

/// Run `driver` on tokio's blocking thread pool.
///
/// The driver loop is synchronous by design (one dedicated worker, inline
/// transformation and sink calls); this hands it to a blocking worker so an
/// async application can supervise it through a `JoinHandle`. Take a
/// [`CancelHandle`](weir_projector::CancelHandle) before spawning to stop the
/// driver from async context.
pub fn spawn_driver<S, P, O>(
    driver: ProjectorDriver<S, P, O>,
) -> JoinHandle<Result<DriverReport, DriverError>>
where
    S: EventSource + Send + 'static,
    O: Sink + Send + 'static,
    P: Projector<Event<S::Key, S::Value>, O::Item> + Send + 'static,
{
    tokio::task::spawn_blocking(move || driver.run())
}
