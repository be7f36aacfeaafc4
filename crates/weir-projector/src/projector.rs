//! The transformation contract between a driver and its destination.

use weir_core::{Result, Sink};

/// Transforms one input event into zero or more items pushed to a sink.
///
/// The driver invokes `project` inline on its own worker for every polled
/// event. Implementations that batch output internally can additionally
/// override [`stalled`](Projector::stalled): the driver calls it on the first
/// consecutive stall, giving the transformation a chance to flush partial
/// batches while the source is quiet. The default is a no-op, so plain
/// transformations opt into stall-awareness simply by overriding it.
pub trait Projector<In, Out> {
    fn project(&mut self, event: In, sink: &mut dyn Sink<Item = Out>) -> Result<()>;

    /// Called once per stall streak, on the first stall only.
    fn stalled(&mut self, sink: &mut dyn Sink<Item = Out>) -> Result<()> {
        let _ = sink;
        Ok(())
    }
}

/// Adapter turning a closure into a [`Projector`] (without a stall hook).
pub struct FnProjector<F>(F);

/// Wrap a closure as a [`Projector`].
pub fn project_fn<F>(f: F) -> FnProjector<F> {
    FnProjector(f)
}

impl<In, Out, F> Projector<In, Out> for FnProjector<F>
where
    F: FnMut(In, &mut dyn Sink<Item = Out>) -> Result<()>,
{
    fn project(&mut self, event: In, sink: &mut dyn Sink<Item = Out>) -> Result<()> {
        (self.0)(event, sink)
    }
}
