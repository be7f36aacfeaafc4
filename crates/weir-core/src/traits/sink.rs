//! The push-based sink contract.

use crate::error::Result;

/// A push-based consumer of produced items with an explicit lifecycle.
///
/// Sinks are used object-safely (`&mut dyn Sink<Item = T>`) so that
/// transformations can be written against any destination.
pub trait Sink {
    type Item;

    /// Consume one item. An error is fatal to the producing pipeline.
    fn accept(&mut self, item: Self::Item) -> Result<()>;

    /// Flush and release resources. Accepting further items after `close`
    /// is an error.
    fn close(&mut self) -> Result<()>;
}
