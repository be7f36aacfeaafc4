use thiserror::Error;

#[derive(Error, Debug)]
pub enum WeirError {
    #[error("source fault: {0}")]
    Source(String),

    #[error("protocol error: {0}")]
    Protocol(String),

    #[error("source is closed")]
    Closed,

    #[error("poll interrupted")]
    Interrupted,

    #[error("sink error: {0}")]
    Sink(String),

    #[error("configuration error: {0}")]
    Config(String),

    #[error("other error: {0}")]
    Other(#[from] anyhow::Error),
}

impl WeirError {
    /// True for the errors a supervising loop absorbs silently: they are the
    /// expected effect of cooperative cancellation, not a fault.
    pub fn is_interruption(&self) -> bool {
        matches!(self, WeirError::Interrupted)
    }
}

pub type Result<T> = std::result::Result<T, WeirError>;

// Custom Error Types:
//
// Weir supports custom error types through the `#[from] anyhow::Error` variant.
// Any error implementing `std::error::Error + Send + Sync + 'static` can be
// converted to `WeirError::Other`, so `EventSource` and `Sink` implementations
// backed by external transports can use `?` on their own error types.
//
// For better control, implement `From<YourError> for WeirError` directly.
