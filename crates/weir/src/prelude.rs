//! Weir Prelude
//!
//! Import this to get all commonly used types and traits:
//!
//! ```
//! use weir::prelude::*;
//! ```

// Core types
pub use crate::{AckToken, Event, Header, Result, WeirError};

// Configs
pub use crate::{CombinerConfig, DriverConfig};

// Contracts
pub use crate::{EventSource, Interrupt, Projector, Sink, Splitter};

// Chunk reassembly
pub use crate::{BytesSplitter, CombiningEventSource, StringSplitter};

// Driver
pub use crate::{
    project_fn, CancelHandle, DriverError, DriverReport, ProjectorDriver, ProjectorDriverBuilder,
    StopReason,
};

// In-memory endpoints
pub use crate::{DeadLetterLog, InMemoryEventSource, MemorySink};

// Re-export common external deps
pub use anyhow;
pub use tracing;
