use serde::{Deserialize, Serialize};

/// Configuration for the projector driver
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DriverConfig {
    /// Upper bound on each source poll (milliseconds)
    /// Default: 5000ms
    #[serde(default = "default_poll_timeout_ms")]
    pub poll_timeout_ms: u64,

    /// Stop cleanly after this many events; negative = unlimited
    /// Default: -1
    #[serde(default = "default_limit")]
    pub limit: i64,

    /// Abort cleanly after this many consecutive stalls; 0 = unlimited
    /// Default: 0
    #[serde(default = "default_max_stalls")]
    pub max_stalls: u64,

    /// How many events between throughput reports (and acknowledgement
    /// flushes)
    /// Default: 10000
    #[serde(default = "default_report_batch_size")]
    pub report_batch_size: u64,
}

fn default_poll_timeout_ms() -> u64 {
    5_000
}

fn default_limit() -> i64 {
    -1
}

fn default_max_stalls() -> u64 {
    0
}

fn default_report_batch_size() -> u64 {
    10_000
}

impl Default for DriverConfig {
    fn default() -> Self {
        Self {
            poll_timeout_ms: default_poll_timeout_ms(),
            limit: default_limit(),
            max_stalls: default_max_stalls(),
            report_batch_size: default_report_batch_size(),
        }
    }
}

impl DriverConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_poll_timeout_ms(mut self, ms: u64) -> Self {
        self.poll_timeout_ms = ms;
        self
    }

    pub fn with_limit(mut self, limit: i64) -> Self {
        self.limit = limit;
        self
    }

    pub fn with_max_stalls(mut self, max: u64) -> Self {
        self.max_stalls = max;
        self
    }

    pub fn with_report_batch_size(mut self, size: u64) -> Self {
        self.report_batch_size = size;
        self
    }

    /// The configured limit as an iteration bound.
    pub fn effective_limit(&self) -> u64 {
        if self.limit < 0 {
            u64::MAX
        } else {
            self.limit as u64
        }
    }
}
