use serde::{Deserialize, Serialize};

/// Configuration for the chunk-combining source
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CombinerConfig {
    /// Algorithm identifier expected as the prefix of `Chunk-Checksum` and
    /// `Original-Checksum` headers
    /// Default: "crc32"
    #[serde(default = "default_checksum_algorithm")]
    pub checksum_algorithm: String,

    /// Algorithm identifier expected as the prefix of `Chunk-Hash` and
    /// `Original-Hash` headers
    /// Default: "sha256"
    #[serde(default = "default_hash_algorithm")]
    pub hash_algorithm: String,
}

fn default_checksum_algorithm() -> String {
    "crc32".to_string()
}

fn default_hash_algorithm() -> String {
    "sha256".to_string()
}

impl Default for CombinerConfig {
    fn default() -> Self {
        Self {
            checksum_algorithm: default_checksum_algorithm(),
            hash_algorithm: default_hash_algorithm(),
        }
    }
}

impl CombinerConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_checksum_algorithm(mut self, algorithm: impl Into<String>) -> Self {
        self.checksum_algorithm = algorithm.into();
        self
    }

    pub fn with_hash_algorithm(mut self, algorithm: impl Into<String>) -> Self {
        self.hash_algorithm = algorithm.into();
        self
    }
}
