//! Engine configuration
//!
//! Limits applied by the compiler and the cursor codec.

use serde::{Deserialize, Serialize};

/// Engine configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Largest page size a Token may request (default: 1000)
    #[serde(default = "default_max_limit")]
    pub max_limit: u64,

    /// Longest cursor string accepted on decode (default: 4096)
    #[serde(default = "default_max_cursor_len")]
    pub max_cursor_len: usize,

    /// Deepest preload nesting accepted (default: 8)
    #[serde(default = "default_max_preload_depth")]
    pub max_preload_depth: usize,
}

fn default_max_limit() -> u64 {
    1000
}

fn default_max_cursor_len() -> usize {
    4096
}

fn default_max_preload_depth() -> usize {
    8
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            max_limit: default_max_limit(),
            max_cursor_len: default_max_cursor_len(),
            max_preload_depth: default_max_preload_depth(),
        }
    }
}

impl EngineConfig {
    /// Loads a config from JSON; absent keys take their defaults
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    /// Create a config with the given page-size ceiling
    pub fn with_max_limit(max_limit: u64) -> Self {
        Self {
            max_limit,
            ..Default::default()
        }
    }
}
