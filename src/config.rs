use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Quiet period after the last reply fragment before the streaming
/// tail message is marked final.
pub const DEFAULT_FINALIZE_DEBOUNCE_MS: u64 = 1000;

/// Engine tuning knobs. Deserializable so hosts can load it from their
/// own settings store; `Default` matches production behavior.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct EngineConfig {
    /// Debounce interval for finalizing a streamed reply, in milliseconds.
    pub finalize_debounce_ms: u64,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            finalize_debounce_ms: DEFAULT_FINALIZE_DEBOUNCE_MS,
        }
    }
}

impl EngineConfig {
    pub fn finalize_debounce(&self) -> Duration {
        Duration::from_millis(self.finalize_debounce_ms)
    }
}
