// In crates/strategies/src/types.rs

use serde::{Deserialize, Serialize};

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct MACrossoverSettings {
    /// Number of bars in the fast simple moving average.
    pub short_window: u32,
    /// Number of bars in the slow simple moving average. Must exceed `short_window`.
    pub long_window: u32,
}

impl Default for MACrossoverSettings {
    fn default() -> Self {
        Self {
            short_window: 20,
            long_window: 50,
        }
    }
}
