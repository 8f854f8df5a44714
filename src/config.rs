//! Engine timing configuration.

use serde::{Deserialize, Serialize};

/// Fixed timing parameters for the round engine.
///
/// The surrounding application owns where these values come from; the engine
/// takes them as-is at startup and never re-reads or validates them.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Length of the betting window, in whole seconds.
    pub betting_window_secs: u64,
    /// Scheduler tick period, in milliseconds.
    pub tick_interval_ms: u64,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            betting_window_secs: 10,
            tick_interval_ms: 1_000,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_the_one_second_tick_ten_second_window() {
        let config = EngineConfig::default();
        assert_eq!(config.betting_window_secs, 10);
        assert_eq!(config.tick_interval_ms, 1_000);
    }
}
