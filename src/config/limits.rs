//! Per-connection resource limits configuration.

use serde::Deserialize;

/// Per-connection resource limits.
///
/// These bound how much memory a single slow or abusive client can pin.
#[derive(Debug, Clone, Deserialize)]
pub struct LimitsConfig {
    /// Maximum accepted input line length in bytes (default: 8192).
    /// A longer line terminates the connection.
    #[serde(default = "default_max_line_length")]
    pub max_line_length: usize,
    /// Outgoing queue capacity per connection, in lines (default: 256).
    /// A relayed message that finds the queue full counts as a failed send.
    #[serde(default = "default_send_queue")]
    pub send_queue: usize,
    /// Time allowed to flush queued output after a connection ends (default: 2000ms).
    #[serde(default = "default_drain_timeout_ms")]
    pub drain_timeout_ms: u64,
}

impl Default for LimitsConfig {
    fn default() -> Self {
        Self {
            max_line_length: default_max_line_length(),
            send_queue: default_send_queue(),
            drain_timeout_ms: default_drain_timeout_ms(),
        }
    }
}

fn default_max_line_length() -> usize {
    8192
}

fn default_send_queue() -> usize {
    256
}

fn default_drain_timeout_ms() -> u64 {
    2000
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_values_are_correct() {
        let config = LimitsConfig::default();
        assert_eq!(config.max_line_length, 8192);
        assert_eq!(config.send_queue, 256);
        assert_eq!(config.drain_timeout_ms, 2000);
    }

    #[test]
    fn partial_section_keeps_other_defaults() {
        let config: LimitsConfig = toml::from_str("send_queue = 16").unwrap();
        assert_eq!(config.send_queue, 16);
        assert_eq!(config.max_line_length, 8192);
    }
}
