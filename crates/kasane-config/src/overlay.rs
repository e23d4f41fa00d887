use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::env_parse;

fn default_window_padding() -> u32 {
    4
}

fn default_edge_margin() -> u32 {
    8
}

fn default_top_margin() -> u32 {
    32
}

fn default_boundary_width() -> u32 {
    3
}

fn default_min_window_width() -> u32 {
    60
}

fn default_min_window_height() -> u32 {
    20
}

fn default_close_settle_ms() -> u64 {
    150
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OverlayConfig {
    /// Outset applied around each text block's bounds
    #[serde(default = "default_window_padding")]
    pub window_padding: u32,
    /// Minimum distance kept from a display's left, right and bottom edges
    #[serde(default = "default_edge_margin")]
    pub edge_margin: u32,
    /// Minimum distance kept from a display's top edge (menu bars, notches)
    #[serde(default = "default_top_margin")]
    pub top_margin: u32,
    #[serde(default = "default_boundary_width")]
    pub boundary_width: u32,
    #[serde(default = "default_min_window_width")]
    pub min_window_width: u32,
    #[serde(default = "default_min_window_height")]
    pub min_window_height: u32,
    /// Pause after closing translation windows before capturing
    #[serde(default = "default_close_settle_ms")]
    pub close_settle_ms: u64,
    /// Re-translate the monitored region on this interval, 0 disables
    pub auto_interval_ms: u64,
}

impl OverlayConfig {
    pub fn new() -> Self {
        Self {
            window_padding: env_parse("KASANE_WINDOW_PADDING").unwrap_or_else(default_window_padding),
            close_settle_ms: env_parse("KASANE_CLOSE_SETTLE_MS").unwrap_or_else(default_close_settle_ms),
            auto_interval_ms: env_parse("KASANE_AUTO_INTERVAL_MS").unwrap_or(0),
            ..Self::default()
        }
    }

    pub fn close_settle(&self) -> Duration {
        Duration::from_millis(self.close_settle_ms)
    }

    pub fn auto_interval(&self) -> Option<Duration> {
        (self.auto_interval_ms > 0).then(|| Duration::from_millis(self.auto_interval_ms))
    }
}

impl Default for OverlayConfig {
    fn default() -> Self {
        Self {
            window_padding: default_window_padding(),
            edge_margin: default_edge_margin(),
            top_margin: default_top_margin(),
            boundary_width: default_boundary_width(),
            min_window_width: default_min_window_width(),
            min_window_height: default_min_window_height(),
            close_settle_ms: default_close_settle_ms(),
            auto_interval_ms: 0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_json_falls_back_to_defaults() {
        let config: OverlayConfig = serde_json::from_str(r#"{"edge_margin": 12}"#).unwrap();
        assert_eq!(config.edge_margin, 12);
        assert_eq!(config.top_margin, default_top_margin());
        assert_eq!(config.auto_interval(), None);
    }
}
