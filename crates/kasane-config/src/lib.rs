use std::env;

use serde::{Deserialize, Serialize};

use self::capture::CaptureConfig;
use self::hotkey::HotkeyConfig;
use self::overlay::OverlayConfig;
use self::worker::WorkerConfig;

pub mod capture;
pub mod hotkey;
pub mod overlay;
pub mod worker;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub worker: WorkerConfig,
    pub capture: CaptureConfig,
    pub overlay: OverlayConfig,
    pub hotkeys: HotkeyConfig,

    /// Verbose logging regardless of `RUST_LOG`
    pub debug: bool,
}

impl Config {
    pub fn new() -> Self {
        let debug = env_flag("KASANE_DEBUG").unwrap_or(false);

        Config {
            worker: WorkerConfig::new(),
            capture: CaptureConfig::new(),
            overlay: OverlayConfig::new(),
            hotkeys: HotkeyConfig::new(),

            debug,
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::new()
    }
}

pub(crate) fn env_parse<T: std::str::FromStr>(key: &str) -> Option<T> {
    env::var(key).ok().and_then(|v| v.trim().parse().ok())
}

pub(crate) fn env_flag(key: &str) -> Option<bool> {
    env::var(key)
        .ok()
        .map(|v| matches!(v.trim().to_ascii_lowercase().as_str(), "1" | "true" | "yes" | "on"))
}
