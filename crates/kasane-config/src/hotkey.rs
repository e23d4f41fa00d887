use std::env;

use serde::{Deserialize, Serialize};

fn default_select() -> String {
    "ctrl+shift+KeyS".to_string()
}

fn default_translate() -> String {
    "ctrl+shift+KeyT".to_string()
}

fn default_toggle() -> String {
    "ctrl+shift+KeyH".to_string()
}

fn default_quit() -> String {
    "ctrl+shift+KeyQ".to_string()
}

/// Key combinations in `global-hotkey` syntax, e.g. `ctrl+shift+KeyS`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct HotkeyConfig {
    #[serde(default = "default_select")]
    pub select: String,
    #[serde(default = "default_translate")]
    pub translate: String,
    #[serde(default = "default_toggle")]
    pub toggle: String,
    #[serde(default = "default_quit")]
    pub quit: String,
}

impl HotkeyConfig {
    pub fn new() -> Self {
        Self {
            select: env::var("KASANE_HOTKEY_SELECT").unwrap_or_else(|_| default_select()),
            translate: env::var("KASANE_HOTKEY_TRANSLATE").unwrap_or_else(|_| default_translate()),
            toggle: env::var("KASANE_HOTKEY_TOGGLE").unwrap_or_else(|_| default_toggle()),
            quit: env::var("KASANE_HOTKEY_QUIT").unwrap_or_else(|_| default_quit()),
        }
    }

    /// (name, combination) pairs in registration order
    pub fn bindings(&self) -> [(&'static str, &str); 4] {
        [
            ("select", self.select.as_str()),
            ("translate", self.translate.as_str()),
            ("toggle", self.toggle.as_str()),
            ("quit", self.quit.as_str()),
        ]
    }
}

impl Default for HotkeyConfig {
    fn default() -> Self {
        Self {
            select: default_select(),
            translate: default_translate(),
            toggle: default_toggle(),
            quit: default_quit(),
        }
    }
}
