use anyhow::{Context, Result};
use global_hotkey::{GlobalHotKeyEvent, GlobalHotKeyManager, HotKeyState, hotkey::HotKey};

/// Named global key bindings.
///
/// Every registered binding is released when the registry is dropped.
pub struct HotkeyRegistry {
    manager: GlobalHotKeyManager,
    bindings: Vec<(String, HotKey)>,
}

impl HotkeyRegistry {
    pub fn new() -> Result<Self> {
        let manager = GlobalHotKeyManager::new().context("Failed to create hotkey manager")?;
        Ok(Self {
            manager,
            bindings: Vec::new(),
        })
    }

    /// Register `combo` (e.g. `ctrl+shift+KeyS`) under `name`.
    pub fn register(&mut self, name: &str, combo: &str) -> Result<()> {
        let hotkey = parse_combo(combo)?;

        self.manager
            .register(hotkey)
            .with_context(|| format!("Failed to register hotkey '{combo}' for {name}"))?;

        tracing::info!("Hotkey registered: {} ({})", name, combo);
        self.bindings.push((name.to_string(), hotkey));
        Ok(())
    }

    /// Name of the binding that was pressed, if any (non-blocking)
    pub fn poll(&self) -> Option<&str> {
        let receiver = GlobalHotKeyEvent::receiver();
        while let Ok(event) = receiver.try_recv() {
            if event.state != HotKeyState::Pressed {
                continue;
            }
            match self.name_for(event.id) {
                Some(name) => return Some(name),
                None => tracing::debug!("Hotkey event with unknown id {}", event.id),
            }
        }
        None
    }

    pub fn name_for(&self, id: u32) -> Option<&str> {
        self.bindings
            .iter()
            .find(|(_, hotkey)| hotkey.id() == id)
            .map(|(name, _)| name.as_str())
    }

    pub fn unregister_all(&mut self) {
        for (name, hotkey) in self.bindings.drain(..) {
            if let Err(e) = self.manager.unregister(hotkey) {
                tracing::warn!("Failed to unregister hotkey {}: {}", name, e);
            }
        }
    }
}

impl Drop for HotkeyRegistry {
    fn drop(&mut self) {
        self.unregister_all();
    }
}

pub(crate) fn parse_combo(combo: &str) -> Result<HotKey> {
    combo
        .parse::<HotKey>()
        .with_context(|| format!("Invalid hotkey '{combo}'"))
}
