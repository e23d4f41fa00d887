use std::time::Duration;

use kasane_capture::HotkeyRegistry;
use kasane_config::hotkey::HotkeyConfig;
use kasane_types::AppEvent;
use slint::{Timer, TimerMode};

const POLL_INTERVAL: Duration = Duration::from_millis(50);

pub fn event_for(name: &str) -> Option<AppEvent> {
    match name {
        "select" => Some(AppEvent::BeginSelection),
        "translate" => Some(AppEvent::TranslateNow),
        "toggle" => Some(AppEvent::ToggleVisibility),
        "quit" => Some(AppEvent::Shutdown),
        _ => None,
    }
}

/// Global hotkeys polled on the slint event loop.
///
/// The registry has to live on the thread whose event loop delivers the
/// key events, so it is owned by a timer on the main thread. Dropping the
/// listener unregisters every binding.
pub struct HotkeyListener {
    _timer: Timer,
}

impl HotkeyListener {
    pub fn install(config: &HotkeyConfig, events: kanal::Sender<AppEvent>) -> anyhow::Result<Self> {
        let mut registry = HotkeyRegistry::new()?;
        for (name, combo) in config.bindings() {
            // one bad combo shouldn't cost the others
            if let Err(e) = registry.register(name, combo) {
                tracing::error!("{:#}", e);
            }
        }

        let timer = Timer::default();
        timer.start(TimerMode::Repeated, POLL_INTERVAL, move || {
            while let Some(name) = registry.poll() {
                let Some(event) = event_for(name) else {
                    continue;
                };
                tracing::debug!("Hotkey pressed: {}", name);
                if !matches!(events.try_send(event), Ok(true)) {
                    tracing::warn!("Dropped hotkey '{}', event queue unavailable", name);
                }
            }
        });

        Ok(Self { _timer: timer })
    }
}
