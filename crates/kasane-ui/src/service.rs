use std::collections::HashSet;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};

use enigo::{Enigo, Mouse, Settings};
use kasane_capture::{FrameSource, XcapSource};
use kasane_overlay::{ViewMessage, WindowError, WindowService, WindowSpec};
use kasane_types::{AppEvent, Display, WindowId};

use crate::views::{self, Links};

pub(crate) fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

/// [`WindowService`] backed by slint windows.
///
/// Every call returns immediately; the window work is queued onto the slint
/// event loop, which must be running on the main thread. Selection results
/// are sent as [`AppEvent`]s on `events`.
pub struct SlintWindows {
    source: XcapSource,
    links: Links,
    next_id: AtomicU64,
}

impl SlintWindows {
    pub fn new(events: kanal::Sender<AppEvent>) -> Self {
        Self {
            source: XcapSource::new(),
            links: Links {
                events,
                live: Arc::new(Mutex::new(HashSet::new())),
            },
            next_id: AtomicU64::new(1),
        }
    }

    fn is_live(&self, id: WindowId) -> bool {
        lock(&self.links.live).contains(&id)
    }

    fn on_ui_thread(&self, f: impl FnOnce() + Send + 'static) -> Result<(), WindowError> {
        slint::invoke_from_event_loop(f).map_err(|e| {
            tracing::error!("[SLINT] Event loop unavailable: {}", e);
            WindowError::Unavailable
        })
    }
}

impl WindowService for SlintWindows {
    fn displays(&self) -> Vec<Display> {
        self.source.displays().unwrap_or_else(|e| {
            tracing::warn!("[SLINT] Failed to enumerate displays: {}", e);
            Vec::new()
        })
    }

    fn pointer_position(&self) -> Option<(i32, i32)> {
        let enigo = Enigo::new(&Settings::default())
            .inspect_err(|e| tracing::debug!("[SLINT] No input connection for pointer query: {}", e))
            .ok()?;
        let (x, y) = enigo
            .location()
            .inspect_err(|e| tracing::debug!("[SLINT] Pointer position unavailable: {}", e))
            .ok()?;
        Some(self.source.pointer_to_pixels(x, y))
    }

    fn open(&self, spec: WindowSpec) -> Result<WindowId, WindowError> {
        let id = WindowId(self.next_id.fetch_add(1, Ordering::Relaxed));
        lock(&self.links.live).insert(id);

        let links = self.links.clone();
        let queued = self.on_ui_thread(move || {
            if let Err(e) = views::open(id, spec, &links) {
                tracing::error!("[SLINT] Failed to open {:?} window: {}", spec.kind, e);
                lock(&links.live).remove(&id);
            }
        });

        if let Err(e) = queued {
            lock(&self.links.live).remove(&id);
            return Err(e);
        }
        Ok(id)
    }

    fn post(&self, id: WindowId, message: ViewMessage) -> Result<(), WindowError> {
        if !self.is_live(id) {
            return Err(WindowError::Unknown(id));
        }
        self.on_ui_thread(move || views::post(id, message))
    }

    fn set_visible(&self, id: WindowId, visible: bool) -> Result<(), WindowError> {
        if !self.is_live(id) {
            return Err(WindowError::Unknown(id));
        }
        self.on_ui_thread(move || views::set_visible(id, visible))
    }

    fn close(&self, id: WindowId) {
        lock(&self.links.live).remove(&id);
        if self.on_ui_thread(move || views::close(id)).is_err() {
            tracing::debug!("[SLINT] Could not close {:?}, event loop gone", id);
        }
    }

    fn is_destroyed(&self, id: WindowId) -> bool {
        !self.is_live(id)
    }
}
