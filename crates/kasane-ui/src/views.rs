//! Window bookkeeping on the slint event loop thread.

use std::cell::RefCell;
use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use kasane_overlay::{ViewMessage, WindowKind, WindowSpec};
use kasane_types::{AppEvent, Rect, WindowId};
use slint::{CloseRequestResponse, ComponentHandle, PhysicalPosition, PhysicalSize, PlatformError};

use crate::frame::{frame_windows, selection_region};
use crate::service::lock;
use crate::{EdgeWindow, SelectionWindow, TranslationWindow};

thread_local! {
    static VIEWS: RefCell<HashMap<WindowId, View>> = RefCell::new(HashMap::new());
}

/// What a view needs to talk back.
#[derive(Clone)]
pub(crate) struct Links {
    pub events: kanal::Sender<AppEvent>,
    pub live: Arc<Mutex<HashSet<WindowId>>>,
}

enum View {
    Selection(SelectionWindow),
    Boundary(Vec<EdgeWindow>),
    Translation(TranslationWindow),
}

impl View {
    fn set_visible(&self, visible: bool) -> Result<(), PlatformError> {
        match self {
            View::Selection(w) => show_or_hide(w, visible),
            View::Boundary(edges) => edges.iter().try_for_each(|w| show_or_hide(w, visible)),
            View::Translation(w) => show_or_hide(w, visible),
        }
    }
}

fn show_or_hide(component: &impl ComponentHandle, visible: bool) -> Result<(), PlatformError> {
    if visible { component.show() } else { component.hide() }
}

fn place(component: &impl ComponentHandle, bounds: Rect) {
    let window = component.window();
    window.set_position(PhysicalPosition::new(bounds.x, bounds.y));
    window.set_size(PhysicalSize::new(bounds.width, bounds.height));
}

fn send(events: &kanal::Sender<AppEvent>, event: AppEvent) {
    match events.try_send(event) {
        Ok(true) => {}
        Ok(false) => tracing::warn!("[SLINT] Event queue full, dropping selection result"),
        Err(_) => tracing::debug!("[SLINT] Event queue closed"),
    }
}

/// A window closed by the platform (e.g. Alt+F4) is forgotten right away
/// and dropped once its callback has returned.
fn on_close_requested(component: &impl ComponentHandle, id: WindowId, links: &Links, cancels_selection: bool) {
    let links = links.clone();
    component.window().on_close_requested(move || {
        lock(&links.live).remove(&id);
        if cancels_selection {
            send(&links.events, AppEvent::SelectionCancelled);
        }
        slint::Timer::single_shot(Duration::ZERO, move || {
            VIEWS.with_borrow_mut(|views| views.remove(&id));
        });
        CloseRequestResponse::HideWindow
    });
}

fn selection(id: WindowId, spec: &WindowSpec, links: &Links) -> Result<SelectionWindow, PlatformError> {
    let bounds = spec.bounds;
    let window = SelectionWindow::new()?;
    window.set_pinned(spec.always_on_top);
    place(&window, bounds);

    let weak = window.as_weak();
    let events = links.events.clone();
    window.on_confirmed(move |x, y, width, height| {
        let scale = weak.upgrade().map(|w| w.window().scale_factor()).unwrap_or(1.0);
        let event = match selection_region(bounds, scale, x, y, width, height) {
            Some(region) => AppEvent::SelectionConfirmed(region),
            None => {
                tracing::debug!("[SLINT] Empty selection, cancelling");
                AppEvent::SelectionCancelled
            }
        };
        send(&events, event);
    });

    let events = links.events.clone();
    window.on_cancelled(move || send(&events, AppEvent::SelectionCancelled));

    on_close_requested(&window, id, links, true);
    Ok(window)
}

fn boundary(id: WindowId, spec: &WindowSpec, border_width: u32, links: &Links) -> Result<Vec<EdgeWindow>, PlatformError> {
    frame_windows(spec.bounds, border_width, spec.click_through)
        .into_iter()
        .map(|(bounds, ring)| -> Result<EdgeWindow, PlatformError> {
            let window = EdgeWindow::new()?;
            window.set_pinned(spec.always_on_top);
            window.set_ring(ring as f32 / window.window().scale_factor());
            place(&window, bounds);
            on_close_requested(&window, id, links, false);
            Ok(window)
        })
        .collect()
}

fn translation(id: WindowId, spec: &WindowSpec, links: &Links) -> Result<TranslationWindow, PlatformError> {
    let window = TranslationWindow::new()?;
    window.set_pinned(spec.always_on_top);
    place(&window, spec.bounds);
    on_close_requested(&window, id, links, false);
    Ok(window)
}

pub(crate) fn open(id: WindowId, spec: WindowSpec, links: &Links) -> Result<(), PlatformError> {
    if spec.click_through && !matches!(spec.kind, WindowKind::Boundary { .. }) {
        // only the boundary can be split around its inside
        tracing::debug!("[SLINT] Click-through not available for {:?}, window takes input", spec.kind);
    }

    let view = match spec.kind {
        WindowKind::Selection => View::Selection(selection(id, &spec, links)?),
        WindowKind::Boundary { border_width } => View::Boundary(boundary(id, &spec, border_width, links)?),
        WindowKind::Translation => View::Translation(translation(id, &spec, links)?),
    };

    if spec.visible {
        view.set_visible(true)?;
    }
    tracing::debug!("[SLINT] Opened {:?} {:?} at {:?}", spec.kind, id, spec.bounds);

    VIEWS.with_borrow_mut(|views| views.insert(id, view));
    Ok(())
}

pub(crate) fn post(id: WindowId, message: ViewMessage) {
    VIEWS.with_borrow(|views| match (views.get(&id), message) {
        (
            Some(View::Translation(window)),
            ViewMessage::Translation {
                original_text,
                translated_text,
            },
        ) => {
            window.set_original_text(original_text.into());
            window.set_translated_text(translated_text.into());
        }
        (Some(_), _) => tracing::debug!("[SLINT] {:?} has no translation view", id),
        (None, _) => tracing::debug!("[SLINT] Message for unknown {:?}", id),
    });
}

pub(crate) fn set_visible(id: WindowId, visible: bool) {
    VIEWS.with_borrow(|views| {
        if let Some(view) = views.get(&id)
            && let Err(e) = view.set_visible(visible)
        {
            tracing::warn!("[SLINT] Failed to change visibility of {:?}: {}", id, e);
        }
    });
}

pub(crate) fn close(id: WindowId) {
    // release the borrow before the component is dropped
    let view = VIEWS.with_borrow_mut(|views| views.remove(&id));
    if let Some(view) = view
        && let Err(e) = view.set_visible(false)
    {
        tracing::debug!("[SLINT] Failed to hide {:?} before closing: {}", id, e);
    }
}
