use kasane_types::{Display, Rect, WindowId};

use crate::error::WindowError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum WindowKind {
    /// Full-display surface the user drags a rectangle on
    Selection,
    /// Frame drawn around the monitored region
    Boundary { border_width: u32 },
    /// One translated text block
    Translation,
}

/// Everything needed to open an overlay window.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WindowSpec {
    pub kind: WindowKind,
    pub bounds: Rect,
    pub always_on_top: bool,
    /// Mouse input passes through to whatever is underneath
    pub click_through: bool,
    pub visible: bool,
}

impl WindowSpec {
    pub fn selection(bounds: Rect) -> Self {
        Self {
            kind: WindowKind::Selection,
            bounds,
            always_on_top: true,
            click_through: false,
            visible: true,
        }
    }

    pub fn boundary(bounds: Rect, border_width: u32) -> Self {
        Self {
            kind: WindowKind::Boundary { border_width },
            bounds,
            always_on_top: true,
            click_through: true,
            visible: true,
        }
    }

    pub fn translation(bounds: Rect, visible: bool) -> Self {
        Self {
            kind: WindowKind::Translation,
            bounds,
            always_on_top: true,
            click_through: false,
            visible,
        }
    }
}

/// Structured content pushed to a window's view.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ViewMessage {
    Translation {
        original_text: String,
        translated_text: String,
    },
}

/// The platform's display and window capabilities.
///
/// Calls must not block: implementations hand the work to their UI thread
/// and return. Selection results come back as `AppEvent`s on the channel the
/// implementation was built with.
pub trait WindowService: Send + Sync {
    fn displays(&self) -> Vec<Display>;

    /// Global pointer position, if the platform can tell.
    fn pointer_position(&self) -> Option<(i32, i32)>;

    fn open(&self, spec: WindowSpec) -> Result<WindowId, WindowError>;

    fn post(&self, id: WindowId, message: ViewMessage) -> Result<(), WindowError>;

    fn set_visible(&self, id: WindowId, visible: bool) -> Result<(), WindowError>;

    fn close(&self, id: WindowId);

    fn is_destroyed(&self, id: WindowId) -> bool;
}
