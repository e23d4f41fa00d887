use crate::geometry::Region;

/// Opaque handle to a window owned by the window service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct WindowId(pub u64);

/// Triggers consumed by the overlay coordinator.
///
/// Hotkeys and the selection view produce these; the coordinator handles
/// them one at a time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AppEvent {
    BeginSelection,
    SelectionConfirmed(Region),
    SelectionCancelled,
    TranslateNow,
    ToggleVisibility,
    Shutdown,
}
