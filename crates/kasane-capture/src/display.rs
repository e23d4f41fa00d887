use kasane_types::{Display, Rect};

/// Snapshot of the connected displays.
///
/// Always holds at least one display, so lookups can't fail: a point that
/// lies on no display (e.g. just after an unplug) resolves to the primary.
#[derive(Debug, Clone)]
pub struct DisplayLayout {
    displays: Vec<Display>,
}

impl DisplayLayout {
    pub fn new(displays: Vec<Display>) -> Option<Self> {
        if displays.is_empty() {
            return None;
        }
        Some(Self { displays })
    }

    pub fn displays(&self) -> &[Display] {
        &self.displays
    }

    /// The display flagged primary, or the first one enumerated if none is.
    pub fn primary(&self) -> &Display {
        self.displays
            .iter()
            .find(|d| d.is_primary)
            .unwrap_or(&self.displays[0])
    }

    pub fn display_for_point(&self, x: i32, y: i32) -> &Display {
        self.displays
            .iter()
            .find(|d| d.bounds.contains(x, y))
            .unwrap_or_else(|| {
                tracing::debug!(x, y, "point is off every display, using primary");
                self.primary()
            })
    }

    /// A rectangle belongs to whichever display contains its center.
    pub fn display_for_region(&self, rect: &Rect) -> &Display {
        let (cx, cy) = rect.center();
        self.display_for_point(cx, cy)
    }
}
