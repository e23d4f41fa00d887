use image::RgbaImage;
use kasane_types::{Display, Rect};
use xcap::Monitor;

use crate::error::CaptureError;

/// Platform seam for display enumeration and full-frame grabs.
///
/// Display bounds are in the same units as the captured frames, so a
/// display's frame is exactly `bounds.width` by `bounds.height` pixels and
/// regions, crops and window placement all share one coordinate space.
///
/// Implementations that can map a display straight to its frame buffer
/// should do so; [`source_index_for`] is only the fallback for APIs that
/// enumerate sources without display ids.
pub trait FrameSource: Send + Sync {
    fn displays(&self) -> Result<Vec<Display>, CaptureError>;

    /// Full frame of `display` at native resolution.
    fn capture_display(&self, display: &Display) -> Result<RgbaImage, CaptureError>;
}

/// Ordinal mapping from a display to an enumerated capture source.
///
/// The primary display takes source 0, the remaining displays take sources
/// 1.. in enumeration order. Anything that doesn't map falls back to source 0.
/// Returns `None` only when there are no sources at all.
pub fn source_index_for(displays: &[Display], target: &Display, source_count: usize) -> Option<usize> {
    if source_count == 0 {
        return None;
    }

    let ordinal = if target.is_primary {
        Some(0)
    } else {
        displays
            .iter()
            .filter(|d| !d.is_primary)
            .position(|d| d.id == target.id)
            .map(|i| i + 1)
    };

    match ordinal {
        Some(i) if i < source_count => Some(i),
        _ => Some(0),
    }
}

/// Scale bounds reported in points by `scale` into pixels.
///
/// Positions scale with the size, which is exact for the common single-scale
/// layout; mixed-scale arrangements only approximate the OS's pixel space.
pub fn points_to_pixels(bounds: Rect, scale: f32) -> Rect {
    if !scale.is_finite() || scale <= 0.0 {
        return bounds;
    }
    let scale = scale as f64;
    let pixels = |v: f64| (v * scale).round();
    Rect::new(
        pixels(bounds.x as f64).clamp(i32::MIN as f64, i32::MAX as f64) as i32,
        pixels(bounds.y as f64).clamp(i32::MIN as f64, i32::MAX as f64) as i32,
        pixels(bounds.width as f64).clamp(0.0, u32::MAX as f64) as u32,
        pixels(bounds.height as f64).clamp(0.0, u32::MAX as f64) as u32,
    )
}

/// `xcap`-backed frame source.
#[derive(Debug, Default, Clone, Copy)]
pub struct XcapSource;

impl XcapSource {
    pub fn new() -> Self {
        Self
    }

    fn monitors() -> Result<Vec<Monitor>, CaptureError> {
        let monitors =
            Monitor::all().map_err(|e| CaptureError::NoSource(format!("failed to enumerate monitors: {e}")))?;
        if monitors.is_empty() {
            return Err(CaptureError::NoSource("no monitors found".to_string()));
        }
        Ok(monitors)
    }

    /// Map a pointer position as the OS reports it into frame pixels.
    pub fn pointer_to_pixels(&self, x: i32, y: i32) -> (i32, i32) {
        native_point(x, y)
    }
}

fn to_display(monitor: &Monitor) -> Display {
    let bounds = Rect::new(monitor.x(), monitor.y(), monitor.width(), monitor.height());
    Display::new(
        monitor.id(),
        native_bounds(bounds, monitor.scale_factor()),
        monitor.is_primary(),
    )
}

// macOS reports monitor geometry and the pointer in points; frames are pixels.
#[cfg(target_os = "macos")]
fn native_bounds(bounds: Rect, scale: f32) -> Rect {
    points_to_pixels(bounds, scale)
}

#[cfg(not(target_os = "macos"))]
fn native_bounds(bounds: Rect, _scale: f32) -> Rect {
    bounds
}

#[cfg(target_os = "macos")]
fn native_point(x: i32, y: i32) -> (i32, i32) {
    let Ok(monitor) = Monitor::from_point(x, y) else {
        return (x, y);
    };
    let pixels = points_to_pixels(Rect::new(x, y, 0, 0), monitor.scale_factor());
    (pixels.x, pixels.y)
}

#[cfg(not(target_os = "macos"))]
fn native_point(x: i32, y: i32) -> (i32, i32) {
    (x, y)
}

impl FrameSource for XcapSource {
    fn displays(&self) -> Result<Vec<Display>, CaptureError> {
        Ok(Self::monitors()?.iter().map(to_display).collect())
    }

    fn capture_display(&self, display: &Display) -> Result<RgbaImage, CaptureError> {
        let monitors = Self::monitors()?;

        let monitor = match monitors.iter().find(|m| m.id() == display.id) {
            Some(m) => m,
            None => {
                let displays: Vec<Display> = monitors.iter().map(to_display).collect();
                let index = source_index_for(&displays, display, monitors.len())
                    .ok_or_else(|| CaptureError::NoSource("no monitors found".to_string()))?;
                let display_id = display.id;
                tracing::debug!(
                    display_id,
                    index,
                    "display id not enumerated, matching source by order"
                );
                &monitors[index]
            }
        };

        monitor
            .capture_image()
            .map_err(|e| CaptureError::NoSource(format!("failed to capture display {}: {e}", display.id)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn displays() -> Vec<Display> {
        vec![
            Display::new(10, Rect::new(-1920, 0, 1920, 1080), false),
            Display::new(11, Rect::new(0, 0, 2560, 1440), true),
            Display::new(12, Rect::new(2560, 0, 1920, 1080), false),
        ]
    }

    #[test]
    fn primary_maps_to_first_source() {
        let d = displays();
        assert_eq!(source_index_for(&d, &d[1], 3), Some(0));
    }

    #[test]
    fn secondaries_follow_in_enumeration_order() {
        let d = displays();
        assert_eq!(source_index_for(&d, &d[0], 3), Some(1));
        assert_eq!(source_index_for(&d, &d[2], 3), Some(2));
    }

    #[test]
    fn unmatched_falls_back_to_first_source() {
        let d = displays();
        // fewer sources than displays
        assert_eq!(source_index_for(&d, &d[2], 2), Some(0));
        // unknown display
        let stranger = Display::new(99, Rect::new(0, 0, 10, 10), false);
        assert_eq!(source_index_for(&d, &stranger, 3), Some(0));
    }

    #[test]
    fn retina_points_become_pixels() {
        let bounds = points_to_pixels(Rect::new(0, 0, 1440, 900), 2.0);
        assert_eq!(bounds, Rect::new(0, 0, 2880, 1800));

        let beside = points_to_pixels(Rect::new(-1280, 0, 1280, 800), 2.0);
        assert_eq!(beside, Rect::new(-2560, 0, 2560, 1600));

        let fractional = points_to_pixels(Rect::new(100, 50, 1707, 960), 1.5);
        assert_eq!(fractional, Rect::new(150, 75, 2561, 1440));
    }

    #[test]
    fn unusable_scale_leaves_bounds_alone() {
        let bounds = Rect::new(10, 20, 300, 200);
        for scale in [0.0, -1.0, f32::NAN, f32::INFINITY] {
            assert_eq!(points_to_pixels(bounds, scale), bounds);
        }
        assert_eq!(points_to_pixels(bounds, 1.0), bounds);
    }

    #[test]
    fn no_sources() {
        let d = displays();
        assert_eq!(source_index_for(&d, &d[1], 0), None);
    }
}
