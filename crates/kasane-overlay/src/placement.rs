//! Where overlay windows go.
//!
//! Translation windows are shifted back onto their display; the boundary
//! frame is trimmed instead so its outline stays aligned with the region.

use kasane_capture::DisplayLayout;
use kasane_config::overlay::OverlayConfig;
use kasane_types::geometry::saturate;
use kasane_types::{Rect, Region, TextBlock};

/// Keep `rect` inside `display`, `margin` pixels from the left, right and
/// bottom edges and `top_margin` pixels from the top.
///
/// The rectangle is moved rather than trimmed; it only shrinks when it is
/// larger than the space available.
pub fn clamp_to_display(rect: Rect, display: &Rect, margin: u32, top_margin: u32) -> Rect {
    // i64 throughout: `rect` may carry anything the worker reported
    let min_x = display.x as i64 + margin as i64;
    let min_y = display.y as i64 + top_margin as i64;
    let max_right = display.right() as i64 - margin as i64;
    let max_bottom = display.bottom() as i64 - margin as i64;

    let width = (rect.width as i64).min((max_right - min_x).max(1));
    let height = (rect.height as i64).min((max_bottom - min_y).max(1));

    let x = (rect.x as i64).min(max_right - width).max(min_x);
    let y = (rect.y as i64).min(max_bottom - height).max(min_y);

    Rect::new(saturate(x), saturate(y), width as u32, height as u32)
}

/// Screen bounds of the window showing `block`, captured from `region`.
pub fn translation_bounds(
    region: Region,
    block: &TextBlock,
    layout: &DisplayLayout,
    config: &OverlayConfig,
) -> Rect {
    let source = Rect::new(
        saturate(region.x() as i64 + block.x as i64),
        saturate(region.y() as i64 + block.y as i64),
        block.width,
        block.height,
    );
    let display = layout.display_for_region(&source);

    let mut rect = source.outset(config.window_padding);
    rect.width = rect.width.max(config.min_window_width);
    rect.height = rect.height.max(config.min_window_height);

    clamp_to_display(rect, &display.bounds, config.edge_margin, config.top_margin)
}

/// Frame around `region`, just outside it so it never ends up in a capture.
///
/// Trimmed rather than moved, so the outline stays aligned with the region:
/// it is cut to the display, minus `top_margin` at the top.
pub fn boundary_bounds(region: Region, layout: &DisplayLayout, config: &OverlayConfig) -> Rect {
    let rect = region.rect().outset(config.boundary_width);
    let display = layout.display_for_region(&region.rect()).bounds;
    let top = config.top_margin.min(display.height.saturating_sub(1));
    let usable = Rect::new(
        display.x,
        saturate(display.y as i64 + top as i64),
        display.width,
        display.height - top,
    );
    intersect(&rect, &usable).unwrap_or_else(|| region.rect())
}

fn intersect(a: &Rect, b: &Rect) -> Option<Rect> {
    let x = a.x.max(b.x);
    let y = a.y.max(b.y);
    let right = a.right().min(b.right());
    let bottom = a.bottom().min(b.bottom());
    if right <= x || bottom <= y {
        return None;
    }
    let width = (right as i64 - x as i64) as u32;
    let height = (bottom as i64 - y as i64) as u32;
    Some(Rect::new(x, y, width, height))
}

#[cfg(test)]
mod tests {
    use kasane_types::Display;

    use super::*;

    fn layout() -> DisplayLayout {
        DisplayLayout::new(vec![
            Display::new(1, Rect::new(0, 0, 1920, 1080), true),
            Display::new(2, Rect::new(1920, 0, 1280, 1024), false),
        ])
        .unwrap()
    }

    fn block(x: i32, y: i32, width: u32, height: u32) -> TextBlock {
        TextBlock {
            x,
            y,
            width,
            height,
            original_text: "あ".to_string(),
            translated_text: "a".to_string(),
            confidence: None,
        }
    }

    #[test]
    fn block_is_offset_by_region_origin_and_padding() {
        let config = OverlayConfig::default();
        let region = Region::new(100, 100, 200, 50).unwrap();

        let rect = translation_bounds(region, &block(10, 5, 80, 20), &layout(), &config);

        let pad = config.window_padding as i32;
        assert_eq!((rect.x, rect.y), (110 - pad, 105 - pad));
        assert_eq!(rect.width, 80 + 2 * config.window_padding);
        assert_eq!(rect.height, 20 + 2 * config.window_padding);
    }

    #[test]
    fn window_past_right_edge_is_pulled_back() {
        let config = OverlayConfig::default();
        let region = Region::new(1700, 500, 210, 100).unwrap();
        let display = Rect::new(0, 0, 1920, 1080);

        let rect = translation_bounds(region, &block(100, 10, 150, 30), &layout(), &config);

        // block center (1875, 525) is on display 1
        assert!(rect.right() <= display.right() - config.edge_margin as i32);
        assert_eq!(rect.right(), display.right() - config.edge_margin as i32);
        assert_eq!(rect.width, 150 + 2 * config.window_padding);
    }

    #[test]
    fn window_under_menu_bar_is_pushed_down() {
        let config = OverlayConfig::default();
        let region = Region::new(10, 0, 300, 100).unwrap();

        let rect = translation_bounds(region, &block(0, 2, 50, 10), &layout(), &config);
        assert_eq!(rect.y, config.top_margin as i32);
    }

    #[test]
    fn tiny_block_gets_minimum_size() {
        let config = OverlayConfig::default();
        let region = Region::new(500, 500, 100, 100).unwrap();

        let rect = translation_bounds(region, &block(0, 0, 4, 4), &layout(), &config);
        assert_eq!(rect.width, config.min_window_width);
        assert_eq!(rect.height, config.min_window_height);
    }

    #[test]
    fn block_on_secondary_display_clamps_to_it() {
        let config = OverlayConfig::default();
        let region = Region::new(3000, 900, 190, 110).unwrap();

        let rect = translation_bounds(region, &block(150, 90, 60, 40), &layout(), &config);
        let secondary = Rect::new(1920, 0, 1280, 1024);
        assert!(secondary.encloses(&rect));
        assert!(rect.bottom() <= secondary.bottom() - config.edge_margin as i32);
        assert!(rect.right() <= secondary.right() - config.edge_margin as i32);
    }

    #[test]
    fn oversized_window_shrinks_to_fit() {
        let display = Rect::new(0, 0, 400, 300);
        let rect = clamp_to_display(Rect::new(-50, -50, 1000, 1000), &display, 8, 32);
        assert_eq!(rect, Rect::new(8, 32, 384, 260));
    }

    #[test]
    fn clamp_keeps_right_edge_for_many_positions() {
        let display = Rect::new(-1280, 0, 1280, 1024);
        for x in (-2000..500).step_by(37) {
            let rect = clamp_to_display(Rect::new(x, 100, 300, 40), &display, 8, 32);
            assert!(rect.right() <= display.right() - 8, "x = {x}");
            assert!(rect.x >= display.x + 8, "x = {x}");
        }
    }

    #[test]
    fn boundary_surrounds_region_and_stays_on_display() {
        let config = OverlayConfig::default();
        let bw = config.boundary_width as i32;

        let region = Region::new(100, 100, 200, 50).unwrap();
        let rect = boundary_bounds(region, &layout(), &config);
        assert_eq!(rect, Rect::new(100 - bw, 100 - bw, 200 + 2 * bw as u32, 50 + 2 * bw as u32));

        let at_corner = Region::new(0, 40, 200, 50).unwrap();
        let rect = boundary_bounds(at_corner, &layout(), &config);
        assert_eq!((rect.x, rect.y), (0, 40 - bw));
        assert_eq!(rect.right(), 200 + bw);
    }

    #[test]
    fn boundary_keeps_clear_of_the_top_margin() {
        let config = OverlayConfig::default();
        let bw = config.boundary_width as i32;
        let top = config.top_margin as i32;

        let region = Region::new(500, 10, 200, 100).unwrap();
        let rect = boundary_bounds(region, &layout(), &config);
        assert_eq!(rect.y, top);
        assert_eq!(rect.bottom(), 110 + bw);
        assert_eq!((rect.x, rect.right()), (500 - bw, 700 + bw));
    }

    #[test]
    fn retina_block_lands_over_its_text() {
        let config = OverlayConfig::default();
        // 1440x900 points on a 2880x1800 panel
        let panel = kasane_capture::points_to_pixels(Rect::new(0, 0, 1440, 900), 2.0);
        let layout = DisplayLayout::new(vec![Display::new(1, panel, true)]).unwrap();
        let region = Region::new(2000, 1000, 400, 100).unwrap();

        let rect = translation_bounds(region, &block(10, 5, 80, 20), &layout, &config);

        let pad = config.window_padding;
        assert_eq!(rect, Rect::new(2010 - pad as i32, 1005 - pad as i32, 80 + 2 * pad, 20 + 2 * pad));
    }

    #[test]
    fn absurd_worker_coordinates_stay_on_a_display() {
        let config = OverlayConfig::default();
        let region = Region::new(100, 100, 200, 50).unwrap();
        let primary = Rect::new(0, 0, 1920, 1080);
        let secondary = Rect::new(1920, 0, 1280, 1024);

        for b in [
            block(i32::MAX, i32::MAX, 80, 20),
            block(i32::MIN, i32::MIN, 80, 20),
            block(10, 5, u32::MAX, u32::MAX),
            block(i32::MAX, 0, u32::MAX, 1),
        ] {
            let rect = translation_bounds(region, &b, &layout(), &config);
            let on_display = primary.encloses(&rect) || secondary.encloses(&rect);
            assert!(on_display, "{b:?} -> {rect:?}");
        }
    }
}
