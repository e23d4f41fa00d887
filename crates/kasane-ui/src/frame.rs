use kasane_types::{Rect, Region};

/// Split a frame into edge strips: top, bottom, left, right.
///
/// slint windows can't pass clicks through, so the boundary is drawn as
/// separate strips and the inside of the frame stays uncovered. Strips that
/// would be empty are left out.
pub fn frame_edges(bounds: Rect, border_width: u32) -> Vec<Rect> {
    let bw = border_width.max(1);
    let mut edges = Vec::with_capacity(4);

    edges.push(Rect::new(bounds.x, bounds.y, bounds.width, bw.min(bounds.height)));
    if bounds.height > bw {
        edges.push(Rect::new(bounds.x, bounds.bottom() - bw as i32, bounds.width, bw));
    }
    if bounds.height > 2 * bw {
        let side = bounds.height - 2 * bw;
        let y = bounds.y + bw as i32;
        edges.push(Rect::new(bounds.x, y, bw.min(bounds.width), side));
        if bounds.width > bw {
            edges.push(Rect::new(bounds.right() - bw as i32, y, bw, side));
        }
    }

    edges.retain(|e| !e.is_empty());
    edges
}

/// Windows drawing a boundary frame, each with the ring width it paints.
///
/// A click-through frame is built from solid edge strips so the inside stays
/// uncovered. Otherwise a single window paints the outline as a ring of
/// `border_width` and keeps the input inside the frame.
pub fn frame_windows(bounds: Rect, border_width: u32, click_through: bool) -> Vec<(Rect, u32)> {
    if click_through {
        frame_edges(bounds, border_width).into_iter().map(|edge| (edge, 0)).collect()
    } else {
        vec![(bounds, border_width.max(1))]
    }
}

/// Turn a drag on the selection window (logical pixels, window-relative)
/// into a global region. A drag without area yields `None`.
pub fn selection_region(display: Rect, scale: f32, x: f32, y: f32, width: f32, height: f32) -> Option<Region> {
    let px = |v: f32| (v * scale).round();
    Region::new(
        display.x + px(x) as i32,
        display.y + px(y) as i32,
        px(width).max(0.0) as u32,
        px(height).max(0.0) as u32,
    )
}
