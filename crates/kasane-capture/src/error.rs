use kasane_types::Rect;

#[derive(Debug, thiserror::Error)]
pub enum CaptureError {
    #[error("No capturable display source: {0}")]
    NoSource(String),

    #[error(
        "Region ({},{} {}x{}) exceeds captured frame {}x{} of display {}",
        local.x, local.y, local.width, local.height,
        frame_width, frame_height, display_id
    )]
    CropOutOfBounds {
        /// Requested rectangle in display-local coordinates
        local: Rect,
        frame_width: u32,
        frame_height: u32,
        display_id: u32,
    },

    #[error("Image encoding failed: {0}")]
    Encode(#[from] image::ImageError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
