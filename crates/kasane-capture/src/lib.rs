mod capture;
mod display;
mod error;
mod hotkey;
mod source;

pub use capture::{Capturer, RegionCapture};
pub use display::DisplayLayout;
pub use error::CaptureError;
pub use hotkey::HotkeyRegistry;
pub use source::{FrameSource, XcapSource, points_to_pixels, source_index_for};
