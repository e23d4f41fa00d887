//! slint-backed overlay windows.
//!
//! [`SlintWindows`] can be called from any thread; the windows themselves
//! live on the slint event loop thread.

mod frame;
mod service;
mod views;

pub use frame::{frame_edges, frame_windows, selection_region};
pub use service::SlintWindows;

slint::include_modules!();
