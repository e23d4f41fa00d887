pub mod events;
pub mod geometry;
pub mod protocol;

pub use events::{AppEvent, WindowId};
pub use geometry::{Display, Rect, Region};
pub use protocol::{TextBlock, WorkerRequest, WorkerResponse};
