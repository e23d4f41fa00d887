mod coordinator;
mod cycle;
mod error;
pub mod placement;
mod window;

pub use coordinator::{Input, OverlayCoordinator, OverlayState};
pub use cycle::CycleOutcome;
pub use error::{CycleError, WindowError};
pub use window::{ViewMessage, WindowKind, WindowService, WindowSpec};

#[cfg(test)]
mod tests;
