use kasane_capture::CaptureError;
use kasane_types::WindowId;
use kasane_worker::WorkerError;

/// Why a translate cycle produced no windows.
#[derive(Debug, thiserror::Error)]
pub enum CycleError {
    #[error("Capture failed: {0}")]
    Capture(#[from] CaptureError),

    #[error("Worker failed: {0}")]
    Worker(#[from] WorkerError),

    #[error("Translation failed: {0}")]
    TranslationFailure(String),

    #[error("Capture task failed: {0}")]
    Task(String),
}

#[derive(Debug, thiserror::Error)]
pub enum WindowError {
    #[error("Unknown window {0:?}")]
    Unknown(WindowId),

    #[error("Failed to create window: {0}")]
    Create(String),

    #[error("Window service unavailable")]
    Unavailable,
}
