use std::time::Duration;

#[derive(Debug, thiserror::Error)]
pub enum WorkerError {
    #[error("Worker terminated while the request was pending")]
    Terminated,

    #[error("Worker protocol error: {0}")]
    Protocol(String),

    #[error("Worker exited with {code:?}: {stderr}")]
    NonZeroExit { code: Option<i32>, stderr: String },

    #[error("Failed to spawn worker '{program}': {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Worker did not report ready within {0:?}")]
    StartupTimeout(Duration),

    #[error("Worker manager is gone")]
    Unavailable,

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}
