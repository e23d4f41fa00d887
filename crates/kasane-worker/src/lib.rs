mod correlator;
mod error;
mod framing;
mod manager;
mod oneshot;

use std::sync::Arc;

use kasane_config::worker::{WorkerConfig, WorkerMode};
use kasane_types::{WorkerRequest, WorkerResponse};

pub use correlator::{Correlator, LineEvent, Reply};
pub use error::WorkerError;
pub use framing::LineBuffer;
pub use manager::{WorkerManager, WorkerState};
pub use oneshot::OneShotWorker;

/// Something that turns a capture into translated text blocks.
#[async_trait::async_trait]
pub trait TranslationWorker: Send + Sync {
    async fn translate(&self, request: WorkerRequest) -> Result<WorkerResponse, WorkerError>;

    /// Stop any process backing this worker. Idempotent.
    async fn shutdown(&self);
}

/// Build the worker variant selected by `config.mode`.
///
/// The persistent variant spawns its manager task, so this must run inside a
/// tokio runtime.
pub fn from_config(config: &WorkerConfig) -> Arc<dyn TranslationWorker> {
    match config.mode {
        WorkerMode::Persistent => Arc::new(WorkerManager::spawn(config.clone())),
        WorkerMode::Oneshot => Arc::new(OneShotWorker::new(config)),
    }
}
