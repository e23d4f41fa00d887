use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use kasane_capture::Capturer;
use kasane_types::{Region, TextBlock, WorkerRequest};
use kasane_worker::TranslationWorker;

use crate::error::CycleError;

/// Result of one capture → translate round trip.
#[derive(Debug)]
pub struct CycleOutcome {
    pub generation: u64,
    pub region: Region,
    pub result: Result<Vec<TextBlock>, CycleError>,
}

/// Wait for closed windows to disappear, capture, translate.
pub(crate) async fn run_cycle(
    generation: u64,
    region: Region,
    settle: Duration,
    capturer: Arc<dyn Capturer>,
    worker: Arc<dyn TranslationWorker>,
) -> CycleOutcome {
    tokio::time::sleep(settle).await;
    let result = translate_region(region, capturer, worker).await;
    CycleOutcome {
        generation,
        region,
        result,
    }
}

async fn translate_region(
    region: Region,
    capturer: Arc<dyn Capturer>,
    worker: Arc<dyn TranslationWorker>,
) -> Result<Vec<TextBlock>, CycleError> {
    let path = tokio::task::spawn_blocking(move || capturer.capture(region))
        .await
        .map_err(|e| CycleError::Task(e.to_string()))??;

    let request = WorkerRequest::new(path.to_string_lossy(), region);
    let response = worker.translate(request).await;

    // the worker has read the file by now, whatever it answered
    remove_artifact(&path).await;

    let response = response?;
    if !response.success {
        return Err(CycleError::TranslationFailure(
            response
                .error
                .unwrap_or_else(|| "worker reported failure".to_string()),
        ));
    }
    Ok(response.text_blocks)
}

async fn remove_artifact(path: &Path) {
    if let Err(e) = tokio::fs::remove_file(path).await {
        tracing::debug!("Could not delete capture {}: {}", path.display(), e);
    }
}
