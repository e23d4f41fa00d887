use std::sync::Arc;
use std::time::Duration;

use kanal::{AsyncReceiver, AsyncSender};
use kasane_capture::{RegionCapture, XcapSource};
use kasane_config::Config;
use kasane_overlay::OverlayCoordinator;
use kasane_types::AppEvent;
use kasane_ui::SlintWindows;
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;

/// Centralized channel management
pub struct ChannelSet {
    /// Hotkeys, selection windows and signals into the coordinator
    pub events: (AsyncSender<AppEvent>, AsyncReceiver<AppEvent>),
}

impl ChannelSet {
    pub fn new() -> Self {
        Self {
            events: kanal::bounded_async(64),
        }
    }
}

/// Application controller for task spawning and lifecycle
pub struct AppController {
    channels: ChannelSet,
    config: Arc<Config>,
    cancel_token: CancellationToken,
}

impl AppController {
    pub fn new(config: Config) -> Self {
        Self {
            channels: ChannelSet::new(),
            config: Arc::new(config),
            cancel_token: CancellationToken::new(),
        }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Blocking sender for code running on the UI thread.
    pub fn event_sender(&self) -> kanal::Sender<AppEvent> {
        self.channels.events.0.clone_sync()
    }

    /// Spawn the background tasks. Must be called inside the runtime.
    pub fn spawn_tasks(&self) -> JoinSet<anyhow::Result<()>> {
        let mut tasks = JoinSet::new();

        tasks.spawn(overlay_loop(
            self.config.clone(),
            self.channels.events.1.clone(),
            self.event_sender(),
        ));

        tasks.spawn(signal_watch(
            self.cancel_token.child_token(),
            self.channels.events.0.clone(),
        ));

        tasks
    }

    /// Ask the coordinator to tear everything down.
    pub fn shutdown(&self) {
        self.cancel_token.cancel();
        // fails once the coordinator is gone, which is fine
        let _ = self.channels.events.0.try_send(AppEvent::Shutdown);
    }

    /// Wait for spawned tasks, giving up after `grace`.
    pub async fn join(&self, mut tasks: JoinSet<anyhow::Result<()>>, grace: Duration) {
        let drain = async {
            while let Some(result) = tasks.join_next().await {
                match result {
                    Ok(Ok(())) => {}
                    Ok(Err(e)) => tracing::error!("Task failed: {:#}", e),
                    Err(e) => tracing::error!("Task panicked: {}", e),
                }
            }
        };
        if tokio::time::timeout(grace, drain).await.is_err() {
            tracing::warn!("Tasks still running after {:?}, aborting", grace);
        }
    }
}

/// Run the overlay coordinator, then stop the UI event loop.
async fn overlay_loop(
    config: Arc<Config>,
    events: AsyncReceiver<AppEvent>,
    ui_events: kanal::Sender<AppEvent>,
) -> anyhow::Result<()> {
    let windows = Arc::new(SlintWindows::new(ui_events));
    let capturer = Arc::new(RegionCapture::new(XcapSource::new(), &config.capture));
    let worker = kasane_worker::from_config(&config.worker);

    tracing::info!(
        "Worker: {} {} ({:?})",
        config.worker.program,
        config.worker.args.join(" "),
        config.worker.mode
    );

    OverlayCoordinator::new(windows, capturer, worker, config.overlay.clone())
        .run(events)
        .await;

    slint::quit_event_loop()?;
    Ok(())
}

/// Ctrl+C becomes an orderly shutdown.
pub(crate) async fn signal_watch(cancel: CancellationToken, events: AsyncSender<AppEvent>) -> anyhow::Result<()> {
    tokio::select! {
        _ = cancel.cancelled() => {}
        result = tokio::signal::ctrl_c() => {
            result?;
            tracing::info!("Shutdown requested");
            events.send(AppEvent::Shutdown).await?;
        }
    }
    Ok(())
}
