use std::time::Duration;

use anyhow::Context;
use clap::Parser;
use kasane_config::Config;

use crate::cli::Args;
use crate::controller::AppController;
use crate::hotkeys::HotkeyListener;

mod cli;
mod controller;
mod hotkeys;
mod logging;


const SHUTDOWN_GRACE: Duration = Duration::from_secs(5);

fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let mut config = Config::new();
    Args::parse().apply(&mut config);
    logging::init(config.debug);

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .thread_name("kasane")
        .build()
        .context("Failed to build tokio runtime")?;

    let controller = AppController::new(config);
    let tasks = {
        let _guard = runtime.enter();
        controller.spawn_tasks()
    };

    // slint and the hotkey hook both want the main thread
    let hotkeys = match HotkeyListener::install(&controller.config().hotkeys, controller.event_sender()) {
        Ok(listener) => Some(listener),
        Err(e) => {
            tracing::error!("Hotkeys unavailable: {:#}", e);
            None
        }
    };

    tracing::info!("kasane running");
    let ui_result = slint::run_event_loop_until_quit().context("UI event loop failed");

    drop(hotkeys);
    runtime.block_on(async {
        controller.shutdown();
        controller.join(tasks, SHUTDOWN_GRACE).await;
    });
    runtime.shutdown_timeout(Duration::from_secs(1));

    tracing::info!("kasane stopped");
    ui_result
}
