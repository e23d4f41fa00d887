use std::env;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::{env_parse, env_flag};

fn default_program() -> String {
    "python".to_string()
}

/// The bundled server takes one request on its command line and exits.
fn default_args() -> Vec<String> {
    vec!["translator/translate_service_server.py".to_string()]
}

fn default_settle_delay_ms() -> u64 {
    500
}

fn default_startup_timeout_ms() -> u64 {
    30_000
}

/// How the worker is driven.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WorkerMode {
    /// One long-lived process, line-delimited JSON over stdio.
    Persistent,
    /// A fresh process per request, region passed on the command line.
    #[default]
    Oneshot,
}

/// How a freshly spawned persistent worker is considered ready.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Readiness {
    /// Wait `settle_delay_ms` after spawning. Heuristic only.
    #[default]
    Delay,
    /// Wait for the worker to print `{"ready":true}`.
    Sentinel,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct WorkerConfig {
    #[serde(default = "default_program")]
    pub program: String,
    #[serde(default = "default_args")]
    pub args: Vec<String>,
    pub mode: WorkerMode,
    pub readiness: Readiness,
    #[serde(default = "default_settle_delay_ms")]
    pub settle_delay_ms: u64,
    #[serde(default = "default_startup_timeout_ms")]
    pub startup_timeout_ms: u64,
}

impl WorkerConfig {
    pub fn new() -> Self {
        let program = env::var("KASANE_WORKER_PROGRAM").unwrap_or_else(|_| default_program());

        let args = env::var("KASANE_WORKER_ARGS")
            .map(|v| v.split_whitespace().map(str::to_string).collect())
            .unwrap_or_else(|_| default_args());

        let mode = match env::var("KASANE_WORKER_MODE").ok().as_deref().map(str::trim) {
            Some("persistent") => WorkerMode::Persistent,
            Some("oneshot") => WorkerMode::Oneshot,
            _ => WorkerMode::default(),
        };

        let readiness = if env_flag("KASANE_WORKER_SENTINEL").unwrap_or(false) {
            Readiness::Sentinel
        } else {
            Readiness::Delay
        };

        Self {
            program,
            args,
            mode,
            readiness,
            settle_delay_ms: env_parse("KASANE_WORKER_SETTLE_MS")
                .unwrap_or_else(default_settle_delay_ms),
            startup_timeout_ms: env_parse("KASANE_WORKER_STARTUP_TIMEOUT_MS")
                .unwrap_or_else(default_startup_timeout_ms),
        }
    }

    pub fn settle_delay(&self) -> Duration {
        Duration::from_millis(self.settle_delay_ms)
    }

    pub fn startup_timeout(&self) -> Duration {
        Duration::from_millis(self.startup_timeout_ms)
    }
}

impl Default for WorkerConfig {
    fn default() -> Self {
        Self {
            program: default_program(),
            args: default_args(),
            mode: WorkerMode::default(),
            readiness: Readiness::default(),
            settle_delay_ms: default_settle_delay_ms(),
            startup_timeout_ms: default_startup_timeout_ms(),
        }
    }
}
