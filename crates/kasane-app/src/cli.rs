use clap::Parser;
use kasane_config::Config;
use kasane_config::worker::{Readiness, WorkerMode};

/// Overlay translations on a region of the screen.
///
/// Everything here can also be set through `KASANE_*` environment variables;
/// flags win.
#[derive(Parser, Debug)]
#[command(name = "kasane", version, about, long_about = None)]
pub struct Args {
    /// Verbose logging
    #[arg(short, long)]
    pub debug: bool,

    /// Worker executable
    #[arg(long, value_name = "PROGRAM")]
    pub worker_program: Option<String>,

    /// Arguments for the worker executable
    #[arg(long, value_name = "ARG", num_args = 1.., allow_hyphen_values = true)]
    pub worker_args: Option<Vec<String>>,

    /// Keep one worker running and talk to it over stdin/stdout
    #[arg(long)]
    pub persistent: bool,

    /// Wait for the worker to print {"ready":true} instead of a fixed delay
    #[arg(long)]
    pub sentinel: bool,

    /// Re-translate the monitored region every N milliseconds (0 = off)
    #[arg(short = 'i', long, value_name = "MS")]
    pub auto_interval_ms: Option<u64>,
}

impl Args {
    pub fn apply(self, config: &mut Config) {
        config.debug |= self.debug;
        if let Some(program) = self.worker_program {
            config.worker.program = program;
        }
        if let Some(args) = self.worker_args {
            config.worker.args = args;
        }
        if self.persistent {
            config.worker.mode = WorkerMode::Persistent;
        }
        if self.sentinel {
            config.worker.readiness = Readiness::Sentinel;
        }
        if let Some(ms) = self.auto_interval_ms {
            config.overlay.auto_interval_ms = ms;
        }
    }
}
