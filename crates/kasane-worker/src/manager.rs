use std::collections::VecDeque;
use std::process::Stdio;
use std::time::Duration;

use kasane_config::worker::{Readiness, WorkerConfig};
use kasane_types::{WorkerRequest, WorkerResponse};
use tokio::io::{AsyncBufReadExt, AsyncReadExt, AsyncWriteExt, BufReader};
use tokio::process::{Child, ChildStderr, ChildStdin, ChildStdout, Command};
use tokio::sync::{mpsc, oneshot, watch};
use tokio::time::Instant;

use crate::TranslationWorker;
use crate::correlator::{Correlator, LineEvent, Reply};
use crate::error::WorkerError;

/// How long a worker gets to exit on its own after closing stdout.
const REAP_GRACE: Duration = Duration::from_millis(500);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WorkerState {
    Stopped,
    Starting,
    Running,
}

enum Control {
    Start(oneshot::Sender<Result<(), WorkerError>>),
    Submit {
        request: WorkerRequest,
        reply: Reply,
    },
    Stop(oneshot::Sender<()>),
    PendingCount(oneshot::Sender<usize>),
}

/// Output from a particular process instance, tagged so that anything a
/// previous instance sends after a restart is ignored.
enum Signal {
    Chunk { epoch: u64, bytes: Vec<u8> },
    Closed { epoch: u64 },
}

enum Event {
    Command(Option<Control>),
    Signal(Signal),
    Deadline,
}

/// Handle to the single long-lived worker process.
///
/// All process state lives in one manager task; handles only send it
/// commands, so the pending queue has exactly one writer. Cloning the handle
/// shares the same process. The process is killed once every handle is gone.
#[derive(Clone)]
pub struct WorkerManager {
    commands: mpsc::Sender<Control>,
    state: watch::Receiver<WorkerState>,
}

impl WorkerManager {
    /// Spawn the manager task. The worker process itself starts lazily.
    pub fn spawn(config: WorkerConfig) -> Self {
        let (commands_tx, commands_rx) = mpsc::channel(64);
        let (state_tx, state_rx) = watch::channel(WorkerState::Stopped);
        let (signals_tx, signals_rx) = mpsc::unbounded_channel();

        let actor = Actor {
            config,
            commands: commands_rx,
            signals_tx,
            signals: signals_rx,
            state: state_tx,
            process: None,
            epoch: 0,
            next_id: 1,
            correlator: Correlator::new(),
            deferred: VecDeque::new(),
            deadline: None,
        };
        tokio::spawn(actor.run());

        Self {
            commands: commands_tx,
            state: state_rx,
        }
    }

    pub fn state(&self) -> WorkerState {
        *self.state.borrow()
    }

    pub fn subscribe(&self) -> watch::Receiver<WorkerState> {
        self.state.clone()
    }

    /// Start the worker if it isn't already starting or running.
    pub async fn start(&self) -> Result<(), WorkerError> {
        let (tx, rx) = oneshot::channel();
        self.send(Control::Start(tx)).await?;
        rx.await.map_err(|_| WorkerError::Unavailable)?
    }

    /// Kill the worker and fail whatever was pending. No-op when stopped.
    pub async fn stop(&self) {
        let (tx, rx) = oneshot::channel();
        if self.send(Control::Stop(tx)).await.is_ok() {
            let _ = rx.await;
        }
    }

    /// Send one request and wait for its response line.
    ///
    /// Starts the worker when it is stopped. The first request after a cold
    /// start also waits out the worker's own warm-up.
    pub async fn submit(&self, request: WorkerRequest) -> Result<WorkerResponse, WorkerError> {
        let (tx, rx) = oneshot::channel();
        self.send(Control::Submit { request, reply: tx }).await?;
        rx.await.map_err(|_| WorkerError::Unavailable)?
    }

    /// Requests written to the worker and still waiting for a response.
    pub async fn pending_count(&self) -> usize {
        let (tx, rx) = oneshot::channel();
        if self.send(Control::PendingCount(tx)).await.is_err() {
            return 0;
        }
        rx.await.unwrap_or(0)
    }

    async fn send(&self, command: Control) -> Result<(), WorkerError> {
        self.commands
            .send(command)
            .await
            .map_err(|_| WorkerError::Unavailable)
    }
}

#[async_trait::async_trait]
impl TranslationWorker for WorkerManager {
    async fn translate(&self, request: WorkerRequest) -> Result<WorkerResponse, WorkerError> {
        self.submit(request).await
    }

    async fn shutdown(&self) {
        self.stop().await;
    }
}

struct Process {
    child: Child,
    stdin: ChildStdin,
    epoch: u64,
}

struct Actor {
    config: WorkerConfig,
    commands: mpsc::Receiver<Control>,
    signals_tx: mpsc::UnboundedSender<Signal>,
    signals: mpsc::UnboundedReceiver<Signal>,
    state: watch::Sender<WorkerState>,
    process: Option<Process>,
    epoch: u64,
    next_id: u64,
    correlator: Correlator,
    /// Submitted while starting, not yet written
    deferred: VecDeque<(WorkerRequest, Reply)>,
    /// End of the settle delay, or of the startup timeout in sentinel mode
    deadline: Option<Instant>,
}

impl Actor {
    async fn run(mut self) {
        loop {
            let deadline = self.deadline;
            let event = tokio::select! {
                command = self.commands.recv() => Event::Command(command),
                Some(signal) = self.signals.recv() => Event::Signal(signal),
                _ = wait_for(deadline) => Event::Deadline,
            };

            match event {
                Event::Command(Some(command)) => self.on_command(command).await,
                Event::Command(None) => {
                    tracing::debug!("All worker handles dropped, shutting down");
                    self.stop().await;
                    break;
                }
                Event::Signal(signal) => self.on_signal(signal).await,
                Event::Deadline => self.on_deadline().await,
            }
        }
    }

    fn state(&self) -> WorkerState {
        *self.state.borrow()
    }

    fn set_state(&self, state: WorkerState) {
        let previous = self.state.send_replace(state);
        if previous != state {
            tracing::debug!("Worker state {:?} -> {:?}", previous, state);
        }
    }

    async fn on_command(&mut self, command: Control) {
        match command {
            Control::Start(reply) => {
                let result = match self.state() {
                    WorkerState::Stopped => self.start(false),
                    _ => Ok(()),
                };
                let _ = reply.send(result);
            }
            Control::Submit { request, reply } => match self.state() {
                WorkerState::Running => self.write(request, reply).await,
                WorkerState::Starting => self.deferred.push_back((request, reply)),
                WorkerState::Stopped => match self.start(true) {
                    Ok(()) if self.state() == WorkerState::Running => self.write(request, reply).await,
                    Ok(()) => self.deferred.push_back((request, reply)),
                    Err(e) => {
                        let _ = reply.send(Err(e));
                    }
                },
            },
            Control::Stop(reply) => {
                self.stop().await;
                let _ = reply.send(());
            }
            Control::PendingCount(reply) => {
                let _ = reply.send(self.correlator.pending_len());
            }
        }
    }

    /// Spawn the process. With `settle`, writes are held back until the
    /// settle delay passes; sentinel mode always waits for the ready line.
    fn start(&mut self, settle: bool) -> Result<(), WorkerError> {
        let program = self.config.program.clone();
        tracing::info!("Starting worker: {} {}", program, self.config.args.join(" "));
        self.set_state(WorkerState::Starting);

        let mut child = match Command::new(&program)
            .args(&self.config.args)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
        {
            Ok(child) => child,
            Err(source) => {
                self.set_state(WorkerState::Stopped);
                return Err(WorkerError::Spawn { program, source });
            }
        };

        let (Some(stdin), Some(stdout)) = (child.stdin.take(), child.stdout.take()) else {
            self.set_state(WorkerState::Stopped);
            return Err(WorkerError::Protocol("worker stdio was not captured".to_string()));
        };

        self.epoch += 1;
        let epoch = self.epoch;
        tokio::spawn(read_stdout(stdout, epoch, self.signals_tx.clone()));
        if let Some(stderr) = child.stderr.take() {
            tokio::spawn(forward_stderr(stderr));
        }

        self.process = Some(Process { child, stdin, epoch });

        match self.config.readiness {
            Readiness::Sentinel => {
                self.deadline = Some(Instant::now() + self.config.startup_timeout());
            }
            Readiness::Delay if settle => {
                self.deadline = Some(Instant::now() + self.config.settle_delay());
            }
            Readiness::Delay => self.set_state(WorkerState::Running),
        }
        Ok(())
    }

    async fn write(&mut self, mut request: WorkerRequest, reply: Reply) {
        let Some(process) = self.process.as_mut() else {
            let _ = reply.send(Err(WorkerError::Terminated));
            return;
        };

        let id = self.next_id;
        self.next_id += 1;
        request.request_id = Some(id);

        let mut line = match serde_json::to_string(&request) {
            Ok(line) => line,
            Err(e) => {
                let _ = reply.send(Err(e.into()));
                return;
            }
        };
        line.push('\n');

        let written = async {
            process.stdin.write_all(line.as_bytes()).await?;
            process.stdin.flush().await
        }
        .await;

        match written {
            Ok(()) => {
                tracing::debug!("Request {} written ({})", id, request.screenshot_path);
                self.correlator.enqueue(id, reply);
            }
            Err(e) => {
                // the process is most likely gone; its Closed signal follows
                tracing::warn!("Failed to write request {}: {}", id, e);
                let _ = reply.send(Err(e.into()));
            }
        }
    }

    async fn mark_ready(&mut self) {
        if self.state() != WorkerState::Starting {
            return;
        }
        self.deadline = None;
        self.set_state(WorkerState::Running);
        while let Some((request, reply)) = self.deferred.pop_front() {
            self.write(request, reply).await;
        }
    }

    async fn on_deadline(&mut self) {
        self.deadline = None;
        if self.state() != WorkerState::Starting {
            return;
        }
        match self.config.readiness {
            Readiness::Delay => self.mark_ready().await,
            Readiness::Sentinel => {
                let timeout = self.config.startup_timeout();
                tracing::error!("Worker did not report ready within {:?}", timeout);
                for (_, reply) in self.deferred.drain(..) {
                    let _ = reply.send(Err(WorkerError::StartupTimeout(timeout)));
                }
                self.stop().await;
            }
        }
    }

    async fn on_signal(&mut self, signal: Signal) {
        match signal {
            Signal::Chunk { epoch, bytes } => {
                if !self.is_current(epoch) {
                    return;
                }
                let events = self.correlator.feed(&bytes);
                if events.contains(&LineEvent::Ready) {
                    tracing::info!("Worker reported ready");
                    self.mark_ready().await;
                }
            }
            Signal::Closed { epoch } => {
                if !self.is_current(epoch) {
                    return;
                }
                let Some(mut process) = self.process.take() else {
                    return;
                };
                let status = match tokio::time::timeout(REAP_GRACE, process.child.wait()).await {
                    Ok(status) => status.ok(),
                    Err(_) => {
                        let _ = process.child.kill().await;
                        None
                    }
                };
                tracing::warn!("Worker exited unexpectedly ({:?})", status);
                self.reset();
            }
        }
    }

    fn is_current(&self, epoch: u64) -> bool {
        self.process.as_ref().is_some_and(|p| p.epoch == epoch)
    }

    async fn stop(&mut self) {
        if let Some(mut process) = self.process.take() {
            tracing::info!("Stopping worker");
            if let Err(e) = process.child.kill().await {
                tracing::debug!("Worker kill failed: {}", e);
            }
        }
        self.reset();
    }

    /// Back to `Stopped` with nothing pending or buffered.
    fn reset(&mut self) {
        let failed = self.correlator.fail_all();
        for (_, reply) in self.deferred.drain(..) {
            let _ = reply.send(Err(WorkerError::Terminated));
        }
        if failed > 0 {
            tracing::warn!("Failed {} pending worker requests", failed);
        }
        self.deadline = None;
        self.set_state(WorkerState::Stopped);
    }
}

async fn wait_for(deadline: Option<Instant>) {
    match deadline {
        Some(deadline) => tokio::time::sleep_until(deadline).await,
        None => std::future::pending().await,
    }
}

async fn read_stdout(mut stdout: ChildStdout, epoch: u64, signals: mpsc::UnboundedSender<Signal>) {
    let mut buf = vec![0u8; 8 * 1024];
    loop {
        match stdout.read(&mut buf).await {
            Ok(0) => break,
            Ok(n) => {
                let bytes = buf[..n].to_vec();
                if signals.send(Signal::Chunk { epoch, bytes }).is_err() {
                    return;
                }
            }
            Err(e) => {
                tracing::warn!("Worker stdout read failed: {}", e);
                break;
            }
        }
    }
    let _ = signals.send(Signal::Closed { epoch });
}

async fn forward_stderr(stderr: ChildStderr) {
    let mut lines = BufReader::new(stderr).lines();
    while let Ok(Some(line)) = lines.next_line().await {
        tracing::debug!(target: "kasane::worker", "{}", line);
    }
}
