//! In-memory stand-ins for the platform and the worker.

use std::collections::{BTreeMap, VecDeque};
use std::path::PathBuf;
use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};

use kasane_capture::{CaptureError, Capturer};
use kasane_types::{Display, Rect, Region, TextBlock, WindowId, WorkerRequest, WorkerResponse};
use kasane_worker::{TranslationWorker, WorkerError};
use tokio::sync::oneshot;

use crate::error::WindowError;
use crate::window::{ViewMessage, WindowKind, WindowService, WindowSpec};

#[derive(Debug, Clone)]
pub struct FakeWindow {
    pub spec: WindowSpec,
    pub visible: bool,
    pub messages: Vec<ViewMessage>,
}

pub struct FakeWindows {
    pub displays: Vec<Display>,
    pub pointer: Mutex<Option<(i32, i32)>>,
    next_id: AtomicU64,
    open: Mutex<BTreeMap<WindowId, FakeWindow>>,
    closed: Mutex<Vec<WindowId>>,
}

impl FakeWindows {
    pub fn new() -> Self {
        Self {
            displays: vec![
                Display::new(1, Rect::new(0, 0, 1920, 1080), true),
                Display::new(2, Rect::new(1920, 0, 1280, 1024), false),
            ],
            pointer: Mutex::new(None),
            next_id: AtomicU64::new(1),
            open: Mutex::new(BTreeMap::new()),
            closed: Mutex::new(Vec::new()),
        }
    }

    pub fn open_of(&self, kind: fn(&WindowKind) -> bool) -> Vec<(WindowId, FakeWindow)> {
        self.open
            .lock()
            .unwrap()
            .iter()
            .filter(|(_, w)| kind(&w.spec.kind))
            .map(|(id, w)| (*id, w.clone()))
            .collect()
    }

    pub fn translations(&self) -> Vec<(WindowId, FakeWindow)> {
        self.open_of(|k| *k == WindowKind::Translation)
    }

    pub fn open_count(&self) -> usize {
        self.open.lock().unwrap().len()
    }

    pub fn closed_count(&self) -> usize {
        self.closed.lock().unwrap().len()
    }

    /// Simulate the user closing a window behind our back.
    pub fn destroy_externally(&self, id: WindowId) {
        self.open.lock().unwrap().remove(&id);
    }
}

impl WindowService for FakeWindows {
    fn displays(&self) -> Vec<Display> {
        self.displays.clone()
    }

    fn pointer_position(&self) -> Option<(i32, i32)> {
        *self.pointer.lock().unwrap()
    }

    fn open(&self, spec: WindowSpec) -> Result<WindowId, WindowError> {
        let id = WindowId(self.next_id.fetch_add(1, Ordering::SeqCst));
        self.open.lock().unwrap().insert(
            id,
            FakeWindow {
                spec,
                visible: spec.visible,
                messages: Vec::new(),
            },
        );
        Ok(id)
    }

    fn post(&self, id: WindowId, message: ViewMessage) -> Result<(), WindowError> {
        let mut open = self.open.lock().unwrap();
        let window = open.get_mut(&id).ok_or(WindowError::Unknown(id))?;
        window.messages.push(message);
        Ok(())
    }

    fn set_visible(&self, id: WindowId, visible: bool) -> Result<(), WindowError> {
        let mut open = self.open.lock().unwrap();
        let window = open.get_mut(&id).ok_or(WindowError::Unknown(id))?;
        window.visible = visible;
        Ok(())
    }

    fn close(&self, id: WindowId) {
        assert!(
            self.open.lock().unwrap().remove(&id).is_some(),
            "closed a window that was already destroyed"
        );
        self.closed.lock().unwrap().push(id);
    }

    fn is_destroyed(&self, id: WindowId) -> bool {
        !self.open.lock().unwrap().contains_key(&id)
    }
}

/// Writes a placeholder file per capture so deletion can be checked.
pub struct FakeCapturer {
    dir: tempfile::TempDir,
    counter: AtomicU64,
    pub fail: AtomicBool,
    pub captured: Mutex<Vec<(Region, PathBuf)>>,
}

impl FakeCapturer {
    pub fn new() -> Self {
        Self {
            dir: tempfile::tempdir().unwrap(),
            counter: AtomicU64::new(0),
            fail: AtomicBool::new(false),
            captured: Mutex::new(Vec::new()),
        }
    }

    pub fn paths(&self) -> Vec<PathBuf> {
        self.captured.lock().unwrap().iter().map(|(_, p)| p.clone()).collect()
    }
}

impl Capturer for FakeCapturer {
    fn capture(&self, region: Region) -> Result<PathBuf, CaptureError> {
        if self.fail.load(Ordering::SeqCst) {
            return Err(CaptureError::NoSource("test".to_string()));
        }
        let n = self.counter.fetch_add(1, Ordering::SeqCst);
        let path = self.dir.path().join(format!("capture-{n}.png"));
        std::fs::write(&path, b"png")?;
        self.captured.lock().unwrap().push((region, path.clone()));
        Ok(path)
    }
}

type Answer = Result<WorkerResponse, WorkerError>;

/// Each call waits until the test releases its answer.
pub struct GatedWorker {
    gates: Mutex<VecDeque<oneshot::Receiver<Answer>>>,
    pub requests: Mutex<Vec<WorkerRequest>>,
    pub shut_down: AtomicBool,
}

impl GatedWorker {
    pub fn new() -> Self {
        Self {
            gates: Mutex::new(VecDeque::new()),
            requests: Mutex::new(Vec::new()),
            shut_down: AtomicBool::new(false),
        }
    }

    /// Register the answer for the next call; send on the returned handle to release it.
    pub fn gate(&self) -> oneshot::Sender<Answer> {
        let (tx, rx) = oneshot::channel();
        self.gates.lock().unwrap().push_back(rx);
        tx
    }

    /// Register an answer that is available immediately.
    pub fn answer(&self, answer: Answer) {
        let _ = self.gate().send(answer);
    }
}

#[async_trait::async_trait]
impl TranslationWorker for GatedWorker {
    async fn translate(&self, request: WorkerRequest) -> Result<WorkerResponse, WorkerError> {
        self.requests.lock().unwrap().push(request);
        let gate = self.gates.lock().unwrap().pop_front();
        match gate {
            Some(rx) => rx.await.unwrap_or(Err(WorkerError::Terminated)),
            None => Err(WorkerError::Terminated),
        }
    }

    async fn shutdown(&self) {
        self.shut_down.store(true, Ordering::SeqCst);
    }
}

pub fn block(x: i32, y: i32, width: u32, height: u32, original: &str, translated: &str) -> TextBlock {
    TextBlock {
        x,
        y,
        width,
        height,
        original_text: original.to_string(),
        translated_text: translated.to_string(),
        confidence: None,
    }
}
