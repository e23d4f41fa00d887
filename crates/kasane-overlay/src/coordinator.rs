use std::ops::ControlFlow;
use std::sync::Arc;

use kanal::AsyncReceiver;
use kasane_capture::{Capturer, DisplayLayout};
use kasane_config::overlay::OverlayConfig;
use kasane_types::{AppEvent, Region, TextBlock, WindowId};
use kasane_worker::TranslationWorker;
use tokio::sync::mpsc;
use tokio::time::MissedTickBehavior;

use crate::cycle::{CycleOutcome, run_cycle};
use crate::placement;
use crate::window::{ViewMessage, WindowService, WindowSpec};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OverlayState {
    Idle,
    SelectingRegion,
    Monitoring,
    Translating,
}

/// Everything the coordinator reacts to, handled strictly one at a time.
#[derive(Debug)]
pub enum Input {
    Event(AppEvent),
    Completed(CycleOutcome),
    /// Auto-translate interval elapsed
    Tick,
}

/// Owns the monitored region and every overlay window.
///
/// Only [`OverlayCoordinator::handle`] mutates this state. Slow work
/// (capture and the worker round trip) runs in spawned cycle tasks that
/// report back through the input queue, so a trigger never waits on another.
pub struct OverlayCoordinator {
    windows: Arc<dyn WindowService>,
    capturer: Arc<dyn Capturer>,
    worker: Arc<dyn TranslationWorker>,
    config: OverlayConfig,

    state: OverlayState,
    /// Where a cancelled selection returns to
    resume: OverlayState,
    region: Option<Region>,
    selection: Option<WindowId>,
    boundary: Option<WindowId>,
    translations: Vec<WindowId>,
    translations_visible: bool,
    /// Bumped by every translate cycle and region change; completions
    /// carrying an older value are discarded
    generation: u64,

    inputs_tx: mpsc::UnboundedSender<Input>,
    inputs: mpsc::UnboundedReceiver<Input>,
}

impl OverlayCoordinator {
    pub fn new(
        windows: Arc<dyn WindowService>,
        capturer: Arc<dyn Capturer>,
        worker: Arc<dyn TranslationWorker>,
        config: OverlayConfig,
    ) -> Self {
        let (inputs_tx, inputs) = mpsc::unbounded_channel();
        Self {
            windows,
            capturer,
            worker,
            config,
            state: OverlayState::Idle,
            resume: OverlayState::Idle,
            region: None,
            selection: None,
            boundary: None,
            translations: Vec::new(),
            translations_visible: true,
            generation: 0,
            inputs_tx,
            inputs,
        }
    }

    pub fn state(&self) -> OverlayState {
        self.state
    }

    pub fn region(&self) -> Option<Region> {
        self.region
    }

    pub fn translation_windows(&self) -> &[WindowId] {
        &self.translations
    }

    pub fn boundary_window(&self) -> Option<WindowId> {
        self.boundary
    }

    pub fn selection_window(&self) -> Option<WindowId> {
        self.selection
    }

    pub fn translations_visible(&self) -> bool {
        self.translations_visible
    }

    /// Process app events until shutdown.
    pub async fn run(mut self, events: AsyncReceiver<AppEvent>) {
        tokio::spawn(forward_events(events, self.inputs_tx.clone()));
        if let Some(interval) = self.config.auto_interval() {
            tracing::info!("Auto-translate every {:?}", interval);
            tokio::spawn(tick(interval, self.inputs_tx.clone()));
        }

        while self.pump().await.is_continue() {}
        tracing::info!("Overlay coordinator stopped");
    }

    /// Wait for the next input and handle it.
    pub async fn pump(&mut self) -> ControlFlow<()> {
        match self.inputs.recv().await {
            Some(input) => self.handle(input).await,
            // unreachable while we hold the sender
            None => ControlFlow::Break(()),
        }
    }

    pub async fn handle(&mut self, input: Input) -> ControlFlow<()> {
        match input {
            Input::Event(event) => return self.handle_event(event).await,
            Input::Completed(outcome) => self.apply_outcome(outcome),
            Input::Tick => {
                if self.state == OverlayState::Monitoring {
                    self.translate_now();
                }
            }
        }
        ControlFlow::Continue(())
    }

    pub async fn handle_event(&mut self, event: AppEvent) -> ControlFlow<()> {
        tracing::debug!("[OVERLAY] {:?} in {:?}", event, self.state);
        match event {
            AppEvent::BeginSelection => self.begin_selection(),
            AppEvent::SelectionConfirmed(region) => self.confirm_selection(region),
            AppEvent::SelectionCancelled => self.cancel_selection(),
            AppEvent::TranslateNow => self.translate_now(),
            AppEvent::ToggleVisibility => self.toggle_visibility(),
            AppEvent::Shutdown => {
                self.shutdown().await;
                return ControlFlow::Break(());
            }
        }
        ControlFlow::Continue(())
    }

    fn layout(&self) -> Option<DisplayLayout> {
        let layout = DisplayLayout::new(self.windows.displays());
        if layout.is_none() {
            tracing::warn!("[OVERLAY] No displays reported");
        }
        layout
    }

    fn begin_selection(&mut self) {
        if self.state == OverlayState::SelectingRegion {
            return;
        }
        let Some(layout) = self.layout() else {
            return;
        };

        let display = match self.windows.pointer_position() {
            Some((x, y)) => layout.display_for_point(x, y),
            None => layout.primary(),
        };

        match self.windows.open(WindowSpec::selection(display.bounds)) {
            Ok(id) => {
                self.selection = Some(id);
                self.resume = self.state;
                self.state = OverlayState::SelectingRegion;
                let display_id = display.id;
                tracing::info!("[OVERLAY] Selecting region on display {}", display_id);
            }
            Err(e) => tracing::error!("[OVERLAY] Failed to open selection window: {}", e),
        }
    }

    fn cancel_selection(&mut self) {
        if self.state != OverlayState::SelectingRegion {
            return;
        }
        self.close_selection();
        self.state = self.resume;
        tracing::info!("[OVERLAY] Selection cancelled");
    }

    fn confirm_selection(&mut self, region: Region) {
        if self.state != OverlayState::SelectingRegion {
            tracing::debug!("[OVERLAY] Ignoring selection outside of selecting state");
            return;
        }
        self.close_selection();

        // a new region invalidates anything in flight for the old one
        self.close_translations();
        if let Some(id) = self.boundary.take() {
            self.close_window(id);
        }
        self.generation += 1;

        self.region = Some(region);
        self.state = OverlayState::Monitoring;
        tracing::info!(
            "[OVERLAY] Monitoring region ({}, {}) {}x{}",
            region.x(),
            region.y(),
            region.width(),
            region.height()
        );

        let Some(layout) = self.layout() else {
            return;
        };
        let bounds = placement::boundary_bounds(region, &layout, &self.config);
        match self
            .windows
            .open(WindowSpec::boundary(bounds, self.config.boundary_width))
        {
            Ok(id) => self.boundary = Some(id),
            Err(e) => tracing::error!("[OVERLAY] Failed to open boundary window: {}", e),
        }
    }

    fn translate_now(&mut self) {
        let Some(region) = self.region else {
            tracing::debug!("[OVERLAY] No region selected, nothing to translate");
            return;
        };
        if self.state == OverlayState::SelectingRegion {
            tracing::debug!("[OVERLAY] Selection in progress, not translating");
            return;
        }

        // old translations must be gone before the capture or they'd be read as source text
        self.close_translations();
        self.generation += 1;
        self.state = OverlayState::Translating;

        let generation = self.generation;
        let settle = self.config.close_settle();
        let capturer = self.capturer.clone();
        let worker = self.worker.clone();
        let inputs = self.inputs_tx.clone();
        tokio::spawn(async move {
            let outcome = run_cycle(generation, region, settle, capturer, worker).await;
            // a closed queue means we shut down, nothing left to update
            let _ = inputs.send(Input::Completed(outcome));
        });
        tracing::debug!("[OVERLAY] Translate cycle {} started", generation);
    }

    fn apply_outcome(&mut self, outcome: CycleOutcome) {
        if outcome.generation != self.generation || self.region != Some(outcome.region) {
            tracing::debug!(
                "[OVERLAY] Discarding stale cycle {} (current {})",
                outcome.generation,
                self.generation
            );
            return;
        }

        match self.state {
            OverlayState::Translating => self.state = OverlayState::Monitoring,
            OverlayState::SelectingRegion => self.resume = OverlayState::Monitoring,
            _ => {}
        }

        match outcome.result {
            Ok(blocks) => {
                tracing::info!("[OVERLAY] Cycle {} returned {} blocks", outcome.generation, blocks.len());
                self.show_translations(outcome.region, blocks);
            }
            Err(e) => {
                tracing::warn!("[OVERLAY] Translation cycle {} failed: {}", outcome.generation, e);
            }
        }
    }

    fn show_translations(&mut self, region: Region, blocks: Vec<TextBlock>) {
        // never leave two sets on screen
        self.close_translations();

        let Some(layout) = self.layout() else {
            return;
        };

        for block in blocks {
            let bounds = placement::translation_bounds(region, &block, &layout, &self.config);
            let id = match self
                .windows
                .open(WindowSpec::translation(bounds, self.translations_visible))
            {
                Ok(id) => id,
                Err(e) => {
                    tracing::error!("[OVERLAY] Failed to open translation window: {}", e);
                    continue;
                }
            };

            let message = ViewMessage::Translation {
                original_text: block.original_text,
                translated_text: block.translated_text,
            };
            if let Err(e) = self.windows.post(id, message) {
                tracing::warn!("[OVERLAY] Failed to send translation to window: {}", e);
            }
            self.translations.push(id);
        }
    }

    fn toggle_visibility(&mut self) {
        self.translations_visible = !self.translations_visible;
        for id in &self.translations {
            if let Err(e) = self.windows.set_visible(*id, self.translations_visible) {
                tracing::debug!("[OVERLAY] Could not toggle {:?}: {}", id, e);
            }
        }
        tracing::info!(
            "[OVERLAY] Translations {}",
            if self.translations_visible { "shown" } else { "hidden" }
        );
    }

    async fn shutdown(&mut self) {
        tracing::info!("[OVERLAY] Shutting down");
        self.close_selection();
        self.close_translations();
        if let Some(id) = self.boundary.take() {
            self.close_window(id);
        }
        self.region = None;
        self.state = OverlayState::Idle;
        self.worker.shutdown().await;
    }

    fn close_selection(&mut self) {
        if let Some(id) = self.selection.take() {
            self.close_window(id);
        }
    }

    fn close_translations(&mut self) {
        for id in std::mem::take(&mut self.translations) {
            self.close_window(id);
        }
    }

    fn close_window(&self, id: WindowId) {
        if !self.windows.is_destroyed(id) {
            self.windows.close(id);
        }
    }
}

async fn forward_events(events: AsyncReceiver<AppEvent>, inputs: mpsc::UnboundedSender<Input>) {
    while let Ok(event) = events.recv().await {
        if inputs.send(Input::Event(event)).is_err() {
            return;
        }
    }
    tracing::debug!("[OVERLAY] Event channel closed, shutting down");
    let _ = inputs.send(Input::Event(AppEvent::Shutdown));
}

async fn tick(period: std::time::Duration, inputs: mpsc::UnboundedSender<Input>) {
    let mut interval = tokio::time::interval(period);
    interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
    interval.tick().await;
    loop {
        interval.tick().await;
        if inputs.send(Input::Tick).is_err() {
            return;
        }
    }
}
