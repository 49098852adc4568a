pub mod interaction;
pub mod model;
pub mod scene;
pub mod simulation;
pub mod viewport;

use std::collections::HashSet;

use eframe::egui::{Pos2, Vec2};
use tracing::{debug, info, warn};

use crate::config::{ExplorerConfig, SimulationConfig};
use crate::error::{EngineError, Result};
use crate::graph::GraphSnapshot;

use interaction::{Effect, InteractionController, PointerEvent, SelectionState};
use model::{GraphModel, LoadReport};
use scene::{Scene, build_scene, hit_test};
use simulation::SimulationState;
use viewport::{ViewportController, ViewportState};

#[derive(Clone, Debug, PartialEq)]
pub enum EngineEvent {
    NodeSelected(Option<String>),
    ViewportChanged(ViewportState),
    SimulationSettled,
}

/// Whether the host should keep scheduling frames for a session.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum FrameScheduler {
    #[default]
    Active,
    Idle,
    Cancelled,
}

impl FrameScheduler {
    pub fn wants_frame(self) -> bool {
        self == Self::Active
    }

    pub fn is_cancelled(self) -> bool {
        self == Self::Cancelled
    }

    fn wake(&mut self) {
        if *self == Self::Idle {
            *self = Self::Active;
        }
    }

    fn sleep(&mut self) {
        if *self == Self::Active {
            *self = Self::Idle;
        }
    }

    fn cancel(&mut self) {
        *self = Self::Cancelled;
    }
}

/// One loaded snapshot with its simulation, viewport and pointer state. Dropping the session
/// without `teardown` is fine; `teardown` exists so a host that still holds it stops driving it.
pub struct LayoutSession {
    config: ExplorerConfig,
    model: GraphModel,
    report: LoadReport,
    simulation: SimulationState,
    viewport: ViewportController,
    interaction: InteractionController,
    scheduler: FrameScheduler,
    highlight: HashSet<usize>,
    events: Vec<EngineEvent>,
}

impl LayoutSession {
    pub fn new(snapshot: GraphSnapshot, config: &ExplorerConfig) -> Result<Self> {
        config
            .validate()
            .map_err(|error| EngineError::InvalidConfig {
                reason: format!("{error:#}"),
            })?;
        let (model, report) =
            GraphModel::load_lenient(snapshot, &config.canvas, &config.simulation)?;

        Ok(Self {
            config: config.clone(),
            simulation: SimulationState::new(config.simulation, &config.canvas),
            viewport: ViewportController::new(config.viewport),
            interaction: InteractionController::new(config.interaction),
            scheduler: FrameScheduler::Active,
            highlight: HashSet::new(),
            events: Vec::new(),
            model,
            report,
        })
    }

    pub fn model(&self) -> &GraphModel {
        &self.model
    }

    pub fn report(&self) -> &LoadReport {
        &self.report
    }

    pub fn simulation(&self) -> &SimulationState {
        &self.simulation
    }

    pub fn viewport(&self) -> ViewportState {
        self.viewport.state()
    }

    pub fn selection(&self) -> &SelectionState {
        self.interaction.selection()
    }

    pub fn highlight(&self) -> &HashSet<usize> {
        &self.highlight
    }

    pub fn scheduler(&self) -> FrameScheduler {
        self.scheduler
    }

    pub fn is_torn_down(&self) -> bool {
        self.scheduler.is_cancelled()
    }

    /// True while the layout is moving or a drag is in progress.
    pub fn needs_frame(&self) -> bool {
        !self.is_torn_down() && (self.scheduler.wants_frame() || self.interaction.is_dragging())
    }

    pub fn tick(&mut self) -> bool {
        if self.is_torn_down() {
            return false;
        }

        let report = self.simulation.tick(&mut self.model);
        if report.settled {
            self.events.push(EngineEvent::SimulationSettled);
            self.scheduler.sleep();
        }
        report.ticked
    }

    pub fn pointer_down(&mut self, screen: Pos2, target: Option<&str>, time: f64) {
        if self.is_torn_down() {
            return;
        }
        let target = target.and_then(|id| self.model.index_of(id));
        let effects = self.interaction.handle(PointerEvent::Down {
            screen,
            target,
            time,
        });
        self.apply(effects);
    }

    pub fn pointer_move(&mut self, screen: Pos2) {
        if self.is_torn_down() {
            return;
        }
        let effects = self.interaction.handle(PointerEvent::Move { screen });
        self.apply(effects);
    }

    pub fn pointer_up(&mut self, time: f64) {
        if self.is_torn_down() {
            return;
        }
        let effects = self.interaction.handle(PointerEvent::Up { time });
        self.apply(effects);
    }

    /// Selects `target`, or clears the selection for `None` and unknown ids.
    pub fn click(&mut self, target: Option<&str>) {
        if self.is_torn_down() {
            return;
        }
        let target = target
            .and_then(|id| self.model.index_of(id))
            .and_then(|index| self.model.node(index))
            .map(|node| node.id.clone());
        self.select(target);
    }

    pub fn hover(&mut self, target: Option<&str>) {
        if self.is_torn_down() {
            return;
        }
        let target = target
            .filter(|id| self.model.index_of(id).is_some())
            .map(str::to_owned);
        self.interaction.hover(target);
    }

    pub fn node_at(&self, screen: Pos2) -> Option<&str> {
        hit_test(
            &self.model,
            self.viewport.state(),
            self.interaction.selection(),
            screen,
        )
            .and_then(|index| self.model.node(index))
            .map(|node| node.id.as_str())
    }

    pub fn wheel(&mut self, delta: f32, pointer: Pos2) {
        if self.is_torn_down() {
            return;
        }
        let state = self.viewport.on_wheel(delta, pointer);
        self.events.push(EngineEvent::ViewportChanged(state));
    }

    pub fn pan(&mut self, delta: Vec2) {
        if self.is_torn_down() {
            return;
        }
        let state = self.viewport.on_pan_drag(delta);
        self.events.push(EngineEvent::ViewportChanged(state));
    }

    pub fn set_viewport(&mut self, state: ViewportState) {
        if self.is_torn_down() {
            return;
        }
        let state = self.viewport.set(state);
        self.events.push(EngineEvent::ViewportChanged(state));
    }

    /// Fits the logical canvas into a widget of `screen` size.
    pub fn reset_view(&mut self, screen: Vec2) {
        let fitted = ViewportState::fit(self.config.canvas.size(), screen, self.viewport.limits());
        self.set_viewport(fitted);
    }

    /// Selects `id` and moves it to the middle of the widget. Returns false for unknown ids.
    pub fn focus(&mut self, id: &str, screen: Vec2) -> bool {
        let Some(position) = self.model.position_of(id) else {
            return false;
        };
        self.click(Some(id));
        let centered = self.viewport.state().centered_on(position, screen);
        self.set_viewport(centered);
        true
    }

    /// Replaces the highlighted set and returns how many ids matched a node.
    pub fn set_highlight<'a>(&mut self, ids: impl IntoIterator<Item = &'a str>) -> usize {
        self.highlight = ids
            .into_iter()
            .filter_map(|id| self.model.index_of(id))
            .collect();
        self.highlight.len()
    }

    pub fn set_simulation_config(&mut self, config: SimulationConfig) {
        if self.is_torn_down() {
            return;
        }
        if let Err(error) = config.validate() {
            warn!(error = %format!("{error:#}"), "ignoring simulation settings");
            return;
        }
        self.config.simulation = config;
        self.simulation.set_config(config);
        self.scheduler.wake();
    }

    pub fn reheat(&mut self) {
        if self.is_torn_down() {
            return;
        }
        self.simulation.reheat();
        self.simulation.release();
        self.scheduler.wake();
    }

    pub fn scene(&self) -> Scene {
        build_scene(
            &self.model,
            self.viewport.state(),
            self.interaction.selection(),
            &self.highlight,
        )
    }

    pub fn drain_events(&mut self) -> Vec<EngineEvent> {
        std::mem::take(&mut self.events)
    }

    /// Stops the session for good: pending events are dropped, pins released, and every later
    /// call is a no-op.
    pub fn teardown(&mut self) {
        if self.is_torn_down() {
            return;
        }
        if let Some(index) = self.interaction.cancel() {
            self.model.unpin(index);
        }
        self.scheduler.cancel();
        self.events.clear();
        debug!(
            nodes = self.model.node_count(),
            ticks = self.simulation.tick_count(),
            "layout session torn down"
        );
    }

    fn select(&mut self, target: Option<String>) {
        if self.interaction.click(target.clone()) {
            info!(node = target.as_deref().unwrap_or("<none>"), "selection changed");
        }
        self.events.push(EngineEvent::NodeSelected(target));
    }

    fn apply(&mut self, effects: Vec<Effect>) {
        for effect in effects {
            match effect {
                Effect::PinInPlace(index) => {
                    if let Some(position) = self.model.position(index) {
                        self.model.pin(index, position);
                    }
                }
                Effect::Reheat => {
                    self.simulation.reheat();
                    self.scheduler.wake();
                }
                Effect::MovePin { index, screen } => {
                    let world = self.viewport.state().screen_to_world(screen);
                    self.model.pin(index, world);
                }
                Effect::Unpin(index) => self.model.unpin(index),
                Effect::ReleaseHeat => self.simulation.release(),
                Effect::Pan(delta) => self.pan(delta),
                Effect::Click(target) => {
                    let id = target
                        .and_then(|index| self.model.node(index))
                        .map(|node| node.id.clone());
                    self.select(id);
                }
            }
        }
    }
}
