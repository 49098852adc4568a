use std::sync::mpsc::{self, Receiver, TryRecvError};
use std::thread;

use eframe::egui::{self, Context, Vec2};
use tracing::{info, warn};

use crate::config::{ExplorerConfig, SimulationConfig};
use crate::engine::LayoutSession;
use crate::engine::model::LoadReport;
use crate::engine::viewport::ViewportState;
use crate::error::EngineError;
use crate::graph::{DataSource, DatasetCatalog, GraphSnapshot, LoadedDataset};

mod graph;
mod render_utils;
mod search;
mod ui;

/// What the command line asked the viewer to open.
#[derive(Clone, Debug)]
pub struct LaunchOptions {
    pub source: DataSource,
    pub dataset: Option<String>,
    pub focus: Option<String>,
    pub highlight: Vec<String>,
}

type LoadResult = Result<LoadedDataset, String>;

pub struct ExplorerApp {
    config: ExplorerConfig,
    source: DataSource,
    dataset: Option<String>,
    catalog: Option<DatasetCatalog>,
    focus: Option<String>,
    highlight: Vec<String>,
    state: AppState,
    reload_rx: Option<Receiver<LoadResult>>,
}

enum AppState {
    Loading { rx: Receiver<LoadResult> },
    Ready(Box<ViewModel>),
    Empty { dataset: String },
    Error(String),
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
enum ViewAction {
    #[default]
    None,
    Reload,
    SwitchDataset(String),
}

struct ViewModel {
    dataset: String,
    config: ExplorerConfig,
    snapshot: GraphSnapshot,
    report: LoadReport,
    session: Option<LayoutSession>,
    highlight_ids: Vec<String>,
    search: String,
    search_hits: Vec<usize>,
    simulation: SimulationConfig,
    live_physics: bool,
    needs_fit: bool,
    pending_focus: Option<String>,
    canvas_size: Vec2,
    pointer_captured: bool,
    settled_after: Option<u64>,
}

impl ExplorerApp {
    pub fn new(
        _cc: &eframe::CreationContext<'_>,
        config: ExplorerConfig,
        launch: LaunchOptions,
    ) -> Self {
        let rx = Self::spawn_load(launch.source.clone(), launch.dataset.clone());
        Self {
            config,
            source: launch.source,
            dataset: launch.dataset,
            catalog: None,
            focus: launch.focus,
            highlight: launch.highlight,
            state: AppState::Loading { rx },
            reload_rx: None,
        }
    }

    fn spawn_load(source: DataSource, dataset: Option<String>) -> Receiver<LoadResult> {
        let (tx, rx) = mpsc::channel();

        thread::spawn(move || {
            let result = source
                .load(dataset.as_deref())
                .map_err(|error| format!("{error:#}"));
            let _ = tx.send(result);
        });

        rx
    }

    fn start_load(&self) -> AppState {
        AppState::Loading {
            rx: Self::spawn_load(self.source.clone(), self.dataset.clone()),
        }
    }

    fn finish_load(&mut self, result: LoadResult, carried: Option<ViewportState>) -> AppState {
        let loaded = match result {
            Ok(loaded) => loaded,
            Err(error) => {
                warn!(%error, "dataset load failed");
                return AppState::Error(error);
            }
        };

        if let Some(catalog) = &loaded.catalog {
            self.catalog = Some(catalog.clone());
        }
        self.dataset = Some(loaded.name.clone());
        info!(
            dataset = %loaded.name,
            nodes = loaded.snapshot.node_count(),
            edges = loaded.snapshot.edge_count(),
            "dataset loaded"
        );

        let dataset = loaded.name.clone();
        match ViewModel::new(loaded, &self.config, &self.highlight, self.focus.take(), carried) {
            Ok(model) => AppState::Ready(Box::new(model)),
            Err(EngineError::EmptySnapshot) => AppState::Empty { dataset },
            Err(error) => AppState::Error(error.to_string()),
        }
    }
}

impl eframe::App for ExplorerApp {
    fn update(&mut self, ctx: &Context, _frame: &mut eframe::Frame) {
        let mut loaded = None;
        let mut action = ViewAction::None;

        match &mut self.state {
            AppState::Loading { rx } => {
                match rx.try_recv() {
                    Ok(result) => loaded = Some((result, None)),
                    Err(TryRecvError::Empty) => ctx.request_repaint(),
                    Err(TryRecvError::Disconnected) => {
                        let error = "Background load worker disconnected".to_owned();
                        loaded = Some((Err(error), None));
                    }
                }

                egui::CentralPanel::default().show(ctx, |ui| {
                    ui.vertical_centered(|ui| {
                        ui.add_space(120.0);
                        ui.heading("Loading knowledge graph...");
                        ui.add_space(8.0);
                        ui.spinner();
                    });
                });
            }
            AppState::Empty { dataset } => {
                egui::CentralPanel::default().show(ctx, |ui| {
                    ui.heading(format!("Dataset {dataset:?} has no nodes"));
                    ui.add_space(6.0);
                    ui.label("There is nothing to lay out. Pick another dataset or reload.");
                    ui.add_space(10.0);
                    ui.horizontal(|ui| {
                        if let Some(name) = ui::dataset_picker(ui, self.catalog.as_ref(), dataset) {
                            action = ViewAction::SwitchDataset(name);
                        }
                        if ui.button("Reload").clicked() {
                            action = ViewAction::Reload;
                        }
                    });
                });
            }
            AppState::Error(error) => {
                egui::CentralPanel::default().show(ctx, |ui| {
                    ui.heading("Failed to load knowledge graph");
                    ui.add_space(6.0);
                    ui.label(error.as_str());
                    ui.add_space(10.0);
                    if ui.button("Retry").clicked() {
                        action = ViewAction::Reload;
                    }
                });
            }
            AppState::Ready(model) => {
                let is_reloading = self.reload_rx.is_some();
                model.show(ctx, self.catalog.as_ref(), is_reloading, &mut action);

                if let Some(rx) = self.reload_rx.take() {
                    match rx.try_recv() {
                        Ok(result) => {
                            let carried = model.viewport();
                            model.teardown();
                            loaded = Some((result, carried));
                        }
                        Err(TryRecvError::Empty) => {
                            self.reload_rx = Some(rx);
                            ctx.request_repaint();
                        }
                        Err(TryRecvError::Disconnected) => {
                            model.teardown();
                            loaded =
                                Some((Err("Background load worker disconnected".to_owned()), None));
                        }
                    }
                }
            }
        }

        match action {
            ViewAction::None => {}
            ViewAction::Reload => self.request_load(),
            ViewAction::SwitchDataset(name) => {
                info!(from = ?self.dataset, to = %name, "switching dataset");
                self.dataset = Some(name);
                self.request_load();
            }
        }

        if let Some((result, carried)) = loaded {
            self.reload_rx = None;
            self.state = self.finish_load(result, carried);
        }
    }
}

impl ExplorerApp {
    /// Ready views keep drawing while the next snapshot loads; other states go back to the
    /// spinner.
    fn request_load(&mut self) {
        if matches!(self.state, AppState::Ready(_)) {
            if self.reload_rx.is_none() {
                self.reload_rx = Some(Self::spawn_load(self.source.clone(), self.dataset.clone()));
            }
        } else {
            self.state = self.start_load();
        }
    }
}

impl ViewModel {
    fn new(
        loaded: LoadedDataset,
        config: &ExplorerConfig,
        highlight_ids: &[String],
        focus: Option<String>,
        carried: Option<ViewportState>,
    ) -> crate::error::Result<Self> {
        let session = Self::open_session(loaded.snapshot, config, highlight_ids)?;
        let snapshot = session.model().snapshot().clone();
        let report = session.report().clone();

        let mut model = Self {
            dataset: loaded.name,
            config: config.clone(),
            snapshot,
            report,
            session: Some(session),
            highlight_ids: highlight_ids.to_vec(),
            search: String::new(),
            search_hits: Vec::new(),
            simulation: config.simulation,
            live_physics: true,
            needs_fit: carried.is_none(),
            pending_focus: focus,
            canvas_size: Vec2::ZERO,
            pointer_captured: false,
            settled_after: None,
        };
        if let (Some(state), Some(session)) = (carried, model.session.as_mut()) {
            session.set_viewport(state);
        }
        Ok(model)
    }

    fn open_session(
        snapshot: GraphSnapshot,
        config: &ExplorerConfig,
        highlight_ids: &[String],
    ) -> crate::error::Result<LayoutSession> {
        let mut session = LayoutSession::new(snapshot, config)?;
        let matched = session.set_highlight(highlight_ids.iter().map(String::as_str));
        if matched < highlight_ids.len() {
            warn!(
                requested = highlight_ids.len(),
                matched, "some highlighted ids are not in this dataset"
            );
        }
        Ok(session)
    }

    fn viewport(&self) -> Option<ViewportState> {
        self.session.as_ref().map(LayoutSession::viewport)
    }

    fn teardown(&mut self) {
        if let Some(session) = self.session.as_mut() {
            session.teardown();
        }
    }

    /// Closing drops the session; reopening starts a fresh layout with a fitted viewport.
    fn toggle_open(&mut self) {
        if let Some(mut session) = self.session.take() {
            session.teardown();
            self.pointer_captured = false;
            self.settled_after = None;
            return;
        }

        let mut config = self.config.clone();
        config.simulation = self.simulation;
        match Self::open_session(self.snapshot.clone(), &config, &self.highlight_ids) {
            Ok(session) => {
                self.session = Some(session);
                self.needs_fit = true;
                self.refresh_highlight();
            }
            Err(error) => warn!(%error, "could not reopen graph view"),
        }
    }

    fn refresh_highlight(&mut self) {
        let Some(session) = self.session.as_mut() else {
            return;
        };
        let model = session.model();
        let mut ids = self.highlight_ids.clone();
        ids.extend(
            self.search_hits
                .iter()
                .filter_map(|&index| model.node(index))
                .map(|node| node.id.clone()),
        );
        session.set_highlight(ids.iter().map(String::as_str));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::{GraphEdge, GraphNode, NodeKind};

    fn loaded_with_bad_records() -> LoadedDataset {
        LoadedDataset {
            name: "demo".to_owned(),
            snapshot: GraphSnapshot::new(
                vec![
                    GraphNode::new("p1", NodeKind::Paper),
                    GraphNode::new("e1", NodeKind::Entity),
                    GraphNode::new("e1", NodeKind::Entity),
                ],
                vec![GraphEdge::new("p1", "e1"), GraphEdge::new("e1", "gone")],
            ),
            catalog: None,
        }
    }

    #[test]
    fn closed_view_counts_match_the_loaded_model() {
        let mut view = ViewModel::new(
            loaded_with_bad_records(),
            &ExplorerConfig::default(),
            &[],
            None,
            None,
        )
        .unwrap();
        let (nodes, edges) = view
            .session
            .as_ref()
            .map(|session| (session.model().node_count(), session.model().edge_count()))
            .unwrap();
        assert_eq!((nodes, edges), (2, 1));

        view.toggle_open();
        assert!(view.session.is_none());
        assert_eq!(view.snapshot.node_count(), nodes);
        assert_eq!(view.snapshot.edge_count(), edges);
        let entities = view
            .snapshot
            .nodes
            .iter()
            .filter(|node| node.kind == NodeKind::Entity)
            .count();
        assert_eq!(entities, 1);
    }

    #[test]
    fn load_warnings_survive_close_and_reopen() {
        let mut view = ViewModel::new(
            loaded_with_bad_records(),
            &ExplorerConfig::default(),
            &[],
            None,
            None,
        )
        .unwrap();

        view.toggle_open();
        view.toggle_open();
        assert!(view.session.is_some());
        assert_eq!(view.report.dropped_edges, vec![1]);
        assert_eq!(view.report.duplicate_nodes, vec!["e1".to_owned()]);
    }
}
