use std::collections::HashMap;
use std::f32::consts::TAU;

use eframe::egui::{Vec2, vec2};
use tracing::{info, warn};

use crate::config::{CanvasConfig, SimulationConfig};
use crate::error::{EngineError, Result};
use crate::graph::{GraphEdge, GraphNode, GraphSnapshot};
use crate::util::stable_pair;

/// Mutable kinematics for one node. `pinned` holds the fixed position while a drag owns the
/// node; forces never move a pinned node.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct NodeState {
    pub position: Vec2,
    pub velocity: Vec2,
    pub pinned: Option<Vec2>,
}

impl NodeState {
    fn at(position: Vec2) -> Self {
        Self {
            position,
            velocity: Vec2::ZERO,
            pinned: None,
        }
    }

    pub fn is_pinned(&self) -> bool {
        self.pinned.is_some()
    }
}

/// An edge whose endpoints resolved to node indices. `edge` indexes the snapshot edge list.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ResolvedEdge {
    pub source: usize,
    pub target: usize,
    pub edge: usize,
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct LoadReport {
    pub dropped_edges: Vec<usize>,
    pub duplicate_nodes: Vec<String>,
}

pub struct GraphModel {
    snapshot: GraphSnapshot,
    states: Vec<NodeState>,
    edges: Vec<ResolvedEdge>,
    index_by_id: HashMap<String, usize>,
    degree: Vec<usize>,
}

impl GraphModel {
    /// Strict load: any dangling edge or duplicate id is an error.
    pub fn load(
        snapshot: GraphSnapshot,
        canvas: &CanvasConfig,
        simulation: &SimulationConfig,
    ) -> Result<Self> {
        let (model, report) = Self::build(snapshot, canvas, simulation)?;
        if let Some(id) = report.duplicate_nodes.first() {
            return Err(EngineError::DuplicateNode { id: id.clone() });
        }
        if !report.dropped_edges.is_empty() {
            return Err(EngineError::DanglingEdge {
                indices: report.dropped_edges,
            });
        }
        Ok(model)
    }

    /// Drops dangling edges and duplicate nodes, reporting them instead of failing.
    pub fn load_lenient(
        snapshot: GraphSnapshot,
        canvas: &CanvasConfig,
        simulation: &SimulationConfig,
    ) -> Result<(Self, LoadReport)> {
        let (model, report) = Self::build(snapshot, canvas, simulation)?;
        if !report.dropped_edges.is_empty() {
            warn!(
                dropped = report.dropped_edges.len(),
                indices = ?report.dropped_edges,
                "dropping edges with unknown endpoints"
            );
        }
        if !report.duplicate_nodes.is_empty() {
            warn!(ids = ?report.duplicate_nodes, "dropping duplicate node ids");
        }
        Ok((model, report))
    }

    fn build(
        snapshot: GraphSnapshot,
        canvas: &CanvasConfig,
        simulation: &SimulationConfig,
    ) -> Result<(Self, LoadReport)> {
        if snapshot.nodes.is_empty() {
            return Err(EngineError::EmptySnapshot);
        }

        let GraphSnapshot {
            nodes: raw_nodes,
            edges: raw_edges,
        } = snapshot;

        let mut report = LoadReport::default();
        let mut index_by_id = HashMap::with_capacity(raw_nodes.len());
        let mut nodes = Vec::with_capacity(raw_nodes.len());
        for node in raw_nodes {
            if index_by_id.contains_key(&node.id) {
                report.duplicate_nodes.push(node.id);
                continue;
            }
            index_by_id.insert(node.id.clone(), nodes.len());
            nodes.push(node);
        }

        let mut edges = Vec::with_capacity(raw_edges.len());
        let mut kept_edges = Vec::with_capacity(raw_edges.len());
        let mut degree = vec![0usize; nodes.len()];
        for (edge_index, edge) in raw_edges.into_iter().enumerate() {
            match (index_by_id.get(&edge.source), index_by_id.get(&edge.target)) {
                (Some(&source), Some(&target)) => {
                    degree[source] += 1;
                    degree[target] += 1;
                    edges.push(ResolvedEdge {
                        source,
                        target,
                        edge: kept_edges.len(),
                    });
                    kept_edges.push(edge);
                }
                _ => report.dropped_edges.push(edge_index),
            }
        }

        let node_count = nodes.len();
        let states = nodes
            .iter()
            .enumerate()
            .map(|(index, node)| {
                let position = node
                    .initial_position()
                    .map(|preset| clamp_to_canvas(preset, canvas))
                    .unwrap_or_else(|| {
                        seed_position(index, node_count, &node.id, canvas, simulation)
                    });
                NodeState::at(position)
            })
            .collect::<Vec<_>>();

        info!(
            nodes = node_count,
            edges = edges.len(),
            "graph model loaded"
        );

        Ok((
            Self {
                snapshot: GraphSnapshot::new(nodes, kept_edges),
                states,
                edges,
                index_by_id,
                degree,
            },
            report,
        ))
    }

    pub fn node_count(&self) -> usize {
        self.states.len()
    }

    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }

    /// The snapshot as loaded: duplicates and dangling edges already removed.
    pub fn snapshot(&self) -> &GraphSnapshot {
        &self.snapshot
    }

    pub fn nodes(&self) -> &[GraphNode] {
        &self.snapshot.nodes
    }

    pub fn node(&self, index: usize) -> Option<&GraphNode> {
        self.snapshot.nodes.get(index)
    }

    pub fn states(&self) -> &[NodeState] {
        &self.states
    }

    pub(crate) fn states_mut(&mut self) -> &mut [NodeState] {
        &mut self.states
    }

    pub fn edges(&self) -> &[ResolvedEdge] {
        &self.edges
    }

    pub fn edge_data(&self, edge: &ResolvedEdge) -> &GraphEdge {
        &self.snapshot.edges[edge.edge]
    }

    pub fn degree(&self) -> &[usize] {
        &self.degree
    }

    pub fn index_of(&self, id: &str) -> Option<usize> {
        self.index_by_id.get(id).copied()
    }

    pub fn position(&self, index: usize) -> Option<Vec2> {
        self.states.get(index).map(|state| state.position)
    }

    pub fn position_of(&self, id: &str) -> Option<Vec2> {
        self.index_of(id).and_then(|index| self.position(index))
    }

    pub fn pinned_ids(&self) -> Vec<&str> {
        self.states
            .iter()
            .zip(&self.snapshot.nodes)
            .filter(|(state, _)| state.is_pinned())
            .map(|(_, node)| node.id.as_str())
            .collect()
    }

    /// Pins the node where it is; dragging then moves the pin, not the forces.
    pub fn pin(&mut self, index: usize, position: Vec2) {
        if let Some(state) = self.states.get_mut(index) {
            state.pinned = Some(position);
            state.position = position;
            state.velocity = Vec2::ZERO;
        }
    }

    /// Releases the pin and keeps the node where it currently sits.
    pub fn unpin(&mut self, index: usize) {
        if let Some(state) = self.states.get_mut(index) {
            state.pinned = None;
        }
    }

    pub fn incident_edges(&self, index: usize) -> impl Iterator<Item = &ResolvedEdge> {
        self.edges
            .iter()
            .filter(move |edge| edge.source == index || edge.target == index)
    }
}

fn canvas_bounds(canvas: &CanvasConfig) -> (Vec2, Vec2) {
    let margin_x = canvas.margin.max(1.0).min(canvas.width * 0.25);
    let margin_y = canvas.margin.max(1.0).min(canvas.height * 0.25);
    (
        vec2(margin_x, margin_y),
        vec2(canvas.width - margin_x, canvas.height - margin_y),
    )
}

fn clamp_to_canvas(position: Vec2, canvas: &CanvasConfig) -> Vec2 {
    let (min, max) = canvas_bounds(canvas);
    vec2(
        position.x.clamp(min.x, max.x),
        position.y.clamp(min.y, max.y),
    )
}

fn seed_position(
    index: usize,
    node_count: usize,
    id: &str,
    canvas: &CanvasConfig,
    simulation: &SimulationConfig,
) -> Vec2 {
    let (min, max) = canvas_bounds(canvas);
    let max_ring = ((max.x - min.x).min(max.y - min.y) * 0.5 - simulation.seed_jitter).max(0.0);
    let ring = (simulation.seed_radius * (node_count as f32).sqrt()).min(max_ring);

    let angle = (index as f32 / node_count.max(1) as f32) * TAU;
    let (jx, jy) = stable_pair(id);
    let radial = vec2(angle.cos(), angle.sin()) * ring;
    let jitter = vec2(jx, jy) * simulation.seed_jitter;

    clamp_to_canvas(canvas.center() + radial + jitter, canvas)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::NodeKind;

    fn snapshot(ids: &[&str], edges: &[(&str, &str)]) -> GraphSnapshot {
        GraphSnapshot::new(
            ids.iter()
                .map(|id| GraphNode::new(*id, NodeKind::Entity))
                .collect(),
            edges
                .iter()
                .map(|(source, target)| GraphEdge::new(*source, *target))
                .collect(),
        )
    }

    fn load(snapshot: GraphSnapshot) -> Result<GraphModel> {
        GraphModel::load(
            snapshot,
            &CanvasConfig::default(),
            &SimulationConfig::default(),
        )
    }

    #[test]
    fn seeded_positions_are_finite_and_inside_canvas() {
        let canvas = CanvasConfig::default();
        for count in [1usize, 2, 3, 17, 400, 2500] {
            let ids = (0..count).map(|i| format!("n{i}")).collect::<Vec<_>>();
            let refs = ids.iter().map(String::as_str).collect::<Vec<_>>();
            let model = load(snapshot(&refs, &[])).unwrap();

            for state in model.states() {
                assert!(state.position.is_finite());
                assert!(state.position.x > 0.0 && state.position.x < canvas.width);
                assert!(state.position.y > 0.0 && state.position.y < canvas.height);
                assert!(!state.is_pinned());
                assert_eq!(state.velocity, Vec2::ZERO);
            }
        }
    }

    #[test]
    fn seeding_is_deterministic() {
        let first = load(snapshot(&["a", "b", "c"], &[])).unwrap();
        let second = load(snapshot(&["a", "b", "c"], &[])).unwrap();
        assert_eq!(first.states(), second.states());
    }

    #[test]
    fn dangling_edges_fail_strict_load_with_indices() {
        let error = load(snapshot(
            &["a", "b"],
            &[("a", "b"), ("a", "ghost"), ("ghost", "b")],
        ))
        .err()
        .unwrap();
        assert_eq!(error, EngineError::DanglingEdge { indices: vec![1, 2] });
    }

    #[test]
    fn lenient_load_drops_dangling_edges() {
        let (model, report) = GraphModel::load_lenient(
            snapshot(&["a", "b", "c"], &[("a", "ghost"), ("b", "c")]),
            &CanvasConfig::default(),
            &SimulationConfig::default(),
        )
        .unwrap();

        assert_eq!(report.dropped_edges, vec![0]);
        assert_eq!(model.edge_count(), 1);
        let edge = model.edges()[0];
        assert_eq!((edge.source, edge.target), (1, 2));
        assert_eq!(model.edge_data(&edge).source, "b");
        assert_eq!(model.degree(), [0, 1, 1]);
    }

    #[test]
    fn duplicate_ids_keep_the_first_node() {
        let (model, report) = GraphModel::load_lenient(
            snapshot(&["a", "b", "a"], &[]),
            &CanvasConfig::default(),
            &SimulationConfig::default(),
        )
        .unwrap();
        assert_eq!(model.node_count(), 2);
        assert_eq!(report.duplicate_nodes, vec!["a".to_owned()]);
        assert!(matches!(
            load(snapshot(&["a", "a"], &[])),
            Err(EngineError::DuplicateNode { .. })
        ));
    }

    #[test]
    fn empty_snapshot_is_rejected() {
        assert!(matches!(
            load(GraphSnapshot::default()),
            Err(EngineError::EmptySnapshot)
        ));
    }

    #[test]
    fn preset_positions_are_kept_and_clamped() {
        let nodes = vec![
            GraphNode::new("a", NodeKind::Paper)
                .with_meta("x", 300.0)
                .with_meta("y", 200.0),
            GraphNode::new("b", NodeKind::Paper)
                .with_meta("x", -50.0)
                .with_meta("y", 5000.0),
        ];
        let model = load(GraphSnapshot::new(nodes, Vec::new())).unwrap();
        assert_eq!(model.position(0), Some(vec2(300.0, 200.0)));
        assert_eq!(model.position(1), Some(vec2(20.0, 1060.0)));
    }

    #[test]
    fn pin_and_unpin_keep_current_position() {
        let mut model = load(snapshot(&["a", "b"], &[("a", "b")])).unwrap();
        model.pin(0, vec2(500.0, 500.0));
        assert_eq!(model.pinned_ids(), vec!["a"]);
        assert_eq!(model.position(0), Some(vec2(500.0, 500.0)));

        model.unpin(0);
        assert!(model.pinned_ids().is_empty());
        assert_eq!(model.position(0), Some(vec2(500.0, 500.0)));
    }
}
