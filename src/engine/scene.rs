use std::collections::HashSet;

use eframe::egui::{Color32, Pos2, vec2};

use crate::graph::NodeKind;
use crate::util::{LABEL_MAX_CHARS, truncate_label};

use super::interaction::SelectionState;
use super::model::GraphModel;
use super::viewport::ViewportState;

const HOVER_SCALE: f32 = 1.5;
const LABEL_OFFSET: f32 = 25.0;
const MIN_PICK_RADIUS: f32 = 4.0;

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct NodeStyle {
    pub radius: f32,
    pub color: Color32,
}

pub fn node_style(kind: NodeKind) -> NodeStyle {
    let (radius, color) = match kind {
        NodeKind::Paper => (12.0, Color32::from_rgb(0x00, 0xff, 0x00)),
        NodeKind::Entity => (8.0, Color32::from_rgb(0x00, 0xcc, 0xff)),
        NodeKind::Result => (6.0, Color32::from_rgb(0xff, 0xaa, 0x00)),
        NodeKind::Conclusion => (6.0, Color32::from_rgb(0xff, 0x00, 0xaa)),
        NodeKind::Unknown => (5.0, Color32::from_rgb(0x88, 0x88, 0x88)),
    };
    NodeStyle { radius, color }
}

#[derive(Clone, Debug, PartialEq)]
pub struct SceneNode {
    pub index: usize,
    pub center: Pos2,
    pub radius: f32,
    pub color: Color32,
    pub label: String,
    pub label_pos: Pos2,
    pub hovered: bool,
    pub selected: bool,
    pub highlighted: bool,
}

#[derive(Clone, Debug, PartialEq)]
pub struct SceneEdge {
    pub edge: usize,
    pub from: Pos2,
    pub to: Pos2,
    pub emphasized: bool,
}

/// Everything needed to draw one frame, in screen space relative to the canvas origin.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Scene {
    pub nodes: Vec<SceneNode>,
    pub edges: Vec<SceneEdge>,
}

pub fn build_scene(
    model: &GraphModel,
    viewport: ViewportState,
    selection: &SelectionState,
    highlight: &HashSet<usize>,
) -> Scene {
    let selected = selection
        .selected
        .as_deref()
        .and_then(|id| model.index_of(id));
    let hovered = selection
        .hovered
        .as_deref()
        .and_then(|id| model.index_of(id));

    let edges = model
        .edges()
        .iter()
        .map(|edge| SceneEdge {
            edge: edge.edge,
            from: viewport.world_to_screen(model.states()[edge.source].position),
            to: viewport.world_to_screen(model.states()[edge.target].position),
            emphasized: selected.is_some_and(|index| index == edge.source || index == edge.target),
        })
        .collect();

    let nodes = model
        .nodes()
        .iter()
        .zip(model.states())
        .enumerate()
        .map(|(index, (node, state))| {
            let style = node_style(node.kind);
            let is_hovered = hovered == Some(index);
            let radius = drawn_radius(&style, is_hovered);
            let center = viewport.world_to_screen(state.position);
            let name = node.display_name();

            SceneNode {
                index,
                center,
                radius: radius * viewport.scale,
                color: style.color,
                label: truncate_label(&name, LABEL_MAX_CHARS).to_owned(),
                label_pos: center + vec2(0.0, LABEL_OFFSET * viewport.scale),
                hovered: is_hovered,
                selected: selected == Some(index),
                highlighted: highlight.contains(&index),
            }
        })
        .collect();

    Scene { nodes, edges }
}

fn drawn_radius(style: &NodeStyle, hovered: bool) -> f32 {
    if hovered {
        style.radius * HOVER_SCALE
    } else {
        style.radius
    }
}

/// Nearest node whose drawn disc contains `screen`. The hovered node is picked at its enlarged
/// size.
pub fn hit_test(
    model: &GraphModel,
    viewport: ViewportState,
    selection: &SelectionState,
    screen: Pos2,
) -> Option<usize> {
    let hovered = selection
        .hovered
        .as_deref()
        .and_then(|id| model.index_of(id));
    let mut best: Option<(usize, f32)> = None;
    for (index, (node, state)) in model.nodes().iter().zip(model.states()).enumerate() {
        let radius = drawn_radius(&node_style(node.kind), hovered == Some(index));
        let reach = (radius * viewport.scale).max(MIN_PICK_RADIUS);
        let distance = viewport.world_to_screen(state.position).distance(screen);
        if distance <= reach && best.is_none_or(|(_, nearest)| distance < nearest) {
            best = Some((index, distance));
        }
    }
    best.map(|(index, _)| index)
}
