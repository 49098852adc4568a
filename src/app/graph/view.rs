use eframe::egui::{Align2, Color32, FontId, Sense, Stroke, Ui, vec2};
use tracing::{debug, warn};

use crate::engine::EngineEvent;
use crate::engine::viewport::ViewportState;

use super::super::ViewModel;
use super::super::render_utils::{
    EDGE_COLOR, EMPHASIS_COLOR, HIGHLIGHT_COLOR, blend_color, circle_visible, dim_color,
    draw_background, edge_visible,
};

impl ViewModel {
    pub(in crate::app) fn draw_graph(&mut self, ui: &mut Ui) {
        let (rect, response) = ui.allocate_exact_size(ui.available_size(), Sense::click_and_drag());
        let painter = ui.painter_at(rect);
        self.canvas_size = rect.size();

        let Some(session) = self.session.as_mut() else {
            draw_background(&painter, rect, ViewportState::IDENTITY);
            painter.text(
                rect.center(),
                Align2::CENTER_CENTER,
                "Graph view closed. Press \"Open graph\" to lay it out again.",
                FontId::proportional(15.0),
                Color32::from_gray(200),
            );
            return;
        };

        if self.needs_fit && rect.width() > 0.0 && rect.height() > 0.0 {
            session.reset_view(rect.size());
            self.needs_fit = false;
        }
        if let Some(id) = self.pending_focus.take()
            && !session.focus(&id, rect.size())
        {
            warn!(node = %id, "focus target is not in this dataset");
        }

        self.route_pointer(ui, rect, &response);

        let live_physics = self.live_physics;
        let pointer_captured = self.pointer_captured;
        let Some(session) = self.session.as_mut() else {
            return;
        };

        if live_physics {
            session.tick();
        }
        if (live_physics && session.needs_frame()) || pointer_captured {
            ui.ctx().request_repaint();
        }

        for event in session.drain_events() {
            match event {
                EngineEvent::SimulationSettled => {
                    self.settled_after = Some(session.simulation().tick_count());
                }
                EngineEvent::NodeSelected(id) => debug!(?id, "node selected"),
                EngineEvent::ViewportChanged(state) => {
                    debug!(scale = state.scale, "viewport changed");
                }
            }
        }
        if session.simulation().is_active() {
            self.settled_after = None;
        }

        let viewport = session.viewport();
        let scene = session.scene();
        let offset = rect.min.to_vec2();
        let zoom_sqrt = viewport.scale.sqrt();
        let selection_active = session.selection().selected.is_some();

        draw_background(&painter, rect, viewport);

        for edge in &scene.edges {
            let start = edge.from + offset;
            let end = edge.to + offset;
            if !edge_visible(rect, start, end, 2.0) {
                continue;
            }

            let (line_width, line_color) = if edge.emphasized {
                ((2.2 * zoom_sqrt).clamp(1.2, 4.4), EMPHASIS_COLOR)
            } else if selection_active {
                ((0.9 * zoom_sqrt).clamp(0.45, 2.0), dim_color(EDGE_COLOR, 0.6))
            } else {
                ((1.2 * zoom_sqrt).clamp(0.6, 3.0), EDGE_COLOR)
            };
            painter.line_segment([start, end], Stroke::new(line_width, line_color));
        }

        let label_font = FontId::proportional((11.0 * zoom_sqrt).clamp(8.0, 16.0));
        for node in &scene.nodes {
            let center = node.center + offset;
            let label_pos = node.label_pos + offset;
            if !circle_visible(rect, center, node.radius) && !rect.contains(label_pos) {
                continue;
            }

            let fill = if node.selected {
                blend_color(node.color, EMPHASIS_COLOR, 0.35)
            } else if selection_active && !node.highlighted {
                dim_color(node.color, 0.7)
            } else {
                node.color
            };
            painter.circle_filled(center, node.radius, fill);
            painter.circle_stroke(
                center,
                node.radius,
                Stroke::new(1.0, Color32::from_rgba_unmultiplied(15, 15, 15, 190)),
            );

            if node.selected {
                painter.circle_stroke(center, node.radius + 4.0, Stroke::new(2.0, EMPHASIS_COLOR));
            } else if node.highlighted {
                painter.circle_stroke(center, node.radius + 3.0, Stroke::new(1.6, HIGHLIGHT_COLOR));
            }

            painter.text(
                label_pos,
                Align2::CENTER_CENTER,
                &node.label,
                label_font.clone(),
                Color32::from_gray(230),
            );
        }

        if let Some(hovered) = scene.nodes.iter().find(|node| node.hovered)
            && let Some(node) = session.model().node(hovered.index)
        {
            let degree = session.model().degree()[hovered.index];
            painter.text(
                rect.left_top() + vec2(10.0, 10.0),
                Align2::LEFT_TOP,
                format!("{}  |  {}  |  {degree} link(s)", node.display_name(), node.kind.label()),
                FontId::proportional(13.0),
                Color32::from_gray(240),
            );
        }
    }
}
