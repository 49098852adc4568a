use eframe::egui::{self, Key, RichText, Sense, Ui, vec2};

use crate::config::SimulationConfig;
use crate::engine::scene::node_style;
use crate::graph::NodeKind;

use super::super::ViewModel;
use super::super::search::search_nodes;

const SEARCH_ROWS: usize = 20;

impl ViewModel {
    pub(in crate::app) fn draw_controls(&mut self, ui: &mut Ui) {
        ui.heading("Explorer");
        ui.add_space(6.0);

        self.draw_legend(ui);
        ui.separator();
        self.draw_search(ui);
        ui.separator();
        self.draw_layout_controls(ui);
    }

    fn draw_legend(&self, ui: &mut Ui) {
        ui.label(RichText::new("Legend").strong());
        for kind in NodeKind::ALL {
            let count = self
                .snapshot
                .nodes
                .iter()
                .filter(|node| node.kind == kind)
                .count();
            if count == 0 && kind == NodeKind::Unknown {
                continue;
            }

            ui.horizontal(|ui| {
                let style = node_style(kind);
                let (rect, _) = ui.allocate_exact_size(vec2(18.0, 18.0), Sense::hover());
                ui.painter()
                    .circle_filled(rect.center(), style.radius.min(8.0), style.color);
                ui.label(format!("{}  ({count})", kind.label()));
            });
        }
    }

    fn draw_search(&mut self, ui: &mut Ui) {
        ui.label(RichText::new("Search").strong());
        let response = ui.add(
            egui::TextEdit::singleline(&mut self.search)
                .hint_text("name or id")
                .desired_width(f32::INFINITY),
        );

        if response.changed() {
            self.search_hits = match &self.session {
                Some(session) => search_nodes(session.model().nodes(), &self.search),
                None => Vec::new(),
            };
            self.refresh_highlight();
        }

        let submitted = response.lost_focus() && ui.input(|input| input.key_pressed(Key::Enter));
        let mut focus_index = submitted.then(|| self.search_hits.first().copied()).flatten();

        if let Some(session) = &self.session {
            if !self.search.trim().is_empty() {
                ui.small(format!("{} match(es)", self.search_hits.len()));
            }
            egui::ScrollArea::vertical()
                .id_salt("search_hits_scroll")
                .max_height(220.0)
                .show(ui, |ui| {
                    for &index in self.search_hits.iter().take(SEARCH_ROWS) {
                        let Some(node) = session.model().node(index) else {
                            continue;
                        };
                        let label = format!("{}  [{}]", node.display_name(), node.kind.label());
                        if ui.link(label).on_hover_text(node.id.as_str()).clicked() {
                            focus_index = Some(index);
                        }
                    }
                });
        }

        if let Some(index) = focus_index {
            self.focus_index(index);
        }
    }

    fn focus_index(&mut self, index: usize) {
        let canvas_size = self.canvas_size;
        let Some(session) = self.session.as_mut() else {
            return;
        };
        let Some(id) = session.model().node(index).map(|node| node.id.clone()) else {
            return;
        };
        session.focus(&id, canvas_size);
    }

    fn draw_layout_controls(&mut self, ui: &mut Ui) {
        ui.label(RichText::new("Layout").strong());

        ui.checkbox(&mut self.live_physics, "Live physics simulation")
            .on_hover_text("Advance the force simulation every frame.");

        let mut changed = false;
        ui.collapsing("Force tuning", |ui| {
            changed |= slider(
                ui,
                &mut self.simulation.link_distance,
                10.0..=300.0,
                "Link distance",
                "Rest length of every edge, in world units.",
            );
            changed |= slider(
                ui,
                &mut self.simulation.charge_strength,
                -1500.0..=-10.0,
                "Charge",
                "Many-body strength; more negative pushes nodes further apart.",
            );
            changed |= slider(
                ui,
                &mut self.simulation.center_strength,
                0.0..=1.0,
                "Centering",
                "How firmly the layout is pulled back to the canvas center.",
            );
            changed |= slider(
                ui,
                &mut self.simulation.collision_radius,
                0.0..=40.0,
                "Collision radius",
                "Nodes closer than twice this radius are pushed apart.",
            );
            changed |= slider(
                ui,
                &mut self.simulation.velocity_decay,
                0.05..=0.9,
                "Velocity decay",
                "Fraction of velocity lost every tick.",
            );

            if ui.button("Restore defaults").clicked() {
                self.simulation = SimulationConfig::default();
                changed = true;
            }
        });

        if changed && let Some(session) = self.session.as_mut() {
            session.set_simulation_config(self.simulation);
        }

        let reheat = ui.add_enabled(self.session.is_some(), egui::Button::new("Reheat layout"));
        if reheat.clicked()
            && let Some(session) = self.session.as_mut()
        {
            session.reheat();
        }

        let report = &self.report;
        if !report.dropped_edges.is_empty() {
            ui.colored_label(
                egui::Color32::from_rgb(241, 146, 94),
                format!("{} edge(s) dropped: unknown endpoints", report.dropped_edges.len()),
            );
        }
        if !report.duplicate_nodes.is_empty() {
            ui.colored_label(
                egui::Color32::from_rgb(241, 146, 94),
                format!("{} duplicate node id(s) ignored", report.duplicate_nodes.len()),
            )
            .on_hover_text(report.duplicate_nodes.join(", "));
        }
    }
}

fn slider(
    ui: &mut Ui,
    value: &mut f32,
    range: std::ops::RangeInclusive<f32>,
    text: &str,
    hover: &str,
) -> bool {
    ui.add(
        egui::Slider::new(value, range)
            .text(text)
            .clamping(egui::SliderClamping::Always),
    )
    .on_hover_text(hover)
    .changed()
}
