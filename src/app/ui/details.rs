use eframe::egui::{self, RichText, Ui};

use crate::util::preview;

use super::super::ViewModel;

const CONTENT_PREVIEW_CHARS: usize = 300;

struct ConnectionRow {
    other_id: String,
    label: String,
    context: Option<String>,
}

impl ViewModel {
    pub(in crate::app) fn draw_details(&mut self, ui: &mut Ui) {
        ui.heading("Node Details");
        ui.add_space(6.0);

        let Some(session) = &self.session else {
            ui.label("Open the graph to inspect nodes.");
            return;
        };
        let Some(selected_id) = session.selection().selected.clone() else {
            ui.label("Click a node in the graph or a search result.");
            return;
        };
        let model = session.model();
        let Some(index) = model.index_of(&selected_id) else {
            ui.label("Selected node is not part of this dataset.");
            return;
        };
        let Some(node) = model.node(index) else {
            return;
        };

        ui.label(RichText::new(node.display_name()).strong());
        ui.small(node.id.as_str());
        ui.add_space(6.0);

        egui::Grid::new("node_fields")
            .num_columns(2)
            .striped(true)
            .show(ui, |ui| {
                ui.label("Type");
                ui.label(node.kind.label());
                ui.end_row();

                for (key, title) in [
                    ("canonical_name", "Canonical name"),
                    ("entity_type", "Entity type"),
                    ("year", "Year"),
                    ("paper_id", "Paper"),
                ] {
                    if let Some(value) = node.meta_text(key) {
                        ui.label(title);
                        ui.label(value);
                        ui.end_row();
                    }
                }
            });

        if let Some(statement) = node.meta_text("statement") {
            ui.add_space(6.0);
            ui.label(RichText::new("Statement").strong());
            ui.label(statement);
        }
        if let Some(content) = node.meta_text("content") {
            ui.add_space(6.0);
            ui.label(RichText::new("Content").strong());
            ui.label(preview(&content, CONTENT_PREVIEW_CHARS));
        }

        let connections = model
            .incident_edges(index)
            .filter_map(|resolved| {
                let outgoing = resolved.source == index;
                let other = if outgoing {
                    resolved.target
                } else {
                    resolved.source
                };
                let other_node = model.node(other)?;
                let edge = model.edge_data(resolved);
                let arrow = if outgoing { "->" } else { "<-" };
                let kind = edge.kind.as_deref().unwrap_or("related");
                Some(ConnectionRow {
                    other_id: other_node.id.clone(),
                    label: format!("{arrow} {}  ({kind})", other_node.display_name()),
                    context: edge.context.clone(),
                })
            })
            .collect::<Vec<_>>();

        ui.separator();
        ui.label(RichText::new(format!("Connections ({})", connections.len())).strong());

        let mut clicked = None;
        if connections.is_empty() {
            ui.label("This node has no edges.");
        } else {
            egui::ScrollArea::vertical()
                .id_salt("connections_scroll")
                .auto_shrink([false, false])
                .show(ui, |ui| {
                    for row in &connections {
                        let link = ui.link(row.label.as_str());
                        if link.clicked() {
                            clicked = Some(row.other_id.clone());
                        }
                        if let Some(context) = &row.context {
                            ui.small(context.as_str());
                        }
                    }
                });
        }

        if let Some(id) = clicked
            && let Some(session) = self.session.as_mut()
        {
            session.click(Some(&id));
        }
    }
}
