use eframe::egui::{self, Align, Context, Layout, Ui};

use crate::graph::DatasetCatalog;

use super::super::{ViewAction, ViewModel};

/// Combo box over the catalog; returns the newly picked dataset, if any.
pub(in crate::app) fn dataset_picker(
    ui: &mut Ui,
    catalog: Option<&DatasetCatalog>,
    current: &str,
) -> Option<String> {
    let catalog = catalog?;
    let mut chosen = None;

    egui::ComboBox::from_id_salt("dataset_picker")
        .selected_text(current)
        .show_ui(ui, |ui| {
            for name in catalog.names() {
                if ui.selectable_label(name == current, name).clicked() && name != current {
                    chosen = Some(name.clone());
                }
            }
        });

    chosen
}

impl ViewModel {
    pub(in crate::app) fn show(
        &mut self,
        ctx: &Context,
        catalog: Option<&DatasetCatalog>,
        is_loading: bool,
        action: &mut ViewAction,
    ) {
        egui::TopBottomPanel::top("top_bar")
            .resizable(false)
            .show(ctx, |ui| {
                ui.horizontal(|ui| {
                    ui.heading("kg-explorer");
                    ui.separator();

                    if catalog.is_some() {
                        ui.label("dataset:");
                        if let Some(name) = dataset_picker(ui, catalog, &self.dataset) {
                            *action = ViewAction::SwitchDataset(name);
                        }
                    } else {
                        ui.label(format!("snapshot: {}", self.dataset));
                    }

                    let reload_button = ui.add_enabled(!is_loading, egui::Button::new("Reload"));
                    if reload_button.clicked() {
                        *action = ViewAction::Reload;
                    }

                    let is_open = self.session.is_some();
                    if ui
                        .add_enabled(is_open, egui::Button::new("Reset view"))
                        .clicked()
                    {
                        self.needs_fit = true;
                    }
                    let toggle_label = if is_open { "Close graph" } else { "Open graph" };
                    if ui.button(toggle_label).clicked() {
                        self.toggle_open();
                    }

                    ui.with_layout(Layout::right_to_left(Align::Center), |ui| {
                        ui.label(self.stats_text());
                    });
                });
            });

        egui::SidePanel::left("controls")
            .resizable(true)
            .default_width(300.0)
            .show(ctx, |ui| self.draw_controls(ui));

        egui::SidePanel::right("details")
            .resizable(true)
            .default_width(360.0)
            .show(ctx, |ui| self.draw_details(ui));

        egui::CentralPanel::default()
            .frame(egui::Frame::NONE)
            .show(ctx, |ui| {
                if is_loading {
                    ui.vertical_centered(|ui| {
                        ui.add_space(120.0);
                        ui.heading("Loading knowledge graph...");
                        ui.add_space(8.0);
                        ui.spinner();
                    });
                } else {
                    self.draw_graph(ui);
                }
            });
    }

    fn stats_text(&self) -> String {
        let Some(session) = &self.session else {
            return format!(
                "nodes: {}  edges: {}  (closed)",
                self.snapshot.node_count(),
                self.snapshot.edge_count()
            );
        };

        let model = session.model();
        let layout = match self.settled_after {
            Some(ticks) => format!("settled after {ticks} ticks"),
            None => format!(
                "{:?}  alpha {:.3}",
                session.simulation().phase(),
                session.simulation().alpha()
            ),
        };
        format!(
            "nodes: {}  edges: {}  |  {layout}  |  zoom {:.0}%",
            model.node_count(),
            model.edge_count(),
            session.viewport().scale * 100.0
        )
    }
}
