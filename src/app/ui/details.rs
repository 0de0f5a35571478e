use eframe::egui::{self, RichText, Ui};
use serde_json::Value;

use super::super::ViewModel;

impl ViewModel {
    pub(in crate::app) fn draw_details(&mut self, ui: &mut Ui) {
        ui.heading("Selection Details");
        ui.add_space(6.0);

        let Some(node) = self.selection.borrow().clone() else {
            ui.label("Click a node in the graph to inspect it.");
            return;
        };

        ui.label(RichText::new(node.display_name()).strong());
        ui.small(node.id.as_str());
        ui.add_space(6.0);

        if !node.group.is_empty() {
            ui.label(format!("Label: {}", node.group));
        }

        let search_focused = self
            .engine
            .search_focus()
            .is_some_and(|focus| focus.id == node.id);
        if search_focused {
            ui.label(RichText::new("Pinned by search").italics());
        }

        ui.horizontal(|ui| {
            let in_neighborhood = self
                .engine
                .neighborhood_root()
                .is_some_and(|root| root.id == node.id);
            let explore = ui
                .add_enabled(!in_neighborhood, egui::Button::new("Explore neighborhood"))
                .on_hover_text("Show only nodes within the deep-dive depth of this node.");
            if explore.clicked()
                && let Some(index) = self.engine.shown_index(&node.id)
            {
                self.engine.enter_neighborhood(index);
            }
        });

        ui.separator();
        ui.label(RichText::new("Properties").strong());
        if node.properties.is_empty() {
            ui.label("No properties.");
            return;
        }

        egui::Grid::new("node_properties")
            .num_columns(2)
            .striped(true)
            .show(ui, |ui| {
                for (key, value) in &node.properties {
                    ui.label(key.as_str());
                    ui.label(property_text(value));
                    ui.end_row();
                }
            });
    }
}

fn property_text(value: &Value) -> String {
    match value {
        Value::String(text) => text.clone(),
        Value::Null => "null".to_owned(),
        other => other.to_string(),
    }
}
