use std::ops::RangeInclusive;

use eframe::egui::{self, Key, Response, Ui};

use crate::config::Settings;

use super::super::ViewModel;
use super::super::engine::MAX_DEPTH;

const SLIDER_KEY_BASE_RATE: f32 = 10.0;
const SLIDER_KEY_ACCEL_PER_SEC: f32 = 9.0;
const SLIDER_KEY_ACCEL_MAX: f32 = 40.0;

#[derive(Clone, Copy, Default)]
struct SliderKeyHoldState {
    positive_secs: f32,
    negative_secs: f32,
}

fn slider_key_accel_multiplier(hold_secs: f32) -> f32 {
    let ramp = hold_secs * SLIDER_KEY_ACCEL_PER_SEC;
    (1.0 + ramp + ramp * ramp * 0.15).min(SLIDER_KEY_ACCEL_MAX)
}

fn default_slider_key_step(min: f32, max: f32) -> f32 {
    ((max - min) / 200.0).max(0.0005)
}

/// Arrow keys nudge a focused slider, speeding up the longer they are held.
fn apply_slider_arrow_acceleration(
    ui: &Ui,
    response: &Response,
    value: &mut f32,
    min: f32,
    max: f32,
) {
    let state_id = response.id.with("arrow_key_hold_state");
    let mut hold_state = ui.ctx().data(|data| {
        data.get_temp::<SliderKeyHoldState>(state_id)
            .unwrap_or_default()
    });

    if !response.has_focus() {
        ui.ctx()
            .data_mut(|data| data.insert_temp(state_id, SliderKeyHoldState::default()));
        return;
    }

    let (delta_time, increase_down, decrease_down) = ui.input(|input| {
        (
            input.stable_dt.min(0.1),
            input.key_down(Key::ArrowRight) || input.key_down(Key::ArrowUp),
            input.key_down(Key::ArrowLeft) || input.key_down(Key::ArrowDown),
        )
    });

    hold_state.positive_secs = if increase_down {
        hold_state.positive_secs + delta_time
    } else {
        0.0
    };
    hold_state.negative_secs = if decrease_down {
        hold_state.negative_secs + delta_time
    } else {
        0.0
    };
    ui.ctx()
        .data_mut(|data| data.insert_temp(state_id, hold_state));

    let direction = (increase_down as i8) - (decrease_down as i8);
    if direction == 0 {
        return;
    }

    let hold_secs = if direction > 0 {
        hold_state.positive_secs
    } else {
        hold_state.negative_secs
    };
    let speed = SLIDER_KEY_BASE_RATE * slider_key_accel_multiplier(hold_secs);
    let delta = direction as f32 * default_slider_key_step(min, max) * speed * delta_time;

    *value = (*value + delta).clamp(min, max);
    ui.ctx().request_repaint();
}

fn tuning_slider(
    ui: &mut Ui,
    value: &mut f32,
    range: RangeInclusive<f32>,
    text: &str,
    hover: &str,
) {
    let (min, max) = (*range.start(), *range.end());
    let slider = ui
        .add(
            egui::Slider::new(value, range)
                .text(text)
                .clamping(egui::SliderClamping::Always),
        )
        .on_hover_text(hover);
    if slider.hovered() {
        slider.request_focus();
    }
    apply_slider_arrow_acceleration(ui, &slider, value, min, max);
}

impl ViewModel {
    pub(in crate::app) fn draw_controls(&mut self, ui: &mut Ui, settings: &mut Settings) {
        ui.heading("Graph Controls");
        ui.separator();
        ui.add_space(4.0);

        self.draw_search(ui);
        ui.separator();
        self.draw_neighborhood(ui);
        ui.separator();

        ui.collapsing("Forces", |ui| {
            let forces = &mut settings.forces;
            tuning_slider(
                ui,
                &mut forces.center_strength,
                0.0..=1.0,
                "Center",
                "Pull toward the middle of the canvas.",
            );
            tuning_slider(
                ui,
                &mut forces.repulsion_strength,
                -600.0..=0.0,
                "Repulsion",
                "Many-body charge. More negative pushes nodes further apart.",
            );
            tuning_slider(
                ui,
                &mut forces.link_strength,
                0.0..=1.0,
                "Link strength",
                "How strongly links pull toward their rest length.",
            );
            tuning_slider(
                ui,
                &mut forces.link_distance,
                10.0..=300.0,
                "Link distance",
                "Rest length of every link in world units.",
            );
            tuning_slider(
                ui,
                &mut forces.collision_radius,
                0.0..=60.0,
                "Collision radius",
                "Minimum spacing between node centers.",
            );
            tuning_slider(
                ui,
                &mut forces.radial_radius,
                50.0..=800.0,
                "Gravity well radius",
                "Ring radius used when the gravity well is enabled.",
            );
        })
        .header_response
        .on_hover_text("Changing any force reheats the layout.");

        ui.collapsing("Display", |ui| {
            let display = &mut settings.display;
            ui.checkbox(&mut display.show_arrows, "Arrowheads");
            ui.checkbox(&mut display.show_link_labels, "Link labels")
                .on_hover_text("Relationship types appear once zoomed in.");
            tuning_slider(
                ui,
                &mut display.node_radius,
                2.0..=24.0,
                "Node radius",
                "Radius in screen pixels, independent of zoom.",
            );
            tuning_slider(
                ui,
                &mut display.link_width,
                0.5..=6.0,
                "Link width",
                "Stroke width in screen pixels, independent of zoom.",
            );
        });

        ui.collapsing("Advanced", |ui| {
            let advanced = &mut settings.advanced;
            ui.checkbox(&mut advanced.jitter, "Jitter")
                .on_hover_text("Random nudges that keep the layout from freezing.");
            ui.checkbox(&mut advanced.gravity_well, "Gravity well")
                .on_hover_text("Pull nodes onto a ring around the center.");
            ui.checkbox(&mut advanced.orbiting, "Orbiting")
                .on_hover_text("Rotate nodes along a spiral instead of simulating forces.");
            ui.checkbox(&mut advanced.repulsion_zones, "Repulsion zones")
                .on_hover_text("Add a wider, softer collision ring around each node.");
            ui.checkbox(&mut advanced.elastic_links, "Elastic links")
                .on_hover_text("Vary rest lengths per link.");
            ui.checkbox(&mut advanced.group_clustering, "Group clustering")
                .on_hover_text("Pull nodes toward an anchor for their label.");
            ui.checkbox(&mut advanced.edge_bundling, "Edge bundling")
                .on_hover_text("Draw links as curves.");
        });

        ui.separator();

        ui.checkbox(&mut self.show_fps_bar, "FPS Display")
            .on_hover_text("Show a live FPS readout in the header.");
        ui.checkbox(&mut self.show_quadtree_overlay, "Show quadtree overlay")
            .on_hover_text("Draw the active quadtree partitions over the graph canvas.");
        if self.show_quadtree_overlay {
            ui.small(format!(
                "{} quadtree cells",
                self.engine.quadtree_cell_count()
            ));
        }
    }

    fn draw_search(&mut self, ui: &mut Ui) {
        ui.label("Search")
            .on_hover_text("Enter focuses the first node whose name contains the text.");
        let search_response = ui.text_edit_singleline(&mut self.search);
        let now = ui.input(|input| input.time);

        if search_response.lost_focus() && ui.input(|input| input.key_pressed(Key::Enter)) {
            let hit = self.engine.search(self.search.trim(), now);
            self.search_miss = hit.is_none() && !self.search.trim().is_empty();
        }
        if ui.input(|input| input.key_pressed(Key::Escape)) {
            self.handle_escape();
        }
        if search_response.changed() {
            self.search_miss = false;
            self.engine.search_text_changed(&self.search);
        }

        if self.search_miss {
            ui.small(format!("No node matches \"{}\".", self.search.trim()));
        }

        if self.suggestions_query != self.search {
            self.suggestions = self.engine.suggestions(&self.search);
            self.suggestions_query.clone_from(&self.search);
        }

        let mut picked = None;
        for suggestion in &self.suggestions {
            if ui.small_button(suggestion.name.as_str()).clicked() {
                picked = Some((suggestion.index, suggestion.name.clone()));
            }
        }
        if let Some((index, name)) = picked {
            self.engine.focus(index, now);
            self.search = name;
            self.search_miss = false;
        }

        let focused = self
            .engine
            .search_focus()
            .map(|focus| format!("Focused: {}", focus.display_name()));
        if let Some(label) = focused {
            ui.horizontal(|ui| {
                ui.label(label);
                if ui.small_button("Clear").clicked() {
                    self.engine.clear_search();
                }
            });
        }
    }

    /// Escape clears an active search first, then leaves a neighborhood view.
    fn handle_escape(&mut self) {
        if self.engine.search_focus().is_some() || !self.search.is_empty() {
            self.engine.clear_search();
            self.search.clear();
            self.search_miss = false;
        } else {
            self.engine.leave_neighborhood();
        }
    }

    fn draw_neighborhood(&mut self, ui: &mut Ui) {
        let mut depth = self.engine.depth();
        ui.add(egui::Slider::new(&mut depth, 1..=MAX_DEPTH).text("Deep-dive depth"))
            .on_hover_text("Hops kept around the root when exploring a neighborhood.");
        self.engine.set_depth(depth);

        let root = self
            .engine
            .neighborhood_root()
            .map(|root| format!("Exploring around {}", root.display_name()));
        match root {
            Some(label) => {
                ui.label(label);
                if ui.button("Show full graph").clicked() {
                    self.engine.leave_neighborhood();
                }
            }
            None => {
                ui.small("Double-click a node to explore its neighborhood.");
            }
        }
    }
}
