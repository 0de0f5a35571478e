use std::cell::RefCell;
use std::collections::VecDeque;
use std::path::Path;
use std::rc::Rc;

use eframe::egui::{self, Align, Context, Layout};

use crate::config::Settings;
use crate::graph::Graph;

use super::super::ViewModel;
use super::super::engine::GraphEngine;

impl ViewModel {
    pub(in crate::app) fn new(graph: &Graph) -> Self {
        let selection = Rc::new(RefCell::new(None));
        let mut engine = GraphEngine::default();

        let mirror = Rc::clone(&selection);
        engine.set_selection_callback(move |node| {
            tracing::debug!(node = ?node.map(|node| node.id.as_str()), "selection changed");
            *mirror.borrow_mut() = node.cloned();
        });
        engine.replace_graph(graph);

        Self {
            engine,
            search: String::new(),
            search_miss: false,
            suggestions: Vec::new(),
            suggestions_query: String::new(),
            selection,
            show_quadtree_overlay: false,
            last_pointer: None,
            show_fps_bar: true,
            fps_current: 0.0,
            fps_samples: VecDeque::new(),
        }
    }

    pub(in crate::app) fn show(
        &mut self,
        ctx: &Context,
        settings: &mut Settings,
        graph_path: Option<&Path>,
        reload_requested: &mut bool,
        is_loading: bool,
    ) {
        self.update_fps_counter(ctx);

        egui::TopBottomPanel::top("top_bar")
            .resizable(false)
            .show(ctx, |ui| {
                ui.horizontal(|ui| {
                    ui.heading("graph-lens");
                    ui.separator();
                    match graph_path {
                        Some(path) => ui.label(format!("snapshot: {}", path.display())),
                        None => ui.label("snapshot: none"),
                    };
                    if let Some(root) = self.engine.neighborhood_root() {
                        ui.label(format!("neighborhood of {}", root.display_name()));
                    }
                    let reload_button = ui.add_enabled(
                        graph_path.is_some() && !is_loading,
                        egui::Button::new("Reload snapshot"),
                    );
                    if reload_button.clicked() {
                        *reload_requested = true;
                    }
                    ui.with_layout(Layout::right_to_left(Align::Center), |ui| {
                        ui.label(self.status_text());
                        if let Some(fps_text) = self.fps_display_text() {
                            ui.label(fps_text);
                        }
                    });
                });
            });

        egui::SidePanel::left("controls")
            .resizable(true)
            .default_width(320.0)
            .show(ctx, |ui| {
                egui::ScrollArea::vertical().show(ui, |ui| self.draw_controls(ui, settings));
            });

        egui::SidePanel::right("details")
            .resizable(true)
            .default_width(300.0)
            .show(ctx, |ui| self.draw_details(ui));

        egui::CentralPanel::default()
            .frame(egui::Frame::NONE)
            .show(ctx, |ui| self.draw_graph(ui, settings));
    }
}
