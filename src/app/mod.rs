use std::cell::RefCell;
use std::collections::VecDeque;
use std::path::PathBuf;
use std::rc::Rc;
use std::sync::mpsc::{self, Receiver, TryRecvError};
use std::thread;

use eframe::egui::{self, Context, Pos2};

use crate::config::Settings;
use crate::graph::{Graph, Node, read_snapshot};

mod egui_canvas;
mod engine;
mod highlight;
mod interaction;
mod physics;
mod render;
mod ui;
mod view;

use engine::GraphEngine;
use interaction::Suggestion;

type LoadResult = Result<Graph, String>;

pub struct GraphLensApp {
    graph_path: Option<PathBuf>,
    settings: Settings,
    state: AppState,
    reload_rx: Option<Receiver<LoadResult>>,
}

enum AppState {
    Loading { rx: Receiver<LoadResult> },
    Ready(Box<ViewModel>),
    Error(String),
}

struct ViewModel {
    engine: GraphEngine,
    search: String,
    search_miss: bool,
    suggestions: Vec<Suggestion>,
    suggestions_query: String,
    selection: Rc<RefCell<Option<Node>>>,
    show_quadtree_overlay: bool,
    last_pointer: Option<Pos2>,
    show_fps_bar: bool,
    fps_current: f32,
    fps_samples: VecDeque<f32>,
}

impl GraphLensApp {
    pub fn new(
        _cc: &eframe::CreationContext<'_>,
        graph_path: Option<PathBuf>,
        settings: Settings,
    ) -> Self {
        let state = match graph_path.clone() {
            Some(path) => Self::start_load(path),
            None => AppState::Ready(Box::new(ViewModel::new(&Graph::default()))),
        };
        Self {
            graph_path,
            settings,
            state,
            reload_rx: None,
        }
    }

    fn spawn_load(path: PathBuf) -> Receiver<LoadResult> {
        let (tx, rx) = mpsc::channel();

        thread::spawn(move || {
            let result = read_snapshot(&path).map_err(|error| error.to_string());
            if let Err(error) = &result {
                tracing::warn!(%error, "snapshot load failed");
            }
            let _ = tx.send(result);
        });

        rx
    }

    fn start_load(path: PathBuf) -> AppState {
        tracing::info!(path = %path.display(), "loading graph snapshot");
        AppState::Loading {
            rx: Self::spawn_load(path),
        }
    }
}

impl eframe::App for GraphLensApp {
    fn update(&mut self, ctx: &Context, _frame: &mut eframe::Frame) {
        let mut transition = None;

        match &mut self.state {
            AppState::Loading { rx } => {
                match rx.try_recv() {
                    Ok(result) => {
                        transition = Some(match result {
                            Ok(graph) => AppState::Ready(Box::new(ViewModel::new(&graph))),
                            Err(error) => AppState::Error(error),
                        });
                    }
                    Err(TryRecvError::Empty) => ctx.request_repaint(),
                    Err(TryRecvError::Disconnected) => {
                        transition =
                            Some(AppState::Error("Background load worker disconnected".to_owned()));
                    }
                }

                egui::CentralPanel::default().show(ctx, |ui| {
                    ui.vertical_centered(|ui| {
                        ui.add_space(120.0);
                        ui.heading("Loading graph snapshot...");
                        ui.add_space(8.0);
                        ui.spinner();
                    });
                });
            }
            AppState::Error(error) => {
                egui::CentralPanel::default().show(ctx, |ui| {
                    ui.heading("Failed to load graph snapshot");
                    ui.add_space(6.0);
                    ui.label(error.as_str());
                    ui.add_space(10.0);
                    if let Some(path) = &self.graph_path
                        && ui.button("Retry").clicked()
                    {
                        transition = Some(Self::start_load(path.clone()));
                    }
                });
            }
            AppState::Ready(model) => {
                let mut reload_requested = false;
                let is_reloading = self.reload_rx.is_some();
                model.show(
                    ctx,
                    &mut self.settings,
                    self.graph_path.as_deref(),
                    &mut reload_requested,
                    is_reloading,
                );

                if reload_requested
                    && self.reload_rx.is_none()
                    && let Some(path) = &self.graph_path
                {
                    self.reload_rx = Some(Self::spawn_load(path.clone()));
                }

                if let Some(rx) = self.reload_rx.take() {
                    match rx.try_recv() {
                        // Reloads keep the engine so surviving nodes stay in place.
                        Ok(Ok(graph)) => model.engine.replace_graph(&graph),
                        Ok(Err(error)) => transition = Some(AppState::Error(error)),
                        Err(TryRecvError::Empty) => {
                            self.reload_rx = Some(rx);
                            ctx.request_repaint();
                        }
                        Err(TryRecvError::Disconnected) => {
                            transition =
                                Some(AppState::Error("Background load worker disconnected".to_owned()));
                        }
                    }
                }
            }
        }

        if let Some(next_state) = transition {
            self.reload_rx = None;
            self.state = next_state;
        }
    }
}
