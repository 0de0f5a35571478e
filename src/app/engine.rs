use eframe::egui::Vec2;

use super::highlight::Highlights;
use super::interaction::{
    Camera, GestureMode, InteractionController, SelectionChange, Suggestion, find_first_match,
    suggestions,
};
use super::physics::{QuadtreeCell, Simulation};
use super::render::{Canvas, FrameInput, FrameScheduler, NodeStyle, RenderOutcome, node_color};
use crate::config::{DisplaySettings, Settings};
use crate::graph::{Graph, GroupKind, Node, neighborhood, normalize};

pub(in crate::app) const DEFAULT_DEPTH: usize = 2;
pub(in crate::app) const MAX_DEPTH: usize = 4;

type SelectionCallback = Box<dyn FnMut(Option<&Node>)>;

/// Status numbers for the bottom bar.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub(in crate::app) struct EngineStats {
    pub(in crate::app) nodes: usize,
    pub(in crate::app) links: usize,
    pub(in crate::app) alpha: f32,
    pub(in crate::app) speed: f32,
    pub(in crate::app) running: bool,
}

/// Owns the simulation, camera and highlight state for the current snapshot.
/// The host feeds it snapshots, settings, pointer events and a clock.
pub(in crate::app) struct GraphEngine {
    full: Graph,
    shown: Graph,
    styles: Vec<NodeStyle>,
    simulation: Simulation,
    interaction: InteractionController,
    highlights: Highlights,
    frames: FrameScheduler,
    on_selection: Option<SelectionCallback>,
    neighborhood_root: Option<String>,
    depth: usize,
    viewport: Option<Vec2>,
    camera_placed: bool,
    quadtree_cells: Vec<QuadtreeCell>,
}

impl Default for GraphEngine {
    fn default() -> Self {
        Self {
            full: Graph::default(),
            shown: Graph::default(),
            styles: Vec::new(),
            simulation: Simulation::default(),
            interaction: InteractionController::default(),
            highlights: Highlights::default(),
            frames: FrameScheduler::default(),
            on_selection: None,
            neighborhood_root: None,
            depth: DEFAULT_DEPTH,
            viewport: None,
            camera_placed: false,
            quadtree_cells: Vec::new(),
        }
    }
}

impl GraphEngine {
    pub(in crate::app) fn set_selection_callback(
        &mut self,
        callback: impl FnMut(Option<&Node>) + 'static,
    ) {
        self.on_selection = Some(Box::new(callback));
    }

    /// Normalizes and shows a full replacement snapshot.
    pub(in crate::app) fn replace_graph(&mut self, raw: &Graph) {
        self.full = normalize(raw);
        self.neighborhood_root = None;
        tracing::info!(
            nodes = self.full.nodes.len(),
            links = self.full.links.len(),
            "replaced graph snapshot"
        );
        self.show(self.full.clone());
    }

    fn show(&mut self, graph: Graph) {
        let had_selection = self.interaction.selected().is_some();

        self.styles = graph
            .nodes
            .iter()
            .map(|node| NodeStyle {
                label: node.display_name().to_owned(),
                color: node_color(GroupKind::classify(&node.group), &node.group),
            })
            .collect();
        self.simulation.bind(&graph);
        self.shown = graph;
        self.interaction.reset();
        self.highlights.clear();
        self.frames.request();

        if had_selection {
            self.notify_selection();
        }
    }

    /// Roots the view on the neighborhood of a shown node.
    pub(in crate::app) fn enter_neighborhood(&mut self, index: usize) {
        let Some(root) = self.shown.nodes.get(index).map(|node| node.id.clone()) else {
            return;
        };

        let subgraph = neighborhood(&self.full, &root, self.depth);
        tracing::info!(
            root = %root,
            depth = self.depth,
            nodes = subgraph.nodes.len(),
            "entered neighborhood view"
        );
        self.neighborhood_root = Some(root);
        self.show(subgraph);
    }

    pub(in crate::app) fn leave_neighborhood(&mut self) {
        if self.neighborhood_root.take().is_some() {
            self.show(self.full.clone());
        }
    }

    pub(in crate::app) fn neighborhood_root(&self) -> Option<&Node> {
        self.neighborhood_root
            .as_deref()
            .and_then(|root| self.full.node(root))
    }

    pub(in crate::app) fn depth(&self) -> usize {
        self.depth
    }

    pub(in crate::app) fn set_depth(&mut self, depth: usize) {
        let depth = depth.clamp(1, MAX_DEPTH);
        if depth == self.depth {
            return;
        }

        self.depth = depth;
        if let Some(root) = self.neighborhood_root.clone() {
            let subgraph = neighborhood(&self.full, &root, depth);
            self.show(subgraph);
        }
    }

    /// Steps simulation and animations to `now` (seconds).
    pub(in crate::app) fn advance(&mut self, settings: &Settings, now: f64) {
        let ticked = self.simulation.tick(&settings.forces, &settings.advanced);
        let animated = self.interaction.advance(now);

        let previous = self.highlights.clone();
        self.highlights.update(
            &self.simulation,
            self.interaction.search_focus(),
            self.interaction.hovered(),
        );

        if ticked || animated || previous != self.highlights {
            self.frames.request();
        }
    }

    pub(in crate::app) fn render(
        &mut self,
        canvas: &mut impl Canvas,
        settings: &Settings,
        show_quadtree: bool,
    ) -> RenderOutcome {
        self.frames.take();

        self.viewport = canvas.viewport();
        if !self.camera_placed
            && let Some(size) = self.viewport.filter(|size| size.x > 0.0 && size.y > 0.0)
        {
            let focus = self
                .interaction
                .search_focus()
                .and_then(|index| self.simulation.nodes().get(index))
                .map_or(Vec2::ZERO, |node| node.position);
            let camera = self.interaction.camera().centered_on(focus, size);
            self.interaction.set_camera(camera);
            self.camera_placed = true;
        }

        if show_quadtree {
            self.simulation
                .spatial_index()
                .cells(&mut self.quadtree_cells);
        }

        let outcome = super::render::render_frame(
            canvas,
            &FrameInput {
                nodes: self.simulation.nodes(),
                links: self.simulation.links(),
                styles: &self.styles,
                camera: self.interaction.camera(),
                display: &settings.display,
                toggles: &settings.advanced,
                highlights: &self.highlights,
                quadtree: show_quadtree.then_some(self.quadtree_cells.as_slice()),
            },
        );

        if outcome == RenderOutcome::Skipped
            || self.simulation.is_running()
            || self.interaction.is_animating()
        {
            self.frames.request();
        }
        outcome
    }

    /// True when another frame should be drawn without waiting for input.
    pub(in crate::app) fn wants_repaint(&self) -> bool {
        self.frames.is_pending()
    }

    pub(in crate::app) fn hover_deadline(&self) -> Option<f64> {
        self.interaction.hover_deadline()
    }

    pub(in crate::app) fn pointer_moved(&mut self, screen: Vec2, display: &DisplaySettings, now: f64) {
        self.interaction
            .pointer_moved(&mut self.simulation, screen, display.node_radius, now);
        if self.interaction.dragged_node().is_some() {
            self.frames.request();
        }
    }

    pub(in crate::app) fn pointer_left(&mut self, now: f64) {
        self.interaction.pointer_left(now);
    }

    /// Starts a pointer session. The gesture is decided by what lies under
    /// `origin`, where the button went down, not where the pointer is now.
    pub(in crate::app) fn pointer_pressed(
        &mut self,
        origin: Vec2,
        display: &DisplaySettings,
        now: f64,
    ) {
        self.interaction
            .pointer_moved(&mut self.simulation, origin, display.node_radius, now);
        self.interaction.pointer_pressed(&mut self.simulation);
        self.frames.request();
    }

    pub(in crate::app) fn pointer_dragged(&mut self, delta: Vec2) {
        self.interaction.pointer_dragged(delta);
        self.frames.request();
    }

    pub(in crate::app) fn pointer_released(&mut self) {
        self.interaction.pointer_released(&mut self.simulation);
        self.frames.request();
    }

    pub(in crate::app) fn scrolled(&mut self, anchor: Vec2, factor: f32) {
        if self.interaction.scrolled(anchor, factor) {
            self.frames.request();
        }
    }

    pub(in crate::app) fn clicked(&mut self) {
        if self.interaction.clicked() != SelectionChange::Unchanged {
            self.notify_selection();
            self.frames.request();
        }
    }

    /// Double-click roots the view on the node under the pointer.
    pub(in crate::app) fn double_clicked(&mut self) {
        if let Some(index) = self.interaction.under_pointer() {
            self.enter_neighborhood(index);
        }
    }

    fn notify_selection(&mut self) {
        let selected = self
            .interaction
            .selected()
            .and_then(|index| self.shown.nodes.get(index));
        if let Some(callback) = self.on_selection.as_mut() {
            callback(selected);
        }
    }

    /// Focuses the first node whose name contains `query`.
    pub(in crate::app) fn search(&mut self, query: &str, now: f64) -> Option<usize> {
        let index = find_first_match(&self.shown.nodes, query)?;
        self.focus(index, now);
        Some(index)
    }

    /// Before the first render the camera is placed on the focus instead of
    /// tweening toward it.
    pub(in crate::app) fn focus(&mut self, index: usize, now: f64) {
        let viewport = self.viewport.filter(|_| self.camera_placed);
        self.interaction
            .focus_search(&mut self.simulation, index, viewport, now);
        self.frames.request();
    }

    pub(in crate::app) fn clear_search(&mut self) {
        self.interaction.clear_search(&mut self.simulation);
        self.frames.request();
    }

    /// Emptying the query ends the current search focus.
    pub(in crate::app) fn search_text_changed(&mut self, query: &str) {
        if query.trim().is_empty() && self.interaction.search_focus().is_some() {
            self.clear_search();
        }
    }

    pub(in crate::app) fn is_empty(&self) -> bool {
        self.shown.is_empty()
    }

    pub(in crate::app) fn suggestions(&self, query: &str) -> Vec<Suggestion> {
        suggestions(&self.shown.nodes, query)
    }

    pub(in crate::app) fn search_focus(&self) -> Option<&Node> {
        self.interaction
            .search_focus()
            .and_then(|index| self.shown.nodes.get(index))
    }

    pub(in crate::app) fn shown_index(&self, id: &str) -> Option<usize> {
        self.simulation.index_of(id)
    }

    pub(in crate::app) fn gesture_mode(&self) -> GestureMode {
        self.interaction.mode()
    }

    pub(in crate::app) fn is_dragging(&self) -> bool {
        self.interaction.dragged_node().is_some()
    }

    pub(in crate::app) fn camera(&self) -> Camera {
        self.interaction.camera()
    }

    pub(in crate::app) fn stats(&self) -> EngineStats {
        EngineStats {
            nodes: self.simulation.nodes().len(),
            links: self.simulation.links().len(),
            alpha: self.simulation.alpha(),
            speed: self.simulation.total_speed(),
            running: self.simulation.is_running(),
        }
    }

    pub(in crate::app) fn quadtree_cell_count(&self) -> usize {
        self.quadtree_cells.len()
    }
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;
    use std::rc::Rc;

    use eframe::egui::vec2;

    use super::*;
    use crate::app::render::recording::RecordingCanvas;
    use crate::graph::Link;

    const VIEWPORT: Vec2 = vec2(800.0, 600.0);

    fn abc() -> Graph {
        Graph {
            nodes: vec![
                Node::new("a", "A", "Person"),
                Node::new("b", "B", "Person"),
                Node::new("c", "C", "Concept"),
            ],
            links: vec![Link::new("a", "b", "KNOWS"), Link::new("b", "c", "LIKES")],
        }
    }

    fn settle(engine: &mut GraphEngine, settings: &Settings) -> f64 {
        let mut now = 0.0;
        for _ in 0..2_000 {
            now += 1.0 / 60.0;
            engine.advance(settings, now);
            if !engine.stats().running {
                break;
            }
        }
        assert!(!engine.stats().running, "layout never settled");
        now
    }

    fn screen_of(engine: &GraphEngine, index: usize) -> Vec2 {
        engine
            .camera()
            .world_to_screen(engine.simulation.nodes()[index].position)
    }

    #[test]
    fn chain_end_to_end() {
        let settings = Settings::default();
        let mut engine = GraphEngine::default();
        engine.replace_graph(&abc());

        let mut now = settle(&mut engine, &settings);
        let nodes = engine.simulation.nodes();
        for first in 0..3 {
            for second in first + 1..3 {
                let distance = (nodes[first].position - nodes[second].position).length();
                assert!(distance >= settings.forces.collision_radius);
            }
        }

        let mut canvas = RecordingCanvas::new(VIEWPORT);
        let outcome = engine.render(&mut canvas, &settings, false);
        assert_eq!(outcome, RenderOutcome::Drawn { nodes: 3, links: 2 });
        assert_eq!(canvas.circles().count(), 3);
        assert_eq!(canvas.lines().count(), 2);
        assert_eq!(canvas.triangles().count(), 2);

        assert_eq!(engine.search("b", now), Some(1));
        now += 1.0;
        engine.advance(&settings, now);

        let centered = screen_of(&engine, 1);
        assert!((centered - VIEWPORT * 0.5).length() < 1.0e-2);
        assert_eq!(engine.search_focus().map(|node| node.id.as_str()), Some("b"));
        assert!(engine.simulation.nodes()[1].pin.is_some());

        let mut canvas = RecordingCanvas::new(VIEWPORT);
        engine.render(&mut canvas, &settings, false);
        let fills = canvas.circles().map(|circle| circle.fill).collect::<Vec<_>>();
        assert_eq!(fills[1], engine.styles[1].color);
        assert_ne!(fills[0], engine.styles[0].color);

        engine.clear_search();
        assert!(engine.simulation.nodes()[1].pin.is_none());

        assert_eq!(engine.search("C", now), Some(2));
        now += 1.0;
        engine.advance(&settings, now);
        assert!((screen_of(&engine, 2) - VIEWPORT * 0.5).length() < 1.0e-2);
        assert_eq!(engine.search_focus().map(|node| node.name.as_str()), Some("C"));
        assert!(engine.highlights.is_search(2));
    }

    #[test]
    fn emptying_the_query_ends_the_search() {
        let settings = Settings::default();
        let mut engine = GraphEngine::default();
        engine.replace_graph(&abc());
        let mut now = settle(&mut engine, &settings);
        engine.render(&mut RecordingCanvas::new(VIEWPORT), &settings, false);

        assert_eq!(engine.search("C", now), Some(2));
        engine.search_text_changed("C ");
        assert!(engine.search_focus().is_some());

        engine.search_text_changed("");
        now += 0.1;
        engine.advance(&settings, now);
        assert!(engine.search_focus().is_none());
        assert!(engine.simulation.nodes()[2].pin.is_none());
        assert!(!engine.highlights.is_active());

        let mut canvas = RecordingCanvas::new(VIEWPORT);
        engine.render(&mut canvas, &settings, false);
        let fills = canvas.circles().map(|circle| circle.fill).collect::<Vec<_>>();
        assert_eq!(fills, engine.styles.iter().map(|style| style.color).collect::<Vec<_>>());
    }

    #[test]
    fn search_before_first_render_centers_on_placement() {
        let settings = Settings::default();
        let mut engine = GraphEngine::default();
        engine.replace_graph(&abc());
        let now = settle(&mut engine, &settings);

        assert_eq!(engine.search("C", now), Some(2));
        engine.render(&mut RecordingCanvas::new(VIEWPORT), &settings, false);
        engine.advance(&settings, now + 1.0);
        assert!((screen_of(&engine, 2) - VIEWPORT * 0.5).length() < 1.0e-2);
    }

    #[test]
    fn press_decides_gesture_at_its_origin() {
        let settings = Settings::default();
        let mut engine = GraphEngine::default();
        engine.replace_graph(&abc());
        let now = settle(&mut engine, &settings);
        engine.render(&mut RecordingCanvas::new(VIEWPORT), &settings, false);

        let nodes = engine.simulation.nodes();
        let centroid = nodes
            .iter()
            .fold(Vec2::ZERO, |sum, node| sum + node.position)
            / 3.0;
        let outward = (nodes[0].position - centroid).normalized();
        let start = screen_of(&engine, 0);
        let translate = engine.camera().translate;

        engine.pointer_moved(start + outward * 4.0, &settings.display, now);
        engine.pointer_moved(start + outward * 11.0, &settings.display, now);
        assert_eq!(engine.gesture_mode(), GestureMode::Camera);

        engine.pointer_pressed(start + outward * 4.0, &settings.display, now);
        assert!(engine.is_dragging());

        let target = start + outward * 60.0;
        engine.pointer_moved(target, &settings.display, now);
        engine.pointer_dragged(outward * 49.0);
        let scale = engine.camera().scale;
        let expected = engine.camera().screen_to_world(target) - outward * 4.0 / scale;
        assert!((engine.simulation.nodes()[0].position - expected).length() < 1.0e-3);
        assert_eq!(engine.camera().translate, translate);

        engine.pointer_released();
        assert!(engine.simulation.nodes()[0].pin.is_none());
    }

    #[test]
    fn selection_callback_sees_node_then_none() {
        let settings = Settings::default();
        let seen = Rc::new(RefCell::new(Vec::new()));
        let mut engine = GraphEngine::default();
        let sink = Rc::clone(&seen);
        engine.set_selection_callback(move |node| {
            sink.borrow_mut().push(node.map(|node| node.name.clone()));
        });
        engine.replace_graph(&abc());
        let now = settle(&mut engine, &settings);
        engine.render(&mut RecordingCanvas::new(VIEWPORT), &settings, false);

        engine.pointer_moved(screen_of(&engine, 2), &settings.display, now);
        engine.clicked();
        engine.replace_graph(&abc());

        assert_eq!(*seen.borrow(), [Some("C".to_owned()), None]);
    }

    #[test]
    fn dragging_pins_and_releases() {
        let settings = Settings::default();
        let mut engine = GraphEngine::default();
        engine.replace_graph(&abc());
        let mut now = settle(&mut engine, &settings);
        engine.render(&mut RecordingCanvas::new(VIEWPORT), &settings, false);

        let start = screen_of(&engine, 0);
        engine.pointer_moved(start, &settings.display, now);
        assert_eq!(engine.gesture_mode(), GestureMode::NodeDrag);
        engine.pointer_pressed(start, &settings.display, now);
        engine.pointer_moved(start + vec2(80.0, 0.0), &settings.display, now);
        assert!(engine.is_dragging());

        for _ in 0..20 {
            now += 1.0 / 60.0;
            engine.advance(&settings, now);
        }
        let expected = engine.camera().screen_to_world(start + vec2(80.0, 0.0));
        assert!((engine.simulation.nodes()[0].position - expected).length() < 1.0e-3);
        assert!(engine.stats().running);

        engine.pointer_released();
        assert!(engine.simulation.nodes()[0].pin.is_none());
        settle(&mut engine, &settings);
    }

    #[test]
    fn hover_highlights_neighbors_after_delay() {
        let settings = Settings::default();
        let mut engine = GraphEngine::default();
        engine.replace_graph(&abc());
        let now = settle(&mut engine, &settings);
        engine.render(&mut RecordingCanvas::new(VIEWPORT), &settings, false);

        engine.pointer_moved(screen_of(&engine, 0), &settings.display, now);
        engine.advance(&settings, now + 0.01);
        assert!(!engine.highlights.is_active());

        engine.advance(&settings, now + 0.05);
        assert!(engine.highlights.contains(0));
        assert!(engine.highlights.contains(1));
        assert!(!engine.highlights.contains(2));
        assert!(engine.wants_repaint());
    }

    #[test]
    fn neighborhood_view_round_trips() {
        let settings = Settings::default();
        let mut engine = GraphEngine::default();
        let mut graph = abc();
        graph.nodes.push(Node::new("d", "D", ""));
        graph.links.push(Link::new("c", "d", "NEXT"));
        engine.replace_graph(&graph);
        settle(&mut engine, &settings);
        let kept = engine.simulation.nodes()[0].position;

        engine.set_depth(1);
        engine.enter_neighborhood(0);
        assert_eq!(engine.stats().nodes, 2);
        assert!(engine.shown_index("b").is_some());
        assert!(engine.shown_index("d").is_none());
        assert_eq!(engine.neighborhood_root().map(|node| node.id.as_str()), Some("a"));
        assert_eq!(engine.simulation.nodes()[0].position, kept);

        engine.set_depth(3);
        assert_eq!(engine.stats().nodes, 4);

        engine.leave_neighborhood();
        assert!(engine.neighborhood_root().is_none());
        assert_eq!(engine.stats().nodes, 4);
        assert_eq!(engine.simulation.nodes()[0].position, kept);
    }

    #[test]
    fn empty_graph_renders_a_clear_canvas() {
        let settings = Settings::default();
        let mut engine = GraphEngine::default();
        engine.replace_graph(&Graph::default());
        engine.advance(&settings, 0.0);
        assert!(!engine.stats().running);
        assert!(engine.is_empty());

        let mut canvas = RecordingCanvas::new(VIEWPORT);
        assert_eq!(engine.render(&mut canvas, &settings, false), RenderOutcome::Cleared);
        assert!(!engine.wants_repaint());
    }

    #[test]
    fn skipped_frame_schedules_a_retry() {
        let settings = Settings::default();
        let mut engine = GraphEngine::default();
        engine.replace_graph(&Graph::default());

        let mut canvas = RecordingCanvas::unavailable();
        assert_eq!(engine.render(&mut canvas, &settings, false), RenderOutcome::Skipped);
        assert!(engine.wants_repaint());
    }

    #[test]
    fn malformed_links_never_reach_the_simulation() {
        let mut graph = abc();
        graph.links.push(Link::new("a", "ghost", "KNOWS"));
        graph.nodes.push(Node::new("a2", "a", ""));
        let mut engine = GraphEngine::default();
        engine.replace_graph(&graph);

        assert_eq!(engine.stats().nodes, 3);
        assert_eq!(engine.stats().links, 2);
    }

    #[test]
    fn quadtree_overlay_collects_cells() {
        let settings = Settings::default();
        let mut engine = GraphEngine::default();
        engine.replace_graph(&abc());
        engine.advance(&settings, 0.0);

        let mut canvas = RecordingCanvas::new(VIEWPORT);
        engine.render(&mut canvas, &settings, true);
        assert!(engine.quadtree_cell_count() >= 1);
        assert!(canvas.lines().count() >= 4 + 2);
    }
}
