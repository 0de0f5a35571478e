mod camera;
mod hover;
mod search;

use eframe::egui::Vec2;

use super::physics::Simulation;
pub(in crate::app) use camera::Camera;
use camera::CameraTween;
use hover::HoverDebounce;
pub(in crate::app) use search::{Suggestion, find_first_match, suggestions};

const DRAG_ALPHA: f32 = 0.3;

/// What a pointer press would grab right now. Re-evaluated on every pointer
/// move outside a drag session.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub(in crate::app) enum GestureMode {
    #[default]
    Camera,
    NodeDrag,
}

#[derive(Clone, Copy, Debug, Default, PartialEq)]
enum Session {
    #[default]
    Idle,
    Pan,
    Drag {
        index: usize,
        grab_offset: Vec2,
    },
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(in crate::app) enum SelectionChange {
    Unchanged,
    Selected(usize),
    Cleared,
}

/// Routes pointer input to either the camera or a node pin.
#[derive(Default)]
pub(in crate::app) struct InteractionController {
    camera: Camera,
    tween: Option<CameraTween>,
    mode: GestureMode,
    session: Session,
    pointer_world: Vec2,
    under_pointer: Option<usize>,
    hover: HoverDebounce,
    selected: Option<usize>,
    search_focus: Option<usize>,
}

impl InteractionController {
    pub(in crate::app) fn camera(&self) -> Camera {
        self.camera
    }

    pub(in crate::app) fn set_camera(&mut self, camera: Camera) {
        self.camera = camera;
        self.tween = None;
    }

    pub(in crate::app) fn mode(&self) -> GestureMode {
        self.mode
    }

    pub(in crate::app) fn hovered(&self) -> Option<usize> {
        self.hover.shown()
    }

    pub(in crate::app) fn under_pointer(&self) -> Option<usize> {
        self.under_pointer
    }

    pub(in crate::app) fn selected(&self) -> Option<usize> {
        self.selected
    }

    pub(in crate::app) fn search_focus(&self) -> Option<usize> {
        self.search_focus
    }

    pub(in crate::app) fn dragged_node(&self) -> Option<usize> {
        match self.session {
            Session::Drag { index, .. } => Some(index),
            _ => None,
        }
    }

    pub(in crate::app) fn is_animating(&self) -> bool {
        self.tween.is_some()
    }

    /// Next instant a pending hover change becomes due.
    pub(in crate::app) fn hover_deadline(&self) -> Option<f64> {
        self.hover.deadline()
    }

    /// Forgets everything tied to node indices. Called on snapshot replacement.
    pub(in crate::app) fn reset(&mut self) {
        self.mode = GestureMode::Camera;
        self.session = Session::Idle;
        self.under_pointer = None;
        self.hover.reset();
        self.selected = None;
        self.search_focus = None;
    }

    pub(in crate::app) fn pointer_moved(
        &mut self,
        simulation: &mut Simulation,
        screen: Vec2,
        node_radius: f32,
        now: f64,
    ) {
        let world = self.camera.screen_to_world(screen);
        self.pointer_world = world;

        if let Session::Drag { index, grab_offset } = self.session {
            simulation.pin(index, world + grab_offset);
            self.mode = GestureMode::NodeDrag;
            return;
        }

        let hit = simulation
            .spatial_index()
            .find_nearest(world, node_radius / self.camera.scale);
        self.under_pointer = hit;
        self.mode = if hit.is_some() {
            GestureMode::NodeDrag
        } else {
            GestureMode::Camera
        };
        self.hover.observe(hit, now);
    }

    pub(in crate::app) fn pointer_left(&mut self, now: f64) {
        if self.session == Session::Idle {
            self.under_pointer = None;
            self.mode = GestureMode::Camera;
            self.hover.observe(None, now);
        }
    }

    pub(in crate::app) fn pointer_pressed(&mut self, simulation: &mut Simulation) {
        if self.session != Session::Idle {
            return;
        }

        self.tween = None;
        let grabbed = self
            .under_pointer
            .filter(|_| self.mode == GestureMode::NodeDrag)
            .and_then(|index| Some((index, simulation.nodes().get(index)?.position)));

        let Some((index, position)) = grabbed else {
            self.session = Session::Pan;
            return;
        };

        simulation.pin(index, position);
        simulation.reheat(DRAG_ALPHA);
        simulation.set_alpha_target(DRAG_ALPHA);
        self.session = Session::Drag {
            index,
            grab_offset: position - self.pointer_world,
        };
        tracing::debug!(node = index, "started node drag");
    }

    pub(in crate::app) fn pointer_dragged(&mut self, delta: Vec2) {
        if self.session == Session::Pan {
            self.camera.pan(delta);
        }
    }

    pub(in crate::app) fn pointer_released(&mut self, simulation: &mut Simulation) {
        match std::mem::take(&mut self.session) {
            Session::Drag { index, .. } => {
                if self.search_focus != Some(index) {
                    simulation.unpin(index);
                }
                simulation.set_alpha_target(0.0);
            }
            Session::Pan | Session::Idle => {}
        }
    }

    /// Wheel zoom around `anchor`. Ignored while a node is under the pointer
    /// or a session is active.
    pub(in crate::app) fn scrolled(&mut self, anchor: Vec2, factor: f32) -> bool {
        if self.mode != GestureMode::Camera || self.session != Session::Idle {
            return false;
        }

        self.tween = None;
        self.camera.zoom_at(anchor, factor);
        true
    }

    pub(in crate::app) fn clicked(&mut self) -> SelectionChange {
        let next = match self.under_pointer {
            Some(index) if self.selected != Some(index) => Some(index),
            _ => None,
        };

        if next == self.selected {
            return SelectionChange::Unchanged;
        }

        self.selected = next;
        next.map_or(SelectionChange::Cleared, SelectionChange::Selected)
    }

    /// Pins `index`, marks it search-focused and, when the viewport is known,
    /// starts a camera tween that centers it at the current scale.
    pub(in crate::app) fn focus_search(
        &mut self,
        simulation: &mut Simulation,
        index: usize,
        viewport: Option<Vec2>,
        now: f64,
    ) {
        self.release_search_pin(simulation);

        let Some(position) = simulation.nodes().get(index).map(|node| node.position) else {
            return;
        };

        simulation.pin(index, position);
        self.search_focus = Some(index);
        self.tween = viewport.map(|viewport| {
            CameraTween::new(self.camera, self.camera.centered_on(position, viewport), now)
        });
    }

    pub(in crate::app) fn clear_search(&mut self, simulation: &mut Simulation) {
        self.release_search_pin(simulation);
    }

    fn release_search_pin(&mut self, simulation: &mut Simulation) {
        if let Some(previous) = self.search_focus.take()
            && self.dragged_node() != Some(previous)
        {
            simulation.unpin(previous);
        }
    }

    /// Advances time-driven state. Returns true when anything visible changed.
    pub(in crate::app) fn advance(&mut self, now: f64) -> bool {
        let hover_changed = self.hover.poll(now);

        let Some(tween) = self.tween else {
            return hover_changed;
        };

        let (camera, finished) = tween.sample(now);
        self.camera = camera;
        if finished {
            self.tween = None;
        }
        true
    }
}
