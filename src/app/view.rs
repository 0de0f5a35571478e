use std::time::Duration;

use eframe::egui::{Align2, CursorIcon, FontId, PointerButton, Sense, Ui};

use crate::config::Settings;

use super::ViewModel;
use super::egui_canvas::EguiCanvas;
use super::interaction::GestureMode;

impl ViewModel {
    pub(in crate::app) fn draw_graph(&mut self, ui: &mut Ui, settings: &Settings) {
        let (rect, response) = ui.allocate_exact_size(ui.available_size(), Sense::click_and_drag());
        let now = ui.input(|input| input.time);

        let pointer = ui
            .input(|input| input.pointer.latest_pos())
            .filter(|pos| response.dragged() || rect.contains(*pos));
        if pointer != self.last_pointer {
            match pointer {
                Some(pos) => self
                    .engine
                    .pointer_moved(pos - rect.min, &settings.display, now),
                None => self.engine.pointer_left(now),
            }
            self.last_pointer = pointer;
        }

        if response.drag_started_by(PointerButton::Primary) {
            let origin = ui
                .input(|input| input.pointer.press_origin())
                .or(pointer)
                .unwrap_or(rect.min);
            self.engine
                .pointer_pressed(origin - rect.min, &settings.display, now);
            if let Some(pos) = pointer {
                self.engine
                    .pointer_moved(pos - rect.min, &settings.display, now);
            }
        }
        if response.dragged_by(PointerButton::Primary) {
            self.engine.pointer_dragged(response.drag_delta());
        }
        if response.drag_stopped() {
            self.engine.pointer_released();
        }

        if response.hovered() {
            let scroll = ui.input(|input| input.raw_scroll_delta.y);
            if scroll.abs() > f32::EPSILON
                && let Some(pos) = pointer
            {
                let zoom_factor = (1.0 + (scroll * 0.0018)).clamp(0.85, 1.15);
                self.engine.scrolled(pos - rect.min, zoom_factor);
            }
        }

        if response.double_clicked() {
            self.engine.double_clicked();
        } else if response.clicked_by(PointerButton::Primary) {
            self.engine.clicked();
        }

        let cursor = match (self.engine.is_dragging(), self.engine.gesture_mode()) {
            (true, _) => CursorIcon::Grabbing,
            (false, GestureMode::NodeDrag) => CursorIcon::Grab,
            (false, GestureMode::Camera) if response.dragged() => CursorIcon::Move,
            (false, GestureMode::Camera) => CursorIcon::Default,
        };
        response.on_hover_cursor(cursor);

        self.engine.advance(settings, now);

        let painter = ui.painter_at(rect);
        let mut canvas = EguiCanvas::new(&painter, rect);
        self.engine
            .render(&mut canvas, settings, self.show_quadtree_overlay);
        if self.engine.is_empty() {
            painter.text(
                rect.center(),
                Align2::CENTER_CENTER,
                "No graph loaded. Pass --graph <snapshot.json> to explore one.",
                FontId::proportional(14.0),
                ui.visuals().weak_text_color(),
            );
        }

        if self.engine.wants_repaint() {
            ui.ctx().request_repaint();
        } else if let Some(deadline) = self.engine.hover_deadline() {
            let wait = (deadline - now).max(0.0);
            ui.ctx().request_repaint_after(Duration::from_secs_f64(wait));
        }
    }
}

