use eframe::egui::epaint::QuadraticBezierShape;
use eframe::egui::{Align2, Color32, FontId, Painter, Pos2, Rect, Shape, Stroke, Vec2};

use super::interaction::Camera;
use super::render::Canvas;

/// `Canvas` over an egui painter clipped to the graph area.
pub(super) struct EguiCanvas<'a> {
    painter: &'a Painter,
    rect: Rect,
    camera: Camera,
}

impl<'a> EguiCanvas<'a> {
    pub(super) fn new(painter: &'a Painter, rect: Rect) -> Self {
        Self {
            painter,
            rect,
            camera: Camera::default(),
        }
    }

    fn to_screen(&self, world: Vec2) -> Pos2 {
        self.rect.min + self.camera.world_to_screen(world)
    }

    fn screen_stroke(&self, stroke: Stroke) -> Stroke {
        Stroke::new(stroke.width * self.camera.scale, stroke.color)
    }
}

impl Canvas for EguiCanvas<'_> {
    fn viewport(&self) -> Option<Vec2> {
        let size = self.rect.size();
        (self.rect.is_positive() && self.rect.is_finite()).then_some(size)
    }

    fn clear(&mut self, color: Color32) {
        self.painter.rect_filled(self.rect, 0.0, color);
    }

    fn set_transform(&mut self, camera: Camera) {
        self.camera = camera;
    }

    fn line(&mut self, from: Vec2, to: Vec2, stroke: Stroke) {
        self.painter.line_segment(
            [self.to_screen(from), self.to_screen(to)],
            self.screen_stroke(stroke),
        );
    }

    fn quadratic(&mut self, from: Vec2, control: Vec2, to: Vec2, stroke: Stroke) {
        self.painter
            .add(QuadraticBezierShape::from_points_stroke(
                [self.to_screen(from), self.to_screen(control), self.to_screen(to)],
                false,
                Color32::TRANSPARENT,
                self.screen_stroke(stroke),
            ));
    }

    fn triangle(&mut self, points: [Vec2; 3], fill: Color32) {
        self.painter.add(Shape::convex_polygon(
            points.iter().map(|point| self.to_screen(*point)).collect(),
            fill,
            Stroke::NONE,
        ));
    }

    fn circle(&mut self, center: Vec2, radius: f32, fill: Color32, stroke: Stroke) {
        self.painter.circle(
            self.to_screen(center),
            radius * self.camera.scale,
            fill,
            self.screen_stroke(stroke),
        );
    }

    fn text(&mut self, anchor: Vec2, text: &str, size: f32, color: Color32) {
        self.painter.text(
            self.to_screen(anchor),
            Align2::LEFT_CENTER,
            text,
            FontId::proportional(size * self.camera.scale),
            color,
        );
    }
}
