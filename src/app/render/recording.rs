use eframe::egui::{Color32, Stroke, Vec2};

use super::Canvas;
use crate::app::interaction::Camera;

#[derive(Clone, Debug, PartialEq)]
pub(in crate::app) enum DrawOp {
    Clear(Color32),
    Transform(Camera),
    Line {
        from: Vec2,
        to: Vec2,
        stroke: Stroke,
    },
    Quadratic {
        from: Vec2,
        control: Vec2,
        to: Vec2,
        stroke: Stroke,
    },
    Triangle {
        points: [Vec2; 3],
        fill: Color32,
    },
    Circle {
        center: Vec2,
        radius: f32,
        fill: Color32,
        stroke: Stroke,
    },
    Text {
        anchor: Vec2,
        text: String,
        size: f32,
        color: Color32,
    },
}

impl DrawOp {
    pub(in crate::app) fn kind(&self) -> &'static str {
        match self {
            Self::Clear(_) => "clear",
            Self::Transform(_) => "transform",
            Self::Line { .. } => "line",
            Self::Quadratic { .. } => "quadratic",
            Self::Triangle { .. } => "triangle",
            Self::Circle { .. } => "circle",
            Self::Text { .. } => "text",
        }
    }
}

pub(in crate::app) struct RecordedLine {
    pub(in crate::app) width: f32,
    pub(in crate::app) color: Color32,
}

pub(in crate::app) struct RecordedCircle {
    pub(in crate::app) center: Vec2,
    pub(in crate::app) radius: f32,
    pub(in crate::app) fill: Color32,
}

pub(in crate::app) struct RecordedText<'a> {
    pub(in crate::app) anchor: Vec2,
    pub(in crate::app) text: &'a String,
}

/// Canvas double that records every call in order.
pub(in crate::app) struct RecordingCanvas {
    viewport: Option<Vec2>,
    pub(in crate::app) ops: Vec<DrawOp>,
}

impl RecordingCanvas {
    pub(in crate::app) fn new(viewport: Vec2) -> Self {
        Self {
            viewport: Some(viewport),
            ops: Vec::new(),
        }
    }

    pub(in crate::app) fn unavailable() -> Self {
        Self {
            viewport: None,
            ops: Vec::new(),
        }
    }

    pub(in crate::app) fn lines(&self) -> impl Iterator<Item = RecordedLine> + '_ {
        self.ops.iter().filter_map(|op| match op {
            DrawOp::Line { stroke, .. } | DrawOp::Quadratic { stroke, .. } => Some(RecordedLine {
                width: stroke.width,
                color: stroke.color,
            }),
            _ => None,
        })
    }

    pub(in crate::app) fn circles(&self) -> impl Iterator<Item = RecordedCircle> + '_ {
        self.ops.iter().filter_map(|op| match op {
            DrawOp::Circle {
                center,
                radius,
                fill,
                ..
            } => Some(RecordedCircle {
                center: *center,
                radius: *radius,
                fill: *fill,
            }),
            _ => None,
        })
    }

    pub(in crate::app) fn triangles(&self) -> impl Iterator<Item = [Vec2; 3]> + '_ {
        self.ops.iter().filter_map(|op| match op {
            DrawOp::Triangle { points, .. } => Some(*points),
            _ => None,
        })
    }

    pub(in crate::app) fn texts(&self) -> impl Iterator<Item = RecordedText<'_>> + '_ {
        self.ops.iter().filter_map(|op| match op {
            DrawOp::Text { anchor, text, .. } => Some(RecordedText {
                anchor: *anchor,
                text,
            }),
            _ => None,
        })
    }
}

impl Canvas for RecordingCanvas {
    fn viewport(&self) -> Option<Vec2> {
        self.viewport
    }

    fn clear(&mut self, color: Color32) {
        self.ops.push(DrawOp::Clear(color));
    }

    fn set_transform(&mut self, camera: Camera) {
        self.ops.push(DrawOp::Transform(camera));
    }

    fn line(&mut self, from: Vec2, to: Vec2, stroke: Stroke) {
        self.ops.push(DrawOp::Line { from, to, stroke });
    }

    fn quadratic(&mut self, from: Vec2, control: Vec2, to: Vec2, stroke: Stroke) {
        self.ops.push(DrawOp::Quadratic {
            from,
            control,
            to,
            stroke,
        });
    }

    fn triangle(&mut self, points: [Vec2; 3], fill: Color32) {
        self.ops.push(DrawOp::Triangle { points, fill });
    }

    fn circle(&mut self, center: Vec2, radius: f32, fill: Color32, stroke: Stroke) {
        self.ops.push(DrawOp::Circle {
            center,
            radius,
            fill,
            stroke,
        });
    }

    fn text(&mut self, anchor: Vec2, text: &str, size: f32, color: Color32) {
        self.ops.push(DrawOp::Text {
            anchor,
            text: text.to_owned(),
            size,
            color,
        });
    }
}
