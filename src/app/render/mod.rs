mod frame;
mod palette;
#[cfg(test)]
pub(in crate::app) mod recording;

use eframe::egui::{Color32, Stroke, Vec2, vec2};

use super::interaction::Camera;
use super::physics::{QuadtreeCell, SimLink, SimNode};
use crate::config::{AdvancedToggles, DisplaySettings};
pub(in crate::app) use frame::FrameScheduler;
pub(in crate::app) use palette::node_color;

const DIMMED_OPACITY: f32 = 0.12;
const LINK_OPACITY: f32 = 0.6;
const EMPHASIS: f32 = 2.0;
const NODE_LABEL_SCALE: f32 = 1.2;
const LINK_LABEL_SCALE: f32 = 1.8;
const BUNDLE_OFFSET: f32 = 0.2;
const ARROW_PIXELS: f32 = 8.0;
const LABEL_PIXELS: f32 = 12.0;
const LINK_LABEL_PIXELS: f32 = 10.0;

/// Drawing surface in world coordinates. Implementations map through the
/// camera set by `set_transform`.
pub(in crate::app) trait Canvas {
    /// Drawable size in screen pixels, `None` when the surface is unavailable.
    fn viewport(&self) -> Option<Vec2>;
    fn clear(&mut self, color: Color32);
    fn set_transform(&mut self, camera: Camera);
    fn line(&mut self, from: Vec2, to: Vec2, stroke: Stroke);
    fn quadratic(&mut self, from: Vec2, control: Vec2, to: Vec2, stroke: Stroke);
    fn triangle(&mut self, points: [Vec2; 3], fill: Color32);
    fn circle(&mut self, center: Vec2, radius: f32, fill: Color32, stroke: Stroke);
    fn text(&mut self, anchor: Vec2, text: &str, size: f32, color: Color32);
}

/// Per-node styling resolved once per snapshot.
#[derive(Clone, Debug, PartialEq)]
pub(in crate::app) struct NodeStyle {
    pub(in crate::app) label: String,
    pub(in crate::app) color: Color32,
}

pub(in crate::app) struct FrameInput<'a> {
    pub(in crate::app) nodes: &'a [SimNode],
    pub(in crate::app) links: &'a [SimLink],
    pub(in crate::app) styles: &'a [NodeStyle],
    pub(in crate::app) camera: Camera,
    pub(in crate::app) display: &'a DisplaySettings,
    pub(in crate::app) toggles: &'a AdvancedToggles,
    pub(in crate::app) highlights: &'a super::highlight::Highlights,
    pub(in crate::app) quadtree: Option<&'a [QuadtreeCell]>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(in crate::app) enum RenderOutcome {
    /// No usable surface. The caller should retry on the next frame.
    Skipped,
    /// Background only.
    Cleared,
    Drawn { nodes: usize, links: usize },
}

fn bundle_control(from: Vec2, to: Vec2) -> Vec2 {
    let delta = to - from;
    (from + to) * 0.5 + vec2(-delta.y, delta.x) * BUNDLE_OFFSET
}

fn quadratic_point(from: Vec2, control: Vec2, to: Vec2, t: f32) -> Vec2 {
    let inverse = 1.0 - t;
    from * (inverse * inverse) + control * (2.0 * inverse * t) + to * (t * t)
}

struct LinkGeometry {
    from: Vec2,
    to: Vec2,
    control: Option<Vec2>,
    emphasized: bool,
    opacity: f32,
}

fn link_geometry(frame: &FrameInput<'_>, link: &SimLink) -> Option<LinkGeometry> {
    let from = frame.nodes.get(link.source)?.position;
    let to = frame.nodes.get(link.target)?.position;
    if !from.is_finite() || !to.is_finite() {
        return None;
    }

    let highlights = frame.highlights;
    let emphasized = highlights.is_active()
        && (highlights.contains(link.source) || highlights.contains(link.target));
    let opacity = if !highlights.is_active() {
        LINK_OPACITY
    } else if emphasized {
        1.0
    } else {
        DIMMED_OPACITY
    };

    Some(LinkGeometry {
        from,
        to,
        control: frame
            .toggles
            .edge_bundling
            .then(|| bundle_control(from, to)),
        emphasized,
        opacity,
    })
}

fn draw_quadtree(canvas: &mut impl Canvas, cells: &[QuadtreeCell], scale: f32) {
    for cell in cells {
        let alpha = if cell.is_leaf { 0.45 } else { 0.22 };
        let width = (1.4 - cell.depth as f32 * 0.09).clamp(0.45, 1.4) / scale;
        let stroke = Stroke::new(width, palette::QUADTREE.gamma_multiply(alpha));

        let min = cell.center - vec2(cell.half_extent, cell.half_extent);
        let max = cell.center + vec2(cell.half_extent, cell.half_extent);
        let corners = [min, vec2(max.x, min.y), max, vec2(min.x, max.y)];
        for (index, corner) in corners.iter().enumerate() {
            canvas.line(*corner, corners[(index + 1) % 4], stroke);
        }
    }
}

/// Draws one frame: background, links, link decorations, nodes, node labels.
pub(in crate::app) fn render_frame(canvas: &mut impl Canvas, frame: &FrameInput<'_>) -> RenderOutcome {
    let usable = canvas
        .viewport()
        .is_some_and(|size| size.is_finite() && size.x > 0.0 && size.y > 0.0);
    if !usable {
        tracing::debug!("canvas unavailable, skipping frame");
        return RenderOutcome::Skipped;
    }

    canvas.clear(palette::BACKGROUND);
    if frame.nodes.is_empty() {
        return RenderOutcome::Cleared;
    }

    canvas.set_transform(frame.camera);
    let scale = frame.camera.scale;
    let display = frame.display;
    let highlights = frame.highlights;

    if let Some(cells) = frame.quadtree {
        draw_quadtree(canvas, cells, scale);
    }

    let geometry = frame
        .links
        .iter()
        .map(|link| link_geometry(frame, link))
        .collect::<Vec<_>>();

    for link in geometry.iter().flatten() {
        let emphasis = if link.emphasized { EMPHASIS } else { 1.0 };
        let width = display.link_width * emphasis / scale;
        let stroke = Stroke::new(width, palette::LINK.gamma_multiply(link.opacity));
        match link.control {
            Some(control) => canvas.quadratic(link.from, control, link.to, stroke),
            None => canvas.line(link.from, link.to, stroke),
        }
    }

    let node_radius = display.node_radius / scale;
    let arrow_size = ARROW_PIXELS / scale;
    for (link, geometry) in frame.links.iter().zip(&geometry) {
        let Some(geometry) = geometry else {
            continue;
        };

        if display.show_arrows {
            let approach = geometry.to - geometry.control.unwrap_or(geometry.from);
            let length = approach.length();
            if length > node_radius + arrow_size {
                let direction = approach / length;
                let tip = geometry.to - direction * node_radius;
                let back = tip - direction * arrow_size;
                let side = vec2(-direction.y, direction.x) * (arrow_size * 0.5);
                canvas.triangle(
                    [tip, back + side, back - side],
                    palette::LINK.gamma_multiply(geometry.opacity),
                );
            }
        }

        if display.show_link_labels
            && !link.kind.is_empty()
            && (scale > LINK_LABEL_SCALE || geometry.emphasized)
        {
            let middle = match geometry.control {
                Some(control) => quadratic_point(geometry.from, control, geometry.to, 0.5),
                None => (geometry.from + geometry.to) * 0.5,
            };
            canvas.text(
                middle,
                &link.kind,
                LINK_LABEL_PIXELS / scale,
                palette::LINK_LABEL.gamma_multiply(geometry.opacity),
            );
        }
    }

    let mut drawn_nodes = 0usize;
    for (index, node) in frame.nodes.iter().enumerate() {
        if !node.position.is_finite() {
            continue;
        }

        let highlighted = highlights.contains(index);
        let opacity = if highlights.is_active() && !highlighted {
            DIMMED_OPACITY
        } else {
            1.0
        };
        let fill = frame
            .styles
            .get(index)
            .map_or(palette::CATEGORY10[0], |style| style.color)
            .gamma_multiply(opacity);
        let stroke = if highlights.is_search(index) {
            Stroke::new(EMPHASIS * 1.5 / scale, palette::SEARCH_RING)
        } else if highlights.is_active() && highlighted {
            Stroke::new(EMPHASIS / scale, palette::HOVER_RING)
        } else {
            Stroke::new(1.0 / scale, palette::NODE_OUTLINE.gamma_multiply(opacity))
        };

        canvas.circle(node.position, node_radius, fill, stroke);
        drawn_nodes += 1;
    }

    for (index, node) in frame.nodes.iter().enumerate() {
        let highlighted = highlights.contains(index);
        if !node.position.is_finite() || !(scale > NODE_LABEL_SCALE || highlighted) {
            continue;
        }

        let Some(style) = frame.styles.get(index) else {
            continue;
        };
        let opacity = if highlights.is_active() && !highlighted {
            DIMMED_OPACITY
        } else {
            1.0
        };
        canvas.text(
            node.position + vec2(node_radius + 4.0 / scale, 0.0),
            &style.label,
            LABEL_PIXELS / scale,
            palette::LABEL.gamma_multiply(opacity),
        );
    }

    RenderOutcome::Drawn {
        nodes: drawn_nodes,
        links: geometry.iter().flatten().count(),
    }
}
