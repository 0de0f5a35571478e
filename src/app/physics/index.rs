use eframe::egui::Vec2;

use super::SimNode;
use super::quadtree::{QuadNode, QuadtreeCell, collect_quadtree_cells};

/// Hit-testing index over the latest simulated positions. Rebuilt wholesale
/// after every tick and rebind, never patched.
#[derive(Default)]
pub(in crate::app) struct SpatialIndex {
    positions: Vec<Vec2>,
    root: Option<QuadNode>,
}

impl SpatialIndex {
    pub(super) fn rebuild(&mut self, nodes: &[SimNode]) {
        self.positions.clear();
        self.positions.extend(nodes.iter().map(|node| node.position));
        self.root = QuadNode::build(&self.positions);
    }

    pub(in crate::app) fn find_nearest(&self, point: Vec2, max_radius: f32) -> Option<usize> {
        self.root
            .as_ref()
            .and_then(|root| root.find_nearest(&self.positions, point, max_radius))
    }

    /// Number of indexed (finite) points.
    pub(in crate::app) fn len(&self) -> usize {
        self.root.as_ref().map_or(0, |root| root.mass as usize)
    }

    pub(in crate::app) fn cells(&self, cells: &mut Vec<QuadtreeCell>) {
        cells.clear();
        if let Some(root) = self.root.as_ref() {
            collect_quadtree_cells(root, 0, cells);
        }
    }
}
