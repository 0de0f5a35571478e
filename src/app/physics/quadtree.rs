use eframe::egui::{Vec2, vec2};

const QUADTREE_LEAF_CAPACITY: usize = 12;
const QUADTREE_MAX_DEPTH: usize = 10;

#[derive(Clone, Copy, Debug)]
pub(super) struct QuadBounds {
    pub(super) center: Vec2,
    pub(super) half_extent: f32,
}

impl QuadBounds {
    fn from_points(points: impl Iterator<Item = Vec2>) -> Option<Self> {
        let mut min = vec2(f32::INFINITY, f32::INFINITY);
        let mut max = vec2(f32::NEG_INFINITY, f32::NEG_INFINITY);

        for point in points {
            min.x = min.x.min(point.x);
            min.y = min.y.min(point.y);
            max.x = max.x.max(point.x);
            max.y = max.y.max(point.y);
        }

        if !min.x.is_finite() || !min.y.is_finite() || !max.x.is_finite() || !max.y.is_finite() {
            return None;
        }

        let center = (min + max) * 0.5;
        let span_x = (max.x - min.x).max(1.0);
        let span_y = (max.y - min.y).max(1.0);
        let half_extent = (span_x.max(span_y) * 0.5) + 1.0;

        Some(Self {
            center,
            half_extent,
        })
    }

    pub(super) fn contains(self, point: Vec2) -> bool {
        let min = self.center - vec2(self.half_extent, self.half_extent);
        let max = self.center + vec2(self.half_extent, self.half_extent);
        point.x >= min.x && point.x <= max.x && point.y >= min.y && point.y <= max.y
    }

    fn child(self, quadrant: usize) -> Self {
        let quarter = self.half_extent * 0.5;
        let offset = match quadrant {
            0 => vec2(-quarter, -quarter),
            1 => vec2(quarter, -quarter),
            2 => vec2(-quarter, quarter),
            _ => vec2(quarter, quarter),
        };

        Self {
            center: self.center + offset,
            half_extent: quarter,
        }
    }

    fn quadrant_for(self, point: Vec2) -> usize {
        let right = point.x >= self.center.x;
        let lower = point.y >= self.center.y;
        match (right, lower) {
            (false, false) => 0,
            (true, false) => 1,
            (false, true) => 2,
            (true, true) => 3,
        }
    }

    pub(super) fn side_length(self) -> f32 {
        self.half_extent * 2.0
    }

    pub(super) fn distance_sq_to(self, other: Self) -> f32 {
        let dx = (self.center.x - other.center.x).abs() - (self.half_extent + other.half_extent);
        let dy = (self.center.y - other.center.y).abs() - (self.half_extent + other.half_extent);
        let clamped_dx = dx.max(0.0);
        let clamped_dy = dy.max(0.0);
        (clamped_dx * clamped_dx) + (clamped_dy * clamped_dy)
    }

    fn distance_sq_to_point(self, point: Vec2) -> f32 {
        let dx = ((self.center.x - point.x).abs() - self.half_extent).max(0.0);
        let dy = ((self.center.y - point.y).abs() - self.half_extent).max(0.0);
        (dx * dx) + (dy * dy)
    }
}

/// Point quadtree over indices into a position slice. Internal nodes carry the
/// center of mass of their subtree for Barnes-Hut approximation.
pub(super) struct QuadNode {
    pub(super) bounds: QuadBounds,
    pub(super) center_of_mass: Vec2,
    pub(super) mass: f32,
    pub(super) indices: Vec<usize>,
    pub(super) children: [Option<Box<QuadNode>>; 4],
}

#[derive(Clone, Copy, Debug)]
pub(in crate::app) struct QuadtreeCell {
    pub center: Vec2,
    pub half_extent: f32,
    pub depth: usize,
    pub is_leaf: bool,
}

impl QuadNode {
    /// Builds over every finite position. Returns `None` when there is none.
    pub(super) fn build(positions: &[Vec2]) -> Option<Self> {
        let indices = (0..positions.len())
            .filter(|&index| positions[index].x.is_finite() && positions[index].y.is_finite())
            .collect::<Vec<_>>();
        let bounds = QuadBounds::from_points(indices.iter().map(|&index| positions[index]))?;
        Some(Self::build_node(bounds, indices, positions, 0))
    }

    fn build_node(
        bounds: QuadBounds,
        indices: Vec<usize>,
        positions: &[Vec2],
        depth: usize,
    ) -> Self {
        let mut center_of_mass = Vec2::ZERO;
        for &index in &indices {
            center_of_mass += positions[index];
        }

        let mass = indices.len() as f32;
        if mass > 0.0 {
            center_of_mass /= mass;
        }

        let mut node = Self {
            bounds,
            center_of_mass,
            mass,
            indices,
            children: std::array::from_fn(|_| None),
        };

        if depth >= QUADTREE_MAX_DEPTH || node.indices.len() <= QUADTREE_LEAF_CAPACITY {
            return node;
        }

        let mut buckets = std::array::from_fn::<_, 4, _>(|_| Vec::new());
        for &index in &node.indices {
            let quadrant = bounds.quadrant_for(positions[index]);
            buckets[quadrant].push(index);
        }

        let non_empty = buckets.iter().filter(|bucket| !bucket.is_empty()).count();
        if non_empty <= 1 {
            return node;
        }

        for (quadrant, bucket) in buckets.into_iter().enumerate() {
            if bucket.is_empty() {
                continue;
            }

            let child_bounds = bounds.child(quadrant);
            node.children[quadrant] = Some(Box::new(Self::build_node(
                child_bounds,
                bucket,
                positions,
                depth + 1,
            )));
        }
        node.indices.clear();
        node
    }

    pub(super) fn is_leaf(&self) -> bool {
        self.children.iter().all(|child| child.is_none())
    }

    /// Closest indexed point within `max_radius` of `point`.
    pub(super) fn find_nearest(
        &self,
        positions: &[Vec2],
        point: Vec2,
        max_radius: f32,
    ) -> Option<usize> {
        if !point.x.is_finite() || !point.y.is_finite() || max_radius.is_nan() || max_radius < 0.0
        {
            return None;
        }

        let mut best = None;
        let mut best_distance_sq = max_radius * max_radius;
        self.search_nearest(positions, point, &mut best, &mut best_distance_sq);
        best
    }

    fn search_nearest(
        &self,
        positions: &[Vec2],
        point: Vec2,
        best: &mut Option<usize>,
        best_distance_sq: &mut f32,
    ) {
        if self.bounds.distance_sq_to_point(point) > *best_distance_sq {
            return;
        }

        if self.is_leaf() {
            for &index in &self.indices {
                let distance_sq = (positions[index] - point).length_sq();
                if distance_sq < *best_distance_sq || (best.is_none() && distance_sq <= *best_distance_sq) {
                    *best = Some(index);
                    *best_distance_sq = distance_sq;
                }
            }
            return;
        }

        // Nearest quadrant first so the radius shrinks before the far ones.
        let first = self.bounds.quadrant_for(point);
        for step in 0..4 {
            if let Some(child) = self.children[first ^ step].as_ref() {
                child.search_nearest(positions, point, best, best_distance_sq);
            }
        }
    }
}

pub(super) fn collect_quadtree_cells(node: &QuadNode, depth: usize, cells: &mut Vec<QuadtreeCell>) {
    cells.push(QuadtreeCell {
        center: node.bounds.center,
        half_extent: node.bounds.half_extent,
        depth,
        is_leaf: node.is_leaf(),
    });

    for child in &node.children {
        if let Some(child) = child.as_ref() {
            collect_quadtree_cells(child, depth + 1, cells);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn grid(side: usize, spacing: f32) -> Vec<Vec2> {
        (0..side * side)
            .map(|index| vec2((index % side) as f32 * spacing, (index / side) as f32 * spacing))
            .collect()
    }

    #[test]
    fn skips_non_finite_points() {
        let positions = vec![vec2(0.0, 0.0), vec2(f32::NAN, 3.0), vec2(10.0, 10.0)];
        let tree = QuadNode::build(&positions).expect("two finite points");
        assert_eq!(tree.mass, 2.0);
        assert_eq!(tree.find_nearest(&positions, vec2(0.0, 3.0), 5.0), Some(0));
    }

    #[test]
    fn no_finite_points_builds_nothing() {
        assert!(QuadNode::build(&[]).is_none());
        assert!(QuadNode::build(&[vec2(f32::INFINITY, 0.0)]).is_none());
    }

    #[test]
    fn nearest_matches_linear_scan() {
        let positions = grid(20, 7.0);
        let tree = QuadNode::build(&positions).expect("non-empty");
        assert!(!tree.is_leaf());

        for probe in [vec2(3.1, 3.3), vec2(50.2, 91.0), vec2(132.9, 0.4), vec2(64.0, 64.0)] {
            let expected = positions
                .iter()
                .enumerate()
                .min_by(|a, b| (*a.1 - probe).length_sq().total_cmp(&(*b.1 - probe).length_sq()))
                .map(|(index, _)| index);
            let found = tree.find_nearest(&positions, probe, 10.0);
            assert_eq!(
                found.map(|index| (positions[index] - probe).length_sq()),
                expected.map(|index| (positions[index] - probe).length_sq())
            );
        }
    }

    #[test]
    fn radius_bounds_the_search() {
        let positions = grid(4, 50.0);
        let tree = QuadNode::build(&positions).expect("non-empty");
        assert_eq!(tree.find_nearest(&positions, vec2(25.0, 25.0), 10.0), None);
        assert_eq!(tree.find_nearest(&positions, vec2(50.0, 50.0), 0.0), Some(5));
    }

    #[test]
    fn cells_cover_every_level() {
        let positions = grid(10, 3.0);
        let tree = QuadNode::build(&positions).expect("non-empty");
        let mut cells = Vec::new();
        collect_quadtree_cells(&tree, 0, &mut cells);
        assert_eq!(cells[0].depth, 0);
        assert!(cells.iter().any(|cell| cell.is_leaf && cell.depth > 0));
    }
}
