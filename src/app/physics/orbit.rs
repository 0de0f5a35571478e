use std::f32::consts::{PI, TAU};

use eframe::egui::{Vec2, vec2};

use super::SimNode;

const ORBIT_STEP: f32 = 0.01;
const GOLDEN_ANGLE: f32 = PI * 0.763_932;

/// Replaces force integration while orbiting is on: every unpinned node rides
/// a rotating golden-angle spiral around the center.
#[derive(Default)]
pub(super) struct Orbit {
    angle: f32,
}

impl Orbit {
    pub(super) fn advance(&mut self, nodes: &mut [SimNode], center: Vec2, spacing: f32) {
        self.angle = (self.angle + ORBIT_STEP) % TAU;

        for (index, node) in nodes.iter_mut().enumerate() {
            node.velocity = Vec2::ZERO;
            if let Some(pin) = node.pin {
                node.position = pin;
                continue;
            }

            let radius = spacing * (index as f32 + 0.5).sqrt();
            let angle = self.angle + index as f32 * GOLDEN_ANGLE;
            node.position = center + vec2(angle.cos(), angle.sin()) * radius;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::GroupKind;

    #[test]
    fn spiral_rotates_and_respects_pins() {
        let mut nodes = (0..4)
            .map(|_| SimNode::for_tests(Vec2::ZERO, GroupKind::Other))
            .collect::<Vec<_>>();
        nodes[2].pin = Some(vec2(5.0, 5.0));

        let mut orbit = Orbit::default();
        orbit.advance(&mut nodes, Vec2::ZERO, 10.0);
        let first = nodes[1].position;
        orbit.advance(&mut nodes, Vec2::ZERO, 10.0);

        assert_ne!(nodes[1].position, first);
        assert!((nodes[1].position.length() - first.length()).abs() < 1.0e-3);
        assert_eq!(nodes[2].position, vec2(5.0, 5.0));
        assert!(nodes.iter().all(|node| node.velocity == Vec2::ZERO));
    }
}
