use std::f32::consts::TAU;

use eframe::egui::{Vec2, vec2};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::config::{AdvancedToggles, ForcesSettings};

use super::quadtree::QuadNode;
use super::{SimLink, SimNode};

const BARNES_HUT_THETA_SQ: f32 = 0.81;
const CHARGE_DISTANCE_MIN_SQ: f32 = 1.0;
const CLUSTER_STRENGTH: f32 = 0.12;
const RADIAL_STRENGTH: f32 = 0.1;
const JITTER_MAGNITUDE: f32 = 2.0;
const LOOSE_ZONE_SCALE: f32 = 2.0;
const LOOSE_ZONE_STRENGTH: f32 = 0.5;

/// Tiny deterministic offset used to separate coincident points. Antisymmetric
/// in its arguments so both members of a pair are pushed apart.
pub(super) fn pair_jiggle(index: usize, other: usize) -> Vec2 {
    let (low, high) = if index <= other {
        (index, other)
    } else {
        (other, index)
    };
    let angle = ((low as f32) * 0.618_034 + (high as f32) * 0.414_214 + 0.11) * TAU;
    let direction = vec2(angle.cos(), angle.sin()) * 1.0e-3;
    if index == low { direction } else { -direction }
}

pub(super) enum Force {
    Link(LinkForce),
    Charge { strength: f32 },
    Center { center: Vec2, strength: f32 },
    Cluster { center: Vec2, strength: f32 },
    Collide { radius: f32, strength: f32 },
    Radial { center: Vec2, radius: f32, strength: f32 },
    Jitter { rng: StdRng, magnitude: f32 },
}

impl Force {
    pub(super) fn apply(&mut self, nodes: &mut [SimNode], alpha: f32) {
        match self {
            Self::Link(force) => force.apply(nodes, alpha),
            Self::Charge { strength } => apply_charge(nodes, *strength, alpha),
            Self::Center { center, strength } => {
                for node in nodes.iter_mut().filter(|node| node.position.is_finite()) {
                    node.velocity += (*center - node.position) * (*strength * alpha);
                }
            }
            Self::Cluster { center, strength } => {
                for node in nodes.iter_mut().filter(|node| node.position.is_finite()) {
                    let anchor = *center + node.group.anchor();
                    node.velocity += (anchor - node.position) * (*strength * alpha);
                }
            }
            Self::Collide { radius, strength } => apply_collide(nodes, *radius, *strength),
            Self::Radial {
                center,
                radius,
                strength,
            } => apply_radial(nodes, *center, *radius, *strength, alpha),
            Self::Jitter { rng, magnitude } => {
                for node in nodes.iter_mut() {
                    let noise = vec2(rng.gen_range(-0.5..0.5), rng.gen_range(-0.5..0.5));
                    node.velocity += noise * (*magnitude * alpha);
                }
            }
        }
    }

    pub(super) fn name(&self) -> &'static str {
        match self {
            Self::Link(_) => "link",
            Self::Charge { .. } => "charge",
            Self::Center { .. } => "center",
            Self::Cluster { .. } => "cluster",
            Self::Collide { .. } => "collide",
            Self::Radial { .. } => "radial",
            Self::Jitter { .. } => "jitter",
        }
    }
}

/// Builds the active force list. Charge and collision are always present.
pub(super) fn assemble(
    settings: &ForcesSettings,
    toggles: &AdvancedToggles,
    links: &[SimLink],
    node_count: usize,
    center: Vec2,
    seed: u64,
) -> Vec<Force> {
    let mut forces = Vec::with_capacity(7);
    forces.push(Force::Link(LinkForce::new(
        links,
        node_count,
        settings,
        toggles.elastic_links,
    )));
    forces.push(Force::Charge {
        strength: settings.repulsion_strength,
    });

    if toggles.group_clustering {
        forces.push(Force::Cluster {
            center,
            strength: CLUSTER_STRENGTH,
        });
    } else {
        forces.push(Force::Center {
            center,
            strength: settings.center_strength,
        });
    }

    forces.push(Force::Collide {
        radius: settings.collision_radius,
        strength: 1.0,
    });
    if toggles.repulsion_zones {
        forces.push(Force::Collide {
            radius: settings.collision_radius * LOOSE_ZONE_SCALE,
            strength: LOOSE_ZONE_STRENGTH,
        });
    }

    if toggles.gravity_well {
        forces.push(Force::Radial {
            center,
            radius: settings.radial_radius,
            strength: RADIAL_STRENGTH,
        });
    }

    if toggles.jitter {
        forces.push(Force::Jitter {
            rng: StdRng::seed_from_u64(seed),
            magnitude: JITTER_MAGNITUDE,
        });
    }

    forces
}

struct Spring {
    source: usize,
    target: usize,
    distance: f32,
    strength: f32,
    bias: f32,
}

pub(super) struct LinkForce {
    springs: Vec<Spring>,
}

impl LinkForce {
    fn new(links: &[SimLink], node_count: usize, settings: &ForcesSettings, elastic: bool) -> Self {
        let mut degree = vec![0usize; node_count];
        for link in links {
            if link.source < node_count && link.target < node_count {
                degree[link.source] += 1;
                degree[link.target] += 1;
            }
        }

        let springs = links
            .iter()
            .enumerate()
            .filter(|(_, link)| {
                link.source < node_count && link.target < node_count && link.source != link.target
            })
            .map(|(index, link)| {
                let distance = if elastic {
                    settings.link_distance * (0.5 + 0.25 * (index % 5) as f32)
                } else {
                    settings.link_distance
                };
                let source_degree = degree[link.source] as f32;
                let target_degree = degree[link.target] as f32;

                Spring {
                    source: link.source,
                    target: link.target,
                    distance,
                    strength: (settings.link_strength * link.value).clamp(0.0, 1.0),
                    bias: source_degree / (source_degree + target_degree),
                }
            })
            .collect();

        Self { springs }
    }

    fn apply(&self, nodes: &mut [SimNode], alpha: f32) {
        for spring in &self.springs {
            let source = &nodes[spring.source];
            let target = &nodes[spring.target];
            if !source.position.is_finite() || !target.position.is_finite() {
                continue;
            }

            let mut offset =
                (target.position + target.velocity) - (source.position + source.velocity);
            if offset.length_sq() <= f32::EPSILON {
                offset = pair_jiggle(spring.source, spring.target);
            }
            let distance = offset.length();
            let pull = offset * ((distance - spring.distance) / distance * alpha * spring.strength);

            nodes[spring.target].velocity -= pull * spring.bias;
            nodes[spring.source].velocity += pull * (1.0 - spring.bias);
        }
    }
}

fn apply_charge(nodes: &mut [SimNode], strength: f32, alpha: f32) {
    if nodes.len() < 2 || strength == 0.0 {
        return;
    }

    let positions = nodes.iter().map(|node| node.position).collect::<Vec<_>>();
    let Some(quadtree) = QuadNode::build(&positions) else {
        return;
    };

    let scaled_strength = strength * alpha;
    for (index, node) in nodes.iter_mut().enumerate() {
        if !positions[index].is_finite() {
            continue;
        }

        let mut delta = Vec2::ZERO;
        accumulate_charge(&quadtree, index, &positions, scaled_strength, &mut delta);
        node.velocity += delta;
    }
}

fn charge_from_offset(offset: Vec2, distance_sq: f32, weight: f32) -> Vec2 {
    let distance_sq = if distance_sq < CHARGE_DISTANCE_MIN_SQ {
        (CHARGE_DISTANCE_MIN_SQ * distance_sq).sqrt()
    } else {
        distance_sq
    };
    offset * (weight / distance_sq)
}

fn accumulate_charge(
    quad: &QuadNode,
    index: usize,
    positions: &[Vec2],
    scaled_strength: f32,
    delta: &mut Vec2,
) {
    if quad.mass <= 0.0 {
        return;
    }

    let point = positions[index];

    if quad.is_leaf() {
        for &other in &quad.indices {
            if other == index {
                continue;
            }

            let mut offset = positions[other] - point;
            if offset.length_sq() == 0.0 {
                offset = pair_jiggle(index, other);
            }
            *delta += charge_from_offset(offset, offset.length_sq(), scaled_strength);
        }
        return;
    }

    let offset = quad.center_of_mass - point;
    let distance_sq = offset.length_sq();
    let side = quad.bounds.side_length();
    let can_approximate =
        !quad.bounds.contains(point) && (side * side / BARNES_HUT_THETA_SQ) < distance_sq;

    if can_approximate {
        *delta += charge_from_offset(offset, distance_sq, scaled_strength * quad.mass);
        return;
    }

    for child in quad.children.iter().flatten() {
        accumulate_charge(child, index, positions, scaled_strength, delta);
    }
}

#[derive(Clone, Copy)]
struct CollisionParams {
    diameter: f32,
    diameter_sq: f32,
    strength: f32,
}

fn apply_collide(nodes: &mut [SimNode], radius: f32, strength: f32) {
    if nodes.len() < 2 || radius <= 0.0 || strength <= 0.0 {
        return;
    }

    let predicted = nodes
        .iter()
        .map(|node| node.position + node.velocity)
        .collect::<Vec<_>>();
    let Some(quadtree) = QuadNode::build(&predicted) else {
        return;
    };

    let diameter = radius * 2.0;
    let params = CollisionParams {
        diameter,
        diameter_sq: diameter * diameter,
        strength,
    };
    let mut deltas = vec![Vec2::ZERO; nodes.len()];
    accumulate_collision_pairs(&quadtree, &quadtree, true, &predicted, params, &mut deltas);

    for (node, delta) in nodes.iter_mut().zip(deltas) {
        node.velocity += delta;
    }
}

fn resolve_overlap(
    from: usize,
    to: usize,
    positions: &[Vec2],
    params: CollisionParams,
    deltas: &mut [Vec2],
) {
    let mut offset = positions[from] - positions[to];
    let mut distance_sq = offset.length_sq();
    if distance_sq >= params.diameter_sq {
        return;
    }

    if distance_sq == 0.0 {
        offset = pair_jiggle(from, to);
        distance_sq = offset.length_sq();
    }

    let distance = distance_sq.sqrt();
    let push = offset * ((params.diameter - distance) / distance * params.strength * 0.5);
    deltas[from] += push;
    deltas[to] -= push;
}

fn accumulate_collision_pairs(
    node_a: &QuadNode,
    node_b: &QuadNode,
    same_node: bool,
    positions: &[Vec2],
    params: CollisionParams,
    deltas: &mut [Vec2],
) {
    if node_a.bounds.distance_sq_to(node_b.bounds) > params.diameter_sq {
        return;
    }

    if node_a.is_leaf() && node_b.is_leaf() {
        if same_node {
            for (offset, &from) in node_a.indices.iter().enumerate() {
                for &to in &node_a.indices[offset + 1..] {
                    resolve_overlap(from, to, positions, params, deltas);
                }
            }
        } else {
            for &from in &node_a.indices {
                for &to in &node_b.indices {
                    resolve_overlap(from, to, positions, params, deltas);
                }
            }
        }
        return;
    }

    if same_node {
        for first in 0..4 {
            let Some(child_a) = node_a.children[first].as_ref() else {
                continue;
            };

            accumulate_collision_pairs(child_a, child_a, true, positions, params, deltas);

            for second in (first + 1)..4 {
                let Some(child_b) = node_a.children[second].as_ref() else {
                    continue;
                };
                accumulate_collision_pairs(child_a, child_b, false, positions, params, deltas);
            }
        }
        return;
    }

    let split_a = if node_a.is_leaf() {
        false
    } else if node_b.is_leaf() {
        true
    } else {
        node_a.bounds.half_extent >= node_b.bounds.half_extent
    };

    if split_a {
        for child in node_a.children.iter().flatten() {
            accumulate_collision_pairs(child, node_b, false, positions, params, deltas);
        }
    } else {
        for child in node_b.children.iter().flatten() {
            accumulate_collision_pairs(node_a, child, false, positions, params, deltas);
        }
    }
}

fn apply_radial(nodes: &mut [SimNode], center: Vec2, radius: f32, strength: f32, alpha: f32) {
    for (index, node) in nodes.iter_mut().enumerate() {
        if !node.position.is_finite() {
            continue;
        }

        let mut offset = node.position - center;
        if offset.length_sq() == 0.0 {
            offset = pair_jiggle(index, usize::MAX);
        }
        let distance = offset.length();
        let k = (radius - distance) * strength * alpha / distance;
        node.velocity += offset * k;
    }
}
