mod forces;
mod index;
mod orbit;
mod quadtree;

use std::collections::HashMap;
use std::f32::consts::PI;

use eframe::egui::{Vec2, vec2};

use crate::config::{AdvancedToggles, ForcesSettings};
use crate::graph::{Graph, GroupKind};
use crate::util::stable_pair;
use forces::Force;
pub(in crate::app) use index::SpatialIndex;
use orbit::Orbit;
pub(in crate::app) use quadtree::QuadtreeCell;

const ALPHA_MIN: f32 = 0.001;
const VELOCITY_RETENTION: f32 = 0.6;
const INITIAL_RADIUS: f32 = 10.0;
const NEIGHBOR_SEED_OFFSET: f32 = 24.0;
const SETTINGS_REHEAT: f32 = 0.3;
const JITTER_SEED: u64 = 0x6c65_6e73;

fn alpha_decay() -> f32 {
    1.0 - ALPHA_MIN.powf(1.0 / 300.0)
}

fn phyllotaxis(index: usize, center: Vec2) -> Vec2 {
    let radius = INITIAL_RADIUS * (0.5 + index as f32).sqrt();
    let angle = index as f32 * PI * (3.0 - 5.0_f32.sqrt());
    center + vec2(angle.cos(), angle.sin()) * radius
}

pub(in crate::app) struct SimNode {
    pub(in crate::app) id: String,
    pub(in crate::app) group: GroupKind,
    pub(in crate::app) position: Vec2,
    pub(in crate::app) velocity: Vec2,
    /// Pinned nodes are clamped here and never integrate.
    pub(in crate::app) pin: Option<Vec2>,
}

pub(in crate::app) struct SimLink {
    pub(in crate::app) source: usize,
    pub(in crate::app) target: usize,
    pub(in crate::app) kind: String,
    pub(in crate::app) value: f32,
}

/// Continuous force-directed integrator over a node arena.
pub(in crate::app) struct Simulation {
    nodes: Vec<SimNode>,
    links: Vec<SimLink>,
    index_by_id: HashMap<String, usize>,
    adjacency: Vec<Vec<usize>>,
    forces: Vec<Force>,
    built_for: Option<(ForcesSettings, AdvancedToggles)>,
    assemblies: u64,
    alpha: f32,
    alpha_target: f32,
    orbiting: bool,
    orbit: Orbit,
    spacing: f32,
    center: Vec2,
    index: SpatialIndex,
}

impl Default for Simulation {
    fn default() -> Self {
        Self {
            nodes: Vec::new(),
            links: Vec::new(),
            index_by_id: HashMap::new(),
            adjacency: Vec::new(),
            forces: Vec::new(),
            built_for: None,
            assemblies: 0,
            alpha: 1.0,
            alpha_target: 0.0,
            orbiting: false,
            orbit: Orbit::default(),
            spacing: ForcesSettings::default().collision_radius * 2.0,
            center: Vec2::ZERO,
            index: SpatialIndex::default(),
        }
    }
}

impl Simulation {
    /// Rebinds to a new snapshot. Nodes whose id survives keep their position
    /// and velocity; pins are dropped. New nodes start next to a surviving
    /// neighbor when they have one, otherwise on the phyllotaxis spiral.
    pub(in crate::app) fn bind(&mut self, graph: &Graph) {
        let mut previous = std::mem::take(&mut self.nodes)
            .into_iter()
            .map(|node| (node.id.clone(), node))
            .collect::<HashMap<_, _>>();

        self.index_by_id.clear();
        let mut nodes = Vec::with_capacity(graph.nodes.len());
        let mut preserved = Vec::with_capacity(graph.nodes.len());
        for node in &graph.nodes {
            if self.index_by_id.contains_key(&node.id) {
                continue;
            }

            self.index_by_id.insert(node.id.clone(), nodes.len());
            let kept = previous.remove(&node.id);
            preserved.push(kept.is_some());
            let (position, velocity) = kept
                .map(|node| (node.position, node.velocity))
                .unwrap_or((Vec2::ZERO, Vec2::ZERO));

            nodes.push(SimNode {
                id: node.id.clone(),
                group: GroupKind::classify(&node.group),
                position,
                velocity,
                pin: None,
            });
        }

        self.links = graph
            .links
            .iter()
            .filter_map(|link| {
                let source = *self.index_by_id.get(&link.source)?;
                let target = *self.index_by_id.get(&link.target)?;
                (source != target).then(|| SimLink {
                    source,
                    target,
                    kind: link.kind.clone(),
                    value: link.value,
                })
            })
            .collect();

        self.adjacency = vec![Vec::new(); nodes.len()];
        for link in &self.links {
            self.adjacency[link.source].push(link.target);
            self.adjacency[link.target].push(link.source);
        }
        for neighbors in &mut self.adjacency {
            neighbors.sort_unstable();
            neighbors.dedup();
        }

        for index in 0..nodes.len() {
            if preserved[index] {
                continue;
            }

            let anchor = self.adjacency[index]
                .iter()
                .find(|&&neighbor| preserved[neighbor])
                .map(|&neighbor| nodes[neighbor].position);
            nodes[index].position = match anchor {
                Some(anchor) => {
                    let (jx, jy) = stable_pair(&nodes[index].id);
                    anchor + vec2(jx, jy) * NEIGHBOR_SEED_OFFSET
                }
                None => phyllotaxis(index, self.center),
            };
        }

        tracing::info!(
            nodes = nodes.len(),
            links = self.links.len(),
            preserved = preserved.iter().filter(|&&kept| kept).count(),
            "bound graph snapshot"
        );

        self.nodes = nodes;
        self.built_for = None;
        self.alpha_target = 0.0;
        self.restart();
        self.index.rebuild(&self.nodes);
    }

    /// Reassembles the force list when the settings it was built for changed.
    fn sync_settings(&mut self, settings: &ForcesSettings, toggles: &AdvancedToggles) {
        self.spacing = settings.collision_radius.max(2.0) * 2.0;
        self.orbiting = toggles.orbiting;
        if self.built_for == Some((*settings, *toggles)) {
            return;
        }

        let first_build = self.built_for.is_none();
        self.assemblies += 1;
        self.forces = forces::assemble(
            settings,
            toggles,
            &self.links,
            self.nodes.len(),
            self.center,
            JITTER_SEED.wrapping_add(self.assemblies),
        );
        self.built_for = Some((*settings, *toggles));

        tracing::debug!(
            forces = ?self.forces.iter().map(Force::name).collect::<Vec<_>>(),
            "assembled simulation forces"
        );
        if !first_build {
            self.reheat(SETTINGS_REHEAT);
        }
    }

    /// Advances one step. Returns false when the simulation is idle.
    pub(in crate::app) fn tick(
        &mut self,
        settings: &ForcesSettings,
        toggles: &AdvancedToggles,
    ) -> bool {
        if self.nodes.is_empty() {
            return false;
        }

        self.sync_settings(settings, toggles);
        if !self.is_running() {
            return false;
        }

        if self.orbiting {
            self.orbit.advance(&mut self.nodes, self.center, self.spacing);
        } else {
            self.alpha += (self.alpha_target - self.alpha) * alpha_decay();
            for force in &mut self.forces {
                force.apply(&mut self.nodes, self.alpha);
            }

            for node in &mut self.nodes {
                if let Some(pin) = node.pin {
                    node.position = pin;
                    node.velocity = Vec2::ZERO;
                } else {
                    node.velocity *= VELOCITY_RETENTION;
                    node.position += node.velocity;
                }
            }
        }

        self.index.rebuild(&self.nodes);
        true
    }

    pub(in crate::app) fn is_running(&self) -> bool {
        !self.nodes.is_empty()
            && (self.orbiting || self.alpha >= ALPHA_MIN || self.alpha_target >= ALPHA_MIN)
    }

    pub(in crate::app) fn restart(&mut self) {
        self.alpha = 1.0;
    }

    pub(in crate::app) fn reheat(&mut self, alpha: f32) {
        self.alpha = self.alpha.max(alpha);
    }

    pub(in crate::app) fn set_alpha_target(&mut self, target: f32) {
        self.alpha_target = target.clamp(0.0, 1.0);
    }

    pub(in crate::app) fn alpha(&self) -> f32 {
        self.alpha
    }

    pub(in crate::app) fn pin(&mut self, index: usize, position: Vec2) {
        if let Some(node) = self.nodes.get_mut(index) {
            node.pin = Some(position);
            node.position = position;
            node.velocity = Vec2::ZERO;
        }
    }

    pub(in crate::app) fn unpin(&mut self, index: usize) {
        if let Some(node) = self.nodes.get_mut(index) {
            node.pin = None;
        }
    }

    pub(in crate::app) fn nodes(&self) -> &[SimNode] {
        &self.nodes
    }

    pub(in crate::app) fn links(&self) -> &[SimLink] {
        &self.links
    }

    pub(in crate::app) fn index_of(&self, id: &str) -> Option<usize> {
        self.index_by_id.get(id).copied()
    }

    pub(in crate::app) fn neighbors(&self, index: usize) -> &[usize] {
        self.adjacency
            .get(index)
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    pub(in crate::app) fn spatial_index(&self) -> &SpatialIndex {
        &self.index
    }

    /// Summed velocity magnitude over all nodes.
    pub(in crate::app) fn total_speed(&self) -> f32 {
        self.nodes.iter().map(|node| node.velocity.length()).sum()
    }
}

#[cfg(test)]
impl SimNode {
    pub(super) fn for_tests(position: Vec2, group: GroupKind) -> Self {
        Self {
            id: String::new(),
            group,
            position,
            velocity: Vec2::ZERO,
            pin: None,
        }
    }
}

#[cfg(test)]
impl SimLink {
    pub(super) fn for_tests(source: usize, target: usize) -> Self {
        Self {
            source,
            target,
            kind: String::new(),
            value: 1.0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::{Link, Node};

    fn graph(ids: &[&str], links: &[(&str, &str)]) -> Graph {
        Graph {
            nodes: ids
                .iter()
                .map(|id| Node::new(*id, id.to_uppercase(), "Person"))
                .collect(),
            links: links
                .iter()
                .map(|(source, target)| Link::new(*source, *target, "KNOWS"))
                .collect(),
        }
    }

    fn run_to_rest(simulation: &mut Simulation, settings: &ForcesSettings) -> usize {
        let toggles = AdvancedToggles::default();
        let mut ticks = 0;
        while simulation.tick(settings, &toggles) {
            ticks += 1;
            assert!(ticks < 2_000, "simulation never cooled");
        }
        ticks
    }

    #[test]
    fn empty_graph_idles() {
        let mut simulation = Simulation::default();
        simulation.bind(&Graph::default());
        assert!(!simulation.is_running());
        assert!(!simulation.tick(&ForcesSettings::default(), &AdvancedToggles::default()));
        assert_eq!(simulation.spatial_index().len(), 0);
    }

    #[test]
    fn default_layout_converges() {
        let mut simulation = Simulation::default();
        simulation.bind(&graph(
            &["a", "b", "c", "d", "e", "f"],
            &[("a", "b"), ("b", "c"), ("c", "a"), ("c", "d"), ("e", "f")],
        ));
        let ticks = run_to_rest(&mut simulation, &ForcesSettings::default());

        assert!((295..=305).contains(&ticks), "cooled after {ticks} ticks");
        assert!(!simulation.is_running());
        assert!(simulation.total_speed() < 1.0);
        assert!(simulation.nodes().iter().all(|node| node.position.is_finite()));
    }

    #[test]
    fn every_toggle_combination_stays_finite() {
        let ids = (0..12).map(|index| format!("n{index}")).collect::<Vec<_>>();
        let id_refs = ids.iter().map(String::as_str).collect::<Vec<_>>();
        let links = (1..12)
            .map(|index| (id_refs[index / 2], id_refs[index]))
            .collect::<Vec<_>>();
        let snapshot = graph(&id_refs, &links);

        for mask in 0u8..128 {
            let toggles = AdvancedToggles {
                jitter: mask & 1 != 0,
                gravity_well: mask & 2 != 0,
                orbiting: mask & 4 != 0,
                repulsion_zones: mask & 8 != 0,
                elastic_links: mask & 16 != 0,
                group_clustering: mask & 32 != 0,
                edge_bundling: mask & 64 != 0,
            };
            let mut simulation = Simulation::default();
            simulation.bind(&snapshot);
            for _ in 0..60 {
                simulation.tick(&ForcesSettings::default(), &toggles);
            }
            assert!(
                simulation
                    .nodes()
                    .iter()
                    .all(|node| node.position.is_finite() && node.velocity.is_finite()),
                "toggles {toggles:?} produced a non-finite layout"
            );
        }
    }

    #[test]
    fn pinned_node_holds_until_released() {
        let mut simulation = Simulation::default();
        simulation.bind(&graph(&["a", "b", "c"], &[("a", "b"), ("b", "c")]));
        let settings = ForcesSettings::default();
        let toggles = AdvancedToggles::default();

        let pin = vec2(150.0, -80.0);
        simulation.pin(1, pin);
        for _ in 0..30 {
            simulation.tick(&settings, &toggles);
            assert_eq!(simulation.nodes()[1].position, pin);
            assert_eq!(simulation.nodes()[1].velocity, Vec2::ZERO);
        }

        simulation.unpin(1);
        simulation.tick(&settings, &toggles);
        assert_ne!(simulation.nodes()[1].position, pin);
    }

    #[test]
    fn rebind_preserves_surviving_positions() {
        let settings = ForcesSettings::default();
        let toggles = AdvancedToggles::default();
        let mut simulation = Simulation::default();
        simulation.bind(&graph(&["a", "b", "c"], &[("a", "b"), ("b", "c")]));
        for _ in 0..40 {
            simulation.tick(&settings, &toggles);
        }
        let kept = simulation.nodes()[0].position;

        simulation.bind(&graph(&["x", "a"], &[("x", "a")]));
        assert_eq!(simulation.index_of("a"), Some(1));
        assert_eq!(simulation.nodes()[1].position, kept);
        let seeded = simulation.nodes()[0].position;
        assert!((seeded - kept).length() <= NEIGHBOR_SEED_OFFSET * 2.0_f32.sqrt() + 1.0e-3);
        assert_eq!(simulation.alpha(), 1.0);
    }

    #[test]
    fn settings_change_reheats() {
        let mut simulation = Simulation::default();
        simulation.bind(&graph(&["a", "b"], &[("a", "b")]));
        let mut settings = ForcesSettings::default();
        run_to_rest(&mut simulation, &settings);
        assert!(simulation.alpha() < ALPHA_MIN);

        settings.link_distance = 120.0;
        assert!(simulation.tick(&settings, &AdvancedToggles::default()));
        assert!(simulation.alpha() > 0.29);
    }

    #[test]
    fn orbiting_runs_without_heat() {
        let mut simulation = Simulation::default();
        simulation.bind(&graph(&["a", "b", "c"], &[]));
        let settings = ForcesSettings::default();
        run_to_rest(&mut simulation, &settings);

        let toggles = AdvancedToggles {
            orbiting: true,
            ..AdvancedToggles::default()
        };
        let before = simulation.nodes()[0].position;
        for _ in 0..1_000 {
            assert!(simulation.tick(&settings, &toggles));
        }
        assert!(simulation.is_running());
        assert_ne!(simulation.nodes()[0].position, before);
    }

    #[test]
    fn alpha_target_keeps_simulation_warm() {
        let mut simulation = Simulation::default();
        simulation.bind(&graph(&["a", "b"], &[("a", "b")]));
        let settings = ForcesSettings::default();
        run_to_rest(&mut simulation, &settings);

        simulation.reheat(0.3);
        simulation.set_alpha_target(0.3);
        for _ in 0..500 {
            assert!(simulation.tick(&settings, &AdvancedToggles::default()));
        }
        assert!((simulation.alpha() - 0.3).abs() < 1.0e-3);

        simulation.set_alpha_target(0.0);
        run_to_rest(&mut simulation, &settings);
        assert!(!simulation.is_running());
    }

    #[test]
    fn index_follows_each_tick() {
        let mut simulation = Simulation::default();
        simulation.bind(&graph(&["a", "b", "c", "d"], &[("a", "b")]));
        simulation.tick(&ForcesSettings::default(), &AdvancedToggles::default());

        for (index, node) in simulation.nodes().iter().enumerate() {
            assert_eq!(simulation.spatial_index().find_nearest(node.position, 0.5), Some(index));
        }
    }

    #[test]
    fn chain_settles_without_overlap() {
        let settings = ForcesSettings::default();
        let mut simulation = Simulation::default();
        simulation.bind(&graph(&["a", "b", "c"], &[("a", "b"), ("b", "c")]));
        run_to_rest(&mut simulation, &settings);

        let nodes = simulation.nodes();
        for first in 0..nodes.len() {
            for second in first + 1..nodes.len() {
                let distance = (nodes[first].position - nodes[second].position).length();
                assert!(distance >= settings.collision_radius, "{first}-{second}: {distance}");
            }
        }
        assert_eq!(simulation.neighbors(1), [0, 2]);
    }
}
