use std::collections::HashSet;

use super::physics::Simulation;

/// The two highlight sources the renderer composes: the search-focused node
/// and the hovered node with its direct neighbors.
#[derive(Clone, Debug, Default, PartialEq)]
pub(in crate::app) struct Highlights {
    search: HashSet<usize>,
    hover: HashSet<usize>,
}

impl Highlights {
    pub(in crate::app) fn update(
        &mut self,
        simulation: &Simulation,
        search_focus: Option<usize>,
        hovered: Option<usize>,
    ) {
        let node_count = simulation.nodes().len();

        self.search.clear();
        self.search
            .extend(search_focus.filter(|&index| index < node_count));

        self.hover.clear();
        if let Some(index) = hovered.filter(|&index| index < node_count) {
            self.hover.insert(index);
            self.hover.extend(simulation.neighbors(index).iter().copied());
        }
    }

    pub(in crate::app) fn clear(&mut self) {
        self.search.clear();
        self.hover.clear();
    }

    pub(in crate::app) fn is_active(&self) -> bool {
        !self.search.is_empty() || !self.hover.is_empty()
    }

    pub(in crate::app) fn contains(&self, index: usize) -> bool {
        self.search.contains(&index) || self.hover.contains(&index)
    }

    pub(in crate::app) fn is_search(&self, index: usize) -> bool {
        self.search.contains(&index)
    }

    #[cfg(test)]
    pub(in crate::app) fn from_sets(
        search: impl IntoIterator<Item = usize>,
        hover: impl IntoIterator<Item = usize>,
    ) -> Self {
        Self {
            search: search.into_iter().collect(),
            hover: hover.into_iter().collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::{Graph, Link, Node};

    fn simulation() -> Simulation {
        let mut simulation = Simulation::default();
        simulation.bind(&Graph {
            nodes: ["a", "b", "c", "d"]
                .into_iter()
                .map(|id| Node::new(id, id, ""))
                .collect(),
            links: vec![Link::new("a", "b", "R"), Link::new("c", "b", "R")],
        });
        simulation
    }

    #[test]
    fn hover_includes_direct_neighbors() {
        let simulation = simulation();
        let mut highlights = Highlights::default();
        highlights.update(&simulation, None, Some(1));

        assert!(highlights.is_active());
        assert!([0, 1, 2].into_iter().all(|index| highlights.contains(index)));
        assert!(!highlights.contains(3));
        assert!(!highlights.is_search(1));
    }

    #[test]
    fn search_marks_only_the_focus() {
        let simulation = simulation();
        let mut highlights = Highlights::default();
        highlights.update(&simulation, Some(3), None);

        assert!(highlights.is_search(3));
        assert!(!highlights.contains(2));

        highlights.update(&simulation, None, None);
        assert!(!highlights.is_active());
    }

    #[test]
    fn stale_indices_are_ignored() {
        let simulation = simulation();
        let mut highlights = Highlights::default();
        highlights.update(&simulation, Some(40), Some(41));
        assert!(!highlights.is_active());
    }
}
