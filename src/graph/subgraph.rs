use std::collections::{HashMap, HashSet, VecDeque};

use super::Graph;

/// Induced subgraph of everything within `depth` hops of `root_id`, following
/// links in both directions. Returns an empty graph if the root is unknown.
pub fn neighborhood(graph: &Graph, root_id: &str, depth: usize) -> Graph {
    if graph.node(root_id).is_none() {
        return Graph::default();
    }

    let mut adjacency: HashMap<&str, Vec<&str>> = HashMap::with_capacity(graph.nodes.len());
    for link in &graph.links {
        adjacency
            .entry(link.source.as_str())
            .or_default()
            .push(link.target.as_str());
        adjacency
            .entry(link.target.as_str())
            .or_default()
            .push(link.source.as_str());
    }

    let mut queue = VecDeque::from([(root_id, 0usize)]);
    let mut visited = HashSet::from([root_id]);

    while let Some((node_id, hops)) = queue.pop_front() {
        if hops >= depth {
            continue;
        }

        let Some(neighbors) = adjacency.get(node_id) else {
            continue;
        };

        for &next_id in neighbors {
            if visited.insert(next_id) {
                queue.push_back((next_id, hops + 1));
            }
        }
    }

    let nodes = graph
        .nodes
        .iter()
        .filter(|node| visited.contains(node.id.as_str()))
        .cloned()
        .collect();
    let links = graph
        .links
        .iter()
        .filter(|link| {
            visited.contains(link.source.as_str()) && visited.contains(link.target.as_str())
        })
        .cloned()
        .collect();

    Graph { nodes, links }
}
