use std::collections::{HashMap, HashSet};

use super::{Graph, Link, Node};

fn normalization_key(node: &Node) -> String {
    let name = node.name.trim();
    if name.is_empty() {
        format!("id:{}", node.id)
    } else {
        format!("name:{}", name.to_lowercase())
    }
}

fn merge_into(representative: &mut Node, duplicate: &Node) {
    if representative.group.trim().is_empty() && !duplicate.group.trim().is_empty() {
        representative.group = duplicate.group.clone();
    }

    for (key, value) in &duplicate.properties {
        representative
            .properties
            .entry(key.clone())
            .or_insert_with(|| value.clone());
    }
}

/// Produces the canonical form of a raw snapshot: one representative per
/// normalization key, links rewritten to representatives, and unresolvable,
/// self-referencing or duplicate links dropped.
pub fn normalize(raw: &Graph) -> Graph {
    let mut nodes: Vec<Node> = Vec::with_capacity(raw.nodes.len());
    let mut index_by_key: HashMap<String, usize> = HashMap::with_capacity(raw.nodes.len());
    let mut index_by_id: HashMap<&str, usize> = HashMap::with_capacity(raw.nodes.len());
    let mut merged = 0usize;

    for node in &raw.nodes {
        let key = normalization_key(node);
        let existing = index_by_id
            .get(node.id.as_str())
            .or_else(|| index_by_key.get(&key))
            .copied();

        let index = match existing {
            Some(index) => {
                merge_into(&mut nodes[index], node);
                merged += 1;
                index
            }
            None => {
                nodes.push(node.clone());
                nodes.len() - 1
            }
        };

        index_by_key.entry(key).or_insert(index);
        index_by_id.entry(node.id.as_str()).or_insert(index);
    }

    let mut seen = HashSet::with_capacity(raw.links.len());
    let mut links = Vec::with_capacity(raw.links.len());
    let mut dropped = 0usize;

    for link in &raw.links {
        let (Some(&source), Some(&target)) = (
            index_by_id.get(link.source.as_str()),
            index_by_id.get(link.target.as_str()),
        ) else {
            dropped += 1;
            continue;
        };

        if source == target || !seen.insert((source, target, link.kind.as_str())) {
            dropped += 1;
            continue;
        }

        let value = if link.value.is_finite() && link.value > 0.0 {
            link.value
        } else {
            1.0
        };

        links.push(Link {
            source: nodes[source].id.clone(),
            target: nodes[target].id.clone(),
            kind: link.kind.clone(),
            value,
        });
    }

    if merged > 0 || dropped > 0 {
        tracing::debug!(merged, dropped, "normalized graph snapshot");
    }

    Graph { nodes, links }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn raw_graph() -> Graph {
        let mut alice = Node::new("1", "Alice", "Person");
        alice.properties.insert("age".into(), json!(41));
        let mut alice_again = Node::new("7", " alice ", "");
        alice_again.properties.insert("age".into(), json!(12));
        alice_again.properties.insert("city".into(), json!("Oslo"));

        Graph {
            nodes: vec![
                alice,
                Node::new("2", "Acme", "Company"),
                alice_again,
                Node::new("3", "", "Topic"),
                Node::new("2", "Acme Duplicate Id", ""),
            ],
            links: vec![
                Link::new("1", "2", "WORKS_AT"),
                Link::new("7", "2", "WORKS_AT"),
                Link::new("7", "3", "LIKES"),
                Link::new("3", "missing", "LIKES"),
                Link::new("1", "7", "SAME_AS"),
            ],
        }
    }

    #[test]
    fn merges_nodes_sharing_a_name() {
        let graph = normalize(&raw_graph());
        let ids = graph.nodes.iter().map(|node| node.id.as_str()).collect::<Vec<_>>();
        assert_eq!(ids, ["1", "2", "3"]);

        let alice = graph.node("1").expect("representative kept");
        assert_eq!(alice.properties["age"], json!(41));
        assert_eq!(alice.properties["city"], json!("Oslo"));
        assert_eq!(graph.node("2").map(|node| node.name.as_str()), Some("Acme"));
    }

    #[test]
    fn rewrites_and_filters_links() {
        let graph = normalize(&raw_graph());
        let links = graph
            .links
            .iter()
            .map(|link| (link.source.as_str(), link.target.as_str(), link.kind.as_str()))
            .collect::<Vec<_>>();

        assert_eq!(links, [("1", "2", "WORKS_AT"), ("1", "3", "LIKES")]);
    }

    #[test]
    fn every_link_resolves() {
        let graph = normalize(&raw_graph());
        for link in &graph.links {
            assert!(graph.node(&link.source).is_some());
            assert!(graph.node(&link.target).is_some());
        }
    }

    #[test]
    fn normalization_is_idempotent() {
        let once = normalize(&raw_graph());
        let twice = normalize(&once);
        assert_eq!(once, twice);
    }

    #[test]
    fn blank_names_fall_back_to_id() {
        let graph = normalize(&Graph {
            nodes: vec![Node::new("a", "", ""), Node::new("b", "  ", "")],
            links: Vec::new(),
        });
        assert_eq!(graph.nodes.len(), 2);
    }

    #[test]
    fn invalid_weights_reset_to_one() {
        let mut link = Link::new("a", "b", "R");
        link.value = f32::NAN;
        let graph = normalize(&Graph {
            nodes: vec![Node::new("a", "A", ""), Node::new("b", "B", "")],
            links: vec![link],
        });
        assert_eq!(graph.links[0].value, 1.0);
    }
}
