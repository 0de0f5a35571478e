use std::fs;
use std::path::{Path, PathBuf};

use thiserror::Error;

use super::Graph;

#[derive(Debug, Error)]
pub enum SnapshotError {
    #[error("failed to read graph snapshot {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid graph snapshot {}: {source}", .path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

pub fn parse_snapshot(raw: &str) -> Result<Graph, serde_json::Error> {
    serde_json::from_str(raw)
}

pub fn read_snapshot(path: &Path) -> Result<Graph, SnapshotError> {
    let raw = fs::read_to_string(path).map_err(|source| SnapshotError::Io {
        path: path.to_path_buf(),
        source,
    })?;

    let graph = parse_snapshot(&raw).map_err(|source| SnapshotError::Parse {
        path: path.to_path_buf(),
        source,
    })?;

    tracing::info!(
        path = %path.display(),
        nodes = graph.nodes.len(),
        links = graph.links.len(),
        "read graph snapshot"
    );
    Ok(graph)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_labels_numeric_ids_and_defaults() {
        let graph = parse_snapshot(
            r#"{
                "nodes": [
                    { "id": 1, "name": "Ada", "label": "Person", "properties": { "born": 1815 } },
                    { "id": "2", "name": "Analytical Engine" }
                ],
                "links": [ { "source": 1, "target": "2", "type": "DESIGNED" } ]
            }"#,
        )
        .expect("valid snapshot");

        assert_eq!(graph.nodes[0].id, "1");
        assert_eq!(graph.nodes[0].group, "Person");
        assert_eq!(graph.nodes[0].properties["born"], serde_json::json!(1815));
        assert_eq!(graph.nodes[1].group, "");
        assert_eq!(graph.links[0].source, "1");
        assert_eq!(graph.links[0].kind, "DESIGNED");
        assert_eq!(graph.links[0].value, 1.0);
    }

    #[test]
    fn missing_sections_are_empty() {
        let graph = parse_snapshot("{}").expect("valid snapshot");
        assert!(graph.is_empty());
        assert!(graph.links.is_empty());
    }

    #[test]
    fn rejects_object_ids() {
        let error = parse_snapshot(r#"{ "nodes": [ { "id": { "nested": true } } ] }"#)
            .expect_err("object ids are invalid");
        assert!(error.to_string().contains("string or numeric id"));
    }

    #[test]
    fn missing_file_reports_path() {
        let error = read_snapshot(Path::new("/definitely/not/here.json"))
            .expect_err("file does not exist");
        assert!(matches!(error, SnapshotError::Io { .. }));
        assert!(error.to_string().contains("/definitely/not/here.json"));
    }
}
