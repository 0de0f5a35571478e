mod group;
mod load;
mod normalize;
mod subgraph;

use std::collections::BTreeMap;

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

pub use group::GroupKind;
pub use load::{SnapshotError, parse_snapshot, read_snapshot};
pub use normalize::normalize;
pub use subgraph::neighborhood;

pub type Properties = BTreeMap<String, Value>;

#[derive(Clone, Debug, PartialEq, Deserialize, Serialize)]
pub struct Node {
    #[serde(deserialize_with = "scalar_id")]
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default, alias = "label")]
    pub group: String,
    #[serde(default)]
    pub properties: Properties,
}

impl Node {
    pub fn new(id: impl Into<String>, name: impl Into<String>, group: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            group: group.into(),
            properties: Properties::new(),
        }
    }

    pub fn display_name(&self) -> &str {
        if self.name.trim().is_empty() {
            &self.id
        } else {
            &self.name
        }
    }
}

#[derive(Clone, Debug, PartialEq, Deserialize, Serialize)]
pub struct Link {
    #[serde(deserialize_with = "scalar_id")]
    pub source: String,
    #[serde(deserialize_with = "scalar_id")]
    pub target: String,
    #[serde(default, rename = "type")]
    pub kind: String,
    #[serde(default = "default_weight")]
    pub value: f32,
}

impl Link {
    pub fn new(
        source: impl Into<String>,
        target: impl Into<String>,
        kind: impl Into<String>,
    ) -> Self {
        Self {
            source: source.into(),
            target: target.into(),
            kind: kind.into(),
            value: default_weight(),
        }
    }
}

fn default_weight() -> f32 {
    1.0
}

/// A full query result. Producers replace it wholesale, never patch it.
#[derive(Clone, Debug, Default, PartialEq, Deserialize, Serialize)]
pub struct Graph {
    #[serde(default)]
    pub nodes: Vec<Node>,
    #[serde(default)]
    pub links: Vec<Link>,
}

impl Graph {
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn node(&self, id: &str) -> Option<&Node> {
        self.nodes.iter().find(|node| node.id == id)
    }
}

fn scalar_id<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    match Value::deserialize(deserializer)? {
        Value::String(id) => Ok(id),
        Value::Number(id) => Ok(id.to_string()),
        other => Err(serde::de::Error::custom(format!(
            "expected a string or numeric id, found {other}"
        ))),
    }
}
