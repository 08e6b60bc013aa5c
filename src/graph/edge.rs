use serde::{Deserialize, Serialize};

pub const DEFAULT_EDGE_TYPE: &str = "smoothstep";

/// Represents a parent-to-child link in the knowledge tree
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct KnowledgeEdge {
    pub id: String,
    /// Parent node ID
    pub source: String,
    /// Child node ID
    pub target: String,
    /// Rendering hint for the front end
    #[serde(rename = "type")]
    pub edge_type: String,
}

impl KnowledgeEdge {
    pub fn new(id: impl Into<String>, source: impl Into<String>, target: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            source: source.into(),
            target: target.into(),
            edge_type: DEFAULT_EDGE_TYPE.to_string(),
        }
    }

    pub fn connects(&self, source: &str, target: &str) -> bool {
        self.source == source && self.target == target
    }
}
