use serde::{Deserialize, Serialize};

/// Role of a node in the knowledge tree
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum NodeType {
    Root,
    Branch,
    Leaf,
}

impl NodeType {
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_lowercase().as_str() {
            "root" => Some(NodeType::Root),
            "branch" => Some(NodeType::Branch),
            "leaf" => Some(NodeType::Leaf),
            _ => None,
        }
    }

    /// Type implied by depth when the model gives none
    pub fn for_level(level: u32) -> Self {
        if level == 0 {
            NodeType::Root
        } else {
            NodeType::Branch
        }
    }
}

/// Display data attached to a node
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct NodeData {
    pub label: String,
    pub description: String,
    pub level: u32,
}

/// Canvas coordinates used by the hierarchical layout
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct Position {
    pub x: f64,
    pub y: f64,
}

impl Position {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// Grid slot for the `index`-th node at `level`: four columns, one row
    /// per level.
    pub fn for_slot(index: usize, level: u32) -> Self {
        Self {
            x: ((index % 4) * 300 + 100) as f64,
            y: (level as f64) * 150.0 + 100.0,
        }
    }
}

/// Represents a node in the knowledge tree
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct KnowledgeNode {
    /// Unique identifier for the node
    pub id: String,
    /// Root, branch or leaf
    #[serde(rename = "type")]
    pub node_type: NodeType,
    pub data: NodeData,
    pub position: Position,
}

impl KnowledgeNode {
    pub fn new(
        id: impl Into<String>,
        node_type: NodeType,
        label: impl Into<String>,
        description: impl Into<String>,
        level: u32,
        position: Position,
    ) -> Self {
        Self {
            id: id.into(),
            node_type,
            data: NodeData {
                label: label.into(),
                description: description.into(),
                level,
            },
            position,
        }
    }

    pub fn label(&self) -> &str {
        &self.data.label
    }

    pub fn level(&self) -> u32 {
        self.data.level
    }
}
