pub mod edge;
pub mod error;
pub mod knowledge_tree;
pub mod node;

pub use edge::KnowledgeEdge;
pub use error::GraphError;
pub use knowledge_tree::{KnowledgeGraph, KnowledgeTree};
pub use node::{KnowledgeNode, NodeData, NodeType, Position};
