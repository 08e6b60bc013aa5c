use petgraph::{
    graph::{DiGraph, NodeIndex},
    Direction,
};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, VecDeque};

use crate::graph::{
    edge::KnowledgeEdge,
    error::GraphError,
    node::{KnowledgeNode, NodeType},
};

pub const HIERARCHICAL_LAYOUT: &str = "hierarchical";

/// Node/edge payload handed to the front end
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct KnowledgeTree {
    pub nodes: Vec<KnowledgeNode>,
    pub edges: Vec<KnowledgeEdge>,
    pub layout: String,
}

impl KnowledgeTree {
    pub fn new(nodes: Vec<KnowledgeNode>, edges: Vec<KnowledgeEdge>) -> Self {
        Self {
            nodes,
            edges,
            layout: HIERARCHICAL_LAYOUT.to_string(),
        }
    }

    pub fn node(&self, id: &str) -> Option<&KnowledgeNode> {
        self.nodes.iter().find(|n| n.id == id)
    }

    /// Check that node ids are unique and every edge joins existing nodes
    pub fn validate(&self) -> Result<(), GraphError> {
        self.to_graph().map(|_| ())
    }

    pub fn to_graph(&self) -> Result<KnowledgeGraph, GraphError> {
        let mut graph = KnowledgeGraph::new();
        for node in &self.nodes {
            if graph.contains(&node.id) {
                return Err(GraphError::DuplicateNode(node.id.clone()));
            }
            graph.add_node(&node.id);
        }
        for edge in &self.edges {
            for endpoint in [&edge.source, &edge.target] {
                if !graph.contains(endpoint) {
                    return Err(GraphError::DanglingEdge {
                        edge: edge.id.clone(),
                        node: endpoint.clone(),
                    });
                }
            }
            graph.add_edge(&edge.source, &edge.target)?;
        }
        Ok(graph)
    }

    /// Ids of nodes that start the hierarchy: explicit roots, or nodes with
    /// no parent when the tree names none.
    pub fn root_ids(&self, graph: &KnowledgeGraph) -> Vec<String> {
        let explicit: Vec<String> = self
            .nodes
            .iter()
            .filter(|n| n.node_type == NodeType::Root)
            .map(|n| n.id.clone())
            .collect();
        if !explicit.is_empty() {
            return explicit;
        }
        self.nodes
            .iter()
            .filter(|n| matches!(graph.get_parent(&n.id), Ok(None)))
            .map(|n| n.id.clone())
            .collect()
    }
}

/// Directed parent -> child view of a tree, keyed by node id
pub struct KnowledgeGraph {
    graph: DiGraph<String, ()>,
    node_map: HashMap<String, NodeIndex>,
}

impl Default for KnowledgeGraph {
    fn default() -> Self {
        Self::new()
    }
}

impl KnowledgeGraph {
    pub fn new() -> Self {
        Self {
            graph: DiGraph::new(),
            node_map: HashMap::new(),
        }
    }

    pub fn add_node(&mut self, id: &str) -> NodeIndex {
        if let Some(idx) = self.node_map.get(id) {
            return *idx;
        }
        let idx = self.graph.add_node(id.to_string());
        self.node_map.insert(id.to_string(), idx);
        idx
    }

    pub fn contains(&self, id: &str) -> bool {
        self.node_map.contains_key(id)
    }

    pub fn node_count(&self) -> usize {
        self.graph.node_count()
    }

    /// Add an edge between two existing nodes
    pub fn add_edge(&mut self, source: &str, target: &str) -> Result<(), GraphError> {
        let from_idx = self.index(source)?;
        let to_idx = self.index(target)?;
        self.graph.add_edge(from_idx, to_idx, ());
        Ok(())
    }

    fn index(&self, id: &str) -> Result<NodeIndex, GraphError> {
        self.node_map
            .get(id)
            .copied()
            .ok_or_else(|| GraphError::NodeNotFound(id.to_string()))
    }

    pub fn get_children(&self, id: &str) -> Result<Vec<&str>, GraphError> {
        let idx = self.index(id)?;
        Ok(self
            .graph
            .neighbors_directed(idx, Direction::Outgoing)
            .map(|child| self.graph[child].as_str())
            .collect())
    }

    pub fn get_parent(&self, id: &str) -> Result<Option<&str>, GraphError> {
        let idx = self.index(id)?;
        Ok(self
            .graph
            .neighbors_directed(idx, Direction::Incoming)
            .next()
            .map(|parent| self.graph[parent].as_str()))
    }

    /// Breadth-first depth of every node. Counting starts at `roots`; any
    /// parentless node they never reach starts its own count at 0.
    pub fn depths_from(&self, roots: &[String]) -> HashMap<String, u32> {
        let mut depths = HashMap::new();
        let seeds: Vec<NodeIndex> = roots
            .iter()
            .filter_map(|root| self.node_map.get(root).copied())
            .collect();
        self.spread_depths(&mut depths, seeds);

        let orphans: Vec<NodeIndex> = self
            .graph
            .node_indices()
            .filter(|idx| {
                !depths.contains_key(&self.graph[*idx])
                    && self
                        .graph
                        .neighbors_directed(*idx, Direction::Incoming)
                        .next()
                        .is_none()
            })
            .collect();
        self.spread_depths(&mut depths, orphans);

        depths
    }

    fn spread_depths(&self, depths: &mut HashMap<String, u32>, seeds: Vec<NodeIndex>) {
        let mut queue = VecDeque::new();
        for idx in seeds {
            if depths.insert(self.graph[idx].clone(), 0).is_none() {
                queue.push_back((idx, 0u32));
            }
        }

        while let Some((idx, depth)) = queue.pop_front() {
            for child in self.graph.neighbors_directed(idx, Direction::Outgoing) {
                let id = &self.graph[child];
                if !depths.contains_key(id) {
                    depths.insert(id.clone(), depth + 1);
                    queue.push_back((child, depth + 1));
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::node::Position;

    fn create_test_node(id: &str, node_type: NodeType, level: u32) -> KnowledgeNode {
        KnowledgeNode::new(id, node_type, id, "", level, Position::for_slot(0, level))
    }

    fn sample_tree() -> KnowledgeTree {
        KnowledgeTree::new(
            vec![
                create_test_node("root", NodeType::Root, 0),
                create_test_node("a", NodeType::Branch, 1),
                create_test_node("b", NodeType::Branch, 1),
                create_test_node("a1", NodeType::Leaf, 2),
            ],
            vec![
                KnowledgeEdge::new("e1", "root", "a"),
                KnowledgeEdge::new("e2", "root", "b"),
                KnowledgeEdge::new("e3", "a", "a1"),
            ],
        )
    }

    #[test]
    fn test_graph_creation() {
        let graph = KnowledgeGraph::new();
        assert_eq!(graph.node_count(), 0);
    }

    #[test]
    fn test_add_edge_requires_nodes() {
        let mut graph = KnowledgeGraph::new();
        graph.add_node("parent");
        assert_eq!(
            graph.add_edge("parent", "ghost"),
            Err(GraphError::NodeNotFound("ghost".to_string()))
        );
    }

    #[test]
    fn test_get_children_and_parent() {
        let graph = sample_tree().to_graph().unwrap();

        let mut children = graph.get_children("root").unwrap();
        children.sort();
        assert_eq!(children, vec!["a", "b"]);
        assert_eq!(graph.get_parent("a1").unwrap(), Some("a"));
        assert_eq!(graph.get_parent("root").unwrap(), None);
    }

    #[test]
    fn test_depths() {
        let tree = sample_tree();
        let graph = tree.to_graph().unwrap();
        let depths = graph.depths_from(&tree.root_ids(&graph));

        assert_eq!(depths["root"], 0);
        assert_eq!(depths["b"], 1);
        assert_eq!(depths["a1"], 2);
    }

    #[test]
    fn test_depths_cover_orphan_subtree() {
        let tree = KnowledgeTree::new(
            vec![
                create_test_node("root", NodeType::Root, 0),
                create_test_node("stray", NodeType::Branch, 5),
                create_test_node("stray_leaf", NodeType::Leaf, 1),
            ],
            vec![KnowledgeEdge::new("e", "stray", "stray_leaf")],
        );
        let graph = tree.to_graph().unwrap();
        let depths = graph.depths_from(&tree.root_ids(&graph));

        assert_eq!(depths["root"], 0);
        assert_eq!(depths["stray"], 0);
        assert_eq!(depths["stray_leaf"], 1);
    }

    #[test]
    fn test_roots_inferred_without_explicit_root() {
        let tree = KnowledgeTree::new(
            vec![
                create_test_node("x", NodeType::Branch, 0),
                create_test_node("y", NodeType::Leaf, 0),
            ],
            vec![KnowledgeEdge::new("e", "x", "y")],
        );
        let graph = tree.to_graph().unwrap();
        assert_eq!(tree.root_ids(&graph), vec!["x".to_string()]);
    }

    #[test]
    fn test_validate_rejects_dangling_edge() {
        let mut tree = sample_tree();
        tree.edges.push(KnowledgeEdge::new("bad", "a", "missing"));

        assert_eq!(
            tree.validate(),
            Err(GraphError::DanglingEdge {
                edge: "bad".to_string(),
                node: "missing".to_string()
            })
        );
    }

    #[test]
    fn test_validate_rejects_duplicate_ids() {
        let mut tree = sample_tree();
        tree.nodes.push(create_test_node("a", NodeType::Leaf, 2));
        assert_eq!(tree.validate(), Err(GraphError::DuplicateNode("a".to_string())));
    }
}
