use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashSet;
use tracing::debug;

use super::heuristics::capitalized_words;
use super::schema::{non_empty_array, object_items, objects, str_or, string_list, truncate_chars};
use super::{PromptAgent, PromptSpec};
use crate::graph::edge::DEFAULT_EDGE_TYPE;
use crate::graph::{KnowledgeEdge, KnowledgeNode, KnowledgeTree, NodeType, Position};

const SYSTEM_PROMPT: &str = "You are an expert at creating knowledge graphs and hierarchical structures from documents.

Create a tree-like knowledge structure that shows:
1. Main topics as root nodes
2. Subtopics as child nodes
3. Concepts and details as leaf nodes
4. Relationships between different concepts

The structure should be suitable for visualization in React Flow.
Each node should have: id, label, type, position, and connections.";

const MAX_FALLBACK_TOPICS: usize = 8;

/// Node being assembled from model output before levels are settled.
struct DraftNode {
    index: usize,
    id: String,
    node_type: Option<NodeType>,
    label: String,
    description: String,
    level: u32,
    position: Option<Position>,
}

/// Field under `data`, falling back to the node object itself.
fn node_field<'a>(raw: &'a Value, key: &str) -> Option<&'a Value> {
    raw.get("data")
        .and_then(|data| data.get(key))
        .or_else(|| raw.get(key))
}

fn position(raw: &Value) -> Option<Position> {
    let position = raw.get("position")?;
    let x = position.get("x")?.as_f64()?;
    let y = position.get("y")?.as_f64()?;
    Some(Position::new(x, y))
}

fn draft_node(index: usize, raw: &Value) -> DraftNode {
    let text = |key: &str, default: &str| match node_field(raw, key) {
        Some(Value::String(s)) => s.clone(),
        _ => default.to_string(),
    };
    let level = node_field(raw, "level")
        .and_then(Value::as_f64)
        .map(|l| l.max(0.0) as u32)
        .unwrap_or(0);

    DraftNode {
        index,
        id: str_or(raw, "id", &format!("node_{}", index + 1)),
        node_type: raw.get("type").and_then(Value::as_str).and_then(NodeType::parse),
        label: text("label", "Untitled"),
        description: text("description", ""),
        level,
        position: position(raw),
    }
}

/// Build a consistent tree from raw model nodes and edges: duplicate nodes
/// and dangling edges are dropped and levels follow depth from the roots
/// (orphan subtrees count from their own top node).
fn tree_from_reply(value: &Value) -> Option<KnowledgeTree> {
    let raw_nodes = non_empty_array(value, "nodes")?;

    let mut seen = HashSet::new();
    let mut drafts: Vec<DraftNode> = Vec::new();
    for (index, raw) in object_items(raw_nodes) {
        let draft = draft_node(index, raw);
        if seen.insert(draft.id.clone()) {
            drafts.push(draft);
        } else {
            debug!(id = %draft.id, "dropping duplicate node");
        }
    }
    if drafts.is_empty() {
        return None;
    }

    let edges: Vec<KnowledgeEdge> = objects(value, "edges")
        .into_iter()
        .filter_map(|(i, raw)| {
            let source = raw.get("source").and_then(Value::as_str)?;
            let target = raw.get("target").and_then(Value::as_str)?;
            if !seen.contains(source) || !seen.contains(target) {
                debug!(source, target, "dropping dangling edge");
                return None;
            }
            let mut edge = KnowledgeEdge::new(str_or(raw, "id", &format!("edge_{}", i + 1)), source, target);
            edge.edge_type = str_or(raw, "type", DEFAULT_EDGE_TYPE);
            Some(edge)
        })
        .collect();

    // Placeholder nodes carry only ids so the graph can settle depths.
    let skeleton: Vec<KnowledgeNode> = drafts
        .iter()
        .map(|d| {
            let node_type = d.node_type.unwrap_or_else(|| NodeType::for_level(d.level));
            KnowledgeNode::new(d.id.as_str(), node_type, "", "", d.level, Position::new(0.0, 0.0))
        })
        .collect();
    let skeleton = KnowledgeTree::new(skeleton, edges);
    let depths = match skeleton.to_graph() {
        Ok(graph) => graph.depths_from(&skeleton.root_ids(&graph)),
        Err(e) => {
            debug!(error = %e, "could not build graph, keeping model levels");
            Default::default()
        }
    };

    let nodes = drafts
        .into_iter()
        .map(|d| {
            let level = depths.get(&d.id).copied().unwrap_or(d.level);
            let node_type = d.node_type.unwrap_or_else(|| NodeType::for_level(level));
            let position = d.position.unwrap_or_else(|| Position::for_slot(d.index, level));
            KnowledgeNode::new(d.id, node_type, d.label, d.description, level, position)
        })
        .collect();

    Some(KnowledgeTree::new(nodes, skeleton.edges))
}

struct TreeSpec<'a> {
    text: &'a str,
}

impl PromptSpec for TreeSpec<'_> {
    type Output = KnowledgeTree;

    fn name(&self) -> &'static str {
        "knowledge_tree"
    }

    fn system_prompt(&self) -> &'static str {
        SYSTEM_PROMPT
    }

    fn prompt(&self) -> String {
        format!(
            "Create a knowledge tree from this document text:

TEXT: {}...

Create a hierarchical structure with:
1. Root nodes (main topics)
2. Branch nodes (subtopics)
3. Leaf nodes (specific concepts)
4. Connections showing relationships

Format for React Flow visualization:
{{
    \"nodes\": [
        {{
            \"id\": \"node_1\",
            \"type\": \"root|branch|leaf\",
            \"data\": {{
                \"label\": \"Node Title\",
                \"description\": \"Brief description\",
                \"level\": 0
            }},
            \"position\": {{\"x\": 100, \"y\": 100}}
        }}
    ],
    \"edges\": [
        {{
            \"id\": \"edge_1\",
            \"source\": \"node_1\",
            \"target\": \"node_2\",
            \"type\": \"smoothstep\"
        }}
    ]
}}

Create 10-20 nodes with proper hierarchy and connections.",
            truncate_chars(self.text, 2000)
        )
    }

    fn validate(&self, value: Value) -> Option<KnowledgeTree> {
        tree_from_reply(&value)
    }

    fn fallback(&self) -> KnowledgeTree {
        let mut nodes = vec![KnowledgeNode::new(
            "root",
            NodeType::Root,
            "Document Overview",
            "Main document content",
            0,
            Position::new(400.0, 50.0),
        )];
        let mut edges = Vec::new();

        for (i, topic) in capitalized_words(self.text, 4, MAX_FALLBACK_TOPICS)
            .into_iter()
            .enumerate()
        {
            let id = format!("topic_{}", i);
            nodes.push(KnowledgeNode::new(
                id.as_str(),
                NodeType::Branch,
                topic.as_str(),
                format!("Topic: {}", topic),
                1,
                Position::new(((i % 3) * 300 + 200) as f64, 200.0),
            ));
            edges.push(KnowledgeEdge::new(format!("edge_root_{}", i), "root", id));
        }

        KnowledgeTree::new(nodes, edges)
    }
}

/// Explanation of a single node in the context of its document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NodeDetails {
    pub explanation: String,
    pub key_points: Vec<String>,
    pub related_concepts: Vec<String>,
    pub examples: Vec<String>,
}

struct NodeDetailsSpec<'a> {
    node_id: &'a str,
    context: &'a str,
}

impl PromptSpec for NodeDetailsSpec<'_> {
    type Output = NodeDetails;

    fn name(&self) -> &'static str {
        "knowledge_tree.node_details"
    }

    fn system_prompt(&self) -> &'static str {
        SYSTEM_PROMPT
    }

    fn prompt(&self) -> String {
        format!(
            "Provide detailed information about this topic from the document:

NODE: {}
CONTEXT: {}

Provide:
1. Detailed explanation
2. Key points (3-5 bullet points)
3. Related concepts
4. Examples if available

JSON format:
{{
    \"explanation\": \"detailed explanation...\",
    \"key_points\": [\"point1\", \"point2\"],
    \"related_concepts\": [\"concept1\", \"concept2\"],
    \"examples\": [\"example1\", \"example2\"]
}}",
            self.node_id,
            truncate_chars(self.context, 1000)
        )
    }

    fn validate(&self, value: Value) -> Option<NodeDetails> {
        value.get("explanation")?;
        Some(NodeDetails {
            explanation: str_or(&value, "explanation", ""),
            key_points: string_list(&value, "key_points"),
            related_concepts: string_list(&value, "related_concepts"),
            examples: string_list(&value, "examples"),
        })
    }

    fn fallback(&self) -> NodeDetails {
        NodeDetails {
            explanation: format!("Information about {}", self.node_id),
            key_points: vec!["Key concept from the document".to_string()],
            related_concepts: vec!["Related topic".to_string()],
            examples: vec!["Example from context".to_string()],
        }
    }
}

/// Builds hierarchical knowledge trees for visualization.
#[derive(Clone)]
pub struct KnowledgeTreeAgent {
    runner: PromptAgent,
}

impl KnowledgeTreeAgent {
    pub fn new(runner: PromptAgent) -> Self {
        Self { runner }
    }

    pub async fn create_knowledge_tree(&self, text: &str) -> KnowledgeTree {
        self.runner.run(&TreeSpec { text }).await
    }

    pub async fn get_node_details(&self, node_id: &str, context: &str) -> NodeDetails {
        self.runner.run(&NodeDetailsSpec { node_id, context }).await
    }
}
