//! Canvas data model.
//!
//! Serialized field names follow the react-flow conventions the web client
//! uses (`type`, `position`, `data`, camelCase inside `data`).

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::component::{ActorType, NodeConfig, NodeKind};

/// Position of a node on the canvas
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Position {
    /// Horizontal coordinate
    pub x: f64,
    /// Vertical coordinate
    pub y: f64,
}

impl Position {
    /// Create a position
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// Grid slot for the `index`-th node: four columns, 250 apart, rows 150 apart
    pub fn grid_slot(index: usize) -> Self {
        Self {
            x: 200.0 + (index % 4) as f64 * 250.0,
            y: 100.0 + (index / 4) as f64 * 150.0,
        }
    }
}

/// Mutable payload of a node
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NodeData {
    /// Display name
    pub name: String,

    /// Free-text description
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    /// Kind-specific configuration
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub config: Option<NodeConfig>,

    /// Actor flavour, for actor nodes
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub actor_type: Option<ActorType>,

    /// Integration name, for tool nodes
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tool_type: Option<String>,

    /// Icon name
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub icon: Option<String>,

    /// Color name
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
}

impl NodeData {
    /// Data with just a name
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }
}

/// Partial update of [`NodeData`]. Absent fields are left untouched.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NodeDataPatch {
    /// New display name
    #[serde(default)]
    pub name: Option<String>,
    /// New description
    #[serde(default)]
    pub description: Option<String>,
    /// New configuration
    #[serde(default)]
    pub config: Option<NodeConfig>,
    /// New actor flavour
    #[serde(default)]
    pub actor_type: Option<ActorType>,
    /// New tool integration name
    #[serde(default)]
    pub tool_type: Option<String>,
    /// New icon
    #[serde(default)]
    pub icon: Option<String>,
    /// New color
    #[serde(default)]
    pub color: Option<String>,
}

/// A node in a workflow graph
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkflowNode {
    /// Unique identifier within its canvas
    pub id: String,

    /// Node kind, fixed after creation
    #[serde(rename = "type")]
    pub kind: NodeKind,

    /// Canvas position
    pub position: Position,

    /// Mutable payload
    pub data: NodeData,

    /// UI selection flag
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub selected: bool,
}

impl WorkflowNode {
    /// Create a node
    pub fn new(id: impl Into<String>, kind: NodeKind, position: Position, data: NodeData) -> Self {
        Self {
            id: id.into(),
            kind,
            position,
            data,
            selected: false,
        }
    }

    /// Merge a patch into the node data.
    ///
    /// A patch carrying a configuration for another node kind is rejected as
    /// a whole and leaves the node untouched. Returns whether it was applied.
    pub fn apply_patch(&mut self, patch: NodeDataPatch) -> bool {
        if let Some(config) = &patch.config {
            if !config.fits(self.kind) {
                return false;
            }
        }

        if let Some(name) = patch.name {
            self.data.name = name;
        }
        if let Some(description) = patch.description {
            self.data.description = Some(description);
        }
        if let Some(config) = patch.config {
            self.data.config = Some(config);
        }
        if let Some(actor_type) = patch.actor_type {
            self.data.actor_type = Some(actor_type);
        }
        if let Some(tool_type) = patch.tool_type {
            self.data.tool_type = Some(tool_type);
        }
        if let Some(icon) = patch.icon {
            self.data.icon = Some(icon);
        }
        if let Some(color) = patch.color {
            self.data.color = Some(color);
        }

        true
    }
}

/// A node to be added; the store assigns the id
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewNode {
    /// Node kind
    #[serde(rename = "type")]
    pub kind: NodeKind,

    /// Explicit position, or the next grid slot when absent
    #[serde(default)]
    pub position: Option<Position>,

    /// Initial payload
    pub data: NodeData,
}

impl NewNode {
    /// A new node at the next free grid slot
    pub fn new(kind: NodeKind, data: NodeData) -> Self {
        Self {
            kind,
            position: None,
            data,
        }
    }

    /// Place the node at an explicit position
    pub fn at(mut self, position: Position) -> Self {
        self.position = Some(position);
        self
    }
}

/// A directed connection between two nodes
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkflowEdge {
    /// Unique identifier within its canvas
    pub id: String,

    /// Source node id
    pub source: String,

    /// Target node id
    pub target: String,

    /// Source handle on the node, if any
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_handle: Option<String>,

    /// Target handle on the node, if any
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target_handle: Option<String>,

    /// Edge rendering type
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub edge_type: Option<String>,

    /// Free-form edge payload
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<HashMap<String, serde_json::Value>>,

    /// UI selection flag
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub selected: bool,
}

impl WorkflowEdge {
    /// Create a plain edge
    pub fn new(id: impl Into<String>, source: impl Into<String>, target: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            source: source.into(),
            target: target.into(),
            source_handle: None,
            target_handle: None,
            edge_type: None,
            data: None,
            selected: false,
        }
    }

    /// Whether the edge starts or ends at `node_id`
    pub fn touches(&self, node_id: &str) -> bool {
        self.source == node_id || self.target == node_id
    }
}

/// A connection request from the UI
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Connection {
    /// Source node id
    pub source: String,
    /// Target node id
    pub target: String,
    /// Source handle
    #[serde(default)]
    pub source_handle: Option<String>,
    /// Target handle
    #[serde(default)]
    pub target_handle: Option<String>,
}

impl Connection {
    /// Connection between two nodes without handles
    pub fn new(source: impl Into<String>, target: impl Into<String>) -> Self {
        Self {
            source: source.into(),
            target: target.into(),
            source_handle: None,
            target_handle: None,
        }
    }

    /// Whether `edge` already links the same endpoints and handles
    pub fn same_endpoints(&self, edge: &WorkflowEdge) -> bool {
        edge.source == self.source
            && edge.target == self.target
            && edge.source_handle == self.source_handle
            && edge.target_handle == self.target_handle
    }
}

/// Which connections the store accepts
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct EdgePolicy {
    /// Accept edges from a node to itself
    pub allow_self_loops: bool,
    /// Accept a second edge between the same endpoints
    pub allow_duplicates: bool,
}

impl Default for EdgePolicy {
    fn default() -> Self {
        Self {
            allow_self_loops: false,
            allow_duplicates: true,
        }
    }
}

/// The graph of one environment
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Canvas {
    /// Nodes in insertion order
    pub nodes: Vec<WorkflowNode>,
    /// Edges in insertion order
    pub edges: Vec<WorkflowEdge>,
}

impl Canvas {
    /// Look up a node
    pub fn node(&self, id: &str) -> Option<&WorkflowNode> {
        self.nodes.iter().find(|n| n.id == id)
    }

    /// Whether a node with `id` exists
    pub fn contains_node(&self, id: &str) -> bool {
        self.node(id).is_some()
    }

    /// Whether an edge with `id` exists
    pub fn contains_edge(&self, id: &str) -> bool {
        self.edges.iter().any(|e| e.id == id)
    }

    /// Nodes of one kind
    pub fn nodes_of_kind(&self, kind: NodeKind) -> impl Iterator<Item = &WorkflowNode> {
        self.nodes.iter().filter(move |n| n.kind == kind)
    }
}

/// A node-list patch, as emitted by the canvas widget
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum NodeChange {
    /// Node dragged
    Position {
        /// Node id
        id: String,
        /// New position; absent while a drag only starts or ends
        #[serde(default)]
        position: Option<Position>,
    },
    /// Selection toggled
    Select {
        /// Node id
        id: String,
        /// New selection state
        selected: bool,
    },
    /// Node removed (incident edges arrive as separate edge changes)
    Remove {
        /// Node id
        id: String,
    },
    /// Node inserted as-is
    Add {
        /// The node
        item: WorkflowNode,
    },
}

/// An edge-list patch, as emitted by the canvas widget
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum EdgeChange {
    /// Selection toggled
    Select {
        /// Edge id
        id: String,
        /// New selection state
        selected: bool,
    },
    /// Edge removed
    Remove {
        /// Edge id
        id: String,
    },
    /// Edge inserted as-is
    Add {
        /// The edge
        item: WorkflowEdge,
    },
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::component::{AgentConfig, ToolConfig};
    use serde_json::json;

    #[test]
    fn test_grid_slots() {
        assert_eq!(Position::grid_slot(0), Position::new(200.0, 100.0));
        assert_eq!(Position::grid_slot(3), Position::new(950.0, 100.0));
        assert_eq!(Position::grid_slot(4), Position::new(200.0, 250.0));
        assert_eq!(Position::grid_slot(9), Position::new(450.0, 400.0));
    }

    #[test]
    fn test_node_serializes_like_react_flow() {
        let mut data = NodeData::named("Customer");
        data.actor_type = Some(ActorType::Human);
        let node = WorkflowNode::new("customer", NodeKind::Actor, Position::new(1.0, 2.0), data);

        let value = serde_json::to_value(&node).unwrap();
        assert_eq!(value["type"], json!("actor"));
        assert_eq!(value["data"]["actorType"], json!("human"));
        assert!(value.get("selected").is_none());
    }

    #[test]
    fn test_patch_with_mismatched_config_is_rejected_whole() {
        let mut node = WorkflowNode::new(
            "agent",
            NodeKind::Actor,
            Position::default(),
            NodeData::named("Agent"),
        );

        let applied = node.apply_patch(NodeDataPatch {
            name: Some("Renamed".to_string()),
            config: Some(NodeConfig::Tool(ToolConfig::default())),
            ..Default::default()
        });
        assert!(!applied);
        assert_eq!(node.data.name, "Agent");
        assert!(node.data.config.is_none());

        let applied = node.apply_patch(NodeDataPatch {
            name: Some("Renamed".to_string()),
            config: Some(NodeConfig::Actor(AgentConfig::default())),
            ..Default::default()
        });
        assert!(applied);
        assert_eq!(node.data.name, "Renamed");
        assert!(node.data.config.is_some());
    }

    #[test]
    fn test_node_change_wire_format() {
        let change: NodeChange =
            serde_json::from_value(json!({"type": "remove", "id": "n1"})).unwrap();
        assert_eq!(change, NodeChange::Remove { id: "n1".to_string() });
    }
}
