//! Workflow canvas state.
//!
//! [`CanvasStore`] keeps one [`Canvas`] per environment and applies the
//! editing operations of the designer: adding, patching and deleting nodes,
//! connecting them, and replaying node/edge change lists from the canvas
//! widget. Every operation is synchronous and infallible; operations against
//! a missing environment or node do nothing.

use std::collections::HashMap;
use tracing::{debug, warn};
use uuid::Uuid;

pub mod demo;
pub mod models;

pub use demo::demo_canvas;
pub use models::{
    Canvas, Connection, EdgeChange, EdgePolicy, NewNode, NodeChange, NodeData, NodeDataPatch,
    Position, WorkflowEdge, WorkflowNode,
};

/// A node removed by [`CanvasStore::delete_node`], with the edges that went with it
#[derive(Debug, Clone, PartialEq)]
pub struct NodeRemoval {
    /// The removed node
    pub node: WorkflowNode,
    /// Edges that started or ended at the node
    pub edges: Vec<WorkflowEdge>,
}

/// Per-environment graph store
#[derive(Debug, Clone, Default)]
pub struct CanvasStore {
    /// Canvases by environment id
    canvases: HashMap<String, Canvas>,

    /// Environment being edited, empty before the first switch
    current_environment_id: String,

    /// Id of the selected node in the current environment
    selected_node_id: Option<String>,

    /// Which connections are accepted
    policy: EdgePolicy,
}

impl CanvasStore {
    /// Create an empty store with the default edge policy
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an empty store with a custom edge policy
    pub fn with_policy(policy: EdgePolicy) -> Self {
        Self {
            policy,
            ..Default::default()
        }
    }

    /// Edge policy in force
    pub fn policy(&self) -> EdgePolicy {
        self.policy
    }

    /// Current environment id, empty before the first switch
    pub fn current_environment_id(&self) -> &str {
        &self.current_environment_id
    }

    /// Ids of every environment visited so far
    pub fn environment_ids(&self) -> Vec<String> {
        let mut ids: Vec<String> = self.canvases.keys().cloned().collect();
        ids.sort();
        ids
    }

    /// Switch to an environment, creating its canvas on first visit.
    ///
    /// The very first canvas of the store is the demo canvas; later ones start
    /// empty. Selection is always cleared.
    pub fn set_current_environment(&mut self, environment_id: &str) {
        if !self.canvases.contains_key(environment_id) {
            let canvas = if self.canvases.is_empty() {
                debug!("Seeding demo canvas for environment {}", environment_id);
                demo_canvas()
            } else {
                Canvas::default()
            };
            self.canvases.insert(environment_id.to_string(), canvas);
        }

        self.current_environment_id = environment_id.to_string();
        self.selected_node_id = None;
    }

    /// Snapshot of the current canvas, empty when there is none
    pub fn current_canvas(&self) -> Canvas {
        self.current().cloned().unwrap_or_default()
    }

    /// Canvas of a given environment, if visited
    pub fn canvas(&self, environment_id: &str) -> Option<&Canvas> {
        self.canvases.get(environment_id)
    }

    /// Nodes of the current canvas
    pub fn nodes(&self) -> &[WorkflowNode] {
        self.current().map(|c| c.nodes.as_slice()).unwrap_or(&[])
    }

    /// Edges of the current canvas
    pub fn edges(&self) -> &[WorkflowEdge] {
        self.current().map(|c| c.edges.as_slice()).unwrap_or(&[])
    }

    /// Replace the node list of the current canvas
    pub fn set_nodes(&mut self, nodes: Vec<WorkflowNode>) {
        if let Some(canvas) = self.current_mut() {
            canvas.nodes = nodes;
        }
    }

    /// Replace the edge list of the current canvas
    pub fn set_edges(&mut self, edges: Vec<WorkflowEdge>) {
        if let Some(canvas) = self.current_mut() {
            canvas.edges = edges;
        }
    }

    /// Select a node (or clear the selection)
    pub fn select_node(&mut self, node_id: Option<&str>) {
        self.selected_node_id = match node_id {
            Some(id) if self.nodes().iter().any(|n| n.id == id) => Some(id.to_string()),
            _ => None,
        };
    }

    /// The selected node, as currently stored
    pub fn selected_node(&self) -> Option<&WorkflowNode> {
        let id = self.selected_node_id.as_deref()?;
        self.nodes().iter().find(|n| n.id == id)
    }

    /// Append a node under a fresh id. Returns the id, or `None` without a current canvas.
    pub fn add_node(&mut self, new_node: NewNode) -> Option<String> {
        let canvas = self.current_mut()?;

        let id = loop {
            let candidate = format!("node-{}", Uuid::new_v4().simple());
            if !canvas.contains_node(&candidate) {
                break candidate;
            }
        };
        let position = new_node
            .position
            .unwrap_or_else(|| Position::grid_slot(canvas.nodes.len()));

        canvas.nodes.push(WorkflowNode::new(
            id.clone(),
            new_node.kind,
            position,
            new_node.data,
        ));

        debug!("Added {} node {}", new_node.kind, id);
        Some(id)
    }

    /// Merge a patch into a node's data. Returns whether the node was updated.
    ///
    /// A patch whose configuration belongs to another node kind is rejected
    /// whole.
    pub fn update_node(&mut self, node_id: &str, patch: NodeDataPatch) -> bool {
        let Some(canvas) = self.current_mut() else {
            return false;
        };
        let Some(node) = canvas.nodes.iter_mut().find(|n| n.id == node_id) else {
            return false;
        };

        let applied = node.apply_patch(patch);
        if !applied {
            warn!(
                "Rejected update of {} node {}: configuration variant does not match",
                node.kind, node_id
            );
        }
        applied
    }

    /// Remove a node and every edge incident to it
    pub fn delete_node(&mut self, node_id: &str) -> Option<NodeRemoval> {
        let canvas = self.current_mut()?;
        let index = canvas.nodes.iter().position(|n| n.id == node_id)?;
        let node = canvas.nodes.remove(index);

        let (removed, kept): (Vec<_>, Vec<_>) =
            canvas.edges.drain(..).partition(|e| e.touches(node_id));
        canvas.edges = kept;

        if self.selected_node_id.as_deref() == Some(node_id) {
            self.selected_node_id = None;
        }

        debug!("Deleted node {} and {} edges", node_id, removed.len());
        Some(NodeRemoval {
            node,
            edges: removed,
        })
    }

    /// Append an edge for a connection, subject to the edge policy
    pub fn connect(&mut self, connection: Connection) -> Option<WorkflowEdge> {
        let policy = self.policy;
        let canvas = self.current_mut()?;

        if !policy.allow_self_loops && connection.source == connection.target {
            debug!("Rejected self-loop on {}", connection.source);
            return None;
        }
        if !policy.allow_duplicates && canvas.edges.iter().any(|e| connection.same_endpoints(e)) {
            debug!(
                "Rejected duplicate edge {} -> {}",
                connection.source, connection.target
            );
            return None;
        }

        let id = loop {
            let suffix = Uuid::new_v4().simple().to_string();
            let candidate = format!(
                "edge-{}-{}-{}",
                connection.source,
                connection.target,
                &suffix[..8]
            );
            if !canvas.contains_edge(&candidate) {
                break candidate;
            }
        };

        let edge = WorkflowEdge {
            source_handle: connection.source_handle,
            target_handle: connection.target_handle,
            ..WorkflowEdge::new(id, connection.source, connection.target)
        };
        canvas.edges.push(edge.clone());
        Some(edge)
    }

    /// Replay node changes from the canvas widget on the current canvas
    pub fn apply_node_changes(&mut self, changes: Vec<NodeChange>) {
        let selected = self.selected_node_id.clone();
        let Some(canvas) = self.current_mut() else {
            return;
        };

        let mut deselect = false;
        for change in changes {
            match change {
                NodeChange::Position { id, position } => {
                    if let (Some(node), Some(position)) =
                        (canvas.nodes.iter_mut().find(|n| n.id == id), position)
                    {
                        node.position = position;
                    }
                }
                NodeChange::Select { id, selected } => {
                    if let Some(node) = canvas.nodes.iter_mut().find(|n| n.id == id) {
                        node.selected = selected;
                    }
                }
                NodeChange::Remove { id } => {
                    canvas.nodes.retain(|n| n.id != id);
                    deselect |= selected.as_deref() == Some(id.as_str());
                }
                NodeChange::Add { item } => {
                    if !canvas.contains_node(&item.id) {
                        canvas.nodes.push(item);
                    }
                }
            }
        }

        if deselect {
            self.selected_node_id = None;
        }
    }

    /// Replay edge changes from the canvas widget on the current canvas
    pub fn apply_edge_changes(&mut self, changes: Vec<EdgeChange>) {
        let Some(canvas) = self.current_mut() else {
            return;
        };

        for change in changes {
            match change {
                EdgeChange::Select { id, selected } => {
                    if let Some(edge) = canvas.edges.iter_mut().find(|e| e.id == id) {
                        edge.selected = selected;
                    }
                }
                EdgeChange::Remove { id } => canvas.edges.retain(|e| e.id != id),
                EdgeChange::Add { item } => {
                    if !canvas.contains_edge(&item.id) {
                        canvas.edges.push(item);
                    }
                }
            }
        }
    }

    fn current(&self) -> Option<&Canvas> {
        self.canvases.get(&self.current_environment_id)
    }

    fn current_mut(&mut self) -> Option<&mut Canvas> {
        self.canvases.get_mut(&self.current_environment_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::component::{NodeConfig, NodeKind, RewardConfig};

    fn store_with_empty_env() -> CanvasStore {
        let mut store = CanvasStore::new();
        store.set_current_environment("env-production");
        store.set_current_environment("env-empty");
        store
    }

    #[test]
    fn test_operations_without_environment_are_noops() {
        let mut store = CanvasStore::new();
        assert!(store
            .add_node(NewNode::new(NodeKind::Tool, NodeData::named("Tool")))
            .is_none());
        assert!(!store.update_node("x", NodeDataPatch::default()));
        assert!(store.delete_node("x").is_none());
        assert!(store.connect(Connection::new("a", "b")).is_none());
        assert!(store.current_canvas().nodes.is_empty());
    }

    #[test]
    fn test_first_environment_gets_demo() {
        let mut store = CanvasStore::new();
        store.set_current_environment("env-production");
        assert_eq!(store.nodes().len(), 9);
        assert_eq!(store.edges().len(), 8);

        store.set_current_environment("env-staging");
        assert!(store.nodes().is_empty());
        assert!(store.edges().is_empty());

        store.set_current_environment("env-production");
        assert_eq!(store.nodes().len(), 9);
    }

    #[test]
    fn test_add_node_uses_grid_slot() {
        let mut store = store_with_empty_env();
        for _ in 0..5 {
            store.add_node(NewNode::new(NodeKind::Actor, NodeData::named("A")));
        }
        assert_eq!(store.nodes()[0].position, Position::new(200.0, 100.0));
        assert_eq!(store.nodes()[4].position, Position::new(200.0, 250.0));

        let id = store
            .add_node(NewNode::new(NodeKind::Tool, NodeData::named("T")).at(Position::new(5.0, 6.0)))
            .unwrap();
        let node = store.nodes().iter().find(|n| n.id == id).unwrap();
        assert_eq!(node.position, Position::new(5.0, 6.0));
    }

    #[test]
    fn test_update_node_merges() {
        let mut store = store_with_empty_env();
        let id = store
            .add_node(NewNode::new(NodeKind::Actor, NodeData::named("Agent")))
            .unwrap();

        assert!(store.update_node(
            &id,
            NodeDataPatch {
                description: Some("Handles leads".to_string()),
                ..Default::default()
            }
        ));
        let node = &store.nodes()[0];
        assert_eq!(node.data.name, "Agent");
        assert_eq!(node.data.description.as_deref(), Some("Handles leads"));
        assert!(!store.update_node("missing", NodeDataPatch::default()));
    }

    #[test]
    fn test_update_node_rejects_mismatched_config_whole() {
        let mut store = store_with_empty_env();
        let id = store
            .add_node(NewNode::new(NodeKind::Tool, NodeData::named("Slack")))
            .unwrap();

        let updated = store.update_node(
            &id,
            NodeDataPatch {
                name: Some("Teams".to_string()),
                config: Some(NodeConfig::Reward(RewardConfig::default())),
                ..Default::default()
            },
        );
        assert!(!updated);
        let node = &store.nodes()[0];
        assert_eq!(node.data.name, "Slack");
        assert!(node.data.config.is_none());
    }

    #[test]
    fn test_delete_node_cascades_and_clears_selection() {
        let mut store = CanvasStore::new();
        store.set_current_environment("env-production");
        store.select_node(Some("sales-agent"));
        assert!(store.selected_node().is_some());

        let removal = store.delete_node("sales-agent").unwrap();
        assert_eq!(removal.edges.len(), 5);
        assert_eq!(store.nodes().len(), 8);
        assert_eq!(store.edges().len(), 3);
        assert!(store.edges().iter().all(|e| !e.touches("sales-agent")));
        assert!(store.selected_node().is_none());
    }

    #[test]
    fn test_connect_policy() {
        let mut store = store_with_empty_env();
        assert!(store.connect(Connection::new("a", "a")).is_none());
        assert!(store.connect(Connection::new("a", "b")).is_some());
        assert!(store.connect(Connection::new("a", "b")).is_some());
        assert_eq!(store.edges().len(), 2);
        assert_ne!(store.edges()[0].id, store.edges()[1].id);

        let mut strict = CanvasStore::with_policy(EdgePolicy {
            allow_self_loops: true,
            allow_duplicates: false,
        });
        strict.set_current_environment("env");
        assert!(strict.connect(Connection::new("a", "a")).is_some());
        assert!(strict.connect(Connection::new("a", "b")).is_some());
        assert!(strict.connect(Connection::new("a", "b")).is_none());
    }

    #[test]
    fn test_node_and_edge_changes() {
        let mut store = CanvasStore::new();
        store.set_current_environment("env-production");

        store.apply_node_changes(vec![
            NodeChange::Position {
                id: "customer".to_string(),
                position: Some(Position::new(1.0, 1.0)),
            },
            NodeChange::Select {
                id: "openai".to_string(),
                selected: true,
            },
            NodeChange::Remove {
                id: "calendar".to_string(),
            },
            NodeChange::Position {
                id: "ghost".to_string(),
                position: Some(Position::new(9.0, 9.0)),
            },
        ]);

        let customer = store.nodes().iter().find(|n| n.id == "customer").unwrap();
        assert_eq!(customer.position, Position::new(1.0, 1.0));
        assert!(store.nodes().iter().find(|n| n.id == "openai").unwrap().selected);
        assert_eq!(store.nodes().len(), 8);
        // widget removals do not cascade
        assert_eq!(store.edges().len(), 8);

        store.apply_edge_changes(vec![
            EdgeChange::Remove {
                id: "e6".to_string(),
            },
            EdgeChange::Add {
                item: WorkflowEdge::new("e9", "customer", "openai"),
            },
        ]);
        assert_eq!(store.edges().len(), 8);
        assert!(store.edges().iter().any(|e| e.id == "e9"));
        assert!(!store.edges().iter().any(|e| e.id == "e6"));
    }
}
