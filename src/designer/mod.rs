//! The designer context.
//!
//! A [`Designer`] owns everything an editing session needs: the per-environment
//! graph store, the UI flags, the animation board and its scheduler. It is
//! cheap to clone; clones share state. Every change is published as a
//! [`DesignerEvent`] on a broadcast channel.

use chrono::Utc;
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::sync::Arc;
use tokio::sync::{broadcast, RwLock};
use tokio::time;
use tracing::{debug, info, instrument, warn, Instrument};
use validator::Validate;

use crate::canvas::{
    Canvas, CanvasStore, Connection, EdgeChange, EdgePolicy, NewNode, NodeChange, NodeDataPatch,
    NodeRemoval, WorkflowEdge, WorkflowNode,
};
use crate::component::{NodeConfig, NodeKind};
use crate::config::{Settings, SimulationSettings};
use crate::error::{Error, Result};
use crate::simulation::{
    AnimationBoard, AnimationScheduler, AnimationSnapshot, Improvement, RetrainReport,
    SimulationReport, Timeline,
};
use crate::telemetry;

pub mod ui;

pub use ui::{DesignerEvent, UiState};

const EVENT_CAPACITY: usize = 100;

#[derive(Debug)]
struct Inner {
    canvas: RwLock<CanvasStore>,
    ui: RwLock<UiState>,
    board: AnimationBoard,
    scheduler: AnimationScheduler,
    settings: SimulationSettings,
    events: broadcast::Sender<DesignerEvent>,
}

/// Application context of one designer session
#[derive(Debug, Clone)]
pub struct Designer {
    inner: Arc<Inner>,
}

impl Default for Designer {
    fn default() -> Self {
        Self::with_settings(SimulationSettings::default(), EdgePolicy::default())
    }
}

impl Designer {
    /// Designer configured from loaded settings
    pub fn new(settings: &Settings) -> Self {
        Self::with_settings(settings.simulation.clone(), settings.canvas.edge_policy())
    }

    /// Designer with explicit timing and edge policy
    pub fn with_settings(settings: SimulationSettings, policy: EdgePolicy) -> Self {
        let board = AnimationBoard::new();
        let (events, _) = broadcast::channel(EVENT_CAPACITY);

        Self {
            inner: Arc::new(Inner {
                canvas: RwLock::new(CanvasStore::with_policy(policy)),
                ui: RwLock::new(UiState::default()),
                scheduler: AnimationScheduler::new(board.clone()),
                board,
                settings,
                events,
            }),
        }
    }

    /// Receive change events from now on
    pub fn subscribe(&self) -> broadcast::Receiver<DesignerEvent> {
        self.inner.events.subscribe()
    }

    fn emit(&self, event: DesignerEvent) {
        // no subscribers is fine
        let _ = self.inner.events.send(event);
    }

    // Environments

    /// Switch environments. Cancels a simulation in progress.
    #[instrument(skip(self))]
    pub async fn set_current_environment(&self, environment_id: &str) {
        if self.inner.scheduler.is_running().await {
            self.cancel_simulation().await;
        }

        self.inner
            .canvas
            .write()
            .await
            .set_current_environment(environment_id);
        info!("Switched to environment {}", environment_id);
        self.emit(DesignerEvent::EnvironmentChanged(environment_id.to_string()));
    }

    /// Current environment id, empty before the first switch
    pub async fn current_environment_id(&self) -> String {
        self.inner.canvas.read().await.current_environment_id().to_string()
    }

    /// Environments visited so far
    pub async fn environment_ids(&self) -> Vec<String> {
        self.inner.canvas.read().await.environment_ids()
    }

    // Canvas

    /// Copy of the current canvas
    pub async fn current_canvas(&self) -> Canvas {
        self.inner.canvas.read().await.current_canvas()
    }

    /// Nodes of the current canvas
    pub async fn nodes(&self) -> Vec<WorkflowNode> {
        self.inner.canvas.read().await.nodes().to_vec()
    }

    /// Edges of the current canvas
    pub async fn edges(&self) -> Vec<WorkflowEdge> {
        self.inner.canvas.read().await.edges().to_vec()
    }

    /// Add a node.
    ///
    /// Fails with [`Error::Validation`] if the node carries a configuration of
    /// another kind or with out-of-range values. Returns `None` when no
    /// environment is selected.
    #[instrument(skip(self, node), fields(kind = %node.kind))]
    pub async fn add_node(&self, node: NewNode) -> Result<Option<String>> {
        if let Some(config) = &node.data.config {
            check_config_kind(config, node.kind)?;
            config.validate()?;
        }

        let id = self.inner.canvas.write().await.add_node(node);
        if let Some(id) = &id {
            self.emit(DesignerEvent::NodeAdded(id.clone()));
        }
        Ok(id)
    }

    /// Patch a node's data. Returns whether the node exists.
    ///
    /// Fails with [`Error::Validation`], leaving the node untouched, if the
    /// patch carries a configuration of another kind or with out-of-range
    /// values.
    #[instrument(skip(self, patch))]
    pub async fn update_node(&self, node_id: &str, patch: NodeDataPatch) -> Result<bool> {
        if let Some(config) = &patch.config {
            config.validate()?;
            let kind = self
                .inner
                .canvas
                .read()
                .await
                .nodes()
                .iter()
                .find(|n| n.id == node_id)
                .map(|n| n.kind);
            if let Some(kind) = kind {
                check_config_kind(config, kind)?;
            }
        }

        let found = self.inner.canvas.write().await.update_node(node_id, patch);
        if found {
            self.emit(DesignerEvent::NodeUpdated(node_id.to_string()));
        }
        Ok(found)
    }

    /// Delete a node and its incident edges
    #[instrument(skip(self))]
    pub async fn delete_node(&self, node_id: &str) -> Option<NodeRemoval> {
        let removal = self.inner.canvas.write().await.delete_node(node_id)?;
        self.emit(DesignerEvent::NodeDeleted {
            id: node_id.to_string(),
            edges: removal.edges.iter().map(|e| e.id.clone()).collect(),
        });
        Some(removal)
    }

    /// Connect two nodes, subject to the edge policy
    pub async fn connect(&self, connection: Connection) -> Option<WorkflowEdge> {
        let edge = self.inner.canvas.write().await.connect(connection)?;
        self.emit(DesignerEvent::EdgeAdded(edge.id.clone()));
        Some(edge)
    }

    /// Replace the node list
    pub async fn set_nodes(&self, nodes: Vec<WorkflowNode>) {
        self.inner.canvas.write().await.set_nodes(nodes);
        self.emit(DesignerEvent::NodesChanged);
    }

    /// Replace the edge list
    pub async fn set_edges(&self, edges: Vec<WorkflowEdge>) {
        self.inner.canvas.write().await.set_edges(edges);
        self.emit(DesignerEvent::EdgesChanged);
    }

    /// Apply node changes from the canvas widget
    pub async fn apply_node_changes(&self, changes: Vec<NodeChange>) {
        self.inner.canvas.write().await.apply_node_changes(changes);
        self.emit(DesignerEvent::NodesChanged);
    }

    /// Apply edge changes from the canvas widget
    pub async fn apply_edge_changes(&self, changes: Vec<EdgeChange>) {
        self.inner.canvas.write().await.apply_edge_changes(changes);
        self.emit(DesignerEvent::EdgesChanged);
    }

    /// Select a node, or clear the selection with `None`
    pub async fn select_node(&self, node_id: Option<&str>) {
        let selected = {
            let mut canvas = self.inner.canvas.write().await;
            canvas.select_node(node_id);
            canvas.selected_node().map(|n| n.id.clone())
        };
        self.emit(DesignerEvent::SelectionChanged(selected));
    }

    /// The selected node
    pub async fn selected_node(&self) -> Option<WorkflowNode> {
        self.inner.canvas.read().await.selected_node().cloned()
    }

    // UI

    /// Copy of the UI flags
    pub async fn ui(&self) -> UiState {
        self.inner.ui.read().await.clone()
    }

    /// Current animation flags
    pub async fn animations(&self) -> AnimationSnapshot {
        self.inner.board.snapshot().await
    }

    async fn update_ui<F: FnOnce(&mut UiState)>(&self, f: F) {
        f(&mut *self.inner.ui.write().await);
        self.emit(DesignerEvent::UiChanged);
    }

    /// Switch the sidebar tab
    pub async fn set_active_tab(&self, tab: &str) {
        self.update_ui(|ui| ui.active_tab = tab.to_string()).await;
    }

    /// Toggle a sidebar section. Returns whether it is now expanded.
    pub async fn toggle_section(&self, section: &str) -> bool {
        let expanded = self.inner.ui.write().await.toggle_section(section);
        self.emit(DesignerEvent::UiChanged);
        expanded
    }

    /// Open the add-component modal, optionally preselecting a kind
    pub async fn open_add_component(&self, kind: Option<NodeKind>) {
        self.update_ui(|ui| {
            ui.show_add_component_modal = true;
            ui.add_component_type = kind;
        })
        .await;
    }

    /// Close the add-component modal
    pub async fn close_add_component(&self) {
        self.update_ui(|ui| {
            ui.show_add_component_modal = false;
            ui.add_component_type = None;
        })
        .await;
    }

    /// Close the simulation results modal
    pub async fn dismiss_simulation_modal(&self) {
        self.update_ui(|ui| ui.show_simulation_modal = false).await;
    }

    /// Close the retrain results modal
    pub async fn dismiss_results_modal(&self) {
        self.update_ui(|ui| ui.show_results_modal = false).await;
    }

    // Simulation

    /// Animate the current graph, then publish the canned report.
    ///
    /// Supersedes a simulation already running, which then fails with
    /// [`Error::Cancelled`] and is announced as cancelled. The run owns its
    /// own task, so dropping the returned future does not leave the designer
    /// in the running state.
    #[instrument(skip(self))]
    pub async fn run_simulation(&self) -> Result<SimulationReport> {
        let designer = self.clone();
        let task = tokio::spawn(async move { designer.simulate().await }.in_current_span());
        task.await?
    }

    async fn simulate(&self) -> Result<SimulationReport> {
        let canvas = self.current_canvas().await;
        let environment = self.current_environment_id().await;
        let started = Utc::now();

        let mut rng = StdRng::from_entropy();
        let timeline = Timeline::random(&canvas.nodes, &canvas.edges, &self.inner.settings, &mut rng);
        debug!(
            "Simulating {} nodes, {} edges with {} cues",
            canvas.nodes.len(),
            canvas.edges.len(),
            timeline.len()
        );

        if self.inner.scheduler.is_running().await {
            info!("Superseding the simulation in progress");
            self.emit(DesignerEvent::SimulationCancelled);
        }
        self.inner.ui.write().await.is_simulation_running = true;
        self.emit(DesignerEvent::SimulationStarted);

        match self
            .inner
            .scheduler
            .run(timeline, self.inner.settings.duration())
            .await
        {
            Ok(()) => {
                let report = SimulationReport::canned(started);
                {
                    let mut ui = self.inner.ui.write().await;
                    ui.is_simulation_running = false;
                    ui.simulation_results = Some(report.clone());
                    ui.show_simulation_modal = true;
                }

                telemetry::add_metric(
                    "simulation_completed",
                    report.result.success_rate,
                    &[("environment", environment)],
                );
                info!("Simulation completed");
                self.emit(DesignerEvent::SimulationCompleted(report.clone()));
                Ok(report)
            }
            Err(err) => {
                // a superseding run owns the running flag
                if !self.inner.scheduler.is_running().await {
                    self.inner.ui.write().await.is_simulation_running = false;
                }
                Err(err)
            }
        }
    }

    /// Stop the simulation in progress. Returns whether there was one.
    #[instrument(skip(self))]
    pub async fn cancel_simulation(&self) -> bool {
        let cancelled = self.inner.scheduler.cancel().await;
        if cancelled {
            self.inner.ui.write().await.is_simulation_running = false;
            info!("Simulation cancelled");
            self.emit(DesignerEvent::SimulationCancelled);
        }
        cancelled
    }

    // Retrain

    /// Retrain an agent and open the results modal.
    ///
    /// Fails with [`Error::Busy`] while another retrain is running. The work
    /// runs on its own task, so dropping the returned future does not leave
    /// the designer stuck in the running state.
    #[instrument(skip(self))]
    pub async fn run_retrain(
        &self,
        agent_id: &str,
        method: &str,
        reward_id: &str,
    ) -> Result<RetrainReport> {
        {
            let mut ui = self.inner.ui.write().await;
            if ui.is_retrain_running {
                let running = ui.retrain_agent_id.clone().unwrap_or_default();
                warn!("Rejected retrain of {}: {} is retraining", agent_id, running);
                return Err(Error::Busy(format!("retrain of {} in progress", running)));
            }
            ui.is_retrain_running = true;
            ui.retrain_agent_id = Some(agent_id.to_string());
        }

        let designer = self.clone();
        let (agent_id, method, reward_id) = (
            agent_id.to_string(),
            method.to_string(),
            reward_id.to_string(),
        );
        let task = tokio::spawn(async move { designer.retrain(agent_id, method, reward_id).await });
        Ok(task.await?)
    }

    async fn retrain(&self, agent_id: String, method: String, reward_id: String) -> RetrainReport {
        let inner = &self.inner;
        inner.board.set_retrain_gear(&agent_id, true).await;
        self.emit(DesignerEvent::RetrainStarted(agent_id.clone()));

        time::sleep(inner.settings.retrain()).await;

        let report = RetrainReport {
            agent_id: agent_id.clone(),
            method,
            reward_id,
            completed_at: Utc::now(),
            improvements: Improvement::canned(),
        };

        inner.board.set_retrain_gear(&agent_id, false).await;
        {
            let mut ui = inner.ui.write().await;
            ui.results_data = Some(report.clone());
            ui.is_retrain_running = false;
            ui.retrain_agent_id = None;
        }

        telemetry::add_metric(
            "retrain_completed",
            1.0,
            &[("agent", agent_id.clone()), ("method", report.method.clone())],
        );
        info!(
            "Retrain completed for agent {} using {} with reward {}",
            agent_id, report.method, report.reward_id
        );
        self.emit(DesignerEvent::RetrainCompleted(report.clone()));

        time::sleep(inner.settings.results_reveal()).await;
        inner.ui.write().await.show_results_modal = true;
        self.emit(DesignerEvent::ResultsRevealed);

        report
    }
}

fn check_config_kind(config: &NodeConfig, kind: NodeKind) -> Result<()> {
    if config.fits(kind) {
        Ok(())
    } else {
        Err(Error::Validation(format!(
            "{} configuration cannot be attached to a {} node",
            config.kind(),
            kind
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::canvas::NodeData;
    use crate::component::{AgentConfig, ToolConfig};

    #[tokio::test]
    async fn test_add_node_rejects_mismatched_config() {
        let designer = Designer::default();
        designer.set_current_environment("env-production").await;

        let mut data = NodeData::named("Agent");
        data.config = Some(NodeConfig::Tool(ToolConfig::default()));
        let result = designer.add_node(NewNode::new(NodeKind::Actor, data)).await;
        assert!(matches!(result, Err(Error::Validation(_))));
        assert_eq!(designer.nodes().await.len(), 9);
    }

    #[tokio::test]
    async fn test_update_node_rejects_out_of_range_config() {
        let designer = Designer::default();
        designer.set_current_environment("env-production").await;

        let patch = NodeDataPatch {
            config: Some(NodeConfig::Actor(AgentConfig {
                temperature: Some(5.0),
                ..Default::default()
            })),
            ..Default::default()
        };
        let result = designer.update_node("sales-agent", patch).await;
        assert!(matches!(result, Err(Error::Validation(_))));
    }

    #[tokio::test]
    async fn test_update_node_rejects_config_of_other_kind() {
        let designer = Designer::default();
        designer.set_current_environment("env-production").await;

        let patch = NodeDataPatch {
            name: Some("Renamed".to_string()),
            config: Some(NodeConfig::Tool(ToolConfig::default())),
            ..Default::default()
        };
        let result = designer.update_node("sales-agent", patch).await;
        assert!(matches!(result, Err(Error::Validation(_))));

        let canvas = designer.current_canvas().await;
        assert_eq!(canvas.node("sales-agent").unwrap().data.name, "Sales Agent");
    }

    #[tokio::test]
    async fn test_events_are_published() {
        let designer = Designer::default();
        let mut events = designer.subscribe();

        designer.set_current_environment("env-production").await;
        designer.delete_node("customer").await;

        assert_eq!(
            events.recv().await.unwrap(),
            DesignerEvent::EnvironmentChanged("env-production".to_string())
        );
        assert_eq!(
            events.recv().await.unwrap(),
            DesignerEvent::NodeDeleted {
                id: "customer".to_string(),
                edges: vec!["e1".to_string()],
            }
        );
    }

    #[tokio::test]
    async fn test_add_component_modal() {
        let designer = Designer::default();
        designer.open_add_component(Some(NodeKind::Tool)).await;
        let ui = designer.ui().await;
        assert!(ui.show_add_component_modal);
        assert_eq!(ui.add_component_type, Some(NodeKind::Tool));

        designer.close_add_component().await;
        assert!(!designer.ui().await.show_add_component_modal);
    }
}
