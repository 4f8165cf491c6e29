//! Persistent records and their create/patch payloads.
//!
//! Records serialize in camelCase. `New*` payloads are what clients post;
//! their `id` is never read from the wire and is only set by the seed.
//! `*Patch` payloads change only the fields that are present.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use uuid::Uuid;
use validator::{Validate, ValidationError};

use crate::canvas::{WorkflowEdge, WorkflowNode};
use crate::component::{AgentConfig, ToolConfig};
use crate::simulation::{SimulationLog, SimulationResult};

fn new_id(id: Option<String>) -> String {
    id.unwrap_or_else(|| Uuid::new_v4().to_string())
}

fn default_true() -> bool {
    true
}

/// Every node config must match its node kind and be in range
fn validate_nodes(nodes: &[WorkflowNode]) -> Result<(), ValidationError> {
    for node in nodes {
        if let Some(config) = &node.data.config {
            if !config.fits(node.kind) || config.validate().is_err() {
                let mut error = ValidationError::new("invalid_node_config");
                error.add_param("nodeId".into(), &node.id);
                return Err(error);
            }
        }
    }
    Ok(())
}

/// A user account
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    /// User id
    pub id: String,
    /// Unique login name
    pub username: String,
    /// Password, stored as given
    pub password: String,
}

/// Payload creating a [`User`]
#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct NewUser {
    /// Fixed id, for seeding
    #[serde(skip)]
    pub id: Option<String>,
    /// Login name
    #[validate(length(min = 1))]
    pub username: String,
    /// Password
    #[validate(length(min = 1))]
    pub password: String,
}

impl User {
    /// Build a user from its payload
    pub fn create(new: NewUser) -> Self {
        Self {
            id: new_id(new.id),
            username: new.username,
            password: new.password,
        }
    }
}

/// A project grouping scenarios, tools and agents
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Project {
    /// Project id
    pub id: String,
    /// Display name
    pub name: String,
    /// Free-text description
    pub description: Option<String>,
    /// Owner
    pub user_id: Option<String>,
    /// Creation time
    pub created_at: DateTime<Utc>,
    /// Last update time
    pub updated_at: DateTime<Utc>,
}

/// Payload creating a [`Project`]
#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct NewProject {
    /// Fixed id, for seeding
    #[serde(skip)]
    pub id: Option<String>,
    /// Display name
    #[validate(length(min = 1))]
    pub name: String,
    /// Description
    #[serde(default)]
    pub description: Option<String>,
    /// Owner
    #[serde(default)]
    pub user_id: Option<String>,
}

/// Partial update of a [`Project`]
#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct ProjectPatch {
    /// New name
    #[serde(default)]
    #[validate(length(min = 1))]
    pub name: Option<String>,
    /// New description
    #[serde(default)]
    pub description: Option<String>,
}

impl Project {
    /// Build a project from its payload
    pub fn create(new: NewProject) -> Self {
        let now = Utc::now();
        Self {
            id: new_id(new.id),
            name: new.name,
            description: new.description,
            user_id: new.user_id,
            created_at: now,
            updated_at: now,
        }
    }

    /// Apply a patch and touch `updated_at`
    pub fn apply(&mut self, patch: ProjectPatch) {
        if let Some(name) = patch.name {
            self.name = name;
        }
        if let Some(description) = patch.description {
            self.description = Some(description);
        }
        self.updated_at = Utc::now();
    }
}

/// A deployment environment, each with its own canvas in the designer
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Environment {
    /// Environment id
    pub id: String,
    /// Display name
    pub name: String,
    /// Free-text description
    pub description: Option<String>,
    /// Owner
    pub user_id: Option<String>,
    /// Creation time
    pub created_at: DateTime<Utc>,
    /// Last update time
    pub updated_at: DateTime<Utc>,
}

/// Payload creating an [`Environment`]
#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct NewEnvironment {
    /// Fixed id, for seeding
    #[serde(skip)]
    pub id: Option<String>,
    /// Display name
    #[validate(length(min = 1))]
    pub name: String,
    /// Description
    #[serde(default)]
    pub description: Option<String>,
    /// Owner
    #[serde(default)]
    pub user_id: Option<String>,
}

/// Partial update of an [`Environment`]
#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct EnvironmentPatch {
    /// New name
    #[serde(default)]
    #[validate(length(min = 1))]
    pub name: Option<String>,
    /// New description
    #[serde(default)]
    pub description: Option<String>,
}

impl Environment {
    /// Build an environment from its payload
    pub fn create(new: NewEnvironment) -> Self {
        let now = Utc::now();
        Self {
            id: new_id(new.id),
            name: new.name,
            description: new.description,
            user_id: new.user_id,
            created_at: now,
            updated_at: now,
        }
    }

    /// Apply a patch and touch `updated_at`
    pub fn apply(&mut self, patch: EnvironmentPatch) {
        if let Some(name) = patch.name {
            self.name = name;
        }
        if let Some(description) = patch.description {
            self.description = Some(description);
        }
        self.updated_at = Utc::now();
    }
}

/// A saved workflow graph
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Scenario {
    /// Scenario id
    pub id: String,
    /// Display name
    pub name: String,
    /// Free-text description
    pub description: Option<String>,
    /// Owning project
    pub project_id: Option<String>,
    /// Graph nodes
    pub nodes: Vec<WorkflowNode>,
    /// Graph edges
    pub edges: Vec<WorkflowEdge>,
    /// Creation time
    pub created_at: DateTime<Utc>,
    /// Last update time
    pub updated_at: DateTime<Utc>,
}

/// Payload creating a [`Scenario`]
#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct NewScenario {
    /// Fixed id, for seeding
    #[serde(skip)]
    pub id: Option<String>,
    /// Display name
    #[validate(length(min = 1))]
    pub name: String,
    /// Description
    #[serde(default)]
    pub description: Option<String>,
    /// Owning project
    #[serde(default)]
    pub project_id: Option<String>,
    /// Graph nodes
    #[serde(default)]
    #[validate(custom = "validate_nodes")]
    pub nodes: Vec<WorkflowNode>,
    /// Graph edges
    #[serde(default)]
    pub edges: Vec<WorkflowEdge>,
}

/// Partial update of a [`Scenario`]
#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct ScenarioPatch {
    /// New name
    #[serde(default)]
    #[validate(length(min = 1))]
    pub name: Option<String>,
    /// New description
    #[serde(default)]
    pub description: Option<String>,
    /// Move to another project
    #[serde(default)]
    pub project_id: Option<String>,
    /// Replacement node list
    #[serde(default)]
    #[validate(custom = "validate_nodes")]
    pub nodes: Option<Vec<WorkflowNode>>,
    /// Replacement edge list
    #[serde(default)]
    pub edges: Option<Vec<WorkflowEdge>>,
}

impl Scenario {
    /// Build a scenario from its payload
    pub fn create(new: NewScenario) -> Self {
        let now = Utc::now();
        Self {
            id: new_id(new.id),
            name: new.name,
            description: new.description,
            project_id: new.project_id,
            nodes: new.nodes,
            edges: new.edges,
            created_at: now,
            updated_at: now,
        }
    }

    /// Apply a patch and touch `updated_at`
    pub fn apply(&mut self, patch: ScenarioPatch) {
        if let Some(name) = patch.name {
            self.name = name;
        }
        if let Some(description) = patch.description {
            self.description = Some(description);
        }
        if let Some(project_id) = patch.project_id {
            self.project_id = Some(project_id);
        }
        if let Some(nodes) = patch.nodes {
            self.nodes = nodes;
        }
        if let Some(edges) = patch.edges {
            self.edges = edges;
        }
        self.updated_at = Utc::now();
    }
}

/// An integration available to a project's agents
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Tool {
    /// Tool id
    pub id: String,
    /// Display name
    pub name: String,
    /// Integration name, e.g. `salesforce`
    #[serde(rename = "type")]
    pub tool_type: String,
    /// Free-text description
    pub description: Option<String>,
    /// Connection settings
    pub config: ToolConfig,
    /// Whether agents may use the tool
    pub is_active: bool,
    /// Owning project
    pub project_id: Option<String>,
}

/// Payload creating a [`Tool`]
#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct NewTool {
    /// Fixed id, for seeding
    #[serde(skip)]
    pub id: Option<String>,
    /// Display name
    #[validate(length(min = 1))]
    pub name: String,
    /// Integration name
    #[serde(rename = "type")]
    #[validate(length(min = 1))]
    pub tool_type: String,
    /// Description
    #[serde(default)]
    pub description: Option<String>,
    /// Connection settings
    #[serde(default)]
    #[validate]
    pub config: ToolConfig,
    /// Whether agents may use the tool
    #[serde(default = "default_true")]
    pub is_active: bool,
    /// Owning project
    #[serde(default)]
    pub project_id: Option<String>,
}

/// Partial update of a [`Tool`]
#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct ToolPatch {
    /// New name
    #[serde(default)]
    #[validate(length(min = 1))]
    pub name: Option<String>,
    /// New integration name
    #[serde(default, rename = "type")]
    #[validate(length(min = 1))]
    pub tool_type: Option<String>,
    /// New description
    #[serde(default)]
    pub description: Option<String>,
    /// Replacement settings
    #[serde(default)]
    #[validate]
    pub config: Option<ToolConfig>,
    /// Enable or disable
    #[serde(default)]
    pub is_active: Option<bool>,
    /// Move to another project
    #[serde(default)]
    pub project_id: Option<String>,
}

impl Tool {
    /// Build a tool from its payload
    pub fn create(new: NewTool) -> Self {
        Self {
            id: new_id(new.id),
            name: new.name,
            tool_type: new.tool_type,
            description: new.description,
            config: new.config,
            is_active: new.is_active,
            project_id: new.project_id,
        }
    }

    /// Apply a patch
    pub fn apply(&mut self, patch: ToolPatch) {
        if let Some(name) = patch.name {
            self.name = name;
        }
        if let Some(tool_type) = patch.tool_type {
            self.tool_type = tool_type;
        }
        if let Some(description) = patch.description {
            self.description = Some(description);
        }
        if let Some(config) = patch.config {
            self.config = config;
        }
        if let Some(is_active) = patch.is_active {
            self.is_active = is_active;
        }
        if let Some(project_id) = patch.project_id {
            self.project_id = Some(project_id);
        }
    }
}

/// An AI agent definition
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Agent {
    /// Agent id
    pub id: String,
    /// Display name
    pub name: String,
    /// Agent family, e.g. `openai`
    #[serde(rename = "type")]
    pub agent_type: String,
    /// Free-text description
    pub description: Option<String>,
    /// LLM settings
    pub config: AgentConfig,
    /// Owning project
    pub project_id: Option<String>,
}

/// Payload creating an [`Agent`]
#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct NewAgent {
    /// Fixed id, for seeding
    #[serde(skip)]
    pub id: Option<String>,
    /// Display name
    #[validate(length(min = 1))]
    pub name: String,
    /// Agent family
    #[serde(rename = "type")]
    #[validate(length(min = 1))]
    pub agent_type: String,
    /// Description
    #[serde(default)]
    pub description: Option<String>,
    /// LLM settings
    #[serde(default)]
    #[validate]
    pub config: AgentConfig,
    /// Owning project
    #[serde(default)]
    pub project_id: Option<String>,
}

/// Partial update of an [`Agent`]
#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct AgentPatch {
    /// New name
    #[serde(default)]
    #[validate(length(min = 1))]
    pub name: Option<String>,
    /// New agent family
    #[serde(default, rename = "type")]
    #[validate(length(min = 1))]
    pub agent_type: Option<String>,
    /// New description
    #[serde(default)]
    pub description: Option<String>,
    /// Replacement settings
    #[serde(default)]
    #[validate]
    pub config: Option<AgentConfig>,
    /// Move to another project
    #[serde(default)]
    pub project_id: Option<String>,
}

impl Agent {
    /// Build an agent from its payload
    pub fn create(new: NewAgent) -> Self {
        Self {
            id: new_id(new.id),
            name: new.name,
            agent_type: new.agent_type,
            description: new.description,
            config: new.config,
            project_id: new.project_id,
        }
    }

    /// Apply a patch
    pub fn apply(&mut self, patch: AgentPatch) {
        if let Some(name) = patch.name {
            self.name = name;
        }
        if let Some(agent_type) = patch.agent_type {
            self.agent_type = agent_type;
        }
        if let Some(description) = patch.description {
            self.description = Some(description);
        }
        if let Some(config) = patch.config {
            self.config = config;
        }
        if let Some(project_id) = patch.project_id {
            self.project_id = Some(project_id);
        }
    }
}

/// Lifecycle of a simulation run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RunStatus {
    /// Waiting for completion
    Running,
    /// Finished with results
    Completed,
    /// Finished without results
    Failed,
}

impl RunStatus {
    /// Lowercase name, as stored
    pub fn as_str(&self) -> &'static str {
        match self {
            RunStatus::Running => "running",
            RunStatus::Completed => "completed",
            RunStatus::Failed => "failed",
        }
    }
}

impl std::str::FromStr for RunStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "running" => Ok(RunStatus::Running),
            "completed" => Ok(RunStatus::Completed),
            "failed" => Ok(RunStatus::Failed),
            other => Err(format!("unknown run status: {}", other)),
        }
    }
}

/// A simulation of a stored scenario
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SimulationRun {
    /// Run id
    pub id: String,
    /// Simulated scenario
    pub scenario_id: Option<String>,
    /// Lifecycle state
    pub status: RunStatus,
    /// Headline figures, once completed
    pub results: Option<SimulationResult>,
    /// Metric values by name
    pub metrics: BTreeMap<String, f64>,
    /// Transcript
    pub logs: Vec<SimulationLog>,
    /// Start time
    pub started_at: DateTime<Utc>,
    /// Completion time
    pub completed_at: Option<DateTime<Utc>>,
}

/// Payload creating a [`SimulationRun`]
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct NewSimulationRun {
    /// Fixed id, for seeding
    #[serde(skip)]
    pub id: Option<String>,
    /// Simulated scenario
    #[serde(default)]
    pub scenario_id: Option<String>,
    /// Initial state
    pub status: RunStatus,
    /// Figures
    #[serde(default)]
    pub results: Option<SimulationResult>,
    /// Metric values
    #[serde(default)]
    pub metrics: BTreeMap<String, f64>,
    /// Transcript
    #[serde(default)]
    pub logs: Vec<SimulationLog>,
}

impl NewSimulationRun {
    /// A fresh `running` run of a scenario
    pub fn running(scenario_id: impl Into<String>) -> Self {
        Self {
            id: None,
            scenario_id: Some(scenario_id.into()),
            status: RunStatus::Running,
            results: None,
            metrics: BTreeMap::new(),
            logs: Vec::new(),
        }
    }
}

/// Partial update of a [`SimulationRun`]
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SimulationRunPatch {
    /// New state
    #[serde(default)]
    pub status: Option<RunStatus>,
    /// Figures
    #[serde(default)]
    pub results: Option<SimulationResult>,
    /// Metric values
    #[serde(default)]
    pub metrics: Option<BTreeMap<String, f64>>,
    /// Transcript
    #[serde(default)]
    pub logs: Option<Vec<SimulationLog>>,
    /// Completion time
    #[serde(default)]
    pub completed_at: Option<DateTime<Utc>>,
}

impl SimulationRun {
    /// Build a run from its payload
    pub fn create(new: NewSimulationRun) -> Self {
        Self {
            id: new_id(new.id),
            scenario_id: new.scenario_id,
            status: new.status,
            results: new.results,
            metrics: new.metrics,
            logs: new.logs,
            started_at: Utc::now(),
            completed_at: None,
        }
    }

    /// Apply a patch
    pub fn apply(&mut self, patch: SimulationRunPatch) {
        if let Some(status) = patch.status {
            self.status = status;
        }
        if let Some(results) = patch.results {
            self.results = Some(results);
        }
        if let Some(metrics) = patch.metrics {
            self.metrics = metrics;
        }
        if let Some(logs) = patch.logs {
            self.logs = logs;
        }
        if let Some(completed_at) = patch.completed_at {
            self.completed_at = Some(completed_at);
        }
    }
}

/// Patch marking a run completed with the canned figures
pub fn completed_run_patch(now: DateTime<Utc>) -> SimulationRunPatch {
    let results = SimulationResult::canned();
    SimulationRunPatch {
        status: Some(RunStatus::Completed),
        metrics: Some(results.metrics()),
        results: Some(results),
        logs: Some(SimulationLog::canned(now)),
        completed_at: Some(now),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::canvas::{NodeData, Position};
    use crate::component::{NodeConfig, NodeKind};
    use serde_json::json;

    #[test]
    fn test_new_project_ignores_wire_id() {
        let new: NewProject =
            serde_json::from_value(json!({"id": "sneaky", "name": "Helix"})).unwrap();
        assert!(new.id.is_none());
        let project = Project::create(new);
        assert_ne!(project.id, "sneaky");
        assert_eq!(project.created_at, project.updated_at);
    }

    #[test]
    fn test_empty_name_fails_validation() {
        let new = NewProject {
            name: String::new(),
            ..Default::default()
        };
        assert!(new.validate().is_err());
    }

    #[test]
    fn test_patch_touches_updated_at() {
        let mut project = Project::create(NewProject {
            name: "Helix".to_string(),
            ..Default::default()
        });
        let created = project.updated_at;
        project.apply(ProjectPatch {
            description: Some("AI Agent Platform".to_string()),
            ..Default::default()
        });
        assert_eq!(project.name, "Helix");
        assert_eq!(project.description.as_deref(), Some("AI Agent Platform"));
        assert!(project.updated_at >= created);
    }

    #[test]
    fn test_tool_defaults_active() {
        let new: NewTool = serde_json::from_value(json!({"name": "Outlook", "type": "outlook"}))
            .unwrap();
        let tool = Tool::create(new);
        assert!(tool.is_active);
        assert_eq!(serde_json::to_value(&tool).unwrap()["type"], json!("outlook"));
    }

    #[test]
    fn test_scenario_rejects_mismatched_node_config() {
        let mut data = NodeData::named("Agent");
        data.config = Some(NodeConfig::Tool(ToolConfig::default()));
        let new = NewScenario {
            name: "Flow".to_string(),
            nodes: vec![WorkflowNode::new("a", NodeKind::Actor, Position::default(), data)],
            ..Default::default()
        };
        assert!(new.validate().is_err());
    }

    #[test]
    fn test_completed_patch() {
        let mut run = SimulationRun::create(NewSimulationRun::running("s1"));
        assert_eq!(run.status, RunStatus::Running);
        run.apply(completed_run_patch(Utc::now()));
        assert_eq!(run.status, RunStatus::Completed);
        assert_eq!(run.metrics.get("completionRate"), Some(&94.0));
        assert_eq!(run.logs.len(), 2);
        assert!(run.completed_at.is_some());
    }
}
