//! Component vocabulary shared by the canvas and the stored catalog.
//!
//! Node kinds, actor types and the typed configuration each component kind
//! carries. Canvas nodes hold a [`NodeConfig`], stored agents and tools hold
//! an [`AgentConfig`] and a [`ToolConfig`] directly.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use validator::{Validate, ValidationErrors};

/// Kind of a canvas node. Fixed when the node is created.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NodeKind {
    /// Human, AI or system participant
    Actor,
    /// External integration such as a CRM or an LLM provider
    Tool,
    /// Routes work between actors
    Orchestrator,
    /// Starts a workflow
    Trigger,
    /// Scores outcomes for retraining
    Reward,
}

impl NodeKind {
    /// All kinds, in sidebar order
    pub const ALL: [NodeKind; 5] = [
        NodeKind::Actor,
        NodeKind::Tool,
        NodeKind::Orchestrator,
        NodeKind::Trigger,
        NodeKind::Reward,
    ];

    /// Lowercase name used on the wire
    pub fn as_str(&self) -> &'static str {
        match self {
            NodeKind::Actor => "actor",
            NodeKind::Tool => "tool",
            NodeKind::Orchestrator => "orchestrator",
            NodeKind::Trigger => "trigger",
            NodeKind::Reward => "reward",
        }
    }
}

impl fmt::Display for NodeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for NodeKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "actor" => Ok(NodeKind::Actor),
            "tool" => Ok(NodeKind::Tool),
            "orchestrator" => Ok(NodeKind::Orchestrator),
            "trigger" => Ok(NodeKind::Trigger),
            "reward" => Ok(NodeKind::Reward),
            other => Err(format!("unknown node kind: {}", other)),
        }
    }
}

/// Who an actor node represents
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActorType {
    /// A person
    Human,
    /// An AI agent
    Agent,
    /// An automated system
    System,
}

/// LLM settings of an agent
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct AgentConfig {
    /// LLM provider, e.g. `openai`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub provider: Option<String>,

    /// Model name
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,

    /// Sampling temperature
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[validate(range(min = 0.0, max = 2.0))]
    pub temperature: Option<f32>,

    /// Completion token limit
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[validate(range(min = 1))]
    pub max_tokens: Option<u32>,

    /// Tool ids the agent may call
    #[serde(default)]
    pub tools: Vec<String>,

    /// System prompt
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub system_prompt: Option<String>,
}

/// Connection settings of a tool
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct ToolConfig {
    /// Endpoint the tool talks to
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[validate(url)]
    pub api_endpoint: Option<String>,

    /// Request timeout
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[validate(range(min = 1))]
    pub timeout_secs: Option<u64>,
}

/// Routing settings of an orchestrator
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct OrchestratorConfig {
    /// Routing strategy name
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub strategy: Option<String>,
}

/// Start condition of a trigger
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct TriggerConfig {
    /// Event name that fires the trigger
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub event: Option<String>,

    /// Cron-style schedule
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub schedule: Option<String>,
}

/// Scoring settings of a reward
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct RewardConfig {
    /// Metric the reward scores
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metric: Option<String>,

    /// Relative weight
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[validate(range(min = 0.0, max = 1.0))]
    pub weight: Option<f64>,
}

/// Configuration of a canvas node, one variant per node kind
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum NodeConfig {
    /// Actor settings
    Actor(AgentConfig),
    /// Tool settings
    Tool(ToolConfig),
    /// Orchestrator settings
    Orchestrator(OrchestratorConfig),
    /// Trigger settings
    Trigger(TriggerConfig),
    /// Reward settings
    Reward(RewardConfig),
}

impl NodeConfig {
    /// Node kind this configuration belongs to
    pub fn kind(&self) -> NodeKind {
        match self {
            NodeConfig::Actor(_) => NodeKind::Actor,
            NodeConfig::Tool(_) => NodeKind::Tool,
            NodeConfig::Orchestrator(_) => NodeKind::Orchestrator,
            NodeConfig::Trigger(_) => NodeKind::Trigger,
            NodeConfig::Reward(_) => NodeKind::Reward,
        }
    }

    /// Empty configuration for a node kind
    pub fn default_for(kind: NodeKind) -> Self {
        match kind {
            NodeKind::Actor => NodeConfig::Actor(AgentConfig::default()),
            NodeKind::Tool => NodeConfig::Tool(ToolConfig::default()),
            NodeKind::Orchestrator => NodeConfig::Orchestrator(OrchestratorConfig::default()),
            NodeKind::Trigger => NodeConfig::Trigger(TriggerConfig::default()),
            NodeKind::Reward => NodeConfig::Reward(RewardConfig::default()),
        }
    }

    /// Whether this configuration may be attached to a node of `kind`
    pub fn fits(&self, kind: NodeKind) -> bool {
        self.kind() == kind
    }
}

impl Validate for NodeConfig {
    fn validate(&self) -> Result<(), ValidationErrors> {
        match self {
            NodeConfig::Actor(config) => config.validate(),
            NodeConfig::Tool(config) => config.validate(),
            NodeConfig::Orchestrator(config) => config.validate(),
            NodeConfig::Trigger(config) => config.validate(),
            NodeConfig::Reward(config) => config.validate(),
        }
    }
}
