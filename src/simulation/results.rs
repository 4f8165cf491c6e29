//! Mocked simulation and retrain outcomes.
//!
//! Nothing is executed; every run reports the same figures.

use chrono::{DateTime, Duration as ChronoDuration, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::collections::BTreeMap;

/// Headline figures of a simulation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SimulationResult {
    /// Whether the run succeeded
    pub success: bool,
    /// Share of conversations completed, in percent
    pub completion_rate: f64,
    /// Share of conversations reaching their goal, in percent
    pub success_rate: f64,
    /// Simulated run length in milliseconds
    pub duration: u64,
    /// Error messages, if any
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub errors: Option<Vec<String>>,
}

impl SimulationResult {
    /// The fixed figures every mocked run reports
    pub fn canned() -> Self {
        Self {
            success: true,
            completion_rate: 94.0,
            success_rate: 87.0,
            duration: 5000,
            errors: None,
        }
    }

    /// Figures as a metric map
    pub fn metrics(&self) -> BTreeMap<String, f64> {
        BTreeMap::from([
            ("completionRate".to_string(), self.completion_rate),
            ("successRate".to_string(), self.success_rate),
        ])
    }
}

/// Direction of a log entry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogKind {
    /// Message into a node
    Input,
    /// Message out of a node
    Output,
    /// Failure
    Error,
    /// Informational
    Info,
}

/// One entry of a simulation transcript
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SimulationLog {
    /// Entry id
    pub id: String,
    /// Unix time in milliseconds
    pub timestamp: i64,
    /// Node that produced the entry
    pub node_id: String,
    /// Entry direction
    #[serde(rename = "type")]
    pub kind: LogKind,
    /// Human readable message
    pub message: String,
    /// Payload
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
}

impl SimulationLog {
    /// The two-entry transcript every mocked run reports, starting at `started`
    pub fn canned(started: DateTime<Utc>) -> Vec<SimulationLog> {
        let start = started.timestamp_millis();
        vec![
            SimulationLog {
                id: "log-1".to_string(),
                timestamp: start,
                node_id: "customer".to_string(),
                kind: LogKind::Input,
                message: "Customer initiated contact".to_string(),
                data: Some(json!({
                    "message": "Hi, I'm interested in your product demo."
                })),
            },
            SimulationLog {
                id: "log-2".to_string(),
                timestamp: (started + ChronoDuration::milliseconds(2000)).timestamp_millis(),
                node_id: "sales-agent".to_string(),
                kind: LogKind::Output,
                message: "Sales Agent responded".to_string(),
                data: Some(json!({
                    "message": "I'd be happy to help! Let me check our available demo slots."
                })),
            },
        ]
    }
}

/// Outcome of a designer simulation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimulationReport {
    /// Headline figures
    #[serde(flatten)]
    pub result: SimulationResult,
    /// Transcript
    pub logs: Vec<SimulationLog>,
}

impl SimulationReport {
    /// Canned report for a run started at `started`
    pub fn canned(started: DateTime<Utc>) -> Self {
        Self {
            result: SimulationResult::canned(),
            logs: SimulationLog::canned(started),
        }
    }
}

/// Before/after figures of one metric
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Improvement {
    /// Metric name
    pub metric: String,
    /// Value before retraining
    pub before: f64,
    /// Value after retraining
    pub after: f64,
    /// Display unit
    pub unit: String,
    /// Relative change in percent, one decimal
    pub improvement: f64,
    /// Whether the change is for the better
    pub is_positive: bool,
}

impl Improvement {
    /// Build an improvement; `lower_is_better` flips the direction check
    pub fn new(metric: &str, before: f64, after: f64, unit: &str, lower_is_better: bool) -> Self {
        let improvement = if before == 0.0 {
            0.0
        } else {
            ((after - before).abs() / before * 1000.0).round() / 10.0
        };
        let is_positive = if lower_is_better {
            after < before
        } else {
            after > before
        };

        Self {
            metric: metric.to_string(),
            before,
            after,
            unit: unit.to_string(),
            improvement,
            is_positive,
        }
    }

    /// The four metrics every mocked retrain reports
    pub fn canned() -> Vec<Improvement> {
        vec![
            Improvement::new("Success Rate", 87.0, 94.0, "%", false),
            Improvement::new("Response Time", 2400.0, 1800.0, "ms", true),
            Improvement::new("Completion Rate", 92.0, 96.0, "%", false),
            Improvement::new("Error Rate", 8.5, 3.2, "%", true),
        ]
    }
}

/// Outcome of a retrain
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RetrainReport {
    /// Retrained agent
    pub agent_id: String,
    /// Training method
    pub method: String,
    /// Reward node used for scoring
    pub reward_id: String,
    /// Completion time
    pub completed_at: DateTime<Utc>,
    /// Metric changes
    pub improvements: Vec<Improvement>,
}
