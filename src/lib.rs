#![warn(missing_docs)]
#![warn(missing_debug_implementations)]
#![warn(rustdoc::missing_crate_level_docs)]
#![warn(rustdoc::broken_intra_doc_links)]
#![warn(rustdoc::private_intra_doc_links)]
#![warn(rustdoc::bare_urls)]

//! Agent Designer is the backend of a visual editor for AI agent workflows.
//! A workflow is a graph of actors, agents, tools, orchestrators, triggers
//! and rewards, kept per environment, with a simulated run that animates the
//! graph and a simulated retrain that reports canned improvements. A REST
//! layer persists projects, environments, scenarios, the tool and agent
//! catalog and simulation runs.
//!
//! ## Basic Usage
//!
//! ```rust,no_run
//! use agent_designer::canvas::{Connection, NewNode, NodeData, Position};
//! use agent_designer::component::NodeKind;
//! use agent_designer::Designer;
//!
//! #[tokio::main]
//! async fn main() -> agent_designer::Result<()> {
//!     let designer = Designer::default();
//!
//!     // The first environment visited gets the demo workflow
//!     designer.set_current_environment("env-production").await;
//!
//!     let id = designer
//!         .add_node(NewNode::new(NodeKind::Tool, NodeData::named("Slack")).at(Position::new(900.0, 200.0)))
//!         .await?
//!         .expect("environment is selected");
//!     designer.connect(Connection::new("sales-agent", id)).await;
//!
//!     let report = designer.run_simulation().await?;
//!     println!("completion rate: {}", report.result.completion_rate);
//!     Ok(())
//! }
//! ```

/// Error types
pub mod error;

/// Configuration management
pub mod config;

/// Structured logging and metric events
pub mod telemetry;

/// Component kinds and their configuration
pub mod component;

/// Per-environment workflow graphs
pub mod canvas;

/// Simulation timelines, animation flags and canned results
pub mod simulation;

/// Designer context tying the canvas, UI state and simulations together
pub mod designer;

/// Persistent records and storage backends
pub mod storage;

/// REST layer
pub mod api;

pub use config::Settings;
pub use designer::{Designer, DesignerEvent, UiState};
pub use error::{Error, Result};
pub use storage::Storage;

/// Re-export telemetry functions for easier access
pub use telemetry::{add_metric, add_metrics, init_telemetry, span_duration, TelemetryConfig};
