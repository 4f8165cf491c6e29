//! Persistence for the REST layer.
//!
//! One [`Storage`] trait, two implementations: [`MemoryStorage`] for demos and
//! tests, [`SqliteStorage`] for anything that should survive a restart.
//! [`connect`] picks one from [`StorageSettings`].
//!
//! Lookups of missing records return `Ok(None)` (or `false` for deletes);
//! errors are reserved for backend failures.

use async_trait::async_trait;
use std::sync::Arc;
use tracing::info;

use crate::config::{StorageBackend, StorageSettings};
use crate::error::Result;

pub mod memory;
pub mod models;
pub mod seed;
pub mod sqlite;

pub use memory::MemoryStorage;
pub use models::*;
pub use seed::{seed_demo_data, DEMO_USER_ID};
pub use sqlite::SqliteStorage;

/// Record store behind the REST API
#[async_trait]
pub trait Storage: Send + Sync {
    // Users

    /// Look up a user
    async fn get_user(&self, id: &str) -> Result<Option<User>>;

    /// Look up a user by login name
    async fn get_user_by_username(&self, username: &str) -> Result<Option<User>>;

    /// Create a user
    async fn create_user(&self, user: NewUser) -> Result<User>;

    // Projects

    /// Look up a project
    async fn get_project(&self, id: &str) -> Result<Option<Project>>;

    /// Projects owned by a user, oldest first
    async fn list_projects_by_user(&self, user_id: &str) -> Result<Vec<Project>>;

    /// Create a project
    async fn create_project(&self, project: NewProject) -> Result<Project>;

    /// Patch a project
    async fn update_project(&self, id: &str, patch: ProjectPatch) -> Result<Option<Project>>;

    /// Delete a project. Returns whether it existed.
    async fn delete_project(&self, id: &str) -> Result<bool>;

    // Environments

    /// Look up an environment
    async fn get_environment(&self, id: &str) -> Result<Option<Environment>>;

    /// Environments owned by a user, oldest first
    async fn list_environments_by_user(&self, user_id: &str) -> Result<Vec<Environment>>;

    /// Create an environment
    async fn create_environment(&self, environment: NewEnvironment) -> Result<Environment>;

    /// Patch an environment
    async fn update_environment(
        &self,
        id: &str,
        patch: EnvironmentPatch,
    ) -> Result<Option<Environment>>;

    /// Delete an environment. Returns whether it existed.
    async fn delete_environment(&self, id: &str) -> Result<bool>;

    // Scenarios

    /// Look up a scenario
    async fn get_scenario(&self, id: &str) -> Result<Option<Scenario>>;

    /// Scenarios of a project, oldest first
    async fn list_scenarios_by_project(&self, project_id: &str) -> Result<Vec<Scenario>>;

    /// Create a scenario
    async fn create_scenario(&self, scenario: NewScenario) -> Result<Scenario>;

    /// Patch a scenario
    async fn update_scenario(&self, id: &str, patch: ScenarioPatch) -> Result<Option<Scenario>>;

    /// Delete a scenario. Returns whether it existed.
    async fn delete_scenario(&self, id: &str) -> Result<bool>;

    // Tools

    /// Look up a tool
    async fn get_tool(&self, id: &str) -> Result<Option<Tool>>;

    /// Tools of a project, in creation order
    async fn list_tools_by_project(&self, project_id: &str) -> Result<Vec<Tool>>;

    /// Create a tool
    async fn create_tool(&self, tool: NewTool) -> Result<Tool>;

    /// Patch a tool
    async fn update_tool(&self, id: &str, patch: ToolPatch) -> Result<Option<Tool>>;

    /// Delete a tool. Returns whether it existed.
    async fn delete_tool(&self, id: &str) -> Result<bool>;

    // Agents

    /// Look up an agent
    async fn get_agent(&self, id: &str) -> Result<Option<Agent>>;

    /// Agents of a project, in creation order
    async fn list_agents_by_project(&self, project_id: &str) -> Result<Vec<Agent>>;

    /// Create an agent
    async fn create_agent(&self, agent: NewAgent) -> Result<Agent>;

    /// Patch an agent
    async fn update_agent(&self, id: &str, patch: AgentPatch) -> Result<Option<Agent>>;

    /// Delete an agent. Returns whether it existed.
    async fn delete_agent(&self, id: &str) -> Result<bool>;

    // Simulation runs

    /// Look up a run
    async fn get_simulation_run(&self, id: &str) -> Result<Option<SimulationRun>>;

    /// Runs of a scenario, oldest first
    async fn list_simulation_runs_by_scenario(&self, scenario_id: &str)
        -> Result<Vec<SimulationRun>>;

    /// Create a run
    async fn create_simulation_run(&self, run: NewSimulationRun) -> Result<SimulationRun>;

    /// Patch a run
    async fn update_simulation_run(
        &self,
        id: &str,
        patch: SimulationRunPatch,
    ) -> Result<Option<SimulationRun>>;
}

/// Open the backend selected in `settings`
pub async fn connect(settings: &StorageSettings) -> Result<Arc<dyn Storage>> {
    let storage: Arc<dyn Storage> = match settings.backend {
        StorageBackend::Memory => {
            info!("Using in-memory storage");
            Arc::new(MemoryStorage::new())
        }
        StorageBackend::Sqlite => {
            info!("Using SQLite storage at {}", settings.path.display());
            Arc::new(SqliteStorage::open(&settings.path).await?)
        }
    };
    Ok(storage)
}
