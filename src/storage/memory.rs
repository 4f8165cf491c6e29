//! In-memory storage. Contents are lost when the process exits.

use async_trait::async_trait;
use tokio::sync::RwLock;

use super::models::*;
use super::Storage;
use crate::error::{Error, Result};

trait Record {
    fn id(&self) -> &str;
}

macro_rules! impl_record {
    ($($ty:ty),*) => {
        $(impl Record for $ty {
            fn id(&self) -> &str {
                &self.id
            }
        })*
    };
}

impl_record!(User, Project, Environment, Scenario, Tool, Agent, SimulationRun);

/// Records in insertion order
#[derive(Debug)]
struct Table<T> {
    rows: Vec<T>,
}

impl<T> Default for Table<T> {
    fn default() -> Self {
        Self { rows: Vec::new() }
    }
}

impl<T: Record + Clone> Table<T> {
    fn get(&self, id: &str) -> Option<T> {
        self.rows.iter().find(|r| r.id() == id).cloned()
    }

    fn filter<F: Fn(&T) -> bool>(&self, f: F) -> Vec<T> {
        self.rows.iter().filter(|r| f(*r)).cloned().collect()
    }

    fn insert(&mut self, row: T) -> T {
        self.rows.retain(|r| r.id() != row.id());
        self.rows.push(row.clone());
        row
    }

    fn update<F: FnOnce(&mut T)>(&mut self, id: &str, f: F) -> Option<T> {
        let row = self.rows.iter_mut().find(|r| r.id() == id)?;
        f(row);
        Some(row.clone())
    }

    fn remove(&mut self, id: &str) -> bool {
        let before = self.rows.len();
        self.rows.retain(|r| r.id() != id);
        self.rows.len() != before
    }
}

#[derive(Debug, Default)]
struct Tables {
    users: Table<User>,
    projects: Table<Project>,
    environments: Table<Environment>,
    scenarios: Table<Scenario>,
    tools: Table<Tool>,
    agents: Table<Agent>,
    simulation_runs: Table<SimulationRun>,
}

/// Storage kept in process memory
#[derive(Debug, Default)]
pub struct MemoryStorage {
    tables: RwLock<Tables>,
}

impl MemoryStorage {
    /// Create an empty store
    pub fn new() -> Self {
        Self::default()
    }
}

fn owned_by(owner: &Option<String>, id: &str) -> bool {
    owner.as_deref() == Some(id)
}

#[async_trait]
impl Storage for MemoryStorage {
    async fn get_user(&self, id: &str) -> Result<Option<User>> {
        Ok(self.tables.read().await.users.get(id))
    }

    async fn get_user_by_username(&self, username: &str) -> Result<Option<User>> {
        let tables = self.tables.read().await;
        Ok(tables.users.rows.iter().find(|u| u.username == username).cloned())
    }

    async fn create_user(&self, user: NewUser) -> Result<User> {
        let mut tables = self.tables.write().await;
        if tables.users.rows.iter().any(|u| u.username == user.username) {
            return Err(Error::Validation(format!(
                "username {} is taken",
                user.username
            )));
        }
        Ok(tables.users.insert(User::create(user)))
    }

    async fn get_project(&self, id: &str) -> Result<Option<Project>> {
        Ok(self.tables.read().await.projects.get(id))
    }

    async fn list_projects_by_user(&self, user_id: &str) -> Result<Vec<Project>> {
        let tables = self.tables.read().await;
        Ok(tables.projects.filter(|p| owned_by(&p.user_id, user_id)))
    }

    async fn create_project(&self, project: NewProject) -> Result<Project> {
        let mut tables = self.tables.write().await;
        Ok(tables.projects.insert(Project::create(project)))
    }

    async fn update_project(&self, id: &str, patch: ProjectPatch) -> Result<Option<Project>> {
        let mut tables = self.tables.write().await;
        Ok(tables.projects.update(id, |p| p.apply(patch)))
    }

    async fn delete_project(&self, id: &str) -> Result<bool> {
        Ok(self.tables.write().await.projects.remove(id))
    }

    async fn get_environment(&self, id: &str) -> Result<Option<Environment>> {
        Ok(self.tables.read().await.environments.get(id))
    }

    async fn list_environments_by_user(&self, user_id: &str) -> Result<Vec<Environment>> {
        let tables = self.tables.read().await;
        Ok(tables.environments.filter(|e| owned_by(&e.user_id, user_id)))
    }

    async fn create_environment(&self, environment: NewEnvironment) -> Result<Environment> {
        let mut tables = self.tables.write().await;
        Ok(tables.environments.insert(Environment::create(environment)))
    }

    async fn update_environment(
        &self,
        id: &str,
        patch: EnvironmentPatch,
    ) -> Result<Option<Environment>> {
        let mut tables = self.tables.write().await;
        Ok(tables.environments.update(id, |e| e.apply(patch)))
    }

    async fn delete_environment(&self, id: &str) -> Result<bool> {
        Ok(self.tables.write().await.environments.remove(id))
    }

    async fn get_scenario(&self, id: &str) -> Result<Option<Scenario>> {
        Ok(self.tables.read().await.scenarios.get(id))
    }

    async fn list_scenarios_by_project(&self, project_id: &str) -> Result<Vec<Scenario>> {
        let tables = self.tables.read().await;
        Ok(tables.scenarios.filter(|s| owned_by(&s.project_id, project_id)))
    }

    async fn create_scenario(&self, scenario: NewScenario) -> Result<Scenario> {
        let mut tables = self.tables.write().await;
        Ok(tables.scenarios.insert(Scenario::create(scenario)))
    }

    async fn update_scenario(&self, id: &str, patch: ScenarioPatch) -> Result<Option<Scenario>> {
        let mut tables = self.tables.write().await;
        Ok(tables.scenarios.update(id, |s| s.apply(patch)))
    }

    async fn delete_scenario(&self, id: &str) -> Result<bool> {
        Ok(self.tables.write().await.scenarios.remove(id))
    }

    async fn get_tool(&self, id: &str) -> Result<Option<Tool>> {
        Ok(self.tables.read().await.tools.get(id))
    }

    async fn list_tools_by_project(&self, project_id: &str) -> Result<Vec<Tool>> {
        let tables = self.tables.read().await;
        Ok(tables.tools.filter(|t| owned_by(&t.project_id, project_id)))
    }

    async fn create_tool(&self, tool: NewTool) -> Result<Tool> {
        let mut tables = self.tables.write().await;
        Ok(tables.tools.insert(Tool::create(tool)))
    }

    async fn update_tool(&self, id: &str, patch: ToolPatch) -> Result<Option<Tool>> {
        let mut tables = self.tables.write().await;
        Ok(tables.tools.update(id, |t| t.apply(patch)))
    }

    async fn delete_tool(&self, id: &str) -> Result<bool> {
        Ok(self.tables.write().await.tools.remove(id))
    }

    async fn get_agent(&self, id: &str) -> Result<Option<Agent>> {
        Ok(self.tables.read().await.agents.get(id))
    }

    async fn list_agents_by_project(&self, project_id: &str) -> Result<Vec<Agent>> {
        let tables = self.tables.read().await;
        Ok(tables.agents.filter(|a| owned_by(&a.project_id, project_id)))
    }

    async fn create_agent(&self, agent: NewAgent) -> Result<Agent> {
        let mut tables = self.tables.write().await;
        Ok(tables.agents.insert(Agent::create(agent)))
    }

    async fn update_agent(&self, id: &str, patch: AgentPatch) -> Result<Option<Agent>> {
        let mut tables = self.tables.write().await;
        Ok(tables.agents.update(id, |a| a.apply(patch)))
    }

    async fn delete_agent(&self, id: &str) -> Result<bool> {
        Ok(self.tables.write().await.agents.remove(id))
    }

    async fn get_simulation_run(&self, id: &str) -> Result<Option<SimulationRun>> {
        Ok(self.tables.read().await.simulation_runs.get(id))
    }

    async fn list_simulation_runs_by_scenario(
        &self,
        scenario_id: &str,
    ) -> Result<Vec<SimulationRun>> {
        let tables = self.tables.read().await;
        Ok(tables
            .simulation_runs
            .filter(|r| owned_by(&r.scenario_id, scenario_id)))
    }

    async fn create_simulation_run(&self, run: NewSimulationRun) -> Result<SimulationRun> {
        let mut tables = self.tables.write().await;
        Ok(tables.simulation_runs.insert(SimulationRun::create(run)))
    }

    async fn update_simulation_run(
        &self,
        id: &str,
        patch: SimulationRunPatch,
    ) -> Result<Option<SimulationRun>> {
        let mut tables = self.tables.write().await;
        Ok(tables.simulation_runs.update(id, |r| r.apply(patch)))
    }
}
