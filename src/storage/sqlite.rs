//! SQLite-backed storage.
//!
//! One file, WAL mode. Nested values (graphs, configs, results, logs) are JSON
//! text columns; timestamps are RFC 3339 text.
//!
//! ```ignore
//! let storage = SqliteStorage::open("data/agent_designer.db").await?;
//! ```

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::Serialize;
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions, SqliteRow};
use sqlx::{Row, SqlitePool};
use std::path::Path;
use std::str::FromStr;
use tracing::debug;

use super::models::*;
use super::Storage;
use crate::error::{Error, Result};

const SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS users (
    id TEXT PRIMARY KEY,
    username TEXT NOT NULL UNIQUE,
    password TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS projects (
    id TEXT PRIMARY KEY,
    name TEXT NOT NULL,
    description TEXT,
    user_id TEXT,
    created_at TEXT NOT NULL,
    updated_at TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS projects_user_idx ON projects(user_id);

CREATE TABLE IF NOT EXISTS environments (
    id TEXT PRIMARY KEY,
    name TEXT NOT NULL,
    description TEXT,
    user_id TEXT,
    created_at TEXT NOT NULL,
    updated_at TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS environments_user_idx ON environments(user_id);

CREATE TABLE IF NOT EXISTS scenarios (
    id TEXT PRIMARY KEY,
    name TEXT NOT NULL,
    description TEXT,
    project_id TEXT,
    nodes TEXT NOT NULL,
    edges TEXT NOT NULL,
    created_at TEXT NOT NULL,
    updated_at TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS scenarios_project_idx ON scenarios(project_id);

CREATE TABLE IF NOT EXISTS tools (
    id TEXT PRIMARY KEY,
    name TEXT NOT NULL,
    type TEXT NOT NULL,
    description TEXT,
    config TEXT NOT NULL,
    is_active INTEGER NOT NULL,
    project_id TEXT,
    seq INTEGER NOT NULL
);

CREATE INDEX IF NOT EXISTS tools_project_idx ON tools(project_id);

CREATE TABLE IF NOT EXISTS agents (
    id TEXT PRIMARY KEY,
    name TEXT NOT NULL,
    type TEXT NOT NULL,
    description TEXT,
    config TEXT NOT NULL,
    project_id TEXT,
    seq INTEGER NOT NULL
);

CREATE INDEX IF NOT EXISTS agents_project_idx ON agents(project_id);

CREATE TABLE IF NOT EXISTS simulation_runs (
    id TEXT PRIMARY KEY,
    scenario_id TEXT,
    status TEXT NOT NULL,
    results TEXT,
    metrics TEXT NOT NULL,
    logs TEXT NOT NULL,
    started_at TEXT NOT NULL,
    completed_at TEXT
);

CREATE INDEX IF NOT EXISTS simulation_runs_scenario_idx ON simulation_runs(scenario_id);
"#;

/// Storage in a single SQLite file
#[derive(Debug, Clone)]
pub struct SqliteStorage {
    pool: SqlitePool,
}

impl SqliteStorage {
    /// Open (or create) the database at `path` and apply the schema.
    ///
    /// Parent directories are created as needed.
    pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                tokio::fs::create_dir_all(parent).await?;
            }
        }

        let options = SqliteConnectOptions::from_str(&format!("sqlite://{}", path.display()))?
            .journal_mode(SqliteJournalMode::Wal)
            .create_if_missing(true);

        let pool = SqlitePoolOptions::new()
            .max_connections(5)
            .connect_with(options)
            .await?;

        Self::with_pool(pool).await
    }

    /// A private in-memory database, for tests
    pub async fn in_memory() -> Result<Self> {
        // every connection to :memory: is its own database
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .idle_timeout(None)
            .max_lifetime(None)
            .connect("sqlite::memory:")
            .await?;

        Self::with_pool(pool).await
    }

    async fn with_pool(pool: SqlitePool) -> Result<Self> {
        sqlx::query(SCHEMA).execute(&pool).await?;
        debug!("SQLite schema ready");
        Ok(Self { pool })
    }

    async fn delete_from(&self, table: &str, id: &str) -> Result<bool> {
        let result = sqlx::query(&format!("DELETE FROM {} WHERE id = ?1", table))
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}

fn to_json<T: Serialize>(value: &T) -> Result<String> {
    Ok(serde_json::to_string(value)?)
}

fn from_json<T: DeserializeOwned>(text: &str) -> Result<T> {
    Ok(serde_json::from_str(text)?)
}

fn parse_dt(text: &str) -> Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(text)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| Error::Internal(format!("Invalid timestamp {}: {}", text, e)))
}

fn row_to_user(r: &SqliteRow) -> Result<User> {
    Ok(User {
        id: r.try_get("id")?,
        username: r.try_get("username")?,
        password: r.try_get("password")?,
    })
}

fn row_to_project(r: &SqliteRow) -> Result<Project> {
    Ok(Project {
        id: r.try_get("id")?,
        name: r.try_get("name")?,
        description: r.try_get("description")?,
        user_id: r.try_get("user_id")?,
        created_at: parse_dt(r.try_get("created_at")?)?,
        updated_at: parse_dt(r.try_get("updated_at")?)?,
    })
}

fn row_to_environment(r: &SqliteRow) -> Result<Environment> {
    Ok(Environment {
        id: r.try_get("id")?,
        name: r.try_get("name")?,
        description: r.try_get("description")?,
        user_id: r.try_get("user_id")?,
        created_at: parse_dt(r.try_get("created_at")?)?,
        updated_at: parse_dt(r.try_get("updated_at")?)?,
    })
}

fn row_to_scenario(r: &SqliteRow) -> Result<Scenario> {
    Ok(Scenario {
        id: r.try_get("id")?,
        name: r.try_get("name")?,
        description: r.try_get("description")?,
        project_id: r.try_get("project_id")?,
        nodes: from_json(r.try_get("nodes")?)?,
        edges: from_json(r.try_get("edges")?)?,
        created_at: parse_dt(r.try_get("created_at")?)?,
        updated_at: parse_dt(r.try_get("updated_at")?)?,
    })
}

fn row_to_tool(r: &SqliteRow) -> Result<Tool> {
    Ok(Tool {
        id: r.try_get("id")?,
        name: r.try_get("name")?,
        tool_type: r.try_get("type")?,
        description: r.try_get("description")?,
        config: from_json(r.try_get("config")?)?,
        is_active: r.try_get("is_active")?,
        project_id: r.try_get("project_id")?,
    })
}

fn row_to_agent(r: &SqliteRow) -> Result<Agent> {
    Ok(Agent {
        id: r.try_get("id")?,
        name: r.try_get("name")?,
        agent_type: r.try_get("type")?,
        description: r.try_get("description")?,
        config: from_json(r.try_get("config")?)?,
        project_id: r.try_get("project_id")?,
    })
}

fn row_to_simulation_run(r: &SqliteRow) -> Result<SimulationRun> {
    let status: String = r.try_get("status")?;
    let results: Option<String> = r.try_get("results")?;
    let completed_at: Option<String> = r.try_get("completed_at")?;

    Ok(SimulationRun {
        id: r.try_get("id")?,
        scenario_id: r.try_get("scenario_id")?,
        status: RunStatus::from_str(&status).map_err(Error::Internal)?,
        results: results.as_deref().map(from_json).transpose()?,
        metrics: from_json(r.try_get("metrics")?)?,
        logs: from_json(r.try_get("logs")?)?,
        started_at: parse_dt(r.try_get("started_at")?)?,
        completed_at: completed_at.as_deref().map(parse_dt).transpose()?,
    })
}

#[async_trait]
impl Storage for SqliteStorage {
    async fn get_user(&self, id: &str) -> Result<Option<User>> {
        sqlx::query("SELECT * FROM users WHERE id = ?1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .as_ref()
            .map(row_to_user)
            .transpose()
    }

    async fn get_user_by_username(&self, username: &str) -> Result<Option<User>> {
        sqlx::query("SELECT * FROM users WHERE username = ?1")
            .bind(username)
            .fetch_optional(&self.pool)
            .await?
            .as_ref()
            .map(row_to_user)
            .transpose()
    }

    async fn create_user(&self, user: NewUser) -> Result<User> {
        let user = User::create(user);
        sqlx::query("INSERT INTO users (id, username, password) VALUES (?1, ?2, ?3)")
            .bind(&user.id)
            .bind(&user.username)
            .bind(&user.password)
            .execute(&self.pool)
            .await
            .map_err(|e| match e {
                // username is UNIQUE
                sqlx::Error::Database(db) if db.is_unique_violation() => {
                    Error::Validation(format!("username {} is taken", user.username))
                }
                e => Error::Storage(e),
            })?;
        Ok(user)
    }

    async fn get_project(&self, id: &str) -> Result<Option<Project>> {
        sqlx::query("SELECT * FROM projects WHERE id = ?1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .as_ref()
            .map(row_to_project)
            .transpose()
    }

    async fn list_projects_by_user(&self, user_id: &str) -> Result<Vec<Project>> {
        sqlx::query("SELECT * FROM projects WHERE user_id = ?1 ORDER BY created_at, rowid")
            .bind(user_id)
            .fetch_all(&self.pool)
            .await?
            .iter()
            .map(row_to_project)
            .collect()
    }

    async fn create_project(&self, project: NewProject) -> Result<Project> {
        let project = Project::create(project);
        sqlx::query(
            "INSERT INTO projects (id, name, description, user_id, created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
        )
        .bind(&project.id)
        .bind(&project.name)
        .bind(&project.description)
        .bind(&project.user_id)
        .bind(project.created_at.to_rfc3339())
        .bind(project.updated_at.to_rfc3339())
        .execute(&self.pool)
        .await?;
        Ok(project)
    }

    async fn update_project(&self, id: &str, patch: ProjectPatch) -> Result<Option<Project>> {
        let Some(mut project) = self.get_project(id).await? else {
            return Ok(None);
        };
        project.apply(patch);

        sqlx::query(
            "UPDATE projects SET name = ?2, description = ?3, user_id = ?4, updated_at = ?5
             WHERE id = ?1",
        )
        .bind(&project.id)
        .bind(&project.name)
        .bind(&project.description)
        .bind(&project.user_id)
        .bind(project.updated_at.to_rfc3339())
        .execute(&self.pool)
        .await?;
        Ok(Some(project))
    }

    async fn delete_project(&self, id: &str) -> Result<bool> {
        self.delete_from("projects", id).await
    }

    async fn get_environment(&self, id: &str) -> Result<Option<Environment>> {
        sqlx::query("SELECT * FROM environments WHERE id = ?1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .as_ref()
            .map(row_to_environment)
            .transpose()
    }

    async fn list_environments_by_user(&self, user_id: &str) -> Result<Vec<Environment>> {
        sqlx::query("SELECT * FROM environments WHERE user_id = ?1 ORDER BY created_at, rowid")
            .bind(user_id)
            .fetch_all(&self.pool)
            .await?
            .iter()
            .map(row_to_environment)
            .collect()
    }

    async fn create_environment(&self, environment: NewEnvironment) -> Result<Environment> {
        let environment = Environment::create(environment);
        sqlx::query(
            "INSERT INTO environments (id, name, description, user_id, created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
        )
        .bind(&environment.id)
        .bind(&environment.name)
        .bind(&environment.description)
        .bind(&environment.user_id)
        .bind(environment.created_at.to_rfc3339())
        .bind(environment.updated_at.to_rfc3339())
        .execute(&self.pool)
        .await?;
        Ok(environment)
    }

    async fn update_environment(
        &self,
        id: &str,
        patch: EnvironmentPatch,
    ) -> Result<Option<Environment>> {
        let Some(mut environment) = self.get_environment(id).await? else {
            return Ok(None);
        };
        environment.apply(patch);

        sqlx::query(
            "UPDATE environments SET name = ?2, description = ?3, user_id = ?4, updated_at = ?5
             WHERE id = ?1",
        )
        .bind(&environment.id)
        .bind(&environment.name)
        .bind(&environment.description)
        .bind(&environment.user_id)
        .bind(environment.updated_at.to_rfc3339())
        .execute(&self.pool)
        .await?;
        Ok(Some(environment))
    }

    async fn delete_environment(&self, id: &str) -> Result<bool> {
        self.delete_from("environments", id).await
    }

    async fn get_scenario(&self, id: &str) -> Result<Option<Scenario>> {
        sqlx::query("SELECT * FROM scenarios WHERE id = ?1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .as_ref()
            .map(row_to_scenario)
            .transpose()
    }

    async fn list_scenarios_by_project(&self, project_id: &str) -> Result<Vec<Scenario>> {
        sqlx::query("SELECT * FROM scenarios WHERE project_id = ?1 ORDER BY created_at, rowid")
            .bind(project_id)
            .fetch_all(&self.pool)
            .await?
            .iter()
            .map(row_to_scenario)
            .collect()
    }

    async fn create_scenario(&self, scenario: NewScenario) -> Result<Scenario> {
        let scenario = Scenario::create(scenario);
        sqlx::query(
            "INSERT INTO scenarios
             (id, name, description, project_id, nodes, edges, created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
        )
        .bind(&scenario.id)
        .bind(&scenario.name)
        .bind(&scenario.description)
        .bind(&scenario.project_id)
        .bind(to_json(&scenario.nodes)?)
        .bind(to_json(&scenario.edges)?)
        .bind(scenario.created_at.to_rfc3339())
        .bind(scenario.updated_at.to_rfc3339())
        .execute(&self.pool)
        .await?;
        Ok(scenario)
    }

    async fn update_scenario(&self, id: &str, patch: ScenarioPatch) -> Result<Option<Scenario>> {
        let Some(mut scenario) = self.get_scenario(id).await? else {
            return Ok(None);
        };
        scenario.apply(patch);

        sqlx::query(
            "UPDATE scenarios SET name = ?2, description = ?3, project_id = ?4, nodes = ?5,
             edges = ?6, updated_at = ?7 WHERE id = ?1",
        )
        .bind(&scenario.id)
        .bind(&scenario.name)
        .bind(&scenario.description)
        .bind(&scenario.project_id)
        .bind(to_json(&scenario.nodes)?)
        .bind(to_json(&scenario.edges)?)
        .bind(scenario.updated_at.to_rfc3339())
        .execute(&self.pool)
        .await?;
        Ok(Some(scenario))
    }

    async fn delete_scenario(&self, id: &str) -> Result<bool> {
        self.delete_from("scenarios", id).await
    }

    async fn get_tool(&self, id: &str) -> Result<Option<Tool>> {
        sqlx::query("SELECT * FROM tools WHERE id = ?1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .as_ref()
            .map(row_to_tool)
            .transpose()
    }

    async fn list_tools_by_project(&self, project_id: &str) -> Result<Vec<Tool>> {
        sqlx::query("SELECT * FROM tools WHERE project_id = ?1 ORDER BY seq")
            .bind(project_id)
            .fetch_all(&self.pool)
            .await?
            .iter()
            .map(row_to_tool)
            .collect()
    }

    async fn create_tool(&self, tool: NewTool) -> Result<Tool> {
        let tool = Tool::create(tool);
        sqlx::query(
            "INSERT INTO tools (id, name, type, description, config, is_active, project_id, seq)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, (SELECT COALESCE(MAX(seq), 0) + 1 FROM tools))",
        )
        .bind(&tool.id)
        .bind(&tool.name)
        .bind(&tool.tool_type)
        .bind(&tool.description)
        .bind(to_json(&tool.config)?)
        .bind(tool.is_active)
        .bind(&tool.project_id)
        .execute(&self.pool)
        .await?;
        Ok(tool)
    }

    async fn update_tool(&self, id: &str, patch: ToolPatch) -> Result<Option<Tool>> {
        let Some(mut tool) = self.get_tool(id).await? else {
            return Ok(None);
        };
        tool.apply(patch);

        sqlx::query(
            "UPDATE tools SET name = ?2, type = ?3, description = ?4, config = ?5,
             is_active = ?6, project_id = ?7 WHERE id = ?1",
        )
        .bind(&tool.id)
        .bind(&tool.name)
        .bind(&tool.tool_type)
        .bind(&tool.description)
        .bind(to_json(&tool.config)?)
        .bind(tool.is_active)
        .bind(&tool.project_id)
        .execute(&self.pool)
        .await?;
        Ok(Some(tool))
    }

    async fn delete_tool(&self, id: &str) -> Result<bool> {
        self.delete_from("tools", id).await
    }

    async fn get_agent(&self, id: &str) -> Result<Option<Agent>> {
        sqlx::query("SELECT * FROM agents WHERE id = ?1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .as_ref()
            .map(row_to_agent)
            .transpose()
    }

    async fn list_agents_by_project(&self, project_id: &str) -> Result<Vec<Agent>> {
        sqlx::query("SELECT * FROM agents WHERE project_id = ?1 ORDER BY seq")
            .bind(project_id)
            .fetch_all(&self.pool)
            .await?
            .iter()
            .map(row_to_agent)
            .collect()
    }

    async fn create_agent(&self, agent: NewAgent) -> Result<Agent> {
        let agent = Agent::create(agent);
        sqlx::query(
            "INSERT INTO agents (id, name, type, description, config, project_id, seq)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, (SELECT COALESCE(MAX(seq), 0) + 1 FROM agents))",
        )
        .bind(&agent.id)
        .bind(&agent.name)
        .bind(&agent.agent_type)
        .bind(&agent.description)
        .bind(to_json(&agent.config)?)
        .bind(&agent.project_id)
        .execute(&self.pool)
        .await?;
        Ok(agent)
    }

    async fn update_agent(&self, id: &str, patch: AgentPatch) -> Result<Option<Agent>> {
        let Some(mut agent) = self.get_agent(id).await? else {
            return Ok(None);
        };
        agent.apply(patch);

        sqlx::query(
            "UPDATE agents SET name = ?2, type = ?3, description = ?4, config = ?5,
             project_id = ?6 WHERE id = ?1",
        )
        .bind(&agent.id)
        .bind(&agent.name)
        .bind(&agent.agent_type)
        .bind(&agent.description)
        .bind(to_json(&agent.config)?)
        .bind(&agent.project_id)
        .execute(&self.pool)
        .await?;
        Ok(Some(agent))
    }

    async fn delete_agent(&self, id: &str) -> Result<bool> {
        self.delete_from("agents", id).await
    }

    async fn get_simulation_run(&self, id: &str) -> Result<Option<SimulationRun>> {
        sqlx::query("SELECT * FROM simulation_runs WHERE id = ?1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .as_ref()
            .map(row_to_simulation_run)
            .transpose()
    }

    async fn list_simulation_runs_by_scenario(
        &self,
        scenario_id: &str,
    ) -> Result<Vec<SimulationRun>> {
        sqlx::query(
            "SELECT * FROM simulation_runs WHERE scenario_id = ?1 ORDER BY started_at, rowid",
        )
        .bind(scenario_id)
        .fetch_all(&self.pool)
        .await?
        .iter()
        .map(row_to_simulation_run)
        .collect()
    }

    async fn create_simulation_run(&self, run: NewSimulationRun) -> Result<SimulationRun> {
        let run = SimulationRun::create(run);
        sqlx::query(
            "INSERT INTO simulation_runs
             (id, scenario_id, status, results, metrics, logs, started_at, completed_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
        )
        .bind(&run.id)
        .bind(&run.scenario_id)
        .bind(run.status.as_str())
        .bind(run.results.as_ref().map(to_json).transpose()?)
        .bind(to_json(&run.metrics)?)
        .bind(to_json(&run.logs)?)
        .bind(run.started_at.to_rfc3339())
        .bind(run.completed_at.map(|dt| dt.to_rfc3339()))
        .execute(&self.pool)
        .await?;
        Ok(run)
    }

    async fn update_simulation_run(
        &self,
        id: &str,
        patch: SimulationRunPatch,
    ) -> Result<Option<SimulationRun>> {
        let Some(mut run) = self.get_simulation_run(id).await? else {
            return Ok(None);
        };
        run.apply(patch);

        sqlx::query(
            "UPDATE simulation_runs SET status = ?2, results = ?3, metrics = ?4, logs = ?5,
             completed_at = ?6 WHERE id = ?1",
        )
        .bind(&run.id)
        .bind(run.status.as_str())
        .bind(run.results.as_ref().map(to_json).transpose()?)
        .bind(to_json(&run.metrics)?)
        .bind(to_json(&run.logs)?)
        .bind(run.completed_at.map(|dt| dt.to_rfc3339()))
        .execute(&self.pool)
        .await?;
        Ok(Some(run))
    }
}
