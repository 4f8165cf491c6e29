use std::time::Duration;

use agent_designer::Error;
use agent_designer::canvas::{NodeData, Position, WorkflowEdge, WorkflowNode};
use agent_designer::component::NodeKind;
use agent_designer::storage::{
    completed_run_patch, seed_demo_data, MemoryStorage, NewEnvironment, NewProject, NewScenario,
    NewSimulationRun, NewUser, ProjectPatch, RunStatus, ScenarioPatch, SqliteStorage, Storage,
    DEMO_USER_ID,
};
use chrono::Utc;

async fn backends() -> Vec<(&'static str, Box<dyn Storage>)> {
    vec![
        ("memory", Box::new(MemoryStorage::new())),
        ("sqlite", Box::new(SqliteStorage::in_memory().await.unwrap())),
    ]
}

fn project(name: &str) -> NewProject {
    NewProject {
        name: name.to_string(),
        user_id: Some(DEMO_USER_ID.to_string()),
        ..Default::default()
    }
}

#[tokio::test]
async fn test_project_lifecycle() {
    for (backend, storage) in backends().await {
        let created = storage.create_project(project("Helix")).await.unwrap();
        assert_eq!(created.created_at, created.updated_at, "{}", backend);

        tokio::time::sleep(Duration::from_millis(5)).await;
        let updated = storage
            .update_project(
                &created.id,
                ProjectPatch {
                    description: Some("Agents".to_string()),
                    ..Default::default()
                },
            )
            .await
            .unwrap()
            .unwrap();
        assert_eq!(updated.name, "Helix", "{}", backend);
        assert_eq!(updated.description.as_deref(), Some("Agents"), "{}", backend);
        assert_eq!(updated.created_at, created.created_at, "{}", backend);
        assert!(updated.updated_at > created.updated_at, "{}", backend);

        let fetched = storage.get_project(&created.id).await.unwrap().unwrap();
        assert_eq!(fetched, updated, "{}", backend);

        assert!(storage.delete_project(&created.id).await.unwrap(), "{}", backend);
        assert!(!storage.delete_project(&created.id).await.unwrap(), "{}", backend);
        assert!(storage.get_project(&created.id).await.unwrap().is_none(), "{}", backend);
    }
}

#[tokio::test]
async fn test_lists_are_scoped_and_ordered() {
    for (backend, storage) in backends().await {
        for name in ["first", "second", "third"] {
            storage.create_project(project(name)).await.unwrap();
        }
        storage
            .create_project(NewProject {
                name: "foreign".to_string(),
                user_id: Some("someone-else".to_string()),
                ..Default::default()
            })
            .await
            .unwrap();

        let names: Vec<String> = storage
            .list_projects_by_user(DEMO_USER_ID)
            .await
            .unwrap()
            .into_iter()
            .map(|p| p.name)
            .collect();
        assert_eq!(names, vec!["first", "second", "third"], "{}", backend);
    }
}

#[tokio::test]
async fn test_scenario_graph_round_trip() {
    for (backend, storage) in backends().await {
        let nodes = vec![
            WorkflowNode::new(
                "customer",
                NodeKind::Actor,
                Position::new(280.0, 160.0),
                NodeData::named("Customer"),
            ),
            WorkflowNode::new(
                "crm",
                NodeKind::Tool,
                Position::new(480.0, 350.0),
                NodeData::named("CRM"),
            ),
        ];
        let edges = vec![WorkflowEdge::new("e1", "customer", "crm")];

        let scenario = storage
            .create_scenario(NewScenario {
                name: "Inbound lead".to_string(),
                project_id: Some("demo-project".to_string()),
                nodes: nodes.clone(),
                edges: edges.clone(),
                ..Default::default()
            })
            .await
            .unwrap();

        let fetched = storage.get_scenario(&scenario.id).await.unwrap().unwrap();
        assert_eq!(fetched.nodes, nodes, "{}", backend);
        assert_eq!(fetched.edges, edges, "{}", backend);

        let patched = storage
            .update_scenario(
                &scenario.id,
                ScenarioPatch {
                    edges: Some(Vec::new()),
                    ..Default::default()
                },
            )
            .await
            .unwrap()
            .unwrap();
        assert_eq!(patched.nodes, nodes, "{}", backend);
        assert!(patched.edges.is_empty(), "{}", backend);

        let listed = storage.list_scenarios_by_project("demo-project").await.unwrap();
        assert_eq!(listed.len(), 1, "{}", backend);
    }
}

#[tokio::test]
async fn test_simulation_run_completion() {
    for (backend, storage) in backends().await {
        let run = storage
            .create_simulation_run(NewSimulationRun::running("scenario-1"))
            .await
            .unwrap();
        assert_eq!(run.status, RunStatus::Running, "{}", backend);
        assert!(run.results.is_none(), "{}", backend);
        assert!(run.completed_at.is_none(), "{}", backend);

        let completed = storage
            .update_simulation_run(&run.id, completed_run_patch(Utc::now()))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(completed.status, RunStatus::Completed, "{}", backend);
        assert_eq!(completed.started_at, run.started_at, "{}", backend);
        assert!(completed.completed_at.is_some(), "{}", backend);
        assert_eq!(completed.metrics.get("completionRate"), Some(&94.0), "{}", backend);
        assert_eq!(completed.metrics.get("successRate"), Some(&87.0), "{}", backend);
        assert_eq!(completed.logs.len(), 2, "{}", backend);

        let runs = storage
            .list_simulation_runs_by_scenario("scenario-1")
            .await
            .unwrap();
        assert_eq!(runs, vec![completed], "{}", backend);
    }
}

#[tokio::test]
async fn test_seed_demo_data_on_every_backend() {
    for (backend, storage) in backends().await {
        assert!(seed_demo_data(storage.as_ref()).await.unwrap(), "{}", backend);
        assert!(!seed_demo_data(storage.as_ref()).await.unwrap(), "{}", backend);

        let user = storage.get_user_by_username("demo").await.unwrap().unwrap();
        assert_eq!(user.id, DEMO_USER_ID, "{}", backend);

        let projects = storage.list_projects_by_user(DEMO_USER_ID).await.unwrap();
        assert_eq!(projects.len(), 1, "{}", backend);
        assert_eq!(projects[0].name, "Helix", "{}", backend);

        let tools = storage.list_tools_by_project("demo-project").await.unwrap();
        let tool_ids: Vec<&str> = tools.iter().map(|t| t.id.as_str()).collect();
        assert_eq!(
            tool_ids,
            vec!["tool-outlook", "tool-calendar", "tool-salesforce", "tool-openai"],
            "{}",
            backend
        );
        assert!(tools.iter().all(|t| t.is_active), "{}", backend);

        let agent = storage.get_agent("agent-salesgpt").await.unwrap().unwrap();
        assert_eq!(agent.config.model.as_deref(), Some("gpt-4"), "{}", backend);
        assert_eq!(agent.config.tools.len(), 2, "{}", backend);
    }
}

#[tokio::test]
async fn test_environment_create_and_update() {
    for (backend, storage) in backends().await {
        let environment = storage
            .create_environment(NewEnvironment {
                name: "QA".to_string(),
                user_id: Some(DEMO_USER_ID.to_string()),
                ..Default::default()
            })
            .await
            .unwrap();
        assert!(!environment.id.is_empty(), "{}", backend);

        let listed = storage.list_environments_by_user(DEMO_USER_ID).await.unwrap();
        assert_eq!(listed, vec![environment], "{}", backend);
    }
}

#[tokio::test]
async fn test_duplicate_username_is_a_validation_error() {
    for (backend, storage) in backends().await {
        let user = NewUser {
            username: "ada".to_string(),
            password: "secret".to_string(),
            ..Default::default()
        };
        storage.create_user(user.clone()).await.unwrap();
        assert!(
            matches!(storage.create_user(user).await, Err(Error::Validation(_))),
            "{}",
            backend
        );
    }
}
