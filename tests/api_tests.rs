use std::sync::Arc;
use std::time::Duration;

use agent_designer::api::{router, ApiState};
use agent_designer::storage::{seed_demo_data, MemoryStorage, Storage};
use axum::body::{to_bytes, Body};
use axum::http::{header, Method, Request, StatusCode};
use axum::Router;
use serde_json::{json, Value};
use tower::ServiceExt;

async fn test_app() -> Router {
    let storage: Arc<dyn Storage> = Arc::new(MemoryStorage::new());
    seed_demo_data(storage.as_ref()).await.unwrap();
    router(ApiState::new(storage).with_run_completion(Duration::from_millis(50)))
}

async fn send(app: &Router, method: Method, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
    let request = Request::builder().method(method).uri(uri);
    let request = match body {
        Some(body) => request
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => request.body(Body::empty()).unwrap(),
    };

    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let value = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, value)
}

#[tokio::test]
async fn test_health() {
    let app = test_app().await;
    let (status, _) = send(&app, Method::GET, "/api/health", None).await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn test_project_crud() {
    let app = test_app().await;

    let (status, created) = send(
        &app,
        Method::POST,
        "/api/projects",
        Some(json!({ "name": "Atlas", "userId": "someone-else" })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(created["name"], "Atlas");
    assert_eq!(created["userId"], "demo-user");
    let id = created["id"].as_str().unwrap().to_string();

    let (status, projects) = send(&app, Method::GET, "/api/projects", None).await;
    assert_eq!(status, StatusCode::OK);
    let names: Vec<&str> = projects
        .as_array()
        .unwrap()
        .iter()
        .map(|p| p["name"].as_str().unwrap())
        .collect();
    assert_eq!(names, vec!["Helix", "Atlas"]);

    let (status, updated) = send(
        &app,
        Method::PUT,
        &format!("/api/projects/{}", id),
        Some(json!({ "description": "Second project" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(updated["name"], "Atlas");
    assert_eq!(updated["description"], "Second project");

    let (status, body) = send(&app, Method::DELETE, &format!("/api/projects/{}", id), None).await;
    assert_eq!(status, StatusCode::NO_CONTENT);
    assert_eq!(body, Value::Null);

    let (status, body) = send(&app, Method::GET, &format!("/api/projects/{}", id), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "Project not found");
}

#[tokio::test]
async fn test_missing_name_is_rejected() {
    let app = test_app().await;

    let (status, body) = send(&app, Method::POST, "/api/projects", Some(json!({}))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    let issues = body["error"].as_array().unwrap();
    assert_eq!(issues.len(), 1);
    assert_eq!(issues[0]["code"], "invalid_type");

    let (status, body) = send(
        &app,
        Method::POST,
        "/api/environments",
        Some(json!({ "name": "" })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"][0]["code"], "length");
    assert_eq!(body["error"][0]["path"], json!(["name"]));
}

#[tokio::test]
async fn test_malformed_json_is_bad_request() {
    let app = test_app().await;
    let request = Request::builder()
        .method(Method::POST)
        .uri("/api/projects")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from("{ not json"))
        .unwrap();

    let response = app.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_nested_config_issue_paths() {
    let app = test_app().await;

    let (status, body) = send(
        &app,
        Method::POST,
        "/api/agents",
        Some(json!({
            "name": "Closer",
            "type": "openai",
            "projectId": "demo-project",
            "config": { "temperature": 3.5 }
        })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"][0]["code"], "range");
    assert_eq!(body["error"][0]["path"], json!(["config", "temperature"]));

    let (status, body) = send(
        &app,
        Method::POST,
        "/api/tools",
        Some(json!({
            "name": "Slack",
            "type": "slack",
            "projectId": "demo-project",
            "config": { "apiEndpoint": "not a url" }
        })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"][0]["path"], json!(["config", "apiEndpoint"]));
}

#[tokio::test]
async fn test_catalog_is_scoped_by_project() {
    let app = test_app().await;

    let (status, tools) = send(&app, Method::GET, "/api/projects/demo-project/tools", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(tools.as_array().unwrap().len(), 4);

    let (status, agents) = send(&app, Method::GET, "/api/projects/demo-project/agents", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(agents[0]["name"], "SalesGPT");
    assert_eq!(agents[0]["type"], "openai");

    let (_, tools) = send(&app, Method::GET, "/api/projects/other/tools", None).await;
    assert_eq!(tools, json!([]));

    let (status, tool) = send(&app, Method::GET, "/api/tools/tool-outlook", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(tool["type"], "outlook");
    assert_eq!(tool["isActive"], true);

    let (status, _) = send(&app, Method::DELETE, "/api/agents/missing", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_simulate_completes_run() {
    let app = test_app().await;

    let (status, scenario) = send(
        &app,
        Method::POST,
        "/api/scenarios",
        Some(json!({
            "name": "Inbound lead",
            "projectId": "demo-project",
            "nodes": [{
                "id": "customer",
                "type": "actor",
                "position": { "x": 280.0, "y": 160.0 },
                "data": { "name": "Customer" }
            }],
            "edges": []
        })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    let scenario_id = scenario["id"].as_str().unwrap().to_string();

    let (status, run) = send(
        &app,
        Method::POST,
        &format!("/api/scenarios/{}/simulate", scenario_id),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(run["status"], "running");
    assert_eq!(run["scenarioId"], scenario_id.as_str());
    let run_id = run["id"].as_str().unwrap().to_string();

    tokio::time::sleep(Duration::from_millis(300)).await;

    let (status, run) = send(&app, Method::GET, &format!("/api/simulation-runs/{}", run_id), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(run["status"], "completed");
    assert_eq!(run["results"]["success"], true);
    assert_eq!(run["results"]["completionRate"].as_f64(), Some(94.0));
    assert_eq!(run["metrics"]["successRate"].as_f64(), Some(87.0));
    assert_eq!(run["logs"].as_array().unwrap().len(), 2);
    assert!(run["completedAt"].is_string());

    let (status, runs) = send(
        &app,
        Method::GET,
        &format!("/api/scenarios/{}/simulation-runs", scenario_id),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(runs.as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn test_simulate_unknown_scenario() {
    let app = test_app().await;
    let (status, body) = send(&app, Method::POST, "/api/scenarios/missing/simulate", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "Scenario not found");
}

#[tokio::test]
async fn test_update_scenario() {
    let app = test_app().await;

    let (status, scenario) = send(
        &app,
        Method::POST,
        "/api/scenarios",
        Some(json!({ "name": "Inbound lead", "projectId": "demo-project" })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    let id = scenario["id"].as_str().unwrap().to_string();

    let (status, updated) = send(
        &app,
        Method::PUT,
        &format!("/api/scenarios/{}", id),
        Some(json!({ "name": "Outbound lead" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(updated["id"], id.as_str());
    assert_eq!(updated["name"], "Outbound lead");
    assert_eq!(updated["projectId"], "demo-project");

    let (_, fetched) = send(&app, Method::GET, &format!("/api/scenarios/{}", id), None).await;
    assert_eq!(fetched["name"], "Outbound lead");

    let (status, body) = send(
        &app,
        Method::PUT,
        "/api/scenarios/missing",
        Some(json!({ "name": "Nobody" })),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "Scenario not found");
}

#[tokio::test]
async fn test_get_environment() {
    let app = test_app().await;

    let (status, environment) = send(&app, Method::GET, "/api/environments/env-production", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(environment["id"], "env-production");
    assert_eq!(environment["name"], "Production");

    let (status, body) = send(&app, Method::GET, "/api/environments/missing", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "Environment not found");
}
