//! Scenario CRUD. Nodes are validated against their kind on write.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::{Json, Router};

use crate::api::error::{ApiError, ResultExt};
use crate::api::extract::ValidatedJson;
use crate::api::ApiState;
use crate::storage::{NewScenario, Scenario, ScenarioPatch};

/// `/scenarios` routes and the per-project listing
pub fn router() -> Router<ApiState> {
    Router::new()
        .route("/projects/:id/scenarios", get(list_scenarios))
        .route("/scenarios", post(create_scenario))
        .route(
            "/scenarios/:id",
            get(get_scenario).put(update_scenario).delete(delete_scenario),
        )
}

async fn list_scenarios(
    State(state): State<ApiState>,
    Path(project_id): Path<String>,
) -> Result<Json<Vec<Scenario>>, ApiError> {
    let scenarios = state
        .storage
        .list_scenarios_by_project(&project_id)
        .await
        .or_internal("fetch scenarios")?;
    Ok(Json(scenarios))
}

async fn get_scenario(
    State(state): State<ApiState>,
    Path(id): Path<String>,
) -> Result<Json<Scenario>, ApiError> {
    state
        .storage
        .get_scenario(&id)
        .await
        .or_internal("fetch scenario")?
        .map(Json)
        .ok_or(ApiError::NotFound("Scenario"))
}

async fn create_scenario(
    State(state): State<ApiState>,
    ValidatedJson(scenario): ValidatedJson<NewScenario>,
) -> Result<(StatusCode, Json<Scenario>), ApiError> {
    let scenario = state
        .storage
        .create_scenario(scenario)
        .await
        .or_internal("create scenario")?;
    Ok((StatusCode::CREATED, Json(scenario)))
}

async fn update_scenario(
    State(state): State<ApiState>,
    Path(id): Path<String>,
    ValidatedJson(patch): ValidatedJson<ScenarioPatch>,
) -> Result<Json<Scenario>, ApiError> {
    state
        .storage
        .update_scenario(&id, patch)
        .await
        .or_internal("update scenario")?
        .map(Json)
        .ok_or(ApiError::NotFound("Scenario"))
}

async fn delete_scenario(
    State(state): State<ApiState>,
    Path(id): Path<String>,
) -> Result<StatusCode, ApiError> {
    if state
        .storage
        .delete_scenario(&id)
        .await
        .or_internal("delete scenario")?
    {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(ApiError::NotFound("Scenario"))
    }
}
