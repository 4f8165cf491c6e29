//! Environment CRUD.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::routing::get;
use axum::{Json, Router};

use crate::api::error::{ApiError, ResultExt};
use crate::api::extract::ValidatedJson;
use crate::api::ApiState;
use crate::storage::{Environment, EnvironmentPatch, NewEnvironment, DEMO_USER_ID};

/// `/environments` routes
pub fn router() -> Router<ApiState> {
    Router::new()
        .route("/environments", get(list_environments).post(create_environment))
        .route(
            "/environments/:id",
            get(get_environment)
                .put(update_environment)
                .delete(delete_environment),
        )
}

async fn list_environments(
    State(state): State<ApiState>,
) -> Result<Json<Vec<Environment>>, ApiError> {
    let environments = state
        .storage
        .list_environments_by_user(DEMO_USER_ID)
        .await
        .or_internal("fetch environments")?;
    Ok(Json(environments))
}

async fn get_environment(
    State(state): State<ApiState>,
    Path(id): Path<String>,
) -> Result<Json<Environment>, ApiError> {
    state
        .storage
        .get_environment(&id)
        .await
        .or_internal("fetch environment")?
        .map(Json)
        .ok_or(ApiError::NotFound("Environment"))
}

async fn create_environment(
    State(state): State<ApiState>,
    ValidatedJson(mut environment): ValidatedJson<NewEnvironment>,
) -> Result<(StatusCode, Json<Environment>), ApiError> {
    environment.user_id = Some(DEMO_USER_ID.to_string());
    let environment = state
        .storage
        .create_environment(environment)
        .await
        .or_internal("create environment")?;
    Ok((StatusCode::CREATED, Json(environment)))
}

async fn update_environment(
    State(state): State<ApiState>,
    Path(id): Path<String>,
    ValidatedJson(patch): ValidatedJson<EnvironmentPatch>,
) -> Result<Json<Environment>, ApiError> {
    state
        .storage
        .update_environment(&id, patch)
        .await
        .or_internal("update environment")?
        .map(Json)
        .ok_or(ApiError::NotFound("Environment"))
}

async fn delete_environment(
    State(state): State<ApiState>,
    Path(id): Path<String>,
) -> Result<StatusCode, ApiError> {
    if state
        .storage
        .delete_environment(&id)
        .await
        .or_internal("delete environment")?
    {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(ApiError::NotFound("Environment"))
    }
}
