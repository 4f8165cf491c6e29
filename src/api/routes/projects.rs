//! Project CRUD.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::routing::get;
use axum::{Json, Router};

use crate::api::error::{ApiError, ResultExt};
use crate::api::extract::ValidatedJson;
use crate::api::ApiState;
use crate::storage::{NewProject, Project, ProjectPatch, DEMO_USER_ID};

/// `/projects` routes
pub fn router() -> Router<ApiState> {
    Router::new()
        .route("/projects", get(list_projects).post(create_project))
        .route(
            "/projects/:id",
            get(get_project).put(update_project).delete(delete_project),
        )
}

async fn list_projects(State(state): State<ApiState>) -> Result<Json<Vec<Project>>, ApiError> {
    let projects = state
        .storage
        .list_projects_by_user(DEMO_USER_ID)
        .await
        .or_internal("fetch projects")?;
    Ok(Json(projects))
}

async fn get_project(
    State(state): State<ApiState>,
    Path(id): Path<String>,
) -> Result<Json<Project>, ApiError> {
    state
        .storage
        .get_project(&id)
        .await
        .or_internal("fetch project")?
        .map(Json)
        .ok_or(ApiError::NotFound("Project"))
}

async fn create_project(
    State(state): State<ApiState>,
    ValidatedJson(mut project): ValidatedJson<NewProject>,
) -> Result<(StatusCode, Json<Project>), ApiError> {
    project.user_id = Some(DEMO_USER_ID.to_string());
    let project = state
        .storage
        .create_project(project)
        .await
        .or_internal("create project")?;
    Ok((StatusCode::CREATED, Json(project)))
}

async fn update_project(
    State(state): State<ApiState>,
    Path(id): Path<String>,
    ValidatedJson(patch): ValidatedJson<ProjectPatch>,
) -> Result<Json<Project>, ApiError> {
    state
        .storage
        .update_project(&id, patch)
        .await
        .or_internal("update project")?
        .map(Json)
        .ok_or(ApiError::NotFound("Project"))
}

async fn delete_project(
    State(state): State<ApiState>,
    Path(id): Path<String>,
) -> Result<StatusCode, ApiError> {
    if state
        .storage
        .delete_project(&id)
        .await
        .or_internal("delete project")?
    {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(ApiError::NotFound("Project"))
    }
}
