//! Tool and agent catalog, scoped per project.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::{Json, Router};

use crate::api::error::{ApiError, ResultExt};
use crate::api::extract::ValidatedJson;
use crate::api::ApiState;
use crate::storage::{Agent, AgentPatch, NewAgent, NewTool, Tool, ToolPatch};

/// `/tools` and `/agents` routes
pub fn router() -> Router<ApiState> {
    Router::new()
        .route("/projects/:id/tools", get(list_tools))
        .route("/tools", post(create_tool))
        .route(
            "/tools/:id",
            get(get_tool).put(update_tool).delete(delete_tool),
        )
        .route("/projects/:id/agents", get(list_agents))
        .route("/agents", post(create_agent))
        .route(
            "/agents/:id",
            get(get_agent).put(update_agent).delete(delete_agent),
        )
}

async fn list_tools(
    State(state): State<ApiState>,
    Path(project_id): Path<String>,
) -> Result<Json<Vec<Tool>>, ApiError> {
    let tools = state
        .storage
        .list_tools_by_project(&project_id)
        .await
        .or_internal("fetch tools")?;
    Ok(Json(tools))
}

async fn get_tool(
    State(state): State<ApiState>,
    Path(id): Path<String>,
) -> Result<Json<Tool>, ApiError> {
    state
        .storage
        .get_tool(&id)
        .await
        .or_internal("fetch tool")?
        .map(Json)
        .ok_or(ApiError::NotFound("Tool"))
}

async fn create_tool(
    State(state): State<ApiState>,
    ValidatedJson(tool): ValidatedJson<NewTool>,
) -> Result<(StatusCode, Json<Tool>), ApiError> {
    let tool = state
        .storage
        .create_tool(tool)
        .await
        .or_internal("create tool")?;
    Ok((StatusCode::CREATED, Json(tool)))
}

async fn update_tool(
    State(state): State<ApiState>,
    Path(id): Path<String>,
    ValidatedJson(patch): ValidatedJson<ToolPatch>,
) -> Result<Json<Tool>, ApiError> {
    state
        .storage
        .update_tool(&id, patch)
        .await
        .or_internal("update tool")?
        .map(Json)
        .ok_or(ApiError::NotFound("Tool"))
}

async fn delete_tool(
    State(state): State<ApiState>,
    Path(id): Path<String>,
) -> Result<StatusCode, ApiError> {
    if state.storage.delete_tool(&id).await.or_internal("delete tool")? {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(ApiError::NotFound("Tool"))
    }
}

async fn list_agents(
    State(state): State<ApiState>,
    Path(project_id): Path<String>,
) -> Result<Json<Vec<Agent>>, ApiError> {
    let agents = state
        .storage
        .list_agents_by_project(&project_id)
        .await
        .or_internal("fetch agents")?;
    Ok(Json(agents))
}

async fn get_agent(
    State(state): State<ApiState>,
    Path(id): Path<String>,
) -> Result<Json<Agent>, ApiError> {
    state
        .storage
        .get_agent(&id)
        .await
        .or_internal("fetch agent")?
        .map(Json)
        .ok_or(ApiError::NotFound("Agent"))
}

async fn create_agent(
    State(state): State<ApiState>,
    ValidatedJson(agent): ValidatedJson<NewAgent>,
) -> Result<(StatusCode, Json<Agent>), ApiError> {
    let agent = state
        .storage
        .create_agent(agent)
        .await
        .or_internal("create agent")?;
    Ok((StatusCode::CREATED, Json(agent)))
}

async fn update_agent(
    State(state): State<ApiState>,
    Path(id): Path<String>,
    ValidatedJson(patch): ValidatedJson<AgentPatch>,
) -> Result<Json<Agent>, ApiError> {
    state
        .storage
        .update_agent(&id, patch)
        .await
        .or_internal("update agent")?
        .map(Json)
        .ok_or(ApiError::NotFound("Agent"))
}

async fn delete_agent(
    State(state): State<ApiState>,
    Path(id): Path<String>,
) -> Result<StatusCode, ApiError> {
    if state.storage.delete_agent(&id).await.or_internal("delete agent")? {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(ApiError::NotFound("Agent"))
    }
}
