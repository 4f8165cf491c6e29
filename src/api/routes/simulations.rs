//! Persisted simulation runs.
//!
//! A simulate request stores a `running` record and returns it at once; a
//! detached task marks it completed with the canned results after
//! [`ApiState::run_completion`].

use std::sync::Arc;
use std::time::Duration;

use axum::extract::{Path, State};
use axum::routing::{get, post};
use axum::{Json, Router};
use chrono::Utc;
use tracing::{error, info, warn};

use crate::api::error::{ApiError, ResultExt};
use crate::api::ApiState;
use crate::storage::{completed_run_patch, NewSimulationRun, SimulationRun, Storage};
use crate::telemetry::add_metric;

/// Simulate and run listing routes
pub fn router() -> Router<ApiState> {
    Router::new()
        .route("/scenarios/:id/simulate", post(simulate))
        .route("/scenarios/:id/simulation-runs", get(list_runs))
        .route("/simulation-runs/:id", get(get_run))
}

async fn simulate(
    State(state): State<ApiState>,
    Path(scenario_id): Path<String>,
) -> Result<Json<SimulationRun>, ApiError> {
    let scenario = state
        .storage
        .get_scenario(&scenario_id)
        .await
        .or_internal("start simulation")?
        .ok_or(ApiError::NotFound("Scenario"))?;

    let run = state
        .storage
        .create_simulation_run(NewSimulationRun::running(scenario.id))
        .await
        .or_internal("start simulation")?;

    info!("Started simulation run {} for scenario {}", run.id, scenario_id);
    spawn_completion(state.storage.clone(), run.id.clone(), state.run_completion);

    Ok(Json(run))
}

fn spawn_completion(storage: Arc<dyn Storage>, run_id: String, delay: Duration) {
    tokio::spawn(async move {
        tokio::time::sleep(delay).await;
        match storage
            .update_simulation_run(&run_id, completed_run_patch(Utc::now()))
            .await
        {
            Ok(Some(_)) => {
                info!("Simulation run {} completed", run_id);
                add_metric("simulation_run_completed", 1.0, &[("run_id", run_id)]);
            }
            Ok(None) => warn!("Simulation run {} disappeared before completion", run_id),
            Err(e) => error!("Failed to complete simulation run {}: {}", run_id, e),
        }
    });
}

async fn list_runs(
    State(state): State<ApiState>,
    Path(scenario_id): Path<String>,
) -> Result<Json<Vec<SimulationRun>>, ApiError> {
    let runs = state
        .storage
        .list_simulation_runs_by_scenario(&scenario_id)
        .await
        .or_internal("fetch simulation runs")?;
    Ok(Json(runs))
}

async fn get_run(
    State(state): State<ApiState>,
    Path(id): Path<String>,
) -> Result<Json<SimulationRun>, ApiError> {
    state
        .storage
        .get_simulation_run(&id)
        .await
        .or_internal("fetch simulation run")?
        .map(Json)
        .ok_or(ApiError::NotFound("Simulation run"))
}
