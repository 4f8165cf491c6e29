//! REST layer over [`Storage`].
//!
//! Every route lives under `/api`. Records are owned by the demo user; there
//! is no authentication.

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use axum::http::StatusCode;
use axum::routing::get;
use axum::Router;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::config::SimulationSettings;
use crate::storage::Storage;

pub mod error;
pub mod extract;
pub mod routes;

pub use error::{ApiError, ValidationIssue};
pub use extract::ValidatedJson;

/// Shared handler state
#[derive(Clone)]
pub struct ApiState {
    /// Record storage
    pub storage: Arc<dyn Storage>,
    /// Delay before a simulate request marks its run completed
    pub run_completion: Duration,
}

impl ApiState {
    /// Create state with the default completion delay
    pub fn new(storage: Arc<dyn Storage>) -> Self {
        Self {
            storage,
            run_completion: SimulationSettings::default().run_completion(),
        }
    }

    /// Override the simulate completion delay
    pub fn with_run_completion(mut self, delay: Duration) -> Self {
        self.run_completion = delay;
        self
    }
}

impl fmt::Debug for ApiState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ApiState")
            .field("storage", &"<dyn Storage>")
            .field("run_completion", &self.run_completion)
            .finish()
    }
}

/// Build the application router
pub fn router(state: ApiState) -> Router {
    let api = Router::new()
        .route("/health", get(|| async { StatusCode::OK }))
        .merge(routes::projects::router())
        .merge(routes::environments::router())
        .merge(routes::scenarios::router())
        .merge(routes::catalog::router())
        .merge(routes::simulations::router());

    Router::new()
        .nest("/api", api)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}
