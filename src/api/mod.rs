//! HTTP API consumed by the chat bot and by operators.

pub mod extract;
pub mod handlers;

use std::path::PathBuf;
use std::sync::Arc;

use axum::http::StatusCode;
use axum::response::{IntoResponse, Json, Response};
use axum::routing::{get, post};
use axum::Router;
use tokio::task::JoinHandle;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::{info, warn};

use crate::aggregator::Aggregator;
use crate::error::AppError;
use crate::monitoring::health::HealthState;

/// Shared state accessible by all route handlers.
#[derive(Clone)]
pub struct AppState {
    pub aggregator: Arc<Aggregator>,
    /// Configured leagues file, re-read on every bulk request.
    pub leagues_path: PathBuf,
    pub health: HealthState,
}

impl AppState {
    pub fn new(aggregator: Arc<Aggregator>, leagues_path: PathBuf, health: HealthState) -> Self {
        Self {
            aggregator,
            leagues_path,
            health,
        }
    }
}

pub fn create_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/", get(handlers::root))
        .route("/health", get(handlers::health))
        // Refresh endpoints
        .route("/bulk-update-standings", post(handlers::bulk_update_standings))
        .route("/manual-update-standings", post(handlers::manual_update_standings))
        .route(
            "/update-today-matches-for-all-leagues",
            post(handlers::update_today_matches_for_all_leagues),
        )
        .route(
            "/update-week-matches-for-all-leagues",
            post(handlers::update_week_matches_for_all_leagues),
        )
        .route("/update-team-statistics", post(handlers::update_team_statistics))
        // Views
        .route(
            "/today-quartile-matches/{league_id}/{season}",
            get(handlers::today_quartile_matches),
        )
        .route(
            "/week-quartile-matches/{league_id}/{season}",
            get(handlers::week_quartile_matches),
        )
        .route("/get-detailed-match-data/{match_id}", get(handlers::detailed_match_data))
        .route("/confrontos-filtrados", get(handlers::card_filtered_matches))
        .with_state(state)
        .layer(TraceLayer::new_for_http())
        .layer(cors)
}

/// Spawn the HTTP server. Returns a handle that can be aborted.
pub fn spawn_server(state: AppState, bind: &str, port: u16) -> JoinHandle<()> {
    let addr = format!("{bind}:{port}");

    tokio::spawn(async move {
        let app = create_router(state);

        let listener = match tokio::net::TcpListener::bind(&addr).await {
            Ok(l) => {
                info!(addr = %addr, "API server listening");
                l
            }
            Err(e) => {
                warn!(error = %e, addr = %addr, "Failed to bind API server");
                return;
            }
        };

        if let Err(e) = axum::serve(listener, app).await {
            warn!(error = %e, "API server error");
        }
    })
}

/// Error body: `{"detail": "..."}`.
#[derive(Debug)]
pub struct ApiError(pub AppError);

impl From<AppError> for ApiError {
    fn from(e: AppError) -> Self {
        Self(e)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match &self.0 {
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::InvalidInput(_) => StatusCode::BAD_REQUEST,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        };
        if status.is_server_error() {
            warn!(error = %self.0, "Request failed");
        }
        (status, Json(serde_json::json!({ "detail": self.0.to_string() }))).into_response()
    }
}
