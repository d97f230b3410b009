use axum::{extract::State, http::StatusCode, routing::get, Json, Router};
use serde::Serialize;
use tracing::warn;
use utoipa::ToSchema;

use crate::state::AppState;

#[derive(Debug, Serialize, ToSchema)]
pub struct HealthResponse {
    #[schema(example = true)]
    pub ok: bool,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct DbHealthResponse {
    pub ok: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    #[schema(example = "reachable")]
    pub database: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    #[schema(example = "database_unreachable")]
    pub error: Option<String>,
}

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/health", get(health))
        .route("/health/db", get(health_db))
}

/// Process liveness. Does not touch the database.
#[utoipa::path(
    get,
    path = "/api/health",
    responses((status = 200, description = "Process is up", body = HealthResponse)),
    tag = "health"
)]
pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse { ok: true })
}

/// Database connectivity.
#[utoipa::path(
    get,
    path = "/api/health/db",
    responses(
        (status = 200, description = "Database reachable", body = DbHealthResponse),
        (status = 503, description = "database_not_configured or database_unreachable", body = DbHealthResponse)
    ),
    tag = "health"
)]
pub async fn health_db(State(state): State<AppState>) -> (StatusCode, Json<DbHealthResponse>) {
    let failure = |error: &str| {
        (
            StatusCode::SERVICE_UNAVAILABLE,
            Json(DbHealthResponse {
                ok: false,
                database: None,
                error: Some(error.into()),
            }),
        )
    };

    let Some(db) = &state.db else {
        return failure("database_not_configured");
    };

    match db.ping().await {
        Ok(()) => (
            StatusCode::OK,
            Json(DbHealthResponse {
                ok: true,
                database: Some("reachable".into()),
                error: None,
            }),
        ),
        Err(e) => {
            warn!(error = %e, "database ping failed");
            failure("database_unreachable")
        }
    }
}
