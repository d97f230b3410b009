use axum::{
    extract::{rejection::QueryRejection, Query, State},
    routing::{get, post},
    Json, Router,
};
use serde_json::Value;
use tracing::{error, info, instrument};

use super::{
    dto::{AnalyzeMealRequest, AnalyzeMealResponse, MealRecordResponse, Pagination},
    repo,
    services::{analyze_meal as run_analysis, record_analysis},
    submission::MealSubmission,
};
use crate::{
    auth::AuthUser,
    error::ApiError,
    state::AppState,
};

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/analyze-meal", post(analyze_meal))
        .route("/meals", get(list_meals))
}

/// Estimate calories, carbs and protein for a described or photographed meal.
#[utoipa::path(
    post,
    path = "/api/analyze-meal",
    request_body(
        content = AnalyzeMealRequest,
        description = "JSON body. multipart/form-data with the same fields plus an `image` file, \
                       and application/x-www-form-urlencoded, are accepted too."
    ),
    responses(
        (status = 200, description = "Nutrition estimate", body = AnalyzeMealResponse),
        (status = 400, description = "missing_text_or_image"),
        (status = 401, description = "missing_bearer_token or invalid_google_token"),
        (status = 413, description = "payload_too_large"),
        (status = 502, description = "upstream_error or model_returned_invalid_json")
    ),
    security(("google_id_token" = [])),
    tag = "meals"
)]
#[instrument(skip_all, fields(user_id = %claims.sub, lang = %submission.lang, has_image = submission.image.is_some()))]
pub async fn analyze_meal(
    State(state): State<AppState>,
    AuthUser(claims): AuthUser,
    submission: MealSubmission,
) -> Result<Json<Value>, ApiError> {
    let result = run_analysis(state.model.as_ref(), &claims, &submission).await?;

    if let Some(db) = &state.db {
        if let Err(e) = record_analysis(db, &claims, &submission, &result).await {
            error!(error = %e, "storing nutrition record failed; returning analysis anyway");
        }
    }

    info!("meal analysed");
    Ok(Json(result))
}

/// The caller's stored analyses, newest first.
#[utoipa::path(
    get,
    path = "/api/meals",
    params(Pagination),
    responses(
        (status = 200, description = "Stored analyses", body = [MealRecordResponse]),
        (status = 400, description = "invalid_query"),
        (status = 401, description = "missing_bearer_token or invalid_google_token"),
        (status = 503, description = "database_not_configured")
    ),
    security(("google_id_token" = [])),
    tag = "meals"
)]
#[instrument(skip_all, fields(user_id = %claims.sub))]
pub async fn list_meals(
    State(state): State<AppState>,
    AuthUser(claims): AuthUser,
    query: Result<Query<Pagination>, QueryRejection>,
) -> Result<Json<Vec<MealRecordResponse>>, ApiError> {
    let Query(p) = query.map_err(|e| ApiError::InvalidQuery(e.body_text()))?;
    let db = state.db.as_ref().ok_or(ApiError::DatabaseNotConfigured)?;
    db.ensure_schema().await?;

    let (limit, offset) = p.clamped();
    let records = repo::list_by_user(db.pool(), &claims.sub, limit, offset).await?;
    Ok(Json(records.into_iter().map(MealRecordResponse::from).collect()))
}
