use axum::{
    body::Bytes,
    extract::{rejection::BytesRejection, State},
    routing::post,
    Json, Router,
};
use serde_json::{json, Value};
use tracing::{info, instrument, warn};

use super::dto::RecommendationRequest;
use crate::{
    ai::prompts,
    auth::AuthUser,
    error::{body_error, ApiError},
    meals::services::{ask_model, history_summary},
    state::AppState,
};

const STORED_HISTORY_KEY: &str = "stored_history";

pub fn routes() -> Router<AppState> {
    Router::new().route("/recommendations", post(recommendations))
}

/// Coaching suggestions from aggregated history and goals.
///
/// The body is passed to the model as-is. With persistence enabled the caller's
/// stored history summary is attached as `stored_history` unless already present.
#[utoipa::path(
    post,
    path = "/api/recommendations",
    request_body(content = RecommendationRequest, description = "Aggregated history and goals; any JSON is accepted"),
    responses(
        (status = 200, description = "Recommendations, insights and warnings"),
        (status = 401, description = "missing_bearer_token or invalid_google_token"),
        (status = 413, description = "payload_too_large"),
        (status = 502, description = "upstream_error or model_returned_invalid_json")
    ),
    security(("google_id_token" = [])),
    tag = "recommendations"
)]
#[instrument(skip_all, fields(user_id = %claims.sub))]
pub async fn recommendations(
    State(state): State<AppState>,
    AuthUser(claims): AuthUser,
    body: Result<Bytes, BytesRejection>,
) -> Result<Json<Value>, ApiError> {
    let body = body.map_err(|e| body_error(e.status(), e.body_text()))?;
    let mut payload = parse_payload(&body);

    if let (Some(db), Value::Object(map)) = (&state.db, &mut payload) {
        if !map.contains_key(STORED_HISTORY_KEY) {
            match history_summary(db, &claims.sub, state.config.reco_history_days).await {
                Ok(summary) => {
                    map.insert(STORED_HISTORY_KEY.into(), json!(summary));
                }
                Err(e) => warn!(error = %e, "stored history unavailable; continuing without it"),
            }
        }
    }

    let result = ask_model(
        state.model.as_ref(),
        prompts::recommendation_request(&payload),
        &claims.sub,
    )
    .await?;

    info!("recommendations generated");
    Ok(Json(result))
}

/// Missing, unparseable or `null` bodies become `{}`.
fn parse_payload(body: &[u8]) -> Value {
    match serde_json::from_slice::<Value>(body) {
        Ok(Value::Null) | Err(_) => json!({}),
        Ok(value) => value,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn payload_defaults_to_empty_object() {
        assert_eq!(parse_payload(b""), json!({}));
        assert_eq!(parse_payload(b"null"), json!({}));
        assert_eq!(parse_payload(b"{oops"), json!({}));
    }

    #[test]
    fn payload_is_passed_through() {
        let body = br#"{"history":[{"calories":1800}],"goals":{"protein_g":120}}"#;
        assert_eq!(
            parse_payload(body),
            json!({ "history": [{ "calories": 1800 }], "goals": { "protein_g": 120 } })
        );
        assert_eq!(parse_payload(b"[1,2]"), json!([1, 2]));
    }
}
