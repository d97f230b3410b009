use serde::Deserialize;
use serde_json::Value;
use utoipa::ToSchema;

/// Usual shape of a recommendation request. Any JSON is accepted and forwarded unchanged.
#[derive(Debug, Deserialize, ToSchema)]
pub struct RecommendationRequest {
    /// Aggregated meal history, e.g. per-day totals.
    #[schema(value_type = Object)]
    pub history: Option<Value>,
    /// Stated goals, e.g. `{"protein_g": 120}`.
    #[schema(value_type = Object)]
    pub goals: Option<Value>,
}
