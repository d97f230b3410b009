use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;

use crate::meals::repo::NutritionRecord;

/// JSON form of an analysis request. Multipart and urlencoded bodies use the same field names.
#[derive(Debug, Default, Deserialize, ToSchema)]
pub struct AnalyzeMealRequest {
    /// Output language, e.g. `pt` or `en`. Defaults to `pt`.
    #[schema(example = "pt")]
    pub lang: Option<String>,
    /// Free-text meal description.
    #[schema(example = "comi 2 ovos")]
    pub text: Option<String>,
}

/// Model reply, stamped with the caller and the time of analysis.
#[derive(Debug, Serialize, ToSchema)]
pub struct AnalyzeMealResponse {
    #[schema(example = "1.0")]
    pub schema_version: String,
    pub user_id: String,
    #[schema(example = "2025-03-01T12:30:00Z")]
    pub datetime_utc: String,
    /// `language`, `items[]`, `totals`, `notes`, `overall_confidence`.
    #[schema(value_type = Object)]
    pub meal: serde_json::Value,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct MealRecordResponse {
    pub id: Uuid,
    pub lang: String,
    pub input_text: String,
    pub has_image: bool,
    pub calories: Option<f64>,
    pub carbs_g: Option<f64>,
    pub protein_g: Option<f64>,
    pub overall_confidence: Option<f64>,
    #[schema(value_type = Object)]
    pub result: serde_json::Value,
    #[serde(with = "time::serde::rfc3339")]
    #[schema(value_type = String, format = DateTime)]
    pub created_at: OffsetDateTime,
}

impl From<NutritionRecord> for MealRecordResponse {
    fn from(r: NutritionRecord) -> Self {
        Self {
            id: r.id,
            lang: r.lang,
            input_text: r.input_text,
            has_image: r.has_image,
            calories: r.calories,
            carbs_g: r.carbs_g,
            protein_g: r.protein_g,
            overall_confidence: r.overall_confidence,
            result: r.result,
            created_at: r.created_at,
        }
    }
}

#[derive(Debug, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct Pagination {
    /// 1..=100, default 20.
    #[serde(default = "default_limit")]
    pub limit: i64,
    #[serde(default)]
    pub offset: i64,
}

fn default_limit() -> i64 {
    20
}

impl Pagination {
    pub fn clamped(&self) -> (i64, i64) {
        (self.limit.clamp(1, 100), self.offset.max(0))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pagination_is_clamped() {
        assert_eq!(Pagination { limit: 0, offset: -5 }.clamped(), (1, 0));
        assert_eq!(Pagination { limit: 500, offset: 40 }.clamped(), (100, 40));
        assert_eq!(Pagination { limit: 20, offset: 0 }.clamped(), (20, 0));
    }

    #[test]
    fn record_response_uses_rfc3339_dates() {
        let response = MealRecordResponse {
            id: Uuid::nil(),
            lang: "pt".into(),
            input_text: "comi 2 ovos".into(),
            has_image: false,
            calories: Some(156.0),
            carbs_g: Some(1.2),
            protein_g: Some(12.6),
            overall_confidence: None,
            result: serde_json::json!({}),
            created_at: time::macros::datetime!(2025-03-01 12:30:00 UTC),
        };
        let json = serde_json::to_value(&response).unwrap();
        assert_eq!(json["created_at"], "2025-03-01T12:30:00Z");
        assert_eq!(json["overall_confidence"], serde_json::Value::Null);
    }
}
