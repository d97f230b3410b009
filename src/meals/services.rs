use serde::Serialize;
use serde_json::Value;
use time::OffsetDateTime;
use tracing::info;
use uuid::Uuid;

use super::{
    repo::{self, DailyTotals, NewRecord},
    submission::MealSubmission,
};
use crate::{
    ai::{output, prompts, ChatModel, ChatRequest},
    auth::GoogleClaims,
    db::Database,
    error::ApiError,
};

/// Calls the model and stamps the reply. Shared by analysis and recommendations.
pub async fn ask_model(
    model: &dyn ChatModel,
    request: ChatRequest,
    user_id: &str,
) -> Result<Value, ApiError> {
    let raw = model.complete(request).await?;
    let Some(body) = output::parse_model_json(&raw) else {
        return Err(ApiError::ModelReturnedInvalidJson { raw });
    };
    Ok(output::finalize(body, user_id, OffsetDateTime::now_utc()))
}

pub async fn analyze_meal(
    model: &dyn ChatModel,
    claims: &GoogleClaims,
    submission: &MealSubmission,
) -> Result<Value, ApiError> {
    if submission.is_empty() {
        return Err(ApiError::MissingTextOrImage);
    }
    let request = prompts::analysis_request(
        &submission.text,
        &submission.lang,
        submission.image.as_ref(),
    );
    ask_model(model, request, &claims.sub).await
}

/// Stores the user and the analysis. Callers log failures instead of failing the request.
pub async fn record_analysis(
    db: &Database,
    claims: &GoogleClaims,
    submission: &MealSubmission,
    result: &Value,
) -> Result<Uuid, sqlx::Error> {
    db.ensure_schema().await?;
    let record = new_record(claims, submission, result);

    let mut tx = db.pool().begin().await?;
    repo::upsert_user_tx(&mut tx, claims).await?;
    let id = repo::insert_record_tx(&mut tx, &record).await?;
    tx.commit().await?;

    info!(record_id = %id, user_id = %claims.sub, "nutrition record stored");
    Ok(id)
}

fn new_record<'a>(
    claims: &'a GoogleClaims,
    submission: &'a MealSubmission,
    result: &'a Value,
) -> NewRecord<'a> {
    let meal = &result["meal"];
    let totals = &meal["totals"];
    NewRecord {
        user_id: &claims.sub,
        lang: &submission.lang,
        input_text: &submission.text,
        has_image: submission.image.is_some(),
        calories: totals["calories"].as_f64(),
        carbs_g: totals["carbs_g"].as_f64(),
        protein_g: totals["protein_g"].as_f64(),
        overall_confidence: meal["overall_confidence"].as_f64(),
        result,
    }
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct HistorySummary {
    pub days: i32,
    pub meals: i64,
    /// Averages are per logged day, over days that have at least one record.
    pub avg_calories: Option<f64>,
    pub avg_carbs_g: Option<f64>,
    pub avg_protein_g: Option<f64>,
    pub daily: Vec<DailyTotals>,
}

impl HistorySummary {
    pub fn from_daily(days: i32, daily: Vec<DailyTotals>) -> Self {
        let avg = |pick: fn(&DailyTotals) -> Option<f64>| {
            let values: Vec<f64> = daily.iter().filter_map(pick).collect();
            (!values.is_empty()).then(|| round1(values.iter().sum::<f64>() / values.len() as f64))
        };
        Self {
            days,
            meals: daily.iter().map(|d| d.meals).sum(),
            avg_calories: avg(|d| d.calories),
            avg_carbs_g: avg(|d| d.carbs_g),
            avg_protein_g: avg(|d| d.protein_g),
            daily,
        }
    }
}

fn round1(v: f64) -> f64 {
    (v * 10.0).round() / 10.0
}

pub async fn history_summary(
    db: &Database,
    user_id: &str,
    days: i32,
) -> Result<HistorySummary, sqlx::Error> {
    db.ensure_schema().await?;
    let daily = repo::daily_totals(db.pool(), user_id, days).await?;
    Ok(HistorySummary::from_daily(days, daily))
}
