use serde::Serialize;
use sqlx::{FromRow, PgPool, Postgres, Transaction};
use time::OffsetDateTime;
use uuid::Uuid;

use crate::auth::GoogleClaims;

#[derive(Debug, Clone, FromRow)]
pub struct NutritionRecord {
    pub id: Uuid,
    pub user_id: String,
    pub lang: String,
    pub input_text: String,
    pub has_image: bool,
    pub calories: Option<f64>,
    pub carbs_g: Option<f64>,
    pub protein_g: Option<f64>,
    pub overall_confidence: Option<f64>,
    pub result: serde_json::Value,
    pub created_at: OffsetDateTime,
}

/// Values for a fresh record; `id` and `created_at` are assigned on insert.
#[derive(Debug, Clone, PartialEq)]
pub struct NewRecord<'a> {
    pub user_id: &'a str,
    pub lang: &'a str,
    pub input_text: &'a str,
    pub has_image: bool,
    pub calories: Option<f64>,
    pub carbs_g: Option<f64>,
    pub protein_g: Option<f64>,
    pub overall_confidence: Option<f64>,
    pub result: &'a serde_json::Value,
}

#[derive(Debug, Clone, FromRow, Serialize, PartialEq)]
pub struct DailyTotals {
    pub day: String, // YYYY-MM-DD, UTC
    pub meals: i64,
    pub calories: Option<f64>,
    pub carbs_g: Option<f64>,
    pub protein_g: Option<f64>,
}

pub async fn upsert_user_tx(
    tx: &mut Transaction<'_, Postgres>,
    claims: &GoogleClaims,
) -> Result<(), sqlx::Error> {
    sqlx::query(
        r#"
        INSERT INTO app_users (google_sub, email, name, picture)
        VALUES ($1, $2, $3, $4)
        ON CONFLICT (google_sub) DO UPDATE
           SET email = EXCLUDED.email,
               name = EXCLUDED.name,
               picture = EXCLUDED.picture,
               last_seen_at = now()
        "#,
    )
    .bind(&claims.sub)
    .bind(&claims.email)
    .bind(&claims.name)
    .bind(&claims.picture)
    .execute(&mut **tx)
    .await?;
    Ok(())
}

pub async fn insert_record_tx(
    tx: &mut Transaction<'_, Postgres>,
    record: &NewRecord<'_>,
) -> Result<Uuid, sqlx::Error> {
    let id = Uuid::new_v4();
    sqlx::query(
        r#"
        INSERT INTO nutrition_records
            (id, user_id, lang, input_text, has_image,
             calories, carbs_g, protein_g, overall_confidence, result)
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
        "#,
    )
    .bind(id)
    .bind(record.user_id)
    .bind(record.lang)
    .bind(record.input_text)
    .bind(record.has_image)
    .bind(record.calories)
    .bind(record.carbs_g)
    .bind(record.protein_g)
    .bind(record.overall_confidence)
    .bind(sqlx::types::Json(record.result))
    .execute(&mut **tx)
    .await?;
    Ok(id)
}

pub async fn list_by_user(
    db: &PgPool,
    user_id: &str,
    limit: i64,
    offset: i64,
) -> Result<Vec<NutritionRecord>, sqlx::Error> {
    sqlx::query_as::<_, NutritionRecord>(
        r#"
        SELECT id, user_id, lang, input_text, has_image, calories, carbs_g,
               protein_g, overall_confidence, result, created_at
          FROM nutrition_records
         WHERE user_id = $1
         ORDER BY created_at DESC
         LIMIT $2 OFFSET $3
        "#,
    )
    .bind(user_id)
    .bind(limit)
    .bind(offset)
    .fetch_all(db)
    .await
}

/// Per-day sums over the last `days` days, oldest first.
pub async fn daily_totals(db: &PgPool, user_id: &str, days: i32) -> Result<Vec<DailyTotals>, sqlx::Error> {
    sqlx::query_as::<_, DailyTotals>(
        r#"
        SELECT to_char(date_trunc('day', created_at AT TIME ZONE 'UTC'), 'YYYY-MM-DD') AS day,
               COUNT(*)       AS meals,
               SUM(calories)  AS calories,
               SUM(carbs_g)   AS carbs_g,
               SUM(protein_g) AS protein_g
          FROM nutrition_records
         WHERE user_id = $1
           AND created_at >= now() - make_interval(days => $2)
         GROUP BY 1
         ORDER BY 1
        "#,
    )
    .bind(user_id)
    .bind(days)
    .fetch_all(db)
    .await
}
