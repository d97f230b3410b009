use std::{sync::Arc, time::Duration};

use anyhow::Context;
use sqlx::{
    postgres::{PgConnectOptions, PgPoolOptions},
    Connection, PgConnection, PgPool,
};
use tokio::sync::OnceCell;
use tracing::{info, warn};

use crate::config::DbConfig;

/// Code-first schema, applied in order. Every statement is idempotent.
const SCHEMA: &[&str] = &[
    r#"
    CREATE TABLE IF NOT EXISTS app_users (
        google_sub   TEXT PRIMARY KEY,
        email        TEXT,
        name         TEXT,
        picture      TEXT,
        created_at   TIMESTAMPTZ NOT NULL DEFAULT now(),
        last_seen_at TIMESTAMPTZ NOT NULL DEFAULT now()
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS nutrition_records (
        id                 UUID PRIMARY KEY,
        user_id            TEXT NOT NULL REFERENCES app_users (google_sub),
        lang               TEXT NOT NULL,
        input_text         TEXT NOT NULL,
        has_image          BOOLEAN NOT NULL,
        calories           DOUBLE PRECISION,
        carbs_g            DOUBLE PRECISION,
        protein_g          DOUBLE PRECISION,
        overall_confidence DOUBLE PRECISION,
        result             JSONB NOT NULL,
        created_at         TIMESTAMPTZ NOT NULL DEFAULT now()
    )
    "#,
    r#"
    CREATE INDEX IF NOT EXISTS nutrition_records_user_created_idx
        ON nutrition_records (user_id, created_at DESC)
    "#,
];

#[derive(Clone)]
pub struct Database {
    pool: PgPool,
    schema: Arc<OnceCell<()>>,
}

impl Database {
    /// Builds the pool without touching the network; connections open on first use.
    pub fn connect_lazy(cfg: &DbConfig) -> Self {
        let pool = PgPoolOptions::new()
            .max_connections(10)
            .acquire_timeout(Duration::from_secs(3))
            .connect_lazy_with(connect_options(cfg).database(&cfg.name));
        Self {
            pool,
            schema: Arc::new(OnceCell::new()),
        }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Creates the database if missing, then the tables.
    pub async fn bootstrap(&self, cfg: &DbConfig) -> anyhow::Result<()> {
        if let Err(e) = ensure_database(cfg).await {
            warn!(error = %e, database = %cfg.name, "could not ensure database exists; assuming it does");
        }
        self.ensure_schema().await.context("create schema")?;
        Ok(())
    }

    /// Applies the schema once per process. Retried on the next call if it failed.
    pub async fn ensure_schema(&self) -> Result<(), sqlx::Error> {
        self.schema
            .get_or_try_init(|| async {
                for statement in SCHEMA {
                    sqlx::query(statement).execute(&self.pool).await?;
                }
                info!("database schema ready");
                Ok::<(), sqlx::Error>(())
            })
            .await
            .map(|_| ())
    }

    pub async fn ping(&self) -> Result<(), sqlx::Error> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }
}

fn connect_options(cfg: &DbConfig) -> PgConnectOptions {
    PgConnectOptions::new()
        .host(&cfg.host)
        .port(cfg.port)
        .username(&cfg.user)
        .password(&cfg.password)
}

async fn ensure_database(cfg: &DbConfig) -> anyhow::Result<()> {
    let mut conn = PgConnection::connect_with(&connect_options(cfg).database("postgres"))
        .await
        .context("connect to maintenance database")?;

    let exists: Option<i32> = sqlx::query_scalar("SELECT 1 FROM pg_database WHERE datname = $1")
        .bind(&cfg.name)
        .fetch_optional(&mut conn)
        .await
        .context("look up database")?;

    if exists.is_none() {
        let statement = format!("CREATE DATABASE {}", quote_ident(&cfg.name));
        sqlx::query(&statement)
            .execute(&mut conn)
            .await
            .with_context(|| format!("create database {}", cfg.name))?;
        info!(database = %cfg.name, "database created");
    }

    conn.close().await.context("close maintenance connection")?;
    Ok(())
}

/// Quotes a Postgres identifier; `CREATE DATABASE` cannot take a bind parameter.
fn quote_ident(name: &str) -> String {
    format!("\"{}\"", name.replace('"', "\"\""))
}
