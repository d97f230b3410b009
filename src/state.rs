use std::sync::Arc;

use tracing::{info, warn};

use crate::ai::{ChatModel, OpenAiClient};
use crate::auth::{GoogleTokenVerifier, TokenVerifier};
use crate::config::AppConfig;
use crate::db::Database;

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    /// `None` when persistence is not configured.
    pub db: Option<Database>,
    pub verifier: Arc<dyn TokenVerifier>,
    pub model: Arc<dyn ChatModel>,
}

impl AppState {
    pub async fn init(config: AppConfig) -> anyhow::Result<Self> {
        let config = Arc::new(config);

        let db = match &config.database {
            Some(cfg) => {
                let db = Database::connect_lazy(cfg);
                if let Err(e) = db.bootstrap(cfg).await {
                    warn!(error = %e, host = %cfg.host, "database bootstrap failed; /api/health/db will report it");
                }
                Some(db)
            }
            None => {
                info!("DB_* not set; persistence disabled");
                None
            }
        };

        let verifier = Arc::new(GoogleTokenVerifier::new(&config.google)?) as Arc<dyn TokenVerifier>;
        let model = Arc::new(OpenAiClient::new(&config.openai)?) as Arc<dyn ChatModel>;

        Ok(Self::from_parts(config, db, verifier, model))
    }

    pub fn from_parts(
        config: Arc<AppConfig>,
        db: Option<Database>,
        verifier: Arc<dyn TokenVerifier>,
        model: Arc<dyn ChatModel>,
    ) -> Self {
        Self {
            config,
            db,
            verifier,
            model,
        }
    }
}
