use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("missing env var {0}")]
    Missing(&'static str),
    #[error("invalid value for env var {key}: {value}")]
    Invalid { key: &'static str, value: String },
    #[error("incomplete database config: missing {0}")]
    IncompleteDatabase(&'static str),
}

#[derive(Debug, Clone)]
pub struct OpenAiConfig {
    pub api_key: String,
    pub model: String,
    pub base_url: String,
    pub timeout_secs: u64,
}

#[derive(Debug, Clone)]
pub struct GoogleConfig {
    pub client_id: String,
    pub certs_url: String,
}

#[derive(Debug, Clone)]
pub struct DbConfig {
    pub host: String,
    pub port: u16,
    pub user: String,
    pub password: String,
    pub name: String,
}

#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub openai: OpenAiConfig,
    pub google: GoogleConfig,
    /// `None` disables persistence entirely.
    pub database: Option<DbConfig>,
    pub server: ServerConfig,
    pub reco_history_days: i32,
}

impl AppConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds the config from an arbitrary key lookup. Empty values count as unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        let required = |key: &'static str| get(key).ok_or(ConfigError::Missing(key));

        let openai = OpenAiConfig {
            api_key: required("OPENAI_API_KEY")?,
            model: get("OPENAI_MODEL").unwrap_or_else(|| "gpt-4.1-mini".into()),
            base_url: get("OPENAI_BASE_URL")
                .unwrap_or_else(|| "https://api.openai.com/v1".into())
                .trim_end_matches('/')
                .to_string(),
            timeout_secs: parse_or(&get, "OPENAI_TIMEOUT_SECS", 60)?,
        };

        let google = GoogleConfig {
            client_id: required("GOOGLE_CLIENT_ID")?,
            certs_url: get("GOOGLE_CERTS_URL")
                .unwrap_or_else(|| "https://www.googleapis.com/oauth2/v3/certs".into()),
        };

        let database = DbConfig::from_lookup(&get)?;

        let port_key = if get("PORT").is_some() { "PORT" } else { "APP_PORT" };
        let server = ServerConfig {
            host: get("APP_HOST").unwrap_or_else(|| "0.0.0.0".into()),
            port: parse_or(&get, port_key, 8080)?,
        };

        let reco_history_days = parse_or(&get, "RECO_HISTORY_DAYS", 30)?;
        if reco_history_days <= 0 {
            return Err(ConfigError::Invalid {
                key: "RECO_HISTORY_DAYS",
                value: reco_history_days.to_string(),
            });
        }

        Ok(Self {
            openai,
            google,
            database,
            server,
            reco_history_days,
        })
    }
}

impl DbConfig {
    fn from_lookup<F>(get: &F) -> Result<Option<Self>, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let fields = (get("DB_HOST"), get("DB_USER"), get("DB_PASSWORD"), get("DB_NAME"));
        let (host, user, password, name) = match fields {
            (None, None, None, None) => return Ok(None),
            (Some(h), Some(u), Some(p), Some(n)) => (h, u, p, n),
            (None, ..) => return Err(ConfigError::IncompleteDatabase("DB_HOST")),
            (_, None, ..) => return Err(ConfigError::IncompleteDatabase("DB_USER")),
            (_, _, None, _) => return Err(ConfigError::IncompleteDatabase("DB_PASSWORD")),
            (.., None) => return Err(ConfigError::IncompleteDatabase("DB_NAME")),
        };

        Ok(Some(Self {
            host,
            port: parse_or(get, "DB_PORT", 5432)?,
            user,
            password,
            name,
        }))
    }
}

fn parse_or<F, T>(get: &F, key: &'static str, default: T) -> Result<T, ConfigError>
where
    F: Fn(&str) -> Option<String>,
    T: std::str::FromStr,
{
    match get(key) {
        None => Ok(default),
        Some(raw) => raw
            .trim()
            .parse::<T>()
            .map_err(|_| ConfigError::Invalid { key, value: raw }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |k: &str| map.get(k).cloned()
    }

    const BASE: [(&str, &str); 2] = [("OPENAI_API_KEY", "sk-test"), ("GOOGLE_CLIENT_ID", "client.apps")];

    #[test]
    fn defaults_without_database() {
        let cfg = AppConfig::from_lookup(lookup(&BASE)).expect("config");
        assert_eq!(cfg.openai.model, "gpt-4.1-mini");
        assert_eq!(cfg.openai.base_url, "https://api.openai.com/v1");
        assert_eq!(cfg.server.port, 8080);
        assert_eq!(cfg.reco_history_days, 30);
        assert!(cfg.database.is_none());
    }

    #[test]
    fn missing_api_key_is_an_error() {
        let err = AppConfig::from_lookup(lookup(&[("GOOGLE_CLIENT_ID", "x")])).unwrap_err();
        assert_eq!(err, ConfigError::Missing("OPENAI_API_KEY"));
    }

    #[test]
    fn missing_client_id_is_an_error() {
        let err = AppConfig::from_lookup(lookup(&[("OPENAI_API_KEY", "x")])).unwrap_err();
        assert_eq!(err, ConfigError::Missing("GOOGLE_CLIENT_ID"));
    }

    #[test]
    fn blank_values_count_as_missing() {
        let err = AppConfig::from_lookup(lookup(&[("OPENAI_API_KEY", "  "), ("GOOGLE_CLIENT_ID", "x")]))
            .unwrap_err();
        assert_eq!(err, ConfigError::Missing("OPENAI_API_KEY"));
    }

    #[test]
    fn full_database_config() {
        let mut pairs = BASE.to_vec();
        pairs.extend([
            ("DB_HOST", "db"),
            ("DB_USER", "app"),
            ("DB_PASSWORD", "secret"),
            ("DB_NAME", "meallens"),
            ("DB_PORT", "6543"),
        ]);
        let cfg = AppConfig::from_lookup(lookup(&pairs)).expect("config");
        let db = cfg.database.expect("database config");
        assert_eq!(db.host, "db");
        assert_eq!(db.port, 6543);
        assert_eq!(db.name, "meallens");
    }

    #[test]
    fn partial_database_config_is_rejected() {
        let mut pairs = BASE.to_vec();
        pairs.extend([("DB_HOST", "db"), ("DB_USER", "app")]);
        let err = AppConfig::from_lookup(lookup(&pairs)).unwrap_err();
        assert_eq!(err, ConfigError::IncompleteDatabase("DB_PASSWORD"));
    }

    #[test]
    fn port_overrides() {
        let mut pairs = BASE.to_vec();
        pairs.extend([("PORT", "9000"), ("APP_PORT", "7000"), ("OPENAI_MODEL", "gpt-4o")]);
        let cfg = AppConfig::from_lookup(lookup(&pairs)).expect("config");
        assert_eq!(cfg.server.port, 9000);
        assert_eq!(cfg.openai.model, "gpt-4o");

        let mut pairs = BASE.to_vec();
        pairs.push(("APP_PORT", "7000"));
        let cfg = AppConfig::from_lookup(lookup(&pairs)).expect("config");
        assert_eq!(cfg.server.port, 7000);
    }

    #[test]
    fn invalid_port_is_reported() {
        let mut pairs = BASE.to_vec();
        pairs.push(("PORT", "eighty"));
        let err = AppConfig::from_lookup(lookup(&pairs)).unwrap_err();
        assert_eq!(
            err,
            ConfigError::Invalid {
                key: "PORT",
                value: "eighty".into()
            }
        );
    }

    #[test]
    fn base_url_trailing_slash_is_trimmed() {
        let mut pairs = BASE.to_vec();
        pairs.push(("OPENAI_BASE_URL", "http://localhost:9999/v1/"));
        let cfg = AppConfig::from_lookup(lookup(&pairs)).expect("config");
        assert_eq!(cfg.openai.base_url, "http://localhost:9999/v1");
    }
}
