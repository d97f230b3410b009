//! Fakes for the token verifier and chat model seams.

use std::sync::{Arc, Mutex};

use async_trait::async_trait;

use crate::{
    ai::{ChatModel, ChatRequest, UpstreamError},
    auth::{GoogleClaims, TokenError, TokenVerifier},
    config::{AppConfig, DbConfig},
    db::Database,
    state::AppState,
};

const TOKEN_PREFIX: &str = "good:";

pub fn claims(sub: &str) -> GoogleClaims {
    GoogleClaims {
        sub: sub.into(),
        email: Some(format!("{sub}@example.com")),
        email_verified: Some(true),
        name: Some("Test User".into()),
        picture: None,
        exp: 4_102_444_800,
    }
}

/// A bearer token [`FakeVerifier`] accepts for `sub`.
pub fn token_for(sub: &str) -> String {
    format!("{TOKEN_PREFIX}{sub}")
}

pub struct FakeVerifier;

#[async_trait]
impl TokenVerifier for FakeVerifier {
    async fn verify(&self, token: &str) -> Result<GoogleClaims, TokenError> {
        token
            .strip_prefix(TOKEN_PREFIX)
            .filter(|sub| !sub.is_empty())
            .map(claims)
            .ok_or(TokenError::MissingKeyId)
    }
}

/// Replies with a fixed string (or fails) and records every request it sees.
pub struct FakeModel {
    reply: Option<String>,
    seen: Mutex<Vec<ChatRequest>>,
}

impl FakeModel {
    pub fn replying(reply: &str) -> Self {
        Self {
            reply: Some(reply.into()),
            seen: Mutex::new(Vec::new()),
        }
    }

    pub fn failing() -> Self {
        Self {
            reply: None,
            seen: Mutex::new(Vec::new()),
        }
    }

    pub fn requests(&self) -> Vec<ChatRequest> {
        self.seen.lock().unwrap().clone()
    }
}

#[async_trait]
impl ChatModel for FakeModel {
    async fn complete(&self, request: ChatRequest) -> Result<String, UpstreamError> {
        self.seen.lock().unwrap().push(request);
        self.reply.clone().ok_or(UpstreamError::Status {
            status: 500,
            body: "boom".into(),
        })
    }
}

pub fn config() -> AppConfig {
    AppConfig::from_lookup(|key: &str| match key {
        "OPENAI_API_KEY" => Some("sk-test".into()),
        "GOOGLE_CLIENT_ID" => Some("client-123.apps.googleusercontent.com".into()),
        _ => None,
    })
    .unwrap()
}

/// State without persistence.
pub fn state(model: Arc<FakeModel>) -> AppState {
    AppState::from_parts(Arc::new(config()), None, Arc::new(FakeVerifier), model)
}

/// State whose database points at a closed local port.
pub fn state_with_unreachable_db(model: Arc<FakeModel>) -> AppState {
    let db = Database::connect_lazy(&DbConfig {
        host: "127.0.0.1".into(),
        port: 1,
        user: "meallens".into(),
        password: "meallens".into(),
        name: "meallens".into(),
    });
    AppState::from_parts(Arc::new(config()), Some(db), Arc::new(FakeVerifier), model)
}
