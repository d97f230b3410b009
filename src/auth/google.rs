use std::time::{Duration, Instant};

use anyhow::Context;
use async_trait::async_trait;
use jsonwebtoken::{decode, decode_header, jwk::JwkSet, Algorithm, DecodingKey, Validation};
use thiserror::Error;
use tokio::sync::RwLock;
use tracing::{debug, info, warn};

use super::claims::GoogleClaims;
use crate::config::GoogleConfig;

const GOOGLE_ISSUERS: [&str; 2] = ["accounts.google.com", "https://accounts.google.com"];
const DEFAULT_CERTS_TTL: Duration = Duration::from_secs(60 * 60);
/// Unknown `kid`s only trigger a refetch once the cached set is at least this old.
const MIN_REFETCH_INTERVAL: Duration = Duration::from_secs(60);

#[derive(Debug, Error)]
pub enum TokenError {
    #[error("malformed token: {0}")]
    Malformed(jsonwebtoken::errors::Error),
    #[error("unsupported algorithm {0:?}")]
    UnsupportedAlgorithm(Algorithm),
    #[error("token header has no kid")]
    MissingKeyId,
    #[error("no google cert for kid {0}")]
    UnknownKey(String),
    #[error("fetch google certs: {0}")]
    Certs(#[from] reqwest::Error),
    #[error("invalid token: {0}")]
    Invalid(jsonwebtoken::errors::Error),
}

#[async_trait]
pub trait TokenVerifier: Send + Sync {
    async fn verify(&self, token: &str) -> Result<GoogleClaims, TokenError>;
}

struct CachedCerts {
    keys: JwkSet,
    fetched_at: Instant,
    ttl: Duration,
}

impl CachedCerts {
    fn is_fresh(&self) -> bool {
        self.fetched_at.elapsed() < self.ttl
    }
}

/// Verifies Google ID tokens against Google's published JWKS.
pub struct GoogleTokenVerifier {
    http: reqwest::Client,
    certs_url: String,
    client_id: String,
    cache: RwLock<Option<CachedCerts>>,
}

impl GoogleTokenVerifier {
    pub fn new(cfg: &GoogleConfig) -> anyhow::Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(10))
            .build()
            .context("build google certs http client")?;
        Ok(Self {
            http,
            certs_url: cfg.certs_url.clone(),
            client_id: cfg.client_id.clone(),
            cache: RwLock::new(None),
        })
    }

    fn validation(&self) -> Validation {
        let mut validation = Validation::new(Algorithm::RS256);
        validation.set_audience(std::slice::from_ref(&self.client_id));
        validation.set_issuer(&GOOGLE_ISSUERS);
        validation
    }

    async fn key_for(&self, kid: &str) -> Result<DecodingKey, TokenError> {
        if let Some(answer) = cached_key(self.cache.read().await.as_ref(), kid) {
            return answer;
        }

        // Concurrent misses queue here; the first one refreshes for all of them.
        let mut cache = self.cache.write().await;
        if let Some(answer) = cached_key(cache.as_ref(), kid) {
            return answer;
        }

        match self.fetch_certs().await {
            Ok(fresh) => {
                let key = fresh
                    .keys
                    .find(kid)
                    .map(DecodingKey::from_jwk)
                    .transpose()
                    .map_err(TokenError::Invalid)?;
                *cache = Some(fresh);
                key.ok_or_else(|| TokenError::UnknownKey(kid.to_string()))
            }
            Err(e) => match cache.as_ref().and_then(|c| c.keys.find(kid)) {
                Some(jwk) => {
                    warn!(error = %e, kid, "google certs refresh failed; using cached key");
                    DecodingKey::from_jwk(jwk).map_err(TokenError::Invalid)
                }
                None => Err(e),
            },
        }
    }

    async fn fetch_certs(&self) -> Result<CachedCerts, TokenError> {
        let res = self
            .http
            .get(&self.certs_url)
            .send()
            .await?
            .error_for_status()?;
        let ttl = res
            .headers()
            .get(reqwest::header::CACHE_CONTROL)
            .and_then(|v| v.to_str().ok())
            .and_then(max_age)
            .unwrap_or(DEFAULT_CERTS_TTL);
        let keys: JwkSet = res.json().await?;
        info!(keys = keys.keys.len(), ttl_secs = ttl.as_secs(), "google certs refreshed");
        Ok(CachedCerts {
            keys,
            fetched_at: Instant::now(),
            ttl,
        })
    }

    #[cfg(test)]
    fn preloaded(cfg: &GoogleConfig, keys: JwkSet) -> Self {
        Self::preloaded_with_ttl(cfg, keys, DEFAULT_CERTS_TTL)
    }

    #[cfg(test)]
    fn preloaded_with_ttl(cfg: &GoogleConfig, keys: JwkSet, ttl: Duration) -> Self {
        let verifier = Self::new(cfg).expect("http client");
        *verifier.cache.try_write().expect("uncontended") = Some(CachedCerts {
            keys,
            fetched_at: Instant::now(),
            ttl,
        });
        verifier
    }
}

#[async_trait]
impl TokenVerifier for GoogleTokenVerifier {
    async fn verify(&self, token: &str) -> Result<GoogleClaims, TokenError> {
        let header = decode_header(token).map_err(TokenError::Malformed)?;
        if header.alg != Algorithm::RS256 {
            return Err(TokenError::UnsupportedAlgorithm(header.alg));
        }
        let kid = header.kid.ok_or(TokenError::MissingKeyId)?;
        let key = self.key_for(&kid).await?;

        let data = decode::<GoogleClaims>(token, &key, &self.validation()).map_err(TokenError::Invalid)?;
        debug!(sub = %data.claims.sub, "google id token verified");
        Ok(data.claims)
    }
}

/// Answers from the cache alone, or `None` when the certs must be refetched.
fn cached_key(cached: Option<&CachedCerts>, kid: &str) -> Option<Result<DecodingKey, TokenError>> {
    let cached = cached.filter(|c| c.is_fresh())?;
    match cached.keys.find(kid) {
        Some(jwk) => Some(DecodingKey::from_jwk(jwk).map_err(TokenError::Invalid)),
        None if cached.fetched_at.elapsed() < MIN_REFETCH_INTERVAL => {
            Some(Err(TokenError::UnknownKey(kid.to_string())))
        }
        None => None,
    }
}

/// Extracts `max-age` from a Cache-Control header value.
fn max_age(header: &str) -> Option<Duration> {
    header
        .split(',')
        .filter_map(|directive| directive.trim().strip_prefix("max-age="))
        .find_map(|secs| secs.trim().parse::<u64>().ok())
        .map(Duration::from_secs)
}
