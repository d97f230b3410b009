use axum::{
    async_trait,
    extract::FromRequestParts,
    http::{header::AUTHORIZATION, request::Parts, HeaderMap},
};
use tracing::warn;

use super::claims::GoogleClaims;
use crate::{error::ApiError, state::AppState};

/// Extracts and verifies the Google ID token, yielding the caller's claims.
pub struct AuthUser(pub GoogleClaims);

#[async_trait]
impl FromRequestParts<AppState> for AuthUser {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let token = bearer_token(&parts.headers).ok_or(ApiError::MissingBearerToken)?;

        match state.verifier.verify(token).await {
            Ok(claims) => Ok(AuthUser(claims)),
            Err(e) => {
                warn!(error = %e, "google token rejected");
                Err(ApiError::InvalidGoogleToken)
            }
        }
    }
}

/// `Authorization: Bearer <token>`, with an empty token treated as absent.
pub(crate) fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    let auth = headers.get(AUTHORIZATION)?.to_str().ok()?;
    let token = auth
        .strip_prefix("Bearer ")
        .or_else(|| auth.strip_prefix("bearer "))?
        .trim();
    (!token.is_empty()).then_some(token)
}
