use serde::{Deserialize, Serialize};

/// Verified Google ID token payload. `aud`, `iss` and `exp` are checked during decoding.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct GoogleClaims {
    pub sub: String,                  // stable Google account id
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub email_verified: Option<bool>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub picture: Option<String>,
    pub exp: usize,
}
