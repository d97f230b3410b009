mod claims;
pub(crate) mod extractors;
mod google;

pub use claims::GoogleClaims;
pub use extractors::AuthUser;
pub use google::{GoogleTokenVerifier, TokenError, TokenVerifier};
