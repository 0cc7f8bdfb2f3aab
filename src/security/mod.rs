use chrono::{DateTime, Utc};
use jsonwebtoken::{decode, DecodingKey, Validation};
use serde::{Deserialize, Serialize};

pub mod session;
pub mod storage;

pub use session::{Session, SessionStore, SessionUser, WhoAmI};
pub use storage::LocalStorage;

/// The only JWT claim the client looks at
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct ExpiryClaims {
    /// Expiration time (Unix timestamp)
    #[serde(default)]
    pub exp: Option<i64>,
}

/// Read a token's `exp` claim without verifying its signature.
///
/// The backend owns the signing key; this only lets a restored session be
/// dropped early when it has obviously expired. Opaque tokens return `None`.
pub fn token_expiry(token: &str) -> Option<DateTime<Utc>> {
    let mut validation = Validation::default();
    validation.insecure_disable_signature_validation();
    validation.validate_exp = false;
    validation.validate_aud = false;
    validation.required_spec_claims.clear();

    let data = decode::<ExpiryClaims>(token, &DecodingKey::from_secret(&[]), &validation).ok()?;
    data.claims
        .exp
        .and_then(|exp| DateTime::<Utc>::from_timestamp(exp, 0))
}

/// True only for tokens that carry an `exp` claim in the past
pub fn token_expired(token: &str, now: DateTime<Utc>) -> bool {
    token_expiry(token).map_or(false, |expiry| expiry <= now)
}
