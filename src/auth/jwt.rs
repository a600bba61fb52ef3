//! JWT issuance and validation for login sessions.
//!
//! Two token kinds are issued, distinguished by the `type` claim: short-lived
//! `access` tokens and long-lived `refresh` tokens. Decoding fails closed:
//! signature mismatch, malformed payload, or an expired `exp` all yield no
//! claims. The codec knows nothing about account state; callers cross-check
//! the kind and re-fetch the account.

use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};

use crate::config::AuthConfig;
use crate::errors::{Error, Result};

/// Token kind carried in the `type` claim.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TokenKind {
    Access,
    Refresh,
}

impl TokenKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            TokenKind::Access => "access",
            TokenKind::Refresh => "refresh",
        }
    }
}

impl std::fmt::Display for TokenKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// JWT claims structure.
///
/// Wire contract: `sub` is the account email, `exp` is Unix seconds, `type`
/// is `access` or `refresh`.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Claims {
    pub sub: String,
    pub exp: usize,
    #[serde(rename = "type")]
    pub kind: TokenKind,
}

/// A freshly issued access + refresh token pair.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenPair {
    pub access_token: String,
    pub refresh_token: String,
    pub token_type: String,
}

/// Signs and validates session tokens with a symmetric secret (HS256).
pub struct TokenCodec {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    validation: Validation,
    access_ttl: Duration,
    refresh_ttl: Duration,
}

impl TokenCodec {
    /// Create a codec from the auth configuration.
    pub fn new(config: &AuthConfig) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        // No leeway: `exp` is the only time-based invalidation mechanism, so
        // the deadline must be exact.
        validation.leeway = 0;

        Self {
            encoding_key: EncodingKey::from_secret(config.jwt_secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(config.jwt_secret.as_bytes()),
            validation,
            access_ttl: Duration::minutes(config.access_token_expire_minutes),
            refresh_ttl: Duration::days(config.refresh_token_expire_days),
        }
    }

    /// Issue an access token for the given subject.
    pub fn issue_access(&self, sub: &str) -> Result<String> {
        self.issue(sub, TokenKind::Access, self.access_ttl)
    }

    /// Issue a refresh token for the given subject.
    pub fn issue_refresh(&self, sub: &str) -> Result<String> {
        self.issue(sub, TokenKind::Refresh, self.refresh_ttl)
    }

    /// Issue a fresh access + refresh pair for the given subject.
    pub fn issue_pair(&self, sub: &str) -> Result<TokenPair> {
        Ok(TokenPair {
            access_token: self.issue_access(sub)?,
            refresh_token: self.issue_refresh(sub)?,
            token_type: "bearer".to_string(),
        })
    }

    fn issue(&self, sub: &str, kind: TokenKind, ttl: Duration) -> Result<String> {
        let exp = (Utc::now() + ttl).timestamp() as usize;
        let claims = Claims { sub: sub.to_string(), exp, kind };

        encode(&Header::default(), &claims, &self.encoding_key)
            .map_err(|err| Error::internal(format!("Failed to sign token: {}", err)))
    }

    /// Decode and verify a token, returning its claims.
    ///
    /// Returns `None` for any signature mismatch, malformed payload, or
    /// expired token; callers never see a partial result.
    pub fn decode(&self, token: &str) -> Option<Claims> {
        decode::<Claims>(token, &self.decoding_key, &self.validation)
            .map(|data| data.claims)
            .ok()
    }
}
