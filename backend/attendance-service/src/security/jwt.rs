/// Bearer token issuance and validation
///
/// Self-contained JWTs signed with HMAC-SHA256: three dot-separated
/// base64url segments carrying `{sub, iat, exp, token_type}`. Malformed,
/// tampered, and expired tokens all validate the same way: invalid.
use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};

use crate::error::Result;

/// JWT claims: subject (user id), issue/expiry timestamps, token type
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String,
    pub iat: i64,
    pub exp: i64,
    pub token_type: String,
}

/// Signs and validates access/refresh tokens with a shared symmetric key,
/// read-only after construction.
#[derive(Clone)]
pub struct TokenIssuer {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    access_ttl: Duration,
    refresh_ttl: Duration,
}

impl TokenIssuer {
    pub fn new(secret: &str, access_ttl_secs: i64, refresh_ttl_secs: i64) -> Self {
        Self {
            encoding_key: EncodingKey::from_secret(secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
            access_ttl: Duration::seconds(access_ttl_secs),
            refresh_ttl: Duration::seconds(refresh_ttl_secs),
        }
    }

    /// Short-lived token for request authentication (default 15 minutes)
    pub fn issue_access_token(&self, user_id: &str) -> Result<String> {
        self.issue(user_id, self.access_ttl, "access")
    }

    /// Long-lived token for rotation (default 7 days)
    pub fn issue_refresh_token(&self, user_id: &str) -> Result<String> {
        self.issue(user_id, self.refresh_ttl, "refresh")
    }

    fn issue(&self, user_id: &str, ttl: Duration, token_type: &str) -> Result<String> {
        let now = Utc::now();
        let claims = Claims {
            sub: user_id.to_string(),
            iat: now.timestamp(),
            exp: (now + ttl).timestamp(),
            token_type: token_type.to_string(),
        };

        Ok(encode(&Header::default(), &claims, &self.encoding_key)?)
    }

    /// Signature and expiry check; never fails outward
    pub fn validate(&self, token: &str) -> bool {
        self.decode_claims(token).is_some()
    }

    /// Embedded subject, only when the signature and expiry check out
    pub fn extract_subject(&self, token: &str) -> Option<String> {
        self.decode_claims(token).map(|claims| claims.sub)
    }

    pub fn refresh_ttl(&self) -> Duration {
        self.refresh_ttl
    }

    fn decode_claims(&self, token: &str) -> Option<Claims> {
        let validation = Validation::new(Algorithm::HS256);
        decode::<Claims>(token, &self.decoding_key, &validation)
            .ok()
            .map(|data| data.claims)
    }
}
