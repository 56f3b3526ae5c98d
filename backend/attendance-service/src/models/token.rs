use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Bearer-token record keyed to one user.
///
/// `expired_at` is the refresh token's validity window. Records are revoked
/// on logout, re-login, and refresh rotation, never deleted; at most one
/// non-revoked record per user is treated as authoritative, but the store
/// does not enforce single-row replacement.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Token {
    #[serde(rename = "_id")]
    pub id: String,
    pub user_id: String,
    pub access_token: String,
    pub refresh_token: String,
    #[serde(with = "bson::serde_helpers::chrono_datetime_as_bson_datetime")]
    pub expired_at: DateTime<Utc>,
    #[serde(with = "bson::serde_helpers::chrono_datetime_as_bson_datetime")]
    pub created_at: DateTime<Utc>,
    pub revoked: bool,
}

impl Token {
    pub fn new(
        user_id: &str,
        access_token: &str,
        refresh_token: &str,
        expired_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id: String::new(),
            user_id: user_id.to_string(),
            access_token: access_token.to_string(),
            refresh_token: refresh_token.to_string(),
            expired_at,
            created_at: Utc::now(),
            revoked: false,
        }
    }

    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.expired_at <= now
    }
}
