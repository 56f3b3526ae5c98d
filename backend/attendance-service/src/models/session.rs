use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Device/session record. A fresh login deactivates all of a user's prior
/// sessions; inactive rows remain as history.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Session {
    #[serde(rename = "_id")]
    pub id: String,
    pub user_id: String,
    pub device: String,
    pub ip_address: Option<String>,
    #[serde(with = "bson::serde_helpers::chrono_datetime_as_bson_datetime")]
    pub last_login_at: DateTime<Utc>,
    pub active: bool,
}

impl Session {
    pub fn new(user_id: &str, device: &str, ip_address: Option<String>) -> Self {
        Self {
            id: String::new(),
            user_id: user_id.to_string(),
            device: device.to_string(),
            ip_address,
            last_login_at: Utc::now(),
            active: true,
        }
    }
}
