//! Configuration management for the attendance service
//!
//! Settings come from environment variables, with a `.env` file loaded in
//! debug builds for local development.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::env;
use tracing::info;

/// Application settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Settings {
    pub server: ServerSettings,
    pub database: DatabaseSettings,
    pub jwt: JwtSettings,
    pub two_factor: TwoFactorSettings,
}

impl Settings {
    pub fn load() -> Result<Self> {
        if cfg!(debug_assertions) {
            dotenvy::dotenv().ok();
            info!("Loaded .env file for development");
        }

        Ok(Settings {
            server: ServerSettings::from_env()?,
            database: DatabaseSettings::from_env()?,
            jwt: JwtSettings::from_env()?,
            two_factor: TwoFactorSettings::from_env(),
        })
    }
}

/// HTTP server settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerSettings {
    pub addr: String,
}

impl ServerSettings {
    fn from_env() -> Result<Self> {
        Ok(Self {
            addr: env::var("SERVER_ADDR").unwrap_or_else(|_| "0.0.0.0:8080".to_string()),
        })
    }
}

/// MongoDB connection settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseSettings {
    pub url: String,
    pub database: String,
}

impl DatabaseSettings {
    fn from_env() -> Result<Self> {
        Ok(Self {
            url: env::var("MONGODB_URL").context("MONGODB_URL must be set")?,
            database: env::var("MONGODB_DATABASE").unwrap_or_else(|_| "attendance".to_string()),
        })
    }
}

/// Bearer token settings
///
/// Access tokens default to 15 minutes, refresh tokens to 7 days.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JwtSettings {
    pub secret: String,
    pub access_token_ttl_secs: i64,
    pub refresh_token_ttl_secs: i64,
}

impl JwtSettings {
    fn from_env() -> Result<Self> {
        Ok(Self {
            secret: env::var("JWT_SECRET").context("JWT_SECRET must be set")?,
            access_token_ttl_secs: env::var("JWT_ACCESS_TOKEN_TTL_SECS")
                .unwrap_or_else(|_| "900".to_string())
                .parse()
                .context("Invalid JWT_ACCESS_TOKEN_TTL_SECS")?,
            refresh_token_ttl_secs: env::var("JWT_REFRESH_TOKEN_TTL_SECS")
                .unwrap_or_else(|_| "604800".to_string())
                .parse()
                .context("Invalid JWT_REFRESH_TOKEN_TTL_SECS")?,
        })
    }
}

/// Two-factor authentication settings
///
/// `encryption_key` is optional: when unset, stored TOTP secrets are not
/// encrypted at rest and the secret codec logs a startup warning.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TwoFactorSettings {
    pub encryption_key: Option<String>,
    pub issuer: String,
}

impl TwoFactorSettings {
    fn from_env() -> Self {
        Self {
            encryption_key: env::var("TWO_FACTOR_ENCRYPTION_KEY")
                .ok()
                .filter(|k| !k.trim().is_empty()),
            issuer: env::var("TWO_FACTOR_ISSUER").unwrap_or_else(|_| "AttendanceAPI".to_string()),
        }
    }
}
