/// Two-factor authentication lifecycle (TOTP)
use crate::error::{AuthError, Result};
use crate::security::{totp, SecretCodec};
use crate::store::UserStore;
use std::sync::Arc;
use tracing::{info, warn};

/// Two-factor authentication service.
///
/// A staged secret does not gate login until the user proves possession by
/// verifying one code; only then is `two_factor_enabled` flipped.
#[derive(Clone)]
pub struct TwoFaService {
    users: Arc<dyn UserStore>,
    codec: SecretCodec,
    issuer: String,
}

/// Response payload for initiating 2FA setup. The raw secret is shown to
/// the caller exactly once, for manual entry.
pub struct TwoFaSetup {
    pub secret: String,
    pub provisioning_uri: String,
}

impl TwoFaService {
    pub fn new(users: Arc<dyn UserStore>, codec: SecretCodec, issuer: impl Into<String>) -> Self {
        Self {
            users,
            codec,
            issuer: issuer.into(),
        }
    }

    /// Generate and stage a new secret without enabling 2FA.
    ///
    /// The secret is encrypted at rest; the provisioning URI is built for
    /// the user's email when present, falling back to username, then id.
    pub async fn setup(&self, user_id: &str) -> Result<TwoFaSetup> {
        let mut user = self
            .users
            .find_by_id(user_id)
            .await?
            .ok_or_else(|| AuthError::UserNotFound(user_id.to_string()))?;

        let secret = totp::generate_secret();

        let account = if !user.email.is_empty() {
            user.email.clone()
        } else if !user.username.is_empty() {
            user.username.clone()
        } else {
            user.id.clone()
        };
        let provisioning_uri = totp::provisioning_uri(&self.issuer, &account, &secret)?;

        user.two_factor_secret = Some(self.codec.encrypt(&secret)?);
        user.touch();
        self.users.save(user).await?;

        info!(user_id, "2FA secret staged");

        Ok(TwoFaSetup {
            secret,
            provisioning_uri,
        })
    }

    /// Confirm possession of the staged secret and enable 2FA.
    ///
    /// A wrong code is not an error; the caller may retry.
    pub async fn verify_and_enable(&self, user_id: &str, code: &str) -> Result<bool> {
        let mut user = self
            .users
            .find_by_id(user_id)
            .await?
            .ok_or_else(|| AuthError::UserNotFound(user_id.to_string()))?;

        let encrypted = user.two_factor_secret.clone().ok_or_else(|| {
            AuthError::InvalidState("No 2FA secret found. Please generate one first.".to_string())
        })?;
        let secret = self.codec.decrypt(&encrypted)?;

        if totp::verify(&secret, code)? {
            user.two_factor_enabled = true;
            user.touch();
            self.users.save(user).await?;
            info!(user_id, "2FA enabled");
            Ok(true)
        } else {
            warn!(user_id, "invalid 2FA code during enable");
            Ok(false)
        }
    }

    /// Verify a code for an already-enabled account; used at login
    pub async fn verify_code(&self, user_id: &str, code: &str) -> Result<bool> {
        let user = self
            .users
            .find_by_id(user_id)
            .await?
            .ok_or_else(|| AuthError::UserNotFound(user_id.to_string()))?;

        if !user.two_factor_enabled {
            warn!(user_id, "2FA verification attempted but not enabled");
            return Err(AuthError::InvalidState(
                "2FA is not enabled for this user".to_string(),
            ));
        }

        let encrypted = user
            .two_factor_secret
            .ok_or_else(|| AuthError::InvalidState("No 2FA secret found".to_string()))?;
        let secret = self.codec.decrypt(&encrypted)?;

        totp::verify(&secret, code)
    }

    /// Disable 2FA after verifying a current code; clears the stored secret
    pub async fn disable(&self, user_id: &str, code: &str) -> Result<bool> {
        let user = self
            .users
            .find_by_id(user_id)
            .await?
            .ok_or_else(|| AuthError::UserNotFound(user_id.to_string()))?;

        if !user.two_factor_enabled {
            warn!(user_id, "2FA disable attempted but not enabled");
            return Err(AuthError::InvalidState(
                "2FA is not enabled for this user".to_string(),
            ));
        }

        if !self.verify_code(user_id, code).await? {
            warn!(user_id, "invalid 2FA code during disable");
            return Ok(false);
        }

        let mut user = self
            .users
            .find_by_id(user_id)
            .await?
            .ok_or_else(|| AuthError::UserNotFound(user_id.to_string()))?;
        user.two_factor_enabled = false;
        user.two_factor_secret = None;
        user.touch();
        self.users.save(user).await?;

        info!(user_id, "2FA disabled");
        Ok(true)
    }
}
