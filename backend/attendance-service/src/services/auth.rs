/// Authentication orchestration: register, login, refresh rotation, logout
///
/// Holds no mutable state of its own; all durable state lives in the
/// credential store. Token/session infrastructure is optional: without it,
/// login still succeeds and simply issues no tokens (lightweight and test
/// deployments).
use crate::error::{AuthError, Result};
use crate::models::{Session, Token, UserView};
use crate::models::User;
use crate::security::{hash_password, verify_password, TokenIssuer};
use crate::services::TwoFaService;
use crate::store::{SessionStore, TokenStore, UserStore};
use chrono::Utc;
use std::sync::Arc;
use tracing::{info, warn};

const MIN_PASSWORD_LEN: usize = 8;

/// Token issuance and session tracking collaborators, bundled because they
/// are only ever configured together.
pub struct TokenInfrastructure {
    pub issuer: TokenIssuer,
    pub tokens: Arc<dyn TokenStore>,
    pub sessions: Arc<dyn SessionStore>,
}

/// Best-effort client context supplied by the boundary layer
#[derive(Debug, Clone, Default)]
pub struct ClientContext {
    pub device: Option<String>,
    pub ip_address: Option<String>,
}

/// Outcome of a login attempt. An account with 2FA enabled and no code
/// supplied yields `MfaRequired`: successful but incomplete, not an error.
#[derive(Debug)]
pub enum LoginOutcome {
    MfaRequired {
        user: UserView,
    },
    Authenticated {
        user: UserView,
        access_token: Option<String>,
        refresh_token: Option<String>,
    },
}

pub struct AuthService {
    users: Arc<dyn UserStore>,
    two_fa: TwoFaService,
    infra: Option<TokenInfrastructure>,
}

impl AuthService {
    /// Orchestrator without token/session infrastructure; login succeeds
    /// but issues no tokens, logout reports false.
    pub fn new(users: Arc<dyn UserStore>, two_fa: TwoFaService) -> Self {
        Self {
            users,
            two_fa,
            infra: None,
        }
    }

    pub fn with_infrastructure(
        users: Arc<dyn UserStore>,
        two_fa: TwoFaService,
        infra: TokenInfrastructure,
    ) -> Self {
        Self {
            users,
            two_fa,
            infra: Some(infra),
        }
    }

    pub fn two_fa(&self) -> &TwoFaService {
        &self.two_fa
    }

    /// Create a user with STUDENT defaults and a hashed password
    pub async fn register(&self, username: &str, password: &str) -> Result<UserView> {
        info!(username, "registration attempt");

        if self.users.find_by_username(username).await?.is_some() {
            warn!(username, "registration failed: username already exists");
            return Err(AuthError::UsernameExists(username.to_string()));
        }

        // Validate the raw password before hashing; the stored hash no
        // longer reflects its length.
        if password.trim().is_empty() {
            return Err(AuthError::Validation("Password is required".to_string()));
        }
        if password.len() < MIN_PASSWORD_LEN {
            return Err(AuthError::Validation(
                "Password must be at least 8 characters".to_string(),
            ));
        }

        let user = User::new(username, hash_password(password)?);
        user.validate()?;

        let saved = self.users.save(user).await?;
        info!(user_id = %saved.id, username = %saved.username, "user registered");
        Ok(saved.to_view())
    }

    /// Authenticate a user.
    ///
    /// Flow: credentials check, then the optional MFA step, then token and
    /// session issuance. On success all prior tokens are revoked and all
    /// prior sessions deactivated before the new pair is minted; both
    /// cleanups are best-effort and never block issuance.
    pub async fn login(
        &self,
        username: &str,
        password: &str,
        otp: Option<&str>,
        ctx: &ClientContext,
    ) -> Result<LoginOutcome> {
        info!(username, "login attempt");

        let user = match self.users.find_by_username(username).await? {
            Some(user) => user,
            None => {
                warn!(username, "login failed: user not found");
                return Err(AuthError::UserNotFound(username.to_string()));
            }
        };

        if !verify_password(password, &user.password_hash)? {
            warn!(username, "login failed: invalid credentials");
            return Err(AuthError::InvalidCredentials);
        }

        if user.two_factor_enabled {
            match otp {
                None => {
                    return Ok(LoginOutcome::MfaRequired {
                        user: user.to_view(),
                    })
                }
                Some(code) => {
                    if !self.two_fa.verify_code(&user.id, code).await? {
                        warn!(username, "login failed: invalid 2FA code");
                        return Err(AuthError::InvalidCredentials);
                    }
                }
            }
        }

        let (access_token, refresh_token) = match &self.infra {
            None => (None, None),
            Some(infra) => {
                if let Err(err) = infra.tokens.revoke_all(&user.id).await {
                    warn!(user_id = %user.id, error = %err, "failed to revoke prior tokens");
                }
                if let Err(err) = infra.sessions.invalidate_all(&user.id).await {
                    warn!(user_id = %user.id, error = %err, "failed to invalidate prior sessions");
                }

                let access = infra.issuer.issue_access_token(&user.id)?;
                let refresh = infra.issuer.issue_refresh_token(&user.id)?;

                infra
                    .tokens
                    .save(Token::new(
                        &user.id,
                        &access,
                        &refresh,
                        Utc::now() + infra.issuer.refresh_ttl(),
                    ))
                    .await?;

                let device = ctx.device.as_deref().unwrap_or("unknown");
                infra
                    .sessions
                    .save(Session::new(&user.id, device, ctx.ip_address.clone()))
                    .await?;

                (Some(access), Some(refresh))
            }
        };

        info!(user_id = %user.id, username, "login successful");
        Ok(LoginOutcome::Authenticated {
            user: user.to_view(),
            access_token,
            refresh_token,
        })
    }

    /// Rotate a refresh token: single use, revoke-then-reissue.
    ///
    /// The old record is marked revoked before the replacement is written
    /// to keep the reuse window as small as the store allows.
    pub async fn refresh_token(&self, refresh_token: &str) -> Result<String> {
        let infra = self
            .infra
            .as_ref()
            .ok_or_else(|| AuthError::InvalidState("Token refresh not available".to_string()))?;

        let mut token = infra
            .tokens
            .find_by_refresh_token(refresh_token)
            .await?
            .ok_or(AuthError::InvalidCredentials)?;

        if token.revoked || token.is_expired(Utc::now()) {
            warn!(user_id = %token.user_id, "refresh rejected: token revoked or expired");
            return Err(AuthError::InvalidCredentials);
        }

        let access = infra.issuer.issue_access_token(&token.user_id)?;
        let refresh = infra.issuer.issue_refresh_token(&token.user_id)?;

        token.revoked = true;
        let revoked = infra.tokens.save(token).await?;

        infra
            .tokens
            .save(Token::new(
                &revoked.user_id,
                &access,
                &refresh,
                Utc::now() + infra.issuer.refresh_ttl(),
            ))
            .await?;

        info!(user_id = %revoked.user_id, "refresh token rotated");
        Ok(access)
    }

    /// Revoke all tokens and deactivate all sessions for a user.
    ///
    /// Idempotent; returns false when token/session infrastructure is not
    /// configured.
    pub async fn logout(&self, user_id: &str) -> Result<bool> {
        let Some(infra) = &self.infra else {
            warn!("logout requested but token/session stores are not configured");
            return Ok(false);
        };

        infra.tokens.revoke_all(user_id).await?;
        infra.sessions.invalidate_all(user_id).await?;

        info!(user_id, "user logged out");
        Ok(true)
    }
}
