/// HTTP boundary: thin axum layer over the auth services
///
/// Handlers translate between JSON payloads and service calls; no business
/// rules live here. Errors are mapped to status codes structurally, never
/// by message text.
use crate::error::AuthError;
use crate::models::UserView;
use crate::services::{AuthService, ClientContext, LoginOutcome};
use axum::{
    async_trait,
    extract::{ConnectInfo, FromRequestParts, State},
    http::{header, request::Parts, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::trace::TraceLayer;
use tracing::error;

#[derive(Clone)]
pub struct AppState {
    pub auth: Arc<AuthService>,
    pub issuer: crate::security::TokenIssuer,
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/api/auth/register", post(register))
        .route("/api/auth/login", post(login))
        .route("/api/auth/refresh", post(refresh))
        .route("/api/auth/logout", post(logout))
        .route("/api/2fa/setup", post(two_fa_setup))
        .route("/api/2fa/verify", post(two_fa_verify))
        .route("/api/2fa/disable", post(two_fa_disable))
        .route("/health", get(health))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn health() -> &'static str {
    "OK"
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        let (status, message) = match &self {
            AuthError::Validation(msg) => (StatusCode::BAD_REQUEST, msg.clone()),
            AuthError::UsernameExists(_) => (StatusCode::CONFLICT, self.to_string()),
            // Do not reveal whether the username exists
            AuthError::UserNotFound(_) | AuthError::InvalidCredentials => (
                StatusCode::UNAUTHORIZED,
                "Invalid username or password".to_string(),
            ),
            AuthError::InvalidState(msg) => (StatusCode::NOT_FOUND, msg.clone()),
            AuthError::Crypto(_)
            | AuthError::Provisioning(_)
            | AuthError::Database(_)
            | AuthError::Internal(_) => {
                error!(error = %self, "internal error");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Internal server error".to_string(),
                )
            }
        };

        let body = Json(json!({
            "error": message,
            "status": status.as_u16(),
        }));
        (status, body).into_response()
    }
}

/// User id resolved from a `Bearer` access token
pub struct AuthenticatedUser(pub String);

#[async_trait]
impl FromRequestParts<AppState> for AuthenticatedUser {
    type Rejection = AuthError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let token = parts
            .headers
            .get(header::AUTHORIZATION)
            .and_then(|h| h.to_str().ok())
            .and_then(|h| h.strip_prefix("Bearer "))
            .ok_or(AuthError::InvalidCredentials)?;

        let user_id = state
            .issuer
            .extract_subject(token)
            .ok_or(AuthError::InvalidCredentials)?;
        Ok(AuthenticatedUser(user_id))
    }
}

#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    pub username: String,
    pub password: String,
}

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
    pub otp: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct LoginResponse {
    pub mfa_required: bool,
    pub user: UserView,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub access_token: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub refresh_token: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct RefreshRequest {
    pub refresh_token: String,
}

#[derive(Debug, Serialize)]
pub struct RefreshResponse {
    pub access_token: String,
}

#[derive(Debug, Deserialize)]
pub struct OtpRequest {
    pub code: String,
}

#[derive(Debug, Serialize)]
pub struct TwoFaSetupResponse {
    pub secret: String,
    pub provisioning_uri: String,
}

async fn register(
    State(state): State<AppState>,
    Json(payload): Json<RegisterRequest>,
) -> Result<(StatusCode, Json<UserView>), AuthError> {
    let user = state.auth.register(&payload.username, &payload.password).await?;
    Ok((StatusCode::CREATED, Json(user)))
}

async fn login(
    State(state): State<AppState>,
    ConnectInfo(peer): ConnectInfo<SocketAddr>,
    headers: axum::http::HeaderMap,
    Json(payload): Json<LoginRequest>,
) -> Result<Json<LoginResponse>, AuthError> {
    let ctx = ClientContext {
        device: headers
            .get(header::USER_AGENT)
            .and_then(|h| h.to_str().ok())
            .map(str::to_string),
        ip_address: Some(peer.ip().to_string()),
    };

    let outcome = state
        .auth
        .login(
            &payload.username,
            &payload.password,
            payload.otp.as_deref(),
            &ctx,
        )
        .await?;

    let response = match outcome {
        LoginOutcome::MfaRequired { user } => LoginResponse {
            mfa_required: true,
            user,
            access_token: None,
            refresh_token: None,
        },
        LoginOutcome::Authenticated {
            user,
            access_token,
            refresh_token,
        } => LoginResponse {
            mfa_required: false,
            user,
            access_token,
            refresh_token,
        },
    };
    Ok(Json(response))
}

async fn refresh(
    State(state): State<AppState>,
    Json(payload): Json<RefreshRequest>,
) -> Result<Json<RefreshResponse>, AuthError> {
    let access_token = state.auth.refresh_token(&payload.refresh_token).await?;
    Ok(Json(RefreshResponse { access_token }))
}

async fn logout(
    State(state): State<AppState>,
    AuthenticatedUser(user_id): AuthenticatedUser,
) -> Result<Json<serde_json::Value>, AuthError> {
    let revoked = state.auth.logout(&user_id).await?;
    Ok(Json(json!({ "success": revoked })))
}

async fn two_fa_setup(
    State(state): State<AppState>,
    AuthenticatedUser(user_id): AuthenticatedUser,
) -> Result<Json<TwoFaSetupResponse>, AuthError> {
    let setup = state.auth.two_fa().setup(&user_id).await?;
    Ok(Json(TwoFaSetupResponse {
        secret: setup.secret,
        provisioning_uri: setup.provisioning_uri,
    }))
}

async fn two_fa_verify(
    State(state): State<AppState>,
    AuthenticatedUser(user_id): AuthenticatedUser,
    Json(payload): Json<OtpRequest>,
) -> Result<Json<serde_json::Value>, AuthError> {
    let enabled = state.auth.two_fa().verify_and_enable(&user_id, &payload.code).await?;
    Ok(Json(json!({ "enabled": enabled })))
}

async fn two_fa_disable(
    State(state): State<AppState>,
    AuthenticatedUser(user_id): AuthenticatedUser,
    Json(payload): Json<OtpRequest>,
) -> Result<Json<serde_json::Value>, AuthError> {
    let disabled = state.auth.two_fa().disable(&user_id, &payload.code).await?;
    Ok(Json(json!({ "disabled": disabled })))
}
