/// Attendance Service - Main entry point
use anyhow::{Context, Result};
use mongodb::Client;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing::info;
use tracing_subscriber::EnvFilter;

use attendance_service::config::Settings;
use attendance_service::http::{router, AppState};
use attendance_service::security::{SecretCodec, TokenIssuer};
use attendance_service::services::{AuthService, TokenInfrastructure, TwoFaService};
use attendance_service::store::{MongoSessionStore, MongoTokenStore, MongoUserStore};

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .json()
        .init();

    let settings = Settings::load().context("failed to load configuration")?;
    info!(addr = %settings.server.addr, "starting attendance service");

    let client = Client::with_uri_str(&settings.database.url)
        .await
        .context("failed to connect to MongoDB")?;
    let db = client.database(&settings.database.database);
    info!(database = %settings.database.database, "MongoDB connection initialized");

    let users = Arc::new(MongoUserStore::new(&db));
    let codec = SecretCodec::from_key(settings.two_factor.encryption_key.as_deref());
    let issuer = TokenIssuer::new(
        &settings.jwt.secret,
        settings.jwt.access_token_ttl_secs,
        settings.jwt.refresh_token_ttl_secs,
    );

    let two_fa = TwoFaService::new(users.clone(), codec, settings.two_factor.issuer.clone());
    let auth = AuthService::with_infrastructure(
        users,
        two_fa,
        TokenInfrastructure {
            issuer: issuer.clone(),
            tokens: Arc::new(MongoTokenStore::new(&db)),
            sessions: Arc::new(MongoSessionStore::new(&db)),
        },
    );

    let state = AppState {
        auth: Arc::new(auth),
        issuer,
    };

    let addr: SocketAddr = settings
        .server
        .addr
        .parse()
        .context("invalid SERVER_ADDR")?;
    let listener = TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind {addr}"))?;
    info!("listening on {addr}");

    axum::serve(
        listener,
        router(state).into_make_service_with_connect_info::<SocketAddr>(),
    )
    .await
    .context("server error")?;

    Ok(())
}
