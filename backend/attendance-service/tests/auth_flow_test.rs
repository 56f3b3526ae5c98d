/// End-to-end authentication flows over the in-memory store
use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};

use attendance_service::security::{totp, SecretCodec, TokenIssuer};
use attendance_service::services::{
    AuthService, ClientContext, LoginOutcome, TokenInfrastructure, TwoFaService,
};
use attendance_service::store::{MemorySessionStore, MemoryTokenStore, MemoryUserStore, UserStore};
use attendance_service::AuthError;

fn build_service() -> AuthService {
    let users = Arc::new(MemoryUserStore::new());
    let two_fa = TwoFaService::new(users.clone(), SecretCodec::passthrough(), "AttendanceAPI");
    AuthService::with_infrastructure(
        users,
        two_fa,
        TokenInfrastructure {
            issuer: TokenIssuer::new("integration-test-secret", 900, 604_800),
            tokens: Arc::new(MemoryTokenStore::new()),
            sessions: Arc::new(MemorySessionStore::new()),
        },
    )
}

fn current_code(secret: &str) -> String {
    let now = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .expect("clock is after the epoch")
        .as_secs();
    totp::code_at(secret, now).expect("code computes")
}

fn authenticated(outcome: LoginOutcome) -> (String, Option<String>, Option<String>) {
    match outcome {
        LoginOutcome::Authenticated {
            user,
            access_token,
            refresh_token,
        } => (user.id, access_token, refresh_token),
        other => panic!("expected authenticated outcome, got {:?}", other),
    }
}

#[tokio::test]
async fn full_session_lifecycle() {
    let service = build_service();
    let ctx = ClientContext {
        device: Some("lifecycle-test".to_string()),
        ip_address: Some("10.0.0.1".to_string()),
    };

    let registered = service
        .register("alice", "password123")
        .await
        .expect("register succeeds");
    assert_eq!(registered.username, "alice");
    assert_eq!(registered.full_name, "alice");
    assert!(!registered.two_factor_enabled);

    let (user_id, access, refresh) = authenticated(
        service
            .login("alice", "password123", None, &ctx)
            .await
            .expect("login succeeds"),
    );
    assert_eq!(user_id, registered.id);
    let access = access.expect("access token issued");
    let refresh = refresh.expect("refresh token issued");
    assert_ne!(access, refresh);

    // First refresh rotates, second use of the same token is rejected
    let rotated = service
        .refresh_token(&refresh)
        .await
        .expect("refresh succeeds");
    assert_ne!(rotated, access);
    assert!(matches!(
        service.refresh_token(&refresh).await,
        Err(AuthError::InvalidCredentials)
    ));

    // Logout revokes everything, including the rotation's replacement
    assert!(service.logout(&user_id).await.expect("logout succeeds"));
    let (_, _, refresh_after) = authenticated(
        service
            .login("alice", "password123", None, &ctx)
            .await
            .expect("re-login succeeds"),
    );
    service.logout(&user_id).await.expect("logout succeeds");
    assert!(matches!(
        service
            .refresh_token(&refresh_after.expect("refresh token issued"))
            .await,
        Err(AuthError::InvalidCredentials)
    ));
}

#[tokio::test]
async fn duplicate_registration_is_rejected_with_username() {
    let service = build_service();
    service
        .register("alice", "password123")
        .await
        .expect("register succeeds");

    let err = service
        .register("alice", "password456")
        .await
        .expect_err("duplicate must fail");
    assert_eq!(err.to_string(), "Username already exists: alice");
}

#[tokio::test]
async fn two_factor_full_lifecycle() {
    let service = build_service();
    let ctx = ClientContext::default();

    let registered = service
        .register("bob", "hunter2hunter2")
        .await
        .expect("register succeeds");

    // Stage a secret; login is still single-factor until it is confirmed
    let setup = service
        .two_fa()
        .setup(&registered.id)
        .await
        .expect("setup succeeds");
    assert!(setup.provisioning_uri.contains("otpauth://totp/"));
    assert!(matches!(
        service
            .login("bob", "hunter2hunter2", None, &ctx)
            .await
            .expect("login succeeds"),
        LoginOutcome::Authenticated { .. }
    ));

    // Confirm possession; from now on password alone is not enough
    assert!(service
        .two_fa()
        .verify_and_enable(&registered.id, &current_code(&setup.secret))
        .await
        .expect("enable succeeds"));
    assert!(matches!(
        service
            .login("bob", "hunter2hunter2", None, &ctx)
            .await
            .expect("login succeeds"),
        LoginOutcome::MfaRequired { .. }
    ));

    let (_, access, _) = authenticated(
        service
            .login(
                "bob",
                "hunter2hunter2",
                Some(&current_code(&setup.secret)),
                &ctx,
            )
            .await
            .expect("login with code succeeds"),
    );
    assert!(access.is_some());

    // Disable clears the secret; single-factor login works again
    assert!(service
        .two_fa()
        .disable(&registered.id, &current_code(&setup.secret))
        .await
        .expect("disable succeeds"));
    assert!(matches!(
        service
            .login("bob", "hunter2hunter2", None, &ctx)
            .await
            .expect("login succeeds"),
        LoginOutcome::Authenticated { .. }
    ));
}

#[tokio::test]
async fn lightweight_mode_issues_no_tokens() {
    let users = Arc::new(MemoryUserStore::new());
    let two_fa = TwoFaService::new(users.clone(), SecretCodec::passthrough(), "AttendanceAPI");
    let service = AuthService::new(users, two_fa);

    let registered = service
        .register("carol", "password123")
        .await
        .expect("register succeeds");

    let (_, access, refresh) = authenticated(
        service
            .login("carol", "password123", None, &ClientContext::default())
            .await
            .expect("login succeeds"),
    );
    assert!(access.is_none());
    assert!(refresh.is_none());

    assert!(matches!(
        service.refresh_token("anything").await,
        Err(AuthError::InvalidState(_))
    ));
    assert!(!service.logout(&registered.id).await.expect("logout runs"));
}

#[tokio::test]
async fn encrypted_secrets_round_trip_through_the_store() {
    let users = Arc::new(MemoryUserStore::new());
    let codec = SecretCodec::from_key(Some("integration-test-2fa-key"));
    let two_fa = TwoFaService::new(users.clone(), codec, "AttendanceAPI");
    let service = AuthService::with_infrastructure(
        users.clone(),
        two_fa,
        TokenInfrastructure {
            issuer: TokenIssuer::new("integration-test-secret", 900, 604_800),
            tokens: Arc::new(MemoryTokenStore::new()),
            sessions: Arc::new(MemorySessionStore::new()),
        },
    );

    let registered = service
        .register("dave", "password123")
        .await
        .expect("register succeeds");
    let setup = service
        .two_fa()
        .setup(&registered.id)
        .await
        .expect("setup succeeds");

    // What the store holds is ciphertext, not the raw base32 secret
    let stored = users
        .find_by_id(&registered.id)
        .await
        .expect("lookup succeeds")
        .expect("user exists")
        .two_factor_secret
        .expect("secret staged");
    assert_ne!(stored, setup.secret);

    // Verification still works through decrypt
    assert!(service
        .two_fa()
        .verify_and_enable(&registered.id, &current_code(&setup.secret))
        .await
        .expect("enable succeeds"));
}
