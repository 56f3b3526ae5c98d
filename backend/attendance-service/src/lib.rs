/// Attendance Service Library
///
/// Authentication and session lifecycle core for the attendance backend.
///
/// ## Modules
///
/// - `config`: Service configuration
/// - `error`: Error types
/// - `http`: HTTP boundary (axum routes, status mapping)
/// - `models`: Data models (users, tokens, sessions)
/// - `security`: Password hashing, JWT issuance, TOTP, secret encryption
/// - `services`: Business logic (auth orchestration, two-factor lifecycle)
/// - `store`: Credential store traits with in-memory and MongoDB backends
/// - `validators`: Input validation
pub mod config;
pub mod error;
pub mod http;
pub mod models;
pub mod security;
pub mod services;
pub mod store;
pub mod validators;

// Re-export commonly used types
pub use error::{AuthError, Result};
pub use services::{AuthService, ClientContext, LoginOutcome, TwoFaService};
