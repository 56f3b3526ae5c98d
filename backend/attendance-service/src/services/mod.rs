/// Business logic for the authentication core
///
/// - Auth orchestration (register, login, refresh rotation, logout)
/// - Two-factor lifecycle (setup, verify-and-enable, disable)
pub mod auth;
pub mod two_fa;

pub use auth::{AuthService, ClientContext, LoginOutcome, TokenInfrastructure};
pub use two_fa::{TwoFaService, TwoFaSetup};
