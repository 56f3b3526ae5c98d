/// Security primitives for the authentication core
///
/// - Password hashing and verification (Argon2id)
/// - Bearer token issuance and validation (HMAC-SHA256 JWT)
/// - Two-factor authentication (TOTP, RFC 6238)
/// - Encryption of stored TOTP secrets (AES-256-GCM)
pub mod jwt;
pub mod password;
pub mod secret_codec;
pub mod totp;

pub use jwt::TokenIssuer;
pub use password::{hash_password, verify_password};
pub use secret_codec::SecretCodec;
