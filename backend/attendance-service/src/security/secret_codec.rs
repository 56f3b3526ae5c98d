/// Encryption-at-rest for stored TOTP secrets
///
/// AES-256-GCM with a fresh random nonce per call. The output format is
/// `base64(nonce || ciphertext+tag)` as a single opaque string.
///
/// When no key is configured the codec runs in pass-through mode:
/// encrypt/decrypt are identity functions and a startup warning is logged
/// so operators know secrets are stored unprotected.
use crate::error::{AuthError, Result};
use aes_gcm::{
    aead::{Aead, KeyInit},
    Aes256Gcm, Nonce,
};
use base64::engine::{general_purpose::STANDARD as BASE64, Engine};
use rand::Rng;
use tracing::warn;

const NONCE_LEN: usize = 12;
const TAG_LEN: usize = 16;

#[derive(Clone)]
pub struct SecretCodec {
    cipher: Option<Aes256Gcm>,
}

impl SecretCodec {
    /// Build a codec from optional key material.
    ///
    /// The key may be base64-encoded or raw bytes; decoded material is
    /// copied into a zero-filled 32-byte array (truncated if longer).
    /// This is a deliberate, simple key-derivation policy, not a KDF.
    pub fn from_key(key_config: Option<&str>) -> Self {
        let key_config = key_config.filter(|k| !k.trim().is_empty());

        let Some(key_config) = key_config else {
            warn!(
                "Two-factor encryption key not set: secrets will be stored in plaintext. \
                 Set TWO_FACTOR_ENCRYPTION_KEY to enable encryption."
            );
            return Self { cipher: None };
        };

        // Allow either raw bytes or base64; try base64 decode first
        let decoded = BASE64
            .decode(key_config)
            .unwrap_or_else(|_| key_config.as_bytes().to_vec());

        let mut key_bytes = [0u8; 32];
        let len = decoded.len().min(32);
        key_bytes[..len].copy_from_slice(&decoded[..len]);

        let cipher = Aes256Gcm::new(aes_gcm::Key::<Aes256Gcm>::from_slice(&key_bytes));
        Self {
            cipher: Some(cipher),
        }
    }

    /// Codec without a key: encrypt/decrypt are identity functions
    pub fn passthrough() -> Self {
        Self::from_key(None)
    }

    pub fn is_passthrough(&self) -> bool {
        self.cipher.is_none()
    }

    pub fn encrypt(&self, plaintext: &str) -> Result<String> {
        let Some(cipher) = &self.cipher else {
            return Ok(plaintext.to_string());
        };

        let nonce_bytes: [u8; NONCE_LEN] = rand::thread_rng().gen();
        let nonce = Nonce::from_slice(&nonce_bytes);

        let ciphertext = cipher
            .encrypt(nonce, plaintext.as_bytes())
            .map_err(|e| AuthError::Crypto(format!("Encryption failed: {}", e)))?;

        let mut out = Vec::with_capacity(NONCE_LEN + ciphertext.len());
        out.extend_from_slice(&nonce_bytes);
        out.extend_from_slice(&ciphertext);

        Ok(BASE64.encode(out))
    }

    pub fn decrypt(&self, blob: &str) -> Result<String> {
        let Some(cipher) = &self.cipher else {
            return Ok(blob.to_string());
        };

        let raw = BASE64
            .decode(blob)
            .map_err(|e| AuthError::Crypto(format!("Malformed ciphertext: {}", e)))?;

        if raw.len() < NONCE_LEN + TAG_LEN {
            return Err(AuthError::Crypto("Ciphertext too short".to_string()));
        }

        let (nonce_bytes, ciphertext) = raw.split_at(NONCE_LEN);
        let nonce = Nonce::from_slice(nonce_bytes);

        let plaintext = cipher
            .decrypt(nonce, ciphertext)
            .map_err(|e| AuthError::Crypto(format!("Decryption failed: {}", e)))?;

        String::from_utf8(plaintext)
            .map_err(|e| AuthError::Crypto(format!("Invalid UTF-8 in plaintext: {}", e)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn keyed_codec() -> SecretCodec {
        SecretCodec::from_key(Some("an-example-32-byte-encryption-key"))
    }

    #[test]
    fn test_round_trip_with_key() {
        let codec = keyed_codec();
        let secret = "JBSWY3DPEHPK3PXP";
        let encrypted = codec.encrypt(secret).expect("encrypt succeeds");
        assert_ne!(encrypted, secret);
        assert_eq!(codec.decrypt(&encrypted).expect("decrypt succeeds"), secret);
    }

    #[test]
    fn test_passthrough_without_key() {
        let codec = SecretCodec::passthrough();
        assert!(codec.is_passthrough());
        assert_eq!(codec.encrypt("plain").expect("encrypt"), "plain");
        assert_eq!(codec.decrypt("plain").expect("decrypt"), "plain");
    }

    #[test]
    fn test_fresh_nonce_per_call() {
        let codec = keyed_codec();
        let a = codec.encrypt("same input").expect("encrypt");
        let b = codec.encrypt("same input").expect("encrypt");
        assert_ne!(a, b);
    }

    #[test]
    fn test_base64_key_and_raw_key_both_accepted() {
        let raw = SecretCodec::from_key(Some("short-key"));
        let b64 = SecretCodec::from_key(Some("c2hvcnQta2V5")); // base64("short-key")
        let encrypted = raw.encrypt("value").expect("encrypt");
        // Same derived key material, so either codec can decrypt
        assert_eq!(b64.decrypt(&encrypted).expect("decrypt"), "value");
    }

    #[test]
    fn test_tampered_ciphertext_fails() {
        let codec = keyed_codec();
        let encrypted = codec.encrypt("value").expect("encrypt");
        let mut raw = BASE64.decode(&encrypted).expect("valid base64");
        let last = raw.len() - 1;
        raw[last] ^= 0xff;
        let tampered = BASE64.encode(raw);
        assert!(matches!(
            codec.decrypt(&tampered),
            Err(AuthError::Crypto(_))
        ));
    }

    #[test]
    fn test_malformed_blob_fails() {
        let codec = keyed_codec();
        assert!(codec.decrypt("not base64 !!!").is_err());
        assert!(codec.decrypt(&BASE64.encode([0u8; 8])).is_err());
    }
}
