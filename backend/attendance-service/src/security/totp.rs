/// TOTP engine for two-factor authentication (RFC 4226/6238)
///
/// 6-digit codes, HMAC-SHA1, 30-second time step, ±1 step clock-skew
/// tolerance. Secrets use the RFC 4648 base32 alphabet without padding,
/// the format authenticator apps expect for manual entry.
use crate::error::{AuthError, Result};
use hmac::{Hmac, Mac};
use rand::Rng;
use sha1::Sha1;
use std::time::{SystemTime, UNIX_EPOCH};

type HmacSha1 = Hmac<Sha1>;

/// Seconds per TOTP time step
const STEP_SECS: u64 = 30;

/// Accepted steps either side of the current one
const SKEW_STEPS: i64 = 1;

/// Secret entropy in bytes (160 bits)
const SECRET_LEN: usize = 20;

/// Generate a new shared secret: 20 random bytes, unpadded base32
pub fn generate_secret() -> String {
    let mut rng = rand::thread_rng();
    let bytes: [u8; SECRET_LEN] = rng.gen();
    base32_encode(&bytes)
}

/// Build an `otpauth://` provisioning URI consumable by authenticator apps
pub fn provisioning_uri(issuer: &str, account: &str, secret: &str) -> Result<String> {
    if issuer.trim().is_empty() || account.trim().is_empty() || secret.trim().is_empty() {
        return Err(AuthError::Provisioning(
            "Issuer, account, and secret are all required".to_string(),
        ));
    }

    Ok(format!(
        "otpauth://totp/{issuer}:{account}?secret={secret}&issuer={issuer}&algorithm=SHA1&digits=6&period=30",
        issuer = urlencoding::encode(issuer),
        account = urlencoding::encode(account),
        secret = secret,
    ))
}

/// Verify a 6-digit code against the current clock
pub fn verify(secret: &str, code: &str) -> Result<bool> {
    verify_at(secret, code, unix_now()?)
}

/// Verify a 6-digit code at an explicit Unix timestamp.
///
/// Checks the current 30-second step and one step before/after. No
/// replay-window tracking: a code remains valid for repeated use within
/// its window, single-use semantics are the caller's concern.
pub fn verify_at(secret: &str, code: &str, unix_secs: u64) -> Result<bool> {
    if code.len() != 6 || !code.chars().all(|c| c.is_ascii_digit()) {
        return Ok(false);
    }

    let secret_bytes = base32_decode(secret)
        .ok_or_else(|| AuthError::Crypto("Invalid base32 TOTP secret".to_string()))?;

    let current_step = (unix_secs / STEP_SECS) as i64;
    for offset in -SKEW_STEPS..=SKEW_STEPS {
        let counter = match current_step.checked_add(offset) {
            Some(c) if c >= 0 => c as u64,
            _ => continue,
        };
        let expected = hotp(&secret_bytes, counter)?;
        if constant_time_eq(code.as_bytes(), expected.as_bytes()) {
            return Ok(true);
        }
    }

    Ok(false)
}

/// Expected code for a secret at a given Unix timestamp
pub fn code_at(secret: &str, unix_secs: u64) -> Result<String> {
    let secret_bytes = base32_decode(secret)
        .ok_or_else(|| AuthError::Crypto("Invalid base32 TOTP secret".to_string()))?;
    hotp(&secret_bytes, unix_secs / STEP_SECS)
}

fn unix_now() -> Result<u64> {
    Ok(SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map_err(|e| AuthError::Internal(format!("System time error: {}", e)))?
        .as_secs())
}

/// HOTP code for one counter value (RFC 4226 §5.3 dynamic truncation)
fn hotp(secret: &[u8], counter: u64) -> Result<String> {
    let mut mac = HmacSha1::new_from_slice(secret)
        .map_err(|e| AuthError::Crypto(format!("Invalid HMAC key: {}", e)))?;
    mac.update(&counter.to_be_bytes());
    let hash = mac.finalize().into_bytes();

    let offset = (hash[hash.len() - 1] & 0x0f) as usize;
    let binary = u32::from_be_bytes([
        hash[offset] & 0x7f,
        hash[offset + 1],
        hash[offset + 2],
        hash[offset + 3],
    ]);

    Ok(format!("{:06}", binary % 1_000_000))
}

/// RFC 4648 base32 encoding, no padding
fn base32_encode(data: &[u8]) -> String {
    const ALPHABET: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZ234567";
    let mut output = String::new();
    let mut buffer = 0u32;
    let mut bits = 0;

    for byte in data {
        buffer = (buffer << 8) | u32::from(*byte);
        bits += 8;

        while bits >= 5 {
            bits -= 5;
            output.push(ALPHABET[((buffer >> bits) & 0x1f) as usize] as char);
        }
    }

    if bits > 0 {
        buffer <<= 5 - bits;
        output.push(ALPHABET[(buffer & 0x1f) as usize] as char);
    }

    output
}

/// RFC 4648 base32 decoding; accepts padded or unpadded input
fn base32_decode(data: &str) -> Option<Vec<u8>> {
    let data = data.trim_end_matches('=');
    let mut buffer = 0u32;
    let mut bits = 0;
    let mut output = Vec::new();

    for ch in data.chars() {
        let value = match ch.to_ascii_uppercase() {
            c @ 'A'..='Z' => (c as u32) - ('A' as u32),
            c @ '2'..='7' => (c as u32) - ('2' as u32) + 26,
            _ => return None,
        };

        buffer = (buffer << 5) | value;
        bits += 5;

        if bits >= 8 {
            bits -= 8;
            output.push(((buffer >> bits) & 0xff) as u8);
        }
    }

    Some(output)
}

/// Constant-time comparison, same cost whether or not the inputs match
fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }

    let mut diff = 0u8;
    for (x, y) in a.iter().zip(b.iter()) {
        diff |= x ^ y;
    }

    diff == 0
}
