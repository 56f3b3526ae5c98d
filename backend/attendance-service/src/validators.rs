use once_cell::sync::Lazy;
use regex::Regex;

/// Input validation utilities for the attendance service

// Compile regex patterns once at startup.
// These patterns are hardcoded and always valid, so we use expect() with explicit reasoning
static EMAIL_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[a-zA-Z0-9._%+-]+@[a-zA-Z0-9.-]+\.[a-zA-Z]{2,}$")
        .expect("hardcoded email regex is invalid - fix source code")
});

static USERNAME_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[a-zA-Z0-9_.-]+$").expect("hardcoded username regex is invalid - fix source code")
});

static FULL_NAME_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[a-zA-Z0-9_\s.-]+$")
        .expect("hardcoded full name regex is invalid - fix source code")
});

static PHONE_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^\+?[0-9]{7,15}$").expect("hardcoded phone regex is invalid - fix source code")
});

/// Validate email format (RFC 5322 simplified)
pub fn validate_email(email: &str) -> bool {
    !email.is_empty() && email.len() <= 254 && EMAIL_REGEX.is_match(email)
}

/// Validate username shape: letters, numbers, dots, underscores, and hyphens
pub fn validate_username(username: &str) -> bool {
    USERNAME_REGEX.is_match(username)
}

/// Validate an optional display name: letters, numbers, spaces, dots, underscores, hyphens
pub fn validate_full_name(full_name: &str) -> bool {
    FULL_NAME_REGEX.is_match(full_name)
}

/// Validate phone number shape (E.164-ish, 7-15 digits)
pub fn validate_phone_number(phone: &str) -> bool {
    PHONE_REGEX.is_match(phone)
}

/// Validate photo URL (http or https only)
pub fn validate_photo_url(url: &str) -> bool {
    url.starts_with("http://") || url.starts_with("https://")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_valid_email() {
        assert!(validate_email("user@example.com"));
        assert!(validate_email("test.user+tag@sub.example.co.uk"));
    }

    #[test]
    fn test_invalid_email() {
        assert!(!validate_email(""));
        assert!(!validate_email("not-an-email"));
        assert!(!validate_email("missing@tld"));
    }

    #[test]
    fn test_valid_username() {
        assert!(validate_username("alice"));
        assert!(validate_username("alice.smith-01_x"));
    }

    #[test]
    fn test_invalid_username() {
        assert!(!validate_username("with space"));
        assert!(!validate_username("emoji🙂"));
    }

    #[test]
    fn test_phone_number() {
        assert!(validate_phone_number("+4915112345678"));
        assert!(validate_phone_number("1234567"));
        assert!(!validate_phone_number("12-34"));
        assert!(!validate_phone_number("123"));
    }

    #[test]
    fn test_photo_url() {
        assert!(validate_photo_url("https://example.com/a.png"));
        assert!(!validate_photo_url("ftp://example.com/a.png"));
    }
}
