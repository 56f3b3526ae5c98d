use crate::error::{AuthError, Result};
use crate::validators;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Gender enum, optional profile attribute
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Gender {
    Male,
    Female,
    Other,
    PreferNotToSay,
}

/// Closed role enumeration. Every role carries a fixed capability set;
/// role transitions re-derive authorities from the new variant instead of
/// merging with the old set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Role {
    Student,
    Teacher,
    Admin,
}

impl Role {
    pub fn authorities(&self) -> &'static [&'static str] {
        match self {
            Role::Student => &[
                "ATTENDANCE_VIEW",
                "PROFILE_VIEW",
                "PROFILE_EDIT",
                "TWO_FACTOR_MANAGE",
            ],
            Role::Teacher => &[
                "COURSE_VIEW",
                "SCHEDULE_VIEW",
                "ATTENDANCE_VIEW",
                "ATTENDANCE_MANAGE",
            ],
            Role::Admin => &[
                "ATTENDANCE_VIEW",
                "ATTENDANCE_MANAGE",
                "PROFILE_VIEW",
                "PROFILE_EDIT",
                "STUDENT_VIEW",
                "STUDENT_MANAGE",
                "TEACHER_VIEW",
                "TEACHER_MANAGE",
                "ROLE_MANAGE",
                "COURSE_VIEW",
                "COURSE_CREATE",
                "COURSE_EDIT",
                "COURSE_DELETE",
            ],
        }
    }

    pub fn default_authorities(&self) -> Vec<String> {
        self.authorities().iter().map(|a| a.to_string()).collect()
    }

    /// Parse a role name, falling back to STUDENT for unknown input
    pub fn from_str(value: &str) -> Self {
        match value.to_uppercase().as_str() {
            "TEACHER" => Role::Teacher,
            "ADMIN" => Role::Admin,
            _ => Role::Student,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Student => "STUDENT",
            Role::Teacher => "TEACHER",
            Role::Admin => "ADMIN",
        }
    }
}

/// User identity record.
///
/// `password_hash` and `two_factor_secret` never leave the store layer;
/// callers get a sanitized [`UserView`]. Users are never hard-deleted,
/// only disabled via the `active` flag.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    #[serde(rename = "_id")]
    pub id: String,
    pub username: String,
    pub email: String,
    pub password_hash: String,
    pub full_name: String,
    pub photo_url: Option<String>,
    pub phone_number: Option<String>,
    pub gender: Option<Gender>,
    pub date_of_birth: Option<String>,
    pub role: Role,
    pub authorities: Vec<String>,
    pub active: bool,
    pub email_verified: bool,
    pub phone_verified: bool,
    pub two_factor_enabled: bool,
    pub two_factor_secret: Option<String>,
    #[serde(with = "bson::serde_helpers::chrono_datetime_as_bson_datetime")]
    pub created_at: DateTime<Utc>,
    #[serde(with = "bson::serde_helpers::chrono_datetime_as_bson_datetime")]
    pub updated_at: DateTime<Utc>,
}

impl User {
    /// Create a user with registration defaults: STUDENT role, derived
    /// authorities, full name mirroring the username, blank id until the
    /// store assigns one.
    pub fn new(username: &str, password_hash: String) -> Self {
        let now = Utc::now();
        let role = Role::Student;
        Self {
            id: String::new(),
            username: username.to_string(),
            email: String::new(),
            password_hash,
            full_name: username.to_string(),
            photo_url: None,
            phone_number: None,
            gender: None,
            date_of_birth: None,
            role,
            authorities: role.default_authorities(),
            active: true,
            email_verified: false,
            phone_verified: false,
            two_factor_enabled: false,
            two_factor_secret: None,
            created_at: now,
            updated_at: now,
        }
    }

    /// Change role, re-deriving authorities from the new variant
    pub fn set_role(&mut self, role: Role) {
        self.role = role;
        self.authorities = role.default_authorities();
        self.touch();
    }

    pub fn has_authority(&self, authority: &str) -> bool {
        self.authorities.iter().any(|a| a == authority)
    }

    pub fn touch(&mut self) {
        self.updated_at = Utc::now();
    }

    pub fn collect_validation_errors(&self) -> Vec<String> {
        let mut errors = Vec::new();

        if self.username.trim().is_empty() {
            errors.push("Username is required".to_string());
        } else {
            if self.username.len() < 3 {
                errors.push("Username must be at least 3 characters".to_string());
            }
            if !validators::validate_username(&self.username) {
                errors.push(
                    "Username can only contain letters, numbers, dots, underscores, and hyphens"
                        .to_string(),
                );
            }
        }

        if self.password_hash.trim().is_empty() {
            errors.push("Password is required".to_string());
        }

        if !self.email.is_empty() && !validators::validate_email(&self.email) {
            errors.push("Invalid email format".to_string());
        }

        if !self.full_name.is_empty() {
            if self.full_name.len() < 2 {
                errors.push("Full name must be at least 2 characters if provided".to_string());
            }
            if !validators::validate_full_name(&self.full_name) {
                errors.push(
                    "Full name can only contain letters, numbers, spaces, dots, underscores, and hyphens"
                        .to_string(),
                );
            }
        }

        if let Some(url) = &self.photo_url {
            if !url.is_empty() && !validators::validate_photo_url(url) {
                errors.push("Photo URL must be a valid HTTP(S) URL".to_string());
            }
        }

        if let Some(phone) = &self.phone_number {
            if !phone.is_empty() && !validators::validate_phone_number(phone) {
                errors.push("Phone number must be valid if provided".to_string());
            }
        }

        errors
    }

    /// Fail with the first validation error, if any
    pub fn validate(&self) -> Result<()> {
        match self.collect_validation_errors().into_iter().next() {
            Some(first) => Err(AuthError::Validation(first)),
            None => Ok(()),
        }
    }

    /// Sanitized representation: no password hash, no 2FA secret
    pub fn to_view(&self) -> UserView {
        UserView {
            id: self.id.clone(),
            username: self.username.clone(),
            email: self.email.clone(),
            full_name: self.full_name.clone(),
            photo_url: self.photo_url.clone(),
            phone_number: self.phone_number.clone(),
            gender: self.gender,
            date_of_birth: self.date_of_birth.clone(),
            role: self.role,
            authorities: self.authorities.clone(),
            active: self.active,
            email_verified: self.email_verified,
            phone_verified: self.phone_verified,
            two_factor_enabled: self.two_factor_enabled,
            created_at: self.created_at,
            updated_at: self.updated_at,
        }
    }
}

/// Client-safe projection of a [`User`]
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserView {
    pub id: String,
    pub username: String,
    pub email: String,
    pub full_name: String,
    pub photo_url: Option<String>,
    pub phone_number: Option<String>,
    pub gender: Option<Gender>,
    pub date_of_birth: Option<String>,
    pub role: Role,
    pub authorities: Vec<String>,
    pub active: bool,
    pub email_verified: bool,
    pub phone_verified: bool,
    pub two_factor_enabled: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_student_defaults() {
        let user = User::new("alice", "hash".to_string());
        assert_eq!(user.role, Role::Student);
        assert!(user.has_authority("ATTENDANCE_VIEW"));
        assert!(!user.has_authority("COURSE_DELETE"));
        assert!(user.active);
        assert!(!user.two_factor_enabled);
    }

    #[test]
    fn test_role_transition_rederives_authorities() {
        let mut user = User::new("bob", "hash".to_string());
        user.set_role(Role::Admin);
        assert!(user.has_authority("ROLE_MANAGE"));
        user.set_role(Role::Teacher);
        // Re-derived, never merged: admin-only capability must be gone
        assert!(!user.has_authority("ROLE_MANAGE"));
        assert!(user.has_authority("ATTENDANCE_MANAGE"));
    }

    #[test]
    fn test_role_from_str_falls_back_to_student() {
        assert_eq!(Role::from_str("teacher"), Role::Teacher);
        assert_eq!(Role::from_str("ADMIN"), Role::Admin);
        assert_eq!(Role::from_str("superuser"), Role::Student);
    }

    #[test]
    fn test_validation_rejects_short_username() {
        let user = User::new("ab", "hash".to_string());
        let errors = user.collect_validation_errors();
        assert!(errors.iter().any(|e| e.contains("at least 3")));
    }

    #[test]
    fn test_validation_rejects_bad_email() {
        let mut user = User::new("alice", "hash".to_string());
        user.email = "not-an-email".to_string();
        assert!(user.validate().is_err());
    }

    #[test]
    fn test_view_has_no_secrets() {
        let mut user = User::new("alice", "hash".to_string());
        user.two_factor_secret = Some("encrypted".to_string());
        let view = serde_json::to_string(&user.to_view()).expect("view serializes");
        assert!(!view.contains("hash"));
        assert!(!view.contains("encrypted"));
    }
}
