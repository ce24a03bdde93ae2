//! Identity-facing model: credentials and the minimal user profile.
//!
//! # Invariants
//! - Emails are compared in trimmed, lowercase form.
//! - Passwords are never stored or logged in plain text; only their hash is
//!   persisted by the identity repository.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Identity provider user id.
pub type IdentityId = String;

/// Minimum password length accepted at registration.
pub const MIN_PASSWORD_CHARS: usize = 6;

static EMAIL_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").expect("valid email regex")
});

/// Email/password pair submitted by the login and register screens.
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    pub email: String,
    pub password: String,
}

impl Credentials {
    /// Builds credentials with a normalized email.
    pub fn new(email: impl AsRef<str>, password: impl Into<String>) -> Self {
        Self {
            email: normalize_email(email.as_ref()),
            password: password.into(),
        }
    }

    /// Validates registration input; existence is checked by the provider.
    pub fn validate(&self) -> Result<(), CredentialValidationError> {
        self.validate_for_sign_in()?;
        if self.password.chars().count() < MIN_PASSWORD_CHARS {
            return Err(CredentialValidationError::PasswordTooShort {
                min: MIN_PASSWORD_CHARS,
            });
        }
        Ok(())
    }

    /// Validates sign-in input: well-formed email and a non-empty password.
    ///
    /// Length rules apply at registration only.
    pub fn validate_for_sign_in(&self) -> Result<(), CredentialValidationError> {
        if self.email.is_empty() {
            return Err(CredentialValidationError::EmptyEmail);
        }
        if !EMAIL_RE.is_match(&self.email) {
            return Err(CredentialValidationError::InvalidEmail);
        }
        if self.password.is_empty() {
            return Err(CredentialValidationError::EmptyPassword);
        }
        Ok(())
    }
}

// Keeps passwords out of `{:?}` output.
impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("email", &self.email)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// Minimal profile record persisted at registration, keyed by identity id.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserProfile {
    pub uid: IdentityId,
    pub email: String,
}

/// Local credential shape failures.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CredentialValidationError {
    EmptyEmail,
    InvalidEmail,
    EmptyPassword,
    PasswordTooShort { min: usize },
}

impl Display for CredentialValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::EmptyEmail => write!(f, "email is required"),
            Self::InvalidEmail => write!(f, "email address is badly formatted"),
            Self::EmptyPassword => write!(f, "password is required"),
            Self::PasswordTooShort { min } => {
                write!(f, "password must be at least {min} characters")
            }
        }
    }
}

impl Error for CredentialValidationError {}

/// Trims and lowercases an email for storage and lookup.
pub fn normalize_email(value: &str) -> String {
    value.trim().to_ascii_lowercase()
}

#[cfg(test)]
mod tests {
    use super::{normalize_email, CredentialValidationError, Credentials};

    #[test]
    fn new_normalizes_email() {
        let credentials = Credentials::new("  Ana@Doceria.COM ", "segredo");
        assert_eq!(credentials.email, "ana@doceria.com");
        assert_eq!(normalize_email(" X@Y.Z"), "x@y.z");
    }

    #[test]
    fn validate_checks_email_then_password() {
        assert_eq!(
            Credentials::new("", "segredo").validate(),
            Err(CredentialValidationError::EmptyEmail)
        );
        assert_eq!(
            Credentials::new("not-an-email", "segredo").validate(),
            Err(CredentialValidationError::InvalidEmail)
        );
        assert_eq!(
            Credentials::new("ana@doceria.com", "12345").validate(),
            Err(CredentialValidationError::PasswordTooShort { min: 6 })
        );
        assert_eq!(
            Credentials::new("ana@doceria.com", "123456").validate(),
            Ok(())
        );
    }

    #[test]
    fn sign_in_only_requires_non_empty_password() {
        assert_eq!(
            Credentials::new("ana@doceria.com", "").validate_for_sign_in(),
            Err(CredentialValidationError::EmptyPassword)
        );
        assert_eq!(
            Credentials::new("ana@doceria.com", "123").validate_for_sign_in(),
            Ok(())
        );
    }

    #[test]
    fn debug_output_redacts_password() {
        let rendered = format!("{:?}", Credentials::new("ana@doceria.com", "hunter22"));
        assert!(!rendered.contains("hunter22"));
        assert!(rendered.contains("<redacted>"));
    }
}
