//! Service-level error for the data-access layer.

use crate::model::account::CredentialValidationError;
use crate::model::item::ItemValidationError;
use crate::repo::RepoError;
use std::error::Error;
use std::fmt::{Display, Formatter};

pub type ServiceResult<T> = Result<T, ServiceError>;

/// Failure returned by `IdentityGateway` and `ItemStore`.
///
/// `Display` renders the single human-readable reason shown inline by the
/// initiating screen.
#[derive(Debug)]
pub enum ServiceError {
    /// No identity is signed in.
    NotLoggedIn,
    /// Update/delete called without a backend-assigned id.
    InvalidId,
    Validation(ItemValidationError),
    Credentials(CredentialValidationError),
    /// Account was created but its profile record could not be written.
    ProfileSave(RepoError),
    Repo(RepoError),
}

impl ServiceError {
    /// Whether the failure was detected locally, before any backend call.
    pub fn is_local(&self) -> bool {
        matches!(
            self,
            Self::NotLoggedIn | Self::InvalidId | Self::Validation(_) | Self::Credentials(_)
        )
    }

    /// Rendered reason, or `fallback` when the reason is blank.
    pub fn reason_or(&self, fallback: &str) -> String {
        let reason = self.to_string();
        if reason.trim().is_empty() {
            fallback.to_string()
        } else {
            reason
        }
    }
}

impl Display for ServiceError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NotLoggedIn => write!(f, "not logged in"),
            Self::InvalidId => write!(f, "invalid id"),
            Self::Validation(err) => write!(f, "{err}"),
            Self::Credentials(err) => write!(f, "{err}"),
            Self::ProfileSave(err) => write!(f, "failed to save profile: {err}"),
            Self::Repo(err) => write!(f, "{err}"),
        }
    }
}

impl Error for ServiceError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::NotLoggedIn | Self::InvalidId => None,
            Self::Validation(err) => Some(err),
            Self::Credentials(err) => Some(err),
            Self::ProfileSave(err) | Self::Repo(err) => Some(err),
        }
    }
}

impl From<ItemValidationError> for ServiceError {
    fn from(value: ItemValidationError) -> Self {
        Self::Validation(value)
    }
}

impl From<CredentialValidationError> for ServiceError {
    fn from(value: CredentialValidationError) -> Self {
        Self::Credentials(value)
    }
}

impl From<RepoError> for ServiceError {
    fn from(value: RepoError) -> Self {
        match value {
            RepoError::Validation(err) => Self::Validation(err),
            RepoError::Credentials(err) => Self::Credentials(err),
            other => Self::Repo(other),
        }
    }
}
