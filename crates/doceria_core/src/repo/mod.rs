//! Backend abstraction and embedded SQLite implementation.
//!
//! # Responsibility
//! - Define the identity-provider and document-store contracts the services
//!   talk to.
//! - Isolate SQLite query details from service orchestration.
//!
//! # Invariants
//! - Item write paths validate fields before SQL mutations.
//! - Every item read and write is scoped by owner id.
//! - Repository APIs return semantic errors (`NotFound`,
//!   `InvalidCredentials`) in addition to DB transport errors.

use crate::db::DbError;
use crate::model::account::CredentialValidationError;
use crate::model::item::ItemValidationError;
use std::error::Error;
use std::fmt::{Display, Formatter};

pub mod identity_repo;
pub mod item_repo;
pub mod password;

pub type RepoResult<T> = Result<T, RepoError>;

/// Backend error for identity and item persistence.
#[derive(Debug)]
pub enum RepoError {
    Validation(ItemValidationError),
    Credentials(CredentialValidationError),
    Db(DbError),
    NotFound(String),
    InvalidData(String),
    EmailAlreadyInUse,
    InvalidCredentials,
    PasswordHash(String),
}

impl Display for RepoError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Validation(err) => write!(f, "{err}"),
            Self::Credentials(err) => write!(f, "{err}"),
            Self::Db(err) => write!(f, "{err}"),
            Self::NotFound(id) => write!(f, "item not found: {id}"),
            Self::InvalidData(message) => write!(f, "invalid persisted data: {message}"),
            Self::EmailAlreadyInUse => {
                write!(f, "the email address is already in use by another account")
            }
            Self::InvalidCredentials => write!(f, "email or password is incorrect"),
            Self::PasswordHash(message) => write!(f, "password hashing failed: {message}"),
        }
    }
}

impl Error for RepoError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Validation(err) => Some(err),
            Self::Credentials(err) => Some(err),
            Self::Db(err) => Some(err),
            Self::NotFound(_)
            | Self::InvalidData(_)
            | Self::EmailAlreadyInUse
            | Self::InvalidCredentials
            | Self::PasswordHash(_) => None,
        }
    }
}

impl From<ItemValidationError> for RepoError {
    fn from(value: ItemValidationError) -> Self {
        Self::Validation(value)
    }
}

impl From<CredentialValidationError> for RepoError {
    fn from(value: CredentialValidationError) -> Self {
        Self::Credentials(value)
    }
}

impl From<DbError> for RepoError {
    fn from(value: DbError) -> Self {
        Self::Db(value)
    }
}

impl From<rusqlite::Error> for RepoError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Db(DbError::Sqlite(value))
    }
}
