//! Identity provider contract and SQLite-backed implementation.
//!
//! # Responsibility
//! - Create accounts and verify email/password credentials.
//! - Persist the minimal profile record keyed by identity id.
//!
//! # Invariants
//! - One account per normalized email.
//! - Only Argon2id hashes are stored, never the plaintext password.
//! - Unknown email and wrong password both map to `InvalidCredentials`.

use super::password::{hash_password, verify_password};
use super::{RepoError, RepoResult};
use crate::model::account::{Credentials, IdentityId, UserProfile};
use rusqlite::{params, Connection, ErrorCode, OptionalExtension};
use uuid::Uuid;

/// Identity provider interface used by `IdentityGateway`.
pub trait IdentityRepository {
    fn create_account(&self, credentials: &Credentials) -> RepoResult<IdentityId>;
    fn verify_credentials(&self, credentials: &Credentials) -> RepoResult<IdentityId>;
    fn save_profile(&self, profile: &UserProfile) -> RepoResult<()>;
    fn get_profile(&self, uid: &str) -> RepoResult<Option<UserProfile>>;
}

/// SQLite-backed identity provider.
pub struct SqliteIdentityRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteIdentityRepository<'conn> {
    pub fn new(conn: &'conn Connection) -> Self {
        Self { conn }
    }
}

impl IdentityRepository for SqliteIdentityRepository<'_> {
    fn create_account(&self, credentials: &Credentials) -> RepoResult<IdentityId> {
        credentials.validate()?;

        let uid = Uuid::new_v4().to_string();
        let password_hash = hash_password(&credentials.password)?;

        let inserted = self.conn.execute(
            "INSERT INTO accounts (uid, email, password_hash) VALUES (?1, ?2, ?3);",
            params![uid, credentials.email, password_hash],
        );

        match inserted {
            Ok(_) => Ok(uid),
            Err(rusqlite::Error::SqliteFailure(err, _))
                if err.code == ErrorCode::ConstraintViolation =>
            {
                Err(RepoError::EmailAlreadyInUse)
            }
            Err(err) => Err(err.into()),
        }
    }

    fn verify_credentials(&self, credentials: &Credentials) -> RepoResult<IdentityId> {
        let account = self
            .conn
            .query_row(
                "SELECT uid, password_hash FROM accounts WHERE email = ?1;",
                [credentials.email.as_str()],
                |row| Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?)),
            )
            .optional()?;

        let Some((uid, stored_hash)) = account else {
            return Err(RepoError::InvalidCredentials);
        };

        if verify_password(&credentials.password, &stored_hash)? {
            Ok(uid)
        } else {
            Err(RepoError::InvalidCredentials)
        }
    }

    fn save_profile(&self, profile: &UserProfile) -> RepoResult<()> {
        self.conn.execute(
            "INSERT INTO profiles (uid, email) VALUES (?1, ?2)
             ON CONFLICT(uid) DO UPDATE SET
                email = excluded.email,
                updated_at = (CAST((julianday('now') - 2440587.5) * 86400000 AS INTEGER));",
            params![profile.uid, profile.email],
        )?;
        Ok(())
    }

    fn get_profile(&self, uid: &str) -> RepoResult<Option<UserProfile>> {
        let profile = self
            .conn
            .query_row(
                "SELECT uid, email FROM profiles WHERE uid = ?1;",
                [uid],
                |row| {
                    Ok(UserProfile {
                        uid: row.get(0)?,
                        email: row.get(1)?,
                    })
                },
            )
            .optional()?;
        Ok(profile)
    }
}
