//! Identity gateway use-case service.
//!
//! # Responsibility
//! - Sign in and register against the identity provider.
//! - Keep the injected `Session` in sync with the signed-in identity.
//!
//! # Invariants
//! - Credential shape is validated before any provider call.
//! - Registration persists `UserProfile { uid, email }` before reporting
//!   success, then signs the new identity in.
//! - Emails and passwords never appear in log events.

use crate::model::account::{Credentials, IdentityId, UserProfile};
use crate::repo::identity_repo::IdentityRepository;
use crate::service::error::{ServiceError, ServiceResult};
use crate::service::session::Session;
use log::{info, warn};

/// Use-case service for authentication flows.
pub struct IdentityGateway<R: IdentityRepository> {
    repo: R,
    session: Session,
}

impl<R: IdentityRepository> IdentityGateway<R> {
    pub fn new(repo: R, session: Session) -> Self {
        Self { repo, session }
    }

    pub fn is_authenticated(&self) -> bool {
        self.session.is_authenticated()
    }

    pub fn current_identity(&self) -> Option<IdentityId> {
        self.session.current_identity()
    }

    /// Signs in with email/password.
    ///
    /// # Errors
    /// - `Credentials` for malformed input (no provider call made).
    /// - `Repo(InvalidCredentials)` for unknown email or wrong password.
    pub fn sign_in(&self, email: &str, password: &str) -> ServiceResult<IdentityId> {
        let credentials = Credentials::new(email, password);
        credentials.validate_for_sign_in()?;

        match self.repo.verify_credentials(&credentials) {
            Ok(uid) => {
                self.session.set_identity(uid.clone());
                info!("event=auth_sign_in module=identity status=ok uid={uid}");
                Ok(uid)
            }
            Err(err) => {
                warn!("event=auth_sign_in module=identity status=error error={err}");
                Err(err.into())
            }
        }
    }

    /// Registers a new account and persists its profile record.
    ///
    /// # Errors
    /// - `Credentials` for malformed input (no provider call made).
    /// - `Repo(EmailAlreadyInUse)` when the email is taken.
    /// - `ProfileSave` when the account exists but its profile write failed.
    pub fn register(&self, email: &str, password: &str) -> ServiceResult<IdentityId> {
        let credentials = Credentials::new(email, password);
        credentials.validate()?;

        let uid = self.repo.create_account(&credentials).map_err(|err| {
            warn!("event=auth_register module=identity status=error stage=account error={err}");
            ServiceError::from(err)
        })?;

        let profile = UserProfile {
            uid: uid.clone(),
            email: credentials.email,
        };
        if let Err(err) = self.repo.save_profile(&profile) {
            warn!(
                "event=auth_register module=identity status=error stage=profile uid={uid} error={err}"
            );
            return Err(ServiceError::ProfileSave(err));
        }

        self.session.set_identity(uid.clone());
        info!("event=auth_register module=identity status=ok uid={uid}");
        Ok(uid)
    }

    /// Clears the signed-in identity. Idempotent.
    pub fn sign_out(&self) {
        if let Some(uid) = self.session.current_identity() {
            info!("event=auth_sign_out module=identity status=ok uid={uid}");
        }
        self.session.clear();
    }

    /// Loads the profile of the signed-in identity.
    pub fn current_profile(&self) -> ServiceResult<Option<UserProfile>> {
        let uid = self
            .session
            .current_identity()
            .ok_or(ServiceError::NotLoggedIn)?;
        Ok(self.repo.get_profile(&uid)?)
    }
}
