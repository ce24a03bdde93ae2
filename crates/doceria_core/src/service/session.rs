//! Signed-in identity shared between services.

use crate::model::account::IdentityId;
use std::sync::{Arc, PoisonError, RwLock};

/// Cloneable handle to the current identity.
///
/// Clones share state; inject the same session into `IdentityGateway` and
/// `ItemStore` so sign-in scopes every item call.
#[derive(Debug, Clone, Default)]
pub struct Session {
    current: Arc<RwLock<Option<IdentityId>>>,
}

impl Session {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn current_identity(&self) -> Option<IdentityId> {
        self.current
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn is_authenticated(&self) -> bool {
        self.current
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .is_some()
    }

    pub fn set_identity(&self, uid: IdentityId) {
        *self.current.write().unwrap_or_else(PoisonError::into_inner) = Some(uid);
    }

    pub fn clear(&self) {
        *self.current.write().unwrap_or_else(PoisonError::into_inner) = None;
    }
}
