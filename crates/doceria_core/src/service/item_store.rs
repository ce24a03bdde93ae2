//! Item store use-case service.
//!
//! # Responsibility
//! - Provide owner-scoped create/update/delete and live list entry points.
//! - Trim and validate fields locally before any document store call.
//!
//! # Invariants
//! - Every call is scoped to the identity held by the injected `Session`.
//! - Update and delete reject an empty id before touching the store.
//! - Update sends the mutable field subset only; `owner_id` is never
//!   re-sent.

use crate::live::hub::Subscription;
use crate::model::item::{Item, ItemFields};
use crate::repo::item_repo::ItemRepository;
use crate::service::error::{ServiceError, ServiceResult};
use crate::service::session::Session;
use log::{info, warn};

/// Use-case service wrapper for item CRUD and live queries.
pub struct ItemStore<R: ItemRepository> {
    repo: R,
    session: Session,
}

impl<R: ItemRepository> ItemStore<R> {
    pub fn new(repo: R, session: Session) -> Self {
        Self { repo, session }
    }

    /// Opens a live query over the caller's items.
    ///
    /// The returned handle yields the current snapshot first, then a fresh
    /// snapshot after every insert, update or delete. Release it when the
    /// list screen goes away.
    pub fn subscribe(&self) -> ServiceResult<Subscription> {
        let owner_id = self.require_identity()?;
        let subscription = self.repo.listen_items(&owner_id)?;
        info!(
            "event=items_subscribe module=item_store status=ok subscription_id={}",
            subscription.id()
        );
        Ok(subscription)
    }

    /// Creates an item owned by the signed-in identity.
    ///
    /// # Errors
    /// - `Validation` for invalid fields (checked first, no store call).
    /// - `NotLoggedIn` when no identity is signed in.
    pub fn create(&self, fields: &ItemFields) -> ServiceResult<Item> {
        let fields = fields.normalized();
        fields.validate()?;
        let owner_id = self.require_identity()?;

        match self.repo.insert_item(&owner_id, &fields) {
            Ok(item) => {
                info!(
                    "event=item_create module=item_store status=ok item_id={}",
                    item.id
                );
                Ok(item)
            }
            Err(err) => {
                warn!("event=item_create module=item_store status=error error={err}");
                Err(err.into())
            }
        }
    }

    /// Updates name/category/quantity/price of an existing item.
    ///
    /// # Errors
    /// - `InvalidId` when `item.id` is empty (no store call).
    /// - `Repo(NotFound)` when the caller owns no item with that id.
    pub fn update(&self, item: &Item) -> ServiceResult<()> {
        if item.id.trim().is_empty() {
            return Err(ServiceError::InvalidId);
        }
        let fields = item.fields().normalized();
        fields.validate()?;
        let owner_id = self.require_identity()?;

        self.repo
            .update_item(&owner_id, &item.id, &fields)
            .map_err(|err| {
                warn!(
                    "event=item_update module=item_store status=error item_id={} error={}",
                    item.id, err
                );
                ServiceError::from(err)
            })?;
        info!(
            "event=item_update module=item_store status=ok item_id={}",
            item.id
        );
        Ok(())
    }

    /// Deletes one of the caller's items by id.
    pub fn delete(&self, item_id: &str) -> ServiceResult<()> {
        if item_id.trim().is_empty() {
            return Err(ServiceError::InvalidId);
        }
        let owner_id = self.require_identity()?;

        self.repo.delete_item(&owner_id, item_id).map_err(|err| {
            warn!(
                "event=item_delete module=item_store status=error item_id={} error={}",
                item_id, err
            );
            ServiceError::from(err)
        })?;
        info!("event=item_delete module=item_store status=ok item_id={item_id}");
        Ok(())
    }

    /// One-shot snapshot of the caller's items.
    pub fn list(&self) -> ServiceResult<Vec<Item>> {
        let owner_id = self.require_identity()?;
        Ok(self.repo.list_items(&owner_id)?)
    }

    /// Reads one of the caller's items.
    pub fn get(&self, item_id: &str) -> ServiceResult<Option<Item>> {
        if item_id.trim().is_empty() {
            return Err(ServiceError::InvalidId);
        }
        let owner_id = self.require_identity()?;
        Ok(self.repo.get_item(&owner_id, item_id)?)
    }

    fn require_identity(&self) -> ServiceResult<String> {
        self.session
            .current_identity()
            .ok_or(ServiceError::NotLoggedIn)
    }
}
