//! Core data-access logic for the Doceria inventory app.
//! This crate is the single source of truth for item and identity invariants.

pub mod db;
pub mod live;
pub mod logging;
pub mod model;
pub mod repo;
pub mod service;

pub use live::hub::{ItemSnapshot, LiveQueryHub, Subscription, SubscriptionId};
pub use logging::{default_log_level, init_logging, logging_status};
pub use model::account::{CredentialValidationError, Credentials, IdentityId, UserProfile};
pub use model::item::{format_price_brl, Item, ItemFields, ItemForm, ItemId, ItemValidationError};
pub use repo::identity_repo::{IdentityRepository, SqliteIdentityRepository};
pub use repo::item_repo::{ItemRepository, SqliteItemRepository};
pub use repo::{RepoError, RepoResult};
pub use service::error::{ServiceError, ServiceResult};
pub use service::identity_gateway::IdentityGateway;
pub use service::item_store::ItemStore;
pub use service::session::Session;

/// Minimal health-check API for early integration.
pub fn ping() -> &'static str {
    "pong"
}

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
