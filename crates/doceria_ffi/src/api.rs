//! FFI use-case API for Flutter-facing calls.
//!
//! # Responsibility
//! - Expose identity and item use-cases to Dart via FRB.
//! - Hold the process-wide session, live-query hub and open subscriptions.
//!
//! # Invariants
//! - Exported functions must not panic across FFI boundary.
//! - Non-`sync` functions run on the bridge worker pool and resolve as Dart
//!   futures; the UI never blocks on storage.
//! - Failures are reported as human-readable `message` strings.

use doceria_core::db::open_db;
use doceria_core::{
    core_version as core_version_inner, format_price_brl, init_logging as init_logging_inner,
    ping as ping_inner, IdentityGateway, Item, ItemFields, ItemForm, ItemStore, LiveQueryHub,
    ServiceError, ServiceResult, Session, SqliteIdentityRepository, SqliteItemRepository,
    Subscription, SubscriptionId,
};
use log::warn;
use std::collections::BTreeMap;
use std::path::PathBuf;
use std::sync::{Arc, Mutex, MutexGuard, OnceLock, PoisonError};
use std::time::Duration;

const DB_FILE_NAME: &str = "doceria.sqlite3";
const DB_PATH_ENV: &str = "DOCERIA_DB_PATH";
const SNAPSHOT_TIMEOUT_MAX_MS: u32 = 30_000;

static DB_PATH: OnceLock<PathBuf> = OnceLock::new();
static SESSION: OnceLock<Session> = OnceLock::new();
static LIVE_HUB: OnceLock<Arc<LiveQueryHub>> = OnceLock::new();
static OPEN_SUBSCRIPTIONS: OnceLock<Mutex<BTreeMap<SubscriptionId, Arc<Mutex<Subscription>>>>> =
    OnceLock::new();

/// Minimal health-check API for FRB smoke integration.
#[flutter_rust_bridge::frb(sync)]
pub fn ping() -> String {
    ping_inner().to_owned()
}

/// Expose core crate version through FFI.
#[flutter_rust_bridge::frb(sync)]
pub fn core_version() -> String {
    core_version_inner().to_owned()
}

/// Initializes Rust core logging once per process.
///
/// Input semantics:
/// - `level`: one of `trace|debug|info|warn|error` (case-insensitive).
/// - `log_dir`: absolute directory path where rolling logs are written.
///
/// # FFI contract
/// - Idempotent for the same `level + log_dir`; conflicts return an error.
/// - Returns empty string on success and error message on failure.
#[flutter_rust_bridge::frb(sync)]
pub fn init_logging(level: String, log_dir: String) -> String {
    match init_logging_inner(level.as_str(), log_dir.as_str()) {
        Ok(()) => String::new(),
        Err(err) => err,
    }
}

/// Pins the SQLite file used by every later call.
///
/// # FFI contract
/// - Call before any data-access function to override the default path.
/// - Idempotent for the same path; a different path after resolution is
///   rejected.
/// - Returns empty string on success and error message on failure.
#[flutter_rust_bridge::frb(sync)]
pub fn configure_db_path(path: String) -> String {
    let trimmed = path.trim();
    if trimmed.is_empty() {
        return "db path cannot be empty".to_string();
    }
    let requested = PathBuf::from(trimmed);
    let active = DB_PATH.get_or_init(|| requested.clone());
    if *active == requested {
        String::new()
    } else {
        format!(
            "db path already resolved to `{}`; refusing to switch to `{}`",
            active.display(),
            requested.display()
        )
    }
}

/// Outcome of sign-in or registration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthResponse {
    pub ok: bool,
    /// Signed-in identity id on success.
    pub uid: Option<String>,
    /// Failure reason for inline display; empty on success.
    pub message: String,
}

/// Outcome of an item create/update/delete.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ItemActionResponse {
    pub ok: bool,
    pub item_id: Option<String>,
    pub message: String,
}

impl ItemActionResponse {
    fn success(message: impl Into<String>, item_id: String) -> Self {
        Self {
            ok: true,
            item_id: Some(item_id),
            message: message.into(),
        }
    }

    fn failure(message: impl Into<String>) -> Self {
        Self {
            ok: false,
            item_id: None,
            message: message.into(),
        }
    }
}

/// List row projected for the main screen.
#[derive(Debug, Clone, PartialEq)]
pub struct ItemView {
    pub id: String,
    pub name: String,
    pub category: String,
    pub quantity: i64,
    pub price: f64,
    /// Price formatted as BRL, e.g. `R$ 2,50`.
    pub price_label: String,
    pub owner_id: String,
}

/// Outcome of opening a live item query.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubscribeResponse {
    pub ok: bool,
    pub subscription_id: Option<u64>,
    pub message: String,
}

/// Next snapshot pulled from a live item query.
#[derive(Debug, Clone, PartialEq)]
pub struct SnapshotResponse {
    pub ok: bool,
    /// `false` when the wait timed out with no change.
    pub has_update: bool,
    pub items: Vec<ItemView>,
    pub message: String,
}

/// Returns whether an identity is signed in.
#[flutter_rust_bridge::frb(sync)]
pub fn auth_is_logged_in() -> bool {
    session().is_authenticated()
}

/// Signs in with email and password.
pub fn auth_sign_in(email: String, password: String) -> AuthResponse {
    auth_response(
        with_gateway(|gateway| gateway.sign_in(&email, &password)),
        "unknown error while signing in.",
    )
}

/// Registers a new account, stores its profile and signs it in.
pub fn auth_register(email: String, password: String) -> AuthResponse {
    auth_response(
        with_gateway(|gateway| gateway.register(&email, &password)),
        "registration failed.",
    )
}

/// Signs out and releases every live query still held by Dart.
#[flutter_rust_bridge::frb(sync)]
pub fn auth_sign_out() {
    subscriptions().clear();
    session().clear();
}

/// Creates an item owned by the signed-in identity.
pub fn item_create(
    name: String,
    category: String,
    quantity: i64,
    price: f64,
) -> ItemActionResponse {
    let fields = ItemFields::new(name.trim(), category.trim(), quantity, price);
    create_item(&fields)
}

/// Creates an item from raw dialog text (quantity/price as typed).
pub fn item_create_from_form(
    name: String,
    category: String,
    quantity_text: String,
    price_text: String,
) -> ItemActionResponse {
    let form = ItemForm {
        name,
        category,
        quantity: quantity_text,
        price: price_text,
    };
    match form.parse() {
        Ok(fields) => create_item(&fields),
        Err(err) => ItemActionResponse::failure(err.to_string()),
    }
}

/// Updates name/category/quantity/price of an existing item.
pub fn item_update(
    id: String,
    name: String,
    category: String,
    quantity: i64,
    price: f64,
) -> ItemActionResponse {
    let item_id = id.trim().to_string();
    // Owner is resolved by the store from the session and never sent.
    let item = Item::from_fields(
        item_id.clone(),
        String::new(),
        ItemFields::new(name.trim(), category.trim(), quantity, price),
    );
    match with_item_store(|store| store.update(&item)) {
        Ok(()) => ItemActionResponse::success("Item updated.", item_id),
        Err(err) => {
            ItemActionResponse::failure(err.reason_or("unknown error while updating item."))
        }
    }
}

/// Deletes one of the signed-in identity's items.
pub fn item_delete(id: String) -> ItemActionResponse {
    let item_id = id.trim().to_string();
    match with_item_store(|store| store.delete(&item_id)) {
        Ok(()) => ItemActionResponse::success("Item deleted.", item_id),
        Err(err) => {
            ItemActionResponse::failure(err.reason_or("unknown error while deleting item."))
        }
    }
}

/// Opens a live query over the signed-in identity's items.
///
/// The first `items_next_snapshot` call returns the current list. Dart must
/// call `items_unsubscribe` when the list screen is disposed.
pub fn items_subscribe() -> SubscribeResponse {
    match with_item_store(|store| store.subscribe()) {
        Ok(subscription) => {
            let id = subscription.id();
            subscriptions().insert(id, Arc::new(Mutex::new(subscription)));
            SubscribeResponse {
                ok: true,
                subscription_id: Some(id),
                message: String::new(),
            }
        }
        Err(err) => SubscribeResponse {
            ok: false,
            subscription_id: None,
            message: err.reason_or("unknown error while loading items."),
        },
    }
}

/// Waits up to `timeout_ms` (clamped to 30s) for the newest snapshot.
pub fn items_next_snapshot(subscription_id: u64, timeout_ms: u32) -> SnapshotResponse {
    let Some(handle) = subscriptions().get(&subscription_id).cloned() else {
        return SnapshotResponse {
            ok: false,
            has_update: false,
            items: Vec::new(),
            message: format!("subscription not found: {subscription_id}"),
        };
    };

    let subscription = handle.lock().unwrap_or_else(PoisonError::into_inner);
    let timeout = normalize_snapshot_timeout(timeout_ms);
    let received = if timeout.is_zero() {
        subscription.try_next()
    } else {
        subscription.next_timeout(timeout)
    };
    let newest = received.map(|first| subscription.latest().unwrap_or(first));

    match newest {
        Some(items) => SnapshotResponse {
            ok: true,
            has_update: true,
            items: items.iter().map(to_item_view).collect(),
            message: String::new(),
        },
        None => SnapshotResponse {
            ok: true,
            has_update: false,
            items: Vec::new(),
            message: String::new(),
        },
    }
}

/// Releases a live query. Returns `false` when it was already closed.
#[flutter_rust_bridge::frb(sync)]
pub fn items_unsubscribe(subscription_id: u64) -> bool {
    let removed = subscriptions().remove(&subscription_id);
    if removed.is_none() {
        warn!(
            "event=items_unsubscribe module=ffi status=error subscription_id={subscription_id} error_code=unknown_subscription"
        );
    }
    // Dropping the last handle unregisters it from the hub.
    removed.is_some()
}

/// Formats a price as BRL for display.
#[flutter_rust_bridge::frb(sync)]
pub fn format_price(price: f64) -> String {
    format_price_brl(price)
}

fn create_item(fields: &ItemFields) -> ItemActionResponse {
    match with_item_store(|store| store.create(fields)) {
        Ok(item) => ItemActionResponse::success("Item saved.", item.id),
        Err(err) => {
            ItemActionResponse::failure(err.reason_or("unknown error while saving item."))
        }
    }
}

fn auth_response(result: ServiceResult<String>, fallback: &str) -> AuthResponse {
    match result {
        Ok(uid) => AuthResponse {
            ok: true,
            uid: Some(uid),
            message: String::new(),
        },
        Err(err) => AuthResponse {
            ok: false,
            uid: None,
            message: err.reason_or(fallback),
        },
    }
}

fn normalize_snapshot_timeout(timeout_ms: u32) -> Duration {
    Duration::from_millis(u64::from(timeout_ms.min(SNAPSHOT_TIMEOUT_MAX_MS)))
}

fn resolve_db_path() -> PathBuf {
    DB_PATH
        .get_or_init(|| {
            if let Ok(raw) = std::env::var(DB_PATH_ENV) {
                let trimmed = raw.trim();
                if !trimmed.is_empty() {
                    return PathBuf::from(trimmed);
                }
            }
            std::env::temp_dir().join(DB_FILE_NAME)
        })
        .clone()
}

fn session() -> &'static Session {
    SESSION.get_or_init(Session::new)
}

fn live_hub() -> Arc<LiveQueryHub> {
    Arc::clone(LIVE_HUB.get_or_init(LiveQueryHub::new))
}

fn subscriptions() -> MutexGuard<'static, BTreeMap<SubscriptionId, Arc<Mutex<Subscription>>>> {
    OPEN_SUBSCRIPTIONS
        .get_or_init(|| Mutex::new(BTreeMap::new()))
        .lock()
        .unwrap_or_else(PoisonError::into_inner)
}

fn with_gateway<T>(
    f: impl FnOnce(&IdentityGateway<SqliteIdentityRepository<'_>>) -> ServiceResult<T>,
) -> ServiceResult<T> {
    let conn = open_db(resolve_db_path()).map_err(|err| ServiceError::Repo(err.into()))?;
    let gateway = IdentityGateway::new(SqliteIdentityRepository::new(&conn), session().clone());
    f(&gateway)
}

fn with_item_store<T>(
    f: impl FnOnce(&ItemStore<SqliteItemRepository<'_>>) -> ServiceResult<T>,
) -> ServiceResult<T> {
    let conn = open_db(resolve_db_path()).map_err(|err| ServiceError::Repo(err.into()))?;
    let store = ItemStore::new(
        SqliteItemRepository::new(&conn, live_hub()),
        session().clone(),
    );
    f(&store)
}

fn to_item_view(item: &Item) -> ItemView {
    ItemView {
        id: item.id.clone(),
        name: item.name.clone(),
        category: item.category.clone(),
        quantity: item.quantity,
        price: item.price,
        price_label: item.price_label(),
        owner_id: item.owner_id.clone(),
    }
}
