use doceria_core::db::open_db_in_memory;
use doceria_core::{
    Item, ItemFields, ItemRepository, ItemStore, ItemValidationError, LiveQueryHub, RepoError,
    RepoResult, ServiceError, Session, SqliteItemRepository, Subscription,
};
use std::cell::Cell;
use std::sync::Arc;

fn brigadeiro() -> ItemFields {
    ItemFields::new("Brigadeiro", "Candy", 10, 2.5)
}

fn signed_in(uid: &str) -> Session {
    let session = Session::new();
    session.set_identity(uid.to_string());
    session
}

#[test]
fn create_while_authenticated_assigns_id_and_owner() {
    let conn = open_db_in_memory().unwrap();
    let store = ItemStore::new(
        SqliteItemRepository::new(&conn, LiveQueryHub::new()),
        signed_in("user-u"),
    );

    let item = store.create(&brigadeiro()).unwrap();
    assert!(!item.id.is_empty());
    assert_eq!(item.owner_id, "user-u");
    assert_eq!(item.fields(), brigadeiro());
    assert_eq!(store.get(&item.id).unwrap(), Some(item));
}

#[test]
fn create_while_unauthenticated_fails_with_not_logged_in() {
    let repo = CountingItemRepository::default();
    let store = ItemStore::new(&repo, Session::new());

    let err = store.create(&brigadeiro()).unwrap_err();
    assert!(matches!(err, ServiceError::NotLoggedIn));
    assert_eq!(err.to_string(), "not logged in");
    assert_eq!(repo.calls.get(), 0);
}

#[test]
fn invalid_fields_are_rejected_before_any_store_call() {
    let repo = CountingItemRepository::default();
    let store = ItemStore::new(&repo, signed_in("user-u"));

    let cases = [
        (
            ItemFields::new("", "Candy", 10, 2.5),
            ItemValidationError::EmptyName,
        ),
        (
            ItemFields::new("Brigadeiro", "", 10, 2.5),
            ItemValidationError::EmptyCategory,
        ),
        (
            ItemFields::new("Brigadeiro", "Candy", 0, 2.5),
            ItemValidationError::NonPositiveQuantity(0),
        ),
        (
            ItemFields::new("Brigadeiro", "Candy", 10, -1.0),
            ItemValidationError::NonPositivePrice(-1.0),
        ),
    ];

    for (fields, expected) in cases {
        let err = store.create(&fields).unwrap_err();
        assert!(
            matches!(&err, ServiceError::Validation(actual) if *actual == expected),
            "unexpected error for {fields:?}: {err}"
        );
    }
    assert_eq!(repo.calls.get(), 0);
}

#[test]
fn create_and_update_store_trimmed_text() {
    let conn = open_db_in_memory().unwrap();
    let store = ItemStore::new(
        SqliteItemRepository::new(&conn, LiveQueryHub::new()),
        signed_in("user-u"),
    );

    let created = store
        .create(&ItemFields::new("  Bolo  ", " Cake ", 1, 1.0))
        .unwrap();
    assert_eq!(created.name, "Bolo");
    assert_eq!(created.category, "Cake");
    let stored = store.get(&created.id).unwrap().unwrap();
    assert_eq!((stored.name.as_str(), stored.category.as_str()), ("Bolo", "Cake"));

    let mut edited = stored;
    edited.name = "\tBolo de rolo ".to_string();
    edited.category = "  Bolo".to_string();
    store.update(&edited).unwrap();
    let stored = store.get(&created.id).unwrap().unwrap();
    assert_eq!(stored.name, "Bolo de rolo");
    assert_eq!(stored.category, "Bolo");
}

#[test]
fn update_and_delete_with_empty_id_fail_without_store_call() {
    let repo = CountingItemRepository::default();
    let store = ItemStore::new(&repo, signed_in("user-u"));

    let draft = Item::from_fields("", "user-u", brigadeiro());
    let update_err = store.update(&draft).unwrap_err();
    assert!(matches!(update_err, ServiceError::InvalidId));
    assert_eq!(update_err.to_string(), "invalid id");

    let delete_err = store.delete("").unwrap_err();
    assert_eq!(delete_err.to_string(), "invalid id");

    assert_eq!(repo.calls.get(), 0);
}

#[test]
fn update_never_changes_owner() {
    let conn = open_db_in_memory().unwrap();
    let store = ItemStore::new(
        SqliteItemRepository::new(&conn, LiveQueryHub::new()),
        signed_in("user-u"),
    );
    let mut item = store.create(&brigadeiro()).unwrap();

    item.quantity = 25;
    item.owner_id = "someone-else".to_string();
    store.update(&item).unwrap();

    let stored = store.get(&item.id).unwrap().unwrap();
    assert_eq!(stored.quantity, 25);
    assert_eq!(stored.owner_id, "user-u");
}

#[test]
fn update_of_unknown_item_surfaces_not_found() {
    let conn = open_db_in_memory().unwrap();
    let store = ItemStore::new(
        SqliteItemRepository::new(&conn, LiveQueryHub::new()),
        signed_in("user-u"),
    );
    let ghost = Item::from_fields("missing-id", "user-u", brigadeiro());

    let err = store.update(&ghost).unwrap_err();
    assert!(matches!(err, ServiceError::Repo(RepoError::NotFound(_))));
    assert!(!err.is_local());
}

#[test]
fn delete_removes_item_from_list() {
    let conn = open_db_in_memory().unwrap();
    let store = ItemStore::new(
        SqliteItemRepository::new(&conn, LiveQueryHub::new()),
        signed_in("user-u"),
    );
    let kept = store.create(&brigadeiro()).unwrap();
    let removed = store
        .create(&ItemFields::new("Pudim", "Dessert", 2, 18.0))
        .unwrap();

    store.delete(&removed.id).unwrap();

    assert_eq!(store.list().unwrap(), vec![kept]);
}

#[test]
fn subscribe_requires_authentication() {
    let conn = open_db_in_memory().unwrap();
    let hub = LiveQueryHub::new();
    let store = ItemStore::new(
        SqliteItemRepository::new(&conn, Arc::clone(&hub)),
        Session::new(),
    );

    assert!(matches!(store.subscribe(), Err(ServiceError::NotLoggedIn)));
    assert_eq!(hub.listener_count(), 0);
}

#[derive(Default)]
struct CountingItemRepository {
    calls: Cell<usize>,
}

impl CountingItemRepository {
    fn hit(&self) {
        self.calls.set(self.calls.get() + 1);
    }
}

impl ItemRepository for &CountingItemRepository {
    fn insert_item(&self, owner_id: &str, fields: &ItemFields) -> RepoResult<Item> {
        self.hit();
        Ok(Item::from_fields("fake-id", owner_id, fields.clone()))
    }

    fn update_item(&self, _owner_id: &str, _id: &str, _fields: &ItemFields) -> RepoResult<()> {
        self.hit();
        Ok(())
    }

    fn delete_item(&self, _owner_id: &str, _id: &str) -> RepoResult<()> {
        self.hit();
        Ok(())
    }

    fn get_item(&self, _owner_id: &str, _id: &str) -> RepoResult<Option<Item>> {
        self.hit();
        Ok(None)
    }

    fn list_items(&self, _owner_id: &str) -> RepoResult<Vec<Item>> {
        self.hit();
        Ok(Vec::new())
    }

    fn listen_items(&self, owner_id: &str) -> RepoResult<Subscription> {
        self.hit();
        LiveQueryHub::new().register_with(owner_id, || Ok(Vec::new()))
    }
}
