use doceria_core::db::open_db_in_memory;
use doceria_core::{
    ItemFields, ItemRepository, ItemValidationError, LiveQueryHub, RepoError,
    SqliteItemRepository,
};
use rusqlite::Connection;
use std::sync::Arc;

fn brigadeiro() -> ItemFields {
    ItemFields::new("Brigadeiro", "Candy", 10, 2.5)
}

#[test]
fn insert_assigns_id_and_owner() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteItemRepository::new(&conn, LiveQueryHub::new());

    let item = repo.insert_item("user-u", &brigadeiro()).unwrap();
    assert!(!item.id.is_empty());
    assert_eq!(item.owner_id, "user-u");

    let loaded = repo.get_item("user-u", &item.id).unwrap().unwrap();
    assert_eq!(loaded, item);
}

#[test]
fn list_is_scoped_to_owner_and_ordered_by_creation() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteItemRepository::new(&conn, LiveQueryHub::new());

    let first = repo.insert_item("user-u", &brigadeiro()).unwrap();
    repo.insert_item("user-v", &ItemFields::new("Quindim", "Candy", 3, 4.0))
        .unwrap();
    let second = repo
        .insert_item("user-u", &ItemFields::new("Bolo de cenoura", "Cake", 1, 35.0))
        .unwrap();

    let items = repo.list_items("user-u").unwrap();
    let ids = items.iter().map(|item| item.id.as_str()).collect::<Vec<_>>();
    assert_eq!(ids, vec![first.id.as_str(), second.id.as_str()]);
    assert!(items.iter().all(|item| item.owner_id == "user-u"));
}

#[test]
fn update_writes_mutable_fields_and_keeps_owner() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteItemRepository::new(&conn, LiveQueryHub::new());
    let item = repo.insert_item("user-u", &brigadeiro()).unwrap();

    let changed = ItemFields::new("Brigadeiro gourmet", "Candy", 20, 4.0);
    repo.update_item("user-u", &item.id, &changed).unwrap();

    let loaded = repo.get_item("user-u", &item.id).unwrap().unwrap();
    assert_eq!(loaded.fields(), changed);
    assert_eq!(loaded.owner_id, "user-u");
}

#[test]
fn update_and_delete_cannot_reach_another_owners_item() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteItemRepository::new(&conn, LiveQueryHub::new());
    let item = repo.insert_item("user-u", &brigadeiro()).unwrap();

    let update_err = repo
        .update_item("user-v", &item.id, &brigadeiro())
        .unwrap_err();
    assert!(matches!(update_err, RepoError::NotFound(id) if id == item.id));

    let delete_err = repo.delete_item("user-v", &item.id).unwrap_err();
    assert!(matches!(delete_err, RepoError::NotFound(_)));

    assert!(repo.get_item("user-v", &item.id).unwrap().is_none());
    assert!(repo.get_item("user-u", &item.id).unwrap().is_some());
}

#[test]
fn delete_removes_item_and_second_delete_is_not_found() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteItemRepository::new(&conn, LiveQueryHub::new());
    let item = repo.insert_item("user-u", &brigadeiro()).unwrap();

    repo.delete_item("user-u", &item.id).unwrap();
    assert!(repo.get_item("user-u", &item.id).unwrap().is_none());

    let err = repo.delete_item("user-u", &item.id).unwrap_err();
    assert!(matches!(err, RepoError::NotFound(_)));
}

#[test]
fn validation_failure_blocks_insert_and_update() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteItemRepository::new(&conn, LiveQueryHub::new());

    let insert_err = repo
        .insert_item("user-u", &ItemFields::new("", "Candy", 1, 1.0))
        .unwrap_err();
    assert!(matches!(
        insert_err,
        RepoError::Validation(ItemValidationError::EmptyName)
    ));

    let item = repo.insert_item("user-u", &brigadeiro()).unwrap();
    let update_err = repo
        .update_item("user-u", &item.id, &ItemFields::new("Bolo", "Cake", 1, -2.0))
        .unwrap_err();
    assert!(matches!(
        update_err,
        RepoError::Validation(ItemValidationError::NonPositivePrice(_))
    ));
    assert_eq!(count_items(&conn), 1);
}

#[test]
fn read_rejects_rows_with_blank_owner() {
    let conn = open_db_in_memory().unwrap();
    conn.execute(
        "INSERT INTO items (id, name, category, quantity, price, owner_id)
         VALUES ('broken', 'Bolo', 'Cake', 1, 10.0, '');",
        [],
    )
    .unwrap();
    let repo = SqliteItemRepository::new(&conn, LiveQueryHub::new());

    let err = repo.list_items("").unwrap_err();
    assert!(matches!(err, RepoError::InvalidData(message) if message.contains("broken")));
}

#[test]
fn failed_snapshot_refresh_never_fails_the_write() {
    let conn = open_db_in_memory().unwrap();
    let hub = LiveQueryHub::new();
    let repo = SqliteItemRepository::new(&conn, Arc::clone(&hub));
    let broken = repo.insert_item("user-u", &brigadeiro()).unwrap();
    let subscription = repo.listen_items("user-u").unwrap();
    assert_eq!(subscription.latest().map(|items| items.len()), Some(1));

    conn.execute("UPDATE items SET id = ' ' WHERE id = ?1;", [&broken.id])
        .unwrap();

    let written = repo.insert_item("user-u", &ItemFields::new("Pudim", "Dessert", 2, 18.0));
    assert!(written.is_ok(), "write must survive a failed refresh: {written:?}");
    assert!(subscription.try_next().is_none());
    assert_eq!(hub.listener_count(), 1);
    assert_eq!(count_items(&conn), 2);
}

fn count_items(conn: &Connection) -> i64 {
    conn.query_row("SELECT COUNT(*) FROM items;", [], |row| row.get(0))
        .unwrap()
}
