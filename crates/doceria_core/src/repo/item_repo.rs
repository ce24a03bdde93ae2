//! Item document store contract and SQLite implementation.
//!
//! # Responsibility
//! - Provide owner-scoped CRUD over the `items` collection.
//! - Feed live queries with a fresh snapshot after each committed write.
//!
//! # Invariants
//! - Write paths trim and validate `ItemFields` before SQL mutations.
//! - `owner_id` is written once by `insert_item` and never updated.
//! - Read paths reject invalid persisted rows instead of masking them.
//! - A failed snapshot refresh is logged, never returned to the writer.

use super::{RepoError, RepoResult};
use crate::live::hub::{LiveQueryHub, Subscription};
use crate::model::item::{Item, ItemFields};
use log::warn;
use rusqlite::{params, Connection, OptionalExtension, Row};
use std::sync::Arc;
use uuid::Uuid;

const ITEM_SELECT_SQL: &str = "SELECT
    id,
    name,
    category,
    quantity,
    price,
    owner_id
FROM items";

/// Document store interface used by `ItemStore`.
pub trait ItemRepository {
    fn insert_item(&self, owner_id: &str, fields: &ItemFields) -> RepoResult<Item>;
    fn update_item(&self, owner_id: &str, id: &str, fields: &ItemFields) -> RepoResult<()>;
    fn delete_item(&self, owner_id: &str, id: &str) -> RepoResult<()>;
    fn get_item(&self, owner_id: &str, id: &str) -> RepoResult<Option<Item>>;
    fn list_items(&self, owner_id: &str) -> RepoResult<Vec<Item>>;
    /// Registers a live query and queues the current snapshot on it.
    fn listen_items(&self, owner_id: &str) -> RepoResult<Subscription>;
}

/// SQLite-backed item store publishing to a shared live-query hub.
pub struct SqliteItemRepository<'conn> {
    conn: &'conn Connection,
    hub: Arc<LiveQueryHub>,
}

impl<'conn> SqliteItemRepository<'conn> {
    pub fn new(conn: &'conn Connection, hub: Arc<LiveQueryHub>) -> Self {
        Self { conn, hub }
    }

    fn notify_owner(&self, owner_id: &str) {
        let refreshed = self
            .hub
            .publish_with(owner_id, || self.list_items(owner_id));
        if let Err(err) = refreshed {
            warn!(
                "event=live_refresh module=repo status=error error_code=snapshot_query_failed error={}",
                err
            );
        }
    }
}

impl ItemRepository for SqliteItemRepository<'_> {
    fn insert_item(&self, owner_id: &str, fields: &ItemFields) -> RepoResult<Item> {
        let fields = fields.normalized();
        fields.validate()?;

        let item = Item::from_fields(Uuid::new_v4().to_string(), owner_id, fields);
        item.validate_persisted()?;

        self.conn.execute(
            "INSERT INTO items (
                id,
                name,
                category,
                quantity,
                price,
                owner_id
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6);",
            params![
                item.id,
                item.name,
                item.category,
                item.quantity,
                item.price,
                item.owner_id,
            ],
        )?;

        self.notify_owner(owner_id);
        Ok(item)
    }

    fn update_item(&self, owner_id: &str, id: &str, fields: &ItemFields) -> RepoResult<()> {
        let fields = fields.normalized();
        fields.validate()?;

        let changed = self.conn.execute(
            "UPDATE items
             SET
                name = ?1,
                category = ?2,
                quantity = ?3,
                price = ?4,
                updated_at = (CAST((julianday('now') - 2440587.5) * 86400000 AS INTEGER))
             WHERE id = ?5 AND owner_id = ?6;",
            params![
                fields.name,
                fields.category,
                fields.quantity,
                fields.price,
                id,
                owner_id,
            ],
        )?;

        if changed == 0 {
            return Err(RepoError::NotFound(id.to_string()));
        }

        self.notify_owner(owner_id);
        Ok(())
    }

    fn delete_item(&self, owner_id: &str, id: &str) -> RepoResult<()> {
        let changed = self.conn.execute(
            "DELETE FROM items WHERE id = ?1 AND owner_id = ?2;",
            params![id, owner_id],
        )?;

        if changed == 0 {
            return Err(RepoError::NotFound(id.to_string()));
        }

        self.notify_owner(owner_id);
        Ok(())
    }

    fn get_item(&self, owner_id: &str, id: &str) -> RepoResult<Option<Item>> {
        let mut stmt = self.conn.prepare(&format!(
            "{ITEM_SELECT_SQL}
             WHERE id = ?1 AND owner_id = ?2;"
        ))?;

        let row = stmt
            .query_row(params![id, owner_id], |row| Ok(read_item_row(row)))
            .optional()?;
        row.transpose()
    }

    fn list_items(&self, owner_id: &str) -> RepoResult<Vec<Item>> {
        let mut stmt = self.conn.prepare(&format!(
            "{ITEM_SELECT_SQL}
             WHERE owner_id = ?1
             ORDER BY created_at ASC, rowid ASC;"
        ))?;

        let mut rows = stmt.query([owner_id])?;
        let mut items = Vec::new();
        while let Some(row) = rows.next()? {
            items.push(read_item_row(row)?);
        }

        Ok(items)
    }

    fn listen_items(&self, owner_id: &str) -> RepoResult<Subscription> {
        self.hub
            .register_with(owner_id, || self.list_items(owner_id))
    }
}

fn read_item_row(row: &Row<'_>) -> RepoResult<Item> {
    let item = Item {
        id: row.get("id")?,
        name: row.get("name")?,
        category: row.get("category")?,
        quantity: row.get("quantity")?,
        price: row.get("price")?,
        owner_id: row.get("owner_id")?,
    };
    item.validate_persisted().map_err(|err| {
        RepoError::InvalidData(format!("item row `{}` failed validation: {err}", item.id))
    })?;
    Ok(item)
}
