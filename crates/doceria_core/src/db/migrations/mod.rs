//! Doceria schema history.
//!
//! Version 1 creates the identity tables (`accounts`, `profiles`) and the
//! owner-scoped `items` collection with its `(owner_id, created_at)` index.
//! Each step runs in its own transaction and bumps `PRAGMA user_version`.

use crate::db::{DbError, DbResult};
use log::info;
use rusqlite::{Connection, OptionalExtension};

struct SchemaStep {
    version: u32,
    name: &'static str,
    sql: &'static str,
}

const SCHEMA_STEPS: &[SchemaStep] = &[SchemaStep {
    version: 1,
    name: "identity_and_items",
    sql: include_str!("0001_init.sql"),
}];

/// Tables every opened connection must expose.
pub const REQUIRED_TABLES: &[&str] = &["accounts", "profiles", "items"];

/// Schema version written by this build.
pub fn latest_version() -> u32 {
    SCHEMA_STEPS.last().map_or(0, |step| step.version)
}

/// Brings `conn` up to [`latest_version`] and checks the Doceria tables exist.
///
/// # Errors
/// - `SchemaTooNew` when the file comes from a newer build.
/// - `Migration` when a step fails; that step is rolled back.
/// - `MissingTable` when the version is current but a table is absent.
pub fn migrate(conn: &mut Connection) -> DbResult<()> {
    let found = user_version(conn)?;
    let supported = latest_version();
    if found > supported {
        return Err(DbError::SchemaTooNew { found, supported });
    }

    for step in SCHEMA_STEPS.iter().filter(|step| step.version > found) {
        apply_step(conn, step).map_err(|source| DbError::Migration {
            version: step.version,
            name: step.name,
            source,
        })?;
        info!(
            "event=db_migrate module=db status=ok version={} step={}",
            step.version, step.name
        );
    }

    verify_tables(conn)
}

fn apply_step(conn: &mut Connection, step: &SchemaStep) -> rusqlite::Result<()> {
    let tx = conn.transaction()?;
    tx.execute_batch(step.sql)?;
    tx.pragma_update(None, "user_version", step.version)?;
    tx.commit()
}

fn verify_tables(conn: &Connection) -> DbResult<()> {
    for table in REQUIRED_TABLES {
        let found = conn
            .query_row(
                "SELECT 1 FROM sqlite_master WHERE type = 'table' AND name = ?1;",
                [table],
                |_| Ok(()),
            )
            .optional()?;
        if found.is_none() {
            return Err(DbError::MissingTable(*table));
        }
    }
    Ok(())
}

fn user_version(conn: &Connection) -> DbResult<u32> {
    Ok(conn.query_row("PRAGMA user_version;", [], |row| row.get(0))?)
}
