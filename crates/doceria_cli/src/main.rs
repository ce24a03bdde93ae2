//! CLI smoke entry point.
//!
//! # Responsibility
//! - Provide a minimal executable to verify `doceria_core` linkage.
//! - Run one in-memory register/create/subscribe pass with deterministic
//!   output for quick local sanity checks.

use doceria_core::db::open_db_in_memory;
use doceria_core::{
    IdentityGateway, ItemFields, ItemStore, LiveQueryHub, Session, SqliteIdentityRepository,
    SqliteItemRepository,
};
use std::process::ExitCode;
use std::sync::Arc;

fn main() -> ExitCode {
    println!("doceria_core ping={}", doceria_core::ping());
    println!("doceria_core version={}", doceria_core::core_version());

    match run_probe() {
        Ok(summary) => {
            println!("{summary}");
            ExitCode::SUCCESS
        }
        Err(err) => {
            eprintln!("doceria_core probe failed: {err}");
            ExitCode::FAILURE
        }
    }
}

fn run_probe() -> Result<String, Box<dyn std::error::Error>> {
    let conn = open_db_in_memory()?;
    let session = Session::new();
    let hub = LiveQueryHub::new();

    let gateway = IdentityGateway::new(SqliteIdentityRepository::new(&conn), session.clone());
    gateway.register("probe@doceria.local", "probe-secret")?;

    let store = ItemStore::new(SqliteItemRepository::new(&conn, Arc::clone(&hub)), session);
    let subscription = store.subscribe()?;
    let item = store.create(&ItemFields::new("Brigadeiro", "Doce", 10, 2.5))?;
    let snapshot = subscription.latest().unwrap_or_default();
    subscription.release();

    Ok(format!(
        "doceria_core probe items={} first={} price={}",
        snapshot.len(),
        item.name,
        item.price_label()
    ))
}
