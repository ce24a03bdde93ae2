//! Live query support for the item collection.
//!
//! # Responsibility
//! - Register standing owner-scoped queries.
//! - Push full snapshots to them after every committed write.
//!
//! # Invariants
//! - Snapshots are complete lists, never deltas.
//! - Listener failures are logged and never surface to the writer.

pub mod hub;
