//! Flutter bridge for the Doceria core.
//!
//! # Responsibility
//! - Own process-level state (DB path, session, live-query hub, open
//!   subscriptions) so core types stay injectable.
//! - Expose use-case functions to Dart via `api`.

pub mod api;
