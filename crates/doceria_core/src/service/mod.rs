//! Data-access use-case services.
//!
//! # Responsibility
//! - Orchestrate repository calls into the Identity Gateway and Item Store
//!   contracts the UI talks to.
//! - Keep UI/FFI layers decoupled from storage details.
//!
//! # Invariants
//! - Services never hold process-global state; `Session` and repositories
//!   are injected by the caller.

pub mod error;
pub mod identity_gateway;
pub mod item_store;
pub mod session;
