//! Domain model for the confectionery inventory.
//!
//! # Responsibility
//! - Define canonical data structures used by core business logic.
//! - Own local validation rules that run before any backend call.
//!
//! # Invariants
//! - Every persisted item is identified by a backend-assigned id and scoped
//!   to exactly one owner identity.

pub mod account;
pub mod item;
