//! Catalog domain model.
//!
//! # Responsibility
//! - Define the category forest and course rows used by core logic.
//!
//! # Invariants
//! - Every row is identified by a stable integer id that is never reused.
//! - Reordering only mutates `parent` and `sort_order`.

pub mod category;
pub mod course;
