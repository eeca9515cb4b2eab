//! Catalog use-case services.
//!
//! # Responsibility
//! - Orchestrate capability checks, units of work and the reorder engine into
//!   use-case level APIs.
//! - Keep CLI/HTTP layers decoupled from storage details.

pub mod category_service;
