//! Read-only document repository contracts.
//!
//! # Responsibility
//! - Define the injected data-access seam the core reads documents from.
//! - Keep storage details outside registry and alignment logic.
//!
//! # Invariants
//! - Repositories never mutate documents handed to the core.
//! - Lookup misses are `Ok(None)`, not errors.

pub mod document_repo;
