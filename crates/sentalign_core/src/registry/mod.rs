//! Sentence registry: ownership and lookup index over loaded documents.
//!
//! # Responsibility
//! - Validate document integrity once, at load.
//! - Answer sentence/document existence and lookup queries.
//!
//! # Invariants
//! - Sentence ids are unique across all documents.
//! - Every line only references sentences owned by its own document.
//! - A registry is immutable after `build`.

pub mod sentence_registry;
