//! Document model shared by registry, alignment and segmentation.
//!
//! # Responsibility
//! - Define the canonical document/line/sentence shapes loaded at startup.
//! - Define the persisted record exchanged at the storage boundary.
//!
//! # Invariants
//! - Documents exclusively own their lines and sentences.
//! - A sentence refers back to its document by id only.
//! - Model values are immutable once a registry has been built from them.

pub mod document;
pub mod record;
