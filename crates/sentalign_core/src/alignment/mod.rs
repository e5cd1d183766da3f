//! Sentence alignment graph between processed and source documents.
//!
//! # Responsibility
//! - Turn untrusted candidate mappings into validated alignment graphs.
//! - Hold the active graph and replace it atomically.
//! - Define the boundary to external candidate generators.
//!
//! # Invariants
//! - An `AlignmentGraph` only exists after ingest -> normalize -> validate.
//! - Accepted graphs are symmetric: `s in forward[p] <=> p in backward[s]`.
//! - Every id in an accepted graph resolves in the registry.
//! - A rejected candidate never replaces the active graph.

pub mod candidate;
pub mod generator;
pub mod graph;
pub mod store;
