//! Session-level services.
//!
//! # Responsibility
//! - Orchestrate registry, alignment store and segmenter into use cases.
//! - Drive interactive focus/unfocus/navigation for a UI layer.

pub mod alignment_service;
pub mod resolver;
