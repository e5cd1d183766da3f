//! Text segmentation: documents into sentences, lines into tagged spans.
//!
//! # Responsibility
//! - Project a line's sentence ids onto its raw text for exact rendering.
//! - Build structured documents (lines + sentences) from raw text.
//!
//! # Invariants
//! - Segmenting a line never fails and always reproduces the line text.
//! - Structured documents always pass registry integrity checks.

pub mod line_segmenter;
pub mod structurer;
