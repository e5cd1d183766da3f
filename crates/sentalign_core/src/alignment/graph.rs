//! Validated, read-only alignment graph.
//!
//! # Responsibility
//! - Answer "which sentences on the other side relate to this one".
//! - Export the graph back into record and flat-row shapes.
//!
//! # Invariants
//! - Value lists are sorted, deduplicated and non-empty.
//! - Forward and backward views mirror each other exactly.

use crate::alignment::candidate::{Adjacency, RawMapping};
use crate::model::document::{DocumentRole, SentenceId};
use crate::registry::sentence_registry::SentenceRegistry;
use serde::{Deserialize, Serialize};

/// One flattened processed/source edge with both sentence texts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MappingRow {
    pub processed_id: SentenceId,
    pub source_id: SentenceId,
    pub processed_text: String,
    pub source_text: String,
}

/// Size summary of a graph.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct GraphStats {
    /// Processed sentences with at least one source.
    pub processed_keys: usize,
    /// Source sentences cited by at least one processed sentence.
    pub source_keys: usize,
    /// Distinct processed/source pairs.
    pub edges: usize,
}

/// Symmetric processed <-> source sentence mapping.
///
/// Public construction is limited to the empty graph; populated graphs come
/// from [`CandidateMapping::validate`](crate::alignment::candidate::CandidateMapping::validate).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AlignmentGraph {
    forward: Adjacency,
    backward: Adjacency,
}

impl AlignmentGraph {
    pub fn empty() -> Self {
        Self::default()
    }

    pub(crate) fn from_validated(forward: Adjacency, backward: Adjacency) -> Self {
        Self { forward, backward }
    }

    /// Related ids on the opposite side of `side`.
    ///
    /// Unknown or unmapped ids yield an empty slice.
    pub fn query(&self, sentence_id: &str, side: DocumentRole) -> &[SentenceId] {
        let adjacency = match side {
            DocumentRole::Processed => &self.forward,
            DocumentRole::Source => &self.backward,
        };
        adjacency
            .get(sentence_id)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Processed -> source view.
    pub fn forward(&self) -> &Adjacency {
        &self.forward
    }

    /// Source -> processed view.
    pub fn backward(&self) -> &Adjacency {
        &self.backward
    }

    pub fn contains_edge(&self, processed_id: &str, source_id: &str) -> bool {
        self.forward
            .get(processed_id)
            .map(|sources| sources.binary_search_by(|id| id.as_str().cmp(source_id)).is_ok())
            .unwrap_or(false)
    }

    pub fn is_empty(&self) -> bool {
        self.forward.is_empty()
    }

    pub fn stats(&self) -> GraphStats {
        GraphStats {
            processed_keys: self.forward.len(),
            source_keys: self.backward.len(),
            edges: self.forward.values().map(Vec::len).sum(),
        }
    }

    /// Shape stored in the record's `mappings` field.
    pub fn to_raw_mapping(&self) -> RawMapping {
        RawMapping::new(self.forward.clone(), self.backward.clone())
    }

    /// Flattens forward edges into rows carrying both texts.
    pub fn to_rows(&self, registry: &SentenceRegistry) -> Vec<MappingRow> {
        let mut rows = Vec::with_capacity(self.stats().edges);
        for (processed_id, source_ids) in &self.forward {
            let Some(processed) = registry.get(processed_id) else {
                continue;
            };
            for source_id in source_ids {
                if let Some(source) = registry.get(source_id) {
                    rows.push(MappingRow {
                        processed_id: processed.id.clone(),
                        source_id: source.id.clone(),
                        processed_text: processed.text.clone(),
                        source_text: source.text.clone(),
                    });
                }
            }
        }
        rows
    }
}
