//! Active-graph holder with atomic replacement.
//!
//! # Responsibility
//! - Own the graph readers currently see.
//! - Run candidate validation off to the side and swap only on success.
//!
//! # Invariants
//! - Readers holding an `Arc` snapshot are never affected by a swap.
//! - `&mut self` on `apply` keeps ingestions strictly sequential.
//! - `generation` increases by exactly one per accepted candidate.

use crate::alignment::candidate::{
    AsymmetricMappingWarning, CandidateMapping, MappingRejected, ValidatedMapping,
};
use crate::alignment::graph::{AlignmentGraph, GraphStats};
use crate::registry::sentence_registry::SentenceRegistry;
use log::{info, warn};
use std::sync::Arc;

/// Outcome of an accepted candidate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IngestReport {
    /// Generation number of the newly active graph.
    pub generation: u64,
    pub stats: GraphStats,
    /// Asymmetric edges repaired during normalization.
    pub warnings: Vec<AsymmetricMappingWarning>,
}

/// Holder of the active alignment graph.
#[derive(Debug, Default)]
pub struct AlignmentStore {
    active: Arc<AlignmentGraph>,
    generation: u64,
}

impl AlignmentStore {
    /// Starts with an empty graph at generation 0.
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of the active graph.
    pub fn current(&self) -> Arc<AlignmentGraph> {
        Arc::clone(&self.active)
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Normalizes and validates `candidate`, then swaps it in.
    ///
    /// # Errors
    /// - `MappingRejected` when validation fails; the active graph is kept.
    pub fn apply(
        &mut self,
        mut candidate: CandidateMapping,
        registry: &SentenceRegistry,
    ) -> Result<IngestReport, MappingRejected> {
        candidate.normalize();
        let ValidatedMapping { graph, warnings } = match candidate.validate(registry) {
            Ok(validated) => validated,
            Err(rejected) => {
                warn!(
                    "event=graph_replace module=alignment status=error generation={} errors={}",
                    self.generation,
                    rejected.errors.len()
                );
                return Err(rejected);
            }
        };

        let stats = graph.stats();
        self.active = Arc::new(graph);
        self.generation += 1;

        info!(
            "event=graph_replace module=alignment status=ok generation={} edges={} warnings={}",
            self.generation,
            stats.edges,
            warnings.len()
        );

        Ok(IngestReport {
            generation: self.generation,
            stats,
            warnings,
        })
    }
}
