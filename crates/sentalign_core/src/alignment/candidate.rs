//! Candidate mapping ingest, normalization and validation.
//!
//! # Responsibility
//! - Accept whatever adjacency a generator produced.
//! - Repair asymmetric edges and report each repair as a warning.
//! - Reject candidates referencing unknown or misplaced sentences.
//!
//! # Invariants
//! - `normalize` is idempotent.
//! - `validate` reports all errors found and never accepts a partial graph.

use crate::alignment::graph::AlignmentGraph;
use crate::model::document::{DocumentRole, SentenceId};
use crate::registry::sentence_registry::SentenceRegistry;
use log::{debug, warn};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Adjacency as produced by generators and stored in records.
pub type Adjacency = BTreeMap<SentenceId, Vec<SentenceId>>;

/// Raw `{forward, backward}` pair, as stored in the record's `mappings`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawMapping {
    /// Processed sentence id -> source sentence ids.
    #[serde(default, alias = "generated_doc_to_source_doc")]
    pub summary_to_source: Adjacency,
    /// Source sentence id -> processed sentence ids.
    #[serde(default, alias = "source_doc_to_generated_doc")]
    pub source_to_summary: Adjacency,
}

impl RawMapping {
    pub fn new(summary_to_source: Adjacency, source_to_summary: Adjacency) -> Self {
        Self {
            summary_to_source,
            source_to_summary,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.summary_to_source.is_empty() && self.source_to_summary.is_empty()
    }
}

/// Which adjacency was missing a mirrored edge before repair.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MissingMirror {
    /// `source -> processed` existed without `processed -> source`.
    Forward,
    /// `processed -> source` existed without `source -> processed`.
    Backward,
}

impl MissingMirror {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Forward => "forward",
            Self::Backward => "backward",
        }
    }
}

/// Non-fatal: an edge was present on one side only and has been mirrored.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AsymmetricMappingWarning {
    pub processed_id: SentenceId,
    pub source_id: SentenceId,
    pub missing: MissingMirror,
}

impl Display for AsymmetricMappingWarning {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self.missing {
            MissingMirror::Backward => write!(
                f,
                "asymmetric mapping: {} -> {} had no backward edge",
                self.processed_id, self.source_id
            ),
            MissingMirror::Forward => write!(
                f,
                "asymmetric mapping: {} -> {} had no forward edge",
                self.source_id, self.processed_id
            ),
        }
    }
}

/// Fatal problem in a candidate mapping.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MappingError {
    /// Id does not resolve in the registry.
    UnknownSentenceReference(SentenceId),
    /// Id resolves but sits on the wrong side of the mapping.
    WrongSide {
        sentence_id: SentenceId,
        expected: DocumentRole,
        actual: DocumentRole,
    },
}

impl Display for MappingError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::UnknownSentenceReference(id) => write!(f, "unknown sentence reference: {id}"),
            Self::WrongSide {
                sentence_id,
                expected,
                actual,
            } => write!(
                f,
                "sentence {sentence_id} is a {} sentence but was used as a {} sentence",
                actual.as_str(),
                expected.as_str()
            ),
        }
    }
}

impl Error for MappingError {}

/// Whole-candidate rejection with every error and warning found.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MappingRejected {
    pub errors: Vec<MappingError>,
    pub warnings: Vec<AsymmetricMappingWarning>,
}

impl MappingRejected {
    /// Ids reported as unknown, in report order.
    pub fn unknown_ids(&self) -> Vec<&str> {
        self.errors
            .iter()
            .filter_map(|err| match err {
                MappingError::UnknownSentenceReference(id) => Some(id.as_str()),
                MappingError::WrongSide { .. } => None,
            })
            .collect()
    }
}

impl Display for MappingRejected {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "candidate mapping rejected ({} errors)", self.errors.len())?;
        for err in &self.errors {
            write!(f, "; {err}")?;
        }
        Ok(())
    }
}

impl Error for MappingRejected {}

/// Validated graph together with the repairs made on the way.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidatedMapping {
    pub graph: AlignmentGraph,
    pub warnings: Vec<AsymmetricMappingWarning>,
}

/// Unvalidated alignment proposal.
///
/// The only path to an [`AlignmentGraph`] is
/// `CandidateMapping::ingest(..)` -> [`normalize`](Self::normalize) ->
/// [`validate`](Self::validate).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CandidateMapping {
    forward: Adjacency,
    backward: Adjacency,
    warnings: Vec<AsymmetricMappingWarning>,
    normalized: bool,
}

impl CandidateMapping {
    /// Accepts raw adjacency as-is, including duplicates and one-sided edges.
    pub fn ingest(raw_forward: Adjacency, raw_backward: Adjacency) -> Self {
        Self {
            forward: raw_forward,
            backward: raw_backward,
            warnings: Vec::new(),
            normalized: false,
        }
    }

    pub fn from_raw(raw: RawMapping) -> Self {
        Self::ingest(raw.summary_to_source, raw.source_to_summary)
    }

    pub fn forward(&self) -> &Adjacency {
        &self.forward
    }

    pub fn backward(&self) -> &Adjacency {
        &self.backward
    }

    /// Warnings recorded by all `normalize` calls so far.
    pub fn warnings(&self) -> &[AsymmetricMappingWarning] {
        &self.warnings
    }

    pub fn is_normalized(&self) -> bool {
        self.normalized
    }

    /// Sorts and dedupes every value list, mirrors one-sided edges and drops
    /// keys left without edges.
    ///
    /// Returns the warnings recorded by this call.
    pub fn normalize(&mut self) -> &[AsymmetricMappingWarning] {
        let first_new = self.warnings.len();

        canonicalize(&mut self.forward);
        canonicalize(&mut self.backward);

        let missing_backward = one_sided_edges(&self.forward, &self.backward);
        let missing_forward = one_sided_edges(&self.backward, &self.forward);

        for (processed_id, source_id) in missing_backward {
            self.backward
                .entry(source_id.clone())
                .or_default()
                .push(processed_id.clone());
            self.warnings.push(AsymmetricMappingWarning {
                processed_id,
                source_id,
                missing: MissingMirror::Backward,
            });
        }
        for (source_id, processed_id) in missing_forward {
            self.forward
                .entry(processed_id.clone())
                .or_default()
                .push(source_id.clone());
            self.warnings.push(AsymmetricMappingWarning {
                processed_id,
                source_id,
                missing: MissingMirror::Forward,
            });
        }

        canonicalize(&mut self.forward);
        canonicalize(&mut self.backward);
        self.normalized = true;

        let recorded = &self.warnings[first_new..];
        if !recorded.is_empty() {
            debug!(
                "event=mapping_normalize module=alignment status=warn repaired_edges={}",
                recorded.len()
            );
        }
        recorded
    }

    /// Checks every referenced id against `registry`.
    ///
    /// Normalizes first when the caller has not done so, so the resulting
    /// graph is always symmetric.
    ///
    /// # Errors
    /// - `MappingRejected` listing every unknown or misplaced id.
    pub fn validate(
        mut self,
        registry: &SentenceRegistry,
    ) -> Result<ValidatedMapping, MappingRejected> {
        if !self.normalized {
            self.normalize();
        }

        let mut checker = SideChecker::new(registry);
        for (processed_id, source_ids) in &self.forward {
            checker.check(processed_id, DocumentRole::Processed);
            for source_id in source_ids {
                checker.check(source_id, DocumentRole::Source);
            }
        }
        for (source_id, processed_ids) in &self.backward {
            checker.check(source_id, DocumentRole::Source);
            for processed_id in processed_ids {
                checker.check(processed_id, DocumentRole::Processed);
            }
        }

        if !checker.errors.is_empty() {
            warn!(
                "event=mapping_validate module=alignment status=error errors={} warnings={}",
                checker.errors.len(),
                self.warnings.len()
            );
            return Err(MappingRejected {
                errors: checker.errors,
                warnings: self.warnings,
            });
        }

        Ok(ValidatedMapping {
            graph: AlignmentGraph::from_validated(self.forward, self.backward),
            warnings: self.warnings,
        })
    }
}

struct SideChecker<'a> {
    registry: &'a SentenceRegistry,
    seen: BTreeSet<SentenceId>,
    errors: Vec<MappingError>,
}

impl<'a> SideChecker<'a> {
    fn new(registry: &'a SentenceRegistry) -> Self {
        Self {
            registry,
            seen: BTreeSet::new(),
            errors: Vec::new(),
        }
    }

    fn check(&mut self, sentence_id: &str, expected: DocumentRole) {
        if self.seen.contains(sentence_id) {
            return;
        }
        self.seen.insert(sentence_id.to_string());

        match self.registry.role_of(sentence_id) {
            None => self
                .errors
                .push(MappingError::UnknownSentenceReference(sentence_id.to_string())),
            Some(actual) if actual != expected => self.errors.push(MappingError::WrongSide {
                sentence_id: sentence_id.to_string(),
                expected,
                actual,
            }),
            Some(_) => {}
        }
    }
}

fn canonicalize(adjacency: &mut Adjacency) {
    for values in adjacency.values_mut() {
        values.sort();
        values.dedup();
    }
    adjacency.retain(|_, values| !values.is_empty());
}

/// Edges `key -> value` in `from` whose mirror `value -> key` is absent in
/// `mirror`. Both maps must be canonical.
fn one_sided_edges(from: &Adjacency, mirror: &Adjacency) -> Vec<(SentenceId, SentenceId)> {
    let mut missing = Vec::new();
    for (key, values) in from {
        for value in values {
            let mirrored = mirror
                .get(value)
                .map(|back| back.binary_search(key).is_ok())
                .unwrap_or(false);
            if !mirrored {
                missing.push((key.clone(), value.clone()));
            }
        }
    }
    missing
}
