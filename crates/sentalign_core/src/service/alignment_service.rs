//! Alignment session service.
//!
//! # Responsibility
//! - Tie one registry, the active graph and the resolver together.
//! - Route candidate mappings (stored or generated) through validation.
//! - Export the session back into a persisted record.
//!
//! # Invariants
//! - The resolver always reads the graph the store currently holds.
//! - A rejected candidate leaves graph, generation and resolver untouched.

use crate::alignment::candidate::{CandidateMapping, MappingRejected, RawMapping};
use crate::alignment::generator::{CandidateMappingGenerator, GeneratorError, GeneratorRequest};
use crate::alignment::graph::{AlignmentGraph, MappingRow};
use crate::alignment::store::{AlignmentStore, IngestReport};
use crate::model::record::PersistedRecord;
use crate::registry::sentence_registry::{RegistryError, SentenceRegistry};
use crate::repo::document_repo::DocumentRepository;
use crate::segment::line_segmenter::{segment_document, LineSegmentation, SegmentationStats};
use crate::service::resolver::{CrossReferenceResolver, ResolverConfig};
use log::{debug, info, warn};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::sync::Arc;

pub type ServiceResult<T> = Result<T, ServiceError>;

/// Errors surfaced by [`AlignmentService`].
#[derive(Debug)]
pub enum ServiceError {
    Registry(RegistryError),
    Generator(GeneratorError),
    Rejected(MappingRejected),
}

impl Display for ServiceError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Registry(err) => write!(f, "{err}"),
            Self::Generator(err) => write!(f, "{err}"),
            Self::Rejected(err) => write!(f, "{err}"),
        }
    }
}

impl Error for ServiceError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Registry(err) => Some(err),
            Self::Generator(err) => Some(err),
            Self::Rejected(err) => Some(err),
        }
    }
}

impl From<RegistryError> for ServiceError {
    fn from(value: RegistryError) -> Self {
        Self::Registry(value)
    }
}

impl From<GeneratorError> for ServiceError {
    fn from(value: GeneratorError) -> Self {
        Self::Generator(value)
    }
}

impl From<MappingRejected> for ServiceError {
    fn from(value: MappingRejected) -> Self {
        Self::Rejected(value)
    }
}

/// Segmented lines of one document plus quality counters.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DocumentSegmentation<'a> {
    pub doc_id: &'a str,
    pub lines: Vec<LineSegmentation<'a>>,
    pub stats: SegmentationStats,
}

/// One alignment session over a fixed document set.
#[derive(Debug)]
pub struct AlignmentService {
    registry: Arc<SentenceRegistry>,
    store: AlignmentStore,
    resolver: CrossReferenceResolver,
}

impl AlignmentService {
    /// Starts a session with an empty graph.
    pub fn new(registry: SentenceRegistry, config: ResolverConfig) -> Self {
        let registry = Arc::new(registry);
        let store = AlignmentStore::new();
        let resolver = CrossReferenceResolver::new(Arc::clone(&registry), store.current(), config);
        Self {
            registry,
            store,
            resolver,
        }
    }

    /// Loads and validates documents from `repo`.
    pub fn from_repository<R: DocumentRepository>(
        repo: &R,
        config: ResolverConfig,
    ) -> ServiceResult<Self> {
        let registry = SentenceRegistry::from_repository(repo)?;
        Ok(Self::new(registry, config))
    }

    pub fn registry(&self) -> &SentenceRegistry {
        &self.registry
    }

    /// Snapshot of the active graph.
    pub fn graph(&self) -> Arc<AlignmentGraph> {
        self.store.current()
    }

    pub fn generation(&self) -> u64 {
        self.store.generation()
    }

    pub fn resolver(&self) -> &CrossReferenceResolver {
        &self.resolver
    }

    pub fn resolver_mut(&mut self) -> &mut CrossReferenceResolver {
        &mut self.resolver
    }

    /// Validates `raw` and activates it.
    ///
    /// # Errors
    /// - `MappingRejected` listing every unknown or misplaced id; the prior
    ///   graph stays active.
    pub fn ingest_candidate(&mut self, raw: RawMapping) -> Result<IngestReport, MappingRejected> {
        let candidate = CandidateMapping::from_raw(raw);
        let report = self.store.apply(candidate, &self.registry)?;

        for warning in &report.warnings {
            warn!(
                "event=mapping_asymmetric module=service status=warn processed_id={} source_id={} missing={}",
                warning.processed_id,
                warning.source_id,
                warning.missing.as_str()
            );
        }
        self.resolver.replace_graph(self.store.current());
        Ok(report)
    }

    /// Asks `generator` for a candidate and ingests it.
    ///
    /// With `refine`, the active mapping is sent along for correction.
    pub fn request_candidate(
        &mut self,
        generator: &dyn CandidateMappingGenerator,
        refine: bool,
    ) -> ServiceResult<IngestReport> {
        let active = self.store.current();
        let prior = if refine { Some(active.as_ref()) } else { None };
        let request = GeneratorRequest::from_registry(&self.registry, prior);

        let raw = generator.propose(&request).map_err(|err| {
            warn!("event=generator_propose module=service status=error refine={refine}");
            ServiceError::from(err)
        })?;
        info!(
            "event=generator_propose module=service status=ok refine={} forward_keys={} backward_keys={}",
            refine,
            raw.summary_to_source.len(),
            raw.source_to_summary.len()
        );

        Ok(self.ingest_candidate(raw)?)
    }

    /// Segments every line of `doc_id` against the registry.
    pub fn segment_document(&self, doc_id: &str) -> ServiceResult<DocumentSegmentation<'_>> {
        let document = self.registry.document(doc_id)?;
        let lines = segment_document(document, self.registry.as_ref());

        let mut stats = SegmentationStats::default();
        for line in &lines {
            stats.record(line);
        }
        if stats.fallbacks > 0 {
            debug!(
                "event=segment_document module=service status=warn doc_id={} lines={} fallbacks={}",
                doc_id, stats.lines, stats.fallbacks
            );
        }

        Ok(DocumentSegmentation {
            doc_id: document.doc_id.as_str(),
            lines,
            stats,
        })
    }

    /// Flattened edges of the active graph with sentence text.
    pub fn mapping_rows(&self) -> Vec<MappingRow> {
        self.store.current().to_rows(&self.registry)
    }

    /// Current documents plus the active mapping.
    pub fn export_record(&self) -> PersistedRecord {
        let mut record = PersistedRecord::new(
            self.registry.source_documents().cloned().collect(),
            self.registry.processed_document().clone(),
        );
        record.mappings = self.store.current().to_raw_mapping();
        record
    }
}
