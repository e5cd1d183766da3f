//! Core logic for sentence-level alignment between a processed document and
//! its source documents.
//! This crate owns every integrity rule; UI layers only render its output.

pub mod alignment;
pub mod logging;
pub mod model;
pub mod registry;
pub mod repo;
pub mod segment;
pub mod service;

pub use alignment::candidate::{
    Adjacency, AsymmetricMappingWarning, CandidateMapping, MappingError, MappingRejected,
    MissingMirror, RawMapping, ValidatedMapping,
};
pub use alignment::generator::{
    parse_mapping_response, CandidateMappingGenerator, GeneratorError, GeneratorRequest,
    GeneratorResult, TextCompletionGenerator,
};
pub use alignment::graph::{AlignmentGraph, GraphStats, MappingRow};
pub use alignment::store::{AlignmentStore, IngestReport};
pub use logging::{
    default_log_level, init_logging, logging_status, LoggingConfig, LoggingError,
};
pub use model::document::{Document, DocumentId, DocumentRole, Line, Sentence, SentenceId};
pub use model::record::{PersistedRecord, RecordError};
pub use registry::sentence_registry::{
    DocumentIntegrityError, RegistryError, RegistryResult, SentenceRegistry,
};
pub use repo::document_repo::{
    DocumentRepository, InMemoryDocumentRepository, RepoError, RepoResult,
};
pub use segment::line_segmenter::{
    segment_document, segment_line, LineSegment, LineSegmentation, SegmentationStats,
    SentenceLookup,
};
pub use segment::structurer::structure_document;
pub use service::alignment_service::{
    AlignmentService, DocumentSegmentation, ServiceError, ServiceResult,
};
pub use service::resolver::{
    CrossReferenceResolver, FocusView, NavigationRequest, ResolverConfig, ResolverError,
    ResolverResult, SelectRelatedOutcome, UnfocusTimer, DEFAULT_UNFOCUS_DELAY,
};

/// Minimal health-check API for linkage checks.
pub fn ping() -> &'static str {
    "pong"
}

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
