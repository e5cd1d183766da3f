//! Document repository contract and in-memory implementation.
//!
//! # Responsibility
//! - Provide `list_documents` / `get_sentence` to core callers.
//! - Offer an in-memory implementation backed by a persisted record.
//!
//! # Invariants
//! - `list_documents` returns documents in a stable order.
//! - `get_sentence` searches every document and returns the first match.

use crate::model::document::{Document, Sentence};
use crate::model::record::PersistedRecord;
use std::error::Error;
use std::fmt::{Display, Formatter};

pub type RepoResult<T> = Result<T, RepoError>;

/// Repository error for document access.
#[derive(Debug)]
pub enum RepoError {
    /// Backing store could not be read.
    Unavailable(String),
    /// Stored data cannot be interpreted as documents.
    InvalidData(String),
}

impl Display for RepoError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Unavailable(message) => write!(f, "document store unavailable: {message}"),
            Self::InvalidData(message) => write!(f, "invalid stored document data: {message}"),
        }
    }
}

impl Error for RepoError {}

/// Read-only repository interface injected into the core.
pub trait DocumentRepository {
    /// All documents, sources first, in a stable order.
    fn list_documents(&self) -> RepoResult<Vec<Document>>;
    /// One sentence by global id.
    fn get_sentence(&self, sentence_id: &str) -> RepoResult<Option<Sentence>>;
}

impl<R: DocumentRepository + ?Sized> DocumentRepository for &R {
    fn list_documents(&self) -> RepoResult<Vec<Document>> {
        (**self).list_documents()
    }

    fn get_sentence(&self, sentence_id: &str) -> RepoResult<Option<Sentence>> {
        (**self).get_sentence(sentence_id)
    }
}

/// Repository over documents already held in memory.
#[derive(Debug, Clone, Default)]
pub struct InMemoryDocumentRepository {
    documents: Vec<Document>,
}

impl InMemoryDocumentRepository {
    pub fn new(documents: Vec<Document>) -> Self {
        Self { documents }
    }

    /// Takes documents from a stored record, sources first.
    pub fn from_record(record: &PersistedRecord) -> Self {
        Self::new(record.documents().cloned().collect())
    }

    pub fn len(&self) -> usize {
        self.documents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.documents.is_empty()
    }
}

impl DocumentRepository for InMemoryDocumentRepository {
    fn list_documents(&self) -> RepoResult<Vec<Document>> {
        Ok(self.documents.clone())
    }

    fn get_sentence(&self, sentence_id: &str) -> RepoResult<Option<Sentence>> {
        Ok(self
            .documents
            .iter()
            .flat_map(|document| document.sentences.iter())
            .find(|sentence| sentence.id == sentence_id)
            .cloned())
    }
}

#[cfg(test)]
mod tests {
    use super::{DocumentRepository, InMemoryDocumentRepository};
    use crate::model::document::{Document, DocumentRole, Sentence};
    use crate::model::record::PersistedRecord;

    fn record() -> PersistedRecord {
        let mut source = Document::new("src", "Source", DocumentRole::Source);
        source.sentences = vec![Sentence::new("src_s1", "src", "Alpha.", vec![1])];
        let mut processed = Document::new("gen", "Summary", DocumentRole::Processed);
        processed.sentences = vec![Sentence::new("gen_s1", "gen", "A.", vec![1])];
        PersistedRecord::new(vec![source], processed)
    }

    #[test]
    fn from_record_lists_sources_before_processed() {
        let repo = InMemoryDocumentRepository::from_record(&record());
        let ids: Vec<String> = repo
            .list_documents()
            .expect("list should succeed")
            .into_iter()
            .map(|document| document.doc_id)
            .collect();
        assert_eq!(ids, vec!["src".to_string(), "gen".to_string()]);
    }

    #[test]
    fn get_sentence_returns_none_for_unknown_id() {
        let repo = InMemoryDocumentRepository::from_record(&record());
        let found = repo.get_sentence("gen_s1").expect("lookup should succeed");
        assert_eq!(found.map(|sentence| sentence.doc_id), Some("gen".to_string()));
        assert!(repo.get_sentence("missing").expect("lookup").is_none());
    }
}
