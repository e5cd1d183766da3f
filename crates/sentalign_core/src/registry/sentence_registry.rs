//! Registry build, integrity checks and lookups.
//!
//! # Responsibility
//! - Reject malformed document sets with the complete list of issues.
//! - Index sentences globally and documents by id.
//!
//! # Invariants
//! - `build` reports every integrity issue it finds, not only the first.
//! - Exactly one processed document is present in an accepted registry.
//! - Document order and per-document sentence order are preserved.

use crate::model::document::{Document, DocumentId, DocumentRole, Sentence, SentenceId};
use crate::repo::document_repo::{DocumentRepository, RepoError};
use log::{info, warn};
use std::collections::{BTreeMap, BTreeSet};
use std::error::Error;
use std::fmt::{Display, Formatter};

pub type RegistryResult<T> = Result<T, RegistryError>;

/// One integrity violation found while building a registry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DocumentIntegrityError {
    /// Line numbers must run 1, 2, 3, ... without gaps or repeats.
    LineNumberSequence {
        doc_id: DocumentId,
        expected: u32,
        found: u32,
    },
    DuplicateDocumentId(DocumentId),
    DuplicateSentenceId {
        sentence_id: SentenceId,
        first_doc: DocumentId,
        second_doc: DocumentId,
    },
    /// A line lists a sentence its own document does not own.
    ForeignSentenceReference {
        doc_id: DocumentId,
        line_number: u32,
        sentence_id: SentenceId,
    },
    /// Sentence back-reference names another document.
    SentenceOwnerMismatch {
        doc_id: DocumentId,
        sentence_id: SentenceId,
        declared_doc_id: DocumentId,
    },
    SentenceLinesNotAscending {
        sentence_id: SentenceId,
    },
    SentenceLineOutOfRange {
        sentence_id: SentenceId,
        line_number: u32,
    },
    MissingProcessedDocument,
    MultipleProcessedDocuments(Vec<DocumentId>),
}

impl Display for DocumentIntegrityError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::LineNumberSequence {
                doc_id,
                expected,
                found,
            } => write!(
                f,
                "document {doc_id}: expected line number {expected}, found {found}"
            ),
            Self::DuplicateDocumentId(doc_id) => write!(f, "duplicate document id: {doc_id}"),
            Self::DuplicateSentenceId {
                sentence_id,
                first_doc,
                second_doc,
            } => write!(
                f,
                "duplicate sentence id {sentence_id} in documents {first_doc} and {second_doc}"
            ),
            Self::ForeignSentenceReference {
                doc_id,
                line_number,
                sentence_id,
            } => write!(
                f,
                "document {doc_id} line {line_number} references sentence {sentence_id} it does not own"
            ),
            Self::SentenceOwnerMismatch {
                doc_id,
                sentence_id,
                declared_doc_id,
            } => write!(
                f,
                "sentence {sentence_id} is owned by {doc_id} but declares document {declared_doc_id}"
            ),
            Self::SentenceLinesNotAscending { sentence_id } => {
                write!(f, "sentence {sentence_id} line list is not strictly ascending")
            }
            Self::SentenceLineOutOfRange {
                sentence_id,
                line_number,
            } => write!(
                f,
                "sentence {sentence_id} references missing line {line_number}"
            ),
            Self::MissingProcessedDocument => write!(f, "no processed document supplied"),
            Self::MultipleProcessedDocuments(ids) => {
                write!(f, "more than one processed document: {}", ids.join(", "))
            }
        }
    }
}

impl Error for DocumentIntegrityError {}

/// Registry-level error.
#[derive(Debug)]
pub enum RegistryError {
    /// Document load rejected; carries every issue found.
    Integrity(Vec<DocumentIntegrityError>),
    NotFound(SentenceId),
    DocumentNotFound(DocumentId),
    Repo(RepoError),
}

impl Display for RegistryError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Integrity(issues) => {
                write!(f, "document integrity check failed ({} issues)", issues.len())?;
                for issue in issues {
                    write!(f, "; {issue}")?;
                }
                Ok(())
            }
            Self::NotFound(id) => write!(f, "sentence not found: {id}"),
            Self::DocumentNotFound(id) => write!(f, "document not found: {id}"),
            Self::Repo(err) => write!(f, "{err}"),
        }
    }
}

impl Error for RegistryError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Repo(err) => Some(err),
            _ => None,
        }
    }
}

impl From<RepoError> for RegistryError {
    fn from(value: RepoError) -> Self {
        Self::Repo(value)
    }
}

#[derive(Debug, Clone, Copy)]
struct SentenceSlot {
    document: usize,
    sentence: usize,
}

/// Immutable index over documents, lines and sentences.
#[derive(Debug)]
pub struct SentenceRegistry {
    documents: Vec<Document>,
    document_index: BTreeMap<DocumentId, usize>,
    sentence_index: BTreeMap<SentenceId, SentenceSlot>,
    processed: usize,
}

impl SentenceRegistry {
    /// Validates and indexes `documents`.
    ///
    /// # Errors
    /// - `RegistryError::Integrity` with every violation found.
    pub fn build(documents: Vec<Document>) -> RegistryResult<Self> {
        let mut issues = Vec::new();
        let mut document_index = BTreeMap::new();
        let mut sentence_index: BTreeMap<SentenceId, SentenceSlot> = BTreeMap::new();
        let mut processed_positions = Vec::new();

        for (doc_pos, document) in documents.iter().enumerate() {
            if document_index
                .insert(document.doc_id.clone(), doc_pos)
                .is_some()
            {
                issues.push(DocumentIntegrityError::DuplicateDocumentId(
                    document.doc_id.clone(),
                ));
            }
            if document.role == DocumentRole::Processed {
                processed_positions.push(doc_pos);
            }

            check_line_sequence(document, &mut issues);

            for (sentence_pos, sentence) in document.sentences.iter().enumerate() {
                check_sentence_shape(document, sentence, &mut issues);

                let slot = SentenceSlot {
                    document: doc_pos,
                    sentence: sentence_pos,
                };
                if let Some(existing) = sentence_index.get(sentence.id.as_str()) {
                    issues.push(DocumentIntegrityError::DuplicateSentenceId {
                        sentence_id: sentence.id.clone(),
                        first_doc: documents[existing.document].doc_id.clone(),
                        second_doc: document.doc_id.clone(),
                    });
                } else {
                    sentence_index.insert(sentence.id.clone(), slot);
                }
            }

            check_line_references(document, &mut issues);
        }

        let processed = match processed_positions.as_slice() {
            [single] => *single,
            [] => {
                issues.push(DocumentIntegrityError::MissingProcessedDocument);
                0
            }
            many => {
                issues.push(DocumentIntegrityError::MultipleProcessedDocuments(
                    many.iter()
                        .map(|pos| documents[*pos].doc_id.clone())
                        .collect(),
                ));
                0
            }
        };

        if !issues.is_empty() {
            warn!(
                "event=registry_build module=registry status=error documents={} issues={}",
                documents.len(),
                issues.len()
            );
            return Err(RegistryError::Integrity(issues));
        }

        info!(
            "event=registry_build module=registry status=ok documents={} sentences={}",
            documents.len(),
            sentence_index.len()
        );

        Ok(Self {
            documents,
            document_index,
            sentence_index,
            processed,
        })
    }

    /// Builds a registry from an injected read-only repository.
    pub fn from_repository(repo: &impl DocumentRepository) -> RegistryResult<Self> {
        Self::build(repo.list_documents()?)
    }

    /// Looks up one sentence by global id.
    pub fn lookup(&self, sentence_id: &str) -> RegistryResult<&Sentence> {
        self.get(sentence_id)
            .ok_or_else(|| RegistryError::NotFound(sentence_id.to_string()))
    }

    /// Non-failing variant of [`Self::lookup`].
    pub fn get(&self, sentence_id: &str) -> Option<&Sentence> {
        let slot = self.sentence_index.get(sentence_id)?;
        self.documents
            .get(slot.document)
            .and_then(|document| document.sentences.get(slot.sentence))
    }

    pub fn contains(&self, sentence_id: &str) -> bool {
        self.sentence_index.contains_key(sentence_id)
    }

    /// Sentences of one document in document order.
    pub fn sentences_of(&self, doc_id: &str) -> RegistryResult<&[Sentence]> {
        Ok(self.document(doc_id)?.sentences.as_slice())
    }

    pub fn document(&self, doc_id: &str) -> RegistryResult<&Document> {
        self.document_index
            .get(doc_id)
            .and_then(|pos| self.documents.get(*pos))
            .ok_or_else(|| RegistryError::DocumentNotFound(doc_id.to_string()))
    }

    /// All documents in load order.
    pub fn documents(&self) -> &[Document] {
        &self.documents
    }

    /// Document owning `sentence_id`.
    pub fn owning_document(&self, sentence_id: &str) -> RegistryResult<&Document> {
        self.sentence_index
            .get(sentence_id)
            .and_then(|slot| self.documents.get(slot.document))
            .ok_or_else(|| RegistryError::NotFound(sentence_id.to_string()))
    }

    /// Side of the alignment `sentence_id` belongs to.
    pub fn role_of(&self, sentence_id: &str) -> Option<DocumentRole> {
        self.owning_document(sentence_id)
            .ok()
            .map(|document| document.role)
    }

    pub fn processed_document(&self) -> &Document {
        &self.documents[self.processed]
    }

    pub fn source_documents(&self) -> impl Iterator<Item = &Document> {
        self.documents
            .iter()
            .filter(|document| document.role == DocumentRole::Source)
    }

    pub fn sentence_count(&self) -> usize {
        self.sentence_index.len()
    }
}

fn check_line_sequence(document: &Document, issues: &mut Vec<DocumentIntegrityError>) {
    for (expected, line) in (1u32..).zip(document.lines.iter()) {
        if line.line_number != expected {
            issues.push(DocumentIntegrityError::LineNumberSequence {
                doc_id: document.doc_id.clone(),
                expected,
                found: line.line_number,
            });
            // Later lines are all shifted; one report per document is enough.
            return;
        }
    }
}

fn check_sentence_shape(
    document: &Document,
    sentence: &Sentence,
    issues: &mut Vec<DocumentIntegrityError>,
) {
    if sentence.doc_id != document.doc_id {
        issues.push(DocumentIntegrityError::SentenceOwnerMismatch {
            doc_id: document.doc_id.clone(),
            sentence_id: sentence.id.clone(),
            declared_doc_id: sentence.doc_id.clone(),
        });
    }

    if sentence.lines.windows(2).any(|pair| pair[0] >= pair[1]) {
        issues.push(DocumentIntegrityError::SentenceLinesNotAscending {
            sentence_id: sentence.id.clone(),
        });
    }

    let line_count = document.lines.len();
    for &line_number in &sentence.lines {
        let in_range = usize::try_from(line_number)
            .map(|value| value >= 1 && value <= line_count)
            .unwrap_or(false);
        if !in_range {
            issues.push(DocumentIntegrityError::SentenceLineOutOfRange {
                sentence_id: sentence.id.clone(),
                line_number,
            });
        }
    }
}

fn check_line_references(document: &Document, issues: &mut Vec<DocumentIntegrityError>) {
    let owned: BTreeSet<&str> = document
        .sentences
        .iter()
        .map(|sentence| sentence.id.as_str())
        .collect();

    for line in &document.lines {
        for sentence_id in &line.sentence_ids {
            if !owned.contains(sentence_id.as_str()) {
                issues.push(DocumentIntegrityError::ForeignSentenceReference {
                    doc_id: document.doc_id.clone(),
                    line_number: line.line_number,
                    sentence_id: sentence_id.clone(),
                });
            }
        }
    }
}
