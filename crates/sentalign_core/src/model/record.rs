//! Persisted alignment record.
//!
//! # Responsibility
//! - Define the JSON shape stored by the outer application.
//! - Convert between JSON text and typed records.
//!
//! # Invariants
//! - Documents are read-only inputs; `mappings` is the only computed field.
//! - Parsing never validates referential integrity; that is the registry's
//!   and the alignment graph's job.
//! - A document's role follows from where it sits in the record.
//! - Decoding accepts both the flat layout this crate writes and the nested
//!   `metadata` / `content` layout; encoding always writes the flat one.

use crate::alignment::candidate::RawMapping;
use crate::model::document::{Document, DocumentId, DocumentRole, Line, Sentence};
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Error for record encoding and decoding.
#[derive(Debug)]
pub enum RecordError {
    Json(serde_json::Error),
    /// Explicit `role` contradicts the document's slot in the record.
    RoleMismatch {
        doc_id: DocumentId,
        expected: DocumentRole,
        found: DocumentRole,
    },
}

impl Display for RecordError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Json(err) => write!(f, "invalid alignment record: {err}"),
            Self::RoleMismatch {
                doc_id,
                expected,
                found,
            } => write!(
                f,
                "document {doc_id} is stored as a {} document but declares role {}",
                expected.as_str(),
                found.as_str()
            ),
        }
    }
}

impl Error for RecordError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Json(err) => Some(err),
            Self::RoleMismatch { .. } => None,
        }
    }
}

impl From<serde_json::Error> for RecordError {
    fn from(value: serde_json::Error) -> Self {
        Self::Json(value)
    }
}

/// Stored `{ source_documents, processed_document, mappings }` record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "RecordWire")]
pub struct PersistedRecord {
    pub source_documents: Vec<Document>,
    pub processed_document: Document,
    pub mappings: RawMapping,
}

impl PersistedRecord {
    pub fn new(source_documents: Vec<Document>, processed_document: Document) -> Self {
        Self {
            source_documents,
            processed_document,
            mappings: RawMapping::default(),
        }
    }

    pub fn from_json_str(value: &str) -> Result<Self, RecordError> {
        Ok(serde_json::from_str(value)?)
    }

    pub fn to_json_string_pretty(&self) -> Result<String, RecordError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// All documents, sources first, processed last.
    pub fn documents(&self) -> impl Iterator<Item = &Document> {
        self.source_documents
            .iter()
            .chain(std::iter::once(&self.processed_document))
    }
}

#[derive(Deserialize)]
struct RecordWire {
    #[serde(default)]
    source_documents: Vec<DocumentWire>,
    #[serde(alias = "generated_document")]
    processed_document: DocumentWire,
    #[serde(default)]
    mappings: RawMapping,
}

/// Document in either layout. Unknown fields (`start`, `end`, `total_*`)
/// are ignored.
#[derive(Deserialize)]
struct DocumentWire {
    doc_id: DocumentId,
    #[serde(default)]
    title: Option<String>,
    #[serde(default)]
    role: Option<DocumentRole>,
    #[serde(default)]
    lines: Option<Vec<Line>>,
    #[serde(default)]
    sentences: Option<Vec<Sentence>>,
    #[serde(default)]
    metadata: Option<MetadataWire>,
    #[serde(default)]
    content: Option<ContentWire>,
}

#[derive(Deserialize)]
struct MetadataWire {
    #[serde(default)]
    title: Option<String>,
}

#[derive(Deserialize)]
struct ContentWire {
    #[serde(default)]
    lines: Vec<Line>,
    #[serde(default)]
    sentences: Vec<Sentence>,
}

impl DocumentWire {
    fn into_document(self, role: DocumentRole) -> Result<Document, RecordError> {
        if let Some(found) = self.role.filter(|found| *found != role) {
            return Err(RecordError::RoleMismatch {
                doc_id: self.doc_id,
                expected: role,
                found,
            });
        }

        let title = self
            .title
            .or_else(|| self.metadata.and_then(|metadata| metadata.title))
            .unwrap_or_default();
        let (content_lines, content_sentences) = self
            .content
            .map(|content| (content.lines, content.sentences))
            .unwrap_or_default();

        let mut document = Document::new(self.doc_id, title, role);
        document.lines = self.lines.unwrap_or(content_lines);
        document.sentences = self.sentences.unwrap_or(content_sentences);
        Ok(document)
    }
}

impl TryFrom<RecordWire> for PersistedRecord {
    type Error = RecordError;

    fn try_from(wire: RecordWire) -> Result<Self, Self::Error> {
        let source_documents = wire
            .source_documents
            .into_iter()
            .map(|document| document.into_document(DocumentRole::Source))
            .collect::<Result<Vec<_>, _>>()?;
        let processed_document = wire
            .processed_document
            .into_document(DocumentRole::Processed)?;

        Ok(Self {
            source_documents,
            processed_document,
            mappings: wire.mappings,
        })
    }
}
