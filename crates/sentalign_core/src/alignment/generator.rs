//! Boundary to external candidate mapping generators.
//!
//! # Responsibility
//! - Serialize documents into the request a generator consumes.
//! - Extract the `{forward, backward}` JSON object from free-form responses.
//!
//! # Invariants
//! - Generator output is untrusted; it is only ever turned into a
//!   `RawMapping`, never into an `AlignmentGraph` directly.
//! - Request documents carry sentence id, text and line numbers only.

use crate::alignment::candidate::RawMapping;
use crate::alignment::graph::AlignmentGraph;
use crate::model::document::{Document, DocumentId, SentenceId};
use crate::registry::sentence_registry::SentenceRegistry;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};

static FENCED_JSON_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?s)```(?:json)?\s*(\{.*?\})\s*```").expect("valid fenced json regex")
});
static BARE_JSON_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?s)\{.*\}").expect("valid bare json regex"));

pub type GeneratorResult<T> = Result<T, GeneratorError>;

/// Errors raised at the generator boundary.
#[derive(Debug)]
pub enum GeneratorError {
    /// Response text contains no JSON object.
    MissingJson,
    /// JSON object found but not a mapping.
    InvalidJson(serde_json::Error),
    /// Request could not be encoded.
    Encode(serde_json::Error),
    /// Transport or service failure reported by the generator.
    Upstream(String),
}

impl Display for GeneratorError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::MissingJson => write!(f, "generator response contains no json object"),
            Self::InvalidJson(err) => write!(f, "generator response is not a mapping: {err}"),
            Self::Encode(err) => write!(f, "failed to encode generator request: {err}"),
            Self::Upstream(message) => write!(f, "generator failed: {message}"),
        }
    }
}

impl Error for GeneratorError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::InvalidJson(err) | Self::Encode(err) => Some(err),
            Self::MissingJson | Self::Upstream(_) => None,
        }
    }
}

/// Sentence as sent to a generator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RequestSentence {
    pub id: SentenceId,
    pub text: String,
    pub lines: Vec<u32>,
}

/// Document as sent to a generator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RequestDocument {
    pub doc_id: DocumentId,
    pub title: String,
    pub sentences: Vec<RequestSentence>,
}

impl From<&Document> for RequestDocument {
    fn from(document: &Document) -> Self {
        Self {
            doc_id: document.doc_id.clone(),
            title: document.title.clone(),
            sentences: document
                .sentences
                .iter()
                .map(|sentence| RequestSentence {
                    id: sentence.id.clone(),
                    text: sentence.text.clone(),
                    lines: sentence.lines.clone(),
                })
                .collect(),
        }
    }
}

/// Input handed to a candidate generator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GeneratorRequest {
    pub source_documents: Vec<RequestDocument>,
    pub processed_document: RequestDocument,
    /// Mapping to refine, when re-generating.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub prior_mapping: Option<RawMapping>,
}

impl GeneratorRequest {
    pub fn from_registry(registry: &SentenceRegistry, prior: Option<&AlignmentGraph>) -> Self {
        Self {
            source_documents: registry
                .source_documents()
                .map(RequestDocument::from)
                .collect(),
            processed_document: RequestDocument::from(registry.processed_document()),
            prior_mapping: prior
                .filter(|graph| !graph.is_empty())
                .map(AlignmentGraph::to_raw_mapping),
        }
    }

    pub fn to_json(&self) -> GeneratorResult<String> {
        serde_json::to_string(self).map_err(GeneratorError::Encode)
    }
}

/// External service proposing an alignment.
pub trait CandidateMappingGenerator {
    fn propose(&self, request: &GeneratorRequest) -> GeneratorResult<RawMapping>;
}

/// Generator backed by a text-completion transport.
///
/// The transport receives the JSON-encoded request and returns the raw
/// response text, which is parsed with [`parse_mapping_response`].
pub struct TextCompletionGenerator<F>
where
    F: Fn(&str) -> Result<String, String>,
{
    transport: F,
}

impl<F> TextCompletionGenerator<F>
where
    F: Fn(&str) -> Result<String, String>,
{
    pub fn new(transport: F) -> Self {
        Self { transport }
    }
}

impl<F> CandidateMappingGenerator for TextCompletionGenerator<F>
where
    F: Fn(&str) -> Result<String, String>,
{
    fn propose(&self, request: &GeneratorRequest) -> GeneratorResult<RawMapping> {
        let payload = request.to_json()?;
        let response = (self.transport)(payload.as_str()).map_err(GeneratorError::Upstream)?;
        parse_mapping_response(response.as_str())
    }
}

/// Extracts a mapping object from generator response text.
///
/// Prefers a fenced code block; otherwise takes the outermost `{...}` span.
pub fn parse_mapping_response(response: &str) -> GeneratorResult<RawMapping> {
    let json = FENCED_JSON_RE
        .captures(response)
        .and_then(|captures| captures.get(1))
        .or_else(|| BARE_JSON_RE.find(response))
        .map(|found| found.as_str())
        .ok_or(GeneratorError::MissingJson)?;

    serde_json::from_str(json).map_err(GeneratorError::InvalidJson)
}
