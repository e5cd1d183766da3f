//! Document, line and sentence records.
//!
//! # Responsibility
//! - Define the wire shape of structured documents.
//! - Provide small read helpers used by the segmenter and resolver.
//!
//! # Invariants
//! - `Line::line_num` is 1-based and gapless within its document.
//! - `Sentence::lines` is strictly ascending.
//! - `Sentence::doc_id` is a lookup key, never an ownership link.

use serde::{Deserialize, Serialize};

/// Globally unique sentence identifier (for example `src_001_s3`).
pub type SentenceId = String;

/// Document identifier (for example `src_001`).
pub type DocumentId = String;

/// Which side of the alignment a document sits on.
///
/// Also used as the "side" argument of alignment queries: a processed
/// sentence is answered with source sentences and vice versa.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DocumentRole {
    /// Original material the processed document was derived from.
    Source,
    /// Derived document (summary, translation, paraphrase).
    Processed,
}

impl DocumentRole {
    /// Returns the side answered by a query issued from `self`.
    pub fn opposite(self) -> Self {
        match self {
            Self::Source => Self::Processed,
            Self::Processed => Self::Source,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Source => "source",
            Self::Processed => "processed",
        }
    }
}

/// One row of raw document text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Line {
    /// 1-based line number within the owning document.
    #[serde(rename = "line_num")]
    pub line_number: u32,
    /// Raw line text, may be empty.
    pub text: String,
    /// Sentences fully or partially contained in this line, in order.
    ///
    /// An id recurs on consecutive lines when its sentence spans them.
    #[serde(default)]
    pub sentence_ids: Vec<SentenceId>,
}

impl Line {
    pub fn new(line_number: u32, text: impl Into<String>, sentence_ids: Vec<SentenceId>) -> Self {
        Self {
            line_number,
            text: text.into(),
            sentence_ids,
        }
    }
}

/// Minimal citable text unit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Sentence {
    pub id: SentenceId,
    /// Owning document id (lookup only).
    pub doc_id: DocumentId,
    /// Normalized sentence text.
    pub text: String,
    /// Ascending line numbers this sentence spans.
    pub lines: Vec<u32>,
}

impl Sentence {
    pub fn new(
        id: impl Into<SentenceId>,
        doc_id: impl Into<DocumentId>,
        text: impl Into<String>,
        lines: Vec<u32>,
    ) -> Self {
        Self {
            id: id.into(),
            doc_id: doc_id.into(),
            text: text.into(),
            lines,
        }
    }

    /// Whether the sentence is recorded on more than one line.
    pub fn spans_multiple_lines(&self) -> bool {
        self.lines.len() > 1
    }

    /// First whitespace-delimited token of the trimmed text.
    ///
    /// Returns `None` for blank sentences.
    pub fn anchor_token(&self) -> Option<&str> {
        self.text.split_whitespace().next()
    }
}

/// Source or processed document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Document {
    pub doc_id: DocumentId,
    pub title: String,
    pub role: DocumentRole,
    #[serde(default)]
    pub lines: Vec<Line>,
    /// Sentences in document order.
    #[serde(default)]
    pub sentences: Vec<Sentence>,
}

impl Document {
    pub fn new(doc_id: impl Into<DocumentId>, title: impl Into<String>, role: DocumentRole) -> Self {
        Self {
            doc_id: doc_id.into(),
            title: title.into(),
            role,
            lines: Vec::new(),
            sentences: Vec::new(),
        }
    }

    /// Returns the line with `line_number`, if present.
    pub fn line(&self, line_number: u32) -> Option<&Line> {
        // Line numbers are gapless from 1 once the registry accepted the document.
        let index = usize::try_from(line_number).ok()?.checked_sub(1)?;
        self.lines
            .get(index)
            .filter(|line| line.line_number == line_number)
            .or_else(|| self.lines.iter().find(|line| line.line_number == line_number))
    }

    /// Joins line texts with `\n`.
    pub fn full_text(&self) -> String {
        self.lines
            .iter()
            .map(|line| line.text.as_str())
            .collect::<Vec<_>>()
            .join("\n")
    }
}

#[cfg(test)]
mod tests {
    use super::{Document, DocumentRole, Line, Sentence};

    #[test]
    fn anchor_token_skips_leading_whitespace() {
        let sentence = Sentence::new("s1", "d1", "  AI 시스템은 투명하고", vec![1]);
        assert_eq!(sentence.anchor_token(), Some("AI"));

        let blank = Sentence::new("s2", "d1", "   ", vec![1]);
        assert_eq!(blank.anchor_token(), None);
    }

    #[test]
    fn opposite_role_flips_side() {
        assert_eq!(DocumentRole::Source.opposite(), DocumentRole::Processed);
        assert_eq!(DocumentRole::Processed.opposite(), DocumentRole::Source);
    }

    #[test]
    fn line_lookup_tolerates_unordered_input() {
        let mut document = Document::new("d1", "Doc", DocumentRole::Source);
        document.lines = vec![Line::new(2, "b", vec![]), Line::new(1, "a", vec![])];

        assert_eq!(document.line(1).map(|line| line.text.as_str()), Some("a"));
        assert_eq!(document.line(2).map(|line| line.text.as_str()), Some("b"));
        assert!(document.line(0).is_none());
        assert!(document.line(3).is_none());
    }

    #[test]
    fn full_text_joins_lines_with_newlines() {
        let mut document = Document::new("d1", "Doc", DocumentRole::Source);
        document.lines = vec![
            Line::new(1, "first", vec![]),
            Line::new(2, "", vec![]),
            Line::new(3, "third", vec![]),
        ];
        assert_eq!(document.full_text(), "first\n\nthird");
    }
}
