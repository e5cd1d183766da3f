//! Line segmentation into sentence-tagged spans.
//!
//! # Responsibility
//! - Partition a line's text into tagged and untagged spans, cursor-driven,
//!   anchoring each sentence on its first whitespace-delimited token.
//! - Count anchor misses for quality monitoring.
//!
//! # Invariants
//! - Concatenating `segments[..].text` yields exactly `line.text`.
//! - Spans never overlap and never extend past the line end.
//! - An anchor miss degrades to cursor placement; it is never an error.
//! - A line where no sentence could be anchored is one untagged span.

use crate::model::document::{Document, Line, Sentence, SentenceId};
use crate::registry::sentence_registry::SentenceRegistry;
use std::collections::BTreeMap;

/// Sentence source used while segmenting.
pub trait SentenceLookup {
    fn sentence(&self, sentence_id: &str) -> Option<&Sentence>;
}

impl SentenceLookup for SentenceRegistry {
    fn sentence(&self, sentence_id: &str) -> Option<&Sentence> {
        self.get(sentence_id)
    }
}

impl SentenceLookup for [Sentence] {
    fn sentence(&self, sentence_id: &str) -> Option<&Sentence> {
        self.iter().find(|sentence| sentence.id == sentence_id)
    }
}

impl SentenceLookup for BTreeMap<SentenceId, Sentence> {
    fn sentence(&self, sentence_id: &str) -> Option<&Sentence> {
        self.get(sentence_id)
    }
}

/// One span of a line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LineSegment<'a> {
    pub text: &'a str,
    /// `None` for untagged gaps and trailing text.
    pub sentence_id: Option<&'a str>,
    /// The tagged sentence is recorded on more than one line.
    pub is_continuation: bool,
}

impl<'a> LineSegment<'a> {
    fn untagged(text: &'a str) -> Self {
        Self {
            text,
            sentence_id: None,
            is_continuation: false,
        }
    }

    pub fn is_tagged(&self) -> bool {
        self.sentence_id.is_some()
    }
}

/// Segmentation of one line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LineSegmentation<'a> {
    pub line_number: u32,
    pub segments: Vec<LineSegment<'a>>,
    /// Sentence ids whose anchor token was not found (or that did not resolve).
    pub fallbacks: usize,
}

impl LineSegmentation<'_> {
    /// Concatenated segment text; equals the source line text.
    pub fn text(&self) -> String {
        self.segments.iter().map(|segment| segment.text).collect()
    }

    pub fn tagged_ids(&self) -> Vec<&str> {
        self.segments
            .iter()
            .filter_map(|segment| segment.sentence_id)
            .collect()
    }
}

/// Quality counters over many segmented lines.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SegmentationStats {
    pub lines: usize,
    pub segments: usize,
    pub tagged: usize,
    pub fallbacks: usize,
}

impl SegmentationStats {
    pub fn record(&mut self, segmentation: &LineSegmentation<'_>) {
        self.lines += 1;
        self.segments += segmentation.segments.len();
        self.tagged += segmentation
            .segments
            .iter()
            .filter(|segment| segment.is_tagged())
            .count();
        self.fallbacks += segmentation.fallbacks;
    }
}

/// Partitions `line.text` into sentence-tagged spans.
pub fn segment_line<'a, L>(line: &'a Line, sentences: &'a L) -> LineSegmentation<'a>
where
    L: SentenceLookup + ?Sized,
{
    let text = line.text.as_str();
    if line.sentence_ids.is_empty() || text.is_empty() {
        return LineSegmentation {
            line_number: line.line_number,
            segments: vec![LineSegment::untagged(text)],
            fallbacks: 0,
        };
    }

    let mut segments = Vec::with_capacity(line.sentence_ids.len() * 2 + 1);
    let mut cursor = 0;
    let mut anchored = 0;
    let mut fallbacks = 0;

    for sentence_id in &line.sentence_ids {
        let Some(sentence) = sentences.sentence(sentence_id) else {
            fallbacks += 1;
            continue;
        };

        let found = sentence
            .anchor_token()
            .and_then(|token| text[cursor..].find(token))
            .map(|offset| cursor + offset);
        let start = match found {
            Some(start) => {
                anchored += 1;
                start
            }
            None => {
                fallbacks += 1;
                cursor
            }
        };

        if start > cursor {
            segments.push(LineSegment::untagged(&text[cursor..start]));
        }

        let end = advance_chars(text, start, sentence.text.trim().chars().count());
        if end > start {
            segments.push(LineSegment {
                text: &text[start..end],
                sentence_id: Some(sentence_id.as_str()),
                is_continuation: sentence.spans_multiple_lines(),
            });
        }
        cursor = end;
    }

    if anchored == 0 {
        return LineSegmentation {
            line_number: line.line_number,
            segments: vec![LineSegment::untagged(text)],
            fallbacks,
        };
    }

    if cursor < text.len() {
        segments.push(LineSegment::untagged(&text[cursor..]));
    }

    LineSegmentation {
        line_number: line.line_number,
        segments,
        fallbacks,
    }
}

/// Segments every line of `document`, in line order.
pub fn segment_document<'a, L>(document: &'a Document, sentences: &'a L) -> Vec<LineSegmentation<'a>>
where
    L: SentenceLookup + ?Sized,
{
    document
        .lines
        .iter()
        .map(|line| segment_line(line, sentences))
        .collect()
}

/// Byte offset `char_count` characters after `start`, capped at the text end.
fn advance_chars(text: &str, start: usize, char_count: usize) -> usize {
    if char_count == 0 {
        return start;
    }
    text[start..]
        .char_indices()
        .nth(char_count)
        .map(|(offset, _)| start + offset)
        .unwrap_or(text.len())
}

#[cfg(test)]
mod tests {
    use super::{advance_chars, segment_line, LineSegment, SegmentationStats};
    use crate::model::document::{Line, Sentence, SentenceId};
    use std::collections::BTreeMap;

    fn line(text: &str, ids: &[&str]) -> Line {
        Line::new(1, text, ids.iter().map(|id| id.to_string()).collect())
    }

    #[test]
    fn advance_chars_respects_multibyte_boundaries() {
        let text = "가나다 abc";
        assert_eq!(advance_chars(text, 0, 2), "가나".len());
        assert_eq!(advance_chars(text, 0, 100), text.len());
        assert_eq!(advance_chars(text, 3, 0), 3);
    }

    #[test]
    fn empty_id_list_is_one_untagged_span() {
        let sentences: Vec<Sentence> = Vec::new();
        let line = line("plain text", &[]);
        let result = segment_line(&line, sentences.as_slice());
        assert_eq!(
            result.segments,
            vec![LineSegment {
                text: "plain text",
                sentence_id: None,
                is_continuation: false,
            }]
        );
        assert_eq!(result.fallbacks, 0);
    }

    #[test]
    fn empty_text_is_one_empty_untagged_span() {
        let sentences = vec![Sentence::new("s1", "d", "Hello.", vec![1])];
        let line = line("", &["s1"]);
        let result = segment_line(&line, sentences.as_slice());
        assert_eq!(result.segments.len(), 1);
        assert_eq!(result.segments[0].text, "");
        assert!(!result.segments[0].is_tagged());
    }

    #[test]
    fn tags_two_sentences_with_whitespace_gap() {
        let sentences = vec![
            Sentence::new("s1", "d", "Alpha one.", vec![1]),
            Sentence::new("s2", "d", "Beta two.", vec![1]),
        ];
        let line = line("Alpha one.  Beta two. tail", &["s1", "s2"]);
        let result = segment_line(&line, sentences.as_slice());

        let spans: Vec<(&str, Option<&str>)> = result
            .segments
            .iter()
            .map(|segment| (segment.text, segment.sentence_id))
            .collect();
        assert_eq!(
            spans,
            vec![
                ("Alpha one.", Some("s1")),
                ("  ", None),
                ("Beta two.", Some("s2")),
                (" tail", None),
            ]
        );
        assert_eq!(result.text(), line.text);
        assert_eq!(result.fallbacks, 0);
    }

    #[test]
    fn missing_anchor_falls_back_to_cursor() {
        let sentences = vec![
            Sentence::new("s1", "d", "One.", vec![1]),
            Sentence::new("s2", "d", "Zzz missing", vec![1]),
        ];
        let line = line("One. two three four", &["s1", "s2"]);
        let result = segment_line(&line, sentences.as_slice());

        assert_eq!(result.fallbacks, 1);
        assert_eq!(result.tagged_ids(), vec!["s1", "s2"]);
        assert_eq!(result.segments[1].text, " two three ");
        assert_eq!(result.text(), line.text);
    }

    #[test]
    fn no_anchor_at_all_degrades_to_untagged_line() {
        let sentences = vec![Sentence::new("s1", "d", "Nothing matches", vec![1])];
        let line = line("completely different", &["s1"]);
        let result = segment_line(&line, sentences.as_slice());
        assert_eq!(result.segments.len(), 1);
        assert!(!result.segments[0].is_tagged());
        assert_eq!(result.fallbacks, 1);
    }

    #[test]
    fn unresolved_ids_are_skipped() {
        let sentences = vec![Sentence::new("s1", "d", "Known.", vec![1])];
        let line = line("Known. rest", &["ghost", "s1"]);
        let result = segment_line(&line, sentences.as_slice());
        assert_eq!(result.fallbacks, 1);
        assert_eq!(result.tagged_ids(), vec!["s1"]);
        assert_eq!(result.text(), line.text);
    }

    #[test]
    fn spanning_sentence_is_truncated_and_marked_continuation() {
        let sentences = vec![Sentence::new(
            "s3",
            "d",
            "AI 시스템은 투명하고 공정해야 하며, 인간의 가치를 존중해야 합니다.",
            vec![2, 3],
        )];
        let line = line("AI 시스템은 투명하고", &["s3"]);
        let result = segment_line(&line, sentences.as_slice());

        assert_eq!(
            result.segments,
            vec![LineSegment {
                text: "AI 시스템은 투명하고",
                sentence_id: Some("s3"),
                is_continuation: true,
            }]
        );
    }

    #[test]
    fn keyed_sentence_map_resolves_like_a_slice() {
        let sentences = vec![
            Sentence::new("s1", "d", "Alpha one.", vec![1]),
            Sentence::new("s2", "d", "Beta two.", vec![1]),
        ];
        let keyed: BTreeMap<SentenceId, Sentence> = sentences
            .iter()
            .map(|sentence| (sentence.id.clone(), sentence.clone()))
            .collect();
        let line = line("Alpha one. Beta two.", &["s1", "s2", "s3"]);

        let from_map = segment_line(&line, &keyed);
        let from_slice = segment_line(&line, sentences.as_slice());
        assert_eq!(from_map, from_slice);
        assert_eq!(from_map.tagged_ids(), vec!["s1", "s2"]);
        assert_eq!(from_map.fallbacks, 1);
    }

    #[test]
    fn stats_accumulate_across_lines() {
        let sentences = vec![Sentence::new("s1", "d", "One.", vec![1])];
        let first = line("One. x", &["s1"]);
        let second = line("nothing", &["s1"]);
        let mut stats = SegmentationStats::default();
        stats.record(&segment_line(&first, sentences.as_slice()));
        stats.record(&segment_line(&second, sentences.as_slice()));

        assert_eq!(stats.lines, 2);
        assert_eq!(stats.segments, 3);
        assert_eq!(stats.tagged, 1);
        assert_eq!(stats.fallbacks, 1);
    }
}
