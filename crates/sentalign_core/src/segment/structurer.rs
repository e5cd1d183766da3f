//! Raw text to structured document conversion.
//!
//! # Responsibility
//! - Split raw text into numbered lines and normalized sentences.
//! - Record which lines each sentence covers, and vice versa.
//!
//! # Invariants
//! - Sentence ids are `{doc_id}_s{n}`, 1-based in document order.
//! - Sentence text is whitespace-collapsed; line text is kept verbatim.
//! - Line sentence lists follow sentence order.

use crate::model::document::{Document, DocumentRole, Line, Sentence};
use log::debug;
use once_cell::sync::Lazy;
use regex::Regex;
use std::ops::Range;

// Terminal punctuation followed by whitespace, or a blank line.
static SENTENCE_BREAK_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"([.!?。]+)\s+|\n[ \t]*\n\s*").expect("valid sentence break regex")
});

/// Builds a structured document from raw text.
pub fn structure_document(
    text: &str,
    doc_id: &str,
    title: &str,
    role: DocumentRole,
) -> Document {
    let line_ranges = line_ranges(text);
    let mut document = Document::new(doc_id, title, role);
    document.lines = (1u32..)
        .zip(line_ranges.iter())
        .map(|(line_number, range)| Line::new(line_number, &text[range.clone()], Vec::new()))
        .collect();

    for (index, range) in sentence_ranges(text).into_iter().enumerate() {
        let sentence_id = format!("{doc_id}_s{}", index + 1);
        let covered: Vec<u32> = (1u32..)
            .zip(line_ranges.iter())
            .filter(|(_, line)| line.start < range.end && range.start < line.end)
            .map(|(line_number, _)| line_number)
            .collect();

        for &line_number in &covered {
            if let Some(line) = document.lines.get_mut(line_number as usize - 1) {
                line.sentence_ids.push(sentence_id.clone());
            }
        }

        let normalized = text[range].split_whitespace().collect::<Vec<_>>().join(" ");
        document
            .sentences
            .push(Sentence::new(sentence_id, doc_id, normalized, covered));
    }

    debug!(
        "event=structure_document module=segment status=ok doc_id={} lines={} sentences={}",
        doc_id,
        document.lines.len(),
        document.sentences.len()
    );

    document
}

/// Byte ranges of `\n`-separated lines, excluding the separators.
fn line_ranges(text: &str) -> Vec<Range<usize>> {
    let mut ranges = Vec::new();
    let mut start = 0;
    for (offset, _) in text.match_indices('\n') {
        ranges.push(start..offset);
        start = offset + 1;
    }
    ranges.push(start..text.len());
    ranges
}

/// Byte ranges of trimmed, non-empty sentences.
fn sentence_ranges(text: &str) -> Vec<Range<usize>> {
    let mut ranges = Vec::new();
    let mut start = 0;
    for captures in SENTENCE_BREAK_RE.captures_iter(text) {
        let Some(whole) = captures.get(0) else {
            continue;
        };
        let end = captures
            .get(1)
            .map(|punctuation| punctuation.end())
            .unwrap_or(whole.start());
        push_trimmed(text, start..end, &mut ranges);
        start = whole.end();
    }
    push_trimmed(text, start..text.len(), &mut ranges);
    ranges
}

fn push_trimmed(text: &str, range: Range<usize>, ranges: &mut Vec<Range<usize>>) {
    let slice = &text[range.clone()];
    let leading = slice.len() - slice.trim_start().len();
    let trailing = slice.len() - slice.trim_end().len();
    if leading + trailing < slice.len() {
        ranges.push(range.start + leading..range.end - trailing);
    }
}

#[cfg(test)]
mod tests {
    use super::{sentence_ranges, structure_document};
    use crate::model::document::DocumentRole;

    #[test]
    fn splits_on_punctuation_and_blank_lines() {
        let text = "First one. Second!\n\nHeading\nThird?";
        let pieces: Vec<&str> = sentence_ranges(text)
            .into_iter()
            .map(|range| &text[range])
            .collect();
        assert_eq!(pieces, vec!["First one.", "Second!", "Heading\nThird?"]);
    }

    #[test]
    fn assigns_ids_and_line_coverage() {
        let text = "Alpha beta. Gamma\ndelta.\n\nEpsilon.";
        let document = structure_document(text, "src_001", "Doc", DocumentRole::Source);

        assert_eq!(document.lines.len(), 4);
        assert_eq!(document.lines[2].text, "");
        let ids: Vec<&str> = document.sentences.iter().map(|s| s.id.as_str()).collect();
        assert_eq!(ids, vec!["src_001_s1", "src_001_s2", "src_001_s3"]);

        assert_eq!(document.sentences[1].text, "Gamma delta.");
        assert_eq!(document.sentences[1].lines, vec![1, 2]);
        assert_eq!(
            document.lines[0].sentence_ids,
            vec!["src_001_s1".to_string(), "src_001_s2".to_string()]
        );
        assert_eq!(document.lines[1].sentence_ids, vec!["src_001_s2".to_string()]);
        assert!(document.lines[2].sentence_ids.is_empty());
        assert_eq!(document.sentences[2].lines, vec![4]);
        assert_eq!(document.full_text(), text);
    }

    #[test]
    fn blank_text_yields_single_empty_line() {
        let document = structure_document("", "g", "Empty", DocumentRole::Processed);
        assert_eq!(document.lines.len(), 1);
        assert!(document.sentences.is_empty());
    }
}
