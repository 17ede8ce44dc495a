//! Caption line layout.
//!
//! Greedy accumulation of words into lines, with script headings aligned
//! first so their words form dedicated lines. Every input word lands in
//! exactly one line, in order.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::models::{CaptionLine, WordTimestamp};

use super::headings::normalize_for_matching;
use super::similarity::{Similarity, TokenBlockSimilarity};

/// Errors from caption layout.
#[derive(Debug, Error)]
pub enum CaptionError {
    #[error("caption lines cover {found_words} words, input has {expected_words}")]
    CoverageViolation {
        expected_words: usize,
        found_words: usize,
    },

    #[error("caption word {index} diverged from input: expected \"{expected}\", found \"{found}\"")]
    WordMismatch {
        index: usize,
        expected: String,
        found: String,
    },
}

/// Configuration for caption layout.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CaptionConfig {
    /// Maximum words on a body line.
    pub max_words_per_line: usize,
    /// Maximum span (ms) a body line may cover.
    pub max_line_duration_ms: u64,
    /// Gap between words (ms) that forces a line break.
    pub gap_threshold_ms: u64,
    /// Minimum similarity for a word window to count as a heading.
    pub heading_match_threshold: f64,
}

impl Default for CaptionConfig {
    fn default() -> Self {
        Self {
            max_words_per_line: 7,
            max_line_duration_ms: 12_000,
            gap_threshold_ms: 400,
            heading_match_threshold: 0.7,
        }
    }
}

/// A heading aligned to a span of transcribed words.
#[derive(Debug, Clone)]
struct HeadingSpan {
    start_index: usize,
    len: usize,
    text: String,
}

/// Lays word timestamps out into caption lines.
pub struct CaptionLayout {
    config: CaptionConfig,
    similarity: Box<dyn Similarity>,
}

impl CaptionLayout {
    /// Create a layout engine with the default similarity scorer.
    pub fn new(config: CaptionConfig) -> Self {
        Self {
            config,
            similarity: Box::new(TokenBlockSimilarity),
        }
    }

    /// Replace the similarity scorer.
    pub fn with_similarity(mut self, similarity: Box<dyn Similarity>) -> Self {
        self.similarity = similarity;
        self
    }

    /// Lay words out into body and heading lines.
    ///
    /// Headings are aligned first; their words form their own lines and
    /// are exempt from the body word limit. Body lines close at
    /// `max_words_per_line`, at a silence gap, at the line duration cap,
    /// or when the next word opens a heading. The result covers every
    /// input word exactly once, verified before returning.
    pub fn layout(
        &self,
        words: &[WordTimestamp],
        headings: &[String],
    ) -> Result<Vec<CaptionLine>, CaptionError> {
        if words.is_empty() {
            return Ok(Vec::new());
        }

        let spans = self.align_headings(words, headings);
        let mut heading_at: Vec<Option<&HeadingSpan>> = vec![None; words.len()];
        for span in &spans {
            heading_at[span.start_index] = Some(span);
        }

        let mut lines: Vec<CaptionLine> = Vec::new();
        let mut current: Vec<WordTimestamp> = Vec::new();
        let mut i = 0;

        while i < words.len() {
            if let Some(span) = heading_at[i] {
                if !current.is_empty() {
                    lines.push(CaptionLine::body(std::mem::take(&mut current)));
                }
                lines.push(CaptionLine::heading(
                    words[i..i + span.len].to_vec(),
                    span.text.clone(),
                ));
                i += span.len;
                continue;
            }

            if let Some(prev) = current.last() {
                let gap = words[i].start_ms.saturating_sub(prev.end_ms);
                let line_span = words[i].end_ms.saturating_sub(current[0].start_ms);
                if current.len() >= self.config.max_words_per_line
                    || gap > self.config.gap_threshold_ms
                    || line_span > self.config.max_line_duration_ms
                {
                    lines.push(CaptionLine::body(std::mem::take(&mut current)));
                }
            }
            current.push(words[i].clone());
            i += 1;
        }
        if !current.is_empty() {
            lines.push(CaptionLine::body(current));
        }

        verify_coverage(&lines, words)?;
        Ok(lines)
    }

    /// Find the best non-overlapping word window for each heading.
    ///
    /// Windows are heading-sized; a window already claimed by an earlier
    /// heading is skipped. Spans come back sorted by position.
    fn align_headings(&self, words: &[WordTimestamp], headings: &[String]) -> Vec<HeadingSpan> {
        let normalized: Vec<String> = words
            .iter()
            .map(|w| normalize_for_matching(&w.text))
            .collect();
        let mut used = vec![false; words.len()];
        let mut spans: Vec<HeadingSpan> = Vec::new();

        for heading in headings {
            let heading_norm = normalize_for_matching(heading);
            if heading_norm.is_empty() {
                continue;
            }
            let window_len = heading_norm.split_whitespace().count();

            let mut best: Option<(f64, usize, usize)> = None;
            for start in 0..words.len() {
                let len = window_len.min(words.len() - start);
                if len == 0 || used[start..start + len].iter().any(|u| *u) {
                    continue;
                }
                let window = normalized[start..start + len].join(" ");
                let score = self.similarity.score(&heading_norm, &window);
                if score >= self.config.heading_match_threshold
                    && best.map(|(b, _, _)| score > b).unwrap_or(true)
                {
                    best = Some((score, start, len));
                }
            }

            if let Some((score, start, len)) = best {
                tracing::debug!(
                    "Aligned heading \"{}\" at words {}..{} (score {:.2})",
                    heading,
                    start,
                    start + len,
                    score
                );
                for flag in &mut used[start..start + len] {
                    *flag = true;
                }
                spans.push(HeadingSpan {
                    start_index: start,
                    len,
                    text: heading.clone(),
                });
            }
        }

        spans.sort_by_key(|s| s.start_index);
        spans
    }
}

/// Check that lines cover the input words exactly once, in order.
pub fn verify_coverage(
    lines: &[CaptionLine],
    words: &[WordTimestamp],
) -> Result<(), CaptionError> {
    let found_words: usize = lines.iter().map(|l| l.words.len()).sum();
    if found_words != words.len() {
        return Err(CaptionError::CoverageViolation {
            expected_words: words.len(),
            found_words,
        });
    }
    let mut index = 0;
    for line in lines {
        for word in &line.words {
            if word != &words[index] {
                return Err(CaptionError::WordMismatch {
                    index,
                    expected: words[index].text.clone(),
                    found: word.text.clone(),
                });
            }
            index += 1;
        }
    }
    Ok(())
}
