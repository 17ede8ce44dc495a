//! Pacing chunk construction from word timestamps.
//!
//! Pure functions - no I/O, deterministic output. Words are grouped at
//! silence gaps, capped at a maximum spoken span, and short groups are
//! merged backward. Every millisecond of the narration ends up in exactly
//! one chunk so downstream scene durations sum to the audio length.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::models::{PacingChunk, TrailingSilence, WordTimestamp};

/// Errors from pacing analysis.
#[derive(Debug, Error)]
pub enum TimingError {
    #[error("word {index} starts at {start_ms}ms, before the previous word ends at {prev_end_ms}ms")]
    UnorderedInput {
        index: usize,
        start_ms: u64,
        prev_end_ms: u64,
    },

    #[error("chunks do not tile the narration: chunk {index} starts at {found_ms}ms, expected {expected_ms}ms")]
    TilingInvariant {
        index: usize,
        expected_ms: u64,
        found_ms: u64,
    },
}

/// Configuration for pacing analysis.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TimingConfig {
    /// Gap between words (ms) that forces a chunk break.
    pub silence_gap_ms: u64,
    /// Chunks shorter than this (ms) merge into their predecessor.
    pub min_chunk_ms: u64,
    /// Maximum spoken span (ms) a chunk may accumulate.
    pub max_chunk_ms: u64,
    /// What happens to silence after the last word.
    pub trailing_silence: TrailingSilence,
}

impl Default for TimingConfig {
    fn default() -> Self {
        Self {
            silence_gap_ms: 500,
            min_chunk_ms: 1000,
            max_chunk_ms: 15_000,
            trailing_silence: TrailingSilence::ExtendLast,
        }
    }
}

impl TimingConfig {
    /// Create from timing settings values.
    pub fn from_settings(
        silence_gap_ms: u64,
        min_chunk_ms: u64,
        max_chunk_ms: u64,
        trailing_silence: TrailingSilence,
    ) -> Self {
        Self {
            silence_gap_ms,
            min_chunk_ms,
            max_chunk_ms,
            trailing_silence,
        }
    }
}

/// Build pacing chunks from ordered word timestamps.
///
/// A chunk closes when the silence before the next word exceeds
/// `silence_gap_ms`, or when taking the next word would stretch the
/// chunk's spoken span past `max_chunk_ms`. Leading silence belongs to
/// the first chunk; silence at an interior break belongs to the chunk
/// that just ended (the scene holds through the pause); trailing silence
/// follows the configured policy. After grouping, chunks shorter than
/// `min_chunk_ms` are merged into their predecessor.
///
/// # Arguments
/// * `words` - Word timestamps in spoken order
/// * `total_duration_ms` - Full narration length, including trailing silence
/// * `config` - Pacing configuration
///
/// # Returns
/// Chunks that exactly tile the narration timeline. Empty input yields
/// an empty vec, never an error.
pub fn build_pacing_chunks(
    words: &[WordTimestamp],
    total_duration_ms: u64,
    config: &TimingConfig,
) -> Result<Vec<PacingChunk>, TimingError> {
    if words.is_empty() {
        return Ok(Vec::new());
    }

    for (index, pair) in words.windows(2).enumerate() {
        if pair[1].start_ms < pair[0].end_ms {
            return Err(TimingError::UnorderedInput {
                index: index + 1,
                start_ms: pair[1].start_ms,
                prev_end_ms: pair[0].end_ms,
            });
        }
    }

    // Group words at silence gaps and span caps.
    let mut groups: Vec<Vec<&WordTimestamp>> = Vec::new();
    let mut current: Vec<&WordTimestamp> = vec![&words[0]];
    let mut span_start = words[0].start_ms;

    for word in &words[1..] {
        let prev_end = current.last().map(|w| w.end_ms).unwrap_or(span_start);
        let gap = word.start_ms - prev_end;
        let span_with_word = word.end_ms - span_start;

        if gap > config.silence_gap_ms || span_with_word > config.max_chunk_ms {
            groups.push(std::mem::take(&mut current));
            span_start = word.start_ms;
        }
        current.push(word);
    }
    groups.push(current);

    let last_word_end = words.last().map(|w| w.end_ms).unwrap_or(0);
    let timeline_end = match config.trailing_silence {
        TrailingSilence::ExtendLast => total_duration_ms.max(last_word_end),
        TrailingSilence::Discard => last_word_end,
    };

    // Chunk boundaries: first starts at zero, each interior boundary sits
    // at the next group's first word, the last ends per trailing policy.
    let mut chunks: Vec<PacingChunk> = Vec::with_capacity(groups.len());
    for (i, group) in groups.iter().enumerate() {
        let start_ms = if i == 0 { 0 } else { group[0].start_ms };
        let end_ms = match groups.get(i + 1) {
            Some(next) => next[0].start_ms,
            None => timeline_end,
        };
        let texts: Vec<&str> = group.iter().map(|w| w.text.as_str()).collect();
        let chunk = PacingChunk {
            raw_text: texts.join(" "),
            start_ms,
            duration_ms: end_ms - start_ms,
        };

        // Backward merge keeps short chunks from flashing a scene.
        match chunks.last_mut() {
            Some(prev) if chunk.duration_ms < config.min_chunk_ms => {
                prev.raw_text.push(' ');
                prev.raw_text.push_str(&chunk.raw_text);
                prev.duration_ms += chunk.duration_ms;
            }
            _ => chunks.push(chunk),
        }
    }

    verify_tiling(&chunks, timeline_end)?;
    Ok(chunks)
}

/// Check that chunks exactly tile `[0, total_duration_ms)`.
///
/// The first chunk must start at zero, every chunk must end where the
/// next begins, and the last must end at `total_duration_ms`.
pub fn verify_tiling(chunks: &[PacingChunk], total_duration_ms: u64) -> Result<(), TimingError> {
    let mut expected_ms = 0u64;
    for (index, chunk) in chunks.iter().enumerate() {
        if chunk.start_ms != expected_ms {
            return Err(TimingError::TilingInvariant {
                index,
                expected_ms,
                found_ms: chunk.start_ms,
            });
        }
        expected_ms = chunk.end_ms();
    }
    if !chunks.is_empty() && expected_ms != total_duration_ms {
        return Err(TimingError::TilingInvariant {
            index: chunks.len(),
            expected_ms: total_duration_ms,
            found_ms: expected_ms,
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn words(spans: &[(&str, u64, u64)]) -> Vec<WordTimestamp> {
        spans
            .iter()
            .map(|(t, s, e)| WordTimestamp::new(*t, *s, *e))
            .collect()
    }

    fn config(silence_gap_ms: u64, min_chunk_ms: u64, max_chunk_ms: u64) -> TimingConfig {
        TimingConfig {
            silence_gap_ms,
            min_chunk_ms,
            max_chunk_ms,
            trailing_silence: TrailingSilence::ExtendLast,
        }
    }

    #[test]
    fn splits_on_silence_gap() {
        let input = words(&[
            ("Hello", 0, 400),
            ("world", 500, 900),
            ("Next", 2000, 2300),
        ]);
        let chunks = build_pacing_chunks(&input, 2300, &config(1000, 0, 5000)).unwrap();

        assert_eq!(chunks.len(), 2);
        assert_eq!(chunks[0].raw_text, "Hello world");
        assert_eq!(chunks[1].raw_text, "Next");
        // The pause after "world" stays with the first scene.
        assert_eq!(chunks[0].start_ms, 0);
        assert_eq!(chunks[0].end_ms(), 2000);
        assert_eq!(chunks[1].start_ms, 2000);
        assert_eq!(chunks[1].end_ms(), 2300);
    }

    #[test]
    fn gap_equal_to_threshold_does_not_split() {
        let input = words(&[("a", 0, 400), ("b", 1400, 1800)]);
        let chunks = build_pacing_chunks(&input, 1800, &config(1000, 0, 30_000)).unwrap();
        assert_eq!(chunks.len(), 1);
        assert_eq!(chunks[0].raw_text, "a b");
    }

    #[test]
    fn splits_when_span_would_exceed_max() {
        // Continuous speech, no gaps: only the span cap can split it.
        let input = words(&[
            ("one", 0, 2000),
            ("two", 2000, 4000),
            ("three", 4000, 6000),
            ("four", 6000, 8000),
        ]);
        let chunks = build_pacing_chunks(&input, 8000, &config(500, 0, 5000)).unwrap();

        assert_eq!(chunks.len(), 2);
        assert_eq!(chunks[0].raw_text, "one two");
        assert_eq!(chunks[1].raw_text, "three four");
        assert_eq!(chunks[0].end_ms(), chunks[1].start_ms);
    }

    #[test]
    fn short_chunks_merge_backward() {
        let input = words(&[
            ("long", 0, 3000),
            ("stray", 4000, 4200),
            ("tail", 5200, 5400),
        ]);
        // Gaps split all three apart; the two 1.2s/0.2s stragglers are
        // below min and fold into the first chunk.
        let chunks = build_pacing_chunks(&input, 5400, &config(500, 1500, 30_000)).unwrap();

        assert_eq!(chunks.len(), 1);
        assert_eq!(chunks[0].raw_text, "long stray tail");
        assert_eq!(chunks[0].start_ms, 0);
        assert_eq!(chunks[0].end_ms(), 5400);
    }

    #[test]
    fn final_short_chunk_is_never_dropped() {
        let input = words(&[("body", 0, 4000), ("end", 9000, 9300)]);
        let chunks = build_pacing_chunks(&input, 9300, &config(500, 1000, 30_000)).unwrap();

        assert_eq!(chunks.len(), 1);
        assert_eq!(chunks[0].raw_text, "body end");
        assert_eq!(chunks[0].end_ms(), 9300);
    }

    #[test]
    fn leading_silence_belongs_to_first_chunk() {
        let input = words(&[("late", 1500, 2000)]);
        let chunks = build_pacing_chunks(&input, 2000, &config(500, 0, 30_000)).unwrap();
        assert_eq!(chunks[0].start_ms, 0);
        assert_eq!(chunks[0].duration_ms, 2000);
    }

    #[test]
    fn trailing_silence_extends_last_chunk() {
        let input = words(&[("word", 0, 1000)]);
        let chunks = build_pacing_chunks(&input, 4000, &config(500, 0, 30_000)).unwrap();
        assert_eq!(chunks[0].end_ms(), 4000);
    }

    #[test]
    fn trailing_silence_discard_stops_at_last_word() {
        let input = words(&[("word", 0, 1000)]);
        let mut cfg = config(500, 0, 30_000);
        cfg.trailing_silence = TrailingSilence::Discard;
        let chunks = build_pacing_chunks(&input, 4000, &cfg).unwrap();
        assert_eq!(chunks[0].end_ms(), 1000);
    }

    #[test]
    fn empty_input_yields_empty_output() {
        let chunks = build_pacing_chunks(&[], 5000, &TimingConfig::default()).unwrap();
        assert!(chunks.is_empty());
    }

    #[test]
    fn chunks_tile_the_timeline() {
        let input = words(&[
            ("a", 100, 600),
            ("b", 700, 1200),
            ("c", 2500, 3000),
            ("d", 3100, 3600),
            ("e", 6000, 6400),
        ]);
        let total = 7000;
        let chunks = build_pacing_chunks(&input, total, &config(800, 0, 30_000)).unwrap();

        assert!(chunks.len() > 1);
        assert_eq!(chunks[0].start_ms, 0);
        for pair in chunks.windows(2) {
            assert_eq!(pair[0].end_ms(), pair[1].start_ms);
        }
        assert_eq!(chunks.last().unwrap().end_ms(), total);
        verify_tiling(&chunks, total).unwrap();
    }

    #[test]
    fn rejects_unordered_words() {
        let input = words(&[("b", 500, 900), ("a", 100, 400)]);
        let err = build_pacing_chunks(&input, 900, &TimingConfig::default()).unwrap_err();
        assert!(matches!(err, TimingError::UnorderedInput { index: 1, .. }));
    }

    #[test]
    fn verify_tiling_catches_gaps() {
        let chunks = vec![
            PacingChunk {
                raw_text: "a".into(),
                start_ms: 0,
                duration_ms: 900,
            },
            PacingChunk {
                raw_text: "b".into(),
                start_ms: 2000,
                duration_ms: 300,
            },
        ];
        let err = verify_tiling(&chunks, 2300).unwrap_err();
        assert!(matches!(
            err,
            TimingError::TilingInvariant {
                index: 1,
                expected_ms: 900,
                found_ms: 2000,
            }
        ));
    }

    #[test]
    fn verify_tiling_catches_short_coverage() {
        let chunks = vec![PacingChunk {
            raw_text: "a".into(),
            start_ms: 0,
            duration_ms: 900,
        }];
        assert!(verify_tiling(&chunks, 1000).is_err());
        assert!(verify_tiling(&chunks, 900).is_ok());
    }
}
