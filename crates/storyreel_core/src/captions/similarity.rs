//! Pluggable text similarity for heading alignment.

/// Scores how well a window of transcribed words matches a heading.
///
/// Both inputs are pre-normalized (lowercase, no punctuation). Scores
/// must fall in `[0.0, 1.0]`, with `1.0` for identical strings; the
/// layout engine accepts a window at or above its configured threshold.
pub trait Similarity: Send + Sync {
    fn score(&self, heading: &str, window: &str) -> f64;
}

impl<F> Similarity for F
where
    F: Fn(&str, &str) -> f64 + Send + Sync,
{
    fn score(&self, heading: &str, window: &str) -> f64 {
        self(heading, window)
    }
}

/// Default scorer: the longest run of heading tokens matched in order
/// inside the window, as a fraction of the heading's token count.
///
/// Robust to the transcriber dropping or mangling edge words; a heading
/// of four tokens with three matched in sequence scores 0.75.
#[derive(Debug, Clone, Copy, Default)]
pub struct TokenBlockSimilarity;

impl Similarity for TokenBlockSimilarity {
    fn score(&self, heading: &str, window: &str) -> f64 {
        let heading_tokens: Vec<&str> = heading.split_whitespace().collect();
        let window_tokens: Vec<&str> = window.split_whitespace().collect();
        if heading_tokens.is_empty() || window_tokens.is_empty() {
            return 0.0;
        }
        let run = longest_common_run(&heading_tokens, &window_tokens);
        run as f64 / heading_tokens.len() as f64
    }
}

/// Length of the longest contiguous token run present in both sequences.
fn longest_common_run(a: &[&str], b: &[&str]) -> usize {
    let mut best = 0;
    for ai in 0..a.len() {
        for bi in 0..b.len() {
            let mut len = 0;
            while ai + len < a.len() && bi + len < b.len() && a[ai + len] == b[bi + len] {
                len += 1;
            }
            best = best.max(len);
        }
    }
    best
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn identical_strings_score_one() {
        let sim = TokenBlockSimilarity;
        assert_eq!(sim.score("the great divide", "the great divide"), 1.0);
    }

    #[test]
    fn partial_run_scores_fractionally() {
        let sim = TokenBlockSimilarity;
        // Two of four heading tokens matched in sequence.
        let score = sim.score("a brand new day", "brand new morning light");
        assert!((score - 0.5).abs() < 1e-9);
    }

    #[test]
    fn disjoint_strings_score_zero() {
        let sim = TokenBlockSimilarity;
        assert_eq!(sim.score("quantum flux", "banana stand"), 0.0);
    }

    #[test]
    fn empty_inputs_score_zero() {
        let sim = TokenBlockSimilarity;
        assert_eq!(sim.score("", "anything"), 0.0);
        assert_eq!(sim.score("anything", ""), 0.0);
    }

    #[test]
    fn closures_are_accepted() {
        let exact = |a: &str, b: &str| if a == b { 1.0 } else { 0.0 };
        assert_eq!(exact.score("x", "x"), 1.0);
        assert_eq!(exact.score("x", "y"), 0.0);
    }
}
