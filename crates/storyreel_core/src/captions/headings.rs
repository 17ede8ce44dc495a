//! Heading markers in narration scripts.
//!
//! Scripts mark section headings inline as `:Heading Text::`. The marker
//! text is spoken by the narrator, so the same words show up in the
//! transcription and can be aligned back to their timestamps.

/// Extract heading strings from a script.
///
/// Scans each line for `:` ... `::` spans (markers never cross lines).
/// Whitespace-only captures are dropped.
pub fn extract_headings(script: &str) -> Vec<String> {
    let mut headings = Vec::new();
    for line in script.lines() {
        let mut rest = line;
        while let Some(open) = rest.find(':') {
            let after = &rest[open + 1..];
            match after.find("::") {
                Some(close) => {
                    let heading = &after[..close];
                    if !heading.trim().is_empty() {
                        headings.push(heading.to_string());
                    }
                    rest = &after[close + 2..];
                }
                None => break,
            }
        }
    }
    headings
}

/// Remove heading markers from a script, keeping the heading text.
///
/// `:Heading Text::` becomes `Heading Text`. Used before handing the
/// script to speech synthesis so the colons are not read as punctuation.
pub fn strip_heading_markers(script: &str) -> String {
    let mut out = String::with_capacity(script.len());
    for (i, line) in script.lines().enumerate() {
        if i > 0 {
            out.push('\n');
        }
        let mut rest = line;
        while let Some(open) = rest.find(':') {
            let after = &rest[open + 1..];
            match after.find("::") {
                Some(close) => {
                    out.push_str(&rest[..open]);
                    out.push_str(&after[..close]);
                    rest = &after[close + 2..];
                }
                None => break,
            }
        }
        out.push_str(rest);
    }
    if script.ends_with('\n') {
        out.push('\n');
    }
    out
}

/// Normalize text for fuzzy matching: lowercase, strip punctuation,
/// collapse whitespace.
pub fn normalize_for_matching(text: &str) -> String {
    let lowered = text.to_lowercase();
    let mut cleaned = String::with_capacity(lowered.len());
    for c in lowered.chars() {
        if c.is_alphanumeric() {
            cleaned.push(c);
        } else if c.is_whitespace() {
            cleaned.push(' ');
        }
    }
    let tokens: Vec<&str> = cleaned.split_whitespace().collect();
    tokens.join(" ")
}
