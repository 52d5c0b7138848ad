//! Whitespace normalization and length capping for raw extracted text.
//!
//! Extracted text arrives noisy: OCR artifacts, layout-driven blank lines, trailing
//! whitespace. Normalization collapses that noise before budgets are computed so that
//! chunk boundaries and the short-text threshold operate on meaningful characters.

/// Notice appended when input text is truncated to the configured cap.
pub const TRUNCATION_NOTICE: &str = "\n\n[Content truncated for length...]";

/// Clean raw text for the summarization pipeline.
///
/// Trims each line, drops blank lines, and rejoins with single newlines. When the
/// cleaned text exceeds `max_chars` it is truncated from the end, keeping the
/// beginning of the document, and a truncation notice is appended. Never fails;
/// empty input yields an empty string, which callers must treat as an
/// extraction-produced-nothing condition.
pub fn normalize(text: &str, max_chars: usize) -> String {
    let cleaned = text
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .collect::<Vec<_>>()
        .join("\n");

    if cleaned.chars().count() <= max_chars {
        return cleaned;
    }

    let mut truncated: String = cleaned.chars().take(max_chars).collect();
    truncated.push_str(TRUNCATION_NOTICE);
    truncated
}
