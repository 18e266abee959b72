//! Defensive extraction of an [`Enhancement`] from model output.
//!
//! Models rarely return clean JSON. Parsing is an explicit two-stage
//! decode: strict parse of the whole text first, then bounded best-effort
//! extraction (markdown code fences, outermost brace span). Anything
//! beyond that is the caller's fallback, not this module's problem.

use crate::types::Enhancement;

/// Parse model output into an [`Enhancement`].
///
/// Strategies, most structured first:
/// 1. Strict parse of the whole trimmed text.
/// 2. Contents of a ```json fenced block.
/// 3. The span from the first `{` to the last `}`.
pub fn parse_enhancement(text: &str) -> Option<Enhancement> {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return None;
    }

    if let Ok(val) = serde_json::from_str::<Enhancement>(trimmed) {
        return Some(val);
    }

    if let Some(block) = extract_code_block(trimmed) {
        if let Ok(val) = serde_json::from_str::<Enhancement>(&block) {
            return Some(val);
        }
    }

    if let Some(span) = extract_brace_span(trimmed) {
        if let Ok(val) = serde_json::from_str::<Enhancement>(span) {
            return Some(val);
        }
    }

    None
}

/// Extract the contents of a ```json ... ``` (or bare ```) fenced block.
fn extract_code_block(text: &str) -> Option<String> {
    for marker in ["```json", "```JSON", "```"] {
        if let Some(start) = text.find(marker) {
            let content_start = start + marker.len();
            if let Some(end) = text[content_start..].find("```") {
                return Some(text[content_start..content_start + end].trim().to_string());
            }
        }
    }
    None
}

/// The substring from the first `{` to the last `}`, if any.
fn extract_brace_span(text: &str) -> Option<&str> {
    let start = text.find('{')?;
    let end = text.rfind('}')?;
    if end > start {
        Some(&text[start..=end])
    } else {
        None
    }
}
