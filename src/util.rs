//! Shared utility functions used across the codebase.

use std::collections::HashSet;

/// Number of system-prompt characters shown in registry listings.
pub const PROMPT_PREVIEW_CHARS: usize = 100;

/// Deduplicate and trim a list of identifiers, preserving first-seen order.
pub fn dedup_preserving_order(items: &[String]) -> Vec<String> {
    let mut seen = HashSet::new();
    let mut out = Vec::new();
    for item in items {
        let trimmed = item.trim();
        if trimmed.is_empty() {
            continue;
        }
        if seen.insert(trimmed.to_string()) {
            out.push(trimmed.to_string());
        }
    }
    out
}

/// First `PROMPT_PREVIEW_CHARS` characters of a prompt followed by `...`,
/// or an empty string when there is no prompt.
pub fn prompt_preview(prompt: Option<&str>) -> String {
    match prompt {
        Some(p) => {
            let head: String = p.chars().take(PROMPT_PREVIEW_CHARS).collect();
            format!("{}...", head)
        }
        None => String::new(),
    }
}

/// Shorten text for log lines without splitting a UTF-8 character.
pub fn truncate_for_log(text: &str, max_chars: usize) -> String {
    if text.chars().count() <= max_chars {
        return text.to_string();
    }
    let head: String = text.chars().take(max_chars).collect();
    format!("{}…", head)
}
