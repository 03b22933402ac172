#[cfg(test)]
#[path = "annotations_test.rs"]
mod tests;

use once_cell::sync::Lazy;
use regex::Regex;

// Agents embed their reasoning between a fixed delimiter pair. Only the first
// block is honoured, matching is case-insensitive.
static THINKING: Lazy<Regex> = Lazy::new(|| return Regex::new(r"(?is)<think>(.*?)</think>").unwrap());
static TAG: Lazy<Regex> = Lazy::new(|| return Regex::new(r"(?s)<[^>]*>").unwrap());
static MARKUP: Lazy<Regex> = Lazy::new(|| return Regex::new(r"(?i)<[a-z][^>]*>").unwrap());
static WHITESPACE: Lazy<Regex> = Lazy::new(|| return Regex::new(r"\s+").unwrap());

/// Splits an agent reply into the text to display and the thinking process,
/// if one was embedded.
pub fn extract_thinking(text: &str) -> (String, Option<String>) {
    if let Some((captures, whole)) = THINKING
        .captures(text)
        .and_then(|e| return e.get(0).map(|whole| return (e, whole)))
    {
        let thinking = captures
            .get(1)
            .map(|e| return e.as_str().trim().to_string())
            .unwrap_or_default();

        let display = format!("{}{}", &text[..whole.start()], &text[whole.end()..]);
        return (display.trim().to_string(), Some(thinking));
    }

    return (text.trim().to_string(), None);
}

pub fn contains_markup(text: &str) -> bool {
    return MARKUP.is_match(text);
}

/// Reduces a reply to what should be read aloud: no thinking annotation, no
/// tags, common entities decoded, whitespace collapsed.
pub fn speakable_text(text: &str) -> String {
    let (display, _) = extract_thinking(text);
    let stripped = TAG.replace_all(&display, " ");
    let decoded = stripped
        .replace("&nbsp;", " ")
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&#39;", "'")
        .replace("&amp;", "&");

    return WHITESPACE.replace_all(&decoded, " ").trim().to_string();
}
