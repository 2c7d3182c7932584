//! Turning vendor output into ALT text.

/// Hard cap on caption length, in characters.
pub const MAX_CAPTION_CHARS: usize = 180;

/// Label-based providers describe an image with at most this many labels.
pub const MAX_LABELS: usize = 3;

/// Characters stripped from both ends of a label phrase.
const PHRASE_TRIM: &[char] = &[' ', '\t', '\n', '\r', '\0', '\x0B', ',', '.'];

/// Compose a label phrase: top three labels joined with ", ", trimmed of
/// whitespace and trailing punctuation, first letter capitalized, capped at
/// [`MAX_CAPTION_CHARS`].
///
/// Returns `None` when nothing usable is left.
pub fn labels_to_alt<S: AsRef<str>>(labels: &[S]) -> Option<String> {
    let phrase = labels
        .iter()
        .take(MAX_LABELS)
        .map(|label| label.as_ref())
        .collect::<Vec<_>>()
        .join(", ");

    let phrase = capitalize_first(phrase.trim_matches(PHRASE_TRIM));
    let alt = truncate_chars(&phrase, MAX_CAPTION_CHARS);
    (!alt.is_empty()).then(|| alt.to_string())
}

/// Trim surrounding whitespace and cap at `max_chars` characters.
pub fn finalize_caption(text: &str, max_chars: usize) -> Option<String> {
    let caption = truncate_chars(text.trim(), max_chars).trim_end();
    (!caption.is_empty()).then(|| caption.to_string())
}

/// Upper-case the first character, leave the rest untouched.
pub fn capitalize_first(text: &str) -> String {
    let mut chars = text.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

/// Cut a string to at most `max_chars` characters (not bytes).
pub fn truncate_chars(text: &str, max_chars: usize) -> &str {
    match text.char_indices().nth(max_chars) {
        Some((byte_idx, _)) => &text[..byte_idx],
        None => text,
    }
}
