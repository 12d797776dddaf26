//! Locating a JSON object inside free-form model output

/// Why no object could be extracted
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum ExtractError {
    #[error("no opening brace in text")]
    NotFound,
    #[error("object starting at byte {start} is never closed")]
    Unterminated { start: usize },
}

/// Returns the first balanced top-level `{...}` substring of `text`
///
/// Braces inside JSON string literals (including escaped quotes) do not count
/// toward nesting, so prose around the object and code fences are tolerated.
/// The result is not validated as JSON.
pub fn extract_json_object(text: &str) -> Result<&str, ExtractError> {
    let start = text.find('{').ok_or(ExtractError::NotFound)?;

    let mut depth = 0usize;
    let mut in_string = false;
    let mut escaped = false;

    for (offset, ch) in text[start..].char_indices() {
        if in_string {
            match ch {
                _ if escaped => escaped = false,
                '\\' => escaped = true,
                '"' => in_string = false,
                _ => {}
            }
            continue;
        }

        match ch {
            '"' => in_string = true,
            '{' => depth += 1,
            '}' => {
                depth -= 1;
                if depth == 0 {
                    let end = start + offset + ch.len_utf8();
                    return Ok(&text[start..end]);
                }
            }
            _ => {}
        }
    }

    Err(ExtractError::Unterminated { start })
}

/// First `max_chars` characters of `text`, cut on a character boundary
pub fn truncate_chars(text: &str, max_chars: usize) -> String {
    text.chars().take(max_chars).collect()
}
