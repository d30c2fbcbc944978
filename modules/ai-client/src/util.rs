/// Truncate `s` to at most `max_bytes` bytes without splitting a UTF-8
/// character.
pub fn truncate_to_char_boundary(s: &str, max_bytes: usize) -> &str {
    if s.len() <= max_bytes {
        return s;
    }
    let cut = (0..=max_bytes)
        .rev()
        .find(|&i| s.is_char_boundary(i))
        .unwrap_or(0);
    &s[..cut]
}

/// Strip a surrounding markdown code fence from a model response.
///
/// Chat models habitually wrap JSON payloads in ``` fences even when told
/// not to. The opening fence may carry an info string ("json"), which is
/// dropped along with its line. Bare payloads and unterminated fences pass
/// through with only whitespace trimmed.
pub fn strip_code_fences(response: &str) -> &str {
    let trimmed = response.trim();
    let Some(rest) = trimmed.strip_prefix("```") else {
        return trimmed;
    };
    let body = match rest.split_once('\n') {
        Some((_info, after_fence)) => after_fence,
        None => rest,
    };
    match body.trim_end().strip_suffix("```") {
        Some(inner) => inner.trim(),
        None => body.trim(),
    }
}
