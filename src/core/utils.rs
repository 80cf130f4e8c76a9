const MAX_STEM_CHARS: usize = 50;

/// Turns free text into a cache filename: trimmed, spaces to underscores,
/// only `[A-Za-z0-9_-]` kept, stem capped at 50 characters.
pub fn derive_filename(text: &str, ext: &str) -> String {
    let stem: String = text
        .trim()
        .replace(' ', "_")
        .chars()
        .filter(|c| c.is_ascii_alphanumeric() || *c == '_' || *c == '-')
        .take(MAX_STEM_CHARS)
        .collect();

    format!("{stem}.{ext}")
}
