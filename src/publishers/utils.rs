/// Trim text to at most `max_chars` characters, replacing the tail with `...` if trimmed.
/// Uses char-aware slicing to avoid breaking UTF-8 sequences.
pub fn trim_with_ellipsis(text: &str, max_chars: usize) -> String {
    const DOTS: &str = "...";
    let count = text.chars().count();
    if count <= max_chars {
        return text.to_string();
    }
    if max_chars <= DOTS.len() {
        return DOTS.chars().take(max_chars).collect();
    }
    let mut s: String = text.chars().take(max_chars - DOTS.len()).collect();
    s.push_str(DOTS);
    s
}
