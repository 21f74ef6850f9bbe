// ABOUTME: Small helpers for text truncation, Notion ids, and default titles
// ABOUTME: Accepts page URLs and bare ids alike

use std::path::Path;

pub fn truncate_str(s: &str, max_chars: usize) -> String {
    if s.len() <= max_chars {
        return s.to_string();
    }

    // Find a valid UTF-8 boundary at or before max_chars
    let mut boundary = max_chars;
    while boundary > 0 && !s.is_char_boundary(boundary) {
        boundary -= 1;
    }

    if boundary == 0 {
        return String::new();
    }

    format!("{}...", &s[..boundary])
}

/// Turns a Notion page URL, bare 32-hex id, or hyphenated UUID into the
/// hyphenated form. Anything else is returned trimmed and untouched.
pub fn normalize_page_id(input: &str) -> String {
    let trimmed = input.trim();
    let without_query = trimmed.split(['?', '#']).next().unwrap_or(trimmed);
    let last_segment = without_query
        .trim_end_matches('/')
        .rsplit('/')
        .next()
        .unwrap_or(without_query);

    let compact: Vec<char> = last_segment.chars().filter(|c| *c != '-').collect();
    if compact.len() < 32 {
        return trimmed.to_string();
    }

    let hex = &compact[compact.len() - 32..];
    if !hex.iter().all(char::is_ascii_hexdigit) {
        return trimmed.to_string();
    }

    let hex: String = hex.iter().collect::<String>().to_lowercase();
    format!(
        "{}-{}-{}-{}-{}",
        &hex[0..8],
        &hex[8..12],
        &hex[12..16],
        &hex[16..20],
        &hex[20..32]
    )
}

/// Default page title: the file name without its extension.
pub fn title_from_path(path: &Path) -> String {
    path.file_stem()
        .map(|stem| stem.to_string_lossy().into_owned())
        .unwrap_or_default()
}

/// Consecutive groups of at most `size` items, order kept. A zero `size`
/// is treated as 1.
pub fn chunked<T>(items: Vec<T>, size: usize) -> Vec<Vec<T>> {
    let size = size.max(1);
    let mut chunks = Vec::with_capacity(items.len().div_ceil(size));
    let mut iter = items.into_iter().peekable();
    while iter.peek().is_some() {
        chunks.push(iter.by_ref().take(size).collect());
    }
    chunks
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_truncate_str_short() {
        assert_eq!(truncate_str("hello", 100), "hello");
    }

    #[test]
    fn test_truncate_str_long() {
        let result = truncate_str("hello world", 7);
        assert!(result.starts_with("hello"));
        assert!(result.ends_with("..."));
    }

    #[test]
    fn test_truncate_str_utf8() {
        // Multi-byte characters must not split
        let text = "Hello 世界 World";
        let result = truncate_str(text, 8);
        assert_eq!(result, "Hello ...");
    }

    #[test]
    fn test_normalize_page_id_bare_hex() {
        assert_eq!(
            normalize_page_id("1429989FE8AC4EFFBC8F57F56486DB54"),
            "1429989f-e8ac-4eff-bc8f-57f56486db54"
        );
    }

    #[test]
    fn test_normalize_page_id_hyphenated() {
        assert_eq!(
            normalize_page_id(" 1429989f-e8ac-4eff-bc8f-57f56486db54 "),
            "1429989f-e8ac-4eff-bc8f-57f56486db54"
        );
    }

    #[test]
    fn test_normalize_page_id_url() {
        assert_eq!(
            normalize_page_id(
                "https://www.notion.so/acme/Meeting-Notes-1429989fe8ac4effbc8f57f56486db54?pvs=4"
            ),
            "1429989f-e8ac-4eff-bc8f-57f56486db54"
        );
    }

    #[test]
    fn test_normalize_page_id_passthrough() {
        assert_eq!(normalize_page_id("p1"), "p1");
        assert_eq!(normalize_page_id(""), "");
        assert_eq!(
            normalize_page_id("not-a-notion-page-id-with-enough-length-zz"),
            "not-a-notion-page-id-with-enough-length-zz"
        );
    }

    #[test]
    fn test_title_from_path() {
        assert_eq!(title_from_path(Path::new("docs/MyNote.md")), "MyNote");
        assert_eq!(title_from_path(Path::new("README")), "README");
    }

    #[test]
    fn test_chunked_keeps_order() {
        let chunks = chunked((0..7).collect::<Vec<_>>(), 3);
        assert_eq!(chunks, vec![vec![0, 1, 2], vec![3, 4, 5], vec![6]]);
        assert!(chunked(Vec::<u8>::new(), 3).is_empty());
        assert_eq!(chunked(vec![1, 2], 0).len(), 2);
    }
}
