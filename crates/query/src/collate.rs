use std::cmp::Ordering;

/// Locale-style string ordering: case-insensitive first, lowercase before
/// uppercase when the strings differ only in case.
pub fn locale_cmp(a: &str, b: &str) -> Ordering {
    let folded = a
        .chars()
        .flat_map(char::to_lowercase)
        .cmp(b.chars().flat_map(char::to_lowercase));
    folded.then_with(|| b.cmp(a))
}
