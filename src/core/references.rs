//! Fallback source links mined from answer text.
//!
//! Used when the upstream API returns no structured citations for a turn.

use regex::Regex;
use std::collections::BTreeSet;
use std::sync::LazyLock;

static URL_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"https?://(?:[-\w.]|%[0-9a-fA-F]{2})+[/\w.\-?=&]*")
        .expect("reference pattern is valid")
});

/// Collect every distinct http(s) URL in `text`.
///
/// Returns an empty vector when nothing matches, otherwise a single set
/// holding all matches.
///
/// ```
/// use sonarchat::core::references::extract_references;
///
/// let refs = extract_references("See https://a.com/x?y=1 and https://a.com/x?y=1 again");
/// assert_eq!(refs.len(), 1);
/// assert_eq!(refs[0].len(), 1);
/// assert!(refs[0].contains("https://a.com/x?y=1"));
/// ```
pub fn extract_references(text: &str) -> Vec<BTreeSet<String>> {
    let urls: BTreeSet<String> = URL_PATTERN
        .find_iter(text)
        .map(|found| found.as_str().to_string())
        .collect();

    if urls.is_empty() {
        Vec::new()
    } else {
        vec![urls]
    }
}
