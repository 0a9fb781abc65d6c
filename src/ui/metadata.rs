//! Plain-text summaries of answer metadata.

use crate::api::Usage;
use crate::core::aggregator::ResponseMetadata;

pub fn format_usage(usage: &Usage) -> String {
    let mut line = format!(
        "Tokens: {} prompt + {} completion = {} total",
        usage.prompt_tokens, usage.completion_tokens, usage.total_tokens
    );
    let extras: Vec<String> = [
        ("citation", usage.citation_tokens),
        ("reasoning", usage.reasoning_tokens),
        ("search queries", usage.num_search_queries),
    ]
    .into_iter()
    .filter_map(|(label, value)| value.map(|value| format!("{label}: {value}")))
    .collect();
    if !extras.is_empty() {
        line.push_str(&format!(" ({})", extras.join(", ")));
    }
    line
}

/// Numbered reference list, or `None` when the answer cited nothing.
pub fn format_references(metadata: &ResponseMetadata) -> Option<String> {
    let urls = metadata.reference_urls();
    if urls.is_empty() {
        return None;
    }
    let mut text = String::from("References:");
    for (index, url) in urls.iter().enumerate() {
        text.push_str(&format!("\n  [{}] {}", index + 1, url));
    }
    Some(text)
}

pub fn format_metadata(metadata: &ResponseMetadata) -> String {
    let mut sections = Vec::new();

    match &metadata.usage {
        Some(usage) => sections.push(format_usage(usage)),
        None => sections.push("Tokens: not reported".to_string()),
    }

    if !metadata.citations.is_empty() {
        let mut text = String::from("Citations:");
        for (index, citation) in metadata.citations.iter().enumerate() {
            let title = if citation.title.is_empty() {
                "(untitled)"
            } else {
                citation.title.as_str()
            };
            text.push_str(&format!("\n  {}. {}", index + 1, title));
            if !citation.url.is_empty() {
                text.push_str(&format!(" <{}>", citation.url));
            }
        }
        sections.push(text);
    }

    if let Some(references) = format_references(metadata) {
        sections.push(references);
    }

    sections.join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::Citation;

    #[test]
    fn usage_lists_optional_counters_when_present() {
        let mut usage = Usage::new(10, 20, 30);
        assert_eq!(
            format_usage(&usage),
            "Tokens: 10 prompt + 20 completion = 30 total"
        );

        usage.num_search_queries = Some(2);
        usage.citation_tokens = Some(5);
        assert_eq!(
            format_usage(&usage),
            "Tokens: 10 prompt + 20 completion = 30 total (citation: 5, search queries: 2)"
        );
    }

    #[test]
    fn metadata_includes_citations_and_references() {
        let metadata = ResponseMetadata::finalize(
            Some(Usage::new(1, 2, 3)),
            vec![
                Citation::new("Rust", "https://www.rust-lang.org"),
                Citation::new("", "https://docs.rs"),
            ],
            "",
        );

        let text = format_metadata(&metadata);

        assert!(text.contains("1. Rust <https://www.rust-lang.org>"));
        assert!(text.contains("2. (untitled) <https://docs.rs>"));
        assert!(text.contains("[1] https://docs.rs"));
        assert!(text.contains("[2] https://www.rust-lang.org"));
    }

    #[test]
    fn answers_without_sources_have_no_reference_block() {
        let metadata = ResponseMetadata::finalize(None, Vec::new(), "no links here");
        assert_eq!(format_references(&metadata), None);
        assert_eq!(format_metadata(&metadata), "Tokens: not reported");
    }
}
