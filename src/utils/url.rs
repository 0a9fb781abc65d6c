//! URL helpers for building API and tool-server endpoints.

/// Strip trailing slashes so endpoints can be appended safely.
///
/// ```
/// use sonarchat::utils::url::normalize_base_url;
///
/// assert_eq!(normalize_base_url("https://api.perplexity.ai/"), "https://api.perplexity.ai");
/// assert_eq!(normalize_base_url("https://api.perplexity.ai///"), "https://api.perplexity.ai");
/// ```
pub fn normalize_base_url(base_url: &str) -> String {
    base_url.trim().trim_end_matches('/').to_string()
}

/// Join a base URL and an endpoint path with exactly one slash.
///
/// ```
/// use sonarchat::utils::url::construct_api_url;
///
/// assert_eq!(
///     construct_api_url("https://api.perplexity.ai/", "/chat/completions"),
///     "https://api.perplexity.ai/chat/completions"
/// );
/// ```
pub fn construct_api_url(base_url: &str, endpoint: &str) -> String {
    let normalized_base = normalize_base_url(base_url);
    let endpoint = endpoint.trim_start_matches('/');
    format!("{}/{}", normalized_base, endpoint)
}

/// Whether `url` is something the HTTP client can talk to.
pub fn is_http_url(url: &str) -> bool {
    let url = url.trim();
    let rest = url
        .strip_prefix("https://")
        .or_else(|| url.strip_prefix("http://"));
    matches!(rest, Some(host) if !host.is_empty() && !host.starts_with('/'))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalize_handles_whitespace_and_slashes() {
        assert_eq!(
            normalize_base_url("  https://api.perplexity.ai/  "),
            "https://api.perplexity.ai"
        );
        assert_eq!(normalize_base_url("http://localhost:8080"), "http://localhost:8080");
        assert_eq!(normalize_base_url("///"), "");
    }

    #[test]
    fn construct_api_url_joins_tool_server_paths() {
        assert_eq!(
            construct_api_url("http://127.0.0.1:9000/", "health"),
            "http://127.0.0.1:9000/health"
        );
        assert_eq!(
            construct_api_url("http://127.0.0.1:9000", "tools/search"),
            "http://127.0.0.1:9000/tools/search"
        );
        assert_eq!(
            construct_api_url("https://api.perplexity.ai", "chat/completions/req-1"),
            "https://api.perplexity.ai/chat/completions/req-1"
        );
    }

    #[test]
    fn is_http_url_requires_scheme_and_host() {
        assert!(is_http_url("http://localhost:3000"));
        assert!(is_http_url("https://tools.example.com/mcp"));
        assert!(!is_http_url("localhost:3000"));
        assert!(!is_http_url("https://"));
        assert!(!is_http_url("ftp://example.com"));
    }
}
