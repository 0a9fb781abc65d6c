//! Authentication headers for upstream API requests.

/// Attach `Authorization: Bearer <key>` to a request.
///
/// An empty key leaves the request untouched, which lets the client talk to
/// local gateways that do not expect credentials.
pub fn add_auth_headers(
    request: reqwest::RequestBuilder,
    api_key: &str,
) -> reqwest::RequestBuilder {
    let api_key = api_key.trim();
    if api_key.is_empty() {
        return request;
    }
    request.header(reqwest::header::AUTHORIZATION, format!("Bearer {api_key}"))
}
