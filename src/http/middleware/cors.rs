//! Cross-origin response post-processing for protected extension routes.

use axum::http::header::{HeaderValue, ORIGIN};
use axum::http::HeaderMap;
use axum::response::Response;

/// Attach CORS headers to a response, echoing the request origin when one
/// was sent and falling back to a wildcard otherwise.
pub fn apply(response: &mut Response, request_headers: &HeaderMap) {
    let origin = request_headers
        .get(ORIGIN)
        .cloned()
        .unwrap_or_else(|| HeaderValue::from_static("*"));

    let headers = response.headers_mut();
    headers.insert("access-control-allow-origin", origin);
    headers.insert(
        "access-control-allow-methods",
        HeaderValue::from_static("GET, POST, PUT, PATCH, DELETE, OPTIONS"),
    );
    headers.insert(
        "access-control-allow-headers",
        HeaderValue::from_static("Content-Type, X-Api-Key"),
    );
}
