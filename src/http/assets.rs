//! Static asset passthrough.
//!
//! Serves `robots.txt` and extension-declared asset folders under
//! `/plugin_assets/<name>/<path>`. Absent extensions or folders are a clean
//! 404.

use std::path::{Component, Path, PathBuf};

use axum::body::Body;
use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use tokio_util::io::ReaderStream;

use crate::context::AppContext;

/// Serve the bundled robots.txt.
pub fn robots() -> Response {
    (
        [(header::CONTENT_TYPE, "text/plain; charset=utf-8")],
        include_str!("../../static/robots.txt"),
    )
        .into_response()
}

/// Serve one file from an extension's declared asset folder.
pub async fn serve_plugin_asset(app: &AppContext, name: &str, rel_path: &str) -> Response {
    let folder = app
        .extensions
        .get(name)
        .and_then(|e| e.as_asset_contributor())
        .and_then(|c| c.asset_folder());
    let Some(folder) = folder else {
        return (StatusCode::NOT_FOUND, "Asset not found").into_response();
    };

    let Some(rel) = sanitize_rel_path(rel_path) else {
        return (StatusCode::NOT_FOUND, "Asset not found").into_response();
    };
    let path = folder.join(rel);

    let file = match tokio::fs::File::open(&path).await {
        Ok(file) => file,
        Err(_) => return (StatusCode::NOT_FOUND, "Asset not found").into_response(),
    };

    Response::builder()
        .status(StatusCode::OK)
        .header(header::CONTENT_TYPE, content_type_for(&path))
        .body(Body::from_stream(ReaderStream::new(file)))
        .unwrap_or_else(|_| StatusCode::INTERNAL_SERVER_ERROR.into_response())
}

/// Accept only plain relative paths: no roots, no parent components.
fn sanitize_rel_path(rel: &str) -> Option<PathBuf> {
    let path = Path::new(rel);
    let mut clean = PathBuf::new();
    for component in path.components() {
        match component {
            Component::Normal(part) => clean.push(part),
            _ => return None,
        }
    }
    (!clean.as_os_str().is_empty()).then_some(clean)
}

fn content_type_for(path: &Path) -> &'static str {
    match path.extension().and_then(|e| e.to_str()) {
        Some("js") => "application/javascript",
        Some("css") => "text/css",
        Some("html") => "text/html; charset=utf-8",
        Some("png") => "image/png",
        Some("jpg") | Some("jpeg") => "image/jpeg",
        Some("gif") => "image/gif",
        Some("svg") => "image/svg+xml",
        Some("json") => "application/json",
        _ => "application/octet-stream",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rel_paths_with_parents_are_rejected() {
        assert!(sanitize_rel_path("../../etc/passwd").is_none());
        assert!(sanitize_rel_path("/abs/path").is_none());
        assert!(sanitize_rel_path("").is_none());
        assert_eq!(
            sanitize_rel_path("js/app.js").unwrap(),
            PathBuf::from("js/app.js")
        );
    }

    #[tokio::test]
    async fn unknown_extension_is_not_found() {
        let app = crate::test_support::test_context(|_| {});
        let response = serve_plugin_asset(&app, "ghost", "app.js").await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }
}
