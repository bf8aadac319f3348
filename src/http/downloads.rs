//! Download handlers.
//!
//! # Responsibilities
//! - Stream large files chunk-wise so one download never monopolizes the
//!   runtime
//! - Sanitize requested file names against path traversal
//! - Forward the camera snapshot from its configured upstream URL
//!
//! # Design Decisions
//! - Missing files and unset upstream URLs are clean 404s, not errors
//! - Upstream failures surface as 502 without detail leaking to the client

use axum::body::Body;
use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use hyper_util::client::legacy::{connect::HttpConnector, Client};
use std::path::Path;
use tokio_util::io::ReaderStream;

/// HTTP client type shared with the snapshot forwarder.
pub type ForwardClient = Client<HttpConnector, Body>;

/// Reject names that could escape the download root.
fn sanitize_filename(name: &str) -> Option<&str> {
    if name.is_empty() || name.contains('/') || name.contains('\\') || name.contains("..") {
        return None;
    }
    Some(name)
}

/// Stream a file from `root`, optionally as an attachment download.
pub async fn stream_file(root: &Path, filename: &str, as_attachment: bool) -> Response {
    let Some(filename) = sanitize_filename(filename) else {
        return (StatusCode::NOT_FOUND, "File not found").into_response();
    };
    let path = root.join(filename);

    let file = match tokio::fs::File::open(&path).await {
        Ok(file) => file,
        Err(_) => {
            tracing::debug!(path = ?path, "Download target missing");
            return (StatusCode::NOT_FOUND, "File not found").into_response();
        }
    };

    let length = file.metadata().await.ok().map(|m| m.len());
    let body = Body::from_stream(ReaderStream::new(file));

    let mut builder = Response::builder()
        .status(StatusCode::OK)
        .header(header::CONTENT_TYPE, "application/octet-stream");
    if let Some(length) = length {
        builder = builder.header(header::CONTENT_LENGTH, length);
    }
    if as_attachment {
        builder = builder.header(
            header::CONTENT_DISPOSITION,
            format!("attachment; filename=\"{filename}\""),
        );
    }

    builder
        .body(body)
        .unwrap_or_else(|_| StatusCode::INTERNAL_SERVER_ERROR.into_response())
}

/// Forward the camera snapshot from the configured upstream URL.
pub async fn forward_snapshot(client: &ForwardClient, url: Option<&str>) -> Response {
    let Some(url) = url else {
        return (StatusCode::NOT_FOUND, "No snapshot source configured").into_response();
    };
    let Ok(uri) = url.parse::<axum::http::Uri>() else {
        tracing::warn!(url, "Invalid snapshot URL");
        return (StatusCode::BAD_GATEWAY, "Snapshot source unavailable").into_response();
    };

    let request = match axum::http::Request::builder()
        .method(axum::http::Method::GET)
        .uri(uri)
        .body(Body::empty())
    {
        Ok(request) => request,
        Err(e) => {
            tracing::warn!(error = %e, "Could not build snapshot request");
            return (StatusCode::BAD_GATEWAY, "Snapshot source unavailable").into_response();
        }
    };

    match client.request(request).await {
        Ok(response) => {
            let (parts, body) = response.into_parts();
            Response::from_parts(parts, Body::new(body))
        }
        Err(e) => {
            tracing::error!(error = %e, "Snapshot upstream request failed");
            (StatusCode::BAD_GATEWAY, "Snapshot source unavailable").into_response()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn traversal_names_are_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let response = stream_file(dir.path(), "../secret", true).await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn missing_file_is_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let response = stream_file(dir.path(), "nothing.mpg", true).await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn existing_file_streams_with_attachment_headers() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("run.mpg"), b"frames").unwrap();

        let response = stream_file(dir.path(), "run.mpg", true).await;
        assert_eq!(response.status(), StatusCode::OK);
        assert!(response.headers()[header::CONTENT_DISPOSITION]
            .to_str()
            .unwrap()
            .contains("run.mpg"));

        let bytes = axum::body::to_bytes(response.into_body(), 1024).await.unwrap();
        assert_eq!(&bytes[..], b"frames");
    }

    #[tokio::test]
    async fn unset_snapshot_url_is_not_found() {
        let client: ForwardClient =
            Client::builder(hyper_util::rt::TokioExecutor::new()).build(HttpConnector::new());
        let response = forward_snapshot(&client, None).await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }
}
