//! Catch-all upload interception.
//!
//! The catch-all route first checks whether the request is a multipart
//! upload to a configured target. If so, file parts are spooled to disk and
//! the request is rewritten into a plain form carrying the spool paths
//! before being forwarded to the API stack; everything else is forwarded
//! verbatim.
//!
//! # Design Decisions
//! - Spooled files use the configured prefix/suffix so downstream cleanup
//!   jobs can recognize them
//! - Body limits are enforced while spooling; a lying Content-Length still
//!   cannot buffer more than the cap
//! - Forwarded requests keep their body streaming; nothing is buffered here

use std::io::Write;
use std::path::PathBuf;

use axum::body::Body;
use axum::extract::{FromRequest, Multipart, Request};
use axum::http::{header, Method, StatusCode};
use axum::response::{IntoResponse, Response};
use tower::ServiceExt;

use crate::config::schema::{UploadConfig, UploadTarget};

/// Find the upload target a request belongs to, if any.
pub fn find_target<'a>(
    config: &'a UploadConfig,
    method: &Method,
    path: &str,
) -> Option<&'a UploadTarget> {
    config.targets.iter().find(|target| {
        target.method.eq_ignore_ascii_case(method.as_str())
            && path.starts_with(&target.path_prefix)
    })
}

fn is_multipart(request: &Request) -> bool {
    request
        .headers()
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .map(|ct| ct.starts_with("multipart/form-data"))
        .unwrap_or(false)
}

/// Handle one catch-all request: intercept a matching multipart upload or
/// forward the request verbatim to the API stack.
pub async fn intercept_or_forward(
    config: &UploadConfig,
    api: axum::Router,
    request: Request,
    max_body: usize,
) -> Response {
    let intercept = find_target(config, request.method(), request.uri().path()).is_some()
        && is_multipart(&request);

    if !intercept {
        return forward(api, request, max_body).await;
    }

    match spool_multipart(config, request, max_body).await {
        Ok(rewritten) => forward(api, rewritten, max_body).await,
        Err(response) => response,
    }
}

/// Spool multipart file parts to disk and rewrite the request as an
/// urlencoded form referencing the spooled paths.
async fn spool_multipart(
    config: &UploadConfig,
    request: Request,
    max_body: usize,
) -> Result<Request, Response> {
    let uri = request.uri().clone();
    let method = request.method().clone();

    let mut multipart = Multipart::from_request(request, &())
        .await
        .map_err(|e| (StatusCode::BAD_REQUEST, e.to_string()).into_response())?;

    let name_suffix = config
        .suffixes
        .get("name")
        .map(String::as_str)
        .unwrap_or("name");
    let path_suffix = config
        .suffixes
        .get("path")
        .map(String::as_str)
        .unwrap_or("path");

    let mut fields: Vec<(String, String)> = Vec::new();
    let mut spooled: Vec<PathBuf> = Vec::new();
    let mut total: usize = 0;

    let result: Result<(), Response> = async {
        while let Some(mut field) = multipart
            .next_field()
            .await
            .map_err(|e| (StatusCode::BAD_REQUEST, e.to_string()).into_response())?
        {
            let field_name = field.name().unwrap_or("file").to_string();

            if let Some(file_name) = field.file_name().map(str::to_string) {
                let mut temp = tempfile::Builder::new()
                    .prefix(&config.file_prefix)
                    .suffix(&config.file_suffix)
                    .tempfile()
                    .map_err(internal_error)?;

                while let Some(chunk) = field
                    .chunk()
                    .await
                    .map_err(|e| (StatusCode::BAD_REQUEST, e.to_string()).into_response())?
                {
                    total += chunk.len();
                    if total > max_body {
                        return Err((StatusCode::PAYLOAD_TOO_LARGE, "Upload too large")
                            .into_response());
                    }
                    temp.write_all(&chunk).map_err(internal_error)?;
                }

                let (_, path) = temp.keep().map_err(|e| internal_error(e.error))?;
                tracing::debug!(field = %field_name, path = ?path, "Upload spooled to disk");

                fields.push((format!("{field_name}.{name_suffix}"), file_name));
                fields.push((
                    format!("{field_name}.{path_suffix}"),
                    path.to_string_lossy().into_owned(),
                ));
                spooled.push(path);
            } else {
                let value = field
                    .text()
                    .await
                    .map_err(|e| (StatusCode::BAD_REQUEST, e.to_string()).into_response())?;
                total += value.len();
                if total > max_body {
                    return Err(
                        (StatusCode::PAYLOAD_TOO_LARGE, "Upload too large").into_response()
                    );
                }
                fields.push((field_name, value));
            }
        }
        Ok(())
    }
    .await;

    if let Err(response) = result {
        // A rejected upload must not leave spool files behind.
        for path in spooled {
            let _ = std::fs::remove_file(path);
        }
        return Err(response);
    }

    let mut serializer = url::form_urlencoded::Serializer::new(String::new());
    for (key, value) in &fields {
        serializer.append_pair(key, value);
    }
    let body = serializer.finish();

    Request::builder()
        .method(method)
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
        .body(Body::from(body))
        .map_err(internal_error)
}

/// Forward a request to the API stack, capping its streamed body.
async fn forward(api: axum::Router, request: Request, max_body: usize) -> Response {
    let (parts, body) = request.into_parts();
    let request = Request::from_parts(parts, limit_body(body, max_body));

    match api.oneshot(request).await {
        Ok(response) => response,
        Err(never) => match never {},
    }
}

/// Wrap a body stream so it errors out once `limit` bytes have passed.
pub(crate) fn limit_body(body: Body, limit: usize) -> Body {
    use futures_util::StreamExt;

    let mut total: usize = 0;
    Body::from_stream(body.into_data_stream().map(move |chunk| {
        let chunk = chunk.map_err(std::io::Error::other)?;
        total += chunk.len();
        if total > limit {
            return Err(std::io::Error::other("request body over limit"));
        }
        Ok::<_, std::io::Error>(chunk)
    }))
}

fn internal_error<E: std::fmt::Display>(error: E) -> Response {
    tracing::error!(error = %error, "Upload handling failed");
    (StatusCode::INTERNAL_SERVER_ERROR, "Upload failed").into_response()
}

/// Field names the API stack uses to find the spooled file, given the
/// original field name and the configured suffixes.
pub fn spooled_field_names(config: &UploadConfig, field: &str) -> (String, String) {
    let name_suffix = config
        .suffixes
        .get("name")
        .map(String::as_str)
        .unwrap_or("name");
    let path_suffix = config
        .suffixes
        .get("path")
        .map(String::as_str)
        .unwrap_or("path");
    (
        format!("{field}.{name_suffix}"),
        format!("{field}.{path_suffix}"),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::schema::UploadConfig;

    #[test]
    fn target_matching_requires_method_and_prefix() {
        let config = UploadConfig::default();
        assert!(find_target(&config, &Method::POST, "/api/files/local").is_some());
        assert!(find_target(&config, &Method::GET, "/api/files/local").is_none());
        assert!(find_target(&config, &Method::POST, "/api/version").is_none());
    }

    #[test]
    fn spooled_field_names_use_configured_suffixes() {
        let mut config = UploadConfig::default();
        config.suffixes.insert("path".to_string(), "spool".to_string());
        let (name, path) = spooled_field_names(&config, "file");
        assert_eq!(name, "file.name");
        assert_eq!(path, "file.spool");
    }
}
