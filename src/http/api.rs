//! Inner API application.
//!
//! The catch-all route forwards anything it does not intercept to this
//! router — the seam where the synchronous application stack hangs off the
//! async server. Kept deliberately small: version info, the upload endpoint
//! the interception rewrites to, and application-session handshakes.

use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;

use axum::extract::{Form, Path as UrlPath, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde_json::json;

use crate::context::{AppContext, VERSION};
use crate::http::uploads::spooled_field_names;

/// Build the API router the catch-all forwards to.
pub fn api_app(ctx: Arc<AppContext>) -> Router {
    Router::new()
        .route("/api/version", get(version))
        .route("/api/files/{target}", post(upload_file))
        .route("/apps/auth", get(request_app_session).post(verify_app_session))
        .fallback(not_found)
        .with_state(ctx)
}

async fn version() -> Response {
    Json(json!({ "api": "1.0", "server": VERSION })).into_response()
}

async fn not_found() -> Response {
    (StatusCode::NOT_FOUND, "Not found").into_response()
}

/// Accept a spooled upload: the catch-all rewrote the multipart body into
/// form fields pointing at the temp file.
async fn upload_file(
    State(ctx): State<Arc<AppContext>>,
    UrlPath(target): UrlPath<String>,
    Form(fields): Form<HashMap<String, String>>,
) -> Response {
    let (name_field, path_field) = spooled_field_names(&ctx.config.server.uploads, "file");
    let name = fields.get(&name_field);
    let spool_path = fields.get(&path_field);

    if target != "local" {
        // The interception already spooled the body; do not leak the file.
        if let Some(spool_path) = spool_path {
            let _ = std::fs::remove_file(spool_path);
        }
        return (StatusCode::NOT_FOUND, "Unknown upload target").into_response();
    }

    let (Some(name), Some(spool_path)) = (name, spool_path) else {
        return (StatusCode::BAD_REQUEST, "No file included").into_response();
    };

    let spool = Path::new(spool_path);
    let stored = match ctx.files.store_upload(spool, name) {
        Ok(stored) => stored,
        Err(e) => {
            let _ = std::fs::remove_file(spool);
            tracing::error!(error = %e, "Failed to store upload");
            return (StatusCode::INTERNAL_SERVER_ERROR, "Failed to store upload").into_response();
        }
    };
    let _ = std::fs::remove_file(spool);

    ctx.analysis.enqueue(&stored);
    tracing::info!(name = %name, stored = ?stored, "Upload accepted");

    (
        StatusCode::CREATED,
        Json(json!({ "done": true, "name": name })),
    )
        .into_response()
}

/// Hand out an unverified application session key.
async fn request_app_session(State(ctx): State<Arc<AppContext>>) -> Response {
    let key = ctx.app_sessions.create();
    Json(json!({ "unverified_key": key })).into_response()
}

#[derive(serde::Deserialize)]
struct VerifyForm {
    key: String,
}

/// Verify a previously handed-out application session key.
async fn verify_app_session(
    State(ctx): State<Arc<AppContext>>,
    Form(form): Form<VerifyForm>,
) -> Response {
    if ctx.app_sessions.verify(&form.key) {
        Json(json!({ "verified": true })).into_response()
    } else {
        (StatusCode::NOT_FOUND, "Unknown session key").into_response()
    }
}
