//! Request credential extraction.
//!
//! # Responsibilities
//! - Pull the identity token and session state out of request headers
//! - Recognize the UI API key and verified application session keys
//! - Parse session cookies without trusting any of their content
//!
//! # Design Decisions
//! - Extraction never fails: absent or malformed credentials yield no
//!   token, which downstream resolves to the anonymous identity
//! - The token is opaque here; the identity gate owns its meaning

use axum::http::HeaderMap;

use crate::context::AppContext;
use crate::identity::{SessionState, API_TOKEN};

/// Header carrying an API key.
pub const API_KEY_HEADER: &str = "x-api-key";

/// Cookie naming the logged-in user.
const USER_COOKIE: &str = "printdeck_user";

/// Cookie carrying the session-bound sub-identifier.
const SESSION_COOKIE: &str = "printdeck_session";

/// Credentials extracted from one request.
#[derive(Debug, Clone, Default)]
pub struct RequestCredentials {
    /// Identity token, when the request carries one.
    pub token: Option<String>,

    pub session: SessionState,
}

/// Extract credentials from request headers.
///
/// An `X-Api-Key` header matching the UI API key or a verified application
/// session resolves to the API token; otherwise the session cookies name
/// the user and session.
pub fn extract_credentials(app: &AppContext, headers: &HeaderMap) -> RequestCredentials {
    if let Some(key) = headers.get(API_KEY_HEADER).and_then(|v| v.to_str().ok()) {
        if key == app.ui_api_key || app.app_sessions.is_verified(key) {
            return RequestCredentials {
                token: Some(API_TOKEN.to_string()),
                session: SessionState::default(),
            };
        }
    }

    let token = cookie_value(headers, USER_COOKIE);
    let session = SessionState {
        user_session_id: cookie_value(headers, SESSION_COOKIE),
    };

    RequestCredentials { token, session }
}

fn cookie_value(headers: &HeaderMap, name: &str) -> Option<String> {
    let cookies = headers.get(axum::http::header::COOKIE)?.to_str().ok()?;
    cookies.split(';').find_map(|pair| {
        let (key, value) = pair.trim().split_once('=')?;
        (key == name && !value.is_empty()).then(|| value.to_string())
    })
}
