//! Request-time authorization.
//!
//! Identities are resolved lazily — only when the matched binding's access
//! policy actually needs one — and at most once per request.

use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};

use crate::context::AppContext;
use crate::http::request::extract_credentials;
use crate::identity::Identity;
use crate::routing::AccessPolicy;

/// Resolve the acting identity for a request.
pub fn resolve_identity(app: &AppContext, headers: &HeaderMap) -> Identity {
    let credentials = extract_credentials(app, headers);
    match credentials.token.as_deref() {
        Some(token) => app.identity.resolve(token, &credentials.session),
        None => Identity::Anonymous,
    }
}

/// Check a policy against a resolved identity.
///
/// Authentication absence (anonymous) and authorization failure (known
/// identity, missing role) get distinct rejections; neither leaks detail.
pub fn authorize(policy: AccessPolicy, identity: &Identity) -> Result<(), Response> {
    if policy.allows(identity) {
        return Ok(());
    }
    let response = match identity {
        Identity::Anonymous => (StatusCode::UNAUTHORIZED, "Authentication required"),
        _ => (StatusCode::FORBIDDEN, "Not authorized"),
    };
    Err(response.into_response())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn anonymous_gets_unauthorized() {
        let result = authorize(AccessPolicy::User, &Identity::Anonymous);
        assert_eq!(
            result.unwrap_err().status(),
            StatusCode::UNAUTHORIZED
        );
    }

    #[test]
    fn named_user_without_role_gets_forbidden() {
        let identity = Identity::Named {
            name: "alice".to_string(),
            roles: vec![crate::identity::Role::User],
            session: None,
        };
        assert!(authorize(AccessPolicy::User, &identity).is_ok());
        let result = authorize(AccessPolicy::Admin, &identity);
        assert_eq!(result.unwrap_err().status(), StatusCode::FORBIDDEN);
    }

    #[test]
    fn api_identity_passes_everything() {
        assert!(authorize(AccessPolicy::Admin, &Identity::Api).is_ok());
    }
}
