//! Route matching logic.
//!
//! # Responsibilities
//! - Match request paths against exact, prefix or regex patterns
//! - Capture path groups for handlers (e.g. the requested file name)
//! - Restrict bindings to HTTP methods
//!
//! # Design Decisions
//! - Regex patterns are anchored to the whole path; a partial hit is no hit
//! - Patterns are compiled once at startup, never in the hot path
//! - Empty method set = matches any method

use axum::http::Method;

/// Path pattern of one route binding.
#[derive(Debug, Clone)]
pub enum RoutePattern {
    /// The whole path, byte for byte.
    Exact(String),

    /// Path prefix (case-sensitive).
    Prefix(String),

    /// Anchored regex with capture groups.
    Regex(regex::Regex),

    /// Matches every path. Reserved for the catch-all binding.
    Any,
}

impl RoutePattern {
    /// Compile an anchored regex pattern.
    pub fn regex(pattern: &str) -> Result<Self, regex::Error> {
        let anchored = format!("^{pattern}$");
        Ok(RoutePattern::Regex(regex::Regex::new(&anchored)?))
    }

    /// Match a path, returning captured groups on success.
    ///
    /// Exact/prefix/any patterns capture nothing; regex patterns capture
    /// their groups in order.
    pub fn matches(&self, path: &str) -> Option<Vec<String>> {
        match self {
            RoutePattern::Exact(expected) => (path == expected).then(Vec::new),
            RoutePattern::Prefix(prefix) => path.starts_with(prefix).then(Vec::new),
            RoutePattern::Regex(regex) => regex.captures(path).map(|captures| {
                captures
                    .iter()
                    .skip(1)
                    .filter_map(|g| g.map(|m| m.as_str().to_string()))
                    .collect()
            }),
            RoutePattern::Any => Some(Vec::new()),
        }
    }
}

/// Methods a binding applies to. `Any` matches every method.
#[derive(Debug, Clone)]
pub enum MethodSet {
    Any,
    Only(Vec<Method>),
}

impl MethodSet {
    pub fn get() -> Self {
        MethodSet::Only(vec![Method::GET, Method::HEAD])
    }

    pub fn matches(&self, method: &Method) -> bool {
        match self {
            MethodSet::Any => true,
            MethodSet::Only(methods) => methods.contains(method),
        }
    }
}
