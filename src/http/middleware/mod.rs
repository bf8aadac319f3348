//! Request-time middleware helpers: authorization and CORS post-processing.

pub mod auth;
pub mod cors;
