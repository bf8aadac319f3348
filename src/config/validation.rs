//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Validate value ranges (body limits > 0, locale set non-empty)
//! - Check upload targets reference sane methods and paths
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: ServerConfig → Result<(), Vec<ValidationError>>
//! - Runs before config is accepted into the system

use crate::config::schema::ServerConfig;

/// A single semantic problem found in a configuration.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    #[error("server.max_body_size must be greater than zero")]
    ZeroBodyLimit,

    #[error("server.uploads.max_size must be greater than zero")]
    ZeroUploadLimit,

    #[error("upload target {0:?} has an empty path prefix")]
    EmptyUploadPrefix(String),

    #[error("upload target {0:?} uses unsupported method {1:?}")]
    BadUploadMethod(String, String),

    #[error("locale.available must contain at least the default locale")]
    EmptyLocaleSet,

    #[error("duplicate user {0:?} in access_control.users")]
    DuplicateUser(String),

    #[error("config root is not a table")]
    NotATable,
}

/// Validate a parsed configuration, collecting every problem found.
pub fn validate_config(config: &ServerConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.server.max_body_size == 0 {
        errors.push(ValidationError::ZeroBodyLimit);
    }
    if config.server.uploads.max_size == 0 {
        errors.push(ValidationError::ZeroUploadLimit);
    }

    for target in &config.server.uploads.targets {
        if target.path_prefix.is_empty() {
            errors.push(ValidationError::EmptyUploadPrefix(target.method.clone()));
        }
        match target.method.to_ascii_uppercase().as_str() {
            "POST" | "PUT" | "PATCH" => {}
            other => errors.push(ValidationError::BadUploadMethod(
                target.path_prefix.clone(),
                other.to_string(),
            )),
        }
    }

    if config.locale.available.is_empty() {
        errors.push(ValidationError::EmptyLocaleSet);
    }

    let mut seen = std::collections::HashSet::new();
    for user in &config.access_control.users {
        if !seen.insert(user.name.as_str()) {
            errors.push(ValidationError::DuplicateUser(user.name.clone()));
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::schema::{UploadTarget, UserEntry};

    #[test]
    fn default_config_is_valid() {
        assert!(validate_config(&ServerConfig::default()).is_ok());
    }

    #[test]
    fn collects_all_errors() {
        let mut config = ServerConfig::default();
        config.server.max_body_size = 0;
        config.locale.available.clear();
        config.server.uploads.targets.push(UploadTarget {
            method: "GET".to_string(),
            path_prefix: String::new(),
            max_body_size: None,
        });

        let errors = validate_config(&config).unwrap_err();
        assert!(errors.len() >= 3);
    }

    #[test]
    fn duplicate_users_rejected() {
        let mut config = ServerConfig::default();
        for _ in 0..2 {
            config.access_control.users.push(UserEntry {
                name: "alice".to_string(),
                admin: false,
                active: None,
            });
        }
        let errors = validate_config(&config).unwrap_err();
        assert_eq!(
            errors,
            vec![ValidationError::DuplicateUser("alice".to_string())]
        );
    }
}
