//! Configuration loading from disk.

use std::fs;
use std::path::Path;

use crate::config::schema::ServerConfig;
use crate::config::validation::{validate_config, ValidationError};

/// Error type for configuration loading.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Parse error: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation failed: {}", format_errors(.0))]
    Validation(Vec<ValidationError>),
}

fn format_errors(errors: &[ValidationError]) -> String {
    errors
        .iter()
        .map(|e| e.to_string())
        .collect::<Vec<_>>()
        .join(", ")
}

/// Load and validate configuration from a TOML file.
pub fn load_config(path: &Path) -> Result<ServerConfig, ConfigError> {
    let content = fs::read_to_string(path)?;
    let config: ServerConfig = toml::from_str(&content)?;

    validate_config(&config).map_err(ConfigError::Validation)?;

    Ok(config)
}

/// Load configuration, falling back to defaults when no file is given or the
/// file does not exist yet.
pub fn load_or_default(path: Option<&Path>) -> Result<ServerConfig, ConfigError> {
    match path {
        Some(p) if p.exists() => load_config(p),
        Some(p) => {
            tracing::info!(path = ?p, "Config file not found, using defaults");
            Ok(ServerConfig::default())
        }
        None => Ok(ServerConfig::default()),
    }
}

/// Persist a single generated value back into the config file.
///
/// Used for the session secret: when the loaded config carried no secret, the
/// generated one is written back so sessions survive restarts. A missing
/// config file means nothing to persist to, which is fine.
pub fn persist_secret_key(path: &Path, secret_key: &str) -> Result<(), ConfigError> {
    let content = fs::read_to_string(path)?;
    let mut value: toml::Value = toml::from_str(&content)?;

    let table = value
        .as_table_mut()
        .ok_or_else(|| ConfigError::Validation(vec![ValidationError::NotATable]))?;
    let server = table
        .entry("server".to_string())
        .or_insert_with(|| toml::Value::Table(Default::default()));
    if let Some(server) = server.as_table_mut() {
        server.insert(
            "secret_key".to_string(),
            toml::Value::String(secret_key.to_string()),
        );
    }

    let serialized =
        toml::to_string_pretty(&value).map_err(|e| ConfigError::Io(std::io::Error::other(e)))?;
    fs::write(path, serialized)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_file_falls_back_to_defaults() {
        let config = load_or_default(Some(Path::new("/nonexistent/printdeck.toml"))).unwrap();
        assert_eq!(config.server.port, 5000);
    }

    #[test]
    fn partial_config_fills_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("printdeck.toml");
        std::fs::write(&path, "[server]\nport = 8080\n").unwrap();

        let config = load_config(&path).unwrap();
        assert_eq!(config.server.port, 8080);
        assert_eq!(config.locale.default, "en");
    }

    #[test]
    fn secret_key_round_trips() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("printdeck.toml");
        std::fs::write(&path, "[server]\nport = 8080\n").unwrap();

        persist_secret_key(&path, "abc123").unwrap();
        let config = load_config(&path).unwrap();
        assert_eq!(config.server.secret_key, "abc123");
        assert_eq!(config.server.port, 8080);
    }
}
