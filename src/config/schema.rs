//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the control
//! panel server. All types derive Serde traits for deserialization from
//! config files.

use std::collections::HashMap;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Root configuration for the control panel server.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct ServerConfig {
    /// HTTP listener and request-size settings.
    pub server: HttpConfig,

    /// Data folders (uploads, capture archives, logs, watched drop folder).
    pub folders: FolderConfig,

    /// Camera integration (stream URL, snapshot URL, encoder binary).
    pub webcam: WebcamConfig,

    /// Optional UI features.
    pub feature: FeatureConfig,

    /// Job-code viewer settings.
    pub gcode_viewer: GcodeViewerConfig,

    /// System menu actions shown to administrators.
    pub system: SystemConfig,

    /// Access control (user manager selection, declared users).
    pub access_control: AccessControlConfig,

    /// Serial device connection settings.
    pub serial: SerialConfig,

    /// UI appearance tweaks.
    pub appearance: AppearanceConfig,

    /// Locale negotiation settings.
    pub locale: LocaleConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,
}

/// HTTP listener configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct HttpConfig {
    /// Bind host (e.g., "0.0.0.0").
    pub host: String,

    /// Bind port.
    pub port: u16,

    /// Session signing secret. Generated and persisted on first start when
    /// empty.
    pub secret_key: String,

    /// Whether this instance has never been configured by a user.
    pub first_run: bool,

    /// Default maximum request body size in bytes.
    pub max_body_size: usize,

    /// Upload interception settings for the catch-all route.
    pub uploads: UploadConfig,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 5000,
            secret_key: String::new(),
            first_run: true,
            max_body_size: 100 * 1024 * 1024,
            uploads: UploadConfig::default(),
        }
    }
}

/// Upload interception configuration for the catch-all route.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct UploadConfig {
    /// Prefix for spooled temporary files.
    pub file_prefix: String,

    /// Suffix for spooled temporary files.
    pub file_suffix: String,

    /// Suffix appended to the form-field names that carry the spooled
    /// file's metadata downstream, keyed by kind ("name", "path").
    pub suffixes: HashMap<String, String>,

    /// Maximum body size for intercepted upload targets, in bytes.
    pub max_size: usize,

    /// Request paths whose multipart bodies are spooled to disk.
    pub targets: Vec<UploadTarget>,
}

impl Default for UploadConfig {
    fn default() -> Self {
        let mut suffixes = HashMap::new();
        suffixes.insert("name".to_string(), "name".to_string());
        suffixes.insert("path".to_string(), "path".to_string());
        Self {
            file_prefix: "printdeck-file-upload-".to_string(),
            file_suffix: ".tmp".to_string(),
            suffixes,
            max_size: 1024 * 1024 * 1024,
            targets: vec![UploadTarget {
                method: "POST".to_string(),
                path_prefix: "/api/files/".to_string(),
                max_body_size: None,
            }],
        }
    }
}

/// One path treated as an upload endpoint by the catch-all route.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct UploadTarget {
    /// HTTP method the interception applies to.
    pub method: String,

    /// Path prefix identifying the endpoint.
    pub path_prefix: String,

    /// Per-target body size limit overriding [`UploadConfig::max_size`].
    #[serde(default)]
    pub max_body_size: Option<usize>,
}

/// Data folder configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct FolderConfig {
    pub uploads: PathBuf,
    pub timelapse: PathBuf,
    pub logs: PathBuf,
    /// Drop folder scanned for new job files.
    pub watched: PathBuf,
    pub slicing_profiles: PathBuf,
}

impl Default for FolderConfig {
    fn default() -> Self {
        Self {
            uploads: PathBuf::from("data/uploads"),
            timelapse: PathBuf::from("data/timelapse"),
            logs: PathBuf::from("data/logs"),
            watched: PathBuf::from("data/watched"),
            slicing_profiles: PathBuf::from("data/slicing_profiles"),
        }
    }
}

/// Camera integration configuration.
///
/// All fields are optional; absent values disable the dependent UI features
/// rather than erroring.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct WebcamConfig {
    /// Stream URL template. May reference `{access_address}` which is
    /// substituted with the host the client used to reach the server.
    pub stream: Option<String>,

    /// Snapshot URL the camera endpoint proxies from.
    pub snapshot: Option<String>,

    /// Path to the encoder binary used for capture rendering.
    pub ffmpeg: Option<String>,
}

/// Optional feature toggles.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct FeatureConfig {
    pub temperature_graph: bool,
    pub sd_support: bool,
}

impl Default for FeatureConfig {
    fn default() -> Self {
        Self {
            temperature_graph: true,
            sd_support: true,
        }
    }
}

/// Job-code viewer configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct GcodeViewerConfig {
    pub enabled: bool,

    /// File size in bytes above which the viewer refuses to load a file.
    pub size_threshold: u64,

    /// Stricter threshold applied to mobile clients.
    pub mobile_size_threshold: u64,
}

impl Default for GcodeViewerConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            size_threshold: 20 * 1024 * 1024,
            mobile_size_threshold: 2 * 1024 * 1024,
        }
    }
}

/// System menu configuration.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct SystemConfig {
    /// Shell actions offered in the admin system menu.
    pub actions: Vec<SystemAction>,
}

/// One entry of the admin system menu.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct SystemAction {
    pub name: String,
    pub action: String,
    pub command: String,
    #[serde(default)]
    pub confirm: Option<String>,
}

/// Access control configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct AccessControlConfig {
    /// Master switch. Disabled means every request is anonymous.
    pub enabled: bool,

    /// Key into the user-manager registry. Unknown keys disable access
    /// control with a logged warning.
    pub user_manager: String,

    /// Users known to the built-in config-backed manager.
    pub users: Vec<UserEntry>,
}

impl Default for AccessControlConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            user_manager: "config".to_string(),
            users: Vec::new(),
        }
    }
}

/// A user declared in the configuration file.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct UserEntry {
    pub name: String,
    #[serde(default)]
    pub admin: bool,
    #[serde(default)]
    pub active: Option<bool>,
}

/// Serial device configuration.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct SerialConfig {
    /// Connect to the configured port during startup.
    pub autoconnect: bool,

    /// Serial port to connect to.
    pub port: Option<String>,

    /// Baud rate for the connection.
    pub baudrate: Option<u32>,

    /// Enable verbose device-traffic logging.
    pub log: bool,
}

/// UI appearance configuration.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct AppearanceConfig {
    /// Alternative stylesheet name injected into the page.
    pub stylesheet: Option<String>,
}

/// Locale negotiation configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct LocaleConfig {
    /// Default locale used when negotiation yields nothing.
    pub default: String,

    /// Locales with available translation catalogs.
    pub available: Vec<String>,
}

impl Default for LocaleConfig {
    fn default() -> Self {
        Self {
            default: "en".to_string(),
            available: vec!["en".to_string()],
        }
    }
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,

    /// Enable the Prometheus metrics endpoint.
    pub metrics_enabled: bool,

    /// Metrics endpoint bind address.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            metrics_enabled: false,
            metrics_address: "127.0.0.1:9090".to_string(),
        }
    }
}
