//! Startup orchestration.
//!
//! # Responsibilities
//! - Sequence subsystem initialization in dependency order
//! - Defer post-listen work to a worker so it cannot block the serving loop
//! - Perform ordered, idempotent shutdown
//!
//! # Design Decisions
//! - Optional subsystems failing to construct degrade the server, they do
//!   not kill it; core failures (config, routes, bind) are fatal
//! - Every manager reference is written into one context before the
//!   listener binds and treated as read-only afterwards
//! - Running as root is refused unless explicitly overridden

use std::path::PathBuf;
use std::sync::Arc;

use rand::distributions::Alphanumeric;
use rand::Rng;
use tokio::net::TcpListener;

use crate::config::{self, ConfigError, ServerConfig};
use crate::context::{AppContext, VERSION};
use crate::http::HttpServer;
use crate::identity::{build_user_manager, IdentityGate};
use crate::lifecycle::shutdown::Shutdown;
use crate::lifecycle::signals::spawn_signal_listener;
use crate::lifecycle::state::{LifecycleState, LifecycleTracker, TransitionError};
use crate::managers::local::{
    CountingAnalysisQueue, DefaultProfileStore, LocalFileStore, LocalSlicingService,
    SerialDeviceFacade,
};
use crate::managers::{AppSessionTracker, Event, EventBus};
use crate::observability::metrics::init_metrics;
use crate::plugins::{ExtensionRegistry, ExtensionServices};
use crate::routing::table::RouteTableError;
use crate::routing::RouteTable;
use crate::ui::templates::TemplateError;
use crate::ui::{LocaleSet, TemplateEngine};
use crate::watch::JobWatcher;

/// Error type for server startup and shutdown.
#[derive(Debug, thiserror::Error)]
pub enum ServerError {
    #[error("refusing to run with root privileges (use --allow-root to override)")]
    RootNotAllowed,

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Routes(#[from] RouteTableError),

    #[error(transparent)]
    Templates(#[from] TemplateError),

    #[error(transparent)]
    Lifecycle(#[from] TransitionError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// The lifecycle orchestrator: builds every subsystem, serves, shuts down.
pub struct Server {
    config_path: Option<PathBuf>,
    config: Option<ServerConfig>,
    host: Option<String>,
    port: Option<u16>,
    debug: bool,
    allow_root: bool,
    extensions: ExtensionRegistry,
}

impl Server {
    pub fn new(extensions: ExtensionRegistry) -> Self {
        Self {
            config_path: None,
            config: None,
            host: None,
            port: None,
            debug: false,
            allow_root: false,
            extensions,
        }
    }

    pub fn with_config_path(mut self, path: Option<PathBuf>) -> Self {
        self.config_path = path;
        self
    }

    /// Use an already-built configuration instead of loading one from disk.
    /// Embedding callers (and tests) construct their config directly.
    pub fn with_config(mut self, config: ServerConfig) -> Self {
        self.config = Some(config);
        self
    }

    pub fn with_host(mut self, host: Option<String>) -> Self {
        self.host = host;
        self
    }

    pub fn with_port(mut self, port: Option<u16>) -> Self {
        self.port = port;
        self
    }

    pub fn with_debug(mut self, debug: bool) -> Self {
        self.debug = debug;
        self
    }

    pub fn with_allow_root(mut self, allow_root: bool) -> Self {
        self.allow_root = allow_root;
        self
    }

    /// Run the server to completion.
    pub async fn run(self) -> Result<(), ServerError> {
        if !self.allow_root {
            check_not_root()?;
        }

        let states = LifecycleTracker::new();
        states.advance(LifecycleState::Initializing)?;

        // Settings first; everything else depends on them.
        let mut config = match self.config.clone() {
            Some(config) => config,
            None => config::load_or_default(self.config_path.as_deref())?,
        };

        crate::observability::logging::init_logging(
            &config.observability.log_level,
            self.debug,
        );
        tracing::info!(version = VERSION, "Starting printdeck");

        self.ensure_secret_key(&mut config);
        let ui_api_key = uuid::Uuid::new_v4().simple().to_string().to_uppercase();

        if config.observability.metrics_enabled {
            match config.observability.metrics_address.parse() {
                Ok(addr) => init_metrics(addr),
                Err(_) => tracing::error!(
                    metrics_address = %config.observability.metrics_address,
                    "Failed to parse metrics address"
                ),
            }
        }

        create_folders(&config)?;

        // Managers, in dependency order.
        let events = EventBus::new();
        let device = Arc::new(SerialDeviceFacade::new(events.clone()));
        let files = Arc::new(LocalFileStore::new(config.folders.uploads.clone()));
        let analysis = Arc::new(CountingAnalysisQueue::default());
        let slicing = Arc::new(LocalSlicingService::new(
            config.folders.slicing_profiles.clone(),
        ));
        let profiles = Arc::new(DefaultProfileStore);
        let app_sessions = AppSessionTracker::new();

        // Extensions get their manager handles before anything queries them.
        let services = ExtensionServices {
            device: device.clone(),
            files: files.clone(),
            analysis: analysis.clone(),
            slicing: slicing.clone(),
            profiles: profiles.clone(),
            events: events.clone(),
            app_sessions: app_sessions.clone(),
        };
        self.extensions.initialize_all(&services);

        // Template sources: built-ins plus extension-provided folders.
        let mut templates = TemplateEngine::new()?;
        for (extension, contributor) in self.extensions.template_contributors() {
            let Some(folder) = contributor.template_folder() else {
                continue;
            };
            match templates.register_folder(&folder) {
                Ok(count) => tracing::debug!(
                    extension = extension.name(),
                    count,
                    "Registered extension templates"
                ),
                Err(e) => tracing::warn!(
                    extension = extension.name(),
                    error = %e,
                    "Skipping unreadable template folder"
                ),
            }
        }

        let table = Arc::new(RouteTable::build(&config, &self.extensions)?);

        // Identity infrastructure. Construction failure of the configured
        // manager disables access control; it never aborts startup.
        let identity = IdentityGate::new(build_user_manager(&config.access_control));

        let locales = LocaleSet::from_config(&config.locale);

        let host = self
            .host
            .clone()
            .unwrap_or_else(|| config.server.host.clone());
        let port = self.port.unwrap_or(config.server.port);

        let ctx = Arc::new(AppContext {
            config,
            extensions: self.extensions.clone(),
            templates,
            identity,
            device: device.clone(),
            files: files.clone(),
            analysis: analysis.clone(),
            slicing,
            profiles: profiles.clone(),
            events: events.clone(),
            app_sessions,
            locales,
            ui_api_key,
            debug: self.debug,
        });

        autoconnect_device(&ctx);

        let watcher = match JobWatcher::start(
            &ctx.config.folders.watched,
            files,
            analysis,
            device,
        ) {
            Ok(watcher) => Some(watcher),
            Err(e) => {
                tracing::error!(error = %e, "Job watcher failed to start, continuing without it");
                None
            }
        };

        let listener = TcpListener::bind((host.as_str(), port)).await?;
        let bound = listener.local_addr()?;

        self.extensions.run_startup_hooks(&host, port);
        events.publish(Event::Startup);

        states.advance(LifecycleState::Serving)?;

        // Post-startup hooks may block; they run on a worker with their own
        // failure boundary so the serving loop never waits on them.
        let post_startup_extensions = self.extensions.clone();
        tokio::spawn(async move {
            tracing::info!("Listening on http://{bound}");
            let result = tokio::task::spawn_blocking(move || {
                post_startup_extensions.run_post_startup_hooks();
            })
            .await;
            if let Err(e) = result {
                tracing::error!(error = %e, "Post-startup worker failed");
            }
        });

        let shutdown = Arc::new(Shutdown::new());
        spawn_signal_listener(shutdown.clone());

        let server = HttpServer::new(ctx.clone(), table);
        if let Err(e) = server.run(listener, shutdown.subscribe()).await {
            tracing::error!(error = %e, "HTTP server failed");
        }

        states.advance(LifecycleState::ShuttingDown)?;
        tracing::info!("Goodbye!");

        // Ordered shutdown: watcher first, then extension hooks.
        if let Some(watcher) = watcher {
            watcher.stop();
        }
        self.extensions.run_shutdown_hooks();
        events.publish(Event::Shutdown);

        states.advance(LifecycleState::Stopped)?;
        Ok(())
    }

    /// Make sure a session secret exists, generating and persisting one on
    /// first start.
    fn ensure_secret_key(&self, config: &mut ServerConfig) {
        if !config.server.secret_key.is_empty() {
            return;
        }
        let secret: String = rand::thread_rng()
            .sample_iter(&Alphanumeric)
            .take(32)
            .map(char::from)
            .collect();
        config.server.secret_key = secret.clone();

        if let Some(path) = self.config_path.as_deref().filter(|p| p.exists()) {
            if let Err(e) = config::persist_secret_key(path, &secret) {
                tracing::warn!(error = %e, "Could not persist generated secret key");
            }
        }
    }
}

fn create_folders(config: &ServerConfig) -> Result<(), std::io::Error> {
    let folders = &config.folders;
    for folder in [
        &folders.uploads,
        &folders.timelapse,
        &folders.logs,
        &folders.watched,
        &folders.slicing_profiles,
    ] {
        std::fs::create_dir_all(folder)?;
    }
    Ok(())
}

/// Connect to the configured device, best-effort. A configured port that is
/// not currently enumerated is silently skipped.
fn autoconnect_device(ctx: &AppContext) {
    let serial = &ctx.config.serial;
    if !serial.autoconnect {
        return;
    }
    let Some(port) = serial.port.as_deref() else {
        return;
    };

    let available = ctx.device.available_ports();
    if !available.iter().any(|p| p == port) {
        tracing::debug!(
            port,
            available = ?available,
            "Configured port not enumerated, skipping auto-connect"
        );
        return;
    }

    let profile = ctx.profiles.default_profile_id();
    if let Err(e) = ctx.device.connect(port, serial.baudrate, &profile) {
        tracing::error!(error = %e, port, "Device auto-connect failed");
    }
}

/// Refuse to run with effective uid 0.
#[cfg(unix)]
fn check_not_root() -> Result<(), ServerError> {
    let status = match std::fs::read_to_string("/proc/self/status") {
        Ok(status) => status,
        // No procfs (e.g. macOS): nothing to check against.
        Err(_) => return Ok(()),
    };
    let euid = status
        .lines()
        .find(|line| line.starts_with("Uid:"))
        .and_then(|line| line.split_whitespace().nth(2))
        .and_then(|v| v.parse::<u32>().ok());
    if euid == Some(0) {
        return Err(ServerError::RootNotAllowed);
    }
    Ok(())
}

#[cfg(not(unix))]
fn check_not_root() -> Result<(), ServerError> {
    Ok(())
}
