//! Application context.
//!
//! One struct holds every manager reference and core service the request
//! path needs. It is constructed exactly once during startup, before the
//! listener binds, and shared read-only via `Arc` afterwards — request
//! handlers never reach for ambient or global state.

use std::sync::Arc;

use crate::config::ServerConfig;
use crate::identity::IdentityGate;
use crate::managers::{
    AnalysisQueue, AppSessionTracker, DeviceFacade, EventBus, FileStore, ProfileStore,
    SlicingService,
};
use crate::plugins::ExtensionRegistry;
use crate::ui::locale::LocaleSet;
use crate::ui::templates::TemplateEngine;

/// Crate version surfaced in the UI and the version endpoint.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Immutable application context shared across all request handling.
pub struct AppContext {
    pub config: ServerConfig,
    pub extensions: ExtensionRegistry,
    pub templates: TemplateEngine,
    pub identity: IdentityGate,
    pub device: Arc<dyn DeviceFacade>,
    pub files: Arc<dyn FileStore>,
    pub analysis: Arc<dyn AnalysisQueue>,
    pub slicing: Arc<dyn SlicingService>,
    pub profiles: Arc<dyn ProfileStore>,
    pub events: EventBus,
    pub app_sessions: AppSessionTracker,
    pub locales: LocaleSet,

    /// Per-process key the bundled UI uses for its own API calls.
    pub ui_api_key: String,

    pub debug: bool,
}
