//! Extension capability interfaces.
//!
//! Extensions contribute behavior through a fixed set of capability traits.
//! An extension implements the subset relevant to it and advertises each
//! implemented capability through the `as_*` accessors on [`Extension`];
//! the registry enumerates implementers of a capability rather than
//! inspecting concrete types.

use std::path::PathBuf;
use std::sync::Arc;

use crate::managers::{
    AnalysisQueue, AppSessionTracker, DeviceFacade, EventBus, FileStore, ProfileStore,
    SlicingService,
};

/// Manager handles passed to each extension during initialization.
///
/// Mirrors what the server core itself holds; extensions keep the clones
/// they need.
#[derive(Clone)]
pub struct ExtensionServices {
    pub device: Arc<dyn DeviceFacade>,
    pub files: Arc<dyn FileStore>,
    pub analysis: Arc<dyn AnalysisQueue>,
    pub slicing: Arc<dyn SlicingService>,
    pub profiles: Arc<dyn ProfileStore>,
    pub events: EventBus,
    pub app_sessions: AppSessionTracker,
}

/// Base interface every extension implements.
pub trait Extension: Send + Sync {
    /// Stable identifier; also the namespace for routes, assets and
    /// template variables.
    fn name(&self) -> &str;

    /// Human-readable name shown in the UI. Defaults to [`Extension::name`].
    fn display_name(&self) -> &str {
        self.name()
    }

    /// Called once during startup, after all managers exist.
    fn initialize(&self, _services: &ExtensionServices) {}

    fn as_template_contributor(&self) -> Option<&dyn TemplateContributor> {
        None
    }

    fn as_asset_contributor(&self) -> Option<&dyn AssetContributor> {
        None
    }

    fn as_route_contributor(&self) -> Option<&dyn RouteContributor> {
        None
    }

    fn as_startup_hook(&self) -> Option<&dyn StartupHook> {
        None
    }

    fn as_shutdown_hook(&self) -> Option<&dyn ShutdownHook> {
        None
    }
}

/// Contributes UI fragments and template variables.
pub trait TemplateContributor {
    /// Fragment declarations for this extension.
    ///
    /// Malformed entries degrade to omission during normalization, never to
    /// a render failure.
    fn template_configs(&self) -> Vec<FragmentConfig> {
        Vec::new()
    }

    /// Variables exposed to the page as `plugin_<name>_<var>`.
    ///
    /// Anything but a JSON object is treated as empty.
    fn template_vars(&self) -> serde_json::Value {
        serde_json::Value::Null
    }

    /// Folder with extension-shipped templates, registered with the
    /// template engine during startup.
    fn template_folder(&self) -> Option<PathBuf> {
        None
    }
}

/// A raw fragment declaration as emitted by an extension.
///
/// `kind` names the target zone as a string on purpose: an unrecognized or
/// missing kind is a silent no-op, not a type error.
#[derive(Debug, Clone, Default)]
pub struct FragmentConfig {
    /// Target zone ("navbar", "sidebar", "tab", "settings", "generic").
    pub kind: Option<String>,

    /// Display name; defaults to the extension's display name.
    pub name: Option<String>,

    /// Template reference; defaults to the zone rule's derived name.
    pub template: Option<String>,

    /// Explicit div-id suffix. Without one, a per-zone counter
    /// disambiguates repeated fragments.
    pub suffix: Option<String>,

    /// Extension-declared binding clause, merged behind the baseline clause.
    pub data_bind: Option<String>,

    /// When false the synthesized binding expression is skipped entirely.
    pub custom_bindings: Option<bool>,

    /// Extra styles applied to the wrapper element.
    pub styles: Vec<String>,

    /// Extra classes applied to the wrapper element.
    pub classes: Vec<String>,
}

impl FragmentConfig {
    pub fn new(kind: &str) -> Self {
        Self {
            kind: Some(kind.to_string()),
            ..Default::default()
        }
    }

    pub fn with_name(mut self, name: &str) -> Self {
        self.name = Some(name.to_string());
        self
    }

    pub fn with_template(mut self, template: &str) -> Self {
        self.template = Some(template.to_string());
        self
    }

    pub fn with_suffix(mut self, suffix: &str) -> Self {
        self.suffix = Some(suffix.to_string());
        self
    }

    pub fn with_data_bind(mut self, data_bind: &str) -> Self {
        self.data_bind = Some(data_bind.to_string());
        self
    }

    pub fn without_custom_bindings(mut self) -> Self {
        self.custom_bindings = Some(false);
        self
    }
}

/// Contributes static assets served under `/plugin_assets/<name>/`.
pub trait AssetContributor {
    /// Folder the assets live in; `None` means nothing to serve.
    fn asset_folder(&self) -> Option<PathBuf>;

    /// Asset manifest (e.g. js/css lists) included in the render context.
    fn assets(&self) -> serde_json::Value {
        serde_json::json!({})
    }
}

/// Contributes HTTP routes mounted under `/plugin/<name>/`.
pub trait RouteContributor {
    /// Router with the extension's handlers; `None` contributes nothing.
    fn routes(&self) -> Option<axum::Router>;

    /// Protected routes get an identity check before and CORS headers
    /// after every request.
    fn is_protected(&self) -> bool {
        true
    }
}

/// Invoked around server startup.
pub trait StartupHook {
    /// Runs on the serving context just before the listener binds.
    fn on_startup(&self, _host: &str, _port: u16) {}

    /// Runs on a dedicated worker after the listener is up. May block.
    fn on_post_startup(&self) {}
}

/// Invoked during ordered shutdown.
pub trait ShutdownHook {
    fn on_shutdown(&self);
}
