//! Shared helpers for unit tests.

use std::sync::Arc;

use crate::config::ServerConfig;
use crate::context::AppContext;
use crate::identity::IdentityGate;
use crate::managers::local::{
    CountingAnalysisQueue, DefaultProfileStore, LocalFileStore, LocalSlicingService,
    SerialDeviceFacade,
};
use crate::managers::{AppSessionTracker, EventBus};
use crate::plugins::{
    Extension, ExtensionRegistry, FragmentConfig, TemplateContributor,
};
use crate::ui::{LocaleSet, TemplateEngine};

/// Template-contributing extension with canned declarations.
struct FragmentExtension {
    name: String,
    configs: Vec<FragmentConfig>,
    vars: serde_json::Value,
}

impl Extension for FragmentExtension {
    fn name(&self) -> &str {
        &self.name
    }

    fn as_template_contributor(&self) -> Option<&dyn TemplateContributor> {
        Some(self)
    }
}

impl TemplateContributor for FragmentExtension {
    fn template_configs(&self) -> Vec<FragmentConfig> {
        self.configs.clone()
    }

    fn template_vars(&self) -> serde_json::Value {
        self.vars.clone()
    }
}

/// Builder assembling an [`AppContext`] for tests.
pub struct TestContextBuilder {
    pub config: ServerConfig,
    pub extensions: Vec<Arc<dyn Extension>>,
    pub templates: TemplateEngine,
    pub user_manager: Option<Arc<dyn crate::identity::UserManager>>,
}

impl TestContextBuilder {
    fn new() -> Self {
        Self {
            config: ServerConfig::default(),
            extensions: Vec::new(),
            templates: TemplateEngine::new().expect("built-in templates register"),
            user_manager: None,
        }
    }

    pub fn with_extension(&mut self, extension: Arc<dyn Extension>) {
        self.extensions.push(extension);
    }

    pub fn with_navbar_extension(&mut self, name: &str) {
        self.with_fragment_extension(name, vec![FragmentConfig::new("navbar")]);
    }

    pub fn with_sidebar_extension(&mut self, name: &str) {
        self.with_fragment_extension(name, vec![FragmentConfig::new("sidebar")]);
    }

    pub fn with_settings_extension(&mut self, name: &str, label: &str) {
        self.with_fragment_extension(name, vec![FragmentConfig::new("settings").with_name(label)]);
    }

    pub fn with_vars_extension(&mut self, name: &str, vars: serde_json::Value) {
        self.extensions.push(Arc::new(FragmentExtension {
            name: name.to_string(),
            configs: Vec::new(),
            vars,
        }));
    }

    fn with_fragment_extension(&mut self, name: &str, configs: Vec<FragmentConfig>) {
        self.extensions.push(Arc::new(FragmentExtension {
            name: name.to_string(),
            configs,
            vars: serde_json::Value::Null,
        }));
    }
}

/// Build an [`AppContext`] after letting `configure` adjust the builder.
pub fn test_context(configure: impl FnOnce(&mut TestContextBuilder)) -> AppContext {
    let mut builder = TestContextBuilder::new();
    configure(&mut builder);

    let events = EventBus::new();
    let locales = LocaleSet::from_config(&builder.config.locale);
    AppContext {
        extensions: ExtensionRegistry::new(builder.extensions),
        templates: builder.templates,
        identity: IdentityGate::new(builder.user_manager),
        device: Arc::new(SerialDeviceFacade::new(events.clone())),
        files: Arc::new(LocalFileStore::new(builder.config.folders.uploads.clone())),
        analysis: Arc::new(CountingAnalysisQueue::default()),
        slicing: Arc::new(LocalSlicingService::new(
            builder.config.folders.slicing_profiles.clone(),
        )),
        profiles: Arc::new(DefaultProfileStore),
        events,
        app_sessions: AppSessionTracker::new(),
        locales,
        ui_api_key: "0123456789ABCDEF0123456789ABCDEF".to_string(),
        debug: false,
        config: builder.config,
    }
}
