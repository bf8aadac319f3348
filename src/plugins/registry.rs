//! Extension registry.
//!
//! # Responsibilities
//! - Hold the set of loaded extensions in a stable order
//! - Enumerate implementers of each capability
//! - Run initialization and lifecycle hooks over the set
//!
//! # Design Decisions
//! - Iteration order is insertion order: deterministic across requests,
//!   not guaranteed alphabetical
//! - Immutable after construction (thread-safe without locks)
//! - Hook failures are isolated per extension via catch_unwind

use std::sync::Arc;

use crate::plugins::capabilities::{
    AssetContributor, Extension, ExtensionServices, RouteContributor, ShutdownHook, StartupHook,
    TemplateContributor,
};

/// Ordered, immutable set of loaded extensions.
#[derive(Clone, Default)]
pub struct ExtensionRegistry {
    extensions: Vec<Arc<dyn Extension>>,
}

impl ExtensionRegistry {
    pub fn new(extensions: Vec<Arc<dyn Extension>>) -> Self {
        Self { extensions }
    }

    pub fn empty() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.extensions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.extensions.is_empty()
    }

    /// All extension names, in registry order.
    pub fn names(&self) -> Vec<&str> {
        self.extensions.iter().map(|e| e.name()).collect()
    }

    pub fn get(&self, name: &str) -> Option<&Arc<dyn Extension>> {
        self.extensions.iter().find(|e| e.name() == name)
    }

    /// Initialize every extension with the manager handles.
    pub fn initialize_all(&self, services: &ExtensionServices) {
        for extension in &self.extensions {
            extension.initialize(services);
            tracing::debug!(extension = extension.name(), "Extension initialized");
        }
    }

    /// Extensions implementing the template capability, in registry order.
    pub fn template_contributors(&self) -> impl Iterator<Item = (&dyn Extension, &dyn TemplateContributor)> {
        self.extensions
            .iter()
            .filter_map(|e| e.as_template_contributor().map(|c| (e.as_ref(), c)))
    }

    /// Extensions implementing the asset capability, in registry order.
    pub fn asset_contributors(&self) -> impl Iterator<Item = (&dyn Extension, &dyn AssetContributor)> {
        self.extensions
            .iter()
            .filter_map(|e| e.as_asset_contributor().map(|c| (e.as_ref(), c)))
    }

    /// Extensions implementing the route capability, in registry order.
    pub fn route_contributors(&self) -> impl Iterator<Item = (&dyn Extension, &dyn RouteContributor)> {
        self.extensions
            .iter()
            .filter_map(|e| e.as_route_contributor().map(|c| (e.as_ref(), c)))
    }

    fn startup_hooks(&self) -> impl Iterator<Item = (&dyn Extension, &dyn StartupHook)> {
        self.extensions
            .iter()
            .filter_map(|e| e.as_startup_hook().map(|c| (e.as_ref(), c)))
    }

    fn shutdown_hooks(&self) -> impl Iterator<Item = (&dyn Extension, &dyn ShutdownHook)> {
        self.extensions
            .iter()
            .filter_map(|e| e.as_shutdown_hook().map(|c| (e.as_ref(), c)))
    }

    /// Run every `on_startup` hook. A panicking hook is logged and skipped;
    /// it must not take the server down.
    pub fn run_startup_hooks(&self, host: &str, port: u16) {
        for (extension, hook) in self.startup_hooks() {
            let result = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
                hook.on_startup(host, port)
            }));
            if result.is_err() {
                tracing::error!(extension = extension.name(), "Startup hook panicked");
            }
        }
    }

    /// Run every `on_post_startup` hook. Callers put this on a worker
    /// context; hooks may block.
    pub fn run_post_startup_hooks(&self) {
        for (extension, hook) in self.startup_hooks() {
            let result = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
                hook.on_post_startup()
            }));
            if result.is_err() {
                tracing::error!(extension = extension.name(), "Post-startup hook panicked");
            }
        }
    }

    /// Run every `on_shutdown` hook, in registry order.
    pub fn run_shutdown_hooks(&self) {
        for (extension, hook) in self.shutdown_hooks() {
            let result = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
                hook.on_shutdown()
            }));
            if result.is_err() {
                tracing::error!(extension = extension.name(), "Shutdown hook panicked");
            }
        }
    }
}
