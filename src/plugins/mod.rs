//! Extension system: capability interfaces and the loaded-extension registry.
//!
//! Loading/discovery itself is an external collaborator; the orchestrator
//! receives an already-built [`ExtensionRegistry`].

pub mod capabilities;
pub mod registry;

pub use capabilities::{
    AssetContributor, Extension, ExtensionServices, FragmentConfig, RouteContributor,
    ShutdownHook, StartupHook, TemplateContributor,
};
pub use registry::ExtensionRegistry;
