//! Template engine wrapper.
//!
//! # Responsibilities
//! - Register built-in page templates
//! - Register extension-shipped template folders during startup
//! - Answer template-existence queries for the fragment registry's default
//!   probing
//! - Render the root page
//!
//! # Design Decisions
//! - Existence is an explicit boolean query, never an error probe
//! - Template names keep their file extension so references read like paths
//! - The engine is fully built before serving begins and immutable after

use std::path::Path;

use handlebars::Handlebars;

/// Error type for template operations.
#[derive(Debug, thiserror::Error)]
pub enum TemplateError {
    #[error("template registration failed: {0}")]
    Register(#[from] handlebars::TemplateError),

    #[error("render failed: {0}")]
    Render(#[from] handlebars::RenderError),

    #[error("IO error while scanning template folder: {0}")]
    Io(#[from] std::io::Error),
}

/// Runtime template registry for the composed page.
pub struct TemplateEngine {
    registry: Handlebars<'static>,
}

impl TemplateEngine {
    /// Create an engine with the built-in page templates registered.
    pub fn new() -> Result<Self, TemplateError> {
        let mut registry = Handlebars::new();
        registry.register_template_string("index", include_str!("../../templates/index.hbs"))?;
        Ok(Self { registry })
    }

    /// Register every `.hbs` file under `folder` (recursively) using its
    /// path relative to `folder` as the template name.
    ///
    /// Called once per template-contributing extension during startup.
    pub fn register_folder(&mut self, folder: &Path) -> Result<usize, TemplateError> {
        let mut count = 0;
        self.register_folder_inner(folder, folder, &mut count)?;
        Ok(count)
    }

    fn register_folder_inner(
        &mut self,
        root: &Path,
        dir: &Path,
        count: &mut usize,
    ) -> Result<(), TemplateError> {
        for entry in std::fs::read_dir(dir)? {
            let entry = entry?;
            let path = entry.path();
            if path.is_dir() {
                self.register_folder_inner(root, &path, count)?;
            } else if path.extension().is_some_and(|e| e == "hbs") {
                let name = path
                    .strip_prefix(root)
                    .unwrap_or(&path)
                    .to_string_lossy()
                    .replace('\\', "/");
                self.registry.register_template_file(&name, &path)?;
                *count += 1;
            }
        }
        Ok(())
    }

    /// Register a template from a string. Mostly useful in tests and for
    /// extensions that generate their fragments programmatically.
    pub fn register_string(&mut self, name: &str, source: &str) -> Result<(), TemplateError> {
        self.registry.register_template_string(name, source)?;
        Ok(())
    }

    /// Explicit existence query used by default-fragment probing.
    pub fn has_template(&self, name: &str) -> bool {
        self.registry.has_template(name)
    }

    /// Render the root page with the given context.
    pub fn render_index(&self, context: &serde_json::Value) -> Result<String, TemplateError> {
        Ok(self.registry.render("index", context)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn built_in_index_is_registered() {
        let engine = TemplateEngine::new().unwrap();
        assert!(engine.has_template("index"));
        assert!(!engine.has_template("weather_tab.hbs"));
    }

    #[test]
    fn folder_registration_uses_relative_names() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("weather_tab.hbs"), "<div>tab</div>").unwrap();
        std::fs::create_dir(dir.path().join("partials")).unwrap();
        std::fs::write(dir.path().join("partials/footer.hbs"), "<footer/>").unwrap();
        std::fs::write(dir.path().join("notes.txt"), "ignored").unwrap();

        let mut engine = TemplateEngine::new().unwrap();
        let count = engine.register_folder(dir.path()).unwrap();
        assert_eq!(count, 2);
        assert!(engine.has_template("weather_tab.hbs"));
        assert!(engine.has_template("partials/footer.hbs"));
        assert!(!engine.has_template("notes.txt"));
    }
}
