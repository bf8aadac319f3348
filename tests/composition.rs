//! End-to-end tests for page composition and locale negotiation.

use std::path::PathBuf;
use std::sync::Arc;

use printdeck::plugins::{
    Extension, ExtensionRegistry, FragmentConfig, TemplateContributor,
};

mod common;

/// Extension declaring a single tab fragment with no explicit name or
/// template, backed by a shipped template folder.
struct WeatherExtension {
    template_folder: PathBuf,
}

impl Extension for WeatherExtension {
    fn name(&self) -> &str {
        "weather"
    }

    fn as_template_contributor(&self) -> Option<&dyn TemplateContributor> {
        Some(self)
    }
}

impl TemplateContributor for WeatherExtension {
    fn template_configs(&self) -> Vec<FragmentConfig> {
        vec![FragmentConfig::new("tab")]
    }

    fn template_folder(&self) -> Option<PathBuf> {
        Some(self.template_folder.clone())
    }
}

struct SidebarExtension {
    name: &'static str,
}

impl Extension for SidebarExtension {
    fn name(&self) -> &str {
        self.name
    }

    fn as_template_contributor(&self) -> Option<&dyn TemplateContributor> {
        Some(self)
    }
}

impl TemplateContributor for SidebarExtension {
    fn template_configs(&self) -> Vec<FragmentConfig> {
        vec![FragmentConfig::new("sidebar").with_name("Monitor")]
    }
}

#[tokio::test]
async fn weather_tab_fragment_lands_in_the_page() {
    let dir = tempfile::tempdir().unwrap();
    let templates = dir.path().join("weather_templates");
    std::fs::create_dir_all(&templates).unwrap();
    std::fs::write(templates.join("weather_tab.hbs"), "<div>weather</div>").unwrap();

    let config = common::test_config(dir.path(), 28511);
    let extensions = ExtensionRegistry::new(vec![Arc::new(WeatherExtension {
        template_folder: templates,
    })]);
    let addr = common::spawn_server(config, extensions).await;

    let body = common::client()
        .get(format!("http://{addr}/"))
        .send()
        .await
        .expect("server reachable")
        .text()
        .await
        .unwrap();

    assert!(body.contains("tab_plugin_weather"));
    assert!(body.contains("weather_tab.hbs"));
    assert!(body.contains("allowBindings: true"));
}

#[tokio::test]
async fn same_sidebar_name_from_two_extensions_both_render() {
    let dir = tempfile::tempdir().unwrap();
    let config = common::test_config(dir.path(), 28512);
    let extensions = ExtensionRegistry::new(vec![
        Arc::new(SidebarExtension { name: "alpha" }),
        Arc::new(SidebarExtension { name: "beta" }),
    ]);
    let addr = common::spawn_server(config, extensions).await;

    let body = common::client()
        .get(format!("http://{addr}/"))
        .send()
        .await
        .expect("server reachable")
        .text()
        .await
        .unwrap();

    assert!(body.contains("sidebar_plugin_alpha"));
    assert!(body.contains("sidebar_plugin_beta"));
}

#[tokio::test]
async fn explicit_locale_beats_browser_preference() {
    let dir = tempfile::tempdir().unwrap();
    let mut config = common::test_config(dir.path(), 28513);
    config.locale.available = vec!["en".to_string(), "de".to_string(), "fr".to_string()];
    let addr = common::spawn_server(config, ExtensionRegistry::empty()).await;

    let client = common::client();

    let body = client
        .get(format!("http://{addr}/?l10n=de"))
        .header("Accept-Language", "fr")
        .send()
        .await
        .expect("server reachable")
        .text()
        .await
        .unwrap();
    assert!(body.contains("<html lang=\"de\">"));

    // An explicit locale outside the available set falls back to header
    // negotiation.
    let body = client
        .get(format!("http://{addr}/?l10n=ja"))
        .header("Accept-Language", "fr")
        .send()
        .await
        .unwrap()
        .text()
        .await
        .unwrap();
    assert!(body.contains("<html lang=\"fr\">"));
}
