//! Template fragment registry.
//!
//! Collects UI fragment declarations from the loaded extensions, normalizes
//! and validates them against the per-zone rules, and produces the ordered
//! zone lists the page composer merges with the built-in entries.
//!
//! # Error Policy
//! A malformed or partially-specified declaration degrades to omission,
//! never to a render failure: missing/unknown zone kinds, missing mandatory
//! fields and duplicate div ids are all silently dropped (debug-logged).

use std::collections::HashMap;

use crate::plugins::{ExtensionRegistry, FragmentConfig};
use crate::ui::templates::TemplateEngine;
use crate::ui::zones::{Fragment, Zone, ZoneEntry, ZoneRule};

/// Baseline clause every synthesized binding expression starts with.
const BASELINE_BINDING: &str = "allowBindings: true";

/// Ordered per-zone entries plus the extension variable namespace.
#[derive(Debug, Default)]
pub struct FragmentSet {
    zones: HashMap<Zone, Vec<ZoneEntry>>,

    /// `plugin_<name>_<var>` → value.
    pub vars: serde_json::Map<String, serde_json::Value>,

    /// Names of extensions that contributed templates, in registry order.
    pub contributor_names: Vec<String>,
}

impl FragmentSet {
    pub fn zone(&self, zone: Zone) -> &[ZoneEntry] {
        self.zones.get(&zone).map(Vec::as_slice).unwrap_or(&[])
    }

    fn push(&mut self, zone: Zone, entry: ZoneEntry) {
        self.zones.entry(zone).or_default().push(entry);
    }

    fn div_id_taken(&self, zone: Zone, div_id: &str) -> bool {
        self.zone(zone)
            .iter()
            .any(|e| e.fragment().div_id.as_deref() == Some(div_id))
    }
}

/// Collect and normalize fragment declarations from every
/// template-contributing extension.
///
/// Extension processing order is the registry's stable iteration order, so
/// the zone lists are deterministic across requests.
pub fn collect_fragments(extensions: &ExtensionRegistry, templates: &TemplateEngine) -> FragmentSet {
    let mut set = FragmentSet::default();

    for (extension, contributor) in extensions.template_contributors() {
        let name = extension.name().to_string();
        set.contributor_names.push(name.clone());

        // Variable bindings: anything but a JSON object is treated as empty.
        if let serde_json::Value::Object(vars) = contributor.template_vars() {
            for (var, value) in vars {
                set.vars.insert(format!("plugin_{name}_{var}"), value);
            }
        }

        process_extension_configs(
            &name,
            extension.display_name(),
            &contributor.template_configs(),
            templates,
            &mut set,
        );
    }

    set
}

fn process_extension_configs(
    name: &str,
    display_name: &str,
    configs: &[FragmentConfig],
    templates: &TemplateEngine,
    set: &mut FragmentSet,
) {
    // Per-zone counters for this extension; a second unsuffixed fragment in
    // the same zone gets `_2`, the third `_3`, and so on.
    let mut counters: HashMap<Zone, usize> = HashMap::new();
    let mut contributed: HashMap<Zone, usize> = HashMap::new();

    for config in configs {
        let Some(kind) = config.kind.as_deref() else {
            tracing::debug!(extension = name, "Fragment config without kind dropped");
            continue;
        };
        let Some(zone) = Zone::parse(kind) else {
            tracing::debug!(extension = name, kind, "Fragment config with unknown kind dropped");
            continue;
        };

        let rule = ZoneRule::for_zone(zone);
        let counter = *counters.entry(zone).or_insert(1);

        let Some(fragment) = normalize(name, display_name, rule, Some(config), counter) else {
            tracing::debug!(
                extension = name,
                kind,
                "Fragment config missing mandatory fields dropped"
            );
            continue;
        };

        if let Some(div_id) = fragment.div_id.as_deref() {
            if set.div_id_taken(zone, div_id) {
                tracing::debug!(extension = name, div_id, "Duplicate div id dropped");
                continue;
            }
        }

        set.push(zone, rule.to_entry(fragment));
        counters.insert(zone, counter + 1);
        *contributed.entry(zone).or_insert(0) += 1;
    }

    // Zones this extension declared nothing for get one probed default
    // entry, included only when the derived template actually exists.
    for zone in Zone::ALL {
        if contributed.get(&zone).copied().unwrap_or(0) > 0 {
            continue;
        }
        let rule = ZoneRule::for_zone(zone);
        let Some(fragment) = normalize(name, display_name, rule, None, 1) else {
            continue;
        };
        if !templates.has_template(&fragment.template) {
            continue;
        }
        if let Some(div_id) = fragment.div_id.as_deref() {
            if set.div_id_taken(zone, div_id) {
                continue;
            }
        }
        set.push(zone, rule.to_entry(fragment));
    }
}

/// Normalize one declaration against a zone rule.
///
/// `config` is `None` for the default probe, which skips mandatory-field
/// validation since the rule supplies the template name itself.
fn normalize(
    name: &str,
    display_name: &str,
    rule: &ZoneRule,
    config: Option<&FragmentConfig>,
    counter: usize,
) -> Option<Fragment> {
    if let Some(config) = config {
        for field in rule.mandatory_fields() {
            if !config.has_field(field) {
                return None;
            }
        }
    }

    let empty = FragmentConfig::default();
    let config = config.unwrap_or(&empty);

    let div_id = rule.div_id(name).map(|mut div| {
        if let Some(suffix) = config.suffix.as_deref() {
            div.push('_');
            div.push_str(suffix);
        } else if counter > 1 {
            div.push_str(&format!("_{counter}"));
        }
        div
    });

    let template = config
        .template
        .clone()
        .unwrap_or_else(|| rule.default_template(name));

    let fragment_name = config
        .name
        .clone()
        .unwrap_or_else(|| display_name.to_string());

    let data_bind = if config.custom_bindings.unwrap_or(true) {
        Some(match config.data_bind.as_deref() {
            Some(declared) => format!("{BASELINE_BINDING}, {declared}"),
            None => BASELINE_BINDING.to_string(),
        })
    } else {
        config.data_bind.clone()
    };

    Some(Fragment {
        div_id,
        name: fragment_name,
        template,
        data_bind,
        styles: config.styles.clone(),
        classes: config.classes.clone(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::plugins::{Extension, TemplateContributor};
    use std::path::PathBuf;
    use std::sync::Arc;

    struct Contributor {
        name: &'static str,
        configs: Vec<FragmentConfig>,
        vars: serde_json::Value,
    }

    impl Extension for Contributor {
        fn name(&self) -> &str {
            self.name
        }

        fn as_template_contributor(&self) -> Option<&dyn TemplateContributor> {
            Some(self)
        }
    }

    impl TemplateContributor for Contributor {
        fn template_configs(&self) -> Vec<FragmentConfig> {
            self.configs.clone()
        }

        fn template_vars(&self) -> serde_json::Value {
            self.vars.clone()
        }

        fn template_folder(&self) -> Option<PathBuf> {
            None
        }
    }

    fn registry_of(contributors: Vec<Contributor>) -> ExtensionRegistry {
        ExtensionRegistry::new(
            contributors
                .into_iter()
                .map(|c| Arc::new(c) as Arc<dyn Extension>)
                .collect(),
        )
    }

    fn engine() -> TemplateEngine {
        TemplateEngine::new().unwrap()
    }

    #[test]
    fn unknown_and_missing_kinds_are_dropped_silently() {
        let registry = registry_of(vec![Contributor {
            name: "weather",
            configs: vec![
                FragmentConfig::default(),
                FragmentConfig::new("toolbar"),
            ],
            vars: serde_json::Value::Null,
        }]);
        let set = collect_fragments(&registry, &engine());
        for zone in Zone::ALL {
            assert!(set.zone(zone).is_empty());
        }
    }

    #[test]
    fn second_unsuffixed_fragment_gets_counter_suffix() {
        let registry = registry_of(vec![Contributor {
            name: "foo",
            configs: vec![FragmentConfig::new("tab"), FragmentConfig::new("tab")],
            vars: serde_json::Value::Null,
        }]);
        let set = collect_fragments(&registry, &engine());
        let tabs = set.zone(Zone::Tab);
        assert_eq!(tabs.len(), 2);
        assert_eq!(tabs[0].fragment().div_id.as_deref(), Some("tab_plugin_foo"));
        assert_eq!(tabs[1].fragment().div_id.as_deref(), Some("tab_plugin_foo_2"));
    }

    #[test]
    fn explicit_suffix_wins_over_counter() {
        let registry = registry_of(vec![Contributor {
            name: "foo",
            configs: vec![
                FragmentConfig::new("tab"),
                FragmentConfig::new("tab").with_suffix("extra"),
            ],
            vars: serde_json::Value::Null,
        }]);
        let set = collect_fragments(&registry, &engine());
        assert_eq!(
            set.zone(Zone::Tab)[1].fragment().div_id.as_deref(),
            Some("tab_plugin_foo_extra")
        );
    }

    #[test]
    fn default_tab_entry_synthesized_when_template_exists() {
        let registry = registry_of(vec![Contributor {
            name: "weather",
            configs: Vec::new(),
            vars: serde_json::Value::Null,
        }]);

        let mut engine = engine();
        engine
            .register_string("weather_tab.hbs", "<div>weather</div>")
            .unwrap();

        let set = collect_fragments(&registry, &engine);
        let tabs = set.zone(Zone::Tab);
        assert_eq!(tabs.len(), 1);
        let fragment = tabs[0].fragment();
        assert_eq!(fragment.div_id.as_deref(), Some("tab_plugin_weather"));
        assert_eq!(fragment.template, "weather_tab.hbs");
        assert!(fragment
            .data_bind
            .as_deref()
            .unwrap()
            .contains(BASELINE_BINDING));
        // Zones without a registered default template stay empty.
        assert!(set.zone(Zone::Navbar).is_empty());
    }

    #[test]
    fn same_declared_name_from_two_extensions_both_appear() {
        let registry = registry_of(vec![
            Contributor {
                name: "alpha",
                configs: vec![FragmentConfig::new("sidebar").with_name("Shared")],
                vars: serde_json::Value::Null,
            },
            Contributor {
                name: "beta",
                configs: vec![FragmentConfig::new("sidebar").with_name("Shared")],
                vars: serde_json::Value::Null,
            },
        ]);
        let set = collect_fragments(&registry, &engine());
        let sidebar = set.zone(Zone::Sidebar);
        assert_eq!(sidebar.len(), 2);
        assert_eq!(sidebar[0].label(), Some("Shared"));
        assert_eq!(sidebar[1].label(), Some("Shared"));
        assert_ne!(
            sidebar[0].fragment().div_id,
            sidebar[1].fragment().div_id
        );
    }

    #[test]
    fn declared_data_bind_is_appended_to_baseline() {
        let registry = registry_of(vec![Contributor {
            name: "foo",
            configs: vec![FragmentConfig::new("navbar").with_data_bind("visible: ready")],
            vars: serde_json::Value::Null,
        }]);
        let set = collect_fragments(&registry, &engine());
        assert_eq!(
            set.zone(Zone::Navbar)[0].fragment().data_bind.as_deref(),
            Some("allowBindings: true, visible: ready")
        );
    }

    #[test]
    fn custom_bindings_false_keeps_declared_expression() {
        let registry = registry_of(vec![Contributor {
            name: "foo",
            configs: vec![FragmentConfig::new("navbar")
                .with_data_bind("visible: ready")
                .without_custom_bindings()],
            vars: serde_json::Value::Null,
        }]);
        let set = collect_fragments(&registry, &engine());
        assert_eq!(
            set.zone(Zone::Navbar)[0].fragment().data_bind.as_deref(),
            Some("visible: ready")
        );
    }

    #[test]
    fn generic_config_without_template_is_dropped() {
        let registry = registry_of(vec![Contributor {
            name: "foo",
            configs: vec![FragmentConfig::new("generic")],
            vars: serde_json::Value::Null,
        }]);
        let set = collect_fragments(&registry, &engine());
        assert!(set.zone(Zone::Generic).is_empty());
    }

    #[test]
    fn vars_are_namespaced_per_extension() {
        let registry = registry_of(vec![Contributor {
            name: "weather",
            configs: Vec::new(),
            vars: serde_json::json!({"unit": "celsius"}),
        }]);
        let set = collect_fragments(&registry, &engine());
        assert_eq!(set.vars["plugin_weather_unit"], "celsius");
    }

    #[test]
    fn non_object_vars_are_treated_as_empty() {
        let registry = registry_of(vec![Contributor {
            name: "weather",
            configs: Vec::new(),
            vars: serde_json::json!(["not", "a", "map"]),
        }]);
        let set = collect_fragments(&registry, &engine());
        assert!(set.vars.is_empty());
    }
}
