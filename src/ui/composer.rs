//! Page composer.
//!
//! Merges the fragment registry's zone lists with the built-in fixed
//! entries and the core feature flags into the render context for the root
//! page. The context is constructed fresh per request — feature flags are
//! recomputed every time so configuration changes take effect immediately —
//! and never shared across requests.

use serde_json::{json, Map, Value};

use crate::context::{AppContext, VERSION};
use crate::ui::registry::{collect_fragments, FragmentSet};
use crate::ui::zones::{Zone, ZoneEntry};

/// Label of the divider that opens the plugin settings section.
const PLUGIN_SETTINGS_LABEL: &str = "Plugins";

/// Build the render context for one root-page request.
///
/// `access_host` is the host the client used to reach the server (from the
/// Host header), substituted into the camera stream template.
pub fn compose(app: &AppContext, access_host: Option<&str>, locale: &str) -> Value {
    let fragments = collect_fragments(&app.extensions, &app.templates);

    let mut context = Map::new();

    context.insert("navbar_entries".into(), navbar_entries(&fragments));
    context.insert("sidebar_entries".into(), sidebar_entries(&fragments));
    context.insert("tab_entries".into(), tab_entries(&fragments));
    context.insert("settings_entries".into(), settings_entries(&fragments));
    context.insert(
        "generic_entries".into(),
        serde_json::to_value(fragments.zone(Zone::Generic)).unwrap_or_default(),
    );

    context.insert(
        "plugin_names".into(),
        serde_json::to_value(&fragments.contributor_names).unwrap_or_default(),
    );
    context.insert("asset_plugins".into(), asset_plugin_urls(app));

    insert_feature_flags(app, &mut context);

    context.insert("webcam_stream".into(), webcam_stream(app, access_host));
    context.insert("version".into(), json!(VERSION));
    context.insert("display_version".into(), json!(VERSION));
    context.insert(
        "stylesheet".into(),
        serde_json::to_value(&app.config.appearance.stylesheet).unwrap_or(Value::Null),
    );
    context.insert(
        "gcode_threshold".into(),
        json!(app.config.gcode_viewer.size_threshold),
    );
    context.insert(
        "gcode_mobile_threshold".into(),
        json!(app.config.gcode_viewer.mobile_size_threshold),
    );
    context.insert("ui_api_key".into(), json!(app.ui_api_key));
    context.insert("locale".into(), json!(locale));
    context.insert("debug".into(), json!(app.debug));

    // Extension variables go in last, mirroring how they override nothing
    // but may add arbitrary keys.
    for (key, value) in fragments.vars.clone() {
        context.insert(key, value);
    }

    Value::Object(context)
}

/// Navbar: plugin entries first, then the fixed entries.
fn navbar_entries(fragments: &FragmentSet) -> Value {
    let mut entries: Vec<Value> = fragments
        .zone(Zone::Navbar)
        .iter()
        .map(entry_value)
        .collect();
    entries.push(json!({
        "template": "navbar/settings.hbs",
        "div_id": "navbar_settings",
        "styles": ["display: none"],
        "data_bind": "visible: loginState.isAdmin",
    }));
    entries.push(json!({
        "template": "navbar/systemmenu.hbs",
        "div_id": "navbar_systemmenu",
        "styles": ["display: none"],
        "classes": ["dropdown"],
        "data_bind": "visible: loginState.isAdmin",
    }));
    entries.push(json!({
        "template": "navbar/login.hbs",
        "div_id": "navbar_login",
        "classes": ["dropdown"],
    }));
    Value::Array(entries)
}

/// Sidebar: fixed informational entries first, then plugin entries.
fn sidebar_entries(fragments: &FragmentSet) -> Value {
    let mut entries = vec![
        json!(["Connection", {
            "template": "sidebar/connection.hbs",
            "div_id": "connection",
            "styles": ["display: none"],
            "data_bind": "visible: loginState.isAdmin",
        }]),
        json!(["State", {
            "template": "sidebar/state.hbs",
            "div_id": "state",
        }]),
        json!(["Files", {
            "template": "sidebar/files.hbs",
            "div_id": "files",
            "classes": ["overflow_visible"],
        }]),
    ];
    entries.extend(fragments.zone(Zone::Sidebar).iter().map(entry_value));
    Value::Array(entries)
}

/// Tabs: fixed entries first, then plugin entries.
fn tab_entries(fragments: &FragmentSet) -> Value {
    let mut entries = vec![
        json!(["Temperature", {"template": "tabs/temperature.hbs", "div_id": "temp"}]),
        json!(["Control", {"template": "tabs/control.hbs", "div_id": "control"}]),
        json!(["GCode Viewer", {"template": "tabs/gcodeviewer.hbs", "div_id": "gcode"}]),
        json!(["Terminal", {"template": "tabs/terminal.hbs", "div_id": "term"}]),
        json!(["Timelapse", {"template": "tabs/timelapse.hbs", "div_id": "timelapse"}]),
    ];
    entries.extend(fragments.zone(Zone::Tab).iter().map(entry_value));
    Value::Array(entries)
}

/// Settings: flat list of `(label, entry-or-null)` pairs where null acts as
/// a section divider. Plugin entries, sorted by label, get their own
/// divider-opened section at the end.
fn settings_entries(fragments: &FragmentSet) -> Value {
    let mut entries = vec![
        json!(["Printer", Value::Null]),
        json!(["Serial Connection", {
            "template": "dialogs/settings/serialconnection.hbs",
            "div_id": "settings_serialConnection",
        }]),
        json!(["Printer Profiles", {
            "template": "dialogs/settings/printerprofiles.hbs",
            "div_id": "settings_printerProfiles",
        }]),
        json!(["Temperatures", {
            "template": "dialogs/settings/temperatures.hbs",
            "div_id": "settings_temperature",
        }]),
        json!(["Terminal Filters", {
            "template": "dialogs/settings/terminalfilters.hbs",
            "div_id": "settings_terminalFilters",
        }]),
        // Section heading and its first pane share the label on purpose.
        json!(["Features", Value::Null]),
        json!(["Features", {
            "template": "dialogs/settings/features.hbs",
            "div_id": "settings_features",
        }]),
        json!(["Webcam", {
            "template": "dialogs/settings/webcam.hbs",
            "div_id": "settings_webcam",
        }]),
        json!(["Access Control", {
            "template": "dialogs/settings/accesscontrol.hbs",
            "div_id": "settings_users",
        }]),
        json!(["Server", Value::Null]),
        json!(["Folders", {
            "template": "dialogs/settings/folders.hbs",
            "div_id": "settings_folders",
        }]),
        json!(["Appearance", {
            "template": "dialogs/settings/appearance.hbs",
            "div_id": "settings_appearance",
        }]),
        json!(["Logs", {
            "template": "dialogs/settings/logs.hbs",
            "div_id": "settings_logs",
        }]),
    ];

    let plugin_settings = fragments.zone(Zone::Settings);
    if !plugin_settings.is_empty() {
        entries.push(json!([PLUGIN_SETTINGS_LABEL, Value::Null]));
        let mut sorted: Vec<&ZoneEntry> = plugin_settings.iter().collect();
        sorted.sort_by(|a, b| a.label().unwrap_or("").cmp(b.label().unwrap_or("")));
        entries.extend(sorted.into_iter().map(entry_value));
    }

    Value::Array(entries)
}

fn entry_value(entry: &ZoneEntry) -> Value {
    serde_json::to_value(entry).unwrap_or(Value::Null)
}

fn asset_plugin_urls(app: &AppContext) -> Value {
    let mut map = Map::new();
    for (extension, contributor) in app.extensions.asset_contributors() {
        map.insert(extension.name().to_string(), contributor.assets());
    }
    Value::Object(map)
}

/// Feature flags derived purely from configuration and collaborator
/// presence. A missing or null source disables the feature.
fn insert_feature_flags(app: &AppContext, context: &mut Map<String, Value>) {
    let config = &app.config;

    context.insert(
        "enable_timelapse".into(),
        json!(config.webcam.snapshot.is_some() && config.webcam.ffmpeg.is_some()),
    );
    context.insert(
        "enable_gcode_visualizer".into(),
        json!(config.gcode_viewer.enabled),
    );
    context.insert(
        "enable_temperature_graph".into(),
        json!(config.feature.temperature_graph),
    );
    context.insert(
        "enable_system_menu".into(),
        json!(!config.system.actions.is_empty()),
    );
    context.insert(
        "enable_access_control".into(),
        json!(app.identity.access_control_enabled()),
    );
    context.insert("enable_sd_support".into(), json!(config.feature.sd_support));
    context.insert(
        "first_run".into(),
        json!(config.server.first_run && !app.identity.has_been_customized()),
    );
}

/// Resolve the camera stream URL, substituting the access address the
/// client used. Absent configuration yields null, disabling the feature.
fn webcam_stream(app: &AppContext, access_host: Option<&str>) -> Value {
    let Some(template) = app.config.webcam.stream.as_deref() else {
        return Value::Null;
    };

    let hostname = access_host
        .and_then(|host| {
            url::Url::parse(&format!("http://{host}"))
                .ok()
                .and_then(|u| u.host_str().map(str::to_string))
        })
        .unwrap_or_else(|| "localhost".to_string());

    json!(template.replace("{access_address}", &hostname))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::test_context;

    #[test]
    fn navbar_plugins_precede_fixed_entries() {
        let app = test_context(|builder| {
            builder.with_navbar_extension("alerts");
        });
        let context = compose(&app, None, "en");
        let navbar = context["navbar_entries"].as_array().unwrap();
        assert_eq!(navbar[0]["div_id"], "navbar_plugin_alerts");
        assert_eq!(navbar.last().unwrap()["div_id"], "navbar_login");
    }

    #[test]
    fn sidebar_fixed_entries_precede_plugins() {
        let app = test_context(|builder| {
            builder.with_sidebar_extension("stats");
        });
        let context = compose(&app, None, "en");
        let sidebar = context["sidebar_entries"].as_array().unwrap();
        assert_eq!(sidebar[0][0], "Connection");
        assert_eq!(
            sidebar.last().unwrap()[1]["div_id"],
            "sidebar_plugin_stats"
        );
    }

    #[test]
    fn plugin_settings_get_a_divider_and_sort_by_label() {
        let app = test_context(|builder| {
            builder.with_settings_extension("zeta", "Zeta");
            builder.with_settings_extension("alpha", "Alpha");
        });
        let context = compose(&app, None, "en");
        let settings = context["settings_entries"].as_array().unwrap();

        let divider_pos = settings
            .iter()
            .position(|e| e[0] == PLUGIN_SETTINGS_LABEL && e[1].is_null())
            .expect("plugin divider present");
        assert_eq!(settings[divider_pos + 1][0], "Alpha");
        assert_eq!(settings[divider_pos + 2][0], "Zeta");
    }

    #[test]
    fn no_plugin_settings_means_no_divider() {
        let app = test_context(|_| {});
        let context = compose(&app, None, "en");
        let settings = context["settings_entries"].as_array().unwrap();
        assert!(!settings
            .iter()
            .any(|e| e[0] == PLUGIN_SETTINGS_LABEL));
    }

    #[test]
    fn features_divider_pairs_with_features_pane() {
        let app = test_context(|_| {});
        let context = compose(&app, None, "en");
        let settings = context["settings_entries"].as_array().unwrap();
        let features: Vec<&Value> = settings.iter().filter(|e| e[0] == "Features").collect();
        assert_eq!(features.len(), 2);
        assert!(features[0][1].is_null());
        assert!(features[1][1].is_object());
    }

    #[test]
    fn missing_webcam_config_disables_timelapse() {
        let app = test_context(|_| {});
        let context = compose(&app, None, "en");
        assert_eq!(context["enable_timelapse"], false);
        assert!(context["webcam_stream"].is_null());
    }

    #[test]
    fn stream_template_substitutes_access_address() {
        let app = test_context(|builder| {
            builder.config.webcam.stream = Some("http://{access_address}/stream".to_string());
        });
        let context = compose(&app, Some("panel.local:5000"), "en");
        assert_eq!(context["webcam_stream"], "http://panel.local/stream");
    }

    #[test]
    fn plugin_vars_land_in_context() {
        let app = test_context(|builder| {
            builder.with_vars_extension("weather", serde_json::json!({"unit": "celsius"}));
        });
        let context = compose(&app, None, "en");
        assert_eq!(context["plugin_weather_unit"], "celsius");
    }
}
