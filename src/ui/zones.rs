//! Zone definitions and per-zone normalization rules.
//!
//! A zone is a named placement region in the composed page. Each zone has a
//! static [`ZoneRule`] describing how raw fragment declarations become
//! normalized entries: div-id naming, default template naming, mandatory
//! fields, and the final entry shape (flat value vs. labeled pair).

use serde::Serialize;

use crate::plugins::FragmentConfig;

/// Placement regions of the composed page.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Zone {
    Navbar,
    Sidebar,
    Tab,
    Settings,
    Generic,
}

impl Zone {
    pub const ALL: [Zone; 5] = [
        Zone::Navbar,
        Zone::Sidebar,
        Zone::Tab,
        Zone::Settings,
        Zone::Generic,
    ];

    /// Parse a declared zone kind. Unknown kinds yield `None` and the
    /// declaring fragment is silently dropped.
    pub fn parse(kind: &str) -> Option<Zone> {
        match kind {
            "navbar" => Some(Zone::Navbar),
            "sidebar" => Some(Zone::Sidebar),
            "tab" => Some(Zone::Tab),
            "settings" => Some(Zone::Settings),
            "generic" => Some(Zone::Generic),
            _ => None,
        }
    }
}

/// A fully normalized fragment, ready for the render context.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Fragment {
    /// Wrapper element id; absent for generic fragments.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub div_id: Option<String>,

    /// Display name.
    pub name: String,

    /// Template reference resolved against the template engine.
    pub template: String,

    /// Synthesized or declared binding expression.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data_bind: Option<String>,

    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub styles: Vec<String>,

    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub classes: Vec<String>,
}

/// Final shape of a zone entry.
///
/// Navbar and generic zones hold flat fragments; sidebar, tab and settings
/// zones hold `(label, fragment)` pairs.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum ZoneEntry {
    Flat(Fragment),
    Labeled(String, Fragment),
}

impl ZoneEntry {
    pub fn fragment(&self) -> &Fragment {
        match self {
            ZoneEntry::Flat(f) => f,
            ZoneEntry::Labeled(_, f) => f,
        }
    }

    pub fn label(&self) -> Option<&str> {
        match self {
            ZoneEntry::Flat(_) => None,
            ZoneEntry::Labeled(label, _) => Some(label),
        }
    }
}

/// Per-zone normalization policy. Static, defined once.
pub struct ZoneRule {
    pub zone: Zone,
    div_prefix: Option<&'static str>,
    template_suffix: &'static str,
    mandatory: &'static [&'static str],
    labeled: bool,
}

static RULES: [ZoneRule; 5] = [
    ZoneRule {
        zone: Zone::Navbar,
        div_prefix: Some("navbar_plugin_"),
        template_suffix: "_navbar.hbs",
        mandatory: &[],
        labeled: false,
    },
    ZoneRule {
        zone: Zone::Sidebar,
        div_prefix: Some("sidebar_plugin_"),
        template_suffix: "_sidebar.hbs",
        mandatory: &[],
        labeled: true,
    },
    ZoneRule {
        zone: Zone::Tab,
        div_prefix: Some("tab_plugin_"),
        template_suffix: "_tab.hbs",
        mandatory: &[],
        labeled: true,
    },
    ZoneRule {
        zone: Zone::Settings,
        div_prefix: Some("settings_plugin_"),
        template_suffix: "_settings.hbs",
        mandatory: &[],
        labeled: true,
    },
    ZoneRule {
        zone: Zone::Generic,
        div_prefix: None,
        template_suffix: ".hbs",
        // A declared generic fragment must say which template it renders;
        // the default probe supplies its own template name and is exempt.
        mandatory: &["template"],
        labeled: false,
    },
];

impl ZoneRule {
    pub fn for_zone(zone: Zone) -> &'static ZoneRule {
        match zone {
            Zone::Navbar => &RULES[0],
            Zone::Sidebar => &RULES[1],
            Zone::Tab => &RULES[2],
            Zone::Settings => &RULES[3],
            Zone::Generic => &RULES[4],
        }
    }

    /// Base div id for an extension's fragment in this zone, before suffix
    /// disambiguation. Generic fragments render without a wrapper div.
    pub fn div_id(&self, extension: &str) -> Option<String> {
        self.div_prefix.map(|prefix| format!("{prefix}{extension}"))
    }

    /// Default template reference derived from the extension name.
    pub fn default_template(&self, extension: &str) -> String {
        format!("{extension}{}", self.template_suffix)
    }

    /// Fields a declared config must carry to be accepted.
    pub fn mandatory_fields(&self) -> &'static [&'static str] {
        self.mandatory
    }

    /// Wrap a normalized fragment in the zone's entry shape.
    pub fn to_entry(&self, fragment: Fragment) -> ZoneEntry {
        if self.labeled {
            ZoneEntry::Labeled(fragment.name.clone(), fragment)
        } else {
            ZoneEntry::Flat(fragment)
        }
    }
}

impl FragmentConfig {
    /// Presence check used by mandatory-field validation.
    pub(crate) fn has_field(&self, field: &str) -> bool {
        match field {
            "name" => self.name.is_some(),
            "template" => self.template.is_some(),
            "suffix" => self.suffix.is_some(),
            "data_bind" => self.data_bind.is_some(),
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unknown_zone_kind_is_none() {
        assert_eq!(Zone::parse("toolbar"), None);
        assert_eq!(Zone::parse("tab"), Some(Zone::Tab));
    }

    #[test]
    fn tab_rule_derives_div_and_template() {
        let rule = ZoneRule::for_zone(Zone::Tab);
        assert_eq!(rule.div_id("weather").as_deref(), Some("tab_plugin_weather"));
        assert_eq!(rule.default_template("weather"), "weather_tab.hbs");
    }

    #[test]
    fn generic_rule_has_no_div() {
        let rule = ZoneRule::for_zone(Zone::Generic);
        assert_eq!(rule.div_id("weather"), None);
        assert_eq!(rule.default_template("weather"), "weather.hbs");
    }

    #[test]
    fn labeled_zones_pair_name_with_fragment() {
        let rule = ZoneRule::for_zone(Zone::Sidebar);
        let fragment = Fragment {
            div_id: Some("sidebar_plugin_x".to_string()),
            name: "X".to_string(),
            template: "x_sidebar.hbs".to_string(),
            data_bind: None,
            styles: Vec::new(),
            classes: Vec::new(),
        };
        match rule.to_entry(fragment) {
            ZoneEntry::Labeled(label, f) => {
                assert_eq!(label, "X");
                assert_eq!(f.name, "X");
            }
            other => panic!("unexpected entry shape: {other:?}"),
        }
    }
}
