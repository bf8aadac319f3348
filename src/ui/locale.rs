//! Locale negotiation.
//!
//! The available set derives from configuration (translation catalogs plus
//! the default). Negotiation prefers an explicit request-supplied locale
//! (`l10n` parameter) over the client's advertised preference list.

use crate::config::schema::LocaleConfig;

/// Immutable set of locales the UI can be served in.
#[derive(Debug, Clone)]
pub struct LocaleSet {
    available: Vec<String>,
    default: String,
}

impl LocaleSet {
    pub fn from_config(config: &LocaleConfig) -> Self {
        let mut available = config.available.clone();
        if !available.iter().any(|l| l == &config.default) {
            available.insert(0, config.default.clone());
        }
        Self {
            available,
            default: config.default.clone(),
        }
    }

    pub fn default_locale(&self) -> &str {
        &self.default
    }

    pub fn available(&self) -> &[String] {
        &self.available
    }

    /// Match one candidate against the available set: exact identifier
    /// first, then its bare language part ("de_DE" also matches "de").
    fn lookup(&self, candidate: &str) -> Option<String> {
        let candidate = candidate.trim();
        if candidate.is_empty() {
            return None;
        }
        if let Some(hit) = self.available.iter().find(|l| l.eq_ignore_ascii_case(candidate)) {
            return Some(hit.clone());
        }
        let language = candidate
            .split(['_', '-'])
            .next()
            .unwrap_or(candidate);
        self.available
            .iter()
            .find(|l| l.eq_ignore_ascii_case(language))
            .cloned()
    }

    /// Negotiate the locale for one request.
    ///
    /// `explicit` is the request-supplied value (query or session), which
    /// wins whenever it matches the available set; otherwise the
    /// `Accept-Language` preference list is walked in q-value order.
    pub fn negotiate(&self, explicit: Option<&str>, accept_language: Option<&str>) -> String {
        if let Some(hit) = explicit.and_then(|value| self.lookup(value)) {
            return hit;
        }

        if let Some(header) = accept_language {
            for candidate in parse_accept_language(header) {
                if let Some(hit) = self.lookup(&candidate) {
                    return hit;
                }
            }
        }

        self.default.clone()
    }
}

/// Parse an `Accept-Language` header into candidates ordered by q-value.
fn parse_accept_language(header: &str) -> Vec<String> {
    let mut weighted: Vec<(String, f32)> = header
        .split(',')
        .filter_map(|part| {
            let mut pieces = part.split(';');
            let tag = pieces.next()?.trim();
            if tag.is_empty() || tag == "*" {
                return None;
            }
            let q = pieces
                .find_map(|p| p.trim().strip_prefix("q=").map(str::to_string))
                .and_then(|q| q.parse::<f32>().ok())
                .unwrap_or(1.0);
            Some((tag.to_string(), q))
        })
        .collect();
    weighted.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(std::cmp::Ordering::Equal));
    weighted.into_iter().map(|(tag, _)| tag).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn set(available: &[&str]) -> LocaleSet {
        LocaleSet::from_config(&LocaleConfig {
            default: "en".to_string(),
            available: available.iter().map(|s| s.to_string()).collect(),
        })
    }

    #[test]
    fn explicit_value_beats_header() {
        let locales = set(&["en", "de", "fr"]);
        assert_eq!(locales.negotiate(Some("de"), Some("fr,en;q=0.5")), "de");
    }

    #[test]
    fn unknown_explicit_falls_back_to_header() {
        let locales = set(&["en", "fr"]);
        assert_eq!(locales.negotiate(Some("de"), Some("fr,en;q=0.5")), "fr");
    }

    #[test]
    fn header_respects_q_values() {
        let locales = set(&["en", "fr"]);
        assert_eq!(locales.negotiate(None, Some("de,fr;q=0.9,en;q=0.8")), "fr");
    }

    #[test]
    fn territory_matches_language() {
        let locales = set(&["en", "de"]);
        assert_eq!(locales.negotiate(Some("de_DE"), None), "de");
        assert_eq!(locales.negotiate(None, Some("de-AT,en;q=0.5")), "de");
    }

    #[test]
    fn default_when_nothing_matches() {
        let locales = set(&["en"]);
        assert_eq!(locales.negotiate(Some("ja"), Some("ko,zh;q=0.8")), "en");
    }

    #[test]
    fn default_is_always_available() {
        let locales = LocaleSet::from_config(&LocaleConfig {
            default: "en".to_string(),
            available: vec!["de".to_string()],
        });
        assert!(locales.available().contains(&"en".to_string()));
    }
}
