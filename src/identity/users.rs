//! User manager seam and the built-in config-backed implementation.
//!
//! Credential storage is an external concern; this layer only needs to look
//! users up and ask whether the installation has been customized. The
//! concrete manager is chosen from a closed registry keyed by a config
//! string — unknown keys disable access control with a logged warning
//! instead of attempting any dynamic resolution.

use std::collections::HashMap;
use std::sync::Arc;

use crate::config::schema::AccessControlConfig;

/// A user as resolved by a manager.
#[derive(Debug, Clone)]
pub struct UserRecord {
    pub name: String,
    pub active: bool,
    pub admin: bool,
}

/// Lookup interface over whatever user store is configured.
pub trait UserManager: Send + Sync {
    /// Find a user, optionally scoped to a session-bound sub-identifier.
    fn find_user(&self, name: &str, session: Option<&str>) -> Option<UserRecord>;

    /// Whether any user has been configured beyond the factory state.
    fn has_been_customized(&self) -> bool;
}

/// Built-in manager reading users straight from the config file.
pub struct ConfigUserManager {
    users: HashMap<String, UserRecord>,
}

impl ConfigUserManager {
    pub fn new(config: &AccessControlConfig) -> Self {
        let users = config
            .users
            .iter()
            .map(|entry| {
                (
                    entry.name.clone(),
                    UserRecord {
                        name: entry.name.clone(),
                        active: entry.active.unwrap_or(true),
                        admin: entry.admin,
                    },
                )
            })
            .collect();
        Self { users }
    }
}

impl UserManager for ConfigUserManager {
    fn find_user(&self, name: &str, _session: Option<&str>) -> Option<UserRecord> {
        // Session scoping distinguishes concurrent logins of the same user;
        // the config-backed store resolves them to the same record.
        self.users.get(name).cloned()
    }

    fn has_been_customized(&self) -> bool {
        !self.users.is_empty()
    }
}

/// Construct the configured user manager from the closed registry.
///
/// Returns `None` (access control disabled) when the feature is off or the
/// configured key is unknown. Unknown keys are a logged warning, not an
/// error: the server starts in degraded mode rather than failing.
pub fn build_user_manager(config: &AccessControlConfig) -> Option<Arc<dyn UserManager>> {
    if !config.enabled {
        tracing::info!("Access control disabled by configuration");
        return None;
    }

    match config.user_manager.as_str() {
        "config" => Some(Arc::new(ConfigUserManager::new(config))),
        unknown => {
            tracing::warn!(
                user_manager = unknown,
                "Unknown user manager, running with access control disabled"
            );
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::schema::UserEntry;

    fn config_with_users(users: Vec<UserEntry>) -> AccessControlConfig {
        AccessControlConfig {
            enabled: true,
            user_manager: "config".to_string(),
            users,
        }
    }

    #[test]
    fn unknown_manager_key_disables_access_control() {
        let mut config = config_with_users(Vec::new());
        config.user_manager = "ldap".to_string();
        assert!(build_user_manager(&config).is_none());
    }

    #[test]
    fn disabled_access_control_builds_no_manager() {
        let mut config = config_with_users(Vec::new());
        config.enabled = false;
        assert!(build_user_manager(&config).is_none());
    }

    #[test]
    fn config_manager_resolves_declared_users() {
        let manager = ConfigUserManager::new(&config_with_users(vec![UserEntry {
            name: "alice".to_string(),
            admin: true,
            active: None,
        }]));
        let user = manager.find_user("alice", None).unwrap();
        assert!(user.admin);
        assert!(user.active);
        assert!(manager.find_user("bob", None).is_none());
        assert!(manager.has_been_customized());
    }
}
