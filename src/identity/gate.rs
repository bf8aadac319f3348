//! Session/identity resolution.
//!
//! Resolves the acting identity for a request or connection from its token
//! and session state, and maps it to a role set. Resolution happens lazily,
//! once per request; the expanded role set is computed here, at resolution
//! time, and never re-derived downstream.

use std::sync::Arc;

use crate::identity::users::UserManager;

/// Token that always resolves to the unconditional API identity.
pub const API_TOKEN: &str = "_api";

/// Roles an identity can carry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    User,
    Admin,
}

/// Session state accompanying a request.
#[derive(Debug, Clone, Default)]
pub struct SessionState {
    /// Session-bound sub-identifier distinguishing concurrent logins of the
    /// same user.
    pub user_session_id: Option<String>,
}

/// The resolved actor for a request.
#[derive(Debug, Clone, PartialEq)]
pub enum Identity {
    /// Synthetic API identity with full, unconditional capability.
    Api,

    /// No authenticated user. Role checks fail closed.
    Anonymous,

    /// A named, authenticated user with an expanded role set.
    Named {
        name: String,
        roles: Vec<Role>,
        session: Option<String>,
    },
}

impl Identity {
    pub fn has_role(&self, role: Role) -> bool {
        match self {
            Identity::Api => true,
            Identity::Anonymous => false,
            Identity::Named { roles, .. } => roles.contains(&role),
        }
    }

    pub fn is_user(&self) -> bool {
        self.has_role(Role::User)
    }

    pub fn is_admin(&self) -> bool {
        self.has_role(Role::Admin)
    }
}

/// Resolves request tokens to identities.
pub struct IdentityGate {
    user_manager: Option<Arc<dyn UserManager>>,
}

impl IdentityGate {
    pub fn new(user_manager: Option<Arc<dyn UserManager>>) -> Self {
        Self { user_manager }
    }

    /// Whether any user manager is configured at all.
    pub fn access_control_enabled(&self) -> bool {
        self.user_manager.is_some()
    }

    /// Whether the configured user store has been customized.
    pub fn has_been_customized(&self) -> bool {
        self.user_manager
            .as_ref()
            .map(|m| m.has_been_customized())
            .unwrap_or(false)
    }

    /// Resolve an identity token against the session state.
    ///
    /// The `"_api"` token short-circuits to the API identity regardless of
    /// session. Without a user manager every other token resolves to the
    /// anonymous identity.
    pub fn resolve(&self, token: &str, session: &SessionState) -> Identity {
        if token == API_TOKEN {
            return Identity::Api;
        }

        let Some(manager) = self.user_manager.as_ref() else {
            return Identity::Anonymous;
        };

        let session_id = session.user_session_id.as_deref();
        match manager.find_user(token, session_id) {
            Some(user) => {
                // Role expansion happens exactly once, here.
                let mut roles = Vec::new();
                if user.active {
                    roles.push(Role::User);
                }
                if user.admin {
                    roles.push(Role::Admin);
                }
                Identity::Named {
                    name: user.name,
                    roles,
                    session: session_id.map(str::to_string),
                }
            }
            None => Identity::Anonymous,
        }
    }
}
