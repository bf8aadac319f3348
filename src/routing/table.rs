//! Route table construction and lookup.
//!
//! # Responsibilities
//! - Build the ordered route table once at startup (immutable thereafter)
//! - Combine infrastructure routes, extension routes and the catch-all
//! - Resolve per-route body-size limits independently of the global default
//!
//! # Design Decisions
//! - Route order is significant: first structural match wins
//! - The catch-all is appended last and can never shadow a structural route
//! - Authorization is a per-binding policy evaluated at request time, so
//!   the table can be built before the identity infrastructure exists

use std::path::PathBuf;

use axum::http::Method;

use crate::config::ServerConfig;
use crate::identity::{Identity, Role};
use crate::plugins::ExtensionRegistry;
use crate::routing::matcher::{MethodSet, RoutePattern};

/// Authorization requirement attached to a binding.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccessPolicy {
    /// No identity required.
    Open,

    /// Any authenticated identity.
    User,

    /// Administrators only.
    Admin,
}

impl AccessPolicy {
    pub fn allows(&self, identity: &Identity) -> bool {
        match self {
            AccessPolicy::Open => true,
            AccessPolicy::User => identity.has_role(Role::User),
            AccessPolicy::Admin => identity.has_role(Role::Admin),
        }
    }

    /// Whether evaluating this policy needs a resolved identity at all.
    pub fn needs_identity(&self) -> bool {
        !matches!(self, AccessPolicy::Open)
    }
}

/// What a matched binding dispatches to.
pub enum RouteHandler {
    /// Composed root page.
    Index,

    /// Static robots.txt passthrough.
    Robots,

    /// Push-channel WebSocket upgrade.
    Channel,

    /// Extension asset passthrough (`/plugin_assets/<name>/<path>`).
    PluginAsset,

    /// Streamed file download rooted at a folder; the file name comes from
    /// the first pattern capture.
    FileDownload { root: PathBuf, as_attachment: bool },

    /// Camera snapshot forwarded from the configured URL.
    Snapshot { url: Option<String> },

    /// Extension-contributed router mounted under `/plugin/<name>`.
    PluginRoutes { name: String, router: axum::Router },

    /// Upload interception or verbatim forward to the API stack.
    Fallback,
}

/// One ordered URL-pattern-to-handler binding.
pub struct RouteBinding {
    /// Identifier for logging and metrics.
    pub name: String,

    pub pattern: RoutePattern,
    pub methods: MethodSet,
    pub access: AccessPolicy,

    /// Attach CORS headers to every response on this binding.
    pub cors: bool,

    pub handler: RouteHandler,
}

/// A per-route body-size limit, consulted in order; first match wins.
pub struct BodyLimit {
    pub methods: MethodSet,
    pub pattern: RoutePattern,
    pub max_bytes: usize,
}

/// Result of a successful table lookup.
pub struct RouteMatch<'a> {
    pub binding: &'a RouteBinding,
    pub captures: Vec<String>,
}

/// The ordered, immutable route table.
pub struct RouteTable {
    bindings: Vec<RouteBinding>,
    body_limits: Vec<BodyLimit>,
    default_max_body: usize,
}

/// Error type for table construction.
#[derive(Debug, thiserror::Error)]
pub enum RouteTableError {
    #[error("invalid route pattern: {0}")]
    Pattern(#[from] regex::Error),
}

impl RouteTable {
    /// Build the route table from configuration and the loaded extensions.
    pub fn build(
        config: &ServerConfig,
        extensions: &ExtensionRegistry,
    ) -> Result<Self, RouteTableError> {
        let folders = &config.folders;
        let mut bindings = vec![
            RouteBinding {
                name: "robots".to_string(),
                pattern: RoutePattern::Exact("/robots.txt".to_string()),
                methods: MethodSet::get(),
                access: AccessPolicy::Open,
                cors: false,
                handler: RouteHandler::Robots,
            },
            RouteBinding {
                name: "index".to_string(),
                pattern: RoutePattern::Exact("/".to_string()),
                methods: MethodSet::get(),
                access: AccessPolicy::Open,
                cors: false,
                handler: RouteHandler::Index,
            },
            RouteBinding {
                name: "channel".to_string(),
                pattern: RoutePattern::Exact("/sockjs".to_string()),
                methods: MethodSet::get(),
                access: AccessPolicy::Open,
                cors: false,
                handler: RouteHandler::Channel,
            },
            RouteBinding {
                name: "plugin_assets".to_string(),
                pattern: RoutePattern::regex(r"/plugin_assets/([^/]+)/(.+)")?,
                methods: MethodSet::get(),
                access: AccessPolicy::Open,
                cors: false,
                handler: RouteHandler::PluginAsset,
            },
            RouteBinding {
                name: "timelapse_download".to_string(),
                pattern: RoutePattern::regex(r"/downloads/timelapse/([^/]*\.mpg)")?,
                methods: MethodSet::get(),
                access: AccessPolicy::Open,
                cors: false,
                handler: RouteHandler::FileDownload {
                    root: folders.timelapse.clone(),
                    as_attachment: true,
                },
            },
            RouteBinding {
                name: "gcode_download".to_string(),
                pattern: RoutePattern::regex(r"/downloads/files/local/([^/]*\.(?:gco|gcode|g))")?,
                methods: MethodSet::get(),
                access: AccessPolicy::User,
                cors: false,
                handler: RouteHandler::FileDownload {
                    root: folders.uploads.clone(),
                    as_attachment: true,
                },
            },
            RouteBinding {
                name: "log_download".to_string(),
                pattern: RoutePattern::regex(r"/downloads/logs/([^/]*)")?,
                methods: MethodSet::get(),
                access: AccessPolicy::Admin,
                cors: false,
                handler: RouteHandler::FileDownload {
                    root: folders.logs.clone(),
                    as_attachment: true,
                },
            },
            RouteBinding {
                name: "camera_snapshot".to_string(),
                pattern: RoutePattern::Exact("/downloads/camera/current".to_string()),
                methods: MethodSet::get(),
                access: AccessPolicy::User,
                cors: false,
                handler: RouteHandler::Snapshot {
                    url: config.webcam.snapshot.clone(),
                },
            },
        ];

        // Extension routes mount under a namespaced prefix. Protected
        // extensions get an identity check before and CORS headers after
        // every request.
        for (extension, contributor) in extensions.route_contributors() {
            let Some(router) = contributor.routes() else {
                continue;
            };
            let name = extension.name().to_string();
            let protected = contributor.is_protected();
            tracing::debug!(extension = %name, protected, "Mounting extension routes");
            bindings.push(RouteBinding {
                name: format!("plugin_{name}"),
                pattern: RoutePattern::Prefix(format!("/plugin/{name}/")),
                methods: MethodSet::Any,
                access: if protected {
                    AccessPolicy::User
                } else {
                    AccessPolicy::Open
                },
                cors: protected,
                handler: RouteHandler::PluginRoutes { name, router },
            });
        }

        // The catch-all goes last, always.
        bindings.push(RouteBinding {
            name: "fallback".to_string(),
            pattern: RoutePattern::Any,
            methods: MethodSet::Any,
            access: AccessPolicy::Open,
            cors: false,
            handler: RouteHandler::Fallback,
        });

        // Upload targets carry their own body-size limits, overriding the
        // global default in either direction.
        let uploads = &config.server.uploads;
        let body_limits = uploads
            .targets
            .iter()
            .map(|target| {
                let method = target
                    .method
                    .parse::<Method>()
                    .unwrap_or(Method::POST);
                BodyLimit {
                    methods: MethodSet::Only(vec![method]),
                    pattern: RoutePattern::Prefix(target.path_prefix.clone()),
                    max_bytes: target.max_body_size.unwrap_or(uploads.max_size),
                }
            })
            .collect();

        Ok(Self {
            bindings,
            body_limits,
            default_max_body: config.server.max_body_size,
        })
    }

    /// Look up the first binding matching the request. The catch-all
    /// guarantees a match for any path.
    pub fn match_request(&self, method: &Method, path: &str) -> Option<RouteMatch<'_>> {
        self.bindings.iter().find_map(|binding| {
            if !binding.methods.matches(method) {
                return None;
            }
            binding.pattern.matches(path).map(|captures| RouteMatch {
                binding,
                captures,
            })
        })
    }

    /// Effective body-size limit for a request. Per-route limits are
    /// consulted in order; the global default applies when none match.
    pub fn max_body_size(&self, method: &Method, path: &str) -> usize {
        self.body_limits
            .iter()
            .find(|limit| limit.methods.matches(method) && limit.pattern.matches(path).is_some())
            .map(|limit| limit.max_bytes)
            .unwrap_or(self.default_max_body)
    }

    pub fn bindings(&self) -> &[RouteBinding] {
        &self.bindings
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::schema::UploadTarget;
    use crate::plugins::{Extension, RouteContributor};
    use std::sync::Arc;

    struct Routed {
        protected: bool,
    }

    impl Extension for Routed {
        fn name(&self) -> &str {
            "routed"
        }

        fn as_route_contributor(&self) -> Option<&dyn RouteContributor> {
            Some(self)
        }
    }

    impl RouteContributor for Routed {
        fn routes(&self) -> Option<axum::Router> {
            Some(axum::Router::new())
        }

        fn is_protected(&self) -> bool {
            self.protected
        }
    }

    fn table_with(extensions: ExtensionRegistry) -> RouteTable {
        RouteTable::build(&ServerConfig::default(), &extensions).unwrap()
    }

    #[test]
    fn catch_all_is_last() {
        let table = table_with(ExtensionRegistry::empty());
        let last = table.bindings().last().unwrap();
        assert!(matches!(last.handler, RouteHandler::Fallback));
    }

    #[test]
    fn structural_route_wins_over_catch_all() {
        let table = table_with(ExtensionRegistry::empty());
        let matched = table
            .match_request(&Method::GET, "/downloads/timelapse/run.mpg")
            .unwrap();
        assert_eq!(matched.binding.name, "timelapse_download");
        assert_eq!(matched.captures, vec!["run.mpg"]);
    }

    #[test]
    fn unmatched_path_falls_through_to_catch_all() {
        let table = table_with(ExtensionRegistry::empty());
        let matched = table.match_request(&Method::POST, "/api/anything").unwrap();
        assert_eq!(matched.binding.name, "fallback");
    }

    #[test]
    fn log_downloads_require_admin() {
        let table = table_with(ExtensionRegistry::empty());
        let matched = table
            .match_request(&Method::GET, "/downloads/logs/server.log")
            .unwrap();
        assert_eq!(matched.binding.access, AccessPolicy::Admin);
    }

    #[test]
    fn protected_extension_routes_get_auth_and_cors() {
        let registry = ExtensionRegistry::new(vec![Arc::new(Routed { protected: true })]);
        let table = table_with(registry);
        let matched = table
            .match_request(&Method::POST, "/plugin/routed/action")
            .unwrap();
        assert_eq!(matched.binding.access, AccessPolicy::User);
        assert!(matched.binding.cors);
        // Extension routes still rank above the catch-all.
        assert_ne!(matched.binding.name, "fallback");
    }

    #[test]
    fn per_route_body_limit_overrides_default() {
        let mut config = ServerConfig::default();
        config.server.max_body_size = 1000;
        config.server.uploads.targets = vec![UploadTarget {
            method: "POST".to_string(),
            path_prefix: "/api/files/".to_string(),
            max_body_size: Some(100),
        }];
        let table = RouteTable::build(&config, &ExtensionRegistry::empty()).unwrap();

        assert_eq!(table.max_body_size(&Method::POST, "/api/files/local"), 100);
        assert_eq!(table.max_body_size(&Method::GET, "/api/files/local"), 1000);
        assert_eq!(table.max_body_size(&Method::POST, "/api/other"), 1000);
    }
}
