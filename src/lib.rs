//! printdeck — web control panel for networked fabrication devices.
//!
//! # Architecture Overview
//!
//! ```text
//!                      ┌──────────────────────────────────────────────────┐
//!                      │                  CONTROL PANEL                    │
//!                      │                                                   │
//!   Client Request     │  ┌─────────┐    ┌──────────────┐                 │
//!   ───────────────────┼─▶│  http   │───▶│   routing    │                 │
//!                      │  │ server  │    │ (ordered     │                 │
//!                      │  └─────────┘    │  table)      │                 │
//!                      │                 └──────┬───────┘                 │
//!                      │        ┌───────────────┼──────────────┐          │
//!                      │        ▼               ▼              ▼          │
//!                      │  ┌──────────┐   ┌────────────┐  ┌───────────┐    │
//!                      │  │ identity │   │    ui      │  │ downloads │    │
//!                      │  │   gate   │   │ composer + │  │ uploads   │    │
//!                      │  └──────────┘   │ fragments  │  │ channel   │    │
//!                      │                 └─────┬──────┘  └───────────┘    │
//!                      │                       ▼                          │
//!                      │                 ┌────────────┐                   │
//!                      │                 │  plugins   │                   │
//!                      │                 │ (registry) │                   │
//!                      │                 └────────────┘                   │
//!                      │  ┌────────────────────────────────────────────┐  │
//!                      │  │            Cross-Cutting Concerns           │  │
//!                      │  │  ┌────────┐ ┌──────────┐ ┌───────────────┐ │  │
//!                      │  │  │ config │ │ managers │ │ observability │ │  │
//!                      │  │  └────────┘ └──────────┘ └───────────────┘ │  │
//!                      │  │  ┌─────────────────┐  ┌──────────────────┐ │  │
//!                      │  │  │      watch      │  │    lifecycle     │ │  │
//!                      │  │  │  (drop folder)  │  │ startup/shutdown │ │  │
//!                      │  │  └─────────────────┘  └──────────────────┘ │  │
//!                      │  └────────────────────────────────────────────┘  │
//!                      └──────────────────────────────────────────────────┘
//! ```

// Core subsystems
pub mod config;
pub mod context;
pub mod http;
pub mod routing;
pub mod ui;

// Extension system and collaborator seams
pub mod managers;
pub mod plugins;

// Cross-cutting concerns
pub mod identity;
pub mod lifecycle;
pub mod observability;
pub mod watch;

#[cfg(test)]
pub mod test_support;

pub use config::ServerConfig;
pub use context::{AppContext, VERSION};
pub use http::HttpServer;
pub use lifecycle::{Server, ServerError, Shutdown};
pub use plugins::ExtensionRegistry;
