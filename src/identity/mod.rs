//! Identity subsystem.
//!
//! # Data Flow
//! ```text
//! Request headers/cookies
//!     → http::request (extract token + session state)
//!     → gate.rs (resolve to Identity, expand roles once)
//!     → routing access policies (authorize per route)
//! ```
//!
//! # Design Decisions
//! - Authentication absence is not an error: anonymous identities flow
//!   through with an empty role set and downstream checks fail closed
//! - The user manager comes from a closed registry; no dynamic resolution

pub mod gate;
pub mod users;

pub use gate::{Identity, IdentityGate, Role, SessionState, API_TOKEN};
pub use users::{build_user_manager, ConfigUserManager, UserManager, UserRecord};
