//! Core library for the Quarterdeck admin console.
//!
//! Everything here serves one job: keep a bearer access token valid across
//! any number of concurrently in-flight API calls, renew it exactly once
//! when it expires, and walk the application into a signed-out state when
//! renewal is no longer possible.
//!
//! The pieces, leaves first:
//!
//! - [`auth::TokenSlot`]: the single in-memory home of the access token
//! - [`auth::RefreshCoordinator`]: single-flight token renewal
//! - [`api::ApiClient`]: HTTP wrapper that recovers from an expired token
//!   with one renewal and one replay
//! - [`session::SessionStore`]: session state and the signin, signout,
//!   refresh, and preference actions
//! - [`session::Bootstrapper`]: initial routing and the watcher that turns
//!   session expiry into a signout
//!
//! Hosts construct one `SessionEvents`, hand it to `ApiClient::new` and
//! `SessionStore::new` (pointing the store at `Preferences::default_dir()`
//! or a directory of their own), wrap the store in an `Arc`, and let
//! `Bootstrapper` take it from there.

pub mod api;
pub mod auth;
pub mod config;
pub mod models;
pub mod session;

pub use api::{ApiClient, ApiError};
pub use auth::{RefreshCoordinator, TokenSlot};
pub use config::Preferences;
pub use models::{SetupState, User};
pub use session::{
    Bootstrapper, Route, Session, SessionEvent, SessionEvents, SessionPhase, SessionStore,
};
