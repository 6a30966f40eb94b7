//! Session lifecycle: state store, expiry events, and startup bootstrap.
//!
//! This module provides:
//!
//! - `SessionStore`: process-wide session state and the actions that move it
//! - `SessionEvents`: broadcast channel for session-expired notifications
//! - `Bootstrapper`: initial routing and the expiry watcher task
//!
//! The access token itself lives in `auth`; everything here deals in the
//! user-visible side of the session.

pub mod bootstrap;
pub mod events;
pub mod store;

pub use bootstrap::{Bootstrapper, Route};
pub use events::{SessionEvent, SessionEvents};
pub use store::{Session, SessionPhase, SessionStore};
