//! Authentication primitives: the shared token cell and the single-flight
//! renewal coordinator.
//!
//! This module provides:
//! - `TokenSlot`: the one in-memory home of the current access token
//! - `RefreshCoordinator`: at-most-one-renewal-in-flight protocol
//!
//! Session-level concerns (user identity, signin and signout) live in
//! `session`; nothing in this module ever touches disk.

pub mod refresh;
pub mod token;

pub use refresh::RefreshCoordinator;
pub use token::{mask_token, TokenSlot};
