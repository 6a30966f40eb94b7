//! Data models for Quarterdeck entities.
//!
//! This module contains the data structures shared with the backend:
//!
//! - `User`: the identity behind the current access token
//! - `SetupState`: first-run setup readiness

pub mod setup;
pub mod user;

pub use setup::SetupState;
pub use user::User;
