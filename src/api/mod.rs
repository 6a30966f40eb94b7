//! REST API client module for the Quarterdeck backend.
//!
//! This module provides the `ApiClient` for communicating with the
//! backend, including the recovery pipeline that renews an expired
//! access token and replays the failed request exactly once.
//!
//! The API uses bearer token authentication; the renewal endpoint is
//! authenticated by an HTTP-only cookie instead of the bearer header.

pub mod client;
pub mod error;

pub use client::ApiClient;
pub use error::ApiError;
