//! HTTP client for the Quarterdeck REST backend.
//!
//! This module provides the `ApiClient` struct for making authenticated
//! API requests. Every request carries the current bearer token from the
//! shared `TokenSlot`, and the response pipeline recovers transparently
//! from token expiry: a 401 on an eligible request triggers one
//! single-flight renewal and one replay with the fresh token.

use std::sync::Arc;
use std::time::Duration;

use reqwest::{Client, Method, Response, StatusCode};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use tracing::debug;

use crate::auth::{RefreshCoordinator, TokenSlot};
use crate::models::{SetupState, User};
use crate::session::SessionEvents;

use super::ApiError;

// ============================================================================
// Constants
// ============================================================================

/// HTTP request timeout in seconds.
/// 30s allows for slow backend responses while failing fast enough that a
/// hung renewal cannot stall its waiters indefinitely.
const REQUEST_TIMEOUT_SECS: u64 = 30;

/// Credential token endpoint: POST exchanges username+password for an access
/// token, DELETE terminates the session server-side.
const TOKEN_PATH: &str = "/v1/auth/token";

/// Renewal endpoint. Credential-free: authenticated by the refresh cookie
/// held in the client's cookie store.
const REFRESH_PATH: &str = "/v1/auth/refresh";

/// Identity of the user the current access token belongs to.
const CURRENT_USER_PATH: &str = "/v1/users/me";

/// First-run setup readiness state.
const SETUP_PATH: &str = "/v1/setup";

/// Response envelope shared by the signin and renewal endpoints.
#[derive(Debug, Deserialize)]
pub(crate) struct TokenResponse {
    pub token: String,
}

/// API client for the Quarterdeck backend.
/// Clone is cheap - reqwest::Client uses Arc internally for connection
/// pooling, and the token slot and coordinator are shared handles.
#[derive(Clone)]
pub struct ApiClient {
    http: Client,
    base_url: String,
    token: TokenSlot,
    refresher: Arc<RefreshCoordinator>,
}

impl ApiClient {
    /// Create a new API client for the given backend base URL.
    ///
    /// The underlying `reqwest::Client` is shared with the refresh
    /// coordinator so the renewal call sees the refresh cookie set by
    /// signin.
    pub fn new(base_url: &str, events: SessionEvents) -> Result<Self, ApiError> {
        let http = Client::builder()
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .cookie_store(true)
            .build()?;

        let base_url = base_url.trim_end_matches('/').to_string();
        let token = TokenSlot::new();
        let refresher = Arc::new(RefreshCoordinator::new(
            http.clone(),
            format!("{}{}", base_url, REFRESH_PATH),
            token.clone(),
            events,
        ));

        Ok(Self {
            http,
            base_url,
            token,
            refresher,
        })
    }

    /// Install a bearer token for subsequent requests
    pub fn install_token(&self, token: String) {
        self.token.install(token);
    }

    /// Drop the bearer token; subsequent requests go out unauthenticated
    pub fn clear_token(&self) {
        self.token.clear();
    }

    pub fn has_token(&self) -> bool {
        self.token.is_present()
    }

    // ===== Request Pipeline =====

    /// Check if response is successful, returning an error with body if not.
    async fn check_response(response: Response) -> Result<Response, ApiError> {
        if response.status().is_success() {
            Ok(response)
        } else {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            Err(ApiError::from_status(status, &body))
        }
    }

    async fn parse_json<T: DeserializeOwned>(response: Response, path: &str) -> Result<T, ApiError> {
        response
            .json()
            .await
            .map_err(|e| ApiError::InvalidResponse(format!("{}: {}", path, e)))
    }

    /// Send a request, recovering from token expiry at most once.
    ///
    /// The request is rebuilt on every attempt so the bearer header is read
    /// fresh from the token slot. On a 401 with `refresh_access_token` set,
    /// the flag drops, one renewal is awaited, and the request is replayed
    /// with the new token; a renewal failure or a second 401 surfaces to the
    /// caller as the final outcome.
    async fn execute<B: Serialize + ?Sized>(
        &self,
        method: Method,
        path: &str,
        body: Option<&B>,
        mut refresh_access_token: bool,
    ) -> Result<Response, ApiError> {
        let url = format!("{}{}", self.base_url, path);

        loop {
            let mut request = self.http.request(method.clone(), &url);
            if let Some(token) = self.token.get() {
                request = request.bearer_auth(token);
            }
            if let Some(body) = body {
                request = request.json(body);
            }

            let response = request.send().await?;

            if response.status() == StatusCode::UNAUTHORIZED && refresh_access_token {
                refresh_access_token = false;
                if self.refresher.acquire_fresh_token().await.is_some() {
                    debug!(path, "replaying request with renewed token");
                    continue;
                }
                // Renewal failed: fall through with the original 401.
                debug!(path, "token renewal failed, surfacing the 401");
            }

            return Self::check_response(response).await;
        }
    }

    // ===== Generic JSON Methods =====

    /// GET a JSON resource, renewing the token on expiry
    pub async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T, ApiError> {
        let response = self.execute::<()>(Method::GET, path, None, true).await?;
        Self::parse_json(response, path).await
    }

    /// POST a JSON body, renewing the token on expiry
    pub async fn post<T: DeserializeOwned, B: Serialize + ?Sized>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<T, ApiError> {
        let response = self.execute(Method::POST, path, Some(body), true).await?;
        Self::parse_json(response, path).await
    }

    /// POST that never enters the renewal pipeline. A 401 here surfaces
    /// directly; used for the signin call, where wrong credentials must not
    /// trigger a renewal attempt.
    pub async fn post_without_refresh<T: DeserializeOwned, B: Serialize + ?Sized>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<T, ApiError> {
        let response = self.execute(Method::POST, path, Some(body), false).await?;
        Self::parse_json(response, path).await
    }

    /// DELETE that never enters the renewal pipeline, so the signout call
    /// cannot itself trigger a renewal attempt.
    pub async fn delete_without_refresh(&self, path: &str) -> Result<(), ApiError> {
        self.execute::<()>(Method::DELETE, path, None, false)
            .await?;
        Ok(())
    }

    // ===== Session Endpoints =====

    /// Exchange credentials for an access token.
    /// Does not install the token; the session store decides that.
    pub(crate) async fn request_token(
        &self,
        username: &str,
        password: &str,
    ) -> Result<String, ApiError> {
        let body = serde_json::json!({ "username": username, "password": password });
        let response: TokenResponse = self.post_without_refresh(TOKEN_PATH, &body).await?;
        Ok(response.token)
    }

    /// Terminate the session server-side
    pub(crate) async fn terminate_session(&self) -> Result<(), ApiError> {
        self.delete_without_refresh(TOKEN_PATH).await
    }

    /// Fetch the identity belonging to the current access token
    pub(crate) async fn fetch_current_user(&self) -> Result<User, ApiError> {
        self.get(CURRENT_USER_PATH).await
    }

    /// Fetch whether first-run setup has been completed
    pub(crate) async fn fetch_setup_state(&self) -> Result<SetupState, ApiError> {
        self.get(SETUP_PATH).await
    }
}
