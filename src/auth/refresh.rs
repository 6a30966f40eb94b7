//! Single-flight access-token renewal.
//!
//! At most one renewal request exists process-wide at any instant. The
//! renewal in progress is held as a shared future: every caller that needs a
//! fresh token either starts the renewal or joins the one already running,
//! and all of them observe the same outcome.

use std::sync::Arc;

use futures::future::{BoxFuture, Shared};
use futures::FutureExt;
use reqwest::Client;
use tokio::sync::Mutex;
use tracing::{debug, warn};

use crate::api::client::TokenResponse;
use crate::api::ApiError;
use crate::auth::token::{mask_token, TokenSlot};
use crate::session::SessionEvents;

/// A renewal in progress. Cloned by every concurrent caller; resolves to the
/// new token, or `None` when the session could not be renewed.
type PendingRenewal = Shared<BoxFuture<'static, Option<String>>>;

pub struct RefreshCoordinator {
    http: Client,
    refresh_url: String,
    token: TokenSlot,
    events: SessionEvents,
    /// Single-flight marker: `Some` exactly while a renewal request is
    /// outstanding. The runtime is multi-threaded, so check-and-install must
    /// happen under this lock; the lock is never held across the renewal
    /// await itself.
    in_flight: Arc<Mutex<Option<PendingRenewal>>>,
}

impl RefreshCoordinator {
    pub fn new(http: Client, refresh_url: String, token: TokenSlot, events: SessionEvents) -> Self {
        Self {
            http,
            refresh_url,
            token,
            events,
            in_flight: Arc::new(Mutex::new(None)),
        }
    }

    /// Obtain a fresh access token after an authentication failure.
    ///
    /// Joins the renewal already in flight when one exists, otherwise starts
    /// one. Returns `None` when renewal failed; by then the session-expired
    /// event has fired exactly once for that failure.
    pub async fn acquire_fresh_token(&self) -> Option<String> {
        let renewal = {
            let mut in_flight = self.in_flight.lock().await;
            match in_flight.as_ref() {
                Some(pending) => {
                    debug!("token renewal already in flight, joining");
                    pending.clone()
                }
                None => {
                    let pending = self.start_renewal();
                    *in_flight = Some(pending.clone());
                    pending
                }
            }
        };
        // Lock released before this await so late arrivals can still join.
        renewal.await
    }

    /// Build the renewal future that becomes the in-flight marker. It
    /// advances only while some caller awaits it; on completion it has
    /// installed the token or emitted session-expired, and it clears the
    /// marker before resolving.
    fn start_renewal(&self) -> PendingRenewal {
        let http = self.http.clone();
        let url = self.refresh_url.clone();
        let token = self.token.clone();
        let events = self.events.clone();
        let in_flight = Arc::clone(&self.in_flight);

        async move {
            let outcome = match Self::request_renewal(&http, &url).await {
                Ok(fresh) => {
                    token.install(fresh.clone());
                    debug!(token = %mask_token(&fresh), "access token renewed");
                    Some(fresh)
                }
                Err(e) => {
                    warn!(error = %e, "token renewal failed");
                    events.emit_expired();
                    None
                }
            };
            // Clear the marker before resolving so a caller arriving after
            // completion starts a new renewal instead of reusing this one.
            in_flight.lock().await.take();
            outcome
        }
        .boxed()
        .shared()
    }

    /// Issue the one renewal request. Credential-free: the refresh cookie in
    /// the shared client's cookie store authenticates it. Sent outside the
    /// retry pipeline, so a 401 here can never recurse into another renewal.
    async fn request_renewal(http: &Client, url: &str) -> Result<String, ApiError> {
        let response = http.post(url).send().await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(ApiError::from_status(status, &body));
        }

        let body: TokenResponse = response
            .json()
            .await
            .map_err(|e| ApiError::InvalidResponse(format!("renewal response: {}", e)))?;
        Ok(body.token)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::SessionEvent;
    use anyhow::{bail, Result};
    use serde_json::json;
    use std::net::TcpListener;
    use std::time::Duration;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn can_bind_localhost() -> bool {
        TcpListener::bind("127.0.0.1:0").is_ok()
    }

    fn coordinator_for(server: &MockServer, token: TokenSlot, events: SessionEvents) -> RefreshCoordinator {
        RefreshCoordinator::new(
            Client::new(),
            format!("{}/v1/auth/refresh", server.uri()),
            token,
            events,
        )
    }

    #[tokio::test]
    async fn test_concurrent_callers_share_one_renewal() -> Result<()> {
        if !can_bind_localhost() {
            eprintln!("Skipping test: cannot bind localhost");
            return Ok(());
        }
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/v1/auth/refresh"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(json!({ "token": "tok-renewed-0123456789" }))
                    .set_delay(Duration::from_millis(150)),
            )
            .expect(1)
            .mount(&server)
            .await;

        let token = TokenSlot::new();
        token.install("tok-stale".to_string());
        let events = SessionEvents::new();
        let mut rx = events.subscribe();
        let coordinator = coordinator_for(&server, token.clone(), events);

        let (a, b, c) = tokio::join!(
            coordinator.acquire_fresh_token(),
            coordinator.acquire_fresh_token(),
            coordinator.acquire_fresh_token(),
        );

        assert_eq!(a.as_deref(), Some("tok-renewed-0123456789"));
        assert_eq!(a, b);
        assert_eq!(b, c);
        assert_eq!(token.get().as_deref(), Some("tok-renewed-0123456789"));
        assert!(rx.try_recv().is_err(), "success must not emit session-expired");

        let Some(requests) = server.received_requests().await else {
            bail!("wiremock request recording is disabled");
        };
        let renewals = requests
            .iter()
            .filter(|request| request.url.path() == "/v1/auth/refresh")
            .count();
        assert_eq!(renewals, 1, "expected a single renewal call for all waiters");
        Ok(())
    }

    #[tokio::test]
    async fn test_completed_renewal_is_not_reused() -> Result<()> {
        if !can_bind_localhost() {
            eprintln!("Skipping test: cannot bind localhost");
            return Ok(());
        }
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/v1/auth/refresh"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(json!({ "token": "tok-next" })),
            )
            .expect(2)
            .mount(&server)
            .await;

        let coordinator = coordinator_for(&server, TokenSlot::new(), SessionEvents::new());

        // Sequential calls must each renew: the marker is cleared on completion.
        assert!(coordinator.acquire_fresh_token().await.is_some());
        assert!(coordinator.acquire_fresh_token().await.is_some());

        let Some(requests) = server.received_requests().await else {
            bail!("wiremock request recording is disabled");
        };
        assert_eq!(requests.len(), 2);
        Ok(())
    }

    #[tokio::test]
    async fn test_failed_renewal_emits_expired_once() -> Result<()> {
        if !can_bind_localhost() {
            eprintln!("Skipping test: cannot bind localhost");
            return Ok(());
        }
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/v1/auth/refresh"))
            .respond_with(ResponseTemplate::new(401).set_delay(Duration::from_millis(100)))
            .expect(1)
            .mount(&server)
            .await;

        let token = TokenSlot::new();
        token.install("tok-stale".to_string());
        let events = SessionEvents::new();
        let mut rx = events.subscribe();
        let coordinator = coordinator_for(&server, token.clone(), events);

        let (a, b) = tokio::join!(
            coordinator.acquire_fresh_token(),
            coordinator.acquire_fresh_token(),
        );
        assert_eq!(a, None);
        assert_eq!(b, None);

        assert!(matches!(rx.try_recv(), Ok(SessionEvent::Expired)));
        assert!(
            rx.try_recv().is_err(),
            "expired must fire once per failed renewal, not once per waiter"
        );
        // A failed renewal never installs anything
        assert_eq!(token.get().as_deref(), Some("tok-stale"));
        Ok(())
    }
}
