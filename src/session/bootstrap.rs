//! Startup sequence and session-expiry reaction.
//!
//! `Bootstrapper` runs once per application load. It decides which surface
//! to show before any protected content renders, and it holds the one
//! process-lifetime subscription that turns a session-expired signal into
//! an actual signout.

use std::sync::Arc;

use tokio::sync::broadcast::error::RecvError;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::api::ApiError;

use super::events::SessionEvent;
use super::store::SessionStore;

/// Surface to show once bootstrap completes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Route {
    /// First-run setup is incomplete; nothing else is reachable
    Setup,
    /// Nobody is signed in. `origin` is where the user was headed, so the
    /// login flow can send them back there afterwards.
    Login { origin: Option<String> },
    /// Setup is done and a user is present
    Home,
}

pub struct Bootstrapper {
    store: Arc<SessionStore>,
}

impl Bootstrapper {
    pub fn new(store: Arc<SessionStore>) -> Self {
        Self { store }
    }

    /// Decide the initial route.
    ///
    /// The setup-state fetch is load-bearing: without it no route can be
    /// chosen, so its failure comes back as an error and the host should
    /// show its fatal screen. The refresh attempt is not - failing to
    /// resume a session just means nobody is signed in yet.
    pub async fn run(&self, origin: Option<String>) -> Result<Route, ApiError> {
        let setup = self.store.api().fetch_setup_state().await?;
        self.store.update_setup(setup);

        if let Err(e) = self.store.refresh().await {
            debug!(error = %e, "no session to resume");
        }

        let route = if !setup.completed {
            Route::Setup
        } else if self.store.user().is_none() {
            Route::Login { origin }
        } else {
            Route::Home
        };
        info!(?route, "bootstrap complete");
        Ok(route)
    }

    /// Spawn the task that answers session expiry with a signout.
    ///
    /// The subscription is taken before the task starts, so an expiry
    /// emitted right after this call cannot slip past it. The task runs for
    /// the application's lifetime; the handle is returned so hosts can
    /// abort it on shutdown.
    pub fn spawn_expiry_watcher(&self) -> JoinHandle<()> {
        let mut rx = self.store.subscribe();
        let store = Arc::clone(&self.store);

        tokio::spawn(async move {
            loop {
                match rx.recv().await {
                    Ok(SessionEvent::Expired) => {
                        // Repeated expiries collapse: once the user is
                        // cleared there is nothing left to sign out.
                        if store.user().is_some() {
                            warn!("session expired, signing out");
                            store.signout().await;
                        }
                    }
                    Err(RecvError::Lagged(skipped)) => {
                        debug!(skipped, "expiry watcher lagged behind");
                    }
                    Err(RecvError::Closed) => break,
                }
            }
        })
    }
}
