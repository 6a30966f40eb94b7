//! Process-wide session state.
//!
//! `SessionStore` owns the `Session` value and is the only place that
//! mutates it. Actions mirror what the console can do: sign in, sign out,
//! re-validate the identity, and adjust display preferences. The display
//! subset (theme, timezone, notifications flag) survives restarts via the
//! preferences file; the user identity and the access token never touch
//! disk.

use std::path::PathBuf;
use std::sync::{Mutex, MutexGuard, RwLock, RwLockReadGuard, RwLockWriteGuard};

use tokio::sync::broadcast;
use tracing::{debug, info, warn};

use crate::api::{ApiClient, ApiError};
use crate::config::Preferences;
use crate::models::{SetupState, User};

use super::events::{SessionEvent, SessionEvents};

/// Where the session sits in its lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionPhase {
    Unauthenticated,
    /// A signin call is outstanding
    Authenticating,
    Authenticated,
}

/// Snapshot of session state handed to render layers.
#[derive(Debug, Clone, PartialEq)]
pub struct Session {
    pub user: Option<User>,
    pub theme: String,
    pub timezone: String,
    pub setup: SetupState,
    pub show_notifications: bool,
    pub phase: SessionPhase,
}

pub struct SessionStore {
    api: ApiClient,
    events: SessionEvents,
    state: RwLock<Session>,
    prefs: Mutex<Preferences>,
    config_dir: PathBuf,
}

impl SessionStore {
    /// Create the store, hydrating display preferences from disk.
    /// A missing or unreadable preference file falls back to defaults.
    pub fn new(api: ApiClient, events: SessionEvents, config_dir: PathBuf) -> Self {
        let prefs = match Preferences::load_from(&config_dir) {
            Ok(prefs) => prefs,
            Err(e) => {
                warn!(error = %e, "Failed to load preferences, using defaults");
                Preferences::default()
            }
        };

        let state = Session {
            user: None,
            theme: prefs.theme.clone(),
            timezone: prefs.timezone.clone(),
            setup: SetupState::default(),
            show_notifications: prefs.show_notifications,
            phase: SessionPhase::Unauthenticated,
        };

        Self {
            api,
            events,
            state: RwLock::new(state),
            prefs: Mutex::new(prefs),
            config_dir,
        }
    }

    // ===== Accessors =====

    /// Cloned snapshot for render layers
    pub fn snapshot(&self) -> Session {
        self.read_state().clone()
    }

    pub fn user(&self) -> Option<User> {
        self.read_state().user.clone()
    }

    pub fn phase(&self) -> SessionPhase {
        self.read_state().phase
    }

    pub fn setup(&self) -> SetupState {
        self.read_state().setup
    }

    /// Username persisted by an earlier "remember me" signin, for form prefill
    pub fn remembered_username(&self) -> Option<String> {
        self.lock_prefs().last_username.clone()
    }

    /// Subscribe to session events. Dropping the receiver unsubscribes.
    pub fn subscribe(&self) -> broadcast::Receiver<SessionEvent> {
        self.events.subscribe()
    }

    /// The API client bound to this session
    pub fn api(&self) -> &ApiClient {
        &self.api
    }

    // ===== Actions =====

    /// Exchange credentials for a session.
    ///
    /// The token call opts out of the renewal pipeline, so wrong credentials
    /// surface directly instead of triggering a renewal attempt. On success
    /// the token is installed and the identity fetched; the username is
    /// persisted only when `remember` is set, the password never.
    pub async fn signin(
        &self,
        username: &str,
        password: &str,
        remember: bool,
    ) -> Result<(), ApiError> {
        self.write_state().phase = SessionPhase::Authenticating;

        let token = match self.api.request_token(username, password).await {
            Ok(token) => token,
            Err(e) => {
                self.write_state().phase = SessionPhase::Unauthenticated;
                return Err(e);
            }
        };

        self.api.install_token(token);

        {
            let mut prefs = self.lock_prefs();
            prefs.last_username = remember.then(|| username.to_string());
            self.save_prefs(&prefs);
        }

        match self.refresh().await {
            Ok(()) => {
                info!(username, "signed in");
                Ok(())
            }
            Err(e) => {
                self.write_state().phase = SessionPhase::Unauthenticated;
                Err(e)
            }
        }
    }

    /// Terminate the session.
    ///
    /// The server-side call is best-effort; local state clears no matter
    /// what, so logging out never depends on network availability.
    pub async fn signout(&self) {
        if let Err(e) = self.api.terminate_session().await {
            debug!(error = %e, "signout request failed, clearing local state anyway");
        }

        self.api.clear_token();
        {
            let mut state = self.write_state();
            state.user = None;
            state.phase = SessionPhase::Unauthenticated;
        }
        info!("signed out");
    }

    /// Re-validate the identity behind the current token.
    ///
    /// On success the user is stored and the session is authenticated. On
    /// failure the error is returned and state is left untouched - what a
    /// failed refresh means is the caller's decision, not this method's.
    pub async fn refresh(&self) -> Result<(), ApiError> {
        let user = self.api.fetch_current_user().await?;
        debug!(username = %user.username, "identity confirmed");

        let mut state = self.write_state();
        state.user = Some(user);
        state.phase = SessionPhase::Authenticated;
        Ok(())
    }

    /// Replace the recorded setup state
    pub fn update_setup(&self, setup: SetupState) {
        self.write_state().setup = setup;
    }

    /// Switch the display theme and persist it
    pub fn update_theme(&self, theme: &str) {
        self.write_state().theme = theme.to_string();

        let mut prefs = self.lock_prefs();
        prefs.theme = theme.to_string();
        self.save_prefs(&prefs);
    }

    /// Switch the display timezone and persist it
    pub fn update_timezone(&self, timezone: &str) {
        self.write_state().timezone = timezone.to_string();

        let mut prefs = self.lock_prefs();
        prefs.timezone = timezone.to_string();
        self.save_prefs(&prefs);
    }

    /// Flip notifications visibility, persist it, and return the new value
    pub fn toggle_show_notifications(&self) -> bool {
        let visible = {
            let mut state = self.write_state();
            state.show_notifications = !state.show_notifications;
            state.show_notifications
        };

        let mut prefs = self.lock_prefs();
        prefs.show_notifications = visible;
        self.save_prefs(&prefs);
        visible
    }

    // ===== Lock Plumbing =====

    // Poisoning only means another thread panicked mid-write; the data is
    // plain values and stays usable.

    fn read_state(&self) -> RwLockReadGuard<'_, Session> {
        self.state
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn write_state(&self) -> RwLockWriteGuard<'_, Session> {
        self.state
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn lock_prefs(&self) -> MutexGuard<'_, Preferences> {
        self.prefs
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn save_prefs(&self, prefs: &Preferences) {
        if let Err(e) = prefs.save_to(&self.config_dir) {
            warn!(error = %e, "Failed to save preferences");
        }
    }
}
