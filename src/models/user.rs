use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Identity of the user the current access token belongs to, as returned by
/// the current-user endpoint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "ts", derive(ts_rs::TS))]
#[cfg_attr(feature = "ts", ts(export))]
pub struct User {
    pub id: i64,
    pub username: String,
    pub name: Option<String>,
    pub email: Option<String>,
    #[serde(rename = "isAdmin", default)]
    pub is_admin: bool,
    #[serde(rename = "lastLoginAt")]
    pub last_login_at: Option<DateTime<Utc>>,
}

impl User {
    /// Name to show in the interface, falling back to the username
    pub fn display_name(&self) -> &str {
        self.name.as_deref().unwrap_or(&self.username)
    }
}
