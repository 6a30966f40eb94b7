//! Persisted user preferences.
//!
//! This module handles loading and saving the preference file, which holds
//! the display subset of session state - theme, timezone, notifications
//! visibility - plus the optionally remembered username. The access token
//! and the password are never written here or anywhere else on disk.
//!
//! Preferences are stored at `~/.config/quarterdeck/preferences.json`.

use std::path::{Path, PathBuf};

use anyhow::Result;
use serde::{Deserialize, Serialize};

/// Application name used for the config directory path
const APP_NAME: &str = "quarterdeck";

/// Preferences file name
const PREFERENCES_FILE: &str = "preferences.json";

/// Theme applied before the user picks one
const DEFAULT_THEME: &str = "system";

/// Timezone applied before the user picks one
const DEFAULT_TIMEZONE: &str = "UTC";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Preferences {
    pub theme: String,
    pub timezone: String,
    pub show_notifications: bool,
    pub last_username: Option<String>,
}

impl Default for Preferences {
    fn default() -> Self {
        Self {
            theme: DEFAULT_THEME.to_string(),
            timezone: DEFAULT_TIMEZONE.to_string(),
            show_notifications: true,
            last_username: None,
        }
    }
}

impl Preferences {
    /// Load preferences from the given directory, falling back to defaults
    /// when no file exists yet.
    pub fn load_from(dir: &Path) -> Result<Self> {
        let path = dir.join(PREFERENCES_FILE);
        if path.exists() {
            let contents = std::fs::read_to_string(&path)?;
            Ok(serde_json::from_str(&contents)?)
        } else {
            Ok(Self::default())
        }
    }

    pub fn save_to(&self, dir: &Path) -> Result<()> {
        std::fs::create_dir_all(dir)?;
        let contents = serde_json::to_string_pretty(self)?;
        std::fs::write(dir.join(PREFERENCES_FILE), contents)?;
        Ok(())
    }

    /// Platform default preferences directory
    pub fn default_dir() -> Result<PathBuf> {
        let config_dir = dirs::config_dir()
            .ok_or_else(|| anyhow::anyhow!("Could not find config directory"))?;
        Ok(config_dir.join(APP_NAME))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_file_loads_defaults() {
        let dir = tempfile::tempdir().expect("create temp dir");
        let prefs = Preferences::load_from(dir.path()).expect("load");
        assert_eq!(prefs, Preferences::default());
        assert_eq!(prefs.theme, "system");
        assert!(prefs.show_notifications);
    }

    #[test]
    fn test_default_dir_is_app_scoped() {
        let Ok(dir) = Preferences::default_dir() else {
            eprintln!("Skipping test: no platform config directory");
            return;
        };
        assert!(dir.ends_with(APP_NAME));
    }

    #[test]
    fn test_save_and_reload_round_trip() {
        let dir = tempfile::tempdir().expect("create temp dir");

        let prefs = Preferences {
            theme: "dark".to_string(),
            timezone: "Europe/Amsterdam".to_string(),
            show_notifications: false,
            last_username: Some("quartermaster".to_string()),
        };
        prefs.save_to(dir.path()).expect("save");

        let reloaded = Preferences::load_from(dir.path()).expect("reload");
        assert_eq!(reloaded, prefs);

        // The file must never contain a token or password field
        let raw = std::fs::read_to_string(dir.path().join("preferences.json")).expect("read");
        assert!(!raw.contains("token"));
        assert!(!raw.contains("password"));
    }
}
