use serde::{Deserialize, Serialize};

/// First-run setup readiness, as returned by the setup-state endpoint.
/// Until setup is complete the application routes every load to the setup
/// flow, regardless of authentication state.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "ts", derive(ts_rs::TS))]
#[cfg_attr(feature = "ts", ts(export))]
pub struct SetupState {
    #[serde(default)]
    pub completed: bool,
}

impl SetupState {
    pub fn complete() -> Self {
        Self { completed: true }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_setup_state() {
        let state: SetupState =
            serde_json::from_str(r#"{ "completed": false }"#).expect("Failed to parse setup JSON");
        assert!(!state.completed);

        // Default shape is incomplete
        assert!(!SetupState::default().completed);
        assert!(SetupState::complete().completed);
    }
}
