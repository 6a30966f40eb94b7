//! Shared access-token cell.
//!
//! The current bearer token lives in a single `TokenSlot` that is read by
//! every request builder and written on signin, renewal, and signout. The
//! slot is the one explicit home for the credential; nothing else in the
//! crate caches a copy of it.

use std::sync::{Arc, RwLock};

/// Shared cell holding the current access token, if any.
/// Clone is cheap - clones share the same underlying value.
#[derive(Clone, Debug, Default)]
pub struct TokenSlot {
    inner: Arc<RwLock<Option<String>>>,
}

impl TokenSlot {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the stored token. Called on signin and on successful renewal.
    pub fn install(&self, token: String) {
        *self.write_guard() = Some(token);
    }

    /// Drop the stored token. Called on signout.
    pub fn clear(&self) {
        *self.write_guard() = None;
    }

    /// Current token, cloned out so no lock is held by the caller.
    pub fn get(&self) -> Option<String> {
        self.inner
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }

    pub fn is_present(&self) -> bool {
        self.inner
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .is_some()
    }

    fn write_guard(&self) -> std::sync::RwLockWriteGuard<'_, Option<String>> {
        // A poisoned lock only means a writer panicked mid-store; the slot
        // itself is still a plain Option and safe to reuse.
        self.inner
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

/// Shorten a token for log output. Never log tokens whole.
pub fn mask_token(token: &str) -> String {
    if token.len() <= 16 {
        return "***".to_string();
    }
    // Tokens are opaque and may contain multibyte characters; the prefix
    // cut must land on a char boundary.
    let mut cut = 12;
    while !token.is_char_boundary(cut) {
        cut -= 1;
    }
    format!("{}...", &token[..cut])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_slot_install_and_clear() {
        let slot = TokenSlot::new();
        assert!(!slot.is_present());
        assert_eq!(slot.get(), None);

        slot.install("tok-1".to_string());
        assert!(slot.is_present());
        assert_eq!(slot.get().as_deref(), Some("tok-1"));

        // Clones observe the same value
        let other = slot.clone();
        other.install("tok-2".to_string());
        assert_eq!(slot.get().as_deref(), Some("tok-2"));

        slot.clear();
        assert!(!other.is_present());
    }

    #[test]
    fn test_mask_token() {
        assert_eq!(mask_token("short"), "***");
        assert_eq!(mask_token("0123456789abcdef"), "***");
        assert_eq!(mask_token("0123456789abcdef0123"), "0123456789ab...");
        // A multibyte character across the prefix cut backs off to the
        // previous boundary instead of slicing mid-character
        assert_eq!(mask_token("0123456789aé-and-more-padding"), "0123456789a...");
    }
}
