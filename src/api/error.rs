use thiserror::Error;

#[derive(Error, Debug)]
pub enum ApiError {
    #[error("Access denied: {0}")]
    AccessDenied(String),

    #[error("Unauthorized - access token missing or expired")]
    Unauthorized,

    #[error("Validation failed: {0}")]
    Validation(String),

    #[error("Resource not found: {0}")]
    NotFound(String),

    #[error("Server error: {0}")]
    ServerError(String),

    #[error("Network error: {0}")]
    NetworkError(#[from] reqwest::Error),

    #[error("Invalid response: {0}")]
    InvalidResponse(String),
}

/// Maximum length for error response bodies in error messages
const MAX_ERROR_BODY_LENGTH: usize = 500;

impl ApiError {
    /// Truncate a response body to avoid logging excessive data.
    /// The cut must land on a char boundary; bodies are arbitrary text and
    /// a multibyte character may straddle the limit.
    fn truncate_body(body: &str) -> String {
        if body.len() <= MAX_ERROR_BODY_LENGTH {
            return body.to_string();
        }
        let mut cut = MAX_ERROR_BODY_LENGTH;
        while !body.is_char_boundary(cut) {
            cut -= 1;
        }
        format!(
            "{}... (truncated, {} total bytes)",
            &body[..cut],
            body.len()
        )
    }

    pub fn from_status(status: reqwest::StatusCode, body: &str) -> Self {
        let truncated = Self::truncate_body(body);
        match status.as_u16() {
            401 => ApiError::Unauthorized,
            403 => ApiError::AccessDenied(truncated),
            404 => ApiError::NotFound(truncated),
            422 => ApiError::Validation(truncated),
            500..=599 => ApiError::ServerError(truncated),
            _ => ApiError::InvalidResponse(format!("Status {}: {}", status, truncated)),
        }
    }

    /// True for failures caused by the credentials themselves (signin 401/422).
    /// These are surfaced to the caller as-is and never retried.
    pub fn is_credential_error(&self) -> bool {
        matches!(self, ApiError::Unauthorized | ApiError::Validation(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_short_body_passes_through() {
        let err = ApiError::from_status(reqwest::StatusCode::FORBIDDEN, "nope");
        match err {
            ApiError::AccessDenied(message) => assert_eq!(message, "nope"),
            other => panic!("expected AccessDenied, got {:?}", other),
        }
    }

    #[test]
    fn test_long_body_truncates_on_char_boundary() {
        // A two-byte character straddles the truncation limit
        let mut body = "a".repeat(MAX_ERROR_BODY_LENGTH - 1);
        body.push('é');
        body.push_str(&"b".repeat(100));

        let err = ApiError::from_status(reqwest::StatusCode::FORBIDDEN, &body);
        match err {
            ApiError::AccessDenied(message) => {
                assert!(message.starts_with(&"a".repeat(MAX_ERROR_BODY_LENGTH - 1)));
                assert!(!message.contains('é'));
                assert!(message.ends_with(&format!("(truncated, {} total bytes)", body.len())));
            }
            other => panic!("expected AccessDenied, got {:?}", other),
        }
    }
}
