use std::sync::LazyLock;

use regex::Regex;

/// Result alias used throughout the crate.
pub type Result<T, E = GenAiError> = std::result::Result<T, E>;

#[derive(Debug, thiserror::Error)]
pub enum GenAiError {
    /// Missing or invalid construction parameters for the selected mode.
    #[error("configuration error: {0}")]
    Config(String),

    #[error("invalid request: {0}")]
    InvalidRequest(String),

    /// Non-success response from the generative API.
    #[error("GenAI API error{}: {message}", http_status_suffix(.status))]
    Provider { status: Option<u16>, message: String },

    #[error("GenAI transport error: {0}")]
    Http(#[from] reqwest::Error),

    /// Token acquisition through ambient credentials failed.
    #[error("credential error: {0}")]
    Auth(String),

    #[error(
        "AI model returned empty response (finish_reason: {}, block_reason: {})",
        or_dash(.finish_reason),
        or_dash(.block_reason)
    )]
    EmptyResponse {
        finish_reason: Option<String>,
        block_reason: Option<String>,
    },

    #[error("failed to load image: {0}")]
    ImageLoad(String),
}

impl GenAiError {
    /// Whether the retry policy may attempt the call again.
    ///
    /// Every failure that happened after the request left the process is
    /// retryable, including empty responses. Local failures are not.
    pub fn is_retryable(&self) -> bool {
        match self {
            GenAiError::Provider { .. }
            | GenAiError::Http(_)
            | GenAiError::Auth(_)
            | GenAiError::EmptyResponse { .. } => true,
            GenAiError::Config(_)
            | GenAiError::InvalidRequest(_)
            | GenAiError::ImageLoad(_) => false,
        }
    }

    pub fn is_empty_response(&self) -> bool {
        matches!(self, GenAiError::EmptyResponse { .. })
    }

    pub fn status(&self) -> Option<u16> {
        match self {
            GenAiError::Provider { status, .. } => *status,
            GenAiError::Http(e) => e.status().map(|s| s.as_u16()),
            _ => None,
        }
    }
}

fn http_status_suffix(status: &Option<u16>) -> String {
    status.map(|s| format!(" (HTTP {})", s)).unwrap_or_default()
}

fn or_dash(value: &Option<String>) -> &str {
    value.as_deref().unwrap_or("-")
}

static SENSITIVE_PATTERNS: LazyLock<[Regex; 4]> = LazyLock::new(|| {
    [
        r"AIza[0-9A-Za-z_\-]{20,}",
        r"Bearer [0-9A-Za-z_\-\.]+",
        r"ya29\.[0-9A-Za-z_\-\.]+",
        r"key=[0-9A-Za-z_\-]+",
    ]
    .map(|pattern| Regex::new(pattern).expect("sensitive pattern must compile"))
});

/// Strip things that look like credentials out of provider error text before
/// it is logged or surfaced.
pub fn sanitize_error_message(message: &str) -> String {
    let mut sanitized = message.to_string();

    for regex in SENSITIVE_PATTERNS.iter() {
        sanitized = regex.replace_all(&sanitized, "[REDACTED]").into_owned();
    }

    if sanitized.chars().count() > 500 {
        let truncated: String = sanitized.chars().take(497).collect();
        sanitized = format!("{}...", truncated);
    }

    sanitized
}

/// Show only the first few characters of a secret.
pub fn mask_secret(secret: &str) -> String {
    if secret.is_empty() {
        return String::new();
    }
    let prefix: String = secret.chars().take(4).collect();
    format!("{}...", prefix)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_retryable_classification() {
        assert!(GenAiError::Provider {
            status: Some(503),
            message: "unavailable".into(),
        }
        .is_retryable());
        assert!(GenAiError::Provider {
            status: Some(400),
            message: "bad".into(),
        }
        .is_retryable());
        assert!(GenAiError::Auth("no token".into()).is_retryable());
        assert!(GenAiError::EmptyResponse {
            finish_reason: Some("SAFETY".into()),
            block_reason: None,
        }
        .is_retryable());

        assert!(!GenAiError::Config("missing key".into()).is_retryable());
        assert!(!GenAiError::InvalidRequest("empty prompt".into()).is_retryable());
        assert!(!GenAiError::ImageLoad("garbage".into()).is_retryable());
    }

    #[test]
    fn test_provider_error_display() {
        let err = GenAiError::Provider {
            status: Some(429),
            message: "quota".into(),
        };
        assert_eq!(err.to_string(), "GenAI API error (HTTP 429): quota");
        assert_eq!(err.status(), Some(429));

        let err = GenAiError::Provider {
            status: None,
            message: "boom".into(),
        };
        assert_eq!(err.to_string(), "GenAI API error: boom");
    }

    #[test]
    fn test_empty_response_display() {
        let err = GenAiError::EmptyResponse {
            finish_reason: Some("SAFETY".into()),
            block_reason: None,
        };
        assert!(err.is_empty_response());
        assert!(err.to_string().contains("empty response"));
        assert!(err.to_string().contains("SAFETY"));
    }

    #[test]
    fn test_sanitize_error_message() {
        let message = "API key not valid: AIzaSyA1234567890abcdefghijklmnop";
        let sanitized = sanitize_error_message(message);
        assert!(sanitized.contains("[REDACTED]"));
        assert!(!sanitized.contains("AIzaSyA1234567890"));

        let message = "Authorization: Bearer ya29.a0AfH6SMBx";
        assert!(!sanitize_error_message(message).contains("ya29"));
    }

    #[test]
    fn test_sanitize_redacts_every_pattern_in_one_message() {
        let message = "key=abc123 then Bearer tok.en and AIzaSyA1234567890abcdefghijklmnop";
        let sanitized = sanitize_error_message(message);
        assert_eq!(sanitized.matches("[REDACTED]").count(), 3);
        assert!(!sanitized.contains("abc123"));
    }

    #[test]
    fn test_sanitize_truncates_long_messages() {
        let long = "x".repeat(1000);
        let sanitized = sanitize_error_message(&long);
        assert_eq!(sanitized.chars().count(), 500);
        assert!(sanitized.ends_with("..."));
    }

    #[test]
    fn test_mask_secret() {
        assert_eq!(mask_secret("abcdef123"), "abcd...");
        assert_eq!(mask_secret(""), "");
    }
}
