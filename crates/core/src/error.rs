//! Error types for the external collaborators.
//!
//! Uses `thiserror` for ergonomic error definitions. Each external service
//! has its own error enum; crate-local failures (corpus, synthesis, structure)
//! live next to the code that raises them.

use std::time::Duration;

use thiserror::Error;

use crate::retry::Retryable;

/// Errors returned by a generation [`Provider`](crate::Provider).
#[derive(Debug, Clone, Error)]
pub enum ProviderError {
    #[error("API request failed: {message} (status: {status_code})")]
    ApiError {
        status_code: u16,
        message: String,
    },

    #[error("Rate limited by provider, retry after {retry_after_secs}s")]
    RateLimited { retry_after_secs: u64 },

    #[error("Authentication failed: {0}")]
    AuthenticationFailed(String),

    #[error("Malformed provider response: {0}")]
    MalformedResponse(String),

    #[error("Provider not configured: {0}")]
    NotConfigured(String),

    #[error("Request timed out: {0}")]
    Timeout(String),

    #[error("Network error: {0}")]
    Network(String),

    #[error("Request cancelled")]
    Cancelled,
}

impl ProviderError {
    /// Whether the failure is worth another attempt.
    pub fn is_transient(&self) -> bool {
        match self {
            Self::RateLimited { .. }
            | Self::Timeout(_)
            | Self::Network(_)
            | Self::MalformedResponse(_) => true,
            Self::ApiError { status_code, .. } => *status_code >= 500,
            Self::AuthenticationFailed(_) | Self::NotConfigured(_) | Self::Cancelled => false,
        }
    }
}

impl Retryable for ProviderError {
    fn is_transient(&self) -> bool {
        ProviderError::is_transient(self)
    }

    fn retry_after(&self) -> Option<Duration> {
        match self {
            Self::RateLimited { retry_after_secs } => Some(Duration::from_secs(*retry_after_secs)),
            _ => None,
        }
    }

    fn timed_out(after: Duration) -> Self {
        Self::Timeout(format!("no response after {}s", after.as_secs()))
    }

    fn cancelled() -> Self {
        Self::Cancelled
    }
}

/// Errors returned by a [`ReferenceService`](crate::ReferenceService).
#[derive(Debug, Clone, Error)]
pub enum LookupError {
    #[error("No reference found for '{0}'")]
    NotFound(String),

    #[error("Rate limited by reference service, retry after {retry_after_secs}s")]
    RateLimited { retry_after_secs: u64 },

    #[error("Reference lookup timed out: {0}")]
    Timeout(String),

    #[error("Network error: {0}")]
    Network(String),

    #[error("Reference service error: {message} (status: {status_code})")]
    Api { status_code: u16, message: String },

    #[error("Authentication failed: {0}")]
    AuthenticationFailed(String),

    #[error("Malformed reference record: {0}")]
    Malformed(String),

    #[error("Reference service not configured")]
    NotConfigured,

    #[error("Lookup cancelled")]
    Cancelled,
}

impl Retryable for LookupError {
    fn is_transient(&self) -> bool {
        match self {
            Self::RateLimited { .. } | Self::Timeout(_) | Self::Network(_) => true,
            Self::Api { status_code, .. } => *status_code >= 500,
            Self::NotFound(_)
            | Self::AuthenticationFailed(_)
            | Self::Malformed(_)
            | Self::NotConfigured
            | Self::Cancelled => false,
        }
    }

    fn retry_after(&self) -> Option<Duration> {
        match self {
            Self::RateLimited { retry_after_secs } => Some(Duration::from_secs(*retry_after_secs)),
            _ => None,
        }
    }

    fn timed_out(after: Duration) -> Self {
        Self::Timeout(format!("no response after {}s", after.as_secs()))
    }

    fn cancelled() -> Self {
        Self::Cancelled
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn provider_error_displays_correctly() {
        let err = ProviderError::ApiError {
            status_code: 429,
            message: "Too many requests".into(),
        };
        assert!(err.to_string().contains("429"));
        assert!(err.to_string().contains("Too many requests"));
    }

    #[test]
    fn server_errors_are_transient_client_errors_are_not() {
        let server = ProviderError::ApiError {
            status_code: 503,
            message: "unavailable".into(),
        };
        let client = ProviderError::ApiError {
            status_code: 400,
            message: "bad request".into(),
        };
        assert!(server.is_transient());
        assert!(!client.is_transient());
        assert!(!ProviderError::AuthenticationFailed("bad key".into()).is_transient());
    }

    #[test]
    fn not_found_is_permanent() {
        let err = LookupError::NotFound("Pricing the Internet".into());
        assert!(!Retryable::is_transient(&err));
        assert!(err.to_string().contains("Pricing the Internet"));
    }

    #[test]
    fn rate_limit_carries_retry_hint() {
        let err = LookupError::RateLimited {
            retry_after_secs: 7,
        };
        assert_eq!(err.retry_after(), Some(Duration::from_secs(7)));
        assert!(Retryable::is_transient(&err));
    }
}
