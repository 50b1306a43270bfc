//! Retry policy and HTTP status classification for repository requests.

use reqwest::StatusCode;
use thiserror::Error;

/// Maximum number of attempts for a retried download.
pub const MAX_RETRIES: usize = 3;

/// Delay between retry attempts in milliseconds.
pub const RETRY_DELAY_MS: u64 = 1000;

/// Errors that should not be retried.
#[derive(Debug, Error)]
pub enum NonRetryableError {
    /// HTTP 429
    #[error("Rate limit exceeded: {0}. Try again later.")]
    RateLimitExceeded(String),
    /// HTTP 401
    #[error("Authentication failed: {0}. Check your ARTRES_TOKEN.")]
    AuthenticationFailed(String),
    /// HTTP 404; for a repository probe this means "not in this index".
    #[error("Not found: {0}")]
    NotFound(String),
    /// HTTP 403
    #[error("Access forbidden: {0}. You may need authentication.")]
    Forbidden(String),
    /// Other client errors that won't succeed on retry
    #[error("Request error: {0}")]
    ClientError(String),
}

/// Classifies an error as retryable or non-retryable.
/// Returns Ok(()) if the error is retryable, Err with a user-friendly message if not.
pub fn classify_error(error: &reqwest::Error) -> Result<(), NonRetryableError> {
    let Some(status) = error.status() else {
        // Connection errors, timeouts, etc.
        return Ok(());
    };

    let url = error
        .url()
        .map(|u| u.to_string())
        .unwrap_or_else(|| "<unknown url>".to_string());

    match status {
        StatusCode::UNAUTHORIZED => Err(NonRetryableError::AuthenticationFailed(url)),
        StatusCode::FORBIDDEN => Err(NonRetryableError::Forbidden(url)),
        StatusCode::TOO_MANY_REQUESTS => Err(NonRetryableError::RateLimitExceeded(url)),
        StatusCode::NOT_FOUND => Err(NonRetryableError::NotFound(url)),
        s if s.is_client_error() => Err(NonRetryableError::ClientError(format!(
            "HTTP {} from {}",
            s.as_u16(),
            url
        ))),
        // 5xx
        _ => Ok(()),
    }
}

/// Converts an error from `error_for_status()` into an anyhow error, keeping
/// the original reqwest error when it is worth retrying.
pub fn check_retryable(error: reqwest::Error) -> anyhow::Error {
    match classify_error(&error) {
        Ok(()) => anyhow::Error::from(error),
        Err(non_retryable) => anyhow::Error::from(non_retryable),
    }
}

/// True if the error chain carries a 404 classification.
pub fn is_not_found(error: &anyhow::Error) -> bool {
    matches!(
        error.downcast_ref::<NonRetryableError>(),
        Some(NonRetryableError::NotFound(_))
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn status_error(status: usize) -> reqwest::Error {
        let mut server = mockito::Server::new_async().await;
        let _m = server
            .mock("GET", "/")
            .with_status(status)
            .create_async()
            .await;

        let client = reqwest::Client::new();
        let response = client.get(server.url()).send().await.unwrap();
        response.error_for_status().unwrap_err()
    }

    #[test]
    fn test_non_retryable_error_display() {
        let err = NonRetryableError::RateLimitExceeded("x".to_string());
        assert!(err.to_string().contains("Rate limit"));

        let err = NonRetryableError::AuthenticationFailed("x".to_string());
        assert!(err.to_string().contains("ARTRES_TOKEN"));

        let err = NonRetryableError::NotFound("https://repo/a.pom".to_string());
        assert_eq!(err.to_string(), "Not found: https://repo/a.pom");

        let err = NonRetryableError::ClientError("HTTP 400".to_string());
        assert!(err.to_string().contains("Request error: HTTP 400"));
    }

    #[tokio::test]
    async fn test_classify_error_statuses() {
        assert!(matches!(
            classify_error(&status_error(401).await),
            Err(NonRetryableError::AuthenticationFailed(_))
        ));
        assert!(matches!(
            classify_error(&status_error(403).await),
            Err(NonRetryableError::Forbidden(_))
        ));
        assert!(matches!(
            classify_error(&status_error(429).await),
            Err(NonRetryableError::RateLimitExceeded(_))
        ));
        assert!(matches!(
            classify_error(&status_error(404).await),
            Err(NonRetryableError::NotFound(_))
        ));
        assert!(matches!(
            classify_error(&status_error(400).await),
            Err(NonRetryableError::ClientError(_))
        ));
    }

    #[tokio::test]
    async fn test_classify_error_server_error_is_retryable() {
        assert!(classify_error(&status_error(500).await).is_ok());
        assert!(classify_error(&status_error(503).await).is_ok());
    }

    #[tokio::test]
    async fn test_check_retryable_and_not_found() {
        let err = check_retryable(status_error(404).await);
        assert!(err.downcast_ref::<NonRetryableError>().is_some());
        assert!(is_not_found(&err));

        let err = check_retryable(status_error(503).await);
        assert!(err.downcast_ref::<NonRetryableError>().is_none());
        assert!(!is_not_found(&err));
    }
}
