/// Shared outbound HTTP client and retry policy
///
/// Every upstream call (token endpoints, directory, registry) goes through a
/// single `reqwest::Client` with a bounded timeout, and through `retry`, which
/// re-sends on transient failures with exponential backoff.
use crate::{
    config::HttpConfig,
    error::{OnboardError, OnboardResult},
};
use reqwest::{Client, Response, StatusCode};
use std::future::Future;
use std::time::Duration;
use tracing::{debug, warn};

/// Build the shared HTTP client
pub fn build_client(config: &HttpConfig) -> OnboardResult<Client> {
    Client::builder()
        .user_agent(user_agent())
        .timeout(config.timeout())
        .build()
        .map_err(|e| OnboardError::Internal(format!("Failed to create HTTP client: {}", e)))
}

/// User-Agent sent on every outbound request
pub fn user_agent() -> String {
    format!("onboarding-verify/{}", env!("CARGO_PKG_VERSION"))
}

/// Retry policy for outbound calls
#[derive(Debug, Clone)]
pub struct RetryConfig {
    /// Total attempts including the first; 1 disables retries
    pub max_attempts: u32,
    pub base_delay: Duration,
    pub max_delay: Duration,
    /// Scale each delay by a random factor in [0.5, 1.5)
    pub jitter: bool,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            base_delay: Duration::from_millis(200),
            max_delay: Duration::from_secs(5),
            jitter: true,
        }
    }
}

impl RetryConfig {
    pub fn from_http_config(config: &HttpConfig) -> Self {
        Self {
            max_attempts: config.retry_max_attempts.max(1),
            base_delay: Duration::from_millis(config.retry_base_delay_ms),
            ..Self::default()
        }
    }

    /// Single attempt, no backoff
    pub fn none() -> Self {
        Self {
            max_attempts: 1,
            ..Self::default()
        }
    }

    /// Delay before the given retry (1-based)
    pub fn delay_for(&self, retry: u32) -> Duration {
        let factor = 2u32.saturating_pow(retry.saturating_sub(1));
        self.base_delay
            .checked_mul(factor)
            .unwrap_or(self.max_delay)
            .min(self.max_delay)
    }

    /// `delay_for` with jitter applied when enabled
    pub fn backoff(&self, retry: u32) -> Duration {
        let delay = self.delay_for(retry);
        if self.jitter {
            delay.mul_f64(0.5 + fastrand::f64())
        } else {
            delay
        }
    }
}

/// Whether an HTTP status is worth another attempt
pub fn is_retryable_status(status: StatusCode) -> bool {
    status == StatusCode::TOO_MANY_REQUESTS || status.is_server_error()
}

fn is_retryable_error(err: &reqwest::Error) -> bool {
    err.is_timeout() || err.is_connect()
}

/// Send a request built by `send`, retrying transient failures.
///
/// The last response is returned as-is once attempts are exhausted so callers
/// can surface the upstream body; transport errors are classified for `service`.
pub async fn retry<F, Fut>(config: &RetryConfig, service: &str, mut send: F) -> OnboardResult<Response>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = reqwest::Result<Response>>,
{
    let mut attempt = 1;
    loop {
        let outcome = send().await;
        let exhausted = attempt >= config.max_attempts;

        match outcome {
            Ok(response) if is_retryable_status(response.status()) && !exhausted => {
                warn!(
                    "{} answered {} (attempt {}/{}), retrying",
                    service,
                    response.status(),
                    attempt,
                    config.max_attempts
                );
            }
            Ok(response) => return Ok(response),
            Err(e) if is_retryable_error(&e) && !exhausted => {
                warn!(
                    "{} request failed (attempt {}/{}): {}",
                    service, attempt, config.max_attempts, e
                );
            }
            Err(e) => return Err(OnboardError::from_transport(service, e)),
        }

        let delay = config.backoff(attempt);
        debug!("Backing off {:?} before retrying {}", delay, service);
        tokio::time::sleep(delay).await;
        attempt += 1;
    }
}

/// Turn a non-2xx response into `UpstreamApi`, keeping the body for callers
pub async fn error_for_status(service: &str, response: Response) -> OnboardResult<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let text = response.text().await.unwrap_or_default();
    let body = serde_json::from_str(&text).unwrap_or(serde_json::Value::String(text));

    warn!("{} returned {}: {}", service, status, body);
    Err(OnboardError::UpstreamApi {
        service: service.to_string(),
        status: status.as_u16(),
        body,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_backoff_doubles_and_caps() {
        let config = RetryConfig {
            max_attempts: 6,
            base_delay: Duration::from_millis(200),
            max_delay: Duration::from_secs(1),
            jitter: false,
        };
        assert_eq!(config.delay_for(1), Duration::from_millis(200));
        assert_eq!(config.delay_for(2), Duration::from_millis(400));
        assert_eq!(config.delay_for(3), Duration::from_millis(800));
        assert_eq!(config.delay_for(4), Duration::from_secs(1));
        assert_eq!(config.delay_for(40), Duration::from_secs(1));
    }

    #[test]
    fn test_jitter_stays_within_bounds() {
        let config = RetryConfig {
            max_attempts: 3,
            base_delay: Duration::from_millis(200),
            max_delay: Duration::from_secs(5),
            jitter: true,
        };
        for _ in 0..50 {
            let delay = config.backoff(2);
            assert!(delay >= Duration::from_millis(200));
            assert!(delay < Duration::from_millis(600));
        }

        let fixed = RetryConfig {
            jitter: false,
            ..config
        };
        assert_eq!(fixed.backoff(2), Duration::from_millis(400));
    }

    #[test]
    fn test_retryable_statuses() {
        assert!(is_retryable_status(StatusCode::SERVICE_UNAVAILABLE));
        assert!(is_retryable_status(StatusCode::TOO_MANY_REQUESTS));
        assert!(!is_retryable_status(StatusCode::NOT_FOUND));
        assert!(!is_retryable_status(StatusCode::BAD_REQUEST));
    }

    #[test]
    fn test_zero_attempts_clamped() {
        let config = RetryConfig::from_http_config(&HttpConfig {
            timeout_secs: 30,
            retry_max_attempts: 0,
            retry_base_delay_ms: 10,
        });
        assert_eq!(config.max_attempts, 1);
    }

    #[test]
    fn test_user_agent() {
        assert!(user_agent().starts_with("onboarding-verify/"));
    }
}
