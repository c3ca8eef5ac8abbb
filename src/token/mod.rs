/// Bearer token acquisition for the directory and registry domains
///
/// Each domain gets its own `TokenProvider` with its own `TokenCache`, so
/// tokens and expiries are never shared across domains.

pub mod cache;
pub mod provider;

pub use cache::{CachedToken, Clock, SystemClock, TokenCache};
#[cfg(test)]
pub use cache::ManualClock;
pub use provider::{CachePolicy, Grant, TokenProvider};

use crate::{
    config::{DirectoryConfig, RegistryConfig},
    http::RetryConfig,
};
use chrono::Duration;
use reqwest::Client;
use std::sync::Arc;

/// Seconds from configuration as a `chrono::Duration`, saturating
pub(crate) fn duration_secs(secs: u64) -> Duration {
    i64::try_from(secs)
        .ok()
        .and_then(Duration::try_seconds)
        .unwrap_or(Duration::MAX)
}

/// Directory token provider (client credentials, cached until expiry minus margin)
pub fn directory_token_provider(
    config: &DirectoryConfig,
    http_client: Client,
    retry: RetryConfig,
    clock: Arc<dyn Clock>,
) -> TokenProvider {
    let token_url = format!(
        "{}/{}/oauth2/v2.0/token",
        config.authority_url.trim_end_matches('/'),
        config.tenant_id
    );

    TokenProvider::new(
        "directory",
        token_url,
        Grant::ClientCredentials {
            client_id: config.client_id.clone(),
            client_secret: config.client_secret.clone(),
            scope: config.scope.clone(),
        },
        CachePolicy::ExpiresIn {
            margin: duration_secs(config.token_expiry_margin_secs),
        },
        TokenCache::new(clock),
        http_client,
        retry,
    )
}

/// Registry token provider (password grant, fixed TTL)
pub fn registry_token_provider(
    config: &RegistryConfig,
    http_client: Client,
    retry: RetryConfig,
    clock: Arc<dyn Clock>,
) -> TokenProvider {
    TokenProvider::new(
        "registry",
        config.idp_uri.clone(),
        Grant::Password {
            username: config.username.clone(),
            password: config.password.clone(),
            client_id: config.client_id.clone(),
            client_secret: config.client_secret.clone(),
            scope: config.scope.clone(),
        },
        CachePolicy::Fixed {
            ttl: duration_secs(config.token_ttl_secs),
            margin: Duration::seconds(60),
        },
        TokenCache::new(clock),
        http_client,
        retry,
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_duration_secs_saturates() {
        assert_eq!(duration_secs(3500), Duration::seconds(3500));
        assert_eq!(duration_secs(u64::MAX), Duration::MAX);
    }
}
