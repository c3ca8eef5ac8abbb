/// Token provider - credential grant exchange with caching
use crate::{
    error::{OnboardError, OnboardResult},
    http::{retry, RetryConfig},
    token::cache::TokenCache,
};
use chrono::Duration;
use reqwest::Client;
use serde::Deserialize;
use tracing::{debug, error, info};

/// OAuth2 grant used against a token endpoint
#[derive(Debug, Clone)]
pub enum Grant {
    /// Confidential client credentials (directory)
    ClientCredentials {
        client_id: String,
        client_secret: String,
        scope: String,
    },
    /// Resource owner password credentials (registry)
    Password {
        username: String,
        password: String,
        client_id: String,
        client_secret: String,
        scope: String,
    },
}

impl Grant {
    fn form(&self) -> Vec<(&'static str, &str)> {
        match self {
            Grant::ClientCredentials {
                client_id,
                client_secret,
                scope,
            } => vec![
                ("grant_type", "client_credentials"),
                ("client_id", client_id.as_str()),
                ("client_secret", client_secret.as_str()),
                ("scope", scope.as_str()),
            ],
            Grant::Password {
                username,
                password,
                client_id,
                client_secret,
                scope,
            } => vec![
                ("grant_type", "password"),
                ("username", username.as_str()),
                ("password", password.as_str()),
                ("client_id", client_id.as_str()),
                ("client_secret", client_secret.as_str()),
                ("scope", scope.as_str()),
            ],
        }
    }
}

/// How long a fetched token stays in the cache
#[derive(Debug, Clone, Copy)]
pub enum CachePolicy {
    /// Token lifetime reported by the endpoint minus a safety margin
    ExpiresIn { margin: Duration },
    /// Fixed TTL, shortened if the token itself lives less than that
    Fixed { ttl: Duration, margin: Duration },
}

/// Longest `expires_in` accepted from a token endpoint (one week)
pub const MAX_EXPIRES_IN_SECS: i64 = 7 * 24 * 60 * 60;

const DEFAULT_EXPIRES_IN_SECS: i64 = 3600;

fn lifetime(secs: i64) -> Duration {
    Duration::try_seconds(secs.clamp(0, MAX_EXPIRES_IN_SECS)).unwrap_or_default()
}

impl CachePolicy {
    fn ttl(&self, expires_in: Option<i64>) -> Duration {
        match *self {
            CachePolicy::ExpiresIn { margin } => {
                let lifetime = lifetime(expires_in.unwrap_or(DEFAULT_EXPIRES_IN_SECS));
                (lifetime - margin).max(Duration::zero())
            }
            CachePolicy::Fixed { ttl, margin } => match expires_in {
                Some(secs) => ttl.min((lifetime(secs) - margin).max(Duration::zero())),
                None => ttl,
            },
        }
    }
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: Option<String>,
    expires_in: Option<i64>,
}

/// Bearer token source for one identity domain
#[derive(Clone)]
pub struct TokenProvider {
    /// Domain label used in logs and errors
    name: String,
    token_url: String,
    grant: Grant,
    policy: CachePolicy,
    cache: TokenCache,
    http_client: Client,
    retry: RetryConfig,
}

impl TokenProvider {
    pub fn new(
        name: impl Into<String>,
        token_url: impl Into<String>,
        grant: Grant,
        policy: CachePolicy,
        cache: TokenCache,
        http_client: Client,
        retry: RetryConfig,
    ) -> Self {
        Self {
            name: name.into(),
            token_url: token_url.into(),
            grant,
            policy,
            cache,
            http_client,
            retry,
        }
    }

    /// Return a cached token, or exchange credentials for a new one
    pub async fn get_token(&self) -> OnboardResult<String> {
        if let Some(token) = self.cache.get().await {
            debug!("Using cached {} token", self.name);
            return Ok(token);
        }

        let (token, expires_in) = self.exchange().await.map_err(|e| {
            error!("Failed to get {} access token: {}", self.name, e);
            e
        })?;
        let cached = self
            .cache
            .store(token.clone(), self.policy.ttl(expires_in))
            .await;

        info!("Acquired {} token, cached until {}", self.name, cached.expires_at);
        Ok(token)
    }

    async fn exchange(&self) -> OnboardResult<(String, Option<i64>)> {
        let form = self.grant.form();
        let response = retry(&self.retry, &self.name, || {
            self.http_client.post(&self.token_url).form(&form).send()
        })
        .await
        .map_err(|e| match e {
            OnboardError::Timeout(_) => e,
            other => self.auth_error(other.to_string(), None),
        })?;

        let status = response.status();
        let text = response.text().await.unwrap_or_default();
        if !status.is_success() {
            let body = serde_json::from_str(&text).ok();
            return Err(self.auth_error(format!("token endpoint returned {}", status), body));
        }

        let parsed: TokenResponse = serde_json::from_str(&text)
            .map_err(|e| self.auth_error(format!("invalid token response: {}", e), None))?;

        if let Some(secs) = parsed.expires_in {
            if !(0..=MAX_EXPIRES_IN_SECS).contains(&secs) {
                return Err(self.auth_error(
                    format!("token response has out-of-range expires_in {}", secs),
                    None,
                ));
            }
        }

        match parsed.access_token {
            Some(token) if !token.is_empty() => Ok((token, parsed.expires_in)),
            _ => Err(self.auth_error("token response has no access_token".to_string(), None)),
        }
    }

    fn auth_error(&self, message: String, body: Option<serde_json::Value>) -> OnboardError {
        OnboardError::UpstreamAuth {
            service: self.name.clone(),
            message,
            body,
        }
    }
}
