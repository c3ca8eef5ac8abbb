/// Registry client - resolves registry identifiers from an SSN
use crate::{
    config::RegistryConfig,
    error::{OnboardError, OnboardResult},
    http::{error_for_status, retry, RetryConfig},
    registry::{RegistryIdentity, RegistryLookup, UserType},
    token::TokenProvider,
};
use async_trait::async_trait;
use reqwest::Client;
use serde_json::Value;
use tracing::{debug, error, info};

const SERVICE: &str = "registry";

/// REST client for the registry API
#[derive(Clone)]
pub struct RegistryClient {
    enabled: bool,
    base_url: String,
    asset_id: String,
    client_name: String,
    student_endpoint: String,
    employee_endpoint: String,
    tokens: TokenProvider,
    http_client: Client,
    retry: RetryConfig,
}

impl RegistryClient {
    pub fn new(
        config: &RegistryConfig,
        tokens: TokenProvider,
        http_client: Client,
        retry: RetryConfig,
    ) -> Self {
        Self {
            enabled: config.enabled,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            asset_id: config.asset_id.clone(),
            client_name: config.client_name.clone(),
            student_endpoint: config.student_endpoint.clone(),
            employee_endpoint: config.employee_endpoint.clone(),
            tokens,
            http_client,
            retry,
        }
    }

    fn endpoint(&self, user_type: UserType) -> &str {
        match user_type {
            UserType::Student => &self.student_endpoint,
            UserType::Employee => &self.employee_endpoint,
        }
    }

    /// Look up the person's registry identifier for the given role
    pub async fn resolve_person_id(
        &self,
        ssn: &str,
        user_type: UserType,
    ) -> OnboardResult<Option<RegistryIdentity>> {
        if !self.enabled {
            return Ok(None);
        }

        self.fetch_person_id(ssn, user_type).await.map(Some).map_err(|e| {
            error!("Failed to get registry id for {}: {}", user_type, e);
            e
        })
    }

    async fn fetch_person_id(
        &self,
        ssn: &str,
        user_type: UserType,
    ) -> OnboardResult<RegistryIdentity> {
        let token = self.tokens.get_token().await?;
        let url = format!(
            "{}/{}/{}",
            self.base_url,
            self.endpoint(user_type).trim_matches('/'),
            ssn
        );

        debug!("Querying registry {} endpoint", user_type);

        let response = retry(&self.retry, SERVICE, || {
            self.http_client
                .get(&url)
                .bearer_auth(&token)
                .header("x-org-id", self.asset_id.as_str())
                .header("x-client", self.client_name.as_str())
                .send()
        })
        .await?;
        let response = error_for_status(SERVICE, response).await?;

        let body: Value = response
            .json()
            .await
            .map_err(|e| OnboardError::Internal(format!("Invalid registry response: {}", e)))?;

        let id = linked_id(&body, user_type.link_relation());
        info!(
            "Registry lookup for {} {}",
            user_type,
            if id.is_some() { "found an identifier" } else { "found no identifier" }
        );

        Ok(match user_type {
            UserType::Student => RegistryIdentity {
                student_id: id,
                employee_id: None,
            },
            UserType::Employee => RegistryIdentity {
                student_id: None,
                employee_id: id,
            },
        })
    }
}

#[async_trait]
impl RegistryLookup for RegistryClient {
    fn is_enabled(&self) -> bool {
        self.enabled
    }

    async fn resolve_person_id(
        &self,
        ssn: &str,
        user_type: UserType,
    ) -> OnboardResult<Option<RegistryIdentity>> {
        RegistryClient::resolve_person_id(self, ssn, user_type).await
    }
}

/// Last path segment of `_links.<relation>[0].href`
fn linked_id(body: &Value, relation: &str) -> Option<String> {
    body.get("_links")?
        .get(relation)?
        .get(0)?
        .get("href")?
        .as_str()?
        .trim_end_matches('/')
        .rsplit('/')
        .next()
        .filter(|segment| !segment.is_empty())
        .map(str::to_string)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_linked_id_takes_last_segment() {
        let body = json!({
            "_links": {
                "elev": [{"href": "https://api.example.org/utdanning/elev/elev/systemid/98765"}]
            }
        });
        assert_eq!(linked_id(&body, "elev"), Some("98765".to_string()));
    }

    #[test]
    fn test_linked_id_missing_relation() {
        let body = json!({"_links": {"self": [{"href": "https://api.example.org/x/1"}]}});
        assert_eq!(linked_id(&body, "personalressurs"), None);
        assert_eq!(linked_id(&json!({}), "elev"), None);
        assert_eq!(linked_id(&json!({"_links": {"elev": []}}), "elev"), None);
    }

    #[test]
    fn test_linked_id_ignores_trailing_slash() {
        let body = json!({"_links": {"personalressurs": [{"href": "https://x/ansattnummer/555/"}]}});
        assert_eq!(linked_id(&body, "personalressurs"), Some("555".to_string()));
    }
}
