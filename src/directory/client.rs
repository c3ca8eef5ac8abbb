/// Directory client - typed operations against Microsoft Graph
use crate::{
    config::DirectoryConfig,
    directory::{
        models::{
            Collection, DirectoryUser, PasswordProfile, PasswordUpdate, TemporaryAccessPass,
            TemporaryAccessPassRequest,
        },
        DirectoryLookup,
    },
    error::{OnboardError, OnboardResult},
    http::{error_for_status, retry, RetryConfig},
    token::TokenProvider,
};
use async_trait::async_trait;
use reqwest::{Client, Method, RequestBuilder, Response, StatusCode};
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::str::FromStr;
use tracing::{debug, info, warn};

const SERVICE: &str = "directory";

/// Verbs accepted by the passthrough call
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PassthroughMethod {
    Get,
    Post,
    Patch,
}

impl FromStr for PassthroughMethod {
    type Err = OnboardError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "get" => Ok(PassthroughMethod::Get),
            "post" => Ok(PassthroughMethod::Post),
            "patch" => Ok(PassthroughMethod::Patch),
            _ => Err(OnboardError::InvalidMethod {
                method: s.to_string(),
            }),
        }
    }
}

impl From<PassthroughMethod> for Method {
    fn from(method: PassthroughMethod) -> Self {
        match method {
            PassthroughMethod::Get => Method::GET,
            PassthroughMethod::Post => Method::POST,
            PassthroughMethod::Patch => Method::PATCH,
        }
    }
}

/// Graph-backed directory client
#[derive(Clone)]
pub struct DirectoryClient {
    base_url: String,
    ssn_attribute: String,
    registry_id_attribute: String,
    tokens: TokenProvider,
    http_client: Client,
    retry: RetryConfig,
    single_attempt: RetryConfig,
}

impl DirectoryClient {
    pub fn new(
        config: &DirectoryConfig,
        tokens: TokenProvider,
        http_client: Client,
        retry: RetryConfig,
    ) -> Self {
        Self {
            base_url: config.url.trim_end_matches('/').to_string(),
            ssn_attribute: config.ssn_attribute.clone(),
            registry_id_attribute: config.registry_id_attribute.clone(),
            tokens,
            http_client,
            retry,
            single_attempt: RetryConfig::none(),
        }
    }

    /// Find the single user whose SSN attribute matches.
    ///
    /// Zero matches is `UserNotFound`, more than one is `AmbiguousUser`.
    pub async fn find_user_by_ssn(&self, ssn: &str) -> OnboardResult<DirectoryUser> {
        let mut users = self.find_users_by_attribute(&self.ssn_attribute, ssn).await?;

        match users.len() {
            0 => Err(OnboardError::UserNotFound(
                "No users found on ssn".to_string(),
            )),
            1 => Ok(users.remove(0)),
            n => {
                warn!("Found {} directory users sharing one ssn", n);
                Err(OnboardError::AmbiguousUser(format!(
                    "Found {} users on ssn, expected exactly one",
                    n
                )))
            }
        }
    }

    /// Find the user correlated with a registry identifier, if any
    pub async fn find_user_by_registry_id(
        &self,
        registry_id: &str,
    ) -> OnboardResult<Option<DirectoryUser>> {
        let mut users = self
            .find_users_by_attribute(&self.registry_id_attribute, registry_id)
            .await?;

        match users.len() {
            0 => Ok(None),
            1 => Ok(Some(users.remove(0))),
            n => Err(OnboardError::AmbiguousUser(format!(
                "Found {} users on registry id {}, expected at most one",
                n, registry_id
            ))),
        }
    }

    async fn find_users_by_attribute(
        &self,
        attribute: &str,
        value: &str,
    ) -> OnboardResult<Vec<DirectoryUser>> {
        let url = format!("{}/v1.0/users", self.base_url);
        let filter = attribute_filter(attribute, value);
        let query = [
            ("$count", "true"),
            (
                "$select",
                "id,displayName,userPrincipalName,customSecurityAttributes",
            ),
            ("$filter", filter.as_str()),
        ];

        debug!("Querying directory users on attribute {}", attribute);

        let token = self.tokens.get_token().await?;
        let response = self
            .send(Method::GET, || {
                self.http_client
                    .get(&url)
                    .query(&query)
                    .bearer_auth(&token)
                    .header("ConsistencyLevel", "eventual")
            })
            .await?;

        let users: Collection<DirectoryUser> = parse_json(response).await?;
        Ok(users.value)
    }

    /// Issue a reusable temporary access pass valid for 480 minutes
    pub async fn create_temporary_access_pass(
        &self,
        user_id: &str,
    ) -> OnboardResult<TemporaryAccessPass> {
        let url = self.tap_url(user_id);
        let body = TemporaryAccessPassRequest::default();

        let token = self.tokens.get_token().await?;
        let response = self
            .send(Method::POST, || {
                self.http_client.post(&url).bearer_auth(&token).json(&body)
            })
            .await?;

        info!("Created temporary access pass for user {}", user_id);
        parse_json(response).await
    }

    /// List the user's temporary access passes
    pub async fn get_temporary_access_passes(
        &self,
        user_id: &str,
    ) -> OnboardResult<Vec<TemporaryAccessPass>> {
        let url = self.tap_url(user_id);

        let token = self.tokens.get_token().await?;
        let response = self
            .send(Method::GET, || self.http_client.get(&url).bearer_auth(&token))
            .await?;

        let passes: Collection<TemporaryAccessPass> = parse_json(response).await?;
        Ok(passes.value)
    }

    /// Delete the user's temporary access pass.
    ///
    /// Answers 204 without calling delete when the user has none.
    pub async fn delete_temporary_access_pass(&self, user_id: &str) -> OnboardResult<StatusCode> {
        let existing = self.get_temporary_access_passes(user_id).await?;
        let Some(pass) = existing.first() else {
            debug!("No temporary access pass to delete for user {}", user_id);
            return Ok(StatusCode::NO_CONTENT);
        };

        let url = format!("{}/{}", self.tap_url(user_id), pass.id);
        let token = self.tokens.get_token().await?;
        let response = self
            .send(Method::DELETE, || {
                self.http_client.delete(&url).bearer_auth(&token)
            })
            .await?;

        info!("Deleted temporary access pass for user {}", user_id);
        Ok(response.status())
    }

    /// Set a new password without forcing a change at next sign-in
    pub async fn set_password(&self, user_id: &str, password: &str) -> OnboardResult<StatusCode> {
        let url = format!("{}/v1.0/users/{}", self.base_url, user_id);
        let body = PasswordUpdate {
            password_profile: PasswordProfile {
                force_change_password_next_sign_in: false,
                password,
            },
        };

        info!("Updating password for user {}", user_id);

        let token = self.tokens.get_token().await?;
        let response = self
            .send(Method::PATCH, || {
                self.http_client.patch(&url).bearer_auth(&token).json(&body)
            })
            .await?;

        Ok(response.status())
    }

    /// Authenticated passthrough for arbitrary directory resources.
    ///
    /// `resource` is relative to the Graph base URL, e.g. `v1.0/organization`.
    pub async fn request(
        &self,
        method: &str,
        resource: &str,
        body: Option<&Value>,
    ) -> OnboardResult<Value> {
        let method: Method = method.parse::<PassthroughMethod>()?.into();
        let url = format!("{}/{}", self.base_url, resource.trim_start_matches('/'));

        info!("Calling directory {} {}", method, url);

        let token = self.tokens.get_token().await?;
        let response = self
            .send(method.clone(), || {
                let request = self
                    .http_client
                    .request(method.clone(), &url)
                    .bearer_auth(&token);
                match body {
                    Some(body) => request.json(body),
                    None => request,
                }
            })
            .await?;

        if response.status() == StatusCode::NO_CONTENT {
            return Ok(Value::Null);
        }
        let text = response.text().await.map_err(|e| OnboardError::from_transport(SERVICE, e))?;
        if text.trim().is_empty() {
            return Ok(Value::Null);
        }
        serde_json::from_str(&text)
            .map_err(|e| OnboardError::Internal(format!("Invalid directory response: {}", e)))
    }

    fn tap_url(&self, user_id: &str) -> String {
        format!(
            "{}/v1.0/users/{}/authentication/temporaryAccessPassMethods",
            self.base_url, user_id
        )
    }

    /// Only GETs are retried; a re-sent write could apply twice upstream
    async fn send<F>(&self, method: Method, build: F) -> OnboardResult<Response>
    where
        F: Fn() -> RequestBuilder,
    {
        let policy = if method == Method::GET {
            &self.retry
        } else {
            &self.single_attempt
        };
        let response = retry(policy, SERVICE, || build().send()).await?;
        error_for_status(SERVICE, response).await
    }
}

#[async_trait]
impl DirectoryLookup for DirectoryClient {
    async fn find_user_by_ssn(&self, ssn: &str) -> OnboardResult<DirectoryUser> {
        DirectoryClient::find_user_by_ssn(self, ssn).await
    }

    async fn find_user_by_registry_id(
        &self,
        registry_id: &str,
    ) -> OnboardResult<Option<DirectoryUser>> {
        DirectoryClient::find_user_by_registry_id(self, registry_id).await
    }
}

/// OData equality filter on a custom security attribute
fn attribute_filter(attribute: &str, value: &str) -> String {
    format!(
        "customSecurityAttributes/{} eq '{}'",
        attribute,
        value.replace('\'', "''")
    )
}

async fn parse_json<T: DeserializeOwned>(response: Response) -> OnboardResult<T> {
    response
        .json()
        .await
        .map_err(|e| OnboardError::Internal(format!("Invalid directory response: {}", e)))
}
