//! Shared fixtures for integration tests
#![allow(dead_code)]

use chrono::{DateTime, Duration, Utc};
use onboarding_verify::{config::AppConfig, context::AppContext, token::Clock};
use serde_json::{json, Value};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use wiremock::{
    matchers::{method, path},
    Mock, MockServer, ResponseTemplate,
};

pub const TENANT: &str = "tenant-1";
pub const DIRECTORY_TOKEN_PATH: &str = "/tenant-1/oauth2/v2.0/token";
pub const REGISTRY_TOKEN_PATH: &str = "/idp/token";

/// Configuration pointing every upstream at `server`
pub fn config_for(server: &MockServer, overrides: &[(&str, &str)]) -> AppConfig {
    let uri = server.uri();
    let idp = format!("{}{}", uri, REGISTRY_TOKEN_PATH);
    let mut vars: HashMap<String, String> = [
        ("GRAPH_URL", uri.as_str()),
        ("GRAPH_AUTHORITY_URL", uri.as_str()),
        ("GRAPH_TENANT_ID", TENANT),
        ("GRAPH_CLIENT_ID", "graph-client"),
        ("GRAPH_CLIENT_SECRET", "graph-secret"),
        ("MFA_REDIRECT_URI", "https://onboarding.example.org/callback"),
        ("HTTP_RETRY_BASE_DELAY_MS", "1"),
        ("REGISTRY_BASE_URL", uri.as_str()),
        ("REGISTRY_IDP_URI", idp.as_str()),
        ("REGISTRY_USERNAME", "registry-user"),
        ("REGISTRY_PASSWORD", "registry-pass"),
        ("REGISTRY_CLIENT_ID", "registry-client"),
        ("REGISTRY_CLIENT_SECRET", "registry-secret"),
        ("REGISTRY_SCOPE", "registry-read"),
        ("REGISTRY_ASSET_ID", "example.org"),
    ]
    .iter()
    .map(|(k, v)| (k.to_string(), v.to_string()))
    .collect();

    for (key, value) in overrides {
        vars.insert(key.to_string(), value.to_string());
    }

    AppConfig::from_lookup(|key| vars.get(key).cloned()).expect("test config")
}

pub fn context_for(server: &MockServer, overrides: &[(&str, &str)]) -> AppContext {
    AppContext::new(config_for(server, overrides)).expect("test context")
}

pub fn context_with_clock(
    server: &MockServer,
    overrides: &[(&str, &str)],
    clock: Arc<dyn Clock>,
) -> AppContext {
    AppContext::with_clock(config_for(server, overrides), clock).expect("test context")
}

/// Clock the tests move forward by hand
#[derive(Debug, Clone)]
pub struct TestClock {
    now: Arc<Mutex<DateTime<Utc>>>,
}

impl TestClock {
    pub fn new(start: DateTime<Utc>) -> Self {
        Self {
            now: Arc::new(Mutex::new(start)),
        }
    }

    pub fn advance(&self, by: Duration) {
        *self.now.lock().unwrap() += by;
    }
}

impl Clock for TestClock {
    fn now(&self) -> DateTime<Utc> {
        *self.now.lock().unwrap()
    }
}

pub fn token_body(token: &str) -> Value {
    json!({
        "token_type": "Bearer",
        "access_token": token,
        "expires_in": 3600
    })
}

/// Mount a directory token endpoint that issues `graph-token`
pub async fn mount_directory_token(server: &MockServer) {
    Mock::given(method("POST"))
        .and(path(DIRECTORY_TOKEN_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_json(token_body("graph-token")))
        .mount(server)
        .await;
}

/// Mount a registry token endpoint that issues `registry-token`
pub async fn mount_registry_token(server: &MockServer) {
    Mock::given(method("POST"))
        .and(path(REGISTRY_TOKEN_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_json(token_body("registry-token")))
        .mount(server)
        .await;
}

pub fn user(id: &str, upn: &str, name: &str) -> Value {
    json!({
        "id": id,
        "displayName": name,
        "userPrincipalName": upn
    })
}

pub fn users(list: Vec<Value>) -> Value {
    json!({ "value": list })
}
