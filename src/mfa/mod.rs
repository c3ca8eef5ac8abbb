/// MFA login via the authorization code flow with PKCE
///
/// The login URL is built for the caller's log entry: the entry id doubles as
/// the OAuth `state`, and the PKCE verifier is parked under it until the code
/// is redeemed.

pub mod pkce;
pub mod state;

pub use pkce::{PkceCodes, CHALLENGE_METHOD};
pub use state::{PkceState, StateCache};

use crate::{
    config::{DirectoryConfig, MfaConfig},
    error::{OnboardError, OnboardResult},
    token::duration_secs,
};
use chrono::Duration;
use reqwest::Url;
use tracing::info;

/// Builds MFA login URLs and remembers their PKCE verifiers
#[derive(Clone)]
pub struct MfaLoginService {
    authorize_endpoint: String,
    client_id: String,
    redirect_uri: String,
    scopes: String,
    state_ttl: Duration,
    states: StateCache<PkceState>,
}

impl MfaLoginService {
    pub fn new(
        config: &MfaConfig,
        directory: &DirectoryConfig,
        states: StateCache<PkceState>,
    ) -> Self {
        Self {
            authorize_endpoint: format!(
                "{}/{}/oauth2/v2.0/authorize",
                directory.authority_url.trim_end_matches('/'),
                config.tenant_id
            ),
            client_id: config.client_id.clone(),
            redirect_uri: config.redirect_uri.clone(),
            scopes: config.scopes.clone(),
            state_ttl: duration_secs(config.state_ttl_secs),
            states,
        }
    }

    /// Build a login URL for `state` and store its PKCE verifier
    pub async fn login_url(&self, state: &str, login_hint: Option<&str>) -> OnboardResult<String> {
        let pkce = PkceCodes::generate();

        let mut params = vec![
            ("client_id", self.client_id.as_str()),
            ("scope", self.scopes.as_str()),
            ("redirect_uri", self.redirect_uri.as_str()),
            ("client_info", "1"),
            ("response_type", "code"),
            ("response_mode", "query"),
            ("state", state),
            ("code_challenge", pkce.challenge.as_str()),
            ("code_challenge_method", CHALLENGE_METHOD),
        ];
        if let Some(hint) = login_hint.filter(|hint| !hint.is_empty()) {
            params.push(("login_hint", hint));
        }

        let url = Url::parse_with_params(&self.authorize_endpoint, &params).map_err(|e| {
            OnboardError::Config(format!("Invalid authorize endpoint: {}", e))
        })?;

        self.states
            .set(
                state,
                PkceState {
                    verifier: pkce.verifier,
                    login_hint: login_hint.map(str::to_string),
                },
                self.state_ttl,
            )
            .await;

        info!(log_entry = %state, "Issued MFA login url");
        Ok(url.to_string())
    }

    pub fn states(&self) -> &StateCache<PkceState> {
        &self.states
    }
}
