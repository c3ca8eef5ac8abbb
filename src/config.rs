/// Configuration management for the onboarding verification service
use crate::error::{OnboardError, OnboardResult};
use serde::{Deserialize, Serialize};
use std::env;
use std::time::Duration;

/// Upper bound for any duration setting (one year)
pub const MAX_DURATION_SECS: u64 = 365 * 24 * 60 * 60;

/// Main service configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    pub service: ServiceConfig,
    pub http: HttpConfig,
    pub directory: DirectoryConfig,
    pub registry: RegistryConfig,
    pub mfa: MfaConfig,
    pub logging: LoggingConfig,
}

/// Service-level configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServiceConfig {
    pub hostname: String,
    pub port: u16,
    /// Shared key required on /api routes when set
    #[serde(skip_serializing)]
    pub function_key: Option<String>,
}

/// Outbound HTTP behaviour shared by every upstream client
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HttpConfig {
    pub timeout_secs: u64,
    pub retry_max_attempts: u32,
    pub retry_base_delay_ms: u64,
}

/// Directory (Microsoft Graph) configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DirectoryConfig {
    /// Graph base URL, e.g. https://graph.microsoft.com
    pub url: String,
    /// Identity platform authority, e.g. https://login.microsoftonline.com
    pub authority_url: String,
    pub tenant_id: String,
    pub client_id: String,
    #[serde(skip_serializing)]
    pub client_secret: String,
    pub scope: String,
    /// Custom security attribute holding the SSN (`set/attribute`)
    pub ssn_attribute: String,
    /// Custom security attribute holding the registry identifier
    pub registry_id_attribute: String,
    pub token_expiry_margin_secs: u64,
}

/// Registry (HR/education) configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegistryConfig {
    pub enabled: bool,
    pub base_url: String,
    /// OAuth2 token endpoint for the password grant
    pub idp_uri: String,
    pub username: String,
    #[serde(skip_serializing)]
    pub password: String,
    pub client_id: String,
    #[serde(skip_serializing)]
    pub client_secret: String,
    pub scope: String,
    /// Sent as `x-org-id`
    pub asset_id: String,
    /// Sent as `x-client`
    pub client_name: String,
    pub student_endpoint: String,
    pub employee_endpoint: String,
    pub token_ttl_secs: u64,
}

/// MFA login (authorization code + PKCE) configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MfaConfig {
    pub client_id: String,
    pub tenant_id: String,
    pub redirect_uri: String,
    pub scopes: String,
    pub state_ttl_secs: u64,
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    pub level: String,
    pub json: bool,
}

impl HttpConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

impl AppConfig {
    /// Load configuration from environment variables
    pub fn from_env() -> OnboardResult<Self> {
        dotenv::dotenv().ok();
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Load configuration from an arbitrary key lookup
    pub fn from_lookup<F>(lookup: F) -> OnboardResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |key: &str, default: &str| lookup(key).unwrap_or_else(|| default.to_string());
        let flag = |key: &str, default: bool| {
            lookup(key)
                .and_then(|v| v.trim().to_lowercase().parse().ok())
                .unwrap_or(default)
        };
        let number = |key: &str, default: u64| -> OnboardResult<u64> {
            match lookup(key) {
                Some(v) => v
                    .trim()
                    .parse()
                    .map_err(|_| OnboardError::Config(format!("{} must be a number", key))),
                None => Ok(default),
            }
        };

        let seconds = |key: &str, default: u64| -> OnboardResult<u64> {
            let value = number(key, default)?;
            if value > MAX_DURATION_SECS {
                return Err(OnboardError::Config(format!(
                    "{} must be at most {} seconds",
                    key, MAX_DURATION_SECS
                )));
            }
            Ok(value)
        };

        let hostname = var("SERVICE_HOSTNAME", "0.0.0.0");
        let port = lookup("SERVICE_PORT")
            .unwrap_or_else(|| "7071".to_string())
            .parse()
            .map_err(|_| OnboardError::Config("Invalid port number".to_string()))?;
        let function_key = lookup("SERVICE_FUNCTION_KEY").filter(|k| !k.is_empty());

        let http = HttpConfig {
            timeout_secs: seconds("HTTP_TIMEOUT_SECS", 30)?,
            retry_max_attempts: u32::try_from(number("HTTP_RETRY_MAX_ATTEMPTS", 3)?).map_err(
                |_| OnboardError::Config("HTTP_RETRY_MAX_ATTEMPTS is out of range".to_string()),
            )?,
            retry_base_delay_ms: number("HTTP_RETRY_BASE_DELAY_MS", 200)?,
        };

        let tenant_id = var("GRAPH_TENANT_ID", "");
        let graph_client_id = var("GRAPH_CLIENT_ID", "");
        let directory = DirectoryConfig {
            url: var("GRAPH_URL", "https://graph.microsoft.com"),
            authority_url: var("GRAPH_AUTHORITY_URL", "https://login.microsoftonline.com"),
            tenant_id: tenant_id.clone(),
            client_id: graph_client_id.clone(),
            client_secret: var("GRAPH_CLIENT_SECRET", ""),
            scope: var("GRAPH_SCOPE", "https://graph.microsoft.com/.default"),
            ssn_attribute: var("GRAPH_SSN_ATTRIBUTE", "IDM/SSN"),
            registry_id_attribute: var("GRAPH_REGISTRY_ID_ATTRIBUTE", "IDM/RegistryId"),
            token_expiry_margin_secs: seconds("GRAPH_TOKEN_EXPIRY_MARGIN_SECS", 300)?,
        };

        let registry = RegistryConfig {
            enabled: flag("REGISTRY_ENABLED", false),
            base_url: var("REGISTRY_BASE_URL", ""),
            idp_uri: var("REGISTRY_IDP_URI", ""),
            username: var("REGISTRY_USERNAME", ""),
            password: var("REGISTRY_PASSWORD", ""),
            client_id: var("REGISTRY_CLIENT_ID", ""),
            client_secret: var("REGISTRY_CLIENT_SECRET", ""),
            scope: var("REGISTRY_SCOPE", ""),
            asset_id: var("REGISTRY_ASSET_ID", ""),
            client_name: var("REGISTRY_CLIENT_NAME", "onboarding-api"),
            student_endpoint: var(
                "REGISTRY_STUDENT_ENDPOINT",
                "/utdanning/elev/person/fodselsnummer",
            ),
            employee_endpoint: var(
                "REGISTRY_EMPLOYEE_ENDPOINT",
                "/administrasjon/personal/person/fodselsnummer",
            ),
            token_ttl_secs: seconds("REGISTRY_TOKEN_TTL_SECS", 3500)?,
        };

        let mfa = MfaConfig {
            client_id: lookup("MFA_CLIENT_ID").unwrap_or(graph_client_id),
            tenant_id: lookup("MFA_TENANT_ID").unwrap_or(tenant_id),
            redirect_uri: var("MFA_REDIRECT_URI", ""),
            scopes: var("MFA_SCOPES", "openid profile offline_access"),
            state_ttl_secs: seconds("MFA_STATE_TTL_SECS", 600)?,
        };

        let logging = LoggingConfig {
            level: var("RUST_LOG", "info"),
            json: var("LOG_FORMAT", "text").eq_ignore_ascii_case("json"),
        };

        Ok(AppConfig {
            service: ServiceConfig {
                hostname,
                port,
                function_key,
            },
            http,
            directory,
            registry,
            mfa,
            logging,
        })
    }

    /// Validate configuration
    pub fn validate(&self) -> OnboardResult<()> {
        if self.service.port == 0 {
            return Err(OnboardError::Config("Port cannot be zero".to_string()));
        }

        if self.http.timeout_secs == 0 {
            return Err(OnboardError::Config(
                "HTTP timeout must be at least one second".to_string(),
            ));
        }

        require("GRAPH_TENANT_ID", &self.directory.tenant_id)?;
        require("GRAPH_CLIENT_ID", &self.directory.client_id)?;
        require("GRAPH_CLIENT_SECRET", &self.directory.client_secret)?;
        require("MFA_REDIRECT_URI", &self.mfa.redirect_uri)?;

        // Registry credentials only matter when the integration is switched on
        if self.registry.enabled {
            require("REGISTRY_BASE_URL", &self.registry.base_url)?;
            require("REGISTRY_IDP_URI", &self.registry.idp_uri)?;
            require("REGISTRY_USERNAME", &self.registry.username)?;
            require("REGISTRY_PASSWORD", &self.registry.password)?;
            require("REGISTRY_CLIENT_ID", &self.registry.client_id)?;
            require("REGISTRY_CLIENT_SECRET", &self.registry.client_secret)?;
        }

        Ok(())
    }
}

fn require(key: &str, value: &str) -> OnboardResult<()> {
    if value.trim().is_empty() {
        return Err(OnboardError::Config(format!("{} is required", key)));
    }
    Ok(())
}
