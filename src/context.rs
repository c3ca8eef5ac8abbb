/// Application context and dependency injection
use crate::{
    config::AppConfig,
    directory::DirectoryClient,
    error::OnboardResult,
    http::{build_client, RetryConfig},
    mfa::{MfaLoginService, StateCache},
    registry::RegistryClient,
    token::{directory_token_provider, registry_token_provider, Clock, SystemClock},
    verify::VerificationResolver,
};
use std::sync::Arc;

/// Application context holding all shared services
#[derive(Clone)]
pub struct AppContext {
    pub config: Arc<AppConfig>,
    pub directory: Arc<DirectoryClient>,
    pub registry: Arc<RegistryClient>,
    pub resolver: VerificationResolver,
    pub mfa: MfaLoginService,
}

impl AppContext {
    /// Create a new application context from configuration
    pub fn new(config: AppConfig) -> OnboardResult<Self> {
        Self::with_clock(config, Arc::new(SystemClock))
    }

    /// Create a context whose caches read time from `clock`
    pub fn with_clock(config: AppConfig, clock: Arc<dyn Clock>) -> OnboardResult<Self> {
        // Validate configuration
        config.validate()?;

        let http_client = build_client(&config.http)?;
        let retry = RetryConfig::from_http_config(&config.http);

        // Each domain owns its token cache
        let directory_tokens = directory_token_provider(
            &config.directory,
            http_client.clone(),
            retry.clone(),
            Arc::clone(&clock),
        );
        let registry_tokens = registry_token_provider(
            &config.registry,
            http_client.clone(),
            retry.clone(),
            Arc::clone(&clock),
        );

        let directory = Arc::new(DirectoryClient::new(
            &config.directory,
            directory_tokens,
            http_client.clone(),
            retry.clone(),
        ));
        let registry = Arc::new(RegistryClient::new(
            &config.registry,
            registry_tokens,
            http_client,
            retry,
        ));

        if config.registry.enabled {
            tracing::info!("Registry integration enabled");
        } else {
            tracing::info!("Registry integration disabled - resolving on SSN only");
        }

        let resolver = VerificationResolver::new(directory.clone(), registry.clone());
        let mfa = MfaLoginService::new(&config.mfa, &config.directory, StateCache::new(clock));

        Ok(Self {
            config: Arc::new(config),
            directory,
            registry,
            resolver,
            mfa,
        })
    }
}
