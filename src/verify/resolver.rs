/// Verification resolver - registry correlation with SSN fallback
///
/// Resolution order:
/// 1. Registry identifier (when the integration is enabled), then the
///    directory user carrying it. Any failure here is recorded and softened.
/// 2. Directory user by SSN. Failures here are fatal.
use crate::{
    directory::{DirectoryLookup, DirectoryUser},
    error::{OnboardError, OnboardResult},
    registry::RegistryLookup,
    verify::record::{
        AuditRecord, RegistryLookupEntry, ResolutionMethod, ResolvedIdentity, StepResult,
    },
};
use std::sync::Arc;
use tracing::{info, warn};

/// Result of the registry stage, folded into the record
enum RegistryOutcome {
    /// Integration disabled or no identifier for this person
    Skipped,
    /// Identifier found; the directory may or may not know it
    Correlated {
        id: String,
        user: Option<DirectoryUser>,
    },
    /// Soft failure, resolution continues on SSN
    Failed {
        id: Option<String>,
        message: String,
    },
}

#[derive(Clone)]
pub struct VerificationResolver {
    directory: Arc<dyn DirectoryLookup>,
    registry: Arc<dyn RegistryLookup>,
}

impl VerificationResolver {
    pub fn new(directory: Arc<dyn DirectoryLookup>, registry: Arc<dyn RegistryLookup>) -> Self {
        Self {
            directory,
            registry,
        }
    }

    /// Establish the directory identity for `record`.
    ///
    /// On error the record keeps whatever stages were annotated before the
    /// failure.
    pub async fn resolve(&self, record: &mut AuditRecord) -> OnboardResult<()> {
        let registry_user = match self.registry_stage(record).await {
            RegistryOutcome::Skipped => None,
            RegistryOutcome::Correlated { id, user } => {
                record.registry_lookup = Some(RegistryLookupEntry {
                    id: Some(id),
                    result: StepResult::success("Found registry id"),
                });
                user
            }
            RegistryOutcome::Failed { id, message } => {
                record.registry_lookup = Some(RegistryLookupEntry {
                    id,
                    result: StepResult::error(message),
                });
                None
            }
        };

        let (user, method) = match registry_user.filter(|user| !user.id.is_empty()) {
            Some(user) => (user, ResolutionMethod::Registry),
            None => {
                info!(log_entry = %record.id, "Falling back to SSN lookup");
                let user = self.directory.find_user_by_ssn(&record.ssn).await?;
                if user.id.is_empty() {
                    return Err(OnboardError::UserNotFound(
                        "User not found by registry or SSN".to_string(),
                    ));
                }
                (user, ResolutionMethod::Ssn)
            }
        };

        info!(
            log_entry = %record.id,
            user_id = %user.id,
            method = ?method,
            "Verified user"
        );
        record.resolved_identity = Some(ResolvedIdentity::from_user(user));
        record.resolution_method = Some(method);

        Ok(())
    }

    async fn registry_stage(&self, record: &AuditRecord) -> RegistryOutcome {
        if !self.registry.is_enabled() {
            return RegistryOutcome::Skipped;
        }

        let identity = match self
            .registry
            .resolve_person_id(&record.ssn, record.user_type)
            .await
        {
            Ok(Some(identity)) => identity,
            Ok(None) => return RegistryOutcome::Skipped,
            Err(e) => {
                warn!(log_entry = %record.id, "Failed to retrieve registry id: {}", e);
                return RegistryOutcome::Failed {
                    id: None,
                    message: e.to_string(),
                };
            }
        };

        let Some(id) = identity.id_for(record.user_type).map(str::to_string) else {
            info!(log_entry = %record.id, "Registry has no {} id for this person", record.user_type);
            return RegistryOutcome::Skipped;
        };

        match self.directory.find_user_by_registry_id(&id).await {
            Ok(user) => {
                if user.is_none() {
                    info!(log_entry = %record.id, "No directory user carries registry id {}", id);
                }
                RegistryOutcome::Correlated { id, user }
            }
            Err(e) => {
                warn!(log_entry = %record.id, "Directory lookup on registry id failed: {}", e);
                RegistryOutcome::Failed {
                    id: None,
                    message: e.to_string(),
                }
            }
        }
    }
}
