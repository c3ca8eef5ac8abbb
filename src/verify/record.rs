/// Audit record accumulating verification provenance
use crate::{directory::DirectoryUser, registry::UserType};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Outcome of one verification stage
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StepStatus {
    Success,
    Error,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StepResult {
    pub status: StepStatus,
    pub message: String,
}

impl StepResult {
    pub fn success(message: impl Into<String>) -> Self {
        Self {
            status: StepStatus::Success,
            message: message.into(),
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            status: StepStatus::Error,
            message: message.into(),
        }
    }
}

/// Registry stage annotation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegistryLookupEntry {
    pub id: Option<String>,
    pub result: StepResult,
}

/// Resolved directory identity
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResolvedIdentity {
    pub id: String,
    pub user_principal_name: Option<String>,
    pub display_name: Option<String>,
    pub result: StepResult,
}

impl ResolvedIdentity {
    pub fn from_user(user: DirectoryUser) -> Self {
        Self {
            id: user.id,
            user_principal_name: user.user_principal_name,
            display_name: user.display_name,
            result: StepResult::success("Verified user successfully"),
        }
    }
}

/// How the directory identity was established
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResolutionMethod {
    Registry,
    Ssn,
}

/// Mutable audit record for one onboarding attempt
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuditRecord {
    pub id: String,
    pub ssn: String,
    pub user_type: UserType,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub registry_lookup: Option<RegistryLookupEntry>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub resolved_identity: Option<ResolvedIdentity>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub resolution_method: Option<ResolutionMethod>,
    pub created_at: DateTime<Utc>,
}

impl AuditRecord {
    pub fn new(id: impl Into<String>, ssn: impl Into<String>, user_type: UserType) -> Self {
        Self {
            id: id.into(),
            ssn: ssn.into(),
            user_type,
            registry_lookup: None,
            resolved_identity: None,
            resolution_method: None,
            created_at: Utc::now(),
        }
    }

    /// True once the resolver has established an identity
    pub fn is_resolved(&self) -> bool {
        self.resolved_identity
            .as_ref()
            .map(|identity| !identity.id.is_empty() && identity.result.status == StepStatus::Success)
            .unwrap_or(false)
    }
}
