/// Registry (HR/education system) integration
///
/// The registry gives a stronger correlation than SSN alone: it maps an SSN to
/// the person's student or employee identifier, which the directory stores as
/// a custom attribute.

pub mod client;

pub use client::RegistryClient;

use crate::error::OnboardResult;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Role discriminator selecting the registry endpoint and identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UserType {
    #[serde(alias = "elev")]
    Student,
    #[serde(alias = "ansatt")]
    Employee,
}

impl UserType {
    /// `_links` relation whose last path segment is the identifier
    pub fn link_relation(&self) -> &'static str {
        match self {
            UserType::Student => "elev",
            UserType::Employee => "personalressurs",
        }
    }
}

impl fmt::Display for UserType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            UserType::Student => write!(f, "student"),
            UserType::Employee => write!(f, "employee"),
        }
    }
}

/// Registry identifiers for a person; at most one is populated
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegistryIdentity {
    pub student_id: Option<String>,
    pub employee_id: Option<String>,
}

impl RegistryIdentity {
    /// Identifier matching the user type
    pub fn id_for(&self, user_type: UserType) -> Option<&str> {
        match user_type {
            UserType::Student => self.student_id.as_deref(),
            UserType::Employee => self.employee_id.as_deref(),
        }
    }
}

/// Registry lookup the verification resolver depends on
#[async_trait]
pub trait RegistryLookup: Send + Sync {
    /// Whether the integration is switched on
    fn is_enabled(&self) -> bool;

    /// `None` when disabled; errors propagate for the caller to soften
    async fn resolve_person_id(
        &self,
        ssn: &str,
        user_type: UserType,
    ) -> OnboardResult<Option<RegistryIdentity>>;
}
