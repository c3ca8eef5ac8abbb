/// Directory (cloud identity provider) integration
///
/// Accounts are correlated through custom security attributes: one holding the
/// person's SSN, one holding the registry identifier.

pub mod client;
pub mod models;

pub use client::{DirectoryClient, PassthroughMethod};
pub use models::{DirectoryUser, TemporaryAccessPass, TemporaryAccessPassRequest};

use crate::error::OnboardResult;
use async_trait::async_trait;

/// Account lookups the verification resolver depends on
#[async_trait]
pub trait DirectoryLookup: Send + Sync {
    /// Exactly one user for the SSN, or `UserNotFound` / `AmbiguousUser`
    async fn find_user_by_ssn(&self, ssn: &str) -> OnboardResult<DirectoryUser>;

    /// The user carrying this registry identifier, `None` when nobody does
    async fn find_user_by_registry_id(
        &self,
        registry_id: &str,
    ) -> OnboardResult<Option<DirectoryUser>>;
}
