/// Identity verification for onboarding
///
/// Resolves the authoritative directory account for a person and records how
/// it was found on an audit record.

pub mod record;
pub mod resolver;

pub use record::{
    AuditRecord, RegistryLookupEntry, ResolutionMethod, ResolvedIdentity, StepResult, StepStatus,
};
pub use resolver::VerificationResolver;

use crate::error::{OnboardError, OnboardResult};

/// National identity numbers are 11 digits
pub fn validate_ssn(ssn: &str) -> OnboardResult<()> {
    if ssn.len() != 11 || !ssn.bytes().all(|b| b.is_ascii_digit()) {
        return Err(OnboardError::Validation(
            "ssn must be 11 digits".to_string(),
        ));
    }
    Ok(())
}
