/// Directory API payloads
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Directory account as returned by user queries
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DirectoryUser {
    #[serde(default)]
    pub id: String,
    pub display_name: Option<String>,
    pub user_principal_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub custom_security_attributes: Option<Value>,
}

/// OData collection envelope (`{"value": [...]}`)
#[derive(Debug, Clone, Deserialize)]
pub struct Collection<T> {
    #[serde(default = "Vec::new")]
    pub value: Vec<T>,
}

/// Temporary access pass authentication method
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TemporaryAccessPass {
    pub id: String,
    /// Only present in the create response
    #[serde(skip_serializing_if = "Option::is_none")]
    pub temporary_access_pass: Option<String>,
    pub created_date_time: Option<String>,
    pub start_date_time: Option<String>,
    pub lifetime_in_minutes: Option<u32>,
    pub is_usable_once: Option<bool>,
    pub is_usable: Option<bool>,
    pub method_usability_reason: Option<String>,
}

/// Body for creating a temporary access pass
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TemporaryAccessPassRequest {
    pub lifetime_in_minutes: u32,
    pub is_usable_once: bool,
}

impl Default for TemporaryAccessPassRequest {
    /// One working day, reusable
    fn default() -> Self {
        Self {
            lifetime_in_minutes: 480,
            is_usable_once: false,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct PasswordProfile<'a> {
    pub force_change_password_next_sign_in: bool,
    pub password: &'a str,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct PasswordUpdate<'a> {
    pub password_profile: PasswordProfile<'a>,
}
