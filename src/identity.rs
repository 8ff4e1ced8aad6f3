//! The identity record exchanged between the directory, the rotation engine and
//! the HTTP layer.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// One principal, as seen by the rotation protocol.
///
/// `refresh_token` is the single currently valid rotation secret. `access_token`
/// is only carried for the response; it is never persisted and never trusted.
#[derive(ToSchema, Serialize, Deserialize, Clone, Default, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct IdentityRecord {
    pub id: String,
    pub display_name: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub refresh_token: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub access_token: String,
}

impl IdentityRecord {
    #[must_use]
    pub fn new(id: impl Into<String>, display_name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            display_name: display_name.into(),
            refresh_token: String::new(),
            access_token: String::new(),
        }
    }

    #[must_use]
    pub fn with_refresh_token(mut self, refresh_token: impl Into<String>) -> Self {
        self.refresh_token = refresh_token.into();
        self
    }
}

impl std::fmt::Debug for IdentityRecord {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let redact = |value: &str| if value.is_empty() { "" } else { "***" };
        f.debug_struct("IdentityRecord")
            .field("id", &self.id)
            .field("display_name", &self.display_name)
            .field("refresh_token", &redact(&self.refresh_token))
            .field("access_token", &redact(&self.access_token))
            .finish()
    }
}
