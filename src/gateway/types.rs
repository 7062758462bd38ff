//! Request/response bodies and the stored account record.

use crate::backend::{Document, DocumentWrite};
use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

pub const DEFAULT_USERS_COLLECTION: &str = "users";
pub const FIELD_EMAIL: &str = "email";
pub const FIELD_ROLE: &str = "role";
pub const FIELD_CREATED_AT: &str = "createdAt";

/// Role value the signup form sends when nothing was selected.
pub const NO_ROLE: &str = "none";

pub const MSG_USER_CREATED: &str = "User created";
pub const MSG_LOGIN_SUCCESSFUL: &str = "Login successful";

/// Signup body. Every field is optional so presence checks produce the
/// gateway's own 400 instead of a deserialization rejection.
#[derive(ToSchema, Deserialize, Default, Clone)]
pub struct SignupRequest {
    pub email: Option<String>,
    pub password: Option<String>,
    pub role: Option<String>,
}

impl std::fmt::Debug for SignupRequest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SignupRequest")
            .field("email", &self.email)
            .field("password", &self.password.as_ref().map(|_| "***"))
            .field("role", &self.role)
            .finish()
    }
}

/// Login body. Extra fields such as `password` are accepted and ignored.
#[derive(ToSchema, Deserialize, Debug, Default, Clone)]
pub struct LoginRequest {
    pub email: Option<String>,
}

#[derive(ToSchema, Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct SignupResponse {
    pub message: String,
    pub uid: String,
}

#[derive(ToSchema, Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct LoginResponse {
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub role: Option<String>,
}

#[derive(ToSchema, Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct ErrorResponse {
    pub error: String,
}

/// Account document stored under the identity provider uid.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct AccountRecord {
    pub email: String,
    #[serde(default)]
    pub role: Option<String>,
    #[serde(rename = "createdAt", default)]
    pub created_at: Option<DateTime<Utc>>,
}

impl AccountRecord {
    /// Decode an account from a stored document.
    ///
    /// # Errors
    /// Returns an error if the document does not have the account shape.
    pub fn from_document(document: &Document) -> Result<Self> {
        serde_json::from_value(serde_json::Value::Object(document.data.clone()))
            .with_context(|| format!("malformed account record {}", document.id))
    }

    /// Write for a new account; `createdAt` is filled in by the store.
    #[must_use]
    pub fn new_write(email: &str, role: &str) -> DocumentWrite {
        DocumentWrite::new()
            .with_field(FIELD_EMAIL, email)
            .with_field(FIELD_ROLE, role)
            .with_server_timestamp(FIELD_CREATED_AT)
    }
}
