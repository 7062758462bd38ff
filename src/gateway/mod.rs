//! Account gateway: signup and login against the injected backends.
//!
//! ## Signup
//!
//! 1. Presence checks (`email`, `password`, `role != "none"`).
//! 2. Uniqueness pre-check: any stored account with the same email is a 400.
//! 3. Credential creation in the identity provider, which issues the uid.
//! 4. Account record write at `<collection>/<uid>`.
//!
//! Steps 2 and 4 are not atomic, so concurrent signups for one email can both
//! pass the pre-check. A failed step 4 leaves the step 3 credential behind; it
//! is logged and never cleaned up.
//!
//! ## Login
//!
//! Looks up the first account with the email and returns its role. The
//! password is not checked.

pub mod error;
pub mod types;


pub use error::{GatewayError, MSG_INVALID_INPUT, MSG_MISSING_EMAIL};
pub use types::{
    AccountRecord, DEFAULT_USERS_COLLECTION, ErrorResponse, LoginRequest, LoginResponse,
    SignupRequest, SignupResponse,
};

use crate::backend::{DocumentStore, IdentityProvider};
use secrecy::SecretString;
use serde_json::Value;
use std::sync::Arc;
use tracing::{debug, instrument, warn};
use types::{FIELD_EMAIL, NO_ROLE};

/// Result of a successful signup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreatedAccount {
    pub uid: String,
}

/// Result of a successful login.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthenticatedAccount {
    pub role: Option<String>,
}

pub struct AccountGateway {
    identity: Arc<dyn IdentityProvider>,
    store: Arc<dyn DocumentStore>,
    collection: String,
}

impl AccountGateway {
    #[must_use]
    pub fn new(identity: Arc<dyn IdentityProvider>, store: Arc<dyn DocumentStore>) -> Self {
        Self {
            identity,
            store,
            collection: DEFAULT_USERS_COLLECTION.to_string(),
        }
    }

    #[must_use]
    pub fn with_collection(mut self, collection: String) -> Self {
        self.collection = collection;
        self
    }

    #[must_use]
    pub fn collection(&self) -> &str {
        &self.collection
    }

    #[must_use]
    pub fn store(&self) -> &Arc<dyn DocumentStore> {
        &self.store
    }

    /// Create an identity-provider credential and the matching account record.
    ///
    /// # Errors
    /// - `InvalidInput` if a field is missing/empty or the role is `none`.
    /// - `AlreadyExists` if an account with the email is already stored.
    /// - `IdentityProvider` / `Store` if a backend call fails.
    #[instrument(skip(self, request), fields(collection = %self.collection))]
    pub async fn create_account(
        &self,
        request: SignupRequest,
    ) -> Result<CreatedAccount, GatewayError> {
        let (Some(email), Some(password), Some(role)) = (
            present(request.email),
            present(request.password),
            present(request.role).filter(|role| role != NO_ROLE),
        ) else {
            return Err(GatewayError::InvalidInput(MSG_INVALID_INPUT));
        };

        let existing = self
            .store
            .find_by_field(&self.collection, FIELD_EMAIL, &Value::from(email.as_str()))
            .await
            .map_err(|err| GatewayError::store(&err))?;

        if !existing.is_empty() {
            debug!(matches = existing.len(), "account already exists");
            return Err(GatewayError::AlreadyExists);
        }

        let password = SecretString::from(password);
        let uid = self
            .identity
            .create_credential(&email, &password)
            .await
            .map_err(|err| GatewayError::identity(&err))?;

        self.store
            .put(
                &self.collection,
                &uid,
                AccountRecord::new_write(&email, &role),
            )
            .await
            .map_err(|err| {
                warn!(uid = %uid, "account record write failed, credential left without record");
                GatewayError::store(&err)
            })?;

        debug!(uid = %uid, "account created");

        Ok(CreatedAccount { uid })
    }

    /// Look up the account for `email` and return its role.
    ///
    /// # Errors
    /// - `InvalidInput` if the email is missing or empty.
    /// - `NotFound` if no account matches.
    /// - `Store` if the lookup fails or the record is malformed.
    #[instrument(skip(self, request), fields(collection = %self.collection))]
    pub async fn authenticate(
        &self,
        request: LoginRequest,
    ) -> Result<AuthenticatedAccount, GatewayError> {
        let Some(email) = present(request.email) else {
            return Err(GatewayError::InvalidInput(MSG_MISSING_EMAIL));
        };

        let matches = self
            .store
            .find_by_field(&self.collection, FIELD_EMAIL, &Value::from(email))
            .await
            .map_err(|err| GatewayError::store(&err))?;

        let Some(document) = matches.first() else {
            return Err(GatewayError::NotFound);
        };

        let record =
            AccountRecord::from_document(document).map_err(|err| GatewayError::store(&err))?;

        debug!(uid = %document.id, "login matched account");

        Ok(AuthenticatedAccount { role: record.role })
    }
}

impl std::fmt::Debug for AccountGateway {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AccountGateway")
            .field("collection", &self.collection)
            .finish_non_exhaustive()
    }
}

fn present(value: Option<String>) -> Option<String> {
    value.filter(|value| !value.is_empty())
}
