//! Capability traits for the external systems the gateway depends on.
//!
//! The gateway never talks to a concrete client. It receives an
//! [`IdentityProvider`] and a [`DocumentStore`] at construction time, so the
//! managed services, the embedded memory backend and test doubles are
//! interchangeable.

pub mod identity_toolkit;
pub mod memory;
pub mod postgres;

pub use identity_toolkit::IdentityToolkitProvider;
pub use memory::{MemoryDocumentStore, MemoryIdentityProvider};
pub use postgres::PgDocumentStore;

use anyhow::Result;
use async_trait::async_trait;
use secrecy::SecretString;
use serde_json::{Map, Value};

/// Creates login credentials and hands out the unique id for each of them.
#[async_trait]
pub trait IdentityProvider: Send + Sync {
    /// Create a credential for `email`/`password` and return the provider uid.
    ///
    /// # Errors
    /// Returns the provider's rejection (invalid email, weak password, duplicate
    /// account) or a transport failure. The error message is shown to callers.
    async fn create_credential(&self, email: &str, password: &SecretString) -> Result<String>;
}

/// Schema-flexible document storage organised in collections.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// All documents in `collection` whose `field` equals `value`, oldest first.
    ///
    /// # Errors
    /// Returns an error if the store cannot be queried.
    async fn find_by_field(
        &self,
        collection: &str,
        field: &str,
        value: &Value,
    ) -> Result<Vec<Document>>;

    /// Read a single document by key.
    ///
    /// # Errors
    /// Returns an error if the store cannot be queried.
    async fn get(&self, collection: &str, key: &str) -> Result<Option<Document>>;

    /// Write (create or replace) the document at `key`.
    ///
    /// # Errors
    /// Returns an error if the write is rejected or the store is unreachable.
    async fn put(&self, collection: &str, key: &str, write: DocumentWrite) -> Result<()>;

    /// Reachability probe used by `/health`.
    ///
    /// # Errors
    /// Returns an error if the store is unavailable.
    async fn ping(&self) -> Result<()> {
        Ok(())
    }
}

/// A stored document and its key.
#[derive(Clone, Debug, PartialEq)]
pub struct Document {
    pub id: String,
    pub data: Map<String, Value>,
}

impl Document {
    #[must_use]
    pub fn new(id: impl Into<String>, data: Map<String, Value>) -> Self {
        Self {
            id: id.into(),
            data,
        }
    }

    /// String value of `field`, if present and a string.
    #[must_use]
    pub fn get_str(&self, field: &str) -> Option<&str> {
        self.data.get(field).and_then(Value::as_str)
    }
}

/// Fields to write, plus an optional field the store fills with its own clock.
#[derive(Clone, Debug, Default)]
pub struct DocumentWrite {
    fields: Map<String, Value>,
    server_timestamp: Option<String>,
}

impl DocumentWrite {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_field(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.fields.insert(name.into(), value.into());
        self
    }

    /// Ask the store to set `name` to its current time when the write lands.
    #[must_use]
    pub fn with_server_timestamp(mut self, name: impl Into<String>) -> Self {
        self.server_timestamp = Some(name.into());
        self
    }

    #[must_use]
    pub fn fields(&self) -> &Map<String, Value> {
        &self.fields
    }

    #[must_use]
    pub fn server_timestamp(&self) -> Option<&str> {
        self.server_timestamp.as_deref()
    }

    #[must_use]
    pub fn into_parts(self) -> (Map<String, Value>, Option<String>) {
        (self.fields, self.server_timestamp)
    }
}
