//! In-process backends for `--backend memory` and tests.
//!
//! Both keep their state behind a `tokio::sync::RwLock` and can be shared
//! through an `Arc` across request handlers.

use super::{Document, DocumentStore, DocumentWrite, IdentityProvider};
use anyhow::{Result, anyhow};
use async_trait::async_trait;
use chrono::Utc;
use regex::Regex;
use secrecy::{ExposeSecret, SecretString};
use serde_json::{Value, json};
use std::collections::HashMap;
use tokio::sync::RwLock;
use tracing::debug;
use ulid::Ulid;

const MIN_PASSWORD_LENGTH: usize = 6;

/// Lightweight email sanity check, same shape the managed provider enforces.
pub fn valid_email(email: &str) -> bool {
    Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").is_ok_and(|re| re.is_match(email))
}

/// Identity provider that keeps credentials in memory.
///
/// Rejections use the managed provider's error codes so callers see the same
/// messages in both modes.
#[derive(Debug, Default)]
pub struct MemoryIdentityProvider {
    // email -> uid
    credentials: RwLock<HashMap<String, String>>,
}

impl MemoryIdentityProvider {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Uid registered for `email`, if any.
    pub async fn uid_for(&self, email: &str) -> Option<String> {
        self.credentials.read().await.get(email).cloned()
    }

    pub async fn len(&self) -> usize {
        self.credentials.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.credentials.read().await.is_empty()
    }
}

#[async_trait]
impl IdentityProvider for MemoryIdentityProvider {
    async fn create_credential(&self, email: &str, password: &SecretString) -> Result<String> {
        if !valid_email(email) {
            return Err(anyhow!("INVALID_EMAIL"));
        }

        if password.expose_secret().chars().count() < MIN_PASSWORD_LENGTH {
            return Err(anyhow!(
                "WEAK_PASSWORD : Password should be at least {MIN_PASSWORD_LENGTH} characters"
            ));
        }

        let mut credentials = self.credentials.write().await;

        if credentials.contains_key(email) {
            return Err(anyhow!("EMAIL_EXISTS"));
        }

        let uid = Ulid::new().to_string();
        credentials.insert(email.to_string(), uid.clone());

        debug!(uid = %uid, "credential created");

        Ok(uid)
    }
}

/// Document store that keeps collections in memory, in insertion order.
#[derive(Debug, Default)]
pub struct MemoryDocumentStore {
    collections: RwLock<HashMap<String, Vec<Document>>>,
}

impl MemoryDocumentStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of documents in `collection`.
    pub async fn count(&self, collection: &str) -> usize {
        self.collections
            .read()
            .await
            .get(collection)
            .map_or(0, Vec::len)
    }
}

#[async_trait]
impl DocumentStore for MemoryDocumentStore {
    async fn find_by_field(
        &self,
        collection: &str,
        field: &str,
        value: &Value,
    ) -> Result<Vec<Document>> {
        let collections = self.collections.read().await;

        Ok(collections
            .get(collection)
            .map(|docs| {
                docs.iter()
                    .filter(|doc| doc.data.get(field) == Some(value))
                    .cloned()
                    .collect()
            })
            .unwrap_or_default())
    }

    async fn get(&self, collection: &str, key: &str) -> Result<Option<Document>> {
        let collections = self.collections.read().await;

        Ok(collections
            .get(collection)
            .and_then(|docs| docs.iter().find(|doc| doc.id == key))
            .cloned())
    }

    async fn put(&self, collection: &str, key: &str, write: DocumentWrite) -> Result<()> {
        let (mut data, server_timestamp) = write.into_parts();

        if let Some(field) = server_timestamp {
            data.insert(field, json!(Utc::now().to_rfc3339()));
        }

        let mut collections = self.collections.write().await;
        let docs = collections.entry(collection.to_string()).or_default();

        // set semantics: replace in place to keep the original position
        if let Some(existing) = docs.iter_mut().find(|doc| doc.id == key) {
            existing.data = data;
        } else {
            docs.push(Document::new(key, data));
        }

        Ok(())
    }
}
