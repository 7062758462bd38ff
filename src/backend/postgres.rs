//! Document store on top of a Postgres `JSONB` table.
//!
//! Every document is one row of `documents` (see `sql/schema.sql`), keyed by
//! `(collection, id)`. Equality filters use `JSONB` containment so they can be
//! served by the GIN index. Server timestamps are taken from `now()` inside the
//! write statement.

use super::{Document, DocumentStore, DocumentWrite};
use anyhow::{Context, Result};
use async_trait::async_trait;
use serde_json::{Map, Value};
use sqlx::{Connection, PgPool, Row, postgres::PgPoolOptions, types::Json};
use std::time::Duration;
use tracing::{Instrument, info_span};

const FIND_BY_FIELD: &str = r"
    SELECT id, data
    FROM documents
    WHERE collection = $1 AND data @> $2
    ORDER BY created_at, id";

const GET: &str = "SELECT id, data FROM documents WHERE collection = $1 AND id = $2";

const PUT: &str = r"
    INSERT INTO documents (collection, id, data)
    VALUES ($1, $2, $3)
    ON CONFLICT (collection, id)
    DO UPDATE SET data = EXCLUDED.data, updated_at = now()";

const PUT_WITH_SERVER_TIMESTAMP: &str = r"
    INSERT INTO documents (collection, id, data)
    VALUES ($1, $2, $3 || jsonb_build_object($4::text, now()))
    ON CONFLICT (collection, id)
    DO UPDATE SET data = EXCLUDED.data, updated_at = now()";

#[derive(Clone, Debug)]
pub struct PgDocumentStore {
    pool: PgPool,
}

impl PgDocumentStore {
    /// Connect a small pool to the database behind `dsn`.
    ///
    /// # Errors
    /// Returns an error if the database cannot be reached.
    pub async fn connect(dsn: &str) -> Result<Self> {
        let pool = PgPoolOptions::new()
            .min_connections(1)
            .max_connections(5)
            .max_lifetime(Duration::from_secs(60 * 2))
            .test_before_acquire(true)
            .connect(dsn)
            .await
            .context("Failed to connect to database")?;

        Ok(Self::from_pool(pool))
    }

    #[must_use]
    pub const fn from_pool(pool: PgPool) -> Self {
        Self { pool }
    }

    #[must_use]
    pub const fn pool(&self) -> &PgPool {
        &self.pool
    }
}

fn query_span(operation: &'static str, statement: &'static str) -> tracing::Span {
    info_span!(
        "db.query",
        db.system = "postgresql",
        db.operation = operation,
        db.statement = statement
    )
}

fn row_to_document(row: &sqlx::postgres::PgRow) -> Result<Document> {
    let id: String = row.try_get("id").context("failed to decode document id")?;
    let Json(data): Json<Map<String, Value>> =
        row.try_get("data").context("failed to decode document data")?;

    Ok(Document { id, data })
}

#[async_trait]
impl DocumentStore for PgDocumentStore {
    async fn find_by_field(
        &self,
        collection: &str,
        field: &str,
        value: &Value,
    ) -> Result<Vec<Document>> {
        let mut filter = Map::new();
        filter.insert(field.to_string(), value.clone());

        let rows = sqlx::query(FIND_BY_FIELD)
            .bind(collection)
            .bind(Json(Value::Object(filter)))
            .fetch_all(&self.pool)
            .instrument(query_span("SELECT", FIND_BY_FIELD))
            .await
            .with_context(|| format!("failed to query {collection} by {field}"))?;

        rows.iter().map(row_to_document).collect()
    }

    async fn get(&self, collection: &str, key: &str) -> Result<Option<Document>> {
        let row = sqlx::query(GET)
            .bind(collection)
            .bind(key)
            .fetch_optional(&self.pool)
            .instrument(query_span("SELECT", GET))
            .await
            .with_context(|| format!("failed to read {collection}/{key}"))?;

        row.as_ref().map(row_to_document).transpose()
    }

    async fn put(&self, collection: &str, key: &str, write: DocumentWrite) -> Result<()> {
        let (fields, server_timestamp) = write.into_parts();
        let data = Json(Value::Object(fields));

        let result = match server_timestamp {
            Some(field) => {
                sqlx::query(PUT_WITH_SERVER_TIMESTAMP)
                    .bind(collection)
                    .bind(key)
                    .bind(data)
                    .bind(field)
                    .execute(&self.pool)
                    .instrument(query_span("INSERT", PUT_WITH_SERVER_TIMESTAMP))
                    .await
            }
            None => {
                sqlx::query(PUT)
                    .bind(collection)
                    .bind(key)
                    .bind(data)
                    .execute(&self.pool)
                    .instrument(query_span("INSERT", PUT))
                    .await
            }
        };

        result.with_context(|| format!("failed to write {collection}/{key}"))?;

        Ok(())
    }

    async fn ping(&self) -> Result<()> {
        let acquire_span = info_span!(
            "db.acquire",
            db.system = "postgresql",
            db.operation = "ACQUIRE"
        );
        let mut conn = self
            .pool
            .acquire()
            .instrument(acquire_span)
            .await
            .context("Failed to acquire database connection")?;

        let ping_span = info_span!("db.ping", db.system = "postgresql", db.operation = "PING");
        conn.ping()
            .instrument(ping_span)
            .await
            .context("Failed to ping database")
    }
}
