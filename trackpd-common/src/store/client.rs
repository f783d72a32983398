//! Store client
//!
//! One `StoreClient` is constructed per process at startup and handed to every
//! component that reads or writes records. `close()` is the explicit teardown.

use crate::models::{Document, DocumentKey};
use crate::store::StoreCredentials;
use crate::{Error, Result};
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions};
use sqlx::SqlitePool;
use std::time::Duration;
use tracing::{debug, info};
use uuid::Uuid;

/// Build the path of a collection nested under a document
pub fn subcollection_path(collection: &str, id: &str, subcollection: &str) -> String {
    format!("{}/{}/{}", collection, id, subcollection)
}

/// Handle to the document store
#[derive(Clone, Debug)]
pub struct StoreClient {
    pool: SqlitePool,
    project_id: String,
}

impl StoreClient {
    /// Open (creating if needed) the store named by `credentials`
    pub async fn connect(credentials: &StoreCredentials) -> Result<Self> {
        let db_path = &credentials.database;
        if let Some(parent) = db_path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }

        let newly_created = !db_path.exists();

        let options = SqliteConnectOptions::new()
            .filename(db_path)
            .create_if_missing(true)
            .journal_mode(SqliteJournalMode::Wal)
            .busy_timeout(Duration::from_millis(5000));

        let pool = SqlitePoolOptions::new()
            .max_connections(5)
            .connect_with(options)
            .await?;

        if newly_created {
            info!("Initialized new store: {}", db_path.display());
        } else {
            info!("Opened existing store: {}", db_path.display());
        }

        Self::from_pool(pool, credentials.project_id.clone()).await
    }

    /// Open a private in-memory store
    pub async fn open_in_memory() -> Result<Self> {
        // Every connection to :memory: is a separate database, so pin to one
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .idle_timeout(None)
            .max_lifetime(None)
            .connect("sqlite::memory:")
            .await?;

        Self::from_pool(pool, "in-memory".to_string()).await
    }

    /// Wrap an existing pool, creating the document table if needed
    pub async fn from_pool(pool: SqlitePool, project_id: String) -> Result<Self> {
        create_documents_table(&pool).await?;
        Ok(Self { pool, project_id })
    }

    pub fn project_id(&self) -> &str {
        &self.project_id
    }

    /// Fetch one document; `None` when it does not exist
    pub async fn get_document(&self, key: &DocumentKey) -> Result<Option<Document>> {
        let body: Option<String> = sqlx::query_scalar(
            "SELECT body FROM documents WHERE collection = ? AND doc_id = ?",
        )
        .bind(&key.collection)
        .bind(&key.id)
        .fetch_optional(&self.pool)
        .await?;

        body.map(|b| parse_body(&b)).transpose()
    }

    /// Fetch every document of a collection in insertion order
    pub async fn list_collection(&self, collection: &str) -> Result<Vec<Document>> {
        let bodies: Vec<String> = sqlx::query_scalar(
            "SELECT body FROM documents WHERE collection = ? ORDER BY seq",
        )
        .bind(collection)
        .fetch_all(&self.pool)
        .await?;

        debug!("Listed {} documents from {}", bodies.len(), collection);
        bodies.iter().map(|b| parse_body(b)).collect()
    }

    /// Create or replace a document under a caller-chosen id
    ///
    /// Replacing keeps the document's original position in traversal order.
    pub async fn set_document(&self, key: &DocumentKey, body: &Document) -> Result<()> {
        let json = serde_json::to_string(body)?;
        sqlx::query(
            r#"
            INSERT INTO documents (collection, doc_id, body)
            VALUES (?, ?, ?)
            ON CONFLICT(collection, doc_id) DO UPDATE SET body = excluded.body
            "#,
        )
        .bind(&key.collection)
        .bind(&key.id)
        .bind(json)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Insert a new document under a server-assigned id, returning the id
    pub async fn add_document(&self, collection: &str, body: &Document) -> Result<String> {
        if collection.trim().is_empty() {
            return Err(Error::InvalidInput("collection path is empty".to_string()));
        }

        let id = Uuid::new_v4().simple().to_string();
        let json = serde_json::to_string(body)?;
        sqlx::query("INSERT INTO documents (collection, doc_id, body) VALUES (?, ?, ?)")
            .bind(collection)
            .bind(&id)
            .bind(json)
            .execute(&self.pool)
            .await?;

        debug!("Added document {}/{}", collection, id);
        Ok(id)
    }

    /// Count documents in a collection
    pub async fn count(&self, collection: &str) -> Result<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM documents WHERE collection = ?")
            .bind(collection)
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }

    /// Close every pooled connection
    pub async fn close(&self) {
        self.pool.close().await;
        info!("Store {} closed", self.project_id);
    }
}

fn parse_body(body: &str) -> Result<Document> {
    Ok(serde_json::from_str(body)?)
}

async fn create_documents_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS documents (
            seq INTEGER PRIMARY KEY AUTOINCREMENT,
            collection TEXT NOT NULL,
            doc_id TEXT NOT NULL,
            body TEXT NOT NULL,
            created_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP,
            UNIQUE(collection, doc_id)
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query("CREATE INDEX IF NOT EXISTS idx_documents_collection ON documents(collection, seq)")
        .execute(pool)
        .await?;

    Ok(())
}
