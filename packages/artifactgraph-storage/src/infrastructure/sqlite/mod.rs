//! SQLite adapter for the record store
//!
//! Records are stored as JSON documents next to a handful of indexed columns
//! (uuid, model, kind, created_at). Criteria are evaluated on the decoded
//! record so every adapter shares one matching rule.

use std::path::Path;

use async_trait::async_trait;
use parking_lot::Mutex;
use rusqlite::{params, Connection, OptionalExtension};
use tracing::debug;

use crate::domain::{
    Artifact, ArtifactModel, ArtifactType, BatchItem, BatchItemResult, Criteria, RecordSummary,
    RelationshipContext, RelationshipUpdate, StorageEngine,
};
use crate::error::{Result, StorageError};

use super::{content_digest, reject_conflicts};

const SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS artifacts (
    uuid          TEXT PRIMARY KEY,
    model         TEXT NOT NULL,
    artifact_type TEXT NOT NULL,
    name          TEXT NOT NULL,
    created_at    TEXT NOT NULL,
    origin_path   TEXT,
    content_hash  TEXT,
    content       BLOB,
    record        TEXT NOT NULL
);
CREATE INDEX IF NOT EXISTS idx_artifacts_kind ON artifacts(model, artifact_type);
"#;

/// Record store backed by SQLite
pub struct SqliteRecordStore {
    conn: Mutex<Connection>,
}

impl SqliteRecordStore {
    /// Open (or create) a database file
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        Self::with_connection(Connection::open(path)?)
    }

    /// Private in-memory database
    pub fn new_in_memory() -> Result<Self> {
        Self::with_connection(Connection::open_in_memory()?)
    }

    fn with_connection(conn: Connection) -> Result<Self> {
        conn.execute_batch(SCHEMA)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// Number of stored records
    pub fn count(&self) -> Result<usize> {
        let conn = self.conn.lock();
        let count: i64 = conn.query_row("SELECT COUNT(*) FROM artifacts", [], |row| row.get(0))?;
        usize::try_from(count).map_err(|e| {
            StorageError::database(format!("record count out of range: {}", count)).with_source(e)
        })
    }

    /// SHA-256 of the stored content, hex encoded
    pub fn content_hash(&self, uuid: &str) -> Result<Option<String>> {
        let conn = self.conn.lock();
        let hash: Option<Option<String>> = conn
            .query_row(
                "SELECT content_hash FROM artifacts WHERE uuid = ?1",
                params![uuid],
                |row| row.get(0),
            )
            .optional()?;
        Ok(hash.flatten())
    }
}

fn load(conn: &Connection, uuid: &str) -> Result<Option<Artifact>> {
    let json: Option<String> = conn
        .query_row(
            "SELECT record FROM artifacts WHERE uuid = ?1",
            params![uuid],
            |row| row.get(0),
        )
        .optional()?;
    json.map(|j| serde_json::from_str(&j).map_err(StorageError::from))
        .transpose()
}

#[async_trait]
impl StorageEngine for SqliteRecordStore {
    async fn persist_batch(&self, items: Vec<BatchItem>) -> Result<Vec<BatchItemResult>> {
        let mut conn = self.conn.lock();
        let tx = conn.transaction()?;

        // Dropping the transaction without commit rolls it back
        if let Some(rejected) = reject_conflicts(&items, |uuid| Ok(load(&tx, uuid)?.is_some()))? {
            debug!(items = rejected.len(), "sqlite store rejected batch");
            return Ok(rejected);
        }

        let mut results = Vec::with_capacity(items.len());
        for item in items {
            let artifact = &item.artifact;
            let record = serde_json::to_string(artifact)?;
            let digest = item.content.as_deref().map(content_digest);
            tx.execute(
                "INSERT INTO artifacts (uuid, model, artifact_type, name, created_at, origin_path, content_hash, content, record)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
                params![
                    artifact.uuid(),
                    artifact.artifact_type().model().as_str(),
                    artifact.artifact_type().as_str(),
                    artifact.meta().name,
                    artifact.created_at().to_rfc3339(),
                    item.origin_path,
                    digest,
                    item.content,
                    record,
                ],
            )?;
            results.push(BatchItemResult::Stored {
                summary: artifact.summary(),
                correlation_id: item.correlation_id,
            });
        }

        tx.commit()
            .map_err(|e| StorageError::transaction(format!("batch commit failed: {}", e)).with_source(e))?;
        debug!(items = results.len(), "sqlite store persisted batch");
        Ok(results)
    }

    async fn persist_relationships(&self, updates: Vec<RelationshipUpdate>) -> Result<usize> {
        let mut conn = self.conn.lock();
        let tx = conn.transaction()?;

        for update in &updates {
            let mut artifact =
                load(&tx, &update.owner)?.ok_or_else(|| StorageError::record_not_found(update.owner.clone()))?;
            artifact.apply(update);
            tx.execute(
                "UPDATE artifacts SET record = ?1 WHERE uuid = ?2",
                params![serde_json::to_string(&artifact)?, update.owner],
            )?;
        }

        tx.commit()
            .map_err(|e| StorageError::transaction(format!("relationship commit failed: {}", e)).with_source(e))?;
        Ok(updates.len())
    }

    async fn get_artifact(&self, uuid: &str) -> Result<Option<Artifact>> {
        let conn = self.conn.lock();
        load(&conn, uuid)
    }
}

#[async_trait]
impl RelationshipContext for SqliteRecordStore {
    async fn find_records(
        &self,
        scope: ArtifactModel,
        kind: ArtifactType,
        criteria: &Criteria,
    ) -> Result<Vec<RecordSummary>> {
        let conn = self.conn.lock();
        let mut stmt = conn.prepare(
            "SELECT record FROM artifacts WHERE model = ?1 AND artifact_type = ?2 ORDER BY rowid",
        )?;
        let rows = stmt.query_map(params![scope.as_str(), kind.as_str()], |row| {
            row.get::<_, String>(0)
        })?;

        let mut found = Vec::new();
        for row in rows {
            let artifact: Artifact = serde_json::from_str(&row?)?;
            if artifact.matches(criteria) {
                found.push(artifact.summary());
            }
        }
        Ok(found)
    }
}
