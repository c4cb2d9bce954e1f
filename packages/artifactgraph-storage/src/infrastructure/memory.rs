//! In-memory record store
//!
//! Backs tests and single-process deployments. Records live in insertion
//! order; lookups scan the records of the requested kind only.

use std::collections::HashMap;

use async_trait::async_trait;
use parking_lot::RwLock;
use tracing::debug;

use crate::domain::{
    Artifact, ArtifactModel, ArtifactType, BatchItem, BatchItemResult, Criteria, RecordSummary,
    RelationshipContext, RelationshipUpdate, StorageEngine,
};
use crate::error::{Result, StorageError};

use super::{content_digest, reject_conflicts};

#[derive(Default)]
struct StoreState {
    records: Vec<Artifact>,
    positions: HashMap<String, usize>,
    by_type: HashMap<ArtifactType, Vec<usize>>,
    contents: HashMap<String, Vec<u8>>,
    digests: HashMap<String, String>,
    batch_calls: usize,
}

impl StoreState {
    fn insert(&mut self, artifact: Artifact, content: Option<Vec<u8>>) {
        let uuid = artifact.uuid().to_string();
        let idx = self.records.len();
        self.by_type.entry(artifact.artifact_type()).or_default().push(idx);
        self.positions.insert(uuid.clone(), idx);
        if let Some(bytes) = content {
            self.digests.insert(uuid.clone(), content_digest(&bytes));
            self.contents.insert(uuid, bytes);
        }
        self.records.push(artifact);
    }
}

/// Record store held entirely in memory
#[derive(Default)]
pub struct MemoryRecordStore {
    state: RwLock<StoreState>,
}

impl MemoryRecordStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of persisted records
    pub fn len(&self) -> usize {
        self.state.read().records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Number of `persist_batch` calls served
    pub fn batch_calls(&self) -> usize {
        self.state.read().batch_calls
    }

    /// Stored raw content for a record
    pub fn content(&self, uuid: &str) -> Option<Vec<u8>> {
        self.state.read().contents.get(uuid).cloned()
    }

    /// SHA-256 of the stored content, hex encoded
    pub fn content_hash(&self, uuid: &str) -> Option<String> {
        self.state.read().digests.get(uuid).cloned()
    }

    /// Snapshot of every stored record
    pub fn artifacts(&self) -> Vec<Artifact> {
        self.state.read().records.clone()
    }

    /// Seeds a record outside of a batch (fixtures, migrations)
    pub fn insert(&self, artifact: Artifact) -> Result<()> {
        let mut state = self.state.write();
        if state.positions.contains_key(artifact.uuid()) {
            return Err(StorageError::conflict(artifact.uuid()));
        }
        state.insert(artifact, None);
        Ok(())
    }
}

#[async_trait]
impl StorageEngine for MemoryRecordStore {
    async fn persist_batch(&self, items: Vec<BatchItem>) -> Result<Vec<BatchItemResult>> {
        let mut state = self.state.write();
        state.batch_calls += 1;

        if let Some(rejected) = reject_conflicts(&items, |uuid| Ok(state.positions.contains_key(uuid)))? {
            debug!(items = rejected.len(), "memory store rejected batch");
            return Ok(rejected);
        }

        let mut results = Vec::with_capacity(items.len());
        for item in items {
            let BatchItem {
                correlation_id,
                artifact,
                content,
                ..
            } = item;

            let summary = artifact.summary();
            state.insert(artifact, content);
            results.push(BatchItemResult::Stored {
                correlation_id,
                summary,
            });
        }

        debug!(items = results.len(), "memory store persisted batch");
        Ok(results)
    }

    async fn persist_relationships(&self, updates: Vec<RelationshipUpdate>) -> Result<usize> {
        let mut guard = self.state.write();
        let state = &mut *guard;

        // Validate owners first so a bad update leaves nothing half-applied
        if let Some(missing) = updates
            .iter()
            .find(|u| !state.positions.contains_key(&u.owner))
        {
            return Err(StorageError::record_not_found(missing.owner.clone()));
        }

        for update in &updates {
            if let Some(&idx) = state.positions.get(&update.owner) {
                state.records[idx].apply(update);
            }
        }
        Ok(updates.len())
    }

    async fn get_artifact(&self, uuid: &str) -> Result<Option<Artifact>> {
        let state = self.state.read();
        Ok(state
            .positions
            .get(uuid)
            .map(|&idx| state.records[idx].clone()))
    }
}

#[async_trait]
impl RelationshipContext for MemoryRecordStore {
    async fn find_records(
        &self,
        scope: ArtifactModel,
        kind: ArtifactType,
        criteria: &Criteria,
    ) -> Result<Vec<RecordSummary>> {
        if kind.model() != scope {
            return Ok(Vec::new());
        }

        let state = self.state.read();
        let found = state
            .by_type
            .get(&kind)
            .map(|indices| {
                indices
                    .iter()
                    .map(|&idx| &state.records[idx])
                    .filter(|artifact| artifact.matches(criteria))
                    .map(Artifact::summary)
                    .collect()
            })
            .unwrap_or_default();
        Ok(found)
    }
}
