//! Test doubles for the storage ports

use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use chrono::{DateTime, Duration, TimeZone, Utc};
use parking_lot::Mutex;

use artifactgraph_storage::{
    Artifact, ArtifactModel, ArtifactType, BatchItem, BatchItemResult, Criteria, RecordSummary,
    RelationshipContext, RelationshipUpdate, StorageEngine, StorageError,
};

/// Fixed reference instant for deterministic timestamps
pub fn epoch() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 6, 1, 12, 0, 0).unwrap()
}

/// Builder for canned lookup results
#[derive(Debug, Default, Clone)]
pub struct SummaryBuilder {
    summaries: Vec<(RecordSummary, Criteria)>,
}

impl SummaryBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a record created `offset_secs` after [`epoch`] that matches `criteria`
    pub fn with_record(mut self, uuid: &str, kind: ArtifactType, offset_secs: i64, criteria: &[(&str, &str)]) -> Self {
        let summary = RecordSummary {
            uuid: uuid.to_string(),
            artifact_type: kind,
            name: uuid.to_string(),
            created_at: epoch() + Duration::seconds(offset_secs),
        };
        let criteria = criteria
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        self.summaries.push((summary, criteria));
        self
    }

    pub fn build(self) -> ScriptedContext {
        ScriptedContext {
            summaries: self.summaries,
            queries: AtomicUsize::new(0),
        }
    }
}

/// Lookup context answering from a fixed list
///
/// A record matches when its kind and model match and every requested
/// criteria entry equals the record's entry.
#[derive(Debug)]
pub struct ScriptedContext {
    summaries: Vec<(RecordSummary, Criteria)>,
    queries: AtomicUsize,
}

impl ScriptedContext {
    pub fn query_count(&self) -> usize {
        self.queries.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl RelationshipContext for ScriptedContext {
    async fn find_records(
        &self,
        scope: ArtifactModel,
        kind: ArtifactType,
        criteria: &Criteria,
    ) -> artifactgraph_storage::Result<Vec<RecordSummary>> {
        self.queries.fetch_add(1, Ordering::SeqCst);
        Ok(self
            .summaries
            .iter()
            .filter(|(s, _)| s.artifact_type == kind && kind.model() == scope)
            .filter(|(_, c)| criteria.iter().all(|(k, v)| c.get(k) == Some(v)))
            .map(|(s, _)| s.clone())
            .collect())
    }
}

/// Lookup context whose every query fails
#[derive(Debug, Default)]
pub struct FailingContext;

#[async_trait]
impl RelationshipContext for FailingContext {
    async fn find_records(
        &self,
        _scope: ArtifactModel,
        _kind: ArtifactType,
        _criteria: &Criteria,
    ) -> artifactgraph_storage::Result<Vec<RecordSummary>> {
        Err(StorageError::query("index unavailable"))
    }
}

/// Storage engine that records every call and stores nothing
#[derive(Debug, Default)]
pub struct RecordingEngine {
    pub batches: Mutex<Vec<Vec<BatchItem>>>,
    pub updates: Mutex<Vec<RelationshipUpdate>>,
    /// Correlation id to reject, if any
    pub reject: Option<String>,
}

impl RecordingEngine {
    pub fn rejecting(correlation_id: &str) -> Self {
        Self {
            reject: Some(correlation_id.to_string()),
            ..Self::default()
        }
    }

    pub fn batch_calls(&self) -> usize {
        self.batches.lock().len()
    }
}

#[async_trait]
impl StorageEngine for RecordingEngine {
    async fn persist_batch(&self, items: Vec<BatchItem>) -> artifactgraph_storage::Result<Vec<BatchItemResult>> {
        let rejected = items
            .iter()
            .any(|item| self.reject.as_deref() == Some(item.correlation_id.as_str()));
        let results = items
            .iter()
            .map(|item| {
                let correlation_id = item.correlation_id.clone();
                if self.reject.as_deref() == Some(item.correlation_id.as_str()) {
                    BatchItemResult::Failed {
                        correlation_id,
                        message: "rejected".to_string(),
                    }
                } else if rejected {
                    BatchItemResult::RolledBack { correlation_id }
                } else {
                    BatchItemResult::Stored {
                        correlation_id,
                        summary: item.artifact.summary(),
                    }
                }
            })
            .collect();
        self.batches.lock().push(items);
        Ok(results)
    }

    async fn persist_relationships(&self, updates: Vec<RelationshipUpdate>) -> artifactgraph_storage::Result<usize> {
        let count = updates.len();
        self.updates.lock().extend(updates);
        Ok(count)
    }

    async fn get_artifact(&self, uuid: &str) -> artifactgraph_storage::Result<Option<Artifact>> {
        Ok(self
            .batches
            .lock()
            .iter()
            .flatten()
            .find(|item| item.artifact.uuid() == uuid)
            .map(|item| item.artifact.clone()))
    }
}

#[async_trait]
impl RelationshipContext for RecordingEngine {
    async fn find_records(
        &self,
        _scope: ArtifactModel,
        _kind: ArtifactType,
        _criteria: &Criteria,
    ) -> artifactgraph_storage::Result<Vec<RecordSummary>> {
        Ok(Vec::new())
    }
}
