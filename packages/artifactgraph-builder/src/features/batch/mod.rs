//! Batch assembly
//!
//! Collects (record, content, origin path) triples and hands them to the
//! storage engine in exactly one `persist_batch` call. Each item carries a
//! correlation id `<path@package>` so per-item results can be traced back to
//! the archive entry they came from.

use tracing::{debug, info};

use artifactgraph_storage::{Artifact, BatchItem, BatchItemResult, StorageEngine};

use crate::errors::Result;

/// Correlation id for an origin path
pub fn correlation_id(origin_path: &str) -> String {
    format!("<{}@package>", origin_path)
}

#[derive(Debug, Default)]
pub struct BatchAssembler {
    items: Vec<BatchItem>,
}

impl BatchAssembler {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            items: Vec::with_capacity(capacity),
        }
    }

    /// Queue one item; returns its correlation id
    pub fn add(
        &mut self,
        artifact: impl Into<Artifact>,
        content: Option<Vec<u8>>,
        origin_path: impl Into<String>,
    ) -> String {
        let origin_path = origin_path.into();
        let id = correlation_id(&origin_path);
        self.items.push(BatchItem {
            correlation_id: id.clone(),
            artifact: artifact.into(),
            content,
            origin_path,
        });
        id
    }

    pub fn items(&self) -> &[BatchItem] {
        &self.items
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Submit everything in a single call
    ///
    /// Per-item outcomes come back as results; only an engine-level fault is
    /// an error.
    pub async fn execute(self, engine: &dyn StorageEngine) -> Result<Vec<BatchItemResult>> {
        let count = self.items.len();
        debug!(items = count, "submitting batch");

        let results = engine.persist_batch(self.items).await?;

        let failed = results.iter().filter(|r| !r.is_stored()).count();
        info!(items = count, failed, "batch persisted");
        Ok(results)
    }
}
