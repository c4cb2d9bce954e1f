//! Batch hand-off types

use serde::{Deserialize, Serialize};

use super::record::{Artifact, RecordSummary};

/// One entry of a batch persist call
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BatchItem {
    /// Synthetic id used to correlate results with inputs
    pub correlation_id: String,
    pub artifact: Artifact,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content: Option<Vec<u8>>,
    pub origin_path: String,
}

/// Per-item outcome of a batch persist call
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "camelCase")]
pub enum BatchItemResult {
    Stored {
        correlation_id: String,
        summary: RecordSummary,
    },
    Failed {
        correlation_id: String,
        message: String,
    },
    /// Valid on its own, discarded because another item of the batch failed
    RolledBack { correlation_id: String },
}

impl BatchItemResult {
    pub fn correlation_id(&self) -> &str {
        match self {
            BatchItemResult::Stored { correlation_id, .. }
            | BatchItemResult::Failed { correlation_id, .. }
            | BatchItemResult::RolledBack { correlation_id } => correlation_id,
        }
    }

    pub fn is_stored(&self) -> bool {
        matches!(self, BatchItemResult::Stored { .. })
    }

    pub fn summary(&self) -> Option<&RecordSummary> {
        match self {
            BatchItemResult::Stored { summary, .. } => Some(summary),
            BatchItemResult::Failed { .. } | BatchItemResult::RolledBack { .. } => None,
        }
    }

    pub fn is_failed(&self) -> bool {
        matches!(self, BatchItemResult::Failed { .. })
    }
}
