//! Infrastructure layer - Storage adapters
//!
//! - `memory`: in-process store (always available)
//! - `sqlite`: file or in-memory SQLite database (feature `sqlite`)

pub mod memory;

#[cfg(feature = "sqlite")]
pub mod sqlite;

pub use memory::MemoryRecordStore;

#[cfg(feature = "sqlite")]
pub use sqlite::SqliteRecordStore;

use std::collections::HashSet;

use sha2::{Digest, Sha256};

use crate::domain::{BatchItem, BatchItemResult};
use crate::error::{Result, StorageError};

/// Hex-encoded SHA-256 of a content buffer
pub(crate) fn content_digest(bytes: &[u8]) -> String {
    Sha256::digest(bytes)
        .iter()
        .map(|b| format!("{:02x}", b))
        .collect()
}

/// Conflict check run before anything of a batch is written
///
/// Returns `None` when every item can be stored. Otherwise returns the
/// results of a batch that stores nothing: conflicting items (already stored
/// or repeated within the batch) fail, the rest are rolled back.
pub(crate) fn reject_conflicts(
    items: &[BatchItem],
    mut exists: impl FnMut(&str) -> Result<bool>,
) -> Result<Option<Vec<BatchItemResult>>> {
    let mut seen = HashSet::with_capacity(items.len());
    let mut conflicts = Vec::with_capacity(items.len());
    for item in items {
        let uuid = item.artifact.uuid();
        conflicts.push(!seen.insert(uuid) || exists(uuid)?);
    }
    if !conflicts.contains(&true) {
        return Ok(None);
    }

    let results = items
        .iter()
        .zip(conflicts)
        .map(|(item, conflict)| {
            let correlation_id = item.correlation_id.clone();
            if conflict {
                BatchItemResult::Failed {
                    correlation_id,
                    message: StorageError::conflict(item.artifact.uuid()).to_string(),
                }
            } else {
                BatchItemResult::RolledBack { correlation_id }
            }
        })
        .collect();
    Ok(Some(results))
}
