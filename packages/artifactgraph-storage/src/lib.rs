//! Artifact record store: record model, storage ports and adapters
//!
//! ## Core Model
//!
//! 1. **Primary records**: artifacts as uploaded (documents and their content)
//! 2. **Derived records**: metadata entities manufactured from a primary
//!    record's structure, each carrying a `relatedDocument` back-reference
//! 3. **Relationships**: typed slots and generic named edges between records
//!
//! ## Ports
//!
//! - [`StorageEngine`]: one batch-persist call per upload, then relationship updates
//! - [`RelationshipContext`]: criteria lookups over persisted records
//!
//! ## Usage
//!
//! ```rust,ignore
//! use artifactgraph_storage::{MemoryRecordStore, StorageEngine};
//!
//! let store = MemoryRecordStore::new();
//! let results = store.persist_batch(items).await?;
//! store.persist_relationships(updates).await?;
//! ```

pub mod domain;
pub mod error;
pub mod infrastructure;

pub use error::{ErrorKind, Result, StorageError};

pub use domain::{
    criteria_keys, names, Artifact, ArtifactMeta, ArtifactModel, ArtifactType, BatchItem,
    BatchItemResult, Criteria, DerivedBody, DerivedRecord, PrimaryRecord, RecordSummary,
    Relationship, RelationshipContext, RelationshipUpdate, SlotChange, StorageEngine, Target,
};
pub use infrastructure::MemoryRecordStore;

#[cfg(feature = "sqlite")]
pub use infrastructure::SqliteRecordStore;
