//! Domain layer for the artifact record store
//!
//! # Domain Models
//!
//! - `ArtifactType` / `ArtifactModel`: closed catalogue of record kinds
//! - `PrimaryRecord`: the artifact as uploaded
//! - `DerivedRecord`: records manufactured from a primary record's structure
//! - `Target` / `Relationship`: typed and generic edges between records
//! - `BatchItem`: one (record, content, origin path) entry of a batch
//!
//! # Port Traits
//!
//! - `StorageEngine`: batch persistence and relationship updates
//! - `RelationshipContext`: read-through lookups over persisted records
//!
//! # Examples
//!
//! ```rust,ignore
//! use artifactgraph_storage::domain::{Criteria, RelationshipContext, ArtifactModel, ArtifactType};
//!
//! async fn newest_schema(ctx: &dyn RelationshipContext, ns: &str) -> Result<Option<String>> {
//!     let mut criteria = Criteria::new();
//!     criteria.insert("targetNamespace".into(), ns.into());
//!     let found = ctx
//!         .find_records(ArtifactModel::Xsd, ArtifactType::XsdDocument, &criteria)
//!         .await?;
//!     Ok(found.into_iter().max_by_key(|s| s.created_at).map(|s| s.uuid))
//! }
//! ```

pub mod artifact_type;
pub mod batch;
pub mod record;
pub mod relationship;

use async_trait::async_trait;

use crate::Result;

pub use artifact_type::{ArtifactModel, ArtifactType};
pub use batch::{BatchItem, BatchItemResult};
pub use record::{criteria_keys, Artifact, ArtifactMeta, Criteria, DerivedBody, DerivedRecord, PrimaryRecord, RecordSummary};
pub use relationship::{names, Relationship, RelationshipUpdate, SlotChange, Target};

// ═══════════════════════════════════════════════════════════════════════════
// Port Traits
// ═══════════════════════════════════════════════════════════════════════════

/// Durable record storage
///
/// `persist_batch` is the single hand-off point for a batch. A batch is stored
/// whole or not at all: when any item fails, the others come back as
/// [`BatchItemResult::RolledBack`] and the store is left unchanged.
#[async_trait]
pub trait StorageEngine: Send + Sync {
    /// Persist every item, returning one result per item in input order
    async fn persist_batch(&self, items: Vec<BatchItem>) -> Result<Vec<BatchItemResult>>;

    /// Apply relationship updates to already persisted records
    ///
    /// Returns the number of updates applied. Unknown owners are an error.
    async fn persist_relationships(&self, updates: Vec<RelationshipUpdate>) -> Result<usize>;

    /// Fetch a persisted record by identifier
    async fn get_artifact(&self, uuid: &str) -> Result<Option<Artifact>>;
}

/// Read-through query facade over persisted records
#[async_trait]
pub trait RelationshipContext: Send + Sync {
    /// Find records of `kind` within `scope` matching every criteria entry
    async fn find_records(
        &self,
        scope: ArtifactModel,
        kind: ArtifactType,
        criteria: &Criteria,
    ) -> Result<Vec<RecordSummary>>;
}
