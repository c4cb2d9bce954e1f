//! Builder contract
//!
//! A builder turns one primary record into derived records in two phases:
//!
//! 1. `derive_artifacts`: pure structural pass over the content, no lookups
//! 2. `link_relationships`: resolve the references phase 1 deferred, against
//!    records that are already persisted
//!
//! Phase ordering is enforced by [`super::lifecycle`]; implementors only see
//! the calls in the right order.

use std::collections::BTreeMap;

use async_trait::async_trait;

use artifactgraph_storage::{DerivedRecord, PrimaryRecord, RelationshipContext, RelationshipUpdate};

use crate::errors::Result;
use crate::shared::RawContent;

/// Updates produced by phase 2
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LinkReport {
    pub updates: Vec<RelationshipUpdate>,
    pub resolved: usize,
    pub unresolved: usize,
}

impl LinkReport {
    pub fn merge(&mut self, other: LinkReport) {
        self.updates.extend(other.updates);
        self.resolved += other.resolved;
        self.unresolved += other.unresolved;
    }
}

#[async_trait]
pub trait ArtifactBuilder: Send {
    /// Stable name used in logs
    fn name(&self) -> &'static str;

    /// Phase 1: populate the derived records from `content`
    ///
    /// May update the primary record's own attributes (encoding, name,
    /// target namespace). On error no derived record is valid.
    fn derive_artifacts(&mut self, primary: &mut PrimaryRecord, content: &RawContent) -> Result<()>;

    /// Derived records in emission order
    fn derived_artifacts(&self) -> &[DerivedRecord];

    /// Content attached to derived records, keyed by record uuid
    fn derived_content(&self) -> &BTreeMap<String, Vec<u8>>;

    /// Phase 2: resolve deferred references
    ///
    /// Fail-fast: the first failing lookup aborts the whole phase.
    async fn link_relationships(&mut self, context: &dyn RelationshipContext) -> Result<LinkReport>;
}
