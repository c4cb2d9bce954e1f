//! Two-phase builder lifecycle as type-state
//!
//! ```text
//! Vec<Box<dyn ArtifactBuilder>>  --derive-->  DerivedBatch
//! DerivedBatch                   --persist--> PersistedBatch
//! PersistedBatch                 --link-->    LinkedBatch
//! ```
//!
//! `PersistedBatch` can only be obtained from a successful `persist`, so
//! linking before the batch is stored does not compile.

use tracing::{debug, info, warn};

use artifactgraph_storage::{
    BatchItemResult, DerivedRecord, PrimaryRecord, RelationshipContext, StorageEngine,
};

use super::ports::{ArtifactBuilder, LinkReport};
use crate::errors::{BuilderError, Result};
use crate::features::batch::BatchAssembler;
use crate::shared::RawContent;

/// Phase 1 done: primary record updated, derived records populated
pub struct DerivedBatch {
    primary: PrimaryRecord,
    content: RawContent,
    builders: Vec<Box<dyn ArtifactBuilder>>,
}

impl DerivedBatch {
    /// Run phase 1 of every builder, in registration order
    pub fn derive(
        mut primary: PrimaryRecord,
        content: RawContent,
        mut builders: Vec<Box<dyn ArtifactBuilder>>,
    ) -> Result<Self> {
        primary.content_size = content.len() as u64;

        for builder in builders.iter_mut() {
            builder.derive_artifacts(&mut primary, &content)?;
            debug!(
                builder = builder.name(),
                derived = builder.derived_artifacts().len(),
                "derive phase complete"
            );
        }

        Ok(Self {
            primary,
            content,
            builders,
        })
    }

    pub fn primary(&self) -> &PrimaryRecord {
        &self.primary
    }

    /// Derived records of all builders, in emission order
    pub fn derived(&self) -> impl Iterator<Item = &DerivedRecord> {
        self.builders.iter().flat_map(|b| b.derived_artifacts().iter())
    }

    pub fn derived_count(&self) -> usize {
        self.builders.iter().map(|b| b.derived_artifacts().len()).sum()
    }

    /// Batch of the primary record followed by every derived record
    ///
    /// Derived items use `<origin>#<uuid>` as their origin path.
    pub fn assemble(&self, origin_path: &str) -> BatchAssembler {
        let mut batch = BatchAssembler::with_capacity(1 + self.derived_count());
        batch.add(
            self.primary.clone(),
            Some(self.content.bytes().to_vec()),
            origin_path,
        );
        for builder in &self.builders {
            for record in builder.derived_artifacts() {
                let content = builder.derived_content().get(record.uuid()).cloned();
                batch.add(
                    record.clone(),
                    content,
                    format!("{}#{}", origin_path, record.uuid()),
                );
            }
        }
        batch
    }

    /// Drop the builders and keep only the records
    pub fn into_records(self) -> (PrimaryRecord, Vec<DerivedRecord>) {
        let derived = self
            .builders
            .iter()
            .flat_map(|b| b.derived_artifacts().iter().cloned())
            .collect();
        (self.primary, derived)
    }

    /// Persist the batch in one call
    ///
    /// Any per-item failure fails the whole upload: the engine stores nothing
    /// of a failed batch, and phase 2 must not run without it.
    pub async fn persist(self, engine: &dyn StorageEngine, origin_path: &str) -> Result<PersistedBatch> {
        let results = self.assemble(origin_path).execute(engine).await?;

        // Report the item that failed, not one rolled back with it
        let rejected = results
            .iter()
            .find(|r| r.is_failed())
            .or_else(|| results.iter().find(|r| !r.is_stored()));
        if let Some(rejected) = rejected {
            let message = match rejected {
                BatchItemResult::Failed { message, .. } => message.clone(),
                _ => "batch rolled back".to_string(),
            };
            warn!(correlation_id = %rejected.correlation_id(), "batch item rejected");
            return Err(BuilderError::Persist {
                correlation_id: rejected.correlation_id().to_string(),
                message,
            });
        }

        Ok(PersistedBatch {
            primary_uuid: self.primary.uuid().to_string(),
            builders: self.builders,
            results,
        })
    }
}

/// Batch stored; deferred relationships not yet resolved
pub struct PersistedBatch {
    primary_uuid: String,
    builders: Vec<Box<dyn ArtifactBuilder>>,
    results: Vec<BatchItemResult>,
}

impl std::fmt::Debug for PersistedBatch {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let names: Vec<&'static str> = self.builders.iter().map(|b| b.name()).collect();
        f.debug_struct("PersistedBatch")
            .field("primary_uuid", &self.primary_uuid)
            .field("builders", &names)
            .field("results", &self.results)
            .finish()
    }
}

impl PersistedBatch {
    pub fn primary_uuid(&self) -> &str {
        &self.primary_uuid
    }

    pub fn results(&self) -> &[BatchItemResult] {
        &self.results
    }

    /// Run phase 2 of every builder; stops at the first failing lookup
    pub async fn link(mut self, context: &dyn RelationshipContext) -> Result<LinkedBatch> {
        let mut report = LinkReport::default();
        for builder in self.builders.iter_mut() {
            let linked = builder.link_relationships(context).await?;
            debug!(
                builder = builder.name(),
                resolved = linked.resolved,
                unresolved = linked.unresolved,
                "link phase complete"
            );
            report.merge(linked);
        }

        info!(
            primary = %self.primary_uuid,
            resolved = report.resolved,
            unresolved = report.unresolved,
            "relationships linked"
        );
        Ok(LinkedBatch {
            primary_uuid: self.primary_uuid,
            results: self.results,
            report,
        })
    }
}

/// Both phases done
#[derive(Debug)]
pub struct LinkedBatch {
    primary_uuid: String,
    results: Vec<BatchItemResult>,
    report: LinkReport,
}

impl LinkedBatch {
    pub fn primary_uuid(&self) -> &str {
        &self.primary_uuid
    }

    pub fn results(&self) -> &[BatchItemResult] {
        &self.results
    }

    pub fn report(&self) -> &LinkReport {
        &self.report
    }

    /// Write the resolved relationships back to the store
    pub async fn commit(&self, engine: &dyn StorageEngine) -> Result<usize> {
        if self.report.updates.is_empty() {
            return Ok(0);
        }
        Ok(engine.persist_relationships(self.report.updates.clone()).await?)
    }

    pub fn into_parts(self) -> (String, Vec<BatchItemResult>, LinkReport) {
        (self.primary_uuid, self.results, self.report)
    }
}
