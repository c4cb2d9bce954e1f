/*
 * ArtifactGraph Builder - metadata derivation for uploaded artifacts
 *
 * Feature-First Layout:
 * - shared/    : Raw content, qualified names
 * - config/    : YAML configuration with environment overrides
 * - features/  : classifier → xml → derivers → builder → relationships → batch
 * - pipeline/  : Upload orchestration (derive, persist, link)
 *
 * Storage lives in artifactgraph-storage; this crate only talks to its ports.
 */

#![allow(clippy::new_without_default)] // Unit derivers keep an explicit constructor
#![allow(clippy::module_inception)] // builder::builder-style naming

// ═══════════════════════════════════════════════════════════════════════════
// Module Exports
// ═══════════════════════════════════════════════════════════════════════════

/// Configuration
pub mod config;

/// Error types
pub mod errors;

/// Feature modules
pub mod features;

/// Upload orchestration
pub mod pipeline;

/// Shared value types
pub mod shared;

// ═══════════════════════════════════════════════════════════════════════════
// Re-exports
// ═══════════════════════════════════════════════════════════════════════════

pub use config::{BuilderConfig, ConfigError};
pub use errors::{BuilderError, Result};
pub use features::batch::{correlation_id, BatchAssembler};
pub use features::builder::{
    ArtifactBuilder, DerivedBatch, IndexedArtifactCollection, LinkReport, LinkedBatch, PersistedBatch,
};
pub use features::classifier::{classify, Classification, StructuralHint};
pub use features::derivers::{DocumentDeriver, SwitchYardDeriver, WebXmlDeriver, WsdlDeriver, XsdDeriver};
pub use features::registry::{ArtifactBuilderProvider, BuilderRegistry, ProviderKey};
pub use features::relationships::{
    CriteriaQueryRelationshipSource, CriteriaSource, ExtendedCriteria, ExtendedRelationshipSource, NamespaceCriteria,
    NamespaceRelationshipSource, QNameCriteria, QNameRelationshipSource, RelationshipSlot, RelationshipSource,
    Resolution,
};
pub use features::visitor::{walk, ArtifactVisitor, MetadataPrinter, RelationshipCollector};
pub use features::xml::{DeriveContext, NamespaceBindings, PathQuery, QueryValue, ReturnShape, XmlArtifactBuilder, XmlDeriver};
pub use pipeline::{UploadOutcome, UploadPipeline};
pub use shared::{QName, RawContent};
