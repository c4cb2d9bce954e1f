//! Deferred relationship resolution
//!
//! Relationships whose target cannot be found in the current batch are
//! registered during derivation as [`RelationshipSource`]s and resolved after
//! the batch has been persisted, against a [`RelationshipContext`].
//!
//! [`RelationshipContext`]: artifactgraph_storage::RelationshipContext

pub mod criteria;
pub mod source;

pub use criteria::{ExtendedCriteria, NamespaceCriteria, QNameCriteria};
pub use source::{
    CriteriaQueryRelationshipSource, CriteriaSource, RelationshipSlot, RelationshipSource, Resolution,
};

/// Resolves a qualified-name reference (element, type, message, binding ...)
pub type QNameRelationshipSource = CriteriaQueryRelationshipSource<QNameCriteria>;

/// Resolves a document import/include by namespace or location
pub type NamespaceRelationshipSource = CriteriaQueryRelationshipSource<NamespaceCriteria>;

/// Resolves a reference to an extended record by type and name
pub type ExtendedRelationshipSource = CriteriaQueryRelationshipSource<ExtendedCriteria>;
