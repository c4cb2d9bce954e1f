//! Artifact builder contract and lifecycle

pub mod collection;
pub mod lifecycle;
pub mod ports;

pub use collection::IndexedArtifactCollection;
pub use lifecycle::{DerivedBatch, LinkedBatch, PersistedBatch};
pub use ports::{ArtifactBuilder, LinkReport};
