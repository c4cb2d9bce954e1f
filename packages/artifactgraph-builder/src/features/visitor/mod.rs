//! Visitors over stored records

pub mod dispatch;
pub mod printer;
pub mod relationships;

pub use dispatch::{walk, walk_all, ArtifactVisitor};
pub use printer::MetadataPrinter;
pub use relationships::{RelationshipCollector, RelationshipEdge};
