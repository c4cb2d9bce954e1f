//! Flat listing of every outgoing edge of a record

use artifactgraph_storage::{names, Artifact, ArtifactType};

use super::dispatch::ArtifactVisitor;

/// One edge
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RelationshipEdge {
    pub source: String,
    pub relationship: String,
    /// `None` while the target is still pending
    pub target: Option<String>,
    pub target_type: ArtifactType,
}

/// Collects typed, generic and back-reference edges
#[derive(Debug, Default)]
pub struct RelationshipCollector {
    edges: Vec<RelationshipEdge>,
}

impl RelationshipCollector {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn edges(&self) -> &[RelationshipEdge] {
        &self.edges
    }

    pub fn into_edges(self) -> Vec<RelationshipEdge> {
        self.edges
    }

    fn push(&mut self, source: &str, relationship: &str, target: &artifactgraph_storage::Target) {
        self.edges.push(RelationshipEdge {
            source: source.to_string(),
            relationship: relationship.to_string(),
            target: target.uuid().map(str::to_string),
            target_type: target.artifact_type,
        });
    }
}

impl ArtifactVisitor for RelationshipCollector {
    fn visit_artifact(&mut self, artifact: &Artifact) {
        let source = artifact.uuid();

        match artifact {
            Artifact::Primary(primary) => {
                for relationship in [
                    names::IMPORTED_XSDS,
                    names::INCLUDED_XSDS,
                    names::REDEFINED_XSDS,
                    names::IMPORTED_WSDLS,
                ] {
                    for target in primary.document_slot(relationship).into_iter().flatten() {
                        self.push(source, relationship, target);
                    }
                }
            }
            Artifact::Derived(record) => {
                if let Some(related) = &record.related_document {
                    self.push(source, names::RELATED_DOCUMENT, related);
                }
                for (relationship, targets) in record.body.typed_relationships() {
                    for target in targets {
                        self.push(source, relationship, target);
                    }
                }
            }
        }

        for relationship in &artifact.meta().relationships {
            for target in &relationship.targets {
                self.push(source, &relationship.relationship_type, target);
            }
        }
    }
}
