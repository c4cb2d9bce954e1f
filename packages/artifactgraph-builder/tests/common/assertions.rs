//! Custom assertions for derived record sets

use std::collections::HashMap;

use artifactgraph_storage::{ArtifactType, DerivedRecord, PrimaryRecord, Target};

/// Kind/name/ncname/namespace of one record plus its typed edges, with uuids
/// replaced by positions so two derivations of the same document compare equal.
pub type RecordSignature = (ArtifactType, String, Option<String>, Option<String>, Vec<(String, String)>);

/// Position-based structural signature of a derivation
pub fn structural_signature(primary: &PrimaryRecord, derived: &[DerivedRecord]) -> Vec<RecordSignature> {
    let positions: HashMap<&str, usize> = derived
        .iter()
        .enumerate()
        .map(|(idx, r)| (r.uuid(), idx))
        .collect();

    let describe = |target: &Target| -> String {
        match target.uuid() {
            None => format!("pending:{}", target.artifact_type),
            Some(uuid) if uuid == primary.uuid() => "primary".to_string(),
            Some(uuid) => match positions.get(uuid) {
                Some(idx) => format!("#{}", idx),
                None => format!("external:{}", target.artifact_type),
            },
        }
    };

    derived
        .iter()
        .map(|record| {
            let mut edges = Vec::new();
            if let Some(related) = &record.related_document {
                edges.push(("relatedDocument".to_string(), describe(related)));
            }
            for (name, targets) in record.body.typed_relationships() {
                for target in targets {
                    edges.push((name.to_string(), describe(target)));
                }
            }
            for relationship in &record.meta.relationships {
                for target in &relationship.targets {
                    edges.push((relationship.relationship_type.clone(), describe(target)));
                }
            }
            (
                record.artifact_type(),
                record.name().to_string(),
                record.ncname.clone(),
                record.namespace.clone(),
                edges,
            )
        })
        .collect()
}

/// Assert the number of derived records of `kind`
pub fn assert_kind_count(derived: &[DerivedRecord], kind: ArtifactType, expected: usize) {
    let actual = derived.iter().filter(|r| r.artifact_type() == kind).count();
    assert_eq!(actual, expected, "Expected {expected} {kind} records, got {actual}");
}

/// Find exactly one record by kind and name
pub fn find_record<'a>(derived: &'a [DerivedRecord], kind: ArtifactType, name: &str) -> &'a DerivedRecord {
    let matches: Vec<_> = derived
        .iter()
        .filter(|r| r.artifact_type() == kind && r.name() == name)
        .collect();
    assert_eq!(matches.len(), 1, "Expected one {kind} named '{name}', found {}", matches.len());
    matches[0]
}

/// Assert every derived record points back at `primary`
pub fn assert_back_references(primary: &PrimaryRecord, derived: &[DerivedRecord]) {
    for record in derived {
        assert_eq!(
            record.related_document_uuid(),
            Some(primary.uuid()),
            "{} '{}' does not point back at its document",
            record.artifact_type(),
            record.name()
        );
    }
}
