//! Behaviour every record store adapter must share
//!
//! Run with: cargo test -p artifactgraph-storage --test store_contract

use artifactgraph_storage::{
    names, Artifact, ArtifactModel, ArtifactType, BatchItem, BatchItemResult, Criteria, DerivedBody, DerivedRecord, MemoryRecordStore,
    PrimaryRecord, RelationshipContext, RelationshipUpdate, StorageEngine, Target,
};
use pretty_assertions::assert_eq;

fn item(artifact: impl Into<Artifact>, path: &str) -> BatchItem {
    BatchItem {
        correlation_id: format!("<{}@package>", path),
        artifact: artifact.into(),
        content: None,
        origin_path: path.to_string(),
    }
}

fn schema(namespace: &str) -> PrimaryRecord {
    let mut doc = PrimaryRecord::new(ArtifactType::XsdDocument, "common.xsd", "application/xml");
    doc.target_namespace = Some(namespace.to_string());
    doc
}

async fn exercise<S: StorageEngine + RelationshipContext>(store: &S) {
    let first = schema("urn:a");
    let second = schema("urn:b");
    let first_uuid = first.uuid().to_string();

    let part = DerivedRecord::new(
        ArtifactType::Part,
        "body",
        DerivedBody::Part {
            element: Some(Target::pending(ArtifactType::ElementDeclaration)),
            type_: None,
        },
    )
    .with_ncname("body")
    .with_namespace(Some("urn:svc".into()));
    let part_uuid = part.uuid().to_string();

    let results = store
        .persist_batch(vec![item(first.clone(), "a.xsd"), item(second, "b.xsd"), item(part, "svc.wsdl")])
        .await
        .unwrap();
    assert!(results.iter().all(|r| r.is_stored()));
    assert_eq!(results[2].correlation_id(), "<svc.wsdl@package>");

    // criteria filter on the primary's namespace
    let mut criteria = Criteria::new();
    criteria.insert("targetNamespace".into(), "urn:a".into());
    let hits = store
        .find_records(ArtifactModel::Xsd, ArtifactType::XsdDocument, &criteria)
        .await
        .unwrap();
    assert_eq!(hits.len(), 1);
    assert_eq!(hits[0].uuid, first_uuid);

    // a kind outside the scope never matches
    let none = store
        .find_records(ArtifactModel::Wsdl, ArtifactType::XsdDocument, &Criteria::new())
        .await
        .unwrap();
    assert!(none.is_empty());

    // duplicates are per-item failures
    let again = store.persist_batch(vec![item(first.clone(), "a-again.xsd")]).await.unwrap();
    assert!(again[0].is_failed());
    assert_eq!(again[0].correlation_id(), "<a-again.xsd@package>");

    // one conflict keeps the whole batch out of the store
    let third = schema("urn:c");
    let third_uuid = third.uuid().to_string();
    let mixed = store
        .persist_batch(vec![item(third, "c.xsd"), item(first, "a-again.xsd")])
        .await
        .unwrap();
    assert_eq!(
        mixed[0],
        BatchItemResult::RolledBack {
            correlation_id: "<c.xsd@package>".into()
        }
    );
    assert!(mixed[1].is_failed());
    assert!(store.get_artifact(&third_uuid).await.unwrap().is_none());
    let mut criteria = Criteria::new();
    criteria.insert("targetNamespace".into(), "urn:c".into());
    assert!(store
        .find_records(ArtifactModel::Xsd, ArtifactType::XsdDocument, &criteria)
        .await
        .unwrap()
        .is_empty());

    // relationship updates
    let updated = store
        .persist_relationships(vec![
            RelationshipUpdate::append(first_uuid.clone(), names::IMPORTED_XSDS, Target::to("other", ArtifactType::XsdDocument)),
            RelationshipUpdate::clear(part_uuid.clone(), names::ELEMENT),
        ])
        .await
        .unwrap();
    assert_eq!(updated, 2);

    let Some(Artifact::Primary(stored)) = store.get_artifact(&first_uuid).await.unwrap() else {
        panic!("primary stored");
    };
    assert_eq!(stored.imported_xsds, vec![Target::to("other", ArtifactType::XsdDocument)]);

    let Some(Artifact::Derived(stored_part)) = store.get_artifact(&part_uuid).await.unwrap() else {
        panic!("part stored");
    };
    assert_eq!(
        stored_part.body,
        DerivedBody::Part {
            element: None,
            type_: None
        }
    );

    assert!(store.get_artifact("missing").await.unwrap().is_none());
}

#[tokio::test]
async fn test_memory_store_contract() {
    exercise(&MemoryRecordStore::new()).await;
}

#[cfg(feature = "sqlite")]
#[tokio::test]
async fn test_sqlite_store_contract() {
    let store = artifactgraph_storage::SqliteRecordStore::new_in_memory().unwrap();
    exercise(&store).await;
}
