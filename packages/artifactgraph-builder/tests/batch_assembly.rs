//! Integration tests: batch assembly and correlation ids
//!
//! Run with: cargo test --test batch_assembly

mod common;

use artifactgraph_builder::{correlation_id, BatchAssembler, BuilderConfig, BuilderError, UploadPipeline};
use artifactgraph_storage::{ArtifactType, BatchItemResult, MemoryRecordStore, PrimaryRecord, StorageEngine};
use common::*;
use pretty_assertions::assert_eq;
use proptest::prelude::*;

#[tokio::test]
async fn test_k_items_one_call() {
    let engine = RecordingEngine::default();
    let mut batch = BatchAssembler::new();
    let paths = ["schemas/a.xsd", "schemas/b.xsd", "wsdl/c.wsdl", "META-INF/web.xml"];
    for path in paths {
        batch.add(
            PrimaryRecord::new(ArtifactType::XmlDocument, path, "application/xml"),
            Some(path.as_bytes().to_vec()),
            path,
        );
    }

    let results = batch.execute(&engine).await.unwrap();
    assert_eq!(engine.batch_calls(), 1);
    assert_eq!(results.len(), paths.len());
    for (result, path) in results.iter().zip(paths) {
        assert_eq!(result.correlation_id(), format!("<{}@package>", path));
        assert!(result.is_stored());
    }
}

#[tokio::test]
async fn test_per_item_failure_is_reported_not_raised() {
    let engine = RecordingEngine::rejecting("<b.xsd@package>");
    let mut batch = BatchAssembler::with_capacity(2);
    for path in ["a.xsd", "b.xsd"] {
        batch.add(PrimaryRecord::new(ArtifactType::XsdDocument, path, "application/xml"), None, path);
    }

    let results = batch.execute(&engine).await.unwrap();
    assert_eq!(
        results[0],
        BatchItemResult::RolledBack {
            correlation_id: "<a.xsd@package>".into()
        }
    );
    assert!(matches!(
        &results[1],
        BatchItemResult::Failed { correlation_id, .. } if correlation_id == "<b.xsd@package>"
    ));
}

#[tokio::test]
async fn test_upload_is_a_single_batch_with_primary_first() {
    let pipeline = UploadPipeline::new(BuilderConfig::default());
    let store = MemoryRecordStore::new();
    let (primary, content) = fixture_upload("deriver.wsdl", "WsdlDocument");
    let primary_uuid = primary.uuid().to_string();

    let outcome = pipeline.upload(&store, primary, content, "wsdl/deriver.wsdl").await.unwrap();

    assert_eq!(store.batch_calls(), 1);
    assert_eq!(outcome.results.len(), 36);
    assert_eq!(outcome.results[0].correlation_id(), "<wsdl/deriver.wsdl@package>");
    assert_eq!(outcome.results[0].summary().map(|s| s.uuid.as_str()), Some(primary_uuid.as_str()));

    // only the primary carries content
    assert!(store.content(&primary_uuid).is_some());
    let derived_uuid = &outcome.results[1].summary().unwrap().uuid;
    assert!(store.content(derived_uuid).is_none());
    assert_eq!(
        outcome.results[1].correlation_id(),
        format!("<wsdl/deriver.wsdl#{}@package>", derived_uuid)
    );
}

#[tokio::test]
async fn test_failed_persist_leaves_store_unchanged() {
    let pipeline = UploadPipeline::new(BuilderConfig::default());
    let store = MemoryRecordStore::new();
    let (primary, content) = fixture_upload("deriver.wsdl", "WsdlDocument");
    let batch = pipeline.derive(primary, content).unwrap();
    let primary_uuid = batch.primary().uuid().to_string();

    // The last derived record is already stored under its uuid
    let taken = batch.derived().last().cloned().expect("derived records");
    store.insert(taken.clone().into()).unwrap();

    let err = batch.persist(&store, "wsdl/deriver.wsdl").await.unwrap_err();
    match err {
        BuilderError::Persist { correlation_id, .. } => {
            assert_eq!(correlation_id, format!("<wsdl/deriver.wsdl#{}@package>", taken.uuid()));
        }
        other => panic!("expected a persist error, got {other:?}"),
    }

    assert_eq!(store.len(), 1);
    assert!(store.get_artifact(&primary_uuid).await.unwrap().is_none());
    assert!(store.content(&primary_uuid).is_none());
}

#[test]
fn test_assemble_without_persisting() {
    let pipeline = UploadPipeline::new(BuilderConfig::default());
    let (primary, content) = fixture_upload("common.xsd", "XsdDocument");
    let batch = pipeline.derive(primary, content).unwrap();

    let assembled = batch.assemble("common.xsd");
    assert_eq!(assembled.len(), 1 + batch.derived_count());
    assert_eq!(assembled.items()[0].artifact.uuid(), batch.primary().uuid());
    assert!(assembled.items()[1..].iter().all(|item| item.content.is_none()));
}

proptest! {
    #[test]
    fn correlation_id_wraps_path(path in "[a-zA-Z0-9_./-]{1,64}") {
        let id = correlation_id(&path);
        prop_assert!(id.starts_with('<'));
        prop_assert!(id.ends_with("@package>"));
        prop_assert_eq!(&id[1..id.len() - "@package>".len()], path.as_str());
    }
}
