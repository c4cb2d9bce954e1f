//! Upload pipeline
//!
//! ```text
//! builders_for ─→ derive ─→ persist (one batch) ─→ link ─→ persist relationships
//! ```
//!
//! A derive failure aborts before anything is stored. A rejected batch item
//! aborts before linking. A failing lookup aborts before relationship updates
//! are written.

use std::path::Path;

use tracing::{info, instrument};

use artifactgraph_storage::{BatchItemResult, DerivedRecord, PrimaryRecord, RelationshipContext, StorageEngine};

use crate::config::BuilderConfig;
use crate::errors::Result;
use crate::features::builder::DerivedBatch;
use crate::features::classifier::{classify, StructuralHint};
use crate::features::registry::BuilderRegistry;
use crate::shared::RawContent;

/// Result of one upload
#[derive(Debug, Clone)]
pub struct UploadOutcome {
    pub primary_uuid: String,
    pub results: Vec<BatchItemResult>,
    pub resolved: usize,
    pub unresolved: usize,
    /// Relationship updates written back
    pub updated: usize,
}

impl UploadOutcome {
    /// Derived records stored (everything but the primary)
    pub fn derived_count(&self) -> usize {
        self.results.len().saturating_sub(1)
    }
}

pub struct UploadPipeline {
    registry: BuilderRegistry,
    config: BuilderConfig,
}

impl UploadPipeline {
    pub fn new(config: BuilderConfig) -> Self {
        Self {
            registry: BuilderRegistry::from_config(&config),
            config,
        }
    }

    pub fn with_registry(registry: BuilderRegistry, config: BuilderConfig) -> Self {
        Self { registry, config }
    }

    pub fn registry(&self) -> &BuilderRegistry {
        &self.registry
    }

    pub fn registry_mut(&mut self) -> &mut BuilderRegistry {
        &mut self.registry
    }

    pub fn config(&self) -> &BuilderConfig {
        &self.config
    }

    /// Phase 1 only
    pub fn derive(&self, primary: PrimaryRecord, content: RawContent) -> Result<DerivedBatch> {
        let builders = self.registry.builders_for(&primary, &self.config);
        DerivedBatch::derive(primary, content, builders)
    }

    /// Derive only, then hand back the records
    pub fn derive_records(&self, primary: PrimaryRecord, content: RawContent) -> Result<(PrimaryRecord, Vec<DerivedRecord>)> {
        Ok(self.derive(primary, content)?.into_records())
    }

    /// Full upload against a store that is both engine and lookup context
    #[instrument(skip_all, fields(document = %primary.meta.name, origin = origin_path))]
    pub async fn upload<S>(
        &self,
        store: &S,
        primary: PrimaryRecord,
        content: RawContent,
        origin_path: &str,
    ) -> Result<UploadOutcome>
    where
        S: StorageEngine + RelationshipContext,
    {
        let derived = self.derive(primary, content)?;
        let persisted = derived.persist(store, origin_path).await?;
        let linked = persisted.link(store).await?;
        let updated = linked.commit(store).await?;

        let (primary_uuid, results, report) = linked.into_parts();
        info!(
            primary = %primary_uuid,
            stored = results.len(),
            resolved = report.resolved,
            unresolved = report.unresolved,
            "upload complete"
        );
        Ok(UploadOutcome {
            primary_uuid,
            results,
            resolved: report.resolved,
            unresolved: report.unresolved,
            updated,
        })
    }

    /// Classify, read and upload a file from disk
    pub async fn upload_file<S>(&self, store: &S, path: &Path, kind_hint: &str) -> Result<UploadOutcome>
    where
        S: StorageEngine + RelationshipContext,
    {
        let content = RawContent::from_path(path)?;
        let primary = primary_for(path, kind_hint, content.media_type());
        self.upload(store, primary, content, &path.to_string_lossy()).await
    }
}

/// Primary record for a file, classified from `kind_hint`
pub fn primary_for(path: &Path, kind_hint: &str, media_type: &str) -> PrimaryRecord {
    let classification = classify(kind_hint, Some(&StructuralHint::inline_content()));
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.to_string_lossy().into_owned());
    let mut primary = PrimaryRecord::new(classification.artifact_type, name, media_type);
    primary.meta.extended_type = classification.extended_type;
    primary
}

/// Kind hint guessed from a file extension
pub fn kind_hint_for(path: &Path) -> &'static str {
    match path.extension().and_then(|e| e.to_str()).map(str::to_ascii_lowercase).as_deref() {
        Some("wsdl") => "WsdlDocument",
        Some("xsd") => "XsdDocument",
        Some("xml") if path.file_name().is_some_and(|n| n == "web.xml") => "ext/WebXmlDocument",
        Some("xml") if path.file_name().is_some_and(|n| n == "switchyard.xml") => "ext/SwitchYardXmlDocument",
        Some("xml") => "XmlDocument",
        _ => "Document",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use artifactgraph_storage::ArtifactType;

    #[test]
    fn test_kind_hint_by_extension() {
        assert_eq!(kind_hint_for(Path::new("a/b/sample.WSDL")), "WsdlDocument");
        assert_eq!(kind_hint_for(Path::new("WEB-INF/web.xml")), "ext/WebXmlDocument");
        assert_eq!(kind_hint_for(Path::new("META-INF/switchyard.xml")), "ext/SwitchYardXmlDocument");
        assert_eq!(kind_hint_for(Path::new("notes.txt")), "Document");
    }

    #[test]
    fn test_primary_for_extended_document() {
        let primary = primary_for(Path::new("WEB-INF/web.xml"), "ext/WebXmlDocument", "application/xml");
        assert_eq!(primary.artifact_type(), ArtifactType::ExtendedDocument);
        assert_eq!(primary.meta.extended_type.as_deref(), Some("WebXmlDocument"));
        assert_eq!(primary.meta.name, "web.xml");
    }
}
