//! Structural XML builder
//!
//! Template for every XML-based builder: decode, parse, record the declared
//! encoding, bind namespaces, hand the tree to an [`XmlDeriver`], then attach
//! the `relatedDocument` back-reference to whatever the deriver emitted.

use std::collections::BTreeMap;

use async_trait::async_trait;
use roxmltree::Node;
use tracing::{debug, instrument};

use artifactgraph_storage::{
    names, ArtifactModel, ArtifactType, DerivedRecord, PrimaryRecord, RelationshipContext, Target,
};

use super::document::{declared_encoding, decode, parsing_options};
use super::namespace::NamespaceBindings;
use super::query::{PathQuery, QueryValue, ReturnShape};
use crate::config::{ResolutionConfig, XmlConfig};
use crate::errors::Result;
use crate::features::builder::{ArtifactBuilder, IndexedArtifactCollection, LinkReport};
use crate::features::relationships::{
    ExtendedCriteria, ExtendedRelationshipSource, NamespaceCriteria, NamespaceRelationshipSource, QNameCriteria,
    QNameRelationshipSource, RelationshipSlot, RelationshipSource,
};
use crate::shared::{QName, RawContent};

/// Document-specific half of an XML builder
pub trait XmlDeriver: Send + Sync {
    fn name(&self) -> &'static str;

    /// Bind the prefixes this deriver's queries use
    fn configure_namespace_mappings(&self, _bindings: &mut NamespaceBindings) {}

    /// Walk the tree from its root element and emit derived records
    fn derive(&mut self, root: Node<'_, '_>, cx: &mut DeriveContext<'_>) -> Result<()>;
}

/// Everything a deriver may touch during phase 1
pub struct DeriveContext<'c> {
    pub primary: &'c mut PrimaryRecord,
    pub collection: &'c mut IndexedArtifactCollection,
    pub derived_content: &'c mut BTreeMap<String, Vec<u8>>,
    sources: &'c mut Vec<Box<dyn RelationshipSource>>,
    bindings: &'c NamespaceBindings,
    resolution: &'c ResolutionConfig,
}

impl<'c> DeriveContext<'c> {
    pub fn bindings(&self) -> &NamespaceBindings {
        self.bindings
    }

    pub fn query<'a, 'input>(
        &self,
        scope: Node<'a, 'input>,
        expression: &str,
        shape: ReturnShape,
    ) -> Result<QueryValue<'a, 'input>> {
        PathQuery::compile(expression, self.bindings)?.evaluate(scope, shape)
    }

    pub fn nodes<'a, 'input>(&self, scope: Node<'a, 'input>, expression: &str) -> Result<Vec<Node<'a, 'input>>> {
        Ok(self.query(scope, expression, ReturnShape::NodeSet)?.into_nodes())
    }

    pub fn node<'a, 'input>(&self, scope: Node<'a, 'input>, expression: &str) -> Result<Option<Node<'a, 'input>>> {
        Ok(self.query(scope, expression, ReturnShape::Node)?.into_nodes().into_iter().next())
    }

    pub fn string(&self, scope: Node<'_, '_>, expression: &str) -> Result<String> {
        Ok(self.query(scope, expression, ReturnShape::String)?.into_string())
    }

    /// Register a relationship to resolve after persistence
    pub fn defer(&mut self, source: impl RelationshipSource + 'static) {
        self.sources.push(Box::new(source));
    }

    pub fn deferred_count(&self) -> usize {
        self.sources.len()
    }

    /// Defer a single-valued reference by qualified name
    ///
    /// Returns the pending placeholder to store in the owner's slot.
    pub fn defer_qname(
        &mut self,
        owner: &str,
        relationship: &str,
        placeholder: ArtifactType,
        scope: ArtifactModel,
        candidates: &[ArtifactType],
        qname: QName,
    ) -> Target {
        let target = Target::pending(placeholder);
        let criteria = QNameCriteria::new(qname).log_not_found(self.resolution.log_not_found);
        self.defer(QNameRelationshipSource::for_target(
            criteria,
            RelationshipSlot::new(owner, relationship),
            target.clone(),
            scope,
            candidates.to_vec(),
        ));
        target
    }

    /// Defer a reference to an extended record matched by type and name
    pub fn defer_extended(&mut self, owner: &str, relationship: &str, extended_type: &str, name: &str) -> Target {
        let target = Target::pending(ArtifactType::ExtendedArtifactType);
        let criteria = ExtendedCriteria::new(extended_type, name).log_not_found(self.resolution.log_not_found);
        self.defer(ExtendedRelationshipSource::for_target(
            criteria,
            RelationshipSlot::new(owner, relationship),
            target.clone(),
            ArtifactModel::Ext,
            vec![ArtifactType::ExtendedArtifactType, ArtifactType::ExtendedDocument],
        ));
        target
    }

    /// Defer a document import into one of the primary record's collections
    pub fn defer_import(
        &mut self,
        relationship: &str,
        document_type: ArtifactType,
        scope: ArtifactModel,
        criteria: NamespaceCriteria,
    ) {
        let owner = self.primary.uuid().to_string();
        let criteria = criteria.log_not_found(self.resolution.log_not_found);
        self.defer(NamespaceRelationshipSource::for_collection(
            criteria,
            RelationshipSlot::new(owner, relationship),
            document_type,
            scope,
            vec![document_type],
        ));
    }
}

/// [`ArtifactBuilder`] driven by an [`XmlDeriver`]
pub struct XmlArtifactBuilder<D> {
    deriver: D,
    xml: XmlConfig,
    resolution: ResolutionConfig,
    collection: IndexedArtifactCollection,
    derived_content: BTreeMap<String, Vec<u8>>,
    sources: Vec<Box<dyn RelationshipSource>>,
}

impl<D: XmlDeriver> XmlArtifactBuilder<D> {
    pub fn new(deriver: D, xml: XmlConfig, resolution: ResolutionConfig) -> Self {
        Self {
            deriver,
            xml,
            resolution,
            collection: IndexedArtifactCollection::new(),
            derived_content: BTreeMap::new(),
            sources: Vec::new(),
        }
    }

    pub fn deriver(&self) -> &D {
        &self.deriver
    }

    /// Number of relationships waiting for phase 2
    pub fn pending_relationships(&self) -> usize {
        self.sources.len()
    }

    fn attach_related_document(&mut self, primary: &PrimaryRecord) {
        let back_reference = Target::to(primary.uuid(), primary.artifact_type());
        for record in self.collection.iter_mut() {
            if record.related_document_uuid().is_some() {
                continue;
            }
            if record.artifact_type().has_typed_related_document() {
                record.related_document = Some(back_reference.clone());
            } else {
                record.meta.add_relationship(names::RELATED_DOCUMENT, back_reference.clone());
            }
        }
    }
}

#[async_trait]
impl<D: XmlDeriver> ArtifactBuilder for XmlArtifactBuilder<D> {
    fn name(&self) -> &'static str {
        self.deriver.name()
    }

    #[instrument(skip_all, fields(deriver = self.deriver.name(), document = %primary.meta.name))]
    fn derive_artifacts(&mut self, primary: &mut PrimaryRecord, content: &RawContent) -> Result<()> {
        self.collection.clear();
        self.derived_content.clear();
        self.sources.clear();

        let fallback = content.encoding().unwrap_or(&self.xml.default_encoding).to_string();
        let text = decode(content.bytes(), &fallback)?;
        let document = roxmltree::Document::parse_with_options(&text, parsing_options(&self.xml))?;

        if primary.artifact_type().is_xml_document() {
            let encoding = declared_encoding(content.bytes()).unwrap_or_else(|| self.xml.default_encoding.clone());
            primary.content_encoding = Some(encoding);
        }

        let mut bindings = NamespaceBindings::new();
        self.deriver.configure_namespace_mappings(&mut bindings);

        let mut cx = DeriveContext {
            primary: &mut *primary,
            collection: &mut self.collection,
            derived_content: &mut self.derived_content,
            sources: &mut self.sources,
            bindings: &bindings,
            resolution: &self.resolution,
        };
        self.deriver.derive(document.root_element(), &mut cx)?;

        self.attach_related_document(primary);
        debug!(
            derived = self.collection.len(),
            deferred = self.sources.len(),
            "structural derivation finished"
        );
        Ok(())
    }

    fn derived_artifacts(&self) -> &[DerivedRecord] {
        self.collection.records()
    }

    fn derived_content(&self) -> &BTreeMap<String, Vec<u8>> {
        &self.derived_content
    }

    async fn link_relationships(&mut self, context: &dyn RelationshipContext) -> Result<LinkReport> {
        let mut report = LinkReport::default();
        for mut source in std::mem::take(&mut self.sources) {
            let resolution = source.build(context).await?;
            if resolution.is_resolved() {
                report.resolved += 1;
            } else {
                report.unresolved += 1;
                debug!(source = %source.describe(), "deferred relationship left unresolved");
            }
            if let Some(update) = resolution.into_update() {
                report.updates.push(update);
            }
        }
        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::BuilderError;
    use artifactgraph_storage::DerivedBody;

    /// Emits one record per `item` element
    struct Items;

    impl XmlDeriver for Items {
        fn name(&self) -> &'static str {
            "items"
        }

        fn derive(&mut self, root: Node<'_, '_>, cx: &mut DeriveContext<'_>) -> Result<()> {
            for item in cx.nodes(root, "./item")? {
                let name = item.attribute("name").unwrap_or("item");
                cx.collection.add(DerivedRecord::new(ArtifactType::ExtendedArtifactType, name, DerivedBody::Plain));
            }
            Ok(())
        }
    }

    fn builder() -> XmlArtifactBuilder<Items> {
        XmlArtifactBuilder::new(Items, XmlConfig::default(), ResolutionConfig::default())
    }

    #[test]
    fn test_declared_encoding_recorded() {
        let mut primary = PrimaryRecord::new(ArtifactType::XmlDocument, "a.xml", "application/xml");
        let content = RawContent::new(
            br#"<?xml version="1.0" encoding="ISO-8859-1"?><items><item name="x"/></items>"#.to_vec(),
            "application/xml",
        );
        let mut b = builder();
        b.derive_artifacts(&mut primary, &content).unwrap();
        assert_eq!(primary.content_encoding.as_deref(), Some("ISO-8859-1"));
        assert_eq!(b.derived_artifacts().len(), 1);
    }

    #[test]
    fn test_missing_encoding_defaults_to_utf8() {
        let mut primary = PrimaryRecord::new(ArtifactType::XmlDocument, "a.xml", "application/xml");
        let content = RawContent::new(b"<items/>".to_vec(), "application/xml");
        builder().derive_artifacts(&mut primary, &content).unwrap();
        assert_eq!(primary.content_encoding.as_deref(), Some("UTF-8"));
    }

    #[test]
    fn test_non_xml_primary_keeps_encoding_unset() {
        let mut primary = PrimaryRecord::new(ArtifactType::ExtendedDocument, "a.xml", "application/xml");
        let content = RawContent::new(b"<items/>".to_vec(), "application/xml");
        builder().derive_artifacts(&mut primary, &content).unwrap();
        assert_eq!(primary.content_encoding, None);
    }

    #[test]
    fn test_generic_back_reference_for_untyped_kinds() {
        let mut primary = PrimaryRecord::new(ArtifactType::ExtendedDocument, "a.xml", "application/xml");
        let content = RawContent::new(br#"<items><item name="a"/><item name="b"/></items>"#.to_vec(), "application/xml");
        let mut b = builder();
        b.derive_artifacts(&mut primary, &content).unwrap();

        for record in b.derived_artifacts() {
            assert!(record.related_document.is_none());
            assert_eq!(record.related_document_uuid(), Some(primary.uuid()));
        }
    }

    #[test]
    fn test_malformed_xml_is_parse_error() {
        let mut primary = PrimaryRecord::new(ArtifactType::XmlDocument, "a.xml", "application/xml");
        let content = RawContent::new(b"<items><item></items>".to_vec(), "application/xml");
        let err = builder().derive_artifacts(&mut primary, &content).unwrap_err();
        assert!(matches!(err, BuilderError::Parse(_)));
    }
}
