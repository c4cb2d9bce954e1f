//! XML Schema deriver
//!
//! Emits one record per named global declaration (element, attribute,
//! simpleType, complexType) and defers `xsd:import`/`include`/`redefine` to
//! phase 2. Also drives the inline schemas of a WSDL `types` section.

use roxmltree::Node;
use tracing::debug;

use artifactgraph_storage::{names, ArtifactModel, ArtifactType, DerivedBody, DerivedRecord};

use crate::errors::Result;
use crate::features::relationships::NamespaceCriteria;
use crate::features::xml::{well_known, DeriveContext, NamespaceBindings, XmlDeriver};

const GLOBAL_DECLARATIONS: [(&str, ArtifactType); 4] = [
    ("./xsd:element", ArtifactType::ElementDeclaration),
    ("./xsd:attribute", ArtifactType::AttributeDeclaration),
    ("./xsd:simpleType", ArtifactType::SimpleTypeDeclaration),
    ("./xsd:complexType", ArtifactType::ComplexTypeDeclaration),
];

pub(crate) fn bind_schema_prefixes(bindings: &mut NamespaceBindings) {
    bindings.add_mapping("xsd", well_known::XSD).add_mapping("xs", well_known::XSD);
}

#[derive(Debug, Default)]
pub struct XsdDeriver;

impl XsdDeriver {
    pub fn new() -> Self {
        Self
    }
}

impl XmlDeriver for XsdDeriver {
    fn name(&self) -> &'static str {
        "xsd"
    }

    fn configure_namespace_mappings(&self, bindings: &mut NamespaceBindings) {
        bind_schema_prefixes(bindings);
    }

    fn derive(&mut self, root: Node<'_, '_>, cx: &mut DeriveContext<'_>) -> Result<()> {
        cx.primary.target_namespace = root
            .attribute("targetNamespace")
            .filter(|ns| !ns.is_empty())
            .map(str::to_string);
        derive_schema(root, cx)
    }
}

/// Derive the global declarations and imports of one `xsd:schema` element
pub(crate) fn derive_schema(schema: Node<'_, '_>, cx: &mut DeriveContext<'_>) -> Result<()> {
    let target_namespace = schema
        .attribute("targetNamespace")
        .filter(|ns| !ns.is_empty())
        .map(str::to_string);

    for (expression, kind) in GLOBAL_DECLARATIONS {
        for node in cx.nodes(schema, expression)? {
            // Anonymous globals are not addressable
            let Some(name) = node.attribute("name") else {
                continue;
            };
            cx.collection.add(
                DerivedRecord::new(kind, name, DerivedBody::Plain)
                    .with_ncname(name)
                    .with_namespace(target_namespace.clone()),
            );
        }
    }

    for node in cx.nodes(schema, "./xsd:import")? {
        if let Some(namespace) = node.attribute("namespace") {
            defer_schema_import(cx, names::IMPORTED_XSDS, NamespaceCriteria::target_namespace(namespace));
        }
    }

    for (expression, relationship) in [
        ("./xsd:include", names::INCLUDED_XSDS),
        ("./xsd:redefine", names::REDEFINED_XSDS),
    ] {
        for node in cx.nodes(schema, expression)? {
            if let Some(location) = node.attribute("schemaLocation") {
                defer_schema_import(cx, relationship, NamespaceCriteria::location(location, target_namespace.clone()));
            }
        }
    }

    Ok(())
}

/// Imports with nothing to match on are dropped; they would match any schema
fn defer_schema_import(cx: &mut DeriveContext<'_>, relationship: &str, criteria: NamespaceCriteria) {
    if criteria.is_unbounded() {
        debug!(relationship, "schema reference has no namespace or file name, skipped");
        return;
    }
    cx.defer_import(relationship, ArtifactType::XsdDocument, ArtifactModel::Xsd, criteria);
}
