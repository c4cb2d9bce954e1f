//! SwitchYard application descriptor (`switchyard.xml`) deriver
//!
//! Emits extended records for SCA components (and the services they offer),
//! composite services, transformers and validators. Java classes, WSDL port
//! types and schema elements they point at are resolved after persistence.

use rustc_hash::FxHashMap;
use roxmltree::Node;
use tracing::debug;

use artifactgraph_storage::{ArtifactModel, ArtifactType, DerivedBody, DerivedRecord, Relationship, Target};

use crate::errors::Result;
use crate::features::xml::{DeriveContext, NamespaceBindings, XmlDeriver};
use crate::shared::QName;

/// Extended type of the primary record this deriver handles
pub const SWITCHYARD_XML_DOCUMENT: &str = "SwitchYardXmlDocument";

pub mod ns {
    pub const SCA: &str = "http://docs.oasis-open.org/ns/opencsa/sca/200912";
    pub const SWITCHYARD: &str = "urn:switchyard-config:switchyard:1.0";
    pub const BEAN: &str = "urn:switchyard-component-bean:config:1.0";
    pub const TRANSFORM: &str = "urn:switchyard-config:transform:1.0";
    pub const VALIDATE: &str = "urn:switchyard-config:validate:1.0";
    pub const SOAP: &str = "urn:switchyard-component-soap:config:1.0";
    pub const CAMEL: &str = "urn:switchyard-component-camel:config:1.0";
}

pub mod extended_types {
    pub const SERVICE: &str = "SwitchYardService";
    pub const COMPONENT: &str = "SwitchYardComponent";
    pub const COMPONENT_SERVICE: &str = "SwitchYardComponentService";
    pub const TRANSFORMER: &str = "SwitchYardTransformer";
    pub const VALIDATOR: &str = "SwitchYardValidator";

    pub const JAVA_CLASS: &str = "JavaClass";
    pub const JAVA_INTERFACE: &str = "JavaInterface";
}

pub mod relationships {
    pub const IMPLEMENTS: &str = "implements";
    pub const PROMOTES: &str = "promotes";
    pub const TRANSFORMS_FROM: &str = "transformsFrom";
    pub const TRANSFORMS_TO: &str = "transformsTo";
    pub const IMPLEMENTED_BY: &str = "implementedBy";
    pub const REFERENCES: &str = "references";
    pub const VALIDATES: &str = "validates";
    pub const OFFERS: &str = "offers";
}

pub const TRANSFORMER_TYPE: &str = "transformer-type";
pub const VALIDATOR_TYPE: &str = "validator-type";

const TRANSFORMER_KINDS: [&str; 5] = [
    "transform.java",
    "transform.xslt",
    "transform.json",
    "transform.smooks",
    "transform.jaxb",
];
const VALIDATOR_KINDS: [&str; 2] = ["validate.java", "validate.xml"];

use relationships::*;

#[derive(Debug, Default)]
pub struct SwitchYardDeriver {
    components: FxHashMap<String, Target>,
}

impl SwitchYardDeriver {
    pub fn new() -> Self {
        Self::default()
    }
}

fn extended(extended_type: &str, name: &str) -> DerivedRecord {
    let mut record = DerivedRecord::new(ArtifactType::ExtendedArtifactType, name, DerivedBody::Plain);
    record.meta.extended_type = Some(extended_type.to_string());
    record
}

/// Relationship present with no target yet
fn declare(record: &mut DerivedRecord, relationship: &str) {
    if record.meta.relationship(relationship).is_none() {
        record.meta.relationships.push(Relationship::new(relationship, Vec::new()));
    }
}

fn java_name(reference: &str) -> &str {
    let reference = reference.trim();
    reference.strip_prefix("java:").unwrap_or(reference)
}

/// Simple name of a `{ns}local` or `java:pkg.Class` reference
fn short_name(reference: &str) -> Option<&str> {
    if reference.starts_with('{') {
        reference.rsplit_once('}').map(|(_, local)| local)
    } else if reference.starts_with("java:") {
        reference.rsplit('.').next().map(|class| class.trim_start_matches("java:"))
    } else {
        None
    }
}

/// Port type named by `path.wsdl#wsdl.porttype(Name)`
fn port_type_name(interface: &str) -> Option<&str> {
    let (_, fragment) = interface.split_once('#')?;
    let name = fragment.trim().strip_prefix("wsdl.porttype(")?.strip_suffix(')')?;
    (!name.is_empty()).then_some(name)
}

fn local_name<'a>(node: Node<'a, '_>) -> &'a str {
    node.tag_name().name()
}

fn defer_java(cx: &mut DeriveContext<'_>, record: &mut DerivedRecord, relationship: &str, java_type: &str, class: &str) {
    let target = cx.defer_extended(record.uuid(), relationship, java_type, java_name(class));
    record.meta.add_relationship(relationship, target);
}

fn defer_element(cx: &mut DeriveContext<'_>, record: &mut DerivedRecord, relationship: &str, qname: QName) {
    let target = cx.defer_qname(
        record.uuid(),
        relationship,
        ArtifactType::ElementDeclaration,
        ArtifactModel::Xsd,
        &[ArtifactType::ElementDeclaration],
        qname,
    );
    record.meta.add_relationship(relationship, target);
}

/// Element reference in Clark notation, otherwise a Java class
fn defer_payload(cx: &mut DeriveContext<'_>, record: &mut DerivedRecord, relationship: &str, java_type: &str, reference: &str) {
    match QName::from_clark(reference) {
        Some(qname) => defer_element(cx, record, relationship, qname),
        None => defer_java(cx, record, relationship, java_type, reference),
    }
}

impl XmlDeriver for SwitchYardDeriver {
    fn name(&self) -> &'static str {
        "switchyard"
    }

    fn configure_namespace_mappings(&self, bindings: &mut NamespaceBindings) {
        bindings
            .add_mapping("sca", ns::SCA)
            .add_mapping("swyd", ns::SWITCHYARD)
            .add_mapping("bean", ns::BEAN)
            .add_mapping("tf", ns::TRANSFORM)
            .add_mapping("val", ns::VALIDATE)
            .add_mapping("soap", ns::SOAP)
            .add_mapping("camel", ns::CAMEL);
    }

    fn derive(&mut self, root: Node<'_, '_>, cx: &mut DeriveContext<'_>) -> Result<()> {
        self.components.clear();

        let target_namespace = root.attribute("targetNamespace").unwrap_or_default();
        cx.primary
            .meta
            .properties
            .insert("targetNamespace".into(), target_namespace.to_string());
        if cx.primary.meta.name == "switchyard.xml" {
            if let Some(name) = root.attribute("name").filter(|n| !n.trim().is_empty()) {
                cx.primary.meta.name = name.to_string();
            }
        }

        // Components first so composite services can promote them
        self.components(root, cx)?;
        self.services(root, cx)?;
        transformers(root, cx)?;
        validators(root, cx)
    }
}

impl SwitchYardDeriver {
    fn components(&mut self, root: Node<'_, '_>, cx: &mut DeriveContext<'_>) -> Result<()> {
        for node in cx.nodes(root, "./sca:composite/sca:component")? {
            let name = node.attribute("name").unwrap_or_default();
            let mut component = extended(extended_types::COMPONENT, name);

            if let Some(bean) = cx.node(node, "bean:implementation.bean")? {
                if let Some(class) = bean.attribute("class") {
                    defer_java(cx, &mut component, IMPLEMENTED_BY, extended_types::JAVA_CLASS, class);
                }
                if let Some(requires) = bean.attribute("requires") {
                    component.meta.properties.insert("requires".into(), requires.to_string());
                }
            }
            if let Some(camel) = cx.node(node, "camel:implementation.camel")? {
                if cx.node(camel, "camel:xml")?.is_some() {
                    // Route documents are not derived; the slot stays empty
                    declare(&mut component, IMPLEMENTED_BY);
                }
                if let Some(requires) = camel.attribute("requires") {
                    component.meta.properties.insert("requires".into(), requires.to_string());
                }
            }

            for reference in cx.nodes(node, "sca:reference")? {
                interfaces(cx, reference, &mut component, REFERENCES)?;
            }

            let mut offered = Vec::new();
            for service in cx.nodes(node, "sca:service")? {
                let mut record = extended(extended_types::COMPONENT_SERVICE, service.attribute("name").unwrap_or_default());
                interfaces(cx, service, &mut record, IMPLEMENTS)?;
                if let Some(requires) = service.attribute("requires") {
                    record.meta.properties.insert("requires".into(), requires.to_string());
                }
                component.meta.add_relationship(OFFERS, record.as_target());
                offered.push(record);
            }

            let target = cx.collection.add(component);
            self.components.entry(name.to_string()).or_insert(target);
            for record in offered {
                cx.collection.add(record);
            }
        }
        Ok(())
    }

    fn services(&self, root: Node<'_, '_>, cx: &mut DeriveContext<'_>) -> Result<()> {
        for node in cx.nodes(root, "./sca:composite/sca:service")? {
            let mut service = extended(extended_types::SERVICE, node.attribute("name").unwrap_or_default());

            if let Some(promote) = node.attribute("promote") {
                // `component` or `component/service`
                let component = promote.split('/').next().unwrap_or(promote).trim();
                match self.components.get(component) {
                    Some(target) => service.meta.add_relationship(PROMOTES, target.clone()),
                    None => debug!(promote, "promoted component not in this composite"),
                }
            }

            interfaces(cx, node, &mut service, IMPLEMENTS)?;
            cx.collection.add(service);
        }
        Ok(())
    }
}

/// `interface.java` and `interface.wsdl` children of a service or reference
fn interfaces(cx: &mut DeriveContext<'_>, node: Node<'_, '_>, record: &mut DerivedRecord, relationship: &str) -> Result<()> {
    if let Some(interface) = cx.node(node, "sca:interface.java")?.and_then(|i| i.attribute("interface")) {
        defer_java(cx, record, relationship, extended_types::JAVA_INTERFACE, interface);
    }
    if let Some(interface) = cx.node(node, "sca:interface.wsdl")?.and_then(|i| i.attribute("interface")) {
        match port_type_name(interface) {
            Some(port_type) => {
                let target = cx.defer_qname(
                    record.uuid(),
                    relationship,
                    ArtifactType::PortType,
                    ArtifactModel::Wsdl,
                    &[ArtifactType::PortType],
                    QName::new("", port_type),
                );
                record.meta.add_relationship(relationship, target);
            }
            None => {
                debug!(interface, "wsdl interface without a port type fragment");
                declare(record, relationship);
            }
        }
    }
    Ok(())
}

/// Transformers are unnamed; the name is built from the payload types
fn transformer_name(node: Node<'_, '_>) -> String {
    if let Some(name) = node.attribute("name").filter(|n| !n.trim().is_empty()) {
        return name.to_string();
    }
    match (node.attribute("from"), node.attribute("to")) {
        (Some(from), Some(to)) => {
            let mut name = short_name(from).unwrap_or_default().to_string();
            if let Some(to) = short_name(to) {
                name.push_str("->");
                name.push_str(to);
            }
            if name.is_empty() {
                local_name(node).to_string()
            } else {
                name
            }
        }
        _ => local_name(node).to_string(),
    }
}

fn kind_suffix<'a>(node: Node<'a, '_>) -> &'a str {
    let local = local_name(node);
    local.rsplit('.').next().unwrap_or(local)
}

fn transformers(root: Node<'_, '_>, cx: &mut DeriveContext<'_>) -> Result<()> {
    for node in cx.nodes(root, "./swyd:transforms/tf:*")? {
        if !TRANSFORMER_KINDS.contains(&local_name(node)) {
            continue;
        }
        let mut record = extended(extended_types::TRANSFORMER, &transformer_name(node));
        record.meta.properties.insert(TRANSFORMER_TYPE.into(), kind_suffix(node).to_string());

        if let Some(class) = node.attribute("class") {
            defer_java(cx, &mut record, IMPLEMENTED_BY, extended_types::JAVA_CLASS, class);
        }
        // CDI beans, stylesheets and Smooks configs are not derived
        for attribute in ["bean", "xsltFile", "config"] {
            if node.has_attribute(attribute) {
                declare(&mut record, IMPLEMENTED_BY);
            }
        }
        if let Some(from) = node.attribute("from") {
            defer_payload(cx, &mut record, TRANSFORMS_FROM, extended_types::JAVA_CLASS, from);
        }
        if let Some(to) = node.attribute("to") {
            defer_payload(cx, &mut record, TRANSFORMS_TO, extended_types::JAVA_CLASS, to);
        }
        cx.collection.add(record);
    }
    Ok(())
}

fn validators(root: Node<'_, '_>, cx: &mut DeriveContext<'_>) -> Result<()> {
    for node in cx.nodes(root, "./swyd:validates/val:*")? {
        if !VALIDATOR_KINDS.contains(&local_name(node)) {
            continue;
        }
        let Some(name) = node.attribute("name") else {
            debug!(kind = local_name(node), "unnamed validator skipped");
            continue;
        };

        let mut record = extended(extended_types::VALIDATOR, name);
        record.meta.properties.insert(VALIDATOR_TYPE.into(), kind_suffix(node).to_string());
        defer_payload(cx, &mut record, VALIDATES, extended_types::JAVA_INTERFACE, name);

        if let Some(class) = node.attribute("class") {
            defer_java(cx, &mut record, IMPLEMENTED_BY, extended_types::JAVA_CLASS, class);
        }
        if node.has_attribute("bean") {
            declare(&mut record, IMPLEMENTED_BY);
        }
        cx.collection.add(record);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{ResolutionConfig, XmlConfig};
    use crate::features::builder::ArtifactBuilder;
    use crate::features::xml::XmlArtifactBuilder;
    use crate::shared::RawContent;
    use artifactgraph_storage::{names, PrimaryRecord};
    use pretty_assertions::assert_eq;

    const SWITCHYARD_XML: &str = include_str!("../../../tests/fixtures/switchyard.xml");

    fn derive() -> (PrimaryRecord, XmlArtifactBuilder<SwitchYardDeriver>) {
        let mut primary = PrimaryRecord::new(ArtifactType::ExtendedDocument, "switchyard.xml", "application/xml");
        primary.meta.extended_type = Some(SWITCHYARD_XML_DOCUMENT.into());
        let mut builder =
            XmlArtifactBuilder::new(SwitchYardDeriver::new(), XmlConfig::default(), ResolutionConfig::default());
        builder
            .derive_artifacts(&mut primary, &RawContent::new(SWITCHYARD_XML, "application/xml"))
            .unwrap();
        (primary, builder)
    }

    fn find<'a>(records: &'a [DerivedRecord], extended_type: &str, name: &str) -> &'a DerivedRecord {
        records
            .iter()
            .find(|r| r.meta.extended_type.as_deref() == Some(extended_type) && r.name() == name)
            .unwrap_or_else(|| panic!("{extended_type} {name}"))
    }

    fn target_count(record: &DerivedRecord, relationship: &str) -> Option<usize> {
        record.meta.relationship(relationship).map(|r| r.targets.len())
    }

    #[test]
    fn test_primary_named_after_application() {
        let (primary, builder) = derive();
        assert_eq!(primary.meta.name, "orders");
        assert_eq!(
            primary.meta.properties["targetNamespace"],
            "urn:switchyard-quickstart:bean-service:0.1.0"
        );
        assert_eq!(builder.derived_artifacts().len(), 12);
    }

    #[test]
    fn test_promoted_component() {
        let (_, builder) = derive();
        let records = builder.derived_artifacts();
        let service = find(records, extended_types::SERVICE, "OrderService");
        let component = find(records, extended_types::COMPONENT, "OrderService");

        let promotes = service.meta.relationship(PROMOTES).unwrap();
        assert_eq!(promotes.targets[0].uuid(), Some(component.uuid()));
        assert_eq!(target_count(service, IMPLEMENTS), Some(1));
        assert!(!service.meta.relationship(IMPLEMENTS).unwrap().targets[0].is_resolved());
    }

    #[test]
    fn test_components() {
        let (_, builder) = derive();
        let records = builder.derived_artifacts();

        let inventory = find(records, extended_types::COMPONENT, "InventoryService");
        assert_eq!(inventory.meta.properties["requires"], "managedTransaction.Global");
        assert_eq!(target_count(inventory, IMPLEMENTED_BY), Some(1));
        assert!(inventory.meta.relationship(REFERENCES).is_none());

        let orders = find(records, extended_types::COMPONENT, "OrderService");
        assert_eq!(target_count(orders, REFERENCES), Some(1));

        let camel = find(records, extended_types::COMPONENT, "CamelService");
        assert_eq!(camel.meta.properties["requires"], "noManagedTransaction");
        assert_eq!(target_count(camel, IMPLEMENTED_BY), Some(0));
        assert!(camel.meta.relationship(REFERENCES).is_none());
    }

    #[test]
    fn test_component_offers_its_services() {
        let (_, builder) = derive();
        let records = builder.derived_artifacts();
        let inventory = find(records, extended_types::COMPONENT, "InventoryService");
        let offered = find(records, extended_types::COMPONENT_SERVICE, "InventoryService");

        let offers = inventory.meta.relationship(OFFERS).unwrap();
        assert_eq!(offers.targets[0].uuid(), Some(offered.uuid()));
        assert_eq!(offered.meta.properties["requires"], "propagatesTransaction");
        assert_eq!(target_count(offered, IMPLEMENTS), Some(1));
    }

    #[test]
    fn test_transformer_names_and_kinds() {
        let (_, builder) = derive();
        let records = builder.derived_artifacts();

        let java = find(records, extended_types::TRANSFORMER, "OrderAck->submitOrderResponse");
        assert_eq!(java.meta.properties[TRANSFORMER_TYPE], "java");
        assert_eq!(target_count(java, IMPLEMENTED_BY), Some(1));
        assert_eq!(target_count(java, TRANSFORMS_FROM), Some(1));
        assert_eq!(target_count(java, TRANSFORMS_TO), Some(1));
        assert_eq!(
            java.meta.relationship(TRANSFORMS_TO).unwrap().targets[0].artifact_type,
            ArtifactType::ElementDeclaration
        );

        let xslt = find(records, extended_types::TRANSFORMER, "CDM->S1");
        assert_eq!(xslt.meta.properties[TRANSFORMER_TYPE], "xslt");
        assert_eq!(target_count(xslt, IMPLEMENTED_BY), Some(0));
    }

    #[test]
    fn test_validators() {
        let (_, builder) = derive();
        let records = builder.derived_artifacts();

        let java = find(records, extended_types::VALIDATOR, "java:org.switchyard.quickstarts.bean.service.Order");
        assert_eq!(java.meta.properties[VALIDATOR_TYPE], "java");
        let validates = java.meta.relationship(VALIDATES).unwrap();
        assert_eq!(validates.targets[0].artifact_type, ArtifactType::ExtendedArtifactType);
        assert_eq!(target_count(java, IMPLEMENTED_BY), Some(1));

        let xml = find(
            records,
            extended_types::VALIDATOR,
            "{urn:switchyard-quickstart:bean-service:1.0}submitOrder",
        );
        assert_eq!(xml.meta.properties[VALIDATOR_TYPE], "xml");
        let validates = xml.meta.relationship(VALIDATES).unwrap();
        assert_eq!(validates.targets[0].artifact_type, ArtifactType::ElementDeclaration);
    }

    #[test]
    fn test_every_record_points_back() {
        let (primary, builder) = derive();
        for record in builder.derived_artifacts() {
            let back = record.meta.relationship(names::RELATED_DOCUMENT).unwrap();
            assert_eq!(back.targets[0].uuid(), Some(primary.uuid()));
        }
    }

    #[test]
    fn test_reference_helpers() {
        assert_eq!(short_name("{urn:a}Order"), Some("Order"));
        assert_eq!(short_name("java:org.example.OrderAck"), Some("OrderAck"));
        assert_eq!(short_name("java:Order"), Some("Order"));
        assert_eq!(short_name("Order"), None);
        assert_eq!(port_type_name("wsdl/Orders.wsdl#wsdl.porttype(OrderService)"), Some("OrderService"));
        assert_eq!(port_type_name("wsdl/Orders.wsdl"), None);
        assert_eq!(java_name("java:org.example.Order"), "org.example.Order");
    }
}
