//! WSDL 1.1 deriver
//!
//! Walks a WSDL document in dependency order so references inside the same
//! document resolve immediately:
//!
//! 1. inline schemas of `wsdl:types`
//! 2. `wsdl:import`
//! 3. messages and their parts
//! 4. port types, operations, inputs/outputs/faults
//! 5. bindings, binding operations, SOAP binding extensions
//! 6. services, ports, SOAP address extensions
//!
//! References not found in the document are deferred to phase 2 with a
//! pending placeholder in the owning slot.

use roxmltree::Node;
use tracing::debug;

use artifactgraph_storage::{
    names, ArtifactModel, ArtifactType, DerivedBody, DerivedRecord, Target,
};

use super::xsd::{bind_schema_prefixes, derive_schema};
use crate::errors::{BuilderError, Result};
use crate::features::relationships::NamespaceCriteria;
use crate::features::xml::{well_known, DeriveContext, NamespaceBindings, XmlDeriver};
use crate::shared::QName;

const TYPE_DECLARATIONS: [ArtifactType; 2] = [
    ArtifactType::SimpleTypeDeclaration,
    ArtifactType::ComplexTypeDeclaration,
];

#[derive(Debug, Default)]
pub struct WsdlDeriver;

impl WsdlDeriver {
    pub fn new() -> Self {
        Self
    }
}

impl XmlDeriver for WsdlDeriver {
    fn name(&self) -> &'static str {
        "wsdl"
    }

    fn configure_namespace_mappings(&self, bindings: &mut NamespaceBindings) {
        bind_schema_prefixes(bindings);
        bindings
            .add_mapping("wsdl", well_known::WSDL)
            .add_mapping("soap", well_known::SOAP);
    }

    fn derive(&mut self, root: Node<'_, '_>, cx: &mut DeriveContext<'_>) -> Result<()> {
        let target_namespace = root.attribute("targetNamespace").unwrap_or_default().trim();
        cx.primary.target_namespace = (!target_namespace.is_empty()).then(|| target_namespace.to_string());

        let walk = WsdlWalk {
            target_namespace: target_namespace.to_string(),
        };
        walk.types(root, cx)?;
        walk.imports(root, cx)?;
        walk.messages(root, cx)?;
        walk.port_types(root, cx)?;
        walk.bindings(root, cx)?;
        walk.services(root, cx)
    }
}

/// One pass over one document
struct WsdlWalk {
    target_namespace: String,
}

/// Non-blank `name` attribute; elements without one are skipped
fn name_of<'a>(node: Node<'a, '_>) -> Option<&'a str> {
    let name = node.attribute("name").filter(|v| !v.trim().is_empty());
    if name.is_none() {
        debug!(
            element = node.tag_name().name(),
            offset = node.range().start,
            "unnamed element skipped"
        );
    }
    name
}

fn targets(records: &[DerivedRecord]) -> Vec<Target> {
    records.iter().map(DerivedRecord::as_target).collect()
}

impl WsdlWalk {
    fn namespace(&self) -> Option<String> {
        (!self.target_namespace.is_empty()).then(|| self.target_namespace.clone())
    }

    fn record(&self, kind: ArtifactType, name: &str, body: DerivedBody) -> DerivedRecord {
        DerivedRecord::new(kind, name, body).with_namespace(self.namespace())
    }

    /// Named record: display name and ncname from `name`, else `fallback` and no ncname
    fn named(&self, kind: ArtifactType, node: Node<'_, '_>, fallback: &str, body: DerivedBody) -> DerivedRecord {
        match node.attribute("name") {
            Some(name) => self.record(kind, name, body).with_ncname(name),
            None => self.record(kind, fallback, body),
        }
    }

    fn qname(&self, node: Node<'_, '_>, encoded: &str) -> QName {
        QName::resolve(node, encoded, &self.target_namespace)
    }

    fn types(&self, root: Node<'_, '_>, cx: &mut DeriveContext<'_>) -> Result<()> {
        for schema in cx.nodes(root, "./wsdl:types/xsd:schema")? {
            derive_schema(schema, cx)?;
        }
        Ok(())
    }

    fn imports(&self, root: Node<'_, '_>, cx: &mut DeriveContext<'_>) -> Result<()> {
        for import in cx.nodes(root, ".//wsdl:import")? {
            if let Some(namespace) = import.attribute("namespace").filter(|ns| !ns.is_empty()) {
                cx.defer_import(
                    names::IMPORTED_WSDLS,
                    ArtifactType::WsdlDocument,
                    ArtifactModel::Wsdl,
                    NamespaceCriteria::target_namespace(namespace),
                );
            }
        }
        Ok(())
    }

    // ═══════════════════════════════════════════════════════════════════════
    // Messages
    // ═══════════════════════════════════════════════════════════════════════

    fn messages(&self, root: Node<'_, '_>, cx: &mut DeriveContext<'_>) -> Result<()> {
        for message_node in cx.nodes(root, "./wsdl:message")? {
            let Some(name) = name_of(message_node) else {
                continue;
            };

            let mut parts = Vec::new();
            for part_node in cx.nodes(message_node, "./wsdl:part")? {
                parts.extend(self.part(part_node, cx)?);
            }

            let message = self
                .record(ArtifactType::Message, name, DerivedBody::Message { parts: targets(&parts) })
                .with_ncname(name);
            cx.collection.add(message);
            for part in parts {
                cx.collection.add(part);
            }
        }
        Ok(())
    }

    fn part(&self, node: Node<'_, '_>, cx: &mut DeriveContext<'_>) -> Result<Option<DerivedRecord>> {
        let Some(name) = name_of(node) else {
            return Ok(None);
        };
        let mut part = self.record(ArtifactType::Part, name, DerivedBody::Plain).with_ncname(name);

        let mut element = None;
        let mut type_ = None;
        if let Some(encoded) = node.attribute("element") {
            let qname = self.qname(node, encoded);
            element = Some(match cx.collection.lookup(ArtifactType::ElementDeclaration, &qname) {
                Some(found) => found.as_target(),
                None => cx.defer_qname(
                    part.uuid(),
                    names::ELEMENT,
                    ArtifactType::ElementDeclaration,
                    ArtifactModel::Xsd,
                    &[ArtifactType::ElementDeclaration],
                    qname,
                ),
            });
        } else if let Some(encoded) = node.attribute("type") {
            let qname = self.qname(node, encoded);
            type_ = Some(match cx.collection.lookup_any(&TYPE_DECLARATIONS, &qname) {
                Some(found) => found.as_target(),
                None => cx.defer_qname(
                    part.uuid(),
                    names::TYPE,
                    ArtifactType::XsdType,
                    ArtifactModel::Xsd,
                    &TYPE_DECLARATIONS,
                    qname,
                ),
            });
        }

        part.body = DerivedBody::Part { element, type_ };
        Ok(Some(part))
    }

    // ═══════════════════════════════════════════════════════════════════════
    // Port types
    // ═══════════════════════════════════════════════════════════════════════

    fn port_types(&self, root: Node<'_, '_>, cx: &mut DeriveContext<'_>) -> Result<()> {
        for port_type_node in cx.nodes(root, "./wsdl:portType")? {
            let Some(name) = name_of(port_type_node) else {
                continue;
            };
            let port_type_qname = QName::new(self.target_namespace.clone(), name);

            let mut operations = Vec::new();
            for operation_node in cx.nodes(port_type_node, "./wsdl:operation")? {
                operations.extend(self.operation(operation_node, cx)?);
            }

            let operation_targets = operations.iter().map(|(op, _)| op.as_target()).collect();
            let port_type = self
                .record(ArtifactType::PortType, name, DerivedBody::PortType { operations: operation_targets })
                .with_ncname(name);
            cx.collection.add(port_type);
            for (operation, children) in operations {
                cx.collection.add_operation(&port_type_qname, operation);
                for child in children {
                    cx.collection.add(child);
                }
            }
        }
        Ok(())
    }

    fn operation(
        &self,
        node: Node<'_, '_>,
        cx: &mut DeriveContext<'_>,
    ) -> Result<Option<(DerivedRecord, Vec<DerivedRecord>)>> {
        let Some(name) = name_of(node) else {
            return Ok(None);
        };
        let mut operation = self.record(ArtifactType::Operation, name, DerivedBody::Plain).with_ncname(name);

        let input = match cx.node(node, "./wsdl:input")? {
            Some(n) => Some(self.operation_message(n, ArtifactType::OperationInput, "wsdl:input", cx)),
            None => None,
        };
        let output = match cx.node(node, "./wsdl:output")? {
            Some(n) => Some(self.operation_message(n, ArtifactType::OperationOutput, "wsdl:output", cx)),
            None => None,
        };
        let mut faults = Vec::new();
        for fault_node in cx.nodes(node, "./wsdl:fault")? {
            faults.push(self.operation_message(fault_node, ArtifactType::Fault, "wsdl:fault", cx));
        }

        operation.body = DerivedBody::Operation {
            input: input.as_ref().map(DerivedRecord::as_target),
            output: output.as_ref().map(DerivedRecord::as_target),
            faults: targets(&faults),
        };

        let children = input.into_iter().chain(output).chain(faults).collect();
        Ok(Some((operation, children)))
    }

    /// Input, output or fault of an abstract operation
    ///
    /// Named after the `name` attribute, else the referenced message's local
    /// name, else `fallback`. Only an explicit `name` becomes the ncname.
    fn operation_message(
        &self,
        node: Node<'_, '_>,
        kind: ArtifactType,
        fallback: &str,
        cx: &mut DeriveContext<'_>,
    ) -> DerivedRecord {
        let message_qname = node.attribute("message").map(|m| self.qname(node, m));
        let display_name = node
            .attribute("name")
            .or(message_qname.as_ref().map(|q| q.local.as_str()))
            .unwrap_or(fallback);

        let mut record = self.record(kind, display_name, DerivedBody::Plain);
        if let Some(name) = node.attribute("name") {
            record = record.with_ncname(name);
        }

        let message = message_qname.map(|qname| match cx.collection.lookup(ArtifactType::Message, &qname) {
            Some(found) => found.as_target(),
            None => cx.defer_qname(
                record.uuid(),
                names::MESSAGE,
                ArtifactType::Message,
                ArtifactModel::Wsdl,
                &[ArtifactType::Message],
                qname,
            ),
        });
        record.body = DerivedBody::OperationMessage { message };
        record
    }

    // ═══════════════════════════════════════════════════════════════════════
    // Bindings
    // ═══════════════════════════════════════════════════════════════════════

    fn bindings(&self, root: Node<'_, '_>, cx: &mut DeriveContext<'_>) -> Result<()> {
        for binding_node in cx.nodes(root, "./wsdl:binding")? {
            let Some(name) = name_of(binding_node) else {
                continue;
            };
            let mut binding = self.record(ArtifactType::Binding, name, DerivedBody::Plain).with_ncname(name);

            // Operations are only checked against a port type of this document
            let mut local_port_type = None;
            let port_type = match binding_node.attribute("type") {
                Some(encoded) => {
                    let qname = self.qname(binding_node, encoded);
                    Some(match cx.collection.lookup(ArtifactType::PortType, &qname) {
                        Some(found) => {
                            let target = found.as_target();
                            local_port_type = Some(qname);
                            target
                        }
                        None => cx.defer_qname(
                            binding.uuid(),
                            names::PORT_TYPE,
                            ArtifactType::PortType,
                            ArtifactModel::Wsdl,
                            &[ArtifactType::PortType],
                            qname,
                        ),
                    })
                }
                None => None,
            };

            let mut extensions = Vec::new();
            for soap_binding in cx.nodes(binding_node, "./soap:binding")? {
                extensions.push(
                    DerivedRecord::new(
                        ArtifactType::SoapBinding,
                        "soap:binding",
                        DerivedBody::SoapBinding {
                            style: soap_binding.attribute("style").map(str::to_string),
                            transport: soap_binding.attribute("transport").map(str::to_string),
                        },
                    )
                    .with_ncname("binding")
                    .with_namespace(Some(well_known::SOAP.to_string())),
                );
            }

            let mut binding_operations = Vec::new();
            for operation_node in cx.nodes(binding_node, "./wsdl:operation")? {
                binding_operations.extend(self.binding_operation(operation_node, local_port_type.as_ref(), cx)?);
            }

            binding.body = DerivedBody::Binding {
                port_type,
                binding_operations: binding_operations.iter().map(|(op, _)| op.as_target()).collect(),
                extensions: targets(&extensions),
            };
            cx.collection.add(binding);
            for extension in extensions {
                cx.collection.add(extension);
            }
            for (operation, children) in binding_operations {
                cx.collection.add(operation);
                for child in children {
                    cx.collection.add(child);
                }
            }
        }
        Ok(())
    }

    fn binding_operation(
        &self,
        node: Node<'_, '_>,
        port_type: Option<&QName>,
        cx: &mut DeriveContext<'_>,
    ) -> Result<Option<(DerivedRecord, Vec<DerivedRecord>)>> {
        let Some(name) = name_of(node) else {
            return Ok(None);
        };
        let mut binding_operation = self
            .record(ArtifactType::BindingOperation, name, DerivedBody::Plain)
            .with_ncname(name);

        let operation = match port_type {
            Some(port_type) => {
                let found = cx.collection.lookup_operation(port_type, name).ok_or_else(|| {
                    BuilderError::structure(format!(
                        "binding operation '{}' has no matching operation in port type {}",
                        name, port_type
                    ))
                })?;
                Some(found.as_target())
            }
            None => None,
        };

        let input = cx
            .node(node, "./wsdl:input")?
            .map(|n| self.named(ArtifactType::BindingOperationInput, n, "wsdl:input", DerivedBody::Plain));
        let output = cx
            .node(node, "./wsdl:output")?
            .map(|n| self.named(ArtifactType::BindingOperationOutput, n, "wsdl:output", DerivedBody::Plain));
        let faults: Vec<_> = cx
            .nodes(node, "./wsdl:fault")?
            .into_iter()
            .map(|n| self.named(ArtifactType::BindingOperationFault, n, "wsdl:fault", DerivedBody::Plain))
            .collect();

        binding_operation.body = DerivedBody::BindingOperation {
            operation,
            input: input.as_ref().map(DerivedRecord::as_target),
            output: output.as_ref().map(DerivedRecord::as_target),
            faults: targets(&faults),
        };

        let children = input.into_iter().chain(output).chain(faults).collect();
        Ok(Some((binding_operation, children)))
    }

    // ═══════════════════════════════════════════════════════════════════════
    // Services
    // ═══════════════════════════════════════════════════════════════════════

    fn services(&self, root: Node<'_, '_>, cx: &mut DeriveContext<'_>) -> Result<()> {
        for service_node in cx.nodes(root, "./wsdl:service")? {
            let mut service = self.named(ArtifactType::WsdlService, service_node, "wsdl:service", DerivedBody::Plain);

            let mut ports = Vec::new();
            for port_node in cx.nodes(service_node, "./wsdl:port")? {
                ports.push(self.port(port_node, cx)?);
            }

            service.body = DerivedBody::Service {
                ports: ports.iter().map(|(port, _)| port.as_target()).collect(),
            };
            cx.collection.add(service);
            for (port, addresses) in ports {
                cx.collection.add(port);
                for address in addresses {
                    cx.collection.add(address);
                }
            }
        }
        Ok(())
    }

    fn port(&self, node: Node<'_, '_>, cx: &mut DeriveContext<'_>) -> Result<(DerivedRecord, Vec<DerivedRecord>)> {
        let mut port = self.named(ArtifactType::Port, node, "wsdl:port", DerivedBody::Plain);

        let binding = node.attribute("binding").map(|encoded| {
            let qname = self.qname(node, encoded);
            match cx.collection.lookup(ArtifactType::Binding, &qname) {
                Some(found) => found.as_target(),
                None => cx.defer_qname(
                    port.uuid(),
                    names::BINDING,
                    ArtifactType::Binding,
                    ArtifactModel::Wsdl,
                    &[ArtifactType::Binding],
                    qname,
                ),
            }
        });

        let addresses: Vec<_> = cx
            .nodes(node, "./soap:address")?
            .into_iter()
            .map(|address| {
                DerivedRecord::new(
                    ArtifactType::SoapAddress,
                    "soap:address",
                    DerivedBody::SoapAddress {
                        location: address.attribute("location").map(str::to_string),
                    },
                )
                .with_ncname("address")
                .with_namespace(Some(well_known::SOAP.to_string()))
            })
            .collect();

        port.body = DerivedBody::Port {
            binding,
            extensions: targets(&addresses),
        };
        Ok((port, addresses))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{ResolutionConfig, XmlConfig};
    use crate::features::builder::ArtifactBuilder;
    use crate::features::xml::XmlArtifactBuilder;
    use crate::shared::RawContent;
    use artifactgraph_storage::PrimaryRecord;

    fn derive(wsdl: &str) -> Result<(PrimaryRecord, XmlArtifactBuilder<WsdlDeriver>)> {
        let mut primary = PrimaryRecord::new(ArtifactType::WsdlDocument, "test.wsdl", "application/xml");
        let mut builder = XmlArtifactBuilder::new(WsdlDeriver, XmlConfig::default(), ResolutionConfig::default());
        builder.derive_artifacts(&mut primary, &RawContent::new(wsdl, "application/xml"))?;
        Ok((primary, builder))
    }

    fn find<'a>(builder: &'a XmlArtifactBuilder<WsdlDeriver>, kind: ArtifactType, name: &str) -> &'a DerivedRecord {
        builder
            .derived_artifacts()
            .iter()
            .find(|r| r.artifact_type() == kind && r.name() == name)
            .unwrap()
    }

    const ECHO: &str = r#"<definitions xmlns="http://schemas.xmlsoap.org/wsdl/"
    xmlns:soap="http://schemas.xmlsoap.org/wsdl/soap/"
    xmlns:tns="urn:echo" xmlns:ext="urn:external"
    targetNamespace="urn:echo">
  <message name="echoIn"><part name="text" element="ext:text"/></message>
  <portType name="Echo">
    <operation name="echo"><input message="tns:echoIn"/><output message="tns:missingOut"/></operation>
  </portType>
  <binding name="EchoBinding" type="tns:Echo">
    <soap:binding style="document" transport="http://schemas.xmlsoap.org/soap/http"/>
    <operation name="echo"><input/><output/></operation>
  </binding>
  <service>
    <port binding="tns:EchoBinding"><soap:address location="http://localhost/echo"/></port>
  </service>
</definitions>"#;

    #[test]
    fn test_default_namespace_wsdl() {
        let (primary, builder) = derive(ECHO).unwrap();
        assert_eq!(primary.target_namespace.as_deref(), Some("urn:echo"));

        let input = find(&builder, ArtifactType::OperationInput, "echoIn");
        assert_eq!(input.ncname, None);
        let message = find(&builder, ArtifactType::Message, "echoIn");
        assert_eq!(
            input.body,
            DerivedBody::OperationMessage {
                message: Some(message.as_target())
            }
        );
    }

    #[test]
    fn test_unresolved_references_get_placeholders() {
        let (_, builder) = derive(ECHO).unwrap();

        let part = find(&builder, ArtifactType::Part, "text");
        assert_eq!(
            part.body,
            DerivedBody::Part {
                element: Some(Target::pending(ArtifactType::ElementDeclaration)),
                type_: None
            }
        );
        // ext:text and tns:missingOut
        assert_eq!(builder.pending_relationships(), 2);
    }

    #[test]
    fn test_fallback_names_for_unnamed_elements() {
        let (_, builder) = derive(ECHO).unwrap();
        let service = find(&builder, ArtifactType::WsdlService, "wsdl:service");
        assert_eq!(service.ncname, None);
        find(&builder, ArtifactType::Port, "wsdl:port");
        find(&builder, ArtifactType::BindingOperationInput, "wsdl:input");
        find(&builder, ArtifactType::BindingOperationOutput, "wsdl:output");
    }

    #[test]
    fn test_soap_extensions() {
        let (_, builder) = derive(ECHO).unwrap();
        let soap_binding = find(&builder, ArtifactType::SoapBinding, "soap:binding");
        assert_eq!(soap_binding.ncname.as_deref(), Some("binding"));
        assert_eq!(soap_binding.namespace.as_deref(), Some(well_known::SOAP));
        assert_eq!(
            soap_binding.body,
            DerivedBody::SoapBinding {
                style: Some("document".into()),
                transport: Some("http://schemas.xmlsoap.org/soap/http".into())
            }
        );

        let address = find(&builder, ArtifactType::SoapAddress, "soap:address");
        let port = find(&builder, ArtifactType::Port, "wsdl:port");
        let binding = find(&builder, ArtifactType::Binding, "EchoBinding");
        assert_eq!(
            port.body,
            DerivedBody::Port {
                binding: Some(binding.as_target()),
                extensions: vec![address.as_target()]
            }
        );
    }

    #[test]
    fn test_binding_operation_links_port_type_operation() {
        let (_, builder) = derive(ECHO).unwrap();
        let operation = find(&builder, ArtifactType::Operation, "echo");
        let binding_operation = find(&builder, ArtifactType::BindingOperation, "echo");
        match &binding_operation.body {
            DerivedBody::BindingOperation { operation: linked, .. } => {
                assert_eq!(linked.as_ref(), Some(&operation.as_target()))
            }
            other => panic!("unexpected body {:?}", other),
        }
    }

    #[test]
    fn test_binding_operation_missing_from_port_type() {
        let wsdl = r#"<wsdl:definitions xmlns:wsdl="http://schemas.xmlsoap.org/wsdl/"
            xmlns:tns="urn:x" targetNamespace="urn:x">
          <wsdl:portType name="P"><wsdl:operation name="a"/></wsdl:portType>
          <wsdl:binding name="B" type="tns:P"><wsdl:operation name="b"/></wsdl:binding>
        </wsdl:definitions>"#;
        let err = derive(wsdl).err().unwrap();
        assert!(matches!(err, BuilderError::Structure(_)));
    }

    #[test]
    fn test_binding_for_foreign_port_type_is_deferred() {
        let wsdl = r#"<wsdl:definitions xmlns:wsdl="http://schemas.xmlsoap.org/wsdl/"
            xmlns:other="urn:other" targetNamespace="urn:x">
          <wsdl:binding name="B" type="other:P"><wsdl:operation name="b"/></wsdl:binding>
        </wsdl:definitions>"#;
        let (_, builder) = derive(wsdl).unwrap();
        assert_eq!(builder.pending_relationships(), 1);
        let binding_operation = find(&builder, ArtifactType::BindingOperation, "b");
        match &binding_operation.body {
            DerivedBody::BindingOperation { operation, .. } => assert!(operation.is_none()),
            other => panic!("unexpected body {:?}", other),
        }
    }

    #[test]
    fn test_unnamed_elements_are_skipped() {
        let wsdl = r#"<wsdl:definitions xmlns:wsdl="http://schemas.xmlsoap.org/wsdl/"
            xmlns:tns="urn:x" targetNamespace="urn:x">
          <wsdl:message/>
          <wsdl:message name="in"><wsdl:part/><wsdl:part name="body" type="tns:t"/></wsdl:message>
          <wsdl:portType/>
          <wsdl:portType name="P">
            <wsdl:operation><wsdl:input message="tns:in"/></wsdl:operation>
            <wsdl:operation name="a"><wsdl:input message="tns:in"/></wsdl:operation>
          </wsdl:portType>
          <wsdl:binding type="tns:P"/>
          <wsdl:binding name="B" type="tns:P"><wsdl:operation/><wsdl:operation name="a"/></wsdl:binding>
        </wsdl:definitions>"#;
        let (_, builder) = derive(wsdl).unwrap();

        let count = |kind| builder.derived_artifacts().iter().filter(|r| r.artifact_type() == kind).count();
        assert_eq!(count(ArtifactType::Message), 1);
        assert_eq!(count(ArtifactType::Part), 1);
        assert_eq!(count(ArtifactType::PortType), 1);
        assert_eq!(count(ArtifactType::Operation), 1);
        assert_eq!(count(ArtifactType::OperationInput), 1);
        assert_eq!(count(ArtifactType::Binding), 1);
        assert_eq!(count(ArtifactType::BindingOperation), 1);

        let message = find(&builder, ArtifactType::Message, "in");
        let part = find(&builder, ArtifactType::Part, "body");
        assert_eq!(
            message.body,
            DerivedBody::Message {
                parts: vec![part.as_target()]
            }
        );
    }
}
