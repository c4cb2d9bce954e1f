//! Kind dispatch over stored records
//!
//! [`walk`] matches exhaustively on [`ArtifactType`]; adding a kind without a
//! visitor method is a compile error here, not a silent no-op at runtime.
//! Every per-kind method defaults to [`ArtifactVisitor::visit_artifact`], which
//! itself does nothing, so visitors override only what they care about.

use artifactgraph_storage::{Artifact, ArtifactType};

macro_rules! artifact_visitor {
    ($($variant:ident => $method:ident),+ $(,)?) => {
        pub trait ArtifactVisitor {
            /// Fallback for every kind not overridden
            fn visit_artifact(&mut self, _artifact: &Artifact) {}

            $(
                fn $method(&mut self, artifact: &Artifact) {
                    self.visit_artifact(artifact)
                }
            )+
        }

        /// Dispatch `artifact` to the method of its kind
        pub fn walk<V: ArtifactVisitor + ?Sized>(visitor: &mut V, artifact: &Artifact) {
            match artifact.artifact_type() {
                $(ArtifactType::$variant => visitor.$method(artifact)),+
            }
        }
    };
}

artifact_visitor! {
    Document => visit_document,
    XmlDocument => visit_xml_document,
    XsdDocument => visit_xsd_document,
    AttributeDeclaration => visit_attribute_declaration,
    ElementDeclaration => visit_element_declaration,
    SimpleTypeDeclaration => visit_simple_type_declaration,
    ComplexTypeDeclaration => visit_complex_type_declaration,
    XsdType => visit_xsd_type,
    PolicyDocument => visit_policy_document,
    PolicyExpression => visit_policy_expression,
    PolicyAttachment => visit_policy_attachment,
    SoapAddress => visit_soap_address,
    SoapBinding => visit_soap_binding,
    WsdlDocument => visit_wsdl_document,
    WsdlService => visit_wsdl_service,
    Port => visit_port,
    WsdlExtension => visit_wsdl_extension,
    Part => visit_part,
    Message => visit_message,
    Fault => visit_fault,
    PortType => visit_port_type,
    Operation => visit_operation,
    OperationInput => visit_operation_input,
    OperationOutput => visit_operation_output,
    Binding => visit_binding,
    BindingOperation => visit_binding_operation,
    BindingOperationInput => visit_binding_operation_input,
    BindingOperationOutput => visit_binding_operation_output,
    BindingOperationFault => visit_binding_operation_fault,
    Organization => visit_organization,
    ServiceEndpoint => visit_service_endpoint,
    ServiceInstance => visit_service_instance,
    ServiceOperation => visit_service_operation,
    HumanActor => visit_human_actor,
    Choreography => visit_choreography,
    ChoreographyProcess => visit_choreography_process,
    Collaboration => visit_collaboration,
    CollaborationProcess => visit_collaboration_process,
    Composition => visit_composition,
    Effect => visit_effect,
    Element => visit_element,
    Event => visit_event,
    InformationType => visit_information_type,
    Orchestration => visit_orchestration,
    OrchestrationProcess => visit_orchestration_process,
    Policy => visit_policy,
    PolicySubject => visit_policy_subject,
    Process => visit_process,
    Service => visit_service,
    ServiceContract => visit_service_contract,
    ServiceComposition => visit_service_composition,
    ServiceInterface => visit_service_interface,
    System => visit_system,
    Task => visit_task,
    ExtendedArtifactType => visit_extended_artifact_type,
    ExtendedDocument => visit_extended_document,
}

/// Walk every record in order
pub fn walk_all<'a, V, I>(visitor: &mut V, artifacts: I)
where
    V: ArtifactVisitor + ?Sized,
    I: IntoIterator<Item = &'a Artifact>,
{
    for artifact in artifacts {
        walk(visitor, artifact);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use artifactgraph_storage::{DerivedBody, DerivedRecord, PrimaryRecord};

    #[derive(Default)]
    struct Tally {
        messages: usize,
        other: usize,
    }

    impl ArtifactVisitor for Tally {
        fn visit_artifact(&mut self, _artifact: &Artifact) {
            self.other += 1;
        }

        fn visit_message(&mut self, _artifact: &Artifact) {
            self.messages += 1;
        }
    }

    #[test]
    fn test_specific_method_wins_over_fallback() {
        let records: Vec<Artifact> = vec![
            PrimaryRecord::new(ArtifactType::WsdlDocument, "a.wsdl", "application/xml").into(),
            DerivedRecord::new(ArtifactType::Message, "m", DerivedBody::Message { parts: vec![] }).into(),
            DerivedRecord::new(ArtifactType::Part, "p", DerivedBody::Plain).into(),
        ];
        let mut tally = Tally::default();
        walk_all(&mut tally, &records);
        assert_eq!(tally.messages, 1);
        assert_eq!(tally.other, 2);
    }

    #[test]
    fn test_default_visitor_is_noop() {
        struct Nothing;
        impl ArtifactVisitor for Nothing {}

        for kind in ArtifactType::ALL {
            walk(&mut Nothing, &PrimaryRecord::new(*kind, "x", "text/plain").into());
        }
    }
}
