//! Closed catalogue of artifact kinds
//!
//! Every record handled by the pipeline carries exactly one [`ArtifactType`].
//! The catalogue is closed: consumers match on it exhaustively, so adding a
//! kind is a compile-time change everywhere it matters.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Artifact model (the namespace a kind belongs to)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum ArtifactModel {
    #[serde(rename = "core")]
    Core,
    #[serde(rename = "xsd")]
    Xsd,
    #[serde(rename = "policy")]
    Policy,
    #[serde(rename = "soapWsdl")]
    SoapWsdl,
    #[serde(rename = "wsdl")]
    Wsdl,
    #[serde(rename = "serviceImplementation")]
    ServiceImplementation,
    #[serde(rename = "soa")]
    Soa,
    #[serde(rename = "ext")]
    Ext,
}

impl ArtifactModel {
    pub const ALL: [ArtifactModel; 8] = [
        ArtifactModel::Core,
        ArtifactModel::Xsd,
        ArtifactModel::Policy,
        ArtifactModel::SoapWsdl,
        ArtifactModel::Wsdl,
        ArtifactModel::ServiceImplementation,
        ArtifactModel::Soa,
        ArtifactModel::Ext,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ArtifactModel::Core => "core",
            ArtifactModel::Xsd => "xsd",
            ArtifactModel::Policy => "policy",
            ArtifactModel::SoapWsdl => "soapWsdl",
            ArtifactModel::Wsdl => "wsdl",
            ArtifactModel::ServiceImplementation => "serviceImplementation",
            ArtifactModel::Soa => "soa",
            ArtifactModel::Ext => "ext",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.iter().copied().find(|m| m.as_str() == name)
    }
}

impl fmt::Display for ArtifactModel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Declares the kind enum together with its catalogue table.
///
/// Each row is `Variant => (model, label, derived, document)`.
macro_rules! artifact_types {
    ($($variant:ident => ($model:ident, $label:literal, $derived:literal, $document:literal)),+ $(,)?) => {
        /// Artifact kind
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        pub enum ArtifactType {
            $($variant),+
        }

        impl ArtifactType {
            /// Every kind, in catalogue order
            pub const ALL: &'static [ArtifactType] = &[$(ArtifactType::$variant),+];

            /// Model the kind belongs to
            pub fn model(&self) -> ArtifactModel {
                match self {
                    $(ArtifactType::$variant => ArtifactModel::$model),+
                }
            }

            /// Stable type name (used on the wire and in storage)
            pub fn as_str(&self) -> &'static str {
                match self {
                    $(ArtifactType::$variant => stringify!($variant)),+
                }
            }

            /// Human readable label
            pub fn label(&self) -> &'static str {
                match self {
                    $(ArtifactType::$variant => $label),+
                }
            }

            /// Kinds that only ever come out of derivation
            pub fn is_derived(&self) -> bool {
                match self {
                    $(ArtifactType::$variant => $derived),+
                }
            }

            /// Kinds that carry raw document content
            pub fn is_document(&self) -> bool {
                match self {
                    $(ArtifactType::$variant => $document),+
                }
            }
        }
    };
}

artifact_types! {
    // core
    Document => (Core, "Document", false, true),
    XmlDocument => (Core, "XML Document", false, true),
    // xsd
    XsdDocument => (Xsd, "XML Schema", false, true),
    AttributeDeclaration => (Xsd, "XML Schema Attribute Declaration", true, false),
    ElementDeclaration => (Xsd, "XML Schema Element Declaration", true, false),
    SimpleTypeDeclaration => (Xsd, "XML Schema Simple Type Declaration", true, false),
    ComplexTypeDeclaration => (Xsd, "XML Schema Complex Type Declaration", true, false),
    XsdType => (Xsd, "XML Schema Type", true, false),
    // policy
    PolicyDocument => (Policy, "Policy", false, true),
    PolicyExpression => (Policy, "Policy Expression", true, false),
    PolicyAttachment => (Policy, "Policy Attachment", true, false),
    // soapWsdl
    SoapAddress => (SoapWsdl, "SOAP Address", true, false),
    SoapBinding => (SoapWsdl, "SOAP Binding", true, false),
    // wsdl
    WsdlDocument => (Wsdl, "WSDL", false, true),
    WsdlService => (Wsdl, "WSDL Service", true, false),
    Port => (Wsdl, "WSDL Port", true, false),
    WsdlExtension => (Wsdl, "WSDL Extension", true, false),
    Part => (Wsdl, "WSDL Part", true, false),
    Message => (Wsdl, "WSDL Message", true, false),
    Fault => (Wsdl, "WSDL Fault", true, false),
    PortType => (Wsdl, "WSDL Port Type", true, false),
    Operation => (Wsdl, "WSDL Operation", true, false),
    OperationInput => (Wsdl, "WSDL Operation Input", true, false),
    OperationOutput => (Wsdl, "WSDL Operation Output", true, false),
    Binding => (Wsdl, "WSDL Binding", true, false),
    BindingOperation => (Wsdl, "WSDL Binding Operation", true, false),
    BindingOperationInput => (Wsdl, "WSDL Binding Operation Input", true, false),
    BindingOperationOutput => (Wsdl, "WSDL Binding Operation Output", true, false),
    BindingOperationFault => (Wsdl, "WSDL Binding Operation Fault", true, false),
    // serviceImplementation
    Organization => (ServiceImplementation, "Organization", false, false),
    ServiceEndpoint => (ServiceImplementation, "Service Endpoint", false, false),
    ServiceInstance => (ServiceImplementation, "Service Instance", false, false),
    ServiceOperation => (ServiceImplementation, "Service Operation", false, false),
    // soa
    HumanActor => (Soa, "SOA Human Actor", false, false),
    Choreography => (Soa, "SOA Choreography", false, false),
    ChoreographyProcess => (Soa, "SOA Choreography Process", false, false),
    Collaboration => (Soa, "SOA Collaboration", false, false),
    CollaborationProcess => (Soa, "SOA Collaboration Process", false, false),
    Composition => (Soa, "SOA Composition", false, false),
    Effect => (Soa, "SOA Effect", false, false),
    Element => (Soa, "SOA Element", false, false),
    Event => (Soa, "SOA Event", false, false),
    InformationType => (Soa, "SOA Information Type", false, false),
    Orchestration => (Soa, "SOA Orchestration", false, false),
    OrchestrationProcess => (Soa, "SOA Orchestration Process", false, false),
    Policy => (Soa, "SOA Policy", false, false),
    PolicySubject => (Soa, "SOA Policy Subject", false, false),
    Process => (Soa, "SOA Process", false, false),
    Service => (Soa, "SOA Service", false, false),
    ServiceContract => (Soa, "SOA Service Contract", false, false),
    ServiceComposition => (Soa, "SOA Service Composition", false, false),
    ServiceInterface => (Soa, "SOA Service Interface", false, false),
    System => (Soa, "SOA System", false, false),
    Task => (Soa, "SOA Task", false, false),
    // ext
    ExtendedArtifactType => (Ext, "Extended Artifact Type", false, false),
    ExtendedDocument => (Ext, "Extended Document", false, true),
}

impl ArtifactType {
    /// Looks a kind up by its type name (case-insensitive)
    pub fn from_name(name: &str) -> Option<Self> {
        let name = name.trim();
        Self::ALL
            .iter()
            .copied()
            .find(|t| t.as_str() == name)
            .or_else(|| {
                Self::ALL
                    .iter()
                    .copied()
                    .find(|t| t.as_str().eq_ignore_ascii_case(name))
            })
    }

    /// Looks a kind up within a model
    pub fn from_model_and_name(model: &str, name: &str) -> Option<Self> {
        let model = ArtifactModel::from_name(model)?;
        Self::from_name(name).filter(|t| t.model() == model)
    }

    /// Extended kinds are open-ended and need disambiguation
    pub fn is_extended(&self) -> bool {
        self.model() == ArtifactModel::Ext
    }

    /// XmlDocument and its specializations
    pub fn is_xml_document(&self) -> bool {
        matches!(
            self,
            ArtifactType::XmlDocument
                | ArtifactType::XsdDocument
                | ArtifactType::WsdlDocument
                | ArtifactType::PolicyDocument
        )
    }

    /// Derived kinds carry a strongly typed `relatedDocument` back-reference;
    /// everything else gets a generic relationship of that name.
    pub fn has_typed_related_document(&self) -> bool {
        self.is_derived()
    }
}

impl fmt::Display for ArtifactType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
