//! Built-in providers

use std::sync::Arc;

use artifactgraph_storage::{ArtifactType, PrimaryRecord};

use super::{ArtifactBuilderProvider, ProviderKey};
use crate::config::BuilderConfig;
use crate::features::builder::ArtifactBuilder;
use crate::features::derivers::switchyard::SWITCHYARD_XML_DOCUMENT;
use crate::features::derivers::web_xml::WEB_XML_DOCUMENT;
use crate::features::derivers::{DocumentDeriver, SwitchYardDeriver, WebXmlDeriver, WsdlDeriver, XsdDeriver};
use crate::features::xml::{XmlArtifactBuilder, XmlDeriver};

fn xml_builder<D: XmlDeriver + 'static>(deriver: D, config: &BuilderConfig) -> Vec<Box<dyn ArtifactBuilder>> {
    vec![Box::new(XmlArtifactBuilder::new(
        deriver,
        config.xml.clone(),
        config.resolution.clone(),
    ))]
}

pub fn providers() -> Vec<Arc<dyn ArtifactBuilderProvider>> {
    vec![
        Arc::new(XsdProvider),
        Arc::new(WsdlProvider),
        Arc::new(XmlDocumentProvider),
        Arc::new(WebXmlProvider),
        Arc::new(SwitchYardProvider),
    ]
}

pub struct XsdProvider;

impl ArtifactBuilderProvider for XsdProvider {
    fn name(&self) -> &str {
        "xsd"
    }

    fn keys(&self) -> Vec<ProviderKey> {
        vec![ProviderKey::Type(ArtifactType::XsdDocument)]
    }

    fn create_builders(&self, _primary: &PrimaryRecord, config: &BuilderConfig) -> Vec<Box<dyn ArtifactBuilder>> {
        xml_builder(XsdDeriver::new(), config)
    }
}

pub struct WsdlProvider;

impl ArtifactBuilderProvider for WsdlProvider {
    fn name(&self) -> &str {
        "wsdl"
    }

    fn keys(&self) -> Vec<ProviderKey> {
        vec![ProviderKey::Type(ArtifactType::WsdlDocument)]
    }

    fn create_builders(&self, _primary: &PrimaryRecord, config: &BuilderConfig) -> Vec<Box<dyn ArtifactBuilder>> {
        xml_builder(WsdlDeriver::new(), config)
    }
}

/// Plain XML and policy documents: encoding only
pub struct XmlDocumentProvider;

impl ArtifactBuilderProvider for XmlDocumentProvider {
    fn name(&self) -> &str {
        "xml"
    }

    fn keys(&self) -> Vec<ProviderKey> {
        vec![
            ProviderKey::Type(ArtifactType::XmlDocument),
            ProviderKey::Type(ArtifactType::PolicyDocument),
        ]
    }

    fn create_builders(&self, _primary: &PrimaryRecord, config: &BuilderConfig) -> Vec<Box<dyn ArtifactBuilder>> {
        xml_builder(DocumentDeriver, config)
    }
}

pub struct WebXmlProvider;

impl ArtifactBuilderProvider for WebXmlProvider {
    fn name(&self) -> &str {
        "web-xml"
    }

    fn keys(&self) -> Vec<ProviderKey> {
        vec![ProviderKey::Extended(WEB_XML_DOCUMENT.to_string())]
    }

    fn create_builders(&self, _primary: &PrimaryRecord, config: &BuilderConfig) -> Vec<Box<dyn ArtifactBuilder>> {
        xml_builder(WebXmlDeriver::new(), config)
    }
}

pub struct SwitchYardProvider;

impl ArtifactBuilderProvider for SwitchYardProvider {
    fn name(&self) -> &str {
        "switchyard"
    }

    fn keys(&self) -> Vec<ProviderKey> {
        vec![ProviderKey::Extended(SWITCHYARD_XML_DOCUMENT.to_string())]
    }

    fn create_builders(&self, _primary: &PrimaryRecord, config: &BuilderConfig) -> Vec<Box<dyn ArtifactBuilder>> {
        xml_builder(SwitchYardDeriver::new(), config)
    }
}
