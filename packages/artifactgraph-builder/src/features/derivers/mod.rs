//! Document-specific derivers plugged into the XML builder template

pub mod switchyard;
pub mod web_xml;
pub mod wsdl;
pub mod xsd;

pub use switchyard::SwitchYardDeriver;
pub use web_xml::WebXmlDeriver;
pub use wsdl::WsdlDeriver;
pub use xsd::XsdDeriver;

use roxmltree::Node;

use crate::errors::Result;
use crate::features::xml::{DeriveContext, XmlDeriver};

/// Derives nothing; the template still records the document encoding
#[derive(Debug, Default)]
pub struct DocumentDeriver;

impl XmlDeriver for DocumentDeriver {
    fn name(&self) -> &'static str {
        "xml"
    }

    fn derive(&mut self, _root: Node<'_, '_>, _cx: &mut DeriveContext<'_>) -> Result<()> {
        Ok(())
    }
}
