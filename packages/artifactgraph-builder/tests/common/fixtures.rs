//! Fixture loading

use std::path::PathBuf;

use artifactgraph_builder::pipeline::upload::primary_for;
use artifactgraph_builder::RawContent;
use artifactgraph_storage::PrimaryRecord;

/// Path of a file under `tests/fixtures`
pub fn fixture_path(name: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("tests")
        .join("fixtures")
        .join(name)
}

/// Raw bytes of a fixture
pub fn fixture_content(name: &str) -> RawContent {
    RawContent::from_path(fixture_path(name)).expect("fixture readable")
}

/// Fresh primary record + content for a fixture, classified from `kind_hint`
pub fn fixture_upload(name: &str, kind_hint: &str) -> (PrimaryRecord, RawContent) {
    let content = fixture_content(name);
    let primary = primary_for(&fixture_path(name), kind_hint, content.media_type());
    (primary, content)
}

/// Minimal WSDL whose single part references `element` in `namespace`
pub fn fixture_wsdl_referencing(namespace: &str, element: &str) -> String {
    format!(
        r#"<wsdl:definitions xmlns:wsdl="http://schemas.xmlsoap.org/wsdl/"
    xmlns:ext="{namespace}" targetNamespace="urn:test:referencing">
  <wsdl:message name="request"><wsdl:part name="body" element="ext:{element}"/></wsdl:message>
</wsdl:definitions>"#
    )
}

/// Minimal schema declaring one global element
pub fn fixture_schema_with_element(namespace: &str, element: &str) -> String {
    format!(
        r#"<xsd:schema xmlns:xsd="http://www.w3.org/2001/XMLSchema" targetNamespace="{namespace}">
  <xsd:element name="{element}" type="xsd:string"/>
</xsd:schema>"#
    )
}
