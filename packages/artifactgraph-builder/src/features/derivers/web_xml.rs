//! Java EE deployment descriptor (`web.xml`) deriver
//!
//! Produces extended records for listeners, filters, servlets and their URL
//! mappings. Mappings point at the declaration they map through a generic
//! `mapsFilter` / `mapsServlet` relationship.

use rustc_hash::FxHashMap;
use roxmltree::Node;

use artifactgraph_storage::{ArtifactType, DerivedBody, DerivedRecord, Target};

use crate::errors::Result;
use crate::features::xml::{well_known, DeriveContext, NamespaceBindings, XmlDeriver};

/// Extended type of the primary record this deriver handles
pub const WEB_XML_DOCUMENT: &str = "WebXmlDocument";

pub mod extended_types {
    pub const LISTENER: &str = "ListenerDeclaration";
    pub const FILTER: &str = "FilterDeclaration";
    pub const FILTER_MAPPING: &str = "FilterMapping";
    pub const SERVLET: &str = "ServletDeclaration";
    pub const SERVLET_MAPPING: &str = "ServletMapping";
}

pub const MAPS_FILTER: &str = "mapsFilter";
pub const MAPS_SERVLET: &str = "mapsServlet";

#[derive(Debug, Default)]
pub struct WebXmlDeriver {
    filters: FxHashMap<String, Target>,
    servlets: FxHashMap<String, Target>,
}

impl WebXmlDeriver {
    pub fn new() -> Self {
        Self::default()
    }
}

fn extended(extended_type: &str, name: &str) -> DerivedRecord {
    let mut record = DerivedRecord::new(ArtifactType::ExtendedArtifactType, name, DerivedBody::Plain);
    record.meta.extended_type = Some(extended_type.to_string());
    record
}

fn non_blank(value: String) -> Option<String> {
    let trimmed = value.trim();
    (!trimmed.is_empty()).then(|| trimmed.to_string())
}

impl XmlDeriver for WebXmlDeriver {
    fn name(&self) -> &'static str {
        "web-xml"
    }

    fn configure_namespace_mappings(&self, bindings: &mut NamespaceBindings) {
        bindings.add_mapping("jee", well_known::JEE);
    }

    fn derive(&mut self, root: Node<'_, '_>, cx: &mut DeriveContext<'_>) -> Result<()> {
        self.filters.clear();
        self.servlets.clear();

        if let Some(display_name) = non_blank(cx.string(root, "string(./jee:display-name)")?) {
            cx.primary.meta.name = display_name;
        }

        self.listeners(root, cx)?;
        self.declarations(root, cx, "./jee:filter", "filter", extended_types::FILTER)?;
        self.mappings(root, cx, "./jee:filter-mapping", "filter", extended_types::FILTER_MAPPING)?;
        self.declarations(root, cx, "./jee:servlet", "servlet", extended_types::SERVLET)?;
        self.mappings(root, cx, "./jee:servlet-mapping", "servlet", extended_types::SERVLET_MAPPING)
    }
}

impl WebXmlDeriver {
    fn listeners(&self, root: Node<'_, '_>, cx: &mut DeriveContext<'_>) -> Result<()> {
        for node in cx.nodes(root, "./jee:listener")? {
            let class = cx.string(node, "string(./jee:listener-class)")?.trim().to_string();
            let name = non_blank(cx.string(node, "string(./jee:display-name)")?).unwrap_or_else(|| class.clone());

            let mut listener = extended(extended_types::LISTENER, &name);
            listener.meta.description = non_blank(cx.string(node, "string(./jee:description)")?);
            listener.meta.properties.insert("listener-class".into(), class);
            cx.collection.add(listener);
        }
        Ok(())
    }

    /// Filters and servlets share one shape: `<kind>-name`, `<kind>-class`
    fn declarations(
        &mut self,
        root: Node<'_, '_>,
        cx: &mut DeriveContext<'_>,
        expression: &str,
        kind: &str,
        extended_type: &str,
    ) -> Result<()> {
        for node in cx.nodes(root, expression)? {
            let name = cx.string(node, &format!("string(./jee:{}-name)", kind))?.trim().to_string();
            let class = cx.string(node, &format!("string(./jee:{}-class)", kind))?.trim().to_string();
            let display_name = non_blank(cx.string(node, "string(./jee:display-name)")?).unwrap_or_else(|| class.clone());

            let mut record = extended(extended_type, &name);
            record.meta.description = non_blank(cx.string(node, "string(./jee:description)")?);
            record.meta.properties.insert("display-name".into(), display_name);
            record.meta.properties.insert(format!("{}-class", kind), class);

            let target = cx.collection.add(record);
            let index = if kind == "filter" { &mut self.filters } else { &mut self.servlets };
            index.entry(name).or_insert(target);
        }
        Ok(())
    }

    fn mappings(
        &self,
        root: Node<'_, '_>,
        cx: &mut DeriveContext<'_>,
        expression: &str,
        kind: &str,
        extended_type: &str,
    ) -> Result<()> {
        let (index, relationship) = if kind == "filter" {
            (&self.filters, MAPS_FILTER)
        } else {
            (&self.servlets, MAPS_SERVLET)
        };

        for node in cx.nodes(root, expression)? {
            let mapped = cx.string(node, &format!("string(./jee:{}-name)", kind))?.trim().to_string();
            let url_pattern = cx.string(node, "string(./jee:url-pattern)")?.trim().to_string();

            let mut record = extended(extended_type, &format!("{} Mapping", mapped));
            record.meta.description = Some(format!(
                "Maps URLs of the form '{}' to {} {}.",
                url_pattern, kind, mapped
            ));
            if let Some(target) = index.get(&mapped) {
                record.meta.add_relationship(relationship, target.clone());
            }
            record.meta.properties.insert(format!("{}-name", kind), mapped);
            record.meta.properties.insert("url-pattern".into(), url_pattern);
            cx.collection.add(record);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{ResolutionConfig, XmlConfig};
    use crate::features::builder::ArtifactBuilder;
    use crate::features::xml::XmlArtifactBuilder;
    use crate::shared::RawContent;
    use artifactgraph_storage::{names, PrimaryRecord};

    const WEB_XML: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<web-app xmlns="http://java.sun.com/xml/ns/javaee" version="3.0">
  <display-name>Orders Web</display-name>
  <listener><listener-class>com.example.Startup</listener-class></listener>
  <filter>
    <filter-name>auth</filter-name>
    <filter-class>com.example.AuthFilter</filter-class>
    <description>Checks credentials</description>
  </filter>
  <filter-mapping><filter-name>auth</filter-name><url-pattern>/api/*</url-pattern></filter-mapping>
  <servlet><servlet-name>orders</servlet-name><servlet-class>com.example.OrdersServlet</servlet-class></servlet>
  <servlet-mapping><servlet-name>orders</servlet-name><url-pattern>/api/orders</url-pattern></servlet-mapping>
  <servlet-mapping><servlet-name>ghost</servlet-name><url-pattern>/ghost</url-pattern></servlet-mapping>
</web-app>"#;

    fn derive() -> (PrimaryRecord, XmlArtifactBuilder<WebXmlDeriver>) {
        let mut primary = PrimaryRecord::new(ArtifactType::ExtendedDocument, "web.xml", "application/xml");
        primary.meta.extended_type = Some(WEB_XML_DOCUMENT.into());
        let mut builder = XmlArtifactBuilder::new(WebXmlDeriver::new(), XmlConfig::default(), ResolutionConfig::default());
        builder
            .derive_artifacts(&mut primary, &RawContent::new(WEB_XML, "application/xml"))
            .unwrap();
        (primary, builder)
    }

    #[test]
    fn test_display_name_renames_primary() {
        let (primary, _) = derive();
        assert_eq!(primary.meta.name, "Orders Web");
    }

    #[test]
    fn test_emission_order() {
        let (_, builder) = derive();
        let types: Vec<_> = builder
            .derived_artifacts()
            .iter()
            .map(|r| r.meta.extended_type.as_deref().unwrap())
            .collect();
        assert_eq!(
            types,
            vec![
                extended_types::LISTENER,
                extended_types::FILTER,
                extended_types::FILTER_MAPPING,
                extended_types::SERVLET,
                extended_types::SERVLET_MAPPING,
                extended_types::SERVLET_MAPPING,
            ]
        );
    }

    #[test]
    fn test_declarations_read_their_own_class_element() {
        let (_, builder) = derive();
        let records = builder.derived_artifacts();
        assert_eq!(records[0].name(), "com.example.Startup");
        assert_eq!(records[1].meta.properties["filter-class"], "com.example.AuthFilter");
        assert_eq!(records[1].meta.description.as_deref(), Some("Checks credentials"));
        assert_eq!(records[3].meta.properties["servlet-class"], "com.example.OrdersServlet");
    }

    #[test]
    fn test_mappings_link_declarations() {
        let (primary, builder) = derive();
        let records = builder.derived_artifacts();

        let filter_mapping = &records[2];
        assert_eq!(filter_mapping.name(), "auth Mapping");
        let maps = filter_mapping.meta.relationship(MAPS_FILTER).unwrap();
        assert_eq!(maps.targets[0].uuid(), Some(records[1].uuid()));

        // Unknown servlet: mapping kept, no relationship
        let ghost = &records[5];
        assert!(ghost.meta.relationship(MAPS_SERVLET).is_none());

        let back = ghost.meta.relationship(names::RELATED_DOCUMENT).unwrap();
        assert_eq!(back.targets[0].uuid(), Some(primary.uuid()));
    }
}
