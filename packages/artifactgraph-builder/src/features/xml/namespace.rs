//! Prefix → namespace URI bindings used by path queries

use std::collections::BTreeMap;

/// Namespace URIs the built-in derivers bind
pub mod well_known {
    pub const XSD: &str = "http://www.w3.org/2001/XMLSchema";
    pub const WSDL: &str = "http://schemas.xmlsoap.org/wsdl/";
    pub const SOAP: &str = "http://schemas.xmlsoap.org/wsdl/soap/";
    pub const JEE: &str = "http://java.sun.com/xml/ns/javaee";
}

/// Static prefix table
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NamespaceBindings {
    mappings: BTreeMap<String, String>,
}

impl NamespaceBindings {
    pub fn new() -> Self {
        Self::default()
    }

    /// Bind `prefix`; a later binding for the same prefix wins
    pub fn add_mapping(&mut self, prefix: impl Into<String>, uri: impl Into<String>) -> &mut Self {
        self.mappings.insert(prefix.into(), uri.into());
        self
    }

    pub fn uri(&self, prefix: &str) -> Option<&str> {
        self.mappings.get(prefix).map(String::as_str)
    }

    pub fn prefix_for(&self, uri: &str) -> Option<&str> {
        self.mappings
            .iter()
            .find(|(_, u)| u.as_str() == uri)
            .map(|(p, _)| p.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.mappings.iter().map(|(p, u)| (p.as_str(), u.as_str()))
    }

    pub fn len(&self) -> usize {
        self.mappings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.mappings.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rebinding_replaces() {
        let mut b = NamespaceBindings::new();
        b.add_mapping("x", "urn:one").add_mapping("x", "urn:two");
        assert_eq!(b.uri("x"), Some("urn:two"));
        assert_eq!(b.len(), 1);
        assert_eq!(b.prefix_for("urn:two"), Some("x"));
    }
}
