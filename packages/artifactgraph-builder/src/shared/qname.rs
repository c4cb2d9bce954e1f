//! Qualified names

use std::fmt;

/// Namespace-qualified name (empty namespace = none)
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct QName {
    pub namespace: String,
    pub local: String,
}

impl QName {
    pub fn new(namespace: impl Into<String>, local: impl Into<String>) -> Self {
        Self {
            namespace: namespace.into(),
            local: local.into(),
        }
    }

    /// Resolve an encoded `prefix:local` reference against the in-scope
    /// namespace declarations of `node`.
    ///
    /// Unprefixed references live in `default_namespace`. An undeclared prefix
    /// leaves the namespace empty and keeps the encoded form as the local name.
    pub fn resolve(node: roxmltree::Node<'_, '_>, encoded: &str, default_namespace: &str) -> Self {
        let encoded = encoded.trim();
        match encoded.split_once(':') {
            Some((prefix, local)) => match node.lookup_namespace_uri(Some(prefix)) {
                Some(uri) => Self::new(uri, local),
                None => Self::new("", encoded),
            },
            None => Self::new(default_namespace, encoded),
        }
    }

    /// Parse the `{namespace}local` form
    pub fn from_clark(encoded: &str) -> Option<Self> {
        let (namespace, local) = encoded.trim().strip_prefix('{')?.split_once('}')?;
        (!local.is_empty()).then(|| Self::new(namespace, local))
    }

    pub fn namespace(&self) -> Option<&str> {
        (!self.namespace.is_empty()).then_some(self.namespace.as_str())
    }
}

impl fmt::Display for QName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.namespace.is_empty() {
            f.write_str(&self.local)
        } else {
            write!(f, "{{{}}}{}", self.namespace, self.local)
        }
    }
}
