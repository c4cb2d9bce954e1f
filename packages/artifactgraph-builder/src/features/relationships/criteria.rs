//! Criteria contributors for qualified-name and namespace lookups

use tracing::warn;

use artifactgraph_storage::{criteria_keys, ArtifactType, Criteria};

use super::source::CriteriaSource;
use crate::shared::QName;

/// Matches derived records by `ncname` and `namespace`
#[derive(Debug, Clone)]
pub struct QNameCriteria {
    qname: QName,
    log_not_found: bool,
}

impl QNameCriteria {
    pub fn new(qname: QName) -> Self {
        Self {
            qname,
            log_not_found: true,
        }
    }

    pub fn log_not_found(mut self, enabled: bool) -> Self {
        self.log_not_found = enabled;
        self
    }

    pub fn qname(&self) -> &QName {
        &self.qname
    }
}

impl CriteriaSource for QNameCriteria {
    fn add_criteria(&self, criteria: &mut Criteria) {
        criteria.insert(criteria_keys::NCNAME.to_string(), self.qname.local.clone());
        if let Some(ns) = self.qname.namespace() {
            criteria.insert(criteria_keys::NAMESPACE.to_string(), ns.to_string());
        }
    }

    fn not_found(&self, kind: ArtifactType, _criteria: &Criteria) {
        if self.log_not_found {
            warn!(qname = %self.qname, kind = %kind, "no persisted record matches reference");
        }
    }

    fn describe(&self) -> String {
        self.qname.to_string()
    }
}

/// Matches documents by `targetNamespace` and/or schema location file name
#[derive(Debug, Clone, Default)]
pub struct NamespaceCriteria {
    namespace: Option<String>,
    location: Option<String>,
    log_not_found: bool,
}

impl NamespaceCriteria {
    pub fn target_namespace(namespace: impl Into<String>) -> Self {
        let namespace: String = namespace.into();
        Self {
            namespace: (!namespace.is_empty()).then_some(namespace),
            location: None,
            log_not_found: true,
        }
    }

    /// Namespace is optional for includes of chameleon schemas
    pub fn location(location: impl Into<String>, namespace: Option<String>) -> Self {
        Self {
            namespace: namespace.filter(|ns| !ns.is_empty()),
            location: Some(location.into()),
            log_not_found: true,
        }
    }

    pub fn log_not_found(mut self, enabled: bool) -> Self {
        self.log_not_found = enabled;
        self
    }

    /// Neither a namespace nor a file name to match on
    pub fn is_unbounded(&self) -> bool {
        self.namespace.is_none() && self.file_name().is_none()
    }

    /// Last path segment of the location, matched against document names
    pub fn file_name(&self) -> Option<&str> {
        self.location
            .as_deref()
            .and_then(|loc| loc.rsplit(['/', '\\']).next())
            .filter(|name| !name.is_empty())
    }
}

impl CriteriaSource for NamespaceCriteria {
    fn add_criteria(&self, criteria: &mut Criteria) {
        if let Some(ns) = &self.namespace {
            criteria.insert(criteria_keys::TARGET_NAMESPACE.to_string(), ns.clone());
        }
        if let Some(name) = self.file_name() {
            criteria.insert(criteria_keys::NAME.to_string(), name.to_string());
        }
    }

    fn not_found(&self, kind: ArtifactType, criteria: &Criteria) {
        if self.log_not_found {
            warn!(kind = %kind, criteria = ?criteria, "no persisted document matches import");
        }
    }

    fn describe(&self) -> String {
        match (&self.namespace, self.file_name()) {
            (Some(ns), Some(name)) => format!("{} ({})", ns, name),
            (Some(ns), None) => ns.clone(),
            (None, Some(name)) => name.to_string(),
            (None, None) => "<any>".to_string(),
        }
    }
}

/// Matches extended records by `extendedType` and name
#[derive(Debug, Clone)]
pub struct ExtendedCriteria {
    extended_type: String,
    name: String,
    log_not_found: bool,
}

impl ExtendedCriteria {
    pub fn new(extended_type: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            extended_type: extended_type.into(),
            name: name.into(),
            log_not_found: true,
        }
    }

    pub fn log_not_found(mut self, enabled: bool) -> Self {
        self.log_not_found = enabled;
        self
    }
}

impl CriteriaSource for ExtendedCriteria {
    fn add_criteria(&self, criteria: &mut Criteria) {
        // A blank name alone would match every record of the extended type
        if self.name.trim().is_empty() {
            return;
        }
        criteria.insert(criteria_keys::EXTENDED_TYPE.to_string(), self.extended_type.clone());
        criteria.insert(criteria_keys::NAME.to_string(), self.name.clone());
    }

    fn not_found(&self, kind: ArtifactType, _criteria: &Criteria) {
        if self.log_not_found {
            warn!(extended_type = %self.extended_type, name = %self.name, kind = %kind, "no persisted extended record matches reference");
        }
    }

    fn describe(&self) -> String {
        format!("{}({})", self.extended_type, self.name)
    }
}
