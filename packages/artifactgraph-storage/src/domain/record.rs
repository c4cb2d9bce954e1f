//! Record model: primary records, derived records and their typed bodies

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::artifact_type::ArtifactType;
use super::relationship::{apply_multi, apply_single, names, Relationship, RelationshipUpdate, Target};

/// Lookup criteria (property name → expected value)
pub type Criteria = BTreeMap<String, String>;

/// Criteria keys understood by every storage adapter
pub mod criteria_keys {
    pub const UUID: &str = "uuid";
    pub const NAME: &str = "name";
    pub const NCNAME: &str = "ncname";
    pub const NAMESPACE: &str = "namespace";
    pub const TARGET_NAMESPACE: &str = "targetNamespace";
    pub const EXTENDED_TYPE: &str = "extendedType";
}

// ═══════════════════════════════════════════════════════════════════════════
// Shared metadata
// ═══════════════════════════════════════════════════════════════════════════

/// Metadata common to every record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ArtifactMeta {
    pub uuid: String,
    pub artifact_type: ArtifactType,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_by: Option<String>,
    pub created_at: DateTime<Utc>,
    /// Extended type name for `ext` kinds
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub extended_type: Option<String>,
    #[serde(default)]
    pub properties: BTreeMap<String, String>,
    /// Generic (untyped) relationships
    #[serde(default)]
    pub relationships: Vec<Relationship>,
}

impl ArtifactMeta {
    /// Fresh metadata with a newly generated identifier
    pub fn new(artifact_type: ArtifactType, name: impl Into<String>) -> Self {
        Self {
            uuid: Uuid::new_v4().to_string(),
            artifact_type,
            name: name.into(),
            description: None,
            created_by: None,
            created_at: Utc::now(),
            extended_type: None,
            properties: BTreeMap::new(),
            relationships: Vec::new(),
        }
    }

    pub fn relationship(&self, relationship_type: &str) -> Option<&Relationship> {
        self.relationships
            .iter()
            .find(|r| r.relationship_type == relationship_type)
    }

    /// Adds `target` to the generic relationship, creating it when missing
    pub fn add_relationship(&mut self, relationship_type: &str, target: Target) {
        match self
            .relationships
            .iter_mut()
            .find(|r| r.relationship_type == relationship_type)
        {
            Some(rel) => rel.targets.push(target),
            None => self
                .relationships
                .push(Relationship::new(relationship_type, vec![target])),
        }
    }

    fn apply_generic(&mut self, update: &RelationshipUpdate) {
        match self
            .relationships
            .iter_mut()
            .find(|r| r.relationship_type == update.relationship)
        {
            Some(rel) => apply_multi(&mut rel.targets, &update.change),
            None => {
                let mut targets = Vec::new();
                apply_multi(&mut targets, &update.change);
                if !targets.is_empty() {
                    self.relationships
                        .push(Relationship::new(update.relationship.clone(), targets));
                }
            }
        }
    }
}

// ═══════════════════════════════════════════════════════════════════════════
// Primary record
// ═══════════════════════════════════════════════════════════════════════════

/// The artifact as uploaded
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PrimaryRecord {
    pub meta: ArtifactMeta,
    pub content_type: String,
    pub content_size: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content_encoding: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target_namespace: Option<String>,
    #[serde(default)]
    pub imported_xsds: Vec<Target>,
    #[serde(default)]
    pub included_xsds: Vec<Target>,
    #[serde(default)]
    pub redefined_xsds: Vec<Target>,
    #[serde(default)]
    pub imported_wsdls: Vec<Target>,
}

impl PrimaryRecord {
    pub fn new(artifact_type: ArtifactType, name: impl Into<String>, content_type: impl Into<String>) -> Self {
        Self {
            meta: ArtifactMeta::new(artifact_type, name),
            content_type: content_type.into(),
            content_size: 0,
            content_encoding: None,
            target_namespace: None,
            imported_xsds: Vec::new(),
            included_xsds: Vec::new(),
            redefined_xsds: Vec::new(),
            imported_wsdls: Vec::new(),
        }
    }

    pub fn uuid(&self) -> &str {
        &self.meta.uuid
    }

    pub fn artifact_type(&self) -> ArtifactType {
        self.meta.artifact_type
    }

    /// Document-level multi-valued slot by relationship name
    pub fn document_slot(&self, relationship: &str) -> Option<&Vec<Target>> {
        match relationship {
            names::IMPORTED_XSDS => Some(&self.imported_xsds),
            names::INCLUDED_XSDS => Some(&self.included_xsds),
            names::REDEFINED_XSDS => Some(&self.redefined_xsds),
            names::IMPORTED_WSDLS => Some(&self.imported_wsdls),
            _ => None,
        }
    }

    fn document_slot_mut(&mut self, relationship: &str) -> Option<&mut Vec<Target>> {
        match relationship {
            names::IMPORTED_XSDS => Some(&mut self.imported_xsds),
            names::INCLUDED_XSDS => Some(&mut self.included_xsds),
            names::REDEFINED_XSDS => Some(&mut self.redefined_xsds),
            names::IMPORTED_WSDLS => Some(&mut self.imported_wsdls),
            _ => None,
        }
    }

    pub fn apply(&mut self, update: &RelationshipUpdate) {
        match self.document_slot_mut(&update.relationship) {
            Some(slot) => apply_multi(slot, &update.change),
            None => self.meta.apply_generic(update),
        }
    }
}

// ═══════════════════════════════════════════════════════════════════════════
// Derived record
// ═══════════════════════════════════════════════════════════════════════════

/// Per-kind typed reference fields
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "shape", rename_all = "camelCase")]
pub enum DerivedBody {
    /// No typed fields (schema declarations, binding operation i/o, extended records)
    Plain,
    Message {
        #[serde(default)]
        parts: Vec<Target>,
    },
    Part {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        element: Option<Target>,
        #[serde(default, rename = "type", skip_serializing_if = "Option::is_none")]
        type_: Option<Target>,
    },
    PortType {
        #[serde(default)]
        operations: Vec<Target>,
    },
    Operation {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        input: Option<Target>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        output: Option<Target>,
        #[serde(default)]
        faults: Vec<Target>,
    },
    /// Operation input, output and fault
    OperationMessage {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        message: Option<Target>,
    },
    Binding {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        port_type: Option<Target>,
        #[serde(default)]
        binding_operations: Vec<Target>,
        #[serde(default)]
        extensions: Vec<Target>,
    },
    BindingOperation {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        operation: Option<Target>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        input: Option<Target>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        output: Option<Target>,
        #[serde(default)]
        faults: Vec<Target>,
    },
    Service {
        #[serde(default)]
        ports: Vec<Target>,
    },
    Port {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        binding: Option<Target>,
        #[serde(default)]
        extensions: Vec<Target>,
    },
    SoapAddress {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        location: Option<String>,
    },
    SoapBinding {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        style: Option<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        transport: Option<String>,
    },
}

/// Mutable view of one typed slot
enum SlotMut<'a> {
    Single(&'a mut Option<Target>),
    Multi(&'a mut Vec<Target>),
}

impl DerivedBody {
    /// Typed relationships in declaration order, with their current targets
    pub fn typed_relationships(&self) -> Vec<(&'static str, Vec<&Target>)> {
        fn one(t: &Option<Target>) -> Vec<&Target> {
            t.iter().collect()
        }
        fn many(t: &[Target]) -> Vec<&Target> {
            t.iter().collect()
        }

        match self {
            DerivedBody::Plain | DerivedBody::SoapAddress { .. } | DerivedBody::SoapBinding { .. } => {
                Vec::new()
            }
            DerivedBody::Message { parts } => vec![(names::PART, many(parts))],
            DerivedBody::Part { element, type_ } => {
                vec![(names::ELEMENT, one(element)), (names::TYPE, one(type_))]
            }
            DerivedBody::PortType { operations } => vec![(names::OPERATION, many(operations))],
            DerivedBody::Operation { input, output, faults } => vec![
                (names::INPUT, one(input)),
                (names::OUTPUT, one(output)),
                (names::FAULT, many(faults)),
            ],
            DerivedBody::OperationMessage { message } => vec![(names::MESSAGE, one(message))],
            DerivedBody::Binding {
                port_type,
                binding_operations,
                extensions,
            } => vec![
                (names::PORT_TYPE, one(port_type)),
                (names::BINDING_OPERATION, many(binding_operations)),
                (names::EXTENSION, many(extensions)),
            ],
            DerivedBody::BindingOperation {
                operation,
                input,
                output,
                faults,
            } => vec![
                (names::OPERATION, one(operation)),
                (names::INPUT, one(input)),
                (names::OUTPUT, one(output)),
                (names::FAULT, many(faults)),
            ],
            DerivedBody::Service { ports } => vec![(names::PORT, many(ports))],
            DerivedBody::Port { binding, extensions } => vec![
                (names::BINDING, one(binding)),
                (names::EXTENSION, many(extensions)),
            ],
        }
    }

    fn slot_mut(&mut self, relationship: &str) -> Option<SlotMut<'_>> {
        let slot = match (self, relationship) {
            (DerivedBody::Message { parts }, names::PART) => SlotMut::Multi(parts),
            (DerivedBody::Part { element, .. }, names::ELEMENT) => SlotMut::Single(element),
            (DerivedBody::Part { type_, .. }, names::TYPE) => SlotMut::Single(type_),
            (DerivedBody::PortType { operations }, names::OPERATION) => SlotMut::Multi(operations),
            (DerivedBody::Operation { input, .. }, names::INPUT) => SlotMut::Single(input),
            (DerivedBody::Operation { output, .. }, names::OUTPUT) => SlotMut::Single(output),
            (DerivedBody::Operation { faults, .. }, names::FAULT) => SlotMut::Multi(faults),
            (DerivedBody::OperationMessage { message }, names::MESSAGE) => SlotMut::Single(message),
            (DerivedBody::Binding { port_type, .. }, names::PORT_TYPE) => SlotMut::Single(port_type),
            (DerivedBody::Binding { binding_operations, .. }, names::BINDING_OPERATION) => {
                SlotMut::Multi(binding_operations)
            }
            (DerivedBody::Binding { extensions, .. }, names::EXTENSION) => SlotMut::Multi(extensions),
            (DerivedBody::BindingOperation { operation, .. }, names::OPERATION) => {
                SlotMut::Single(operation)
            }
            (DerivedBody::BindingOperation { input, .. }, names::INPUT) => SlotMut::Single(input),
            (DerivedBody::BindingOperation { output, .. }, names::OUTPUT) => SlotMut::Single(output),
            (DerivedBody::BindingOperation { faults, .. }, names::FAULT) => SlotMut::Multi(faults),
            (DerivedBody::Service { ports }, names::PORT) => SlotMut::Multi(ports),
            (DerivedBody::Port { binding, .. }, names::BINDING) => SlotMut::Single(binding),
            (DerivedBody::Port { extensions, .. }, names::EXTENSION) => SlotMut::Multi(extensions),
            _ => return None,
        };
        Some(slot)
    }
}

/// Record manufactured by a deriver
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DerivedRecord {
    pub meta: ArtifactMeta,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ncname: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub namespace: Option<String>,
    /// Typed back-reference (derived kinds only)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub related_document: Option<Target>,
    pub body: DerivedBody,
}

impl DerivedRecord {
    /// New record with a freshly generated identifier
    pub fn new(artifact_type: ArtifactType, name: impl Into<String>, body: DerivedBody) -> Self {
        Self {
            meta: ArtifactMeta::new(artifact_type, name),
            ncname: None,
            namespace: None,
            related_document: None,
            body,
        }
    }

    pub fn with_ncname(mut self, ncname: impl Into<String>) -> Self {
        self.ncname = Some(ncname.into());
        self
    }

    pub fn with_namespace(mut self, namespace: Option<String>) -> Self {
        self.namespace = namespace;
        self
    }

    pub fn uuid(&self) -> &str {
        &self.meta.uuid
    }

    pub fn artifact_type(&self) -> ArtifactType {
        self.meta.artifact_type
    }

    pub fn name(&self) -> &str {
        &self.meta.name
    }

    /// Target pointing at this record
    pub fn as_target(&self) -> Target {
        Target::to(self.meta.uuid.clone(), self.meta.artifact_type)
    }

    /// Back-reference to the source document, typed or generic
    pub fn related_document_uuid(&self) -> Option<&str> {
        if let Some(uuid) = self.related_document.as_ref().and_then(|t| t.uuid()) {
            return Some(uuid);
        }
        self.meta
            .relationship(names::RELATED_DOCUMENT)
            .and_then(|rel| rel.targets.iter().find_map(|t| t.uuid()))
    }

    pub fn apply(&mut self, update: &RelationshipUpdate) {
        if update.relationship == names::RELATED_DOCUMENT
            && self.meta.artifact_type.has_typed_related_document()
        {
            apply_single(&mut self.related_document, &update.change);
            return;
        }
        match self.body.slot_mut(&update.relationship) {
            Some(SlotMut::Single(slot)) => apply_single(slot, &update.change),
            Some(SlotMut::Multi(slot)) => apply_multi(slot, &update.change),
            None => self.meta.apply_generic(update),
        }
    }
}

// ═══════════════════════════════════════════════════════════════════════════
// Stored artifact
// ═══════════════════════════════════════════════════════════════════════════

/// Any record the storage engine persists
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "record", rename_all = "camelCase")]
pub enum Artifact {
    Primary(PrimaryRecord),
    Derived(DerivedRecord),
}

impl Artifact {
    pub fn meta(&self) -> &ArtifactMeta {
        match self {
            Artifact::Primary(p) => &p.meta,
            Artifact::Derived(d) => &d.meta,
        }
    }

    pub fn uuid(&self) -> &str {
        &self.meta().uuid
    }

    pub fn artifact_type(&self) -> ArtifactType {
        self.meta().artifact_type
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.meta().created_at
    }

    pub fn summary(&self) -> RecordSummary {
        let meta = self.meta();
        RecordSummary {
            uuid: meta.uuid.clone(),
            artifact_type: meta.artifact_type,
            name: meta.name.clone(),
            created_at: meta.created_at,
        }
    }

    /// Value of a criteria property on this record
    pub fn criteria_value(&self, key: &str) -> Option<&str> {
        let meta = self.meta();
        match key {
            criteria_keys::UUID => Some(meta.uuid.as_str()),
            criteria_keys::NAME => Some(meta.name.as_str()),
            criteria_keys::EXTENDED_TYPE => meta.extended_type.as_deref(),
            criteria_keys::NCNAME => match self {
                Artifact::Derived(d) => d.ncname.as_deref(),
                Artifact::Primary(_) => None,
            },
            criteria_keys::NAMESPACE => match self {
                Artifact::Derived(d) => d.namespace.as_deref(),
                Artifact::Primary(_) => None,
            },
            criteria_keys::TARGET_NAMESPACE => match self {
                Artifact::Primary(p) => p.target_namespace.as_deref(),
                Artifact::Derived(_) => None,
            },
            other => meta.properties.get(other).map(String::as_str),
        }
    }

    /// True when every criteria entry matches
    pub fn matches(&self, criteria: &Criteria) -> bool {
        criteria
            .iter()
            .all(|(key, expected)| self.criteria_value(key) == Some(expected.as_str()))
    }

    pub fn apply(&mut self, update: &RelationshipUpdate) {
        match self {
            Artifact::Primary(p) => p.apply(update),
            Artifact::Derived(d) => d.apply(update),
        }
    }
}

impl From<PrimaryRecord> for Artifact {
    fn from(record: PrimaryRecord) -> Self {
        Artifact::Primary(record)
    }
}

impl From<DerivedRecord> for Artifact {
    fn from(record: DerivedRecord) -> Self {
        Artifact::Derived(record)
    }
}

/// Lightweight lookup result
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecordSummary {
    pub uuid: String,
    pub artifact_type: ArtifactType,
    pub name: String,
    pub created_at: DateTime<Utc>,
}
