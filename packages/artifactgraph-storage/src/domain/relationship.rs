//! Relationship targets and phase-two relationship updates

use serde::{Deserialize, Serialize};

use super::artifact_type::ArtifactType;

/// Well-known relationship names
pub mod names {
    pub const RELATED_DOCUMENT: &str = "relatedDocument";
    pub const IMPORTED_XSDS: &str = "importedXsds";
    pub const INCLUDED_XSDS: &str = "includedXsds";
    pub const REDEFINED_XSDS: &str = "redefinedXsds";
    pub const IMPORTED_WSDLS: &str = "importedWsdls";
    pub const PART: &str = "part";
    pub const ELEMENT: &str = "element";
    pub const TYPE: &str = "type";
    pub const MESSAGE: &str = "message";
    pub const OPERATION: &str = "operation";
    pub const INPUT: &str = "input";
    pub const OUTPUT: &str = "output";
    pub const FAULT: &str = "fault";
    pub const PORT_TYPE: &str = "portType";
    pub const BINDING_OPERATION: &str = "bindingOperation";
    pub const BINDING: &str = "binding";
    pub const PORT: &str = "port";
    pub const EXTENSION: &str = "extension";
}

/// Typed target of a relationship
///
/// `value` is `None` while the target is pending.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Target {
    pub artifact_type: ArtifactType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<String>,
}

impl Target {
    /// Resolved target pointing at `uuid`
    pub fn to(uuid: impl Into<String>, artifact_type: ArtifactType) -> Self {
        Self {
            artifact_type,
            value: Some(uuid.into()),
        }
    }

    /// Placeholder awaiting phase-two resolution
    pub fn pending(artifact_type: ArtifactType) -> Self {
        Self {
            artifact_type,
            value: None,
        }
    }

    pub fn is_resolved(&self) -> bool {
        self.value.is_some()
    }

    pub fn uuid(&self) -> Option<&str> {
        self.value.as_deref()
    }
}

/// Generic named relationship
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Relationship {
    pub relationship_type: String,
    #[serde(default)]
    pub targets: Vec<Target>,
}

impl Relationship {
    pub fn new(relationship_type: impl Into<String>, targets: Vec<Target>) -> Self {
        Self {
            relationship_type: relationship_type.into(),
            targets,
        }
    }
}

/// Change applied to one relationship slot
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "op", content = "target", rename_all = "camelCase")]
pub enum SlotChange {
    /// Replace a single-valued slot
    Set(Target),
    /// Remove a pending single-valued slot
    Clear,
    /// Add to a multi-valued slot
    Append(Target),
}

/// Relationship mutation produced by the link phase
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RelationshipUpdate {
    /// Record owning the slot
    pub owner: String,
    /// Relationship (slot) name
    pub relationship: String,
    pub change: SlotChange,
}

impl RelationshipUpdate {
    pub fn set(owner: impl Into<String>, relationship: impl Into<String>, target: Target) -> Self {
        Self {
            owner: owner.into(),
            relationship: relationship.into(),
            change: SlotChange::Set(target),
        }
    }

    pub fn clear(owner: impl Into<String>, relationship: impl Into<String>) -> Self {
        Self {
            owner: owner.into(),
            relationship: relationship.into(),
            change: SlotChange::Clear,
        }
    }

    pub fn append(owner: impl Into<String>, relationship: impl Into<String>, target: Target) -> Self {
        Self {
            owner: owner.into(),
            relationship: relationship.into(),
            change: SlotChange::Append(target),
        }
    }

    /// Target carried by the change, if any
    pub fn target(&self) -> Option<&Target> {
        match &self.change {
            SlotChange::Set(t) | SlotChange::Append(t) => Some(t),
            SlotChange::Clear => None,
        }
    }
}

/// Applies `change` to a single-valued slot
pub(crate) fn apply_single(slot: &mut Option<Target>, change: &SlotChange) {
    match change {
        SlotChange::Set(t) | SlotChange::Append(t) => *slot = Some(t.clone()),
        SlotChange::Clear => *slot = None,
    }
}

/// Applies `change` to a multi-valued slot
pub(crate) fn apply_multi(slot: &mut Vec<Target>, change: &SlotChange) {
    match change {
        SlotChange::Append(t) => {
            if !slot.contains(t) {
                slot.push(t.clone());
            }
        }
        SlotChange::Set(t) => {
            slot.retain(|existing| existing.is_resolved());
            if !slot.contains(t) {
                slot.push(t.clone());
            }
        }
        SlotChange::Clear => slot.retain(|existing| existing.is_resolved()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pending_target() {
        let t = Target::pending(ArtifactType::Message);
        assert!(!t.is_resolved());
        assert_eq!(t.uuid(), None);
    }

    #[test]
    fn test_apply_single() {
        let mut slot = Some(Target::pending(ArtifactType::Binding));
        apply_single(&mut slot, &SlotChange::Set(Target::to("b-1", ArtifactType::Binding)));
        assert_eq!(slot.as_ref().and_then(|t| t.uuid()), Some("b-1"));

        apply_single(&mut slot, &SlotChange::Clear);
        assert!(slot.is_none());
    }

    #[test]
    fn test_apply_multi_is_idempotent() {
        let mut slot = Vec::new();
        let target = Target::to("x-1", ArtifactType::XsdDocument);
        apply_multi(&mut slot, &SlotChange::Append(target.clone()));
        apply_multi(&mut slot, &SlotChange::Append(target));
        assert_eq!(slot.len(), 1);
    }

    #[test]
    fn test_update_serde_shape() {
        let update = RelationshipUpdate::clear("owner-1", names::ELEMENT);
        let json = serde_json::to_value(&update).unwrap();
        assert_eq!(json["relationship"], "element");
        assert_eq!(json["change"]["op"], "clear");
    }
}
