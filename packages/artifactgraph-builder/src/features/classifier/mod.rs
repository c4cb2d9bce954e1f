//! Record classifier
//!
//! Maps a caller-supplied kind hint (`WsdlDocument`, `wsdl/WsdlDocument`,
//! `ext/MyCustomType`) to a concrete [`ArtifactType`]. Extended kinds are
//! disambiguated with an in-band [`StructuralHint`]. Classification never
//! fails: anything unrecognised becomes a plain `Document`.

use artifactgraph_storage::{ArtifactModel, ArtifactType};
use tracing::trace;

/// Element name of the generic extended-document wrapper
pub const EXTENDED_DOCUMENT_WRAPPER: &str = "ExtendedDocument";

/// Evidence found in the upload envelope
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StructuralHint<'a> {
    /// Local name of the single child element present in the wrapper envelope
    pub wrapper_element: Option<&'a str>,
    /// Whether a content body was supplied inline
    pub has_inline_content: bool,
}

impl<'a> StructuralHint<'a> {
    pub fn wrapper(name: &'a str) -> Self {
        Self {
            wrapper_element: Some(name),
            has_inline_content: false,
        }
    }

    pub fn inline_content() -> Self {
        Self {
            wrapper_element: None,
            has_inline_content: true,
        }
    }

    fn looks_like_document(&self) -> bool {
        self.has_inline_content || self.wrapper_element == Some(EXTENDED_DOCUMENT_WRAPPER)
    }
}

/// Outcome of classification
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Classification {
    pub artifact_type: ArtifactType,
    /// User-defined type name for extended kinds
    pub extended_type: Option<String>,
}

impl Classification {
    fn of(artifact_type: ArtifactType) -> Self {
        Self {
            artifact_type,
            extended_type: None,
        }
    }
}

/// Classify a raw kind hint
pub fn classify(raw_kind_hint: &str, structural_hint: Option<&StructuralHint<'_>>) -> Classification {
    let hint = raw_kind_hint.trim();
    let looks_like_document = structural_hint.is_some_and(|h| h.looks_like_document());

    let (model, type_name) = match hint.split_once('/') {
        Some((model, type_name)) => (Some(model.trim()), type_name.trim()),
        None => (None, hint),
    };

    let classification = match model {
        Some(m) if m == ArtifactModel::Ext.as_str() => classify_extended(type_name, looks_like_document),
        Some(m) => ArtifactType::from_model_and_name(m, type_name)
            .map(Classification::of)
            .unwrap_or_else(|| Classification::of(ArtifactType::Document)),
        None => match ArtifactType::from_name(type_name) {
            Some(t) if t.is_extended() => classify_extended(t.as_str(), looks_like_document),
            Some(t) => Classification::of(t),
            None => Classification::of(ArtifactType::Document),
        },
    };

    trace!(hint = raw_kind_hint, kind = %classification.artifact_type, "classified upload");
    classification
}

fn classify_extended(type_name: &str, looks_like_document: bool) -> Classification {
    let generic_document = ArtifactType::ExtendedDocument.as_str();
    let generic_artifact = ArtifactType::ExtendedArtifactType.as_str();

    if type_name == generic_document {
        return Classification::of(ArtifactType::ExtendedDocument);
    }
    if type_name == generic_artifact || type_name.is_empty() {
        return Classification::of(if looks_like_document {
            ArtifactType::ExtendedDocument
        } else {
            ArtifactType::ExtendedArtifactType
        });
    }

    Classification {
        artifact_type: if looks_like_document {
            ArtifactType::ExtendedDocument
        } else {
            ArtifactType::ExtendedArtifactType
        },
        extended_type: Some(type_name.to_string()),
    }
}
