//! Human-readable metadata dump

use std::fmt::Write;

use artifactgraph_storage::{Artifact, DerivedBody, DerivedRecord, PrimaryRecord, Target};

use super::dispatch::{walk, ArtifactVisitor};

/// Prints records section by section: base, document, XML, derived
#[derive(Debug, Default)]
pub struct MetadataPrinter {
    out: String,
}

fn target_label(target: &Target) -> String {
    match target.uuid() {
        Some(uuid) => format!("{} ({})", uuid, target.artifact_type),
        None => format!("<pending {}>", target.artifact_type),
    }
}

impl MetadataPrinter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Render one record
    pub fn render(artifact: &Artifact) -> String {
        let mut printer = Self::new();
        walk(&mut printer, artifact);
        printer.finish()
    }

    pub fn output(&self) -> &str {
        &self.out
    }

    pub fn finish(self) -> String {
        self.out
    }

    fn line(&mut self, label: &str, value: impl std::fmt::Display) {
        let _ = writeln!(self.out, "  {:<18}{}", format!("{}:", label), value);
    }

    fn base(&mut self, artifact: &Artifact) {
        let meta = artifact.meta();
        let _ = writeln!(self.out, "{} [{}]", meta.name, artifact.artifact_type().label());
        self.line("uuid", &meta.uuid);
        self.line("type", artifact.artifact_type());
        if let Some(extended) = &meta.extended_type {
            self.line("extended type", extended);
        }
        if let Some(description) = &meta.description {
            self.line("description", description);
        }
        if let Some(created_by) = &meta.created_by {
            self.line("created by", created_by);
        }
        self.line("created", meta.created_at.to_rfc3339());
        for (key, value) in &meta.properties {
            self.line(&format!("property {}", key), value);
        }
        for relationship in &meta.relationships {
            for target in &relationship.targets {
                self.line(&relationship.relationship_type, target_label(target));
            }
        }
    }

    fn document(&mut self, primary: &PrimaryRecord) {
        self.line("content type", &primary.content_type);
        self.line("content size", primary.content_size);
        if let Some(encoding) = &primary.content_encoding {
            self.line("encoding", encoding);
        }
        if let Some(ns) = &primary.target_namespace {
            self.line("target namespace", ns);
        }
    }

    fn derived(&mut self, record: &DerivedRecord) {
        if let Some(ncname) = &record.ncname {
            self.line("ncname", ncname);
        }
        if let Some(namespace) = &record.namespace {
            self.line("namespace", namespace);
        }
        if let Some(related) = &record.related_document {
            self.line("related document", target_label(related));
        }
        match &record.body {
            DerivedBody::SoapAddress { location } => {
                self.line("location", location.as_deref().unwrap_or("-"));
            }
            DerivedBody::SoapBinding { style, transport } => {
                self.line("style", style.as_deref().unwrap_or("-"));
                self.line("transport", transport.as_deref().unwrap_or("-"));
            }
            body => {
                for (name, targets) in body.typed_relationships() {
                    for target in targets {
                        self.line(name, target_label(target));
                    }
                }
            }
        }
    }
}

impl ArtifactVisitor for MetadataPrinter {
    fn visit_artifact(&mut self, artifact: &Artifact) {
        self.base(artifact);
        match artifact {
            Artifact::Primary(primary) if artifact.artifact_type().is_document() => self.document(primary),
            Artifact::Primary(_) => {}
            Artifact::Derived(record) => self.derived(record),
        }
        self.out.push('\n');
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use artifactgraph_storage::ArtifactType;

    #[test]
    fn test_document_sections() {
        let mut doc = PrimaryRecord::new(ArtifactType::XsdDocument, "orders.xsd", "application/xml");
        doc.content_encoding = Some("UTF-8".into());
        doc.target_namespace = Some("urn:orders".into());

        let text = MetadataPrinter::render(&doc.into());
        assert!(text.starts_with("orders.xsd [XML Schema]"));
        assert!(text.contains("encoding:"));
        assert!(text.contains("urn:orders"));
    }

    #[test]
    fn test_pending_targets_are_marked() {
        let part = DerivedRecord::new(
            ArtifactType::Part,
            "keyword",
            DerivedBody::Part {
                element: None,
                type_: Some(Target::pending(ArtifactType::XsdType)),
            },
        );
        let text = MetadataPrinter::render(&part.into());
        assert!(text.contains("<pending XsdType>"));
    }
}
