//! Raw uploaded content

use std::path::Path;

use crate::errors::Result;

/// Byte buffer plus declared media type and encoding
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawContent {
    bytes: Vec<u8>,
    media_type: String,
    encoding: Option<String>,
}

impl RawContent {
    pub fn new(bytes: impl Into<Vec<u8>>, media_type: impl Into<String>) -> Self {
        Self {
            bytes: bytes.into(),
            media_type: media_type.into(),
            encoding: None,
        }
    }

    /// Declared character encoding (from the transport layer)
    pub fn with_encoding(mut self, encoding: impl Into<String>) -> Self {
        self.encoding = Some(encoding.into());
        self
    }

    /// Read a file, guessing the media type from its extension
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let bytes = std::fs::read(path)?;
        Ok(Self::new(bytes, media_type_for(path)))
    }

    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn media_type(&self) -> &str {
        &self.media_type
    }

    pub fn encoding(&self) -> Option<&str> {
        self.encoding.as_deref()
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.bytes
    }
}

/// Media type by file extension
pub fn media_type_for(path: &Path) -> &'static str {
    match path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase())
        .as_deref()
    {
        Some("xml") | Some("xsd") | Some("wsdl") | Some("xsl") | Some("bpmn") => "application/xml",
        Some("json") => "application/json",
        Some("txt") => "text/plain",
        _ => "application/octet-stream",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_media_type_guess() {
        assert_eq!(media_type_for(Path::new("a/b/service.WSDL")), "application/xml");
        assert_eq!(media_type_for(Path::new("blob.bin")), "application/octet-stream");
        assert_eq!(media_type_for(Path::new("noext")), "application/octet-stream");
    }

    #[test]
    fn test_accessors() {
        let content = RawContent::new(b"<a/>".to_vec(), "application/xml").with_encoding("UTF-8");
        assert_eq!(content.len(), 4);
        assert_eq!(content.encoding(), Some("UTF-8"));
        assert!(!content.is_empty());
    }
}
