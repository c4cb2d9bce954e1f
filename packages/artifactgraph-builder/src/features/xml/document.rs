//! Byte decoding and hardened parsing
//!
//! Content is decoded to UTF-8 before parsing. The parser never fetches
//! external DTD subsets or entities; inline DTDs are tolerated only when the
//! configuration allows it.

use once_cell::sync::Lazy;
use regex::bytes::Regex;

use crate::config::XmlConfig;
use crate::errors::{BuilderError, Result};

static ENCODING_DECL: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"^\s*<\?xml[^>]*?\sencoding\s*=\s*["']([^"']*)["']"#)
        .expect("encoding declaration pattern is valid")
});

const UTF8_BOM: &[u8] = &[0xEF, 0xBB, 0xBF];
const UTF16_LE_BOM: &[u8] = &[0xFF, 0xFE];
const UTF16_BE_BOM: &[u8] = &[0xFE, 0xFF];

/// Encoding named in the XML prolog, if any (blank counts as absent)
pub fn declared_encoding(bytes: &[u8]) -> Option<String> {
    let bytes = bytes.strip_prefix(UTF8_BOM).unwrap_or(bytes);
    let head = &bytes[..bytes.len().min(512)];
    ENCODING_DECL
        .captures(head)
        .and_then(|c| c.get(1))
        .map(|m| String::from_utf8_lossy(m.as_bytes()).trim().to_string())
        .filter(|e| !e.is_empty())
}

/// Decode raw bytes to text
///
/// A byte-order mark wins; otherwise the prolog declaration, then `fallback`.
pub fn decode(bytes: &[u8], fallback: &str) -> Result<String> {
    if let Some(rest) = bytes.strip_prefix(UTF8_BOM) {
        return utf8(rest);
    }
    if let Some(rest) = bytes.strip_prefix(UTF16_LE_BOM) {
        return utf16(rest, u16::from_le_bytes);
    }
    if let Some(rest) = bytes.strip_prefix(UTF16_BE_BOM) {
        return utf16(rest, u16::from_be_bytes);
    }

    let encoding = declared_encoding(bytes).unwrap_or_else(|| fallback.to_string());
    match normalize(&encoding).as_str() {
        "UTF8" => utf8(bytes),
        "ISO88591" | "LATIN1" | "L1" | "USASCII" | "ASCII" => Ok(bytes.iter().map(|&b| b as char).collect()),
        other => Err(BuilderError::parse(format!("unsupported character encoding '{}'", other))),
    }
}

/// Parse options derived from configuration
pub fn parsing_options(config: &XmlConfig) -> roxmltree::ParsingOptions {
    roxmltree::ParsingOptions {
        allow_dtd: config.allow_dtd,
        nodes_limit: config.nodes_limit,
        ..roxmltree::ParsingOptions::default()
    }
}

fn normalize(encoding: &str) -> String {
    encoding
        .chars()
        .filter(|c| c.is_ascii_alphanumeric())
        .map(|c| c.to_ascii_uppercase())
        .collect()
}

fn utf8(bytes: &[u8]) -> Result<String> {
    String::from_utf8(bytes.to_vec()).map_err(|e| BuilderError::parse(format!("invalid UTF-8 content: {}", e)))
}

fn utf16(bytes: &[u8], read: fn([u8; 2]) -> u16) -> Result<String> {
    if bytes.len() % 2 != 0 {
        return Err(BuilderError::parse("truncated UTF-16 content"));
    }
    let units: Vec<u16> = bytes.chunks_exact(2).map(|c| read([c[0], c[1]])).collect();
    String::from_utf16(&units).map_err(|e| BuilderError::parse(format!("invalid UTF-16 content: {}", e)))
}
