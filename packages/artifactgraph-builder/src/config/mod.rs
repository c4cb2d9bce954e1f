//! Builder configuration
//!
//! Loaded from YAML (`version: 1`), optionally overridden from the
//! environment, then validated.
//!
//! ```yaml
//! version: 1
//! xml:
//!   allow_dtd: true
//!   nodes_limit: 4000000
//!   default_encoding: UTF-8
//! resolution:
//!   log_not_found: true
//! registry:
//!   builtin_providers: true
//! ```

pub mod error;

pub use error::{ConfigError, ConfigResult};

use serde::{Deserialize, Serialize};
use std::path::Path;

pub const ENV_ALLOW_DTD: &str = "ARTIFACTGRAPH_XML_ALLOW_DTD";
pub const ENV_NODES_LIMIT: &str = "ARTIFACTGRAPH_XML_NODES_LIMIT";
pub const ENV_DEFAULT_ENCODING: &str = "ARTIFACTGRAPH_DEFAULT_ENCODING";
pub const ENV_LOG_NOT_FOUND: &str = "ARTIFACTGRAPH_LOG_NOT_FOUND";

const SUPPORTED_VERSIONS: &[u32] = &[1];

/// XML parsing settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields, default)]
pub struct XmlConfig {
    /// Tolerate inline DTD declarations. External subsets are never fetched.
    pub allow_dtd: bool,
    /// Upper bound on parsed nodes per document
    pub nodes_limit: u32,
    /// Encoding recorded when the prolog declares none
    pub default_encoding: String,
}

impl Default for XmlConfig {
    fn default() -> Self {
        Self {
            allow_dtd: true,
            nodes_limit: u32::MAX,
            default_encoding: "UTF-8".to_string(),
        }
    }
}

/// Deferred relationship resolution settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields, default)]
pub struct ResolutionConfig {
    /// Emit a warning for every reference that resolves to nothing
    pub log_not_found: bool,
}

impl Default for ResolutionConfig {
    fn default() -> Self {
        Self { log_not_found: true }
    }
}

/// Provider registry settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields, default)]
pub struct RegistryConfig {
    /// Register the XSD/WSDL/XML providers
    pub builtin_providers: bool,
}

impl Default for RegistryConfig {
    fn default() -> Self {
        Self {
            builtin_providers: true,
        }
    }
}

/// Top-level configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct BuilderConfig {
    pub version: u32,
    #[serde(default)]
    pub xml: XmlConfig,
    #[serde(default)]
    pub resolution: ResolutionConfig,
    #[serde(default)]
    pub registry: RegistryConfig,
}

impl Default for BuilderConfig {
    fn default() -> Self {
        Self {
            version: 1,
            xml: XmlConfig::default(),
            resolution: ResolutionConfig::default(),
            registry: RegistryConfig::default(),
        }
    }
}

impl BuilderConfig {
    /// Parse and validate a YAML document
    pub fn from_yaml_str(yaml: &str) -> ConfigResult<Self> {
        let config: BuilderConfig = serde_yaml::from_str(yaml)?;
        config.validate()?;
        Ok(config)
    }

    /// Load, validate a YAML file
    pub fn from_yaml_file(path: impl AsRef<Path>) -> ConfigResult<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_yaml_str(&content)
    }

    pub fn to_yaml(&self) -> ConfigResult<String> {
        Ok(serde_yaml::to_string(self)?)
    }

    /// Apply `ARTIFACTGRAPH_*` overrides from the process environment
    pub fn with_env_overrides(self) -> ConfigResult<Self> {
        self.with_overrides(|key| std::env::var(key).ok())
    }

    /// Apply overrides from an arbitrary lookup (env-like)
    pub fn with_overrides<F>(mut self, lookup: F) -> ConfigResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(v) = lookup(ENV_ALLOW_DTD) {
            self.xml.allow_dtd = parse_bool(ENV_ALLOW_DTD, &v)?;
        }
        if let Some(v) = lookup(ENV_NODES_LIMIT) {
            self.xml.nodes_limit = v.trim().parse().map_err(|_| ConfigError::Invalid {
                field: ENV_NODES_LIMIT.to_string(),
                value: v.clone(),
                hint: "Expected an unsigned 32-bit integer.".to_string(),
            })?;
        }
        if let Some(v) = lookup(ENV_DEFAULT_ENCODING) {
            self.xml.default_encoding = v.trim().to_string();
        }
        if let Some(v) = lookup(ENV_LOG_NOT_FOUND) {
            self.resolution.log_not_found = parse_bool(ENV_LOG_NOT_FOUND, &v)?;
        }
        self.validate()?;
        Ok(self)
    }

    pub fn validate(&self) -> ConfigResult<()> {
        if !SUPPORTED_VERSIONS.contains(&self.version) {
            return Err(ConfigError::UnsupportedVersion {
                found: self.version,
                supported: SUPPORTED_VERSIONS.to_vec(),
            });
        }
        if self.xml.nodes_limit == 0 {
            return Err(ConfigError::Invalid {
                field: "xml.nodes_limit".to_string(),
                value: "0".to_string(),
                hint: "The limit must allow at least one node.".to_string(),
            });
        }
        if self.xml.default_encoding.trim().is_empty() {
            return Err(ConfigError::Invalid {
                field: "xml.default_encoding".to_string(),
                value: String::new(),
                hint: "Use an IANA charset name such as UTF-8.".to_string(),
            });
        }
        Ok(())
    }
}

fn parse_bool(field: &str, value: &str) -> ConfigResult<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => Err(ConfigError::Invalid {
            field: field.to_string(),
            value: value.to_string(),
            hint: "Expected true/false.".to_string(),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_defaults_are_valid() {
        let config = BuilderConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.xml.default_encoding, "UTF-8");
        assert!(config.registry.builtin_providers);
    }

    #[test]
    fn test_yaml_roundtrip() {
        let yaml = BuilderConfig::default().to_yaml().unwrap();
        assert!(yaml.contains("version: 1"));
        let back = BuilderConfig::from_yaml_str(&yaml).unwrap();
        assert_eq!(back, BuilderConfig::default());
    }

    #[test]
    fn test_yaml_file_loading() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(
            file,
            "version: 1\nxml:\n  default_encoding: ISO-8859-1\nresolution:\n  log_not_found: false"
        )
        .unwrap();

        let config = BuilderConfig::from_yaml_file(file.path()).unwrap();
        assert_eq!(config.xml.default_encoding, "ISO-8859-1");
        assert!(!config.resolution.log_not_found);
        assert!(config.xml.allow_dtd);
    }

    #[test]
    fn test_unknown_field_rejected() {
        let err = BuilderConfig::from_yaml_str("version: 1\nxml:\n  fetch_dtd: true\n").unwrap_err();
        assert!(matches!(err, ConfigError::Yaml(_)));
    }

    #[test]
    fn test_unsupported_version() {
        let err = BuilderConfig::from_yaml_str("version: 7\n").unwrap_err();
        assert!(matches!(err, ConfigError::UnsupportedVersion { found: 7, .. }));
    }

    #[test]
    fn test_overrides() {
        let env: HashMap<&str, &str> = [
            (ENV_ALLOW_DTD, "false"),
            (ENV_NODES_LIMIT, "1000"),
            (ENV_LOG_NOT_FOUND, "off"),
        ]
        .into_iter()
        .collect();

        let config = BuilderConfig::default()
            .with_overrides(|k| env.get(k).map(|v| v.to_string()))
            .unwrap();
        assert!(!config.xml.allow_dtd);
        assert_eq!(config.xml.nodes_limit, 1000);
        assert!(!config.resolution.log_not_found);
    }

    #[test]
    fn test_bad_override_value() {
        let err = BuilderConfig::default()
            .with_overrides(|k| (k == ENV_NODES_LIMIT).then(|| "lots".to_string()))
            .unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { .. }));
    }
}
