//! Builder provider registry
//!
//! Providers declare the keys (kind or extended type) they handle. For a
//! primary record every provider whose key matches contributes its builders,
//! in registration order; built-ins are registered first.

pub mod builtin;

use std::sync::Arc;

use rustc_hash::FxHashMap;
use tracing::{debug, info};

use artifactgraph_storage::{ArtifactType, PrimaryRecord};

use crate::config::BuilderConfig;
use crate::features::builder::ArtifactBuilder;

/// What a provider is registered for
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ProviderKey {
    Type(ArtifactType),
    /// User-defined type name of an extended record
    Extended(String),
}

impl ProviderKey {
    /// Keys a primary record is looked up under, most specific last
    pub fn for_primary(primary: &PrimaryRecord) -> Vec<ProviderKey> {
        let mut keys = vec![ProviderKey::Type(primary.artifact_type())];
        if let Some(extended) = &primary.meta.extended_type {
            keys.push(ProviderKey::Extended(extended.clone()));
        }
        keys
    }
}

/// Factory for the builders of one or more kinds
pub trait ArtifactBuilderProvider: Send + Sync {
    fn name(&self) -> &str;

    fn keys(&self) -> Vec<ProviderKey>;

    /// Fresh builders for one primary record
    fn create_builders(&self, primary: &PrimaryRecord, config: &BuilderConfig) -> Vec<Box<dyn ArtifactBuilder>>;
}

#[derive(Default)]
pub struct BuilderRegistry {
    providers: Vec<Arc<dyn ArtifactBuilderProvider>>,
    index: FxHashMap<ProviderKey, Vec<usize>>,
}

impl BuilderRegistry {
    /// Empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry holding the XSD, WSDL, XML/policy and web.xml providers
    pub fn with_builtins() -> Self {
        let mut registry = Self::new();
        for provider in builtin::providers() {
            registry.register(provider);
        }
        registry
    }

    pub fn from_config(config: &BuilderConfig) -> Self {
        if config.registry.builtin_providers {
            Self::with_builtins()
        } else {
            Self::new()
        }
    }

    pub fn register(&mut self, provider: Arc<dyn ArtifactBuilderProvider>) {
        let idx = self.providers.len();
        for key in provider.keys() {
            self.index.entry(key).or_default().push(idx);
        }
        info!(provider = provider.name(), "registered builder provider");
        self.providers.push(provider);
    }

    /// Builders for `primary` from every matching provider
    ///
    /// A provider registered under several matching keys contributes once.
    pub fn builders_for(&self, primary: &PrimaryRecord, config: &BuilderConfig) -> Vec<Box<dyn ArtifactBuilder>> {
        let mut matched: Vec<usize> = ProviderKey::for_primary(primary)
            .iter()
            .filter_map(|key| self.index.get(key))
            .flatten()
            .copied()
            .collect();
        matched.sort_unstable();
        matched.dedup();

        let builders: Vec<_> = matched
            .into_iter()
            .flat_map(|idx| self.providers[idx].create_builders(primary, config))
            .collect();
        debug!(
            kind = %primary.artifact_type(),
            builders = builders.len(),
            "resolved builders"
        );
        builders
    }

    pub fn providers(&self) -> impl Iterator<Item = &str> {
        self.providers.iter().map(|p| p.name())
    }

    pub fn len(&self) -> usize {
        self.providers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.providers.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::features::derivers::switchyard::SWITCHYARD_XML_DOCUMENT;
    use crate::features::derivers::web_xml::WEB_XML_DOCUMENT;

    fn primary(kind: ArtifactType) -> PrimaryRecord {
        PrimaryRecord::new(kind, "doc", "application/xml")
    }

    #[test]
    fn test_builtin_lookup() {
        let registry = BuilderRegistry::with_builtins();
        let config = BuilderConfig::default();

        let names: Vec<_> = registry
            .builders_for(&primary(ArtifactType::WsdlDocument), &config)
            .iter()
            .map(|b| b.name())
            .collect();
        assert_eq!(names, vec!["wsdl"]);

        assert_eq!(registry.builders_for(&primary(ArtifactType::PolicyDocument), &config).len(), 1);
        assert!(registry.builders_for(&primary(ArtifactType::Document), &config).is_empty());
    }

    #[test]
    fn test_extended_type_key() {
        let registry = BuilderRegistry::with_builtins();
        let mut web = primary(ArtifactType::ExtendedDocument);
        web.meta.extended_type = Some(WEB_XML_DOCUMENT.into());

        let builders = registry.builders_for(&web, &BuilderConfig::default());
        assert_eq!(builders.len(), 1);
        assert_eq!(builders[0].name(), "web-xml");

        let mut switchyard = primary(ArtifactType::ExtendedDocument);
        switchyard.meta.extended_type = Some(SWITCHYARD_XML_DOCUMENT.into());
        let builders = registry.builders_for(&switchyard, &BuilderConfig::default());
        assert_eq!(builders.len(), 1);
        assert_eq!(builders[0].name(), "switchyard");
    }

    struct Counting;

    impl ArtifactBuilderProvider for Counting {
        fn name(&self) -> &str {
            "counting"
        }
        fn keys(&self) -> Vec<ProviderKey> {
            vec![
                ProviderKey::Type(ArtifactType::XsdDocument),
                ProviderKey::Extended("Schema".into()),
            ]
        }
        fn create_builders(&self, primary: &PrimaryRecord, config: &BuilderConfig) -> Vec<Box<dyn ArtifactBuilder>> {
            builtin::XsdProvider.create_builders(primary, config)
        }
    }

    #[test]
    fn test_custom_provider_runs_after_builtins_once() {
        let mut registry = BuilderRegistry::with_builtins();
        registry.register(Arc::new(Counting));

        let mut schema = primary(ArtifactType::XsdDocument);
        schema.meta.extended_type = Some("Schema".into());
        let builders = registry.builders_for(&schema, &BuilderConfig::default());
        assert_eq!(builders.len(), 2);
        assert_eq!(registry.providers().last(), Some("counting"));
    }

    #[test]
    fn test_builtins_disabled_by_config() {
        let mut config = BuilderConfig::default();
        config.registry.builtin_providers = false;
        assert!(BuilderRegistry::from_config(&config).is_empty());
    }
}
