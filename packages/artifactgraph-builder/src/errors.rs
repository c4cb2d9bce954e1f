//! Error types for artifactgraph-builder
//!
//! Provides unified error handling across the crate.

use artifactgraph_storage::StorageError;
use thiserror::Error;

use crate::config::ConfigError;

/// Main error type for derivation and linking
#[derive(Debug, Error)]
pub enum BuilderError {
    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Content could not be parsed (malformed XML, undecodable bytes)
    #[error("Parse error: {0}")]
    Parse(String),

    /// Document parsed but its structure is unusable
    #[error("Structure error: {0}")]
    Structure(String),

    /// Path expression outside the supported grammar
    #[error("Unsupported query '{expression}': {reason}")]
    UnsupportedQuery { expression: String, reason: String },

    /// Storage lookup or persist call failed
    #[error("Query execution failed: {0}")]
    Query(#[from] StorageError),

    /// A batch item was rejected by the storage engine
    #[error("Batch item {correlation_id} was not persisted: {message}")]
    Persist {
        correlation_id: String,
        message: String,
    },

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),
}

impl BuilderError {
    pub fn parse(msg: impl Into<String>) -> Self {
        BuilderError::Parse(msg.into())
    }

    pub fn structure(msg: impl Into<String>) -> Self {
        BuilderError::Structure(msg.into())
    }

    pub fn unsupported_query(expression: impl Into<String>, reason: impl Into<String>) -> Self {
        BuilderError::UnsupportedQuery {
            expression: expression.into(),
            reason: reason.into(),
        }
    }
}

impl From<roxmltree::Error> for BuilderError {
    fn from(err: roxmltree::Error) -> Self {
        BuilderError::Parse(format!("malformed XML: {}", err))
    }
}

/// Result type alias for builder operations
pub type Result<T> = std::result::Result<T, BuilderError>;
