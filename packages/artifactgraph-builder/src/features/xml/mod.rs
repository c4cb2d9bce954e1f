//! XML structural building: decoding, path queries, the builder template

pub mod builder;
pub mod document;
pub mod namespace;
pub mod query;

pub use builder::{DeriveContext, XmlArtifactBuilder, XmlDeriver};
pub use namespace::{well_known, NamespaceBindings};
pub use query::{PathQuery, QueryValue, ReturnShape};
