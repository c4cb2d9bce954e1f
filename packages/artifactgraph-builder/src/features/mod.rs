//! Feature modules
//!
//! - classifier    - kind hint → artifact kind
//! - xml           - decoding, path queries, structural builder template
//! - derivers      - XSD, WSDL, web.xml and switchyard.xml derivation rules
//! - builder       - two-phase builder contract and lifecycle
//! - relationships - deferred criteria-based resolution
//! - batch         - single-call batch persistence
//! - registry      - builder provider lookup
//! - visitor       - kind dispatch, metadata printing

pub mod batch;
pub mod builder;
pub mod classifier;
pub mod derivers;
pub mod registry;
pub mod relationships;
pub mod visitor;
pub mod xml;
