//! Shared value types

pub mod content;
pub mod qname;

pub use content::RawContent;
pub use qname::QName;
