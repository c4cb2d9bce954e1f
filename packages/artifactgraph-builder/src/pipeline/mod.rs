//! Upload orchestration

pub mod upload;

pub use upload::{UploadOutcome, UploadPipeline};
