//! Export/upload pipeline.
//!
//! Both triggers share export → serialize. Save-as-file stops there and
//! hands the bytes back for download; add-version posts them to the
//! content server as a new version of the node.

mod error;
mod export;
mod types;

pub use error::PipelineError;
pub use export::{ExportPipeline, PipelineSettings};
pub use types::{ActionOutcome, DownloadableFile, VersionReceipt};
