//! Content server access.
//!
//! This module provides the `ContentServer` trait for the three REST calls the
//! workflow needs (login, content download, version upload), the reqwest-based
//! `OtcsClient`, and the retry policy applied by callers.

mod error;
mod otcs;
mod retry;
mod traits;
mod types;

pub use error::ContentServerError;
pub use otcs::{OtcsClient, TICKET_HEADER};
pub use retry::{retry_with_backoff, RetryPolicy};
pub use traits::ContentServer;
pub use types::{FetchedContent, NodeId, VersionUpload};
