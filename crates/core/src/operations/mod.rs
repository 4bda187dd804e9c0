//! Operation tracking for save and add-version triggers.
//!
//! Every trigger gets a correlation id, a status record and a cancellation
//! token. Status changes are broadcast so the surface can stream them.

mod cancel;
mod tracker;
mod types;

pub use cancel::{cancel_pair, CancelHandle, CancelToken};
pub use tracker::{OperationTracker, DEFAULT_HISTORY};
pub use types::{CancelOutcome, Operation, OperationEvent, OperationId, OperationStatus, Trigger};
