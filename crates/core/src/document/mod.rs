//! Document handles, the loaded flag, and the fetcher.

mod fetcher;
mod load_state;
mod types;

pub use fetcher::DocumentFetcher;
pub use load_state::LoadState;
pub use types::{DocumentExtension, DocumentHandle};
