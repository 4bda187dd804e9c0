//! Session credentials and login.

mod authenticator;
mod types;

pub use authenticator::Authenticator;
pub use types::{Credentials, Session, Ticket};
