//! Session credentials.

use secrecy::Secret;
use std::fmt;
use tokio::sync::RwLock;

use crate::content_server::ContentServerError;

/// Authentication ticket issued by the content server.
#[derive(Clone, PartialEq, Eq)]
pub struct Ticket(String);

impl Ticket {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for Ticket {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Ticket([REDACTED])")
    }
}

/// Login credentials for the content server.
#[derive(Debug, Clone)]
pub struct Credentials {
    pub username: String,
    pub password: Secret<String>,
}

impl Credentials {
    pub fn new(username: impl Into<String>, password: Secret<String>) -> Self {
        Self {
            username: username.into(),
            password,
        }
    }
}

/// Server URL plus the ticket of the current login.
///
/// The ticket is written once per login and read by every later request.
#[derive(Debug)]
pub struct Session {
    server_url: String,
    ticket: RwLock<Option<Ticket>>,
}

impl Session {
    pub fn new(server_url: impl Into<String>) -> Self {
        Self {
            server_url: server_url.into(),
            ticket: RwLock::new(None),
        }
    }

    pub fn server_url(&self) -> &str {
        &self.server_url
    }

    /// Current ticket, or `NotAuthenticated` before a successful login.
    pub async fn ticket(&self) -> Result<Ticket, ContentServerError> {
        self.ticket
            .read()
            .await
            .clone()
            .ok_or(ContentServerError::NotAuthenticated)
    }

    pub async fn is_authenticated(&self) -> bool {
        self.ticket.read().await.is_some()
    }

    pub(crate) async fn set_ticket(&self, ticket: Ticket) {
        *self.ticket.write().await = Some(ticket);
    }
}
