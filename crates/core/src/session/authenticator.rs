//! Content server login.

use std::sync::Arc;

use tracing::{error, info};

use crate::content_server::{ContentServer, ContentServerError};

use super::{Credentials, Session, Ticket};

/// Performs the login request and stores the ticket in the session.
pub struct Authenticator {
    server: Arc<dyn ContentServer>,
    credentials: Credentials,
}

impl Authenticator {
    pub fn new(server: Arc<dyn ContentServer>, credentials: Credentials) -> Self {
        Self {
            server,
            credentials,
        }
    }

    /// Single login attempt. On failure the session is left untouched.
    pub async fn login(&self, session: &Session) -> Result<Ticket, ContentServerError> {
        match self.server.authenticate(&self.credentials).await {
            Ok(ticket) => {
                session.set_ticket(ticket.clone()).await;
                info!(
                    server = session.server_url(),
                    username = %self.credentials.username,
                    "Authenticated against content server"
                );
                Ok(ticket)
            }
            Err(e) => {
                error!(
                    server = session.server_url(),
                    username = %self.credentials.username,
                    error = %e,
                    "Authentication failed"
                );
                Err(e)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::MockContentServer;
    use secrecy::Secret;

    fn credentials() -> Credentials {
        Credentials::new("admin", Secret::new("pw".to_string()))
    }

    #[tokio::test]
    async fn test_login_stores_returned_ticket() {
        let server = Arc::new(MockContentServer::new());
        server.set_ticket("T1").await;
        let session = Session::new(server.base_url());

        let auth = Authenticator::new(server.clone(), credentials());
        let ticket = auth.login(&session).await.unwrap();

        assert_eq!(ticket.as_str(), "T1");
        assert_eq!(session.ticket().await.unwrap().as_str(), "T1");
        assert_eq!(server.auth_count().await, 1);
        assert_eq!(server.recorded_logins().await, vec!["admin".to_string()]);
    }

    #[tokio::test]
    async fn test_login_failure_is_single_attempt() {
        let server = Arc::new(MockContentServer::new());
        server
            .set_auth_error(ContentServerError::Rejected {
                status: 403,
                message: "forbidden".into(),
            })
            .await;
        let session = Session::new(server.base_url());

        let auth = Authenticator::new(server.clone(), credentials());
        let err = auth.login(&session).await.unwrap_err();

        assert!(matches!(err, ContentServerError::Rejected { status: 403, .. }));
        assert!(!session.is_authenticated().await);
        assert_eq!(server.auth_count().await, 1);
    }
}
