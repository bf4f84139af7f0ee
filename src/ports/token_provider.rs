//! TokenProvider port - Access to the current bearer token.
//!
//! Token storage and refresh belong to the authentication collaborator;
//! the sync subsystem only reads the current value before each handshake
//! and poll request.

use async_trait::async_trait;
use secrecy::SecretString;

#[async_trait]
pub trait TokenProvider: Send + Sync {
    /// Current access token, or `None` when the user is signed out.
    async fn access_token(&self) -> Option<SecretString>;
}
