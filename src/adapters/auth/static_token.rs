//! Token provider backed by a fixed or externally replaced secret.
//!
//! The auth collaborator owns login and refresh; it pushes the current
//! token in with [`StaticTokenProvider::replace`] and clears it on sign-out.
//!
//! # Example
//!
//! ```ignore
//! let tokens = Arc::new(StaticTokenProvider::new(config.endpoints.access_token()));
//! // after refresh
//! tokens.replace(Some(new_token));
//! ```

use std::sync::{PoisonError, RwLock};

use async_trait::async_trait;
use secrecy::SecretString;

use crate::ports::TokenProvider;

#[derive(Debug, Default)]
pub struct StaticTokenProvider {
    token: RwLock<Option<SecretString>>,
}

impl StaticTokenProvider {
    pub fn new(token: impl Into<String>) -> Self {
        Self {
            token: RwLock::new(Some(SecretString::new(token.into()))),
        }
    }

    /// Provider with no token; every request fails with `MissingToken`.
    pub fn signed_out() -> Self {
        Self::default()
    }

    /// Swap in a refreshed token, or clear it.
    pub fn replace(&self, token: Option<SecretString>) {
        *self.token.write().unwrap_or_else(PoisonError::into_inner) = token;
    }
}

#[async_trait]
impl TokenProvider for StaticTokenProvider {
    async fn access_token(&self) -> Option<SecretString> {
        self.token
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use secrecy::ExposeSecret;

    #[tokio::test]
    async fn returns_configured_token() {
        let provider = StaticTokenProvider::new("abc");
        let token = provider.access_token().await.unwrap();
        assert_eq!(token.expose_secret(), "abc");
    }

    #[tokio::test]
    async fn signed_out_has_no_token() {
        assert!(StaticTokenProvider::signed_out().access_token().await.is_none());
    }

    #[tokio::test]
    async fn replace_swaps_and_clears() {
        let provider = StaticTokenProvider::new("old");
        provider.replace(Some(SecretString::new("new".to_string())));
        assert_eq!(provider.access_token().await.unwrap().expose_secret(), "new");

        provider.replace(None);
        assert!(provider.access_token().await.is_none());
    }
}
