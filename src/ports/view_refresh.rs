//! View refresh ports - how invalidation adapters reach derived views.
//!
//! `Refetch` is the synchronous trigger an invalidation adapter pulls from
//! inside bus dispatch. `ViewLoader` is the async fetch of the full derived
//! view that a trigger eventually runs.

use async_trait::async_trait;

use crate::domain::foundation::DomainError;

/// Trigger for a full refetch of one derived view.
///
/// Must be cheap and non-blocking. Triggering twice for one logical change
/// is allowed.
pub trait Refetch: Send + Sync {
    fn request_refetch(&self, reason: &str);
}

/// Loads a derived view from the server.
#[async_trait]
pub trait ViewLoader: Send + Sync + 'static {
    type View: Clone + Send + Sync + 'static;

    async fn load(&self) -> Result<Self::View, DomainError>;

    /// Loader name for logging.
    fn name(&self) -> &'static str;
}
