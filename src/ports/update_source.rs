//! UpdateSource port - Interface for the "updates since watermark" endpoint
//! used by the fallback poller.

use async_trait::async_trait;
use serde_json::Value as JsonValue;

use super::TransportError;
use crate::domain::foundation::{ResourceId, Timestamp};

/// Pull-style source of envelopes.
///
/// Items are returned as raw JSON so that one malformed envelope is dropped
/// by the decoder without discarding the rest of the batch. The endpoint
/// returns envelopes in ascending timestamp order; callers preserve that
/// order.
#[async_trait]
pub trait UpdateSource: Send + Sync {
    /// Fetch envelopes newer than `since` (everything recent when `None`).
    async fn fetch_since(
        &self,
        resource_id: &ResourceId,
        since: Option<Timestamp>,
    ) -> Result<Vec<JsonValue>, TransportError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[allow(dead_code)]
    fn assert_object_safe(_: &dyn UpdateSource) {}
}
