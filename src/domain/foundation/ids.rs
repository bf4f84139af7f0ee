//! Strongly-typed identifier value objects.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

use super::ValidationError;

/// Identifier of a server-side account resource observed by live updates.
///
/// Server-assigned and opaque; only checked for being usable as a URL path
/// segment.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ResourceId(String);

impl ResourceId {
    /// Creates a ResourceId, rejecting empty values and path separators.
    pub fn new(value: impl Into<String>) -> Result<Self, ValidationError> {
        let value = value.into();
        let trimmed = value.trim();
        if trimmed.is_empty() {
            return Err(ValidationError::empty_field("resource_id"));
        }
        if trimmed.contains(['/', '?', '#']) {
            return Err(ValidationError::invalid_format(
                "resource_id",
                "must not contain '/', '?' or '#'",
            ));
        }
        Ok(Self(trimmed.to_string()))
    }

    /// Returns the inner string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ResourceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for ResourceId {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

impl TryFrom<String> for ResourceId {
    type Error = ValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<ResourceId> for String {
    fn from(id: ResourceId) -> Self {
        id.0
    }
}

/// Identifier of one event bus registration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(Uuid);

impl SubscriptionId {
    /// Creates a new random SubscriptionId.
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for SubscriptionId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for SubscriptionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resource_id_trims_whitespace() {
        let id = ResourceId::new("  acc-42 ").unwrap();
        assert_eq!(id.as_str(), "acc-42");
    }

    #[test]
    fn resource_id_rejects_empty() {
        assert!(matches!(
            ResourceId::new("   "),
            Err(ValidationError::EmptyField { .. })
        ));
    }

    #[test]
    fn resource_id_rejects_path_separators() {
        assert!(ResourceId::new("acc/42").is_err());
        assert!(ResourceId::new("acc?x=1").is_err());
    }

    #[test]
    fn resource_id_deserializes_with_validation() {
        let ok: ResourceId = serde_json::from_str("\"acc-1\"").unwrap();
        assert_eq!(ok.to_string(), "acc-1");

        let bad: Result<ResourceId, _> = serde_json::from_str("\"\"");
        assert!(bad.is_err());
    }

    #[test]
    fn subscription_ids_are_unique() {
        assert_ne!(SubscriptionId::new(), SubscriptionId::new());
    }
}
