//! Entitlement context identifiers

use std::fmt;

use serde::{Deserialize, Serialize};

/// Opaque identifier of an entitlement context, e.g. `"acme_business"`.
///
/// One account may hold several contexts at once; each maps to its own
/// remote configuration namespace.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ContextId(String);

impl ContextId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Case-insensitive substring test against a tier marker.
    pub fn contains_marker(&self, marker: &str) -> bool {
        self.0.to_lowercase().contains(&marker.to_lowercase())
    }
}

impl AsRef<str> for ContextId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ContextId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ContextId {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

impl From<String> for ContextId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn contains_marker_ignores_case() {
        let ctx = ContextId::from("Acme_BUSINESS");
        assert!(ctx.contains_marker("_business"));
        assert!(ctx.contains_marker("_Business"));
        assert!(!ctx.contains_marker("_personal"));
    }

    #[test]
    fn serializes_as_plain_string() {
        let json = serde_json::to_string(&ContextId::from("acme_personal")).unwrap();
        assert_eq!(json, "\"acme_personal\"");
    }
}
