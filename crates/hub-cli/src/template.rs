//! File-backed snapshot provider
//!
//! A template is the JSON document published to the remote-config backend:
//!
//! ```json
//! {
//!   "meta_config_version": "2026-01-01T00:00:00+00:00",
//!   "contexts": {
//!     "acme_business": { "plan_displayName": "Acme Business", "kill_switch": false }
//!   }
//! }
//! ```

use std::collections::BTreeMap;
use std::path::Path;

use async_trait::async_trait;
use hub_core::{ContextId, ProviderError, RemoteValues, SnapshotProvider};
use serde_json::Value;

use crate::error::{CliError, Result};

/// Key of the per-context table in a template.
pub const CONTEXTS_KEY: &str = "contexts";

/// Read a template file as a JSON document.
pub fn read_document(path: &Path) -> Result<Value> {
    let content = std::fs::read_to_string(path)?;
    serde_json::from_str(&content).map_err(|e| CliError::json(path, e))
}

/// [`SnapshotProvider`] answering from a template document.
///
/// Contexts absent from the template, or whose entry is not an object, are
/// reported as unavailable.
#[derive(Debug, Default, Clone)]
pub struct TemplateProvider {
    contexts: BTreeMap<String, RemoteValues>,
}

impl TemplateProvider {
    /// Load the template at `path`.
    pub fn load(path: &Path) -> Result<Self> {
        let document = read_document(path)?;
        let provider = Self::from_document(&document)?;
        tracing::debug!(
            path = %path.display(),
            contexts = provider.contexts.len(),
            "Loaded template"
        );
        Ok(provider)
    }

    pub fn from_document(document: &Value) -> Result<Self> {
        let Some(entries) = document.get(CONTEXTS_KEY).and_then(Value::as_object) else {
            return Err(CliError::user(format!(
                "Template has no \"{CONTEXTS_KEY}\" object"
            )));
        };

        let contexts = entries
            .iter()
            .filter_map(|(id, entry)| {
                let values = entry.as_object()?;
                let values: RemoteValues = values
                    .iter()
                    .map(|(k, v)| (k.clone(), v.clone()))
                    .collect();
                Some((id.clone(), values))
            })
            .collect();

        Ok(Self { contexts })
    }

    pub fn context_ids(&self) -> impl Iterator<Item = &str> {
        self.contexts.keys().map(String::as_str)
    }
}

#[async_trait]
impl SnapshotProvider for TemplateProvider {
    fn id(&self) -> &str {
        "template"
    }

    async fn fetch_and_activate(
        &self,
        context: &ContextId,
    ) -> std::result::Result<RemoteValues, ProviderError> {
        self.contexts
            .get(context.as_str())
            .cloned()
            .ok_or_else(|| ProviderError::unavailable(context.as_str(), "context not in template"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use hub_core::keys;
    use serde_json::json;

    fn provider() -> TemplateProvider {
        TemplateProvider::from_document(&json!({
            "contexts": {
                "acme_business": { "plan_displayName": "Acme", "plan_data_limit": "50" },
                "broken": 3
            }
        }))
        .unwrap()
    }

    #[test]
    fn missing_contexts_table_is_rejected() {
        let err = TemplateProvider::from_document(&json!({ "other": {} })).unwrap_err();
        assert!(matches!(err, CliError::User { .. }));
    }

    #[test]
    fn non_object_entries_are_skipped() {
        let ids: Vec<_> = provider().context_ids().map(str::to_string).collect();
        assert_eq!(ids, vec!["acme_business"]);
    }

    #[tokio::test]
    async fn known_context_returns_values() {
        let values = provider()
            .fetch_and_activate(&ContextId::from("acme_business"))
            .await
            .unwrap();
        assert_eq!(values.string(keys::DISPLAY_NAME).as_deref(), Some("Acme"));
        assert_eq!(values.int(keys::DATA_LIMIT), Some(50));
    }

    #[tokio::test]
    async fn unknown_context_is_unavailable() {
        let err = provider()
            .fetch_and_activate(&ContextId::from("nobody"))
            .await
            .unwrap_err();
        assert_eq!(err.kind(), "unavailable");
    }
}
