//! Remote snapshot provider capability
//!
//! The engine does not know how configuration reaches the device. It calls a
//! [`SnapshotProvider`] per context and reads the returned [`RemoteValues`]
//! through typed, coercing accessors.

use std::collections::BTreeMap;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::context::ContextId;
use crate::error::ProviderError;

/// Remote parameter keys of the published configuration contract.
pub mod keys {
    pub const DISPLAY_NAME: &str = "plan_displayName";
    pub const THEME_COLOR: &str = "plan_themeColor";
    pub const DATA_LIMIT: &str = "plan_data_limit";
    pub const PRIORITY_SUPPORT: &str = "plan_priority_support";
    pub const KILL_SWITCH: &str = "kill_switch";
    pub const META_VERSION: &str = "meta_config_version";
    pub const TTL_SECONDS: &str = "meta_ttl_seconds";
    pub const FEATURE_LIST: &str = "plan_feature_list";

    /// Every key of the contract.
    pub const ALL: [&str; 8] = [
        DISPLAY_NAME,
        THEME_COLOR,
        DATA_LIMIT,
        PRIORITY_SUPPORT,
        KILL_SWITCH,
        META_VERSION,
        TTL_SECONDS,
        FEATURE_LIST,
    ];
}

/// Activated remote values for one context.
///
/// Values arrive loosely typed; accessors coerce them the way remote-config
/// SDKs do and return `None` when a value is absent or cannot be coerced.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RemoteValues(BTreeMap<String, Value>);

impl RemoteValues {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style insert.
    pub fn with(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.insert(key, value);
        self
    }

    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<Value>) {
        self.0.insert(key.into(), value.into());
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// String value. Numbers and booleans are rendered as text; `null` is absent.
    pub fn string(&self, key: &str) -> Option<String> {
        match self.0.get(key)? {
            Value::String(s) => Some(s.clone()),
            Value::Number(n) => Some(n.to_string()),
            Value::Bool(b) => Some(b.to_string()),
            Value::Null => None,
            // Structured values stay JSON-encoded, e.g. an inline feature array
            other => Some(other.to_string()),
        }
    }

    /// Integer value. Accepts integers, integral floats, and numeric strings.
    pub fn int(&self, key: &str) -> Option<i64> {
        match self.0.get(key)? {
            Value::Number(n) => n.as_i64().or_else(|| {
                n.as_f64()
                    .filter(|f| f.is_finite())
                    .map(|f| f.trunc() as i64)
            }),
            Value::String(s) => {
                let s = s.trim();
                s.parse::<i64>().ok().or_else(|| {
                    s.parse::<f64>()
                        .ok()
                        .filter(|f| f.is_finite())
                        .map(|f| f.trunc() as i64)
                })
            }
            Value::Bool(b) => Some(i64::from(*b)),
            _ => None,
        }
    }

    /// Boolean value. Accepts booleans, numbers (non-zero is true), and the
    /// strings `true/false`, `1/0`, `yes/no`, `on/off` in any case.
    pub fn bool(&self, key: &str) -> Option<bool> {
        match self.0.get(key)? {
            Value::Bool(b) => Some(*b),
            Value::Number(n) => n.as_f64().map(|f| f != 0.0),
            Value::String(s) => match s.trim().to_lowercase().as_str() {
                "true" | "1" | "yes" | "on" => Some(true),
                "false" | "0" | "no" | "off" | "" => Some(false),
                _ => None,
            },
            _ => None,
        }
    }
}

impl From<BTreeMap<String, Value>> for RemoteValues {
    fn from(map: BTreeMap<String, Value>) -> Self {
        Self(map)
    }
}

impl FromIterator<(String, Value)> for RemoteValues {
    fn from_iter<T: IntoIterator<Item = (String, Value)>>(iter: T) -> Self {
        Self(iter.into_iter().collect())
    }
}

/// Source of per-context remote configuration.
///
/// Implementations fetch and activate the remote namespace for a context.
/// They may fail or hang; the fetcher bounds every call with a deadline and
/// recovers from every error.
#[async_trait]
pub trait SnapshotProvider: Send + Sync {
    /// Stable identifier used in logs.
    fn id(&self) -> &str;

    async fn fetch_and_activate(
        &self,
        context: &ContextId,
    ) -> std::result::Result<RemoteValues, ProviderError>;
}
