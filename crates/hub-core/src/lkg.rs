//! Last-known-good configuration cache
//!
//! Persists exactly one resolved configuration as a small JSON document so
//! the client has something to show offline and on cold start. The document
//! is the only on-disk contract of the engine:
//!
//! ```json
//! {
//!   "displayName": "Acme Business",
//!   "themeColor": "#0A84FF",
//!   "dataLimit": 500,
//!   "hasPrioritySupport": true,
//!   "features": ["billing_portal", "support_chat"],
//!   "meta_config_version": "v7",
//!   "meta_ttl_seconds": 3600,
//!   "limitedMode": false
//! }
//! ```
//!
//! Loading is lenient: missing or mistyped keys take their defaults, so
//! documents written by older or newer builds still load.

use std::path::{Path, PathBuf};
use std::sync::{PoisonError, RwLock};

use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::{Map, Value};

use crate::feature::Feature;
use crate::policy::union_features;
use crate::snapshot::{DEFAULT_DISPLAY_NAME, DEFAULT_THEME_COLOR, DEFAULT_TTL_SECONDS, is_valid_hex_color};
use crate::state::FinalConfig;
use crate::{Error, Result};

/// File name of the cache document inside the cache directory.
pub const LKG_FILE_NAME: &str = "remote_config_lkg.json";

/// A resolved configuration plus the metadata needed to judge it later.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LkgRecord {
    pub config: FinalConfig,
    pub meta_version: String,
    pub ttl_seconds: i64,
    pub limited_mode: bool,
}

impl Default for LkgRecord {
    fn default() -> Self {
        Self {
            config: FinalConfig::default(),
            meta_version: String::new(),
            ttl_seconds: DEFAULT_TTL_SECONDS,
            limited_mode: false,
        }
    }
}

/// Wire shape of the cache document.
#[derive(Serialize)]
struct LkgDocument<'a> {
    #[serde(rename = "displayName")]
    display_name: &'a str,
    #[serde(rename = "themeColor")]
    theme_color: &'a str,
    #[serde(rename = "dataLimit")]
    data_limit: i64,
    #[serde(rename = "hasPrioritySupport")]
    has_priority_support: bool,
    features: &'a [Feature],
    meta_config_version: &'a str,
    meta_ttl_seconds: i64,
    #[serde(rename = "limitedMode")]
    limited_mode: bool,
}

impl LkgRecord {
    /// Serialize to the pretty-printed cache document.
    pub fn to_json(&self) -> Result<String> {
        let doc = LkgDocument {
            display_name: &self.config.display_name,
            theme_color: &self.config.theme_color,
            data_limit: self.config.data_limit,
            has_priority_support: self.config.has_priority_support,
            features: &self.config.features,
            meta_config_version: &self.meta_version,
            meta_ttl_seconds: self.ttl_seconds,
            limited_mode: self.limited_mode,
        };
        Ok(serde_json::to_string_pretty(&doc)?)
    }

    /// Parse a cache document.
    ///
    /// Returns `None` unless the input is a well-formed JSON object. Within
    /// an object every key is optional and falls back to its default.
    pub fn from_json(raw: &[u8], default_ttl_seconds: i64) -> Option<Self> {
        match serde_json::from_slice::<Value>(raw) {
            Ok(Value::Object(map)) => Some(Self::from_map(&map, default_ttl_seconds)),
            Ok(_) => {
                tracing::warn!("Cache document is not a JSON object");
                None
            }
            Err(e) => {
                tracing::warn!(error = %e, "Cache document is not valid JSON");
                None
            }
        }
    }

    fn from_map(map: &Map<String, Value>, default_ttl_seconds: i64) -> Self {
        let str_field = |key: &str| {
            map.get(key)
                .and_then(Value::as_str)
                .filter(|s| !s.is_empty())
                .map(str::to_string)
        };

        let theme_color = str_field("themeColor")
            .filter(|c| is_valid_hex_color(c))
            .unwrap_or_else(|| DEFAULT_THEME_COLOR.to_string());

        let features = map
            .get("features")
            .and_then(Value::as_array)
            .map(|tags| {
                let decoded = tags
                    .iter()
                    .filter_map(Value::as_str)
                    .filter(|t| !t.is_empty())
                    .map(Feature::from_tag);
                union_features([decoded])
            })
            .unwrap_or_default();

        Self {
            config: FinalConfig {
                display_name: str_field("displayName")
                    .unwrap_or_else(|| DEFAULT_DISPLAY_NAME.to_string()),
                theme_color,
                data_limit: map.get("dataLimit").and_then(Value::as_i64).unwrap_or(0),
                has_priority_support: map
                    .get("hasPrioritySupport")
                    .and_then(Value::as_bool)
                    .unwrap_or(false),
                features,
            },
            meta_version: str_field("meta_config_version").unwrap_or_default(),
            ttl_seconds: map
                .get("meta_ttl_seconds")
                .and_then(Value::as_i64)
                .unwrap_or(default_ttl_seconds)
                .max(0),
            limited_mode: map
                .get("limitedMode")
                .and_then(Value::as_bool)
                .unwrap_or(false),
        }
    }
}

/// File-backed store for the single last-known-good document.
///
/// Reads may run concurrently with each other; saves and resets are
/// exclusive. Across processes the same guarantee comes from the advisory
/// lock taken by `hub-fs`.
#[derive(Debug)]
pub struct LkgStore {
    path: PathBuf,
    default_ttl_seconds: i64,
    guard: RwLock<()>,
}

impl LkgStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            default_ttl_seconds: DEFAULT_TTL_SECONDS,
            guard: RwLock::new(()),
        }
    }

    /// TTL assumed for documents that do not record one.
    pub fn with_default_ttl(mut self, seconds: i64) -> Self {
        self.default_ttl_seconds = seconds;
        self
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Persist a record. Returns `false` on any encoding or I/O failure.
    pub fn save(&self, record: &LkgRecord) -> bool {
        match self.try_save(record) {
            Ok(()) => {
                tracing::debug!(path = %self.path.display(), "Saved last-known-good config");
                true
            }
            Err(e) => {
                tracing::warn!(path = %self.path.display(), error = %e, "Failed to save last-known-good config");
                false
            }
        }
    }

    /// Persist a record, reporting why it failed.
    pub fn try_save(&self, record: &LkgRecord) -> Result<()> {
        let content = record.to_json()?;
        let _write = self.guard.write().unwrap_or_else(PoisonError::into_inner);
        hub_fs::write_atomic(&self.path, content.as_bytes())?;
        Ok(())
    }

    /// Load the stored record. Absence, unreadable files and corrupt
    /// documents all yield `None`.
    pub fn load(&self) -> Option<LkgRecord> {
        match self.try_load() {
            Ok(record) => record,
            Err(e) => {
                tracing::warn!(path = %self.path.display(), error = %e, "Failed to read last-known-good config");
                None
            }
        }
    }

    /// Load the stored record. I/O failures are errors; a missing or
    /// corrupt document is `Ok(None)`.
    pub fn try_load(&self) -> Result<Option<LkgRecord>> {
        let bytes = {
            let _read = self.guard.read().unwrap_or_else(PoisonError::into_inner);
            hub_fs::read_locked(&self.path)?
        };

        Ok(bytes.and_then(|raw| {
            let record = LkgRecord::from_json(&raw, self.default_ttl_seconds);
            if record.is_none() {
                tracing::warn!(path = %self.path.display(), "Ignoring corrupt last-known-good config");
            }
            record
        }))
    }

    /// Delete the stored document. Idempotent; failures are logged.
    pub fn reset(&self) {
        if let Err(e) = self.try_reset() {
            tracing::warn!(path = %self.path.display(), error = %e, "Failed to reset last-known-good config");
        }
    }

    /// Delete the stored document, returning whether one existed.
    pub fn try_reset(&self) -> Result<bool> {
        let _write = self.guard.write().unwrap_or_else(PoisonError::into_inner);
        hub_fs::remove_if_exists(&self.path).map_err(Error::from)
    }

    /// Modification time of the stored document.
    pub fn last_modified(&self) -> Option<DateTime<Utc>> {
        let _read = self.guard.read().unwrap_or_else(PoisonError::into_inner);
        match hub_fs::modified_at(&self.path) {
            Ok(modified) => modified,
            Err(e) => {
                tracing::warn!(path = %self.path.display(), error = %e, "Failed to stat last-known-good config");
                None
            }
        }
    }
}
