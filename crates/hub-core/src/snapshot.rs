//! Per-context snapshot of validated remote values

use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::feature::{Feature, decode_feature_list};
use crate::provider::{RemoteValues, keys};

pub const DEFAULT_DISPLAY_NAME: &str = "Standard User";
pub const DEFAULT_THEME_COLOR: &str = "#CCCCCC";
pub const DEFAULT_TTL_SECONDS: i64 = 86_400;

static HEX_COLOR: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^#[0-9A-Fa-f]{6}$").expect("hex color pattern is valid")
});

/// True for `#RRGGBB` strings.
pub fn is_valid_hex_color(s: &str) -> bool {
    HEX_COLOR.is_match(s)
}

/// Where a snapshot's values came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SnapshotSource {
    /// Values were fetched and validated
    Remote,
    /// The fetch failed or timed out; every field holds its default
    Fallback,
}

/// Resolved remote values for one context.
///
/// After construction through [`Snapshot::from_remote`] the theme color is
/// always a valid `#RRGGBB` string and string fields are never empty.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Snapshot {
    pub display_name: String,
    pub theme_color: String,
    pub data_limit: i64,
    pub has_priority_support: bool,
    pub kill_switch: bool,
    pub features: Vec<Feature>,
    pub meta_version: String,
    pub ttl_seconds: i64,
    pub source: SnapshotSource,
}

impl Default for Snapshot {
    fn default() -> Self {
        Self::fallback(DEFAULT_TTL_SECONDS)
    }
}

impl Snapshot {
    /// The snapshot used when a context could not be fetched: defaults,
    /// no kill-switch, no features.
    pub fn fallback(default_ttl_seconds: i64) -> Self {
        Self {
            display_name: DEFAULT_DISPLAY_NAME.to_string(),
            theme_color: DEFAULT_THEME_COLOR.to_string(),
            data_limit: 0,
            has_priority_support: false,
            kill_switch: false,
            features: Vec::new(),
            meta_version: String::new(),
            ttl_seconds: default_ttl_seconds.max(0),
            source: SnapshotSource::Fallback,
        }
    }

    /// Validate raw remote values into a snapshot. Never fails; every field
    /// degrades to its default independently.
    pub fn from_remote(values: &RemoteValues, default_ttl_seconds: i64) -> Self {
        let display_name = non_empty(values.string(keys::DISPLAY_NAME))
            .unwrap_or_else(|| DEFAULT_DISPLAY_NAME.to_string());

        let theme_color = match non_empty(values.string(keys::THEME_COLOR)) {
            Some(color) if is_valid_hex_color(&color) => color,
            Some(color) => {
                tracing::warn!(%color, "Invalid theme color; using default");
                DEFAULT_THEME_COLOR.to_string()
            }
            None => DEFAULT_THEME_COLOR.to_string(),
        };

        let features = values
            .string(keys::FEATURE_LIST)
            .map(|raw| decode_feature_list(&raw))
            .unwrap_or_default();

        Self {
            display_name,
            theme_color,
            data_limit: values.int(keys::DATA_LIMIT).unwrap_or(0),
            has_priority_support: values.bool(keys::PRIORITY_SUPPORT).unwrap_or(false),
            kill_switch: values.bool(keys::KILL_SWITCH).unwrap_or(false),
            features,
            meta_version: values.string(keys::META_VERSION).unwrap_or_default(),
            ttl_seconds: values
                .int(keys::TTL_SECONDS)
                .unwrap_or(default_ttl_seconds)
                .max(0),
            source: SnapshotSource::Remote,
        }
    }

    pub fn is_fallback(&self) -> bool {
        self.source == SnapshotSource::Fallback
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|s| !s.trim().is_empty())
}
