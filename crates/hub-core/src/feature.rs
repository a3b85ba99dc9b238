//! Feature capability tags
//!
//! Remote configuration names features with string tags. Tags this build does
//! not know decode to [`Feature::Unknown`] instead of failing, so a remote
//! rollout of a new feature never breaks older clients.

use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// A capability unlocked by an entitlement context.
///
/// Ordering is the lexicographic order of the raw tag. That order is what
/// the rendering layer uses for stable tab placement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Feature {
    ViewDataUsage,
    BillingPortal,
    MultiUserManagement,
    SatelliteCoverageMap,
    NetworkStatusMonitor,
    SupportChat,
    /// Catch-all for tags not known to this build
    Unknown,
}

impl Feature {
    /// Every variant, in declaration order.
    pub const ALL: [Feature; 7] = [
        Feature::ViewDataUsage,
        Feature::BillingPortal,
        Feature::MultiUserManagement,
        Feature::SatelliteCoverageMap,
        Feature::NetworkStatusMonitor,
        Feature::SupportChat,
        Feature::Unknown,
    ];

    /// Decode a raw tag. Never fails: unrecognised tags become `Unknown`.
    pub fn from_tag(tag: &str) -> Self {
        match tag {
            "view_data_usage" => Self::ViewDataUsage,
            "billing_portal" => Self::BillingPortal,
            "multi_user_management" => Self::MultiUserManagement,
            "satellite_coverage_map" => Self::SatelliteCoverageMap,
            "network_status_monitor" => Self::NetworkStatusMonitor,
            "support_chat" => Self::SupportChat,
            _ => Self::Unknown,
        }
    }

    /// The raw tag as used by the remote contract and the cache document.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::ViewDataUsage => "view_data_usage",
            Self::BillingPortal => "billing_portal",
            Self::MultiUserManagement => "multi_user_management",
            Self::SatelliteCoverageMap => "satellite_coverage_map",
            Self::NetworkStatusMonitor => "network_status_monitor",
            Self::SupportChat => "support_chat",
            Self::Unknown => "unknown",
        }
    }

    /// Short label for tab bars.
    pub fn short_name(&self) -> &'static str {
        match self {
            Self::ViewDataUsage => "Usage",
            Self::BillingPortal => "Billing",
            Self::MultiUserManagement => "Team",
            Self::SatelliteCoverageMap => "Map",
            Self::NetworkStatusMonitor => "Status",
            Self::SupportChat => "Chat",
            Self::Unknown => "Unknown",
        }
    }
}

impl Ord for Feature {
    fn cmp(&self, other: &Self) -> Ordering {
        self.as_str().cmp(other.as_str())
    }
}

impl PartialOrd for Feature {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl FromStr for Feature {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        Ok(Self::from_tag(s))
    }
}

impl fmt::Display for Feature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for Feature {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for Feature {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let tag = String::deserialize(deserializer)?;
        Ok(Self::from_tag(&tag))
    }
}

/// Decode the remote `plan_feature_list` value.
///
/// The value is a JSON-encoded array of tags. Decoding degrades instead of
/// failing:
/// 1. a well-formed array of strings is mapped tag by tag,
/// 2. a mixed array keeps only its string elements,
/// 3. anything else yields no features.
///
/// Empty tags are dropped; unrecognised non-empty tags are kept as
/// [`Feature::Unknown`].
pub fn decode_feature_list(raw: &str) -> Vec<Feature> {
    let raw = raw.trim();
    if raw.is_empty() {
        return Vec::new();
    }

    if let Ok(tags) = serde_json::from_str::<Vec<String>>(raw) {
        return tags_to_features(tags.iter().map(String::as_str));
    }

    match serde_json::from_str::<Vec<serde_json::Value>>(raw) {
        Ok(values) => {
            tracing::debug!("Feature list contains non-string elements; keeping strings only");
            tags_to_features(values.iter().filter_map(serde_json::Value::as_str))
        }
        Err(e) => {
            tracing::warn!(error = %e, "Feature list is not a JSON array; defaulting to empty");
            Vec::new()
        }
    }
}

fn tags_to_features<'a>(tags: impl Iterator<Item = &'a str>) -> Vec<Feature> {
    tags.map(str::trim)
        .filter(|tag| !tag.is_empty())
        .map(Feature::from_tag)
        .collect()
}
