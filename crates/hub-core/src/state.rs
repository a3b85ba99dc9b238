//! Published resolution state

use serde::{Deserialize, Serialize};

use crate::feature::Feature;
use crate::freshness::Freshness;
use crate::snapshot::{DEFAULT_DISPLAY_NAME, DEFAULT_THEME_COLOR, DEFAULT_TTL_SECONDS, Snapshot};

/// The displayable configuration consumed by the rendering layer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FinalConfig {
    pub display_name: String,
    pub theme_color: String,
    pub data_limit: i64,
    pub has_priority_support: bool,
    /// Sorted by the total order of [`Feature`], no duplicates
    pub features: Vec<Feature>,
}

impl Default for FinalConfig {
    /// The hard-coded safe configuration used in limited mode.
    fn default() -> Self {
        Self {
            display_name: DEFAULT_DISPLAY_NAME.to_string(),
            theme_color: DEFAULT_THEME_COLOR.to_string(),
            data_limit: 0,
            has_priority_support: false,
            features: Vec::new(),
        }
    }
}

impl FinalConfig {
    /// Display fields from `theme`, features as given.
    pub fn from_theme(theme: &Snapshot, features: Vec<Feature>) -> Self {
        Self {
            display_name: theme.display_name.clone(),
            theme_color: theme.theme_color.clone(),
            data_limit: theme.data_limit,
            has_priority_support: theme.has_priority_support,
            features,
        }
    }

    /// Keep these display fields, replace the features.
    pub fn with_features(&self, features: Vec<Feature>) -> Self {
        Self {
            features,
            ..self.clone()
        }
    }

    pub fn is_safe_default(&self) -> bool {
        *self == Self::default()
    }
}

/// Lifecycle phase of the engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EnginePhase {
    /// Constructed; state holds the cached document or built-in defaults
    ColdLoaded,
    /// A resolution is in flight
    Resolving,
    /// The most recent resolution has been published
    Resolved,
}

/// Where the published configuration came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StateOrigin {
    Defaults,
    Cache,
    Remote,
}

/// Process-wide resolution state.
///
/// Replaced as a whole on every publication; readers never observe a mix of
/// two resolutions.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResolutionState {
    pub phase: EnginePhase,
    pub origin: StateOrigin,
    pub config: FinalConfig,
    /// Tab order for the rendering layer; equal to `config.features`
    pub features: Vec<Feature>,
    pub limited_mode: bool,
    pub meta_version: String,
    /// TTL of the configuration that produced this state
    pub ttl_seconds: i64,
    pub is_stale: bool,
    pub ttl_seconds_remaining: i64,
    /// Sequence number of the resolution that produced this state; 0 before any
    pub sequence: u64,
}

impl Default for ResolutionState {
    fn default() -> Self {
        Self {
            phase: EnginePhase::ColdLoaded,
            origin: StateOrigin::Defaults,
            config: FinalConfig::default(),
            features: Vec::new(),
            limited_mode: false,
            meta_version: String::new(),
            ttl_seconds: DEFAULT_TTL_SECONDS,
            is_stale: false,
            ttl_seconds_remaining: DEFAULT_TTL_SECONDS,
            sequence: 0,
        }
    }
}

impl ResolutionState {
    pub fn freshness(&self) -> Freshness {
        Freshness {
            is_stale: self.is_stale,
            remaining_seconds: self.ttl_seconds_remaining,
        }
    }

    /// Copy of this state with a different phase.
    pub fn with_phase(&self, phase: EnginePhase) -> Self {
        Self {
            phase,
            ..self.clone()
        }
    }

    /// Copy of this state with recomputed freshness.
    pub fn with_freshness(&self, freshness: Freshness) -> Self {
        Self {
            is_stale: freshness.is_stale,
            ttl_seconds_remaining: freshness.remaining_seconds,
            ..self.clone()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_safe_default() {
        let cfg = FinalConfig::default();
        assert!(cfg.is_safe_default());
        assert_eq!(cfg.display_name, "Standard User");
        assert_eq!(cfg.theme_color, "#CCCCCC");
    }

    #[test]
    fn from_theme_copies_display_fields() {
        let mut snap = Snapshot::fallback(60);
        snap.display_name = "Acme".into();
        snap.data_limit = 9;
        let cfg = FinalConfig::from_theme(&snap, vec![Feature::SupportChat]);
        assert_eq!(cfg.display_name, "Acme");
        assert_eq!(cfg.data_limit, 9);
        assert_eq!(cfg.features, vec![Feature::SupportChat]);
        assert!(!cfg.is_safe_default());
    }

    #[test]
    fn default_state_is_fresh_with_full_ttl() {
        let state = ResolutionState::default();
        assert_eq!(state.phase, EnginePhase::ColdLoaded);
        assert_eq!(state.freshness(), Freshness::fresh(DEFAULT_TTL_SECONDS));
    }
}
