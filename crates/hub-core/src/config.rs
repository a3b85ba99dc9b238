//! Engine configuration
//!
//! Loaded from an optional TOML file; every key has a default.
//!
//! ```toml
//! [policy]
//! elevated_marker = "_business"
//! theme_failure = "use-fallback"
//!
//! [fetch]
//! deadline_ms = 10000
//!
//! [cache]
//! path = "/var/lib/confighub/remote_config_lkg.json"
//! default_ttl_seconds = 86400
//! ```

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::lkg::LKG_FILE_NAME;
use crate::policy::DEFAULT_ELEVATED_MARKER;
use crate::snapshot::DEFAULT_TTL_SECONDS;
use crate::{Error, Result};

/// Name of the per-user data directory holding the cache.
pub const APP_DIR_NAME: &str = "confighub";

/// What a failed fetch of the theme context does to the display fields.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ThemeFailurePolicy {
    /// Display the fallback snapshot's default fields
    #[default]
    UseFallback,
    /// Keep the display fields of the previously published configuration
    KeepPrevious,
    /// Treat the failure like a kill-switch and enter limited mode
    FailClosed,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PolicySection {
    pub elevated_marker: String,
    pub theme_failure: ThemeFailurePolicy,
}

impl Default for PolicySection {
    fn default() -> Self {
        Self {
            elevated_marker: DEFAULT_ELEVATED_MARKER.to_string(),
            theme_failure: ThemeFailurePolicy::default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct FetchSection {
    pub deadline_ms: u64,
}

impl Default for FetchSection {
    fn default() -> Self {
        Self { deadline_ms: 10_000 }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CacheSection {
    /// Cache document location; the platform data directory when unset
    pub path: Option<PathBuf>,
    pub default_ttl_seconds: i64,
}

impl Default for CacheSection {
    fn default() -> Self {
        Self {
            path: None,
            default_ttl_seconds: DEFAULT_TTL_SECONDS,
        }
    }
}

/// Complete engine configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct EngineConfig {
    pub policy: PolicySection,
    pub fetch: FetchSection,
    pub cache: CacheSection,
}

impl EngineConfig {
    /// Parse and validate TOML content.
    pub fn parse(content: &str) -> Result<Self> {
        let config: Self = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Load from a TOML file.
    ///
    /// # Errors
    ///
    /// `ConfigNotFound` if the file is missing; parse or validation errors
    /// otherwise.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.is_file() {
            return Err(Error::ConfigNotFound {
                path: path.to_path_buf(),
            });
        }
        tracing::debug!(path = %path.display(), "Loading engine config");
        let content = std::fs::read_to_string(path)?;
        Self::parse(&content)
    }

    /// Load from `path` when given, defaults otherwise.
    pub fn load_or_default(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(path) => Self::load(path),
            None => Ok(Self::default()),
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.policy.elevated_marker.trim().is_empty() {
            return Err(Error::InvalidConfig {
                message: "policy.elevated_marker must not be empty".into(),
            });
        }
        if self.fetch.deadline_ms == 0 {
            return Err(Error::InvalidConfig {
                message: "fetch.deadline_ms must be greater than zero".into(),
            });
        }
        if self.cache.default_ttl_seconds < 0 {
            return Err(Error::InvalidConfig {
                message: "cache.default_ttl_seconds must not be negative".into(),
            });
        }
        Ok(())
    }

    pub fn fetch_deadline(&self) -> Duration {
        Duration::from_millis(self.fetch.deadline_ms)
    }

    /// Cache document path: the configured one, or the platform default.
    pub fn cache_path(&self) -> PathBuf {
        self.cache.path.clone().unwrap_or_else(default_cache_path)
    }
}

/// `<data dir>/confighub/remote_config_lkg.json`, falling back to the
/// working directory on platforms without a data directory.
pub fn default_cache_path() -> PathBuf {
    dirs::data_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(APP_DIR_NAME)
        .join(LKG_FILE_NAME)
}
