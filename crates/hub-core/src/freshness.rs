//! Staleness of the cached configuration

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Time source, injectable for deterministic tests.
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

/// Wall-clock time.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Staleness verdict for a cached document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Freshness {
    pub is_stale: bool,
    pub remaining_seconds: i64,
}

impl Freshness {
    /// A document that was just written with the given TTL.
    pub fn fresh(ttl_seconds: i64) -> Self {
        Self {
            is_stale: false,
            remaining_seconds: ttl_seconds.max(0),
        }
    }
}

/// Derive staleness from a TTL and the document's modification time.
///
/// An absent timestamp counts as freshly written. A timestamp in the future
/// (clock skew) also counts as age zero.
pub fn compute_freshness(
    ttl_seconds: i64,
    last_modified: Option<DateTime<Utc>>,
    now: DateTime<Utc>,
) -> Freshness {
    let age = last_modified
        .map(|modified| (now - modified).num_seconds().max(0))
        .unwrap_or(0);

    Freshness {
        is_stale: age > ttl_seconds,
        remaining_seconds: ttl_seconds.saturating_sub(age).max(0),
    }
}

/// [`compute_freshness`] bound to a [`Clock`].
#[derive(Clone)]
pub struct FreshnessCalculator {
    clock: Arc<dyn Clock>,
}

impl std::fmt::Debug for FreshnessCalculator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FreshnessCalculator").finish_non_exhaustive()
    }
}

impl Default for FreshnessCalculator {
    fn default() -> Self {
        Self::new(Arc::new(SystemClock))
    }
}

impl FreshnessCalculator {
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        Self { clock }
    }

    pub fn compute(&self, ttl_seconds: i64, last_modified: Option<DateTime<Utc>>) -> Freshness {
        compute_freshness(ttl_seconds, last_modified, self.clock.now())
    }
}
