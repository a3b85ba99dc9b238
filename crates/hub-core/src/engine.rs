//! ResolutionEngine implementation
//!
//! The engine owns the published [`ResolutionState`] and the last-known-good
//! store. It cold-loads the cache on construction and afterwards resolves
//! sets of contexts on demand:
//!
//! 1. pick the theme context (elevated tier wins),
//! 2. fetch every distinct context concurrently,
//! 3. union the features and OR the kill-switches,
//! 4. fall back to the safe configuration if any kill-switch is set,
//! 5. publish the new state, persist it, and emit telemetry.
//!
//! Calls may overlap. Each call takes a sequence number and only the most
//! recently issued call is allowed to publish.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use futures::future::join_all;
use serde_json::json;
use tokio::runtime::{Handle, RuntimeFlavor};
use tokio::sync::watch;

use crate::config::{EngineConfig, ThemeFailurePolicy};
use crate::context::ContextId;
use crate::fetcher::{DEFAULT_FETCH_DEADLINE, SnapshotFetcher};
use crate::freshness::{Clock, Freshness, FreshnessCalculator, SystemClock};
use crate::lkg::{LkgRecord, LkgStore};
use crate::policy::{ContextPolicy, union_features};
use crate::provider::SnapshotProvider;
use crate::snapshot::{DEFAULT_TTL_SECONDS, Snapshot};
use crate::state::{EnginePhase, FinalConfig, ResolutionState, StateOrigin};
use crate::telemetry::{TelemetrySink, TracingTelemetry, events, params};

/// Result of a [`ResolutionEngine::resolve`] call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResolveOutcome {
    /// This call's result is now the published state
    Published(Arc<ResolutionState>),
    /// A newer call was issued before this one completed; nothing published
    Superseded,
    /// The request named no contexts; state unchanged
    Ignored,
}

impl ResolveOutcome {
    pub fn published(&self) -> Option<&Arc<ResolutionState>> {
        match self {
            Self::Published(state) => Some(state),
            _ => None,
        }
    }
}

/// Builder for [`ResolutionEngine`].
pub struct EngineBuilder {
    provider: Arc<dyn SnapshotProvider>,
    store: Arc<LkgStore>,
    telemetry: Arc<dyn TelemetrySink>,
    clock: Arc<dyn Clock>,
    policy: ContextPolicy,
    theme_failure: ThemeFailurePolicy,
    deadline: Duration,
    default_ttl_seconds: i64,
}

impl EngineBuilder {
    pub fn new(provider: Arc<dyn SnapshotProvider>, store: Arc<LkgStore>) -> Self {
        Self {
            provider,
            store,
            telemetry: Arc::new(TracingTelemetry),
            clock: Arc::new(SystemClock),
            policy: ContextPolicy::default(),
            theme_failure: ThemeFailurePolicy::default(),
            deadline: DEFAULT_FETCH_DEADLINE,
            default_ttl_seconds: DEFAULT_TTL_SECONDS,
        }
    }

    /// Apply policy, fetch and TTL settings from an [`EngineConfig`].
    ///
    /// The cache location is not taken from the config; it belongs to the
    /// store handed to [`EngineBuilder::new`].
    pub fn with_config(mut self, config: &EngineConfig) -> Self {
        self.policy = ContextPolicy::new(config.policy.elevated_marker.clone());
        self.theme_failure = config.policy.theme_failure;
        self.deadline = config.fetch_deadline();
        self.default_ttl_seconds = config.cache.default_ttl_seconds;
        self
    }

    pub fn with_telemetry(mut self, telemetry: Arc<dyn TelemetrySink>) -> Self {
        self.telemetry = telemetry;
        self
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn with_policy(mut self, policy: ContextPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn with_theme_failure(mut self, theme_failure: ThemeFailurePolicy) -> Self {
        self.theme_failure = theme_failure;
        self
    }

    pub fn with_deadline(mut self, deadline: Duration) -> Self {
        self.deadline = deadline;
        self
    }

    pub fn with_default_ttl(mut self, seconds: i64) -> Self {
        self.default_ttl_seconds = seconds;
        self
    }

    /// Construct the engine and cold-load the cached configuration.
    pub fn build(self) -> ResolutionEngine {
        let fetcher = SnapshotFetcher::new(self.provider, Arc::clone(&self.telemetry))
            .with_deadline(self.deadline)
            .with_default_ttl(self.default_ttl_seconds);
        let freshness = FreshnessCalculator::new(self.clock);

        let initial = cold_load(&self.store, &freshness, self.default_ttl_seconds);
        let (state, _) = watch::channel(Arc::new(initial));

        ResolutionEngine {
            policy: self.policy,
            theme_failure: self.theme_failure,
            fetcher,
            store: self.store,
            telemetry: self.telemetry,
            freshness,
            state,
            issued: AtomicU64::new(0),
            publish: Mutex::new(()),
        }
    }
}

/// Build the initial state from the cache, or from defaults when there is
/// no usable cache.
fn cold_load(
    store: &LkgStore,
    freshness: &FreshnessCalculator,
    default_ttl_seconds: i64,
) -> ResolutionState {
    match store.load() {
        Some(record) => {
            let fresh = freshness.compute(record.ttl_seconds, store.last_modified());
            tracing::info!(
                path = %store.path().display(),
                meta_version = %record.meta_version,
                is_stale = fresh.is_stale,
                remaining_seconds = fresh.remaining_seconds,
                "Loaded cached config at start"
            );
            ResolutionState {
                phase: EnginePhase::ColdLoaded,
                origin: StateOrigin::Cache,
                features: record.config.features.clone(),
                config: record.config,
                limited_mode: record.limited_mode,
                meta_version: record.meta_version,
                ttl_seconds: record.ttl_seconds,
                is_stale: fresh.is_stale,
                ttl_seconds_remaining: fresh.remaining_seconds,
                sequence: 0,
            }
        }
        None => {
            tracing::info!(path = %store.path().display(), "No cache yet; using defaults");
            let ttl = default_ttl_seconds.max(0);
            ResolutionState {
                ttl_seconds: ttl,
                ttl_seconds_remaining: ttl,
                ..ResolutionState::default()
            }
        }
    }
}

/// Orchestrates fetching, reconciliation, publication and persistence.
///
/// The engine is the only writer of both the published state and the cache
/// document. Share it behind an `Arc` to resolve from several tasks.
pub struct ResolutionEngine {
    policy: ContextPolicy,
    theme_failure: ThemeFailurePolicy,
    fetcher: SnapshotFetcher,
    store: Arc<LkgStore>,
    telemetry: Arc<dyn TelemetrySink>,
    freshness: FreshnessCalculator,
    state: watch::Sender<Arc<ResolutionState>>,
    /// Sequence number of the most recently issued resolve call
    issued: AtomicU64,
    /// Serializes publication, persistence and freshness refreshes
    publish: Mutex<()>,
}

impl std::fmt::Debug for ResolutionEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ResolutionEngine")
            .field("policy", &self.policy)
            .field("theme_failure", &self.theme_failure)
            .field("fetcher", &self.fetcher)
            .field("store", &self.store.path())
            .field("issued", &self.issued.load(Ordering::SeqCst))
            .finish_non_exhaustive()
    }
}

impl ResolutionEngine {
    pub fn builder(provider: Arc<dyn SnapshotProvider>, store: Arc<LkgStore>) -> EngineBuilder {
        EngineBuilder::new(provider, store)
    }

    /// Engine wired from a configuration file's settings, caching at the
    /// configured path.
    pub fn from_config(
        config: &EngineConfig,
        provider: Arc<dyn SnapshotProvider>,
        telemetry: Arc<dyn TelemetrySink>,
    ) -> Self {
        let store = LkgStore::new(config.cache_path()).with_default_ttl(config.cache.default_ttl_seconds);
        EngineBuilder::new(provider, Arc::new(store))
            .with_config(config)
            .with_telemetry(telemetry)
            .build()
    }

    /// Snapshot of the published state.
    pub fn current_state(&self) -> Arc<ResolutionState> {
        self.state.borrow().clone()
    }

    /// Receiver notified on every publication.
    pub fn subscribe(&self) -> watch::Receiver<Arc<ResolutionState>> {
        self.state.subscribe()
    }

    pub fn policy(&self) -> &ContextPolicy {
        &self.policy
    }

    pub fn store(&self) -> &LkgStore {
        &self.store
    }

    /// Resolve the effective configuration for `contexts`.
    ///
    /// Never fails: unreachable contexts degrade to fallback snapshots and
    /// persistence failures are logged. The result is published to
    /// subscribers; the returned outcome says whether this call's result is
    /// the one that was published.
    pub async fn resolve(&self, contexts: &[ContextId]) -> ResolveOutcome {
        let Some(theme_context) = self.policy.pick_theme_context(contexts).cloned() else {
            tracing::debug!("Ignoring resolve request with no contexts");
            return ResolveOutcome::Ignored;
        };

        let sequence = self.begin_resolution();
        tracing::debug!(sequence, theme = %theme_context, count = contexts.len(), "Resolving contexts");

        let unique = distinct(contexts);
        let snapshots = join_all(unique.iter().map(|ctx| self.fetcher.fetch_snapshot(ctx))).await;

        let theme = unique
            .iter()
            .position(|ctx| *ctx == theme_context)
            .and_then(|idx| snapshots.get(idx))
            .cloned()
            .unwrap_or_else(|| Snapshot::fallback(DEFAULT_TTL_SECONDS));

        let features = union_features(snapshots.iter().map(|s| s.features.iter().copied()));
        let any_kill_switch = snapshots.iter().any(|s| s.kill_switch);
        let theme_failed = theme.is_fallback();
        let limited_mode = any_kill_switch
            || theme.kill_switch
            || (theme_failed && self.theme_failure == ThemeFailurePolicy::FailClosed);

        let _guard = self.publish.lock().unwrap_or_else(PoisonError::into_inner);
        if sequence != self.issued.load(Ordering::SeqCst) {
            tracing::debug!(sequence, "Discarding superseded resolution");
            return ResolveOutcome::Superseded;
        }

        let previous = self.current_state();
        let keep_previous = theme_failed && self.theme_failure == ThemeFailurePolicy::KeepPrevious;

        let config = if limited_mode {
            FinalConfig::default()
        } else if keep_previous {
            tracing::debug!(theme = %theme_context, "Theme fetch failed; keeping previous display fields");
            previous.config.with_features(features)
        } else {
            FinalConfig::from_theme(&theme, features)
        };
        let meta_version = if keep_previous && !limited_mode {
            previous.meta_version.clone()
        } else {
            theme.meta_version.clone()
        };

        let state = Arc::new(ResolutionState {
            phase: EnginePhase::Resolved,
            origin: StateOrigin::Remote,
            features: config.features.clone(),
            config,
            limited_mode,
            meta_version,
            ttl_seconds: theme.ttl_seconds,
            is_stale: false,
            ttl_seconds_remaining: theme.ttl_seconds,
            sequence,
        });
        self.state.send_replace(Arc::clone(&state));

        let record = LkgRecord {
            config: state.config.clone(),
            meta_version: state.meta_version.clone(),
            ttl_seconds: state.ttl_seconds,
            limited_mode,
        };
        let saved = blocking_io(|| self.store.save(&record));
        drop(_guard);

        tracing::info!(
            sequence,
            theme = %theme_context,
            limited_mode,
            features = state.features.len(),
            saved,
            "Published resolved config"
        );

        self.telemetry.log_event(
            events::ACTIVATION_SUCCESS,
            params([
                ("value", json!(1)),
                ("meta_version", json!(state.meta_version)),
            ]),
        );
        if limited_mode {
            tracing::warn!(sequence, "Kill-switch active; running in limited mode");
            self.telemetry
                .log_event(events::KILL_SWITCH_ACTIVE, params([("value", json!(1))]));
        }

        ResolveOutcome::Published(state)
    }

    /// Recompute staleness from the cache timestamp and the published TTL,
    /// and publish the result.
    pub fn refresh_freshness(&self) -> Freshness {
        let _guard = self.publish.lock().unwrap_or_else(PoisonError::into_inner);
        let current = self.current_state();
        let fresh = self
            .freshness
            .compute(current.ttl_seconds, self.store.last_modified());
        if fresh != current.freshness() {
            self.state
                .send_replace(Arc::new(current.with_freshness(fresh)));
        }
        fresh
    }

    /// Erase the cache document. Published state is left untouched.
    ///
    /// Returns whether a document was removed.
    pub fn reset_cache(&self) -> bool {
        let _guard = self.publish.lock().unwrap_or_else(PoisonError::into_inner);
        match self.store.try_reset() {
            Ok(removed) => {
                tracing::info!(removed, path = %self.store.path().display(), "Reset cached config");
                removed
            }
            Err(e) => {
                tracing::warn!(error = %e, "Failed to reset cached config");
                false
            }
        }
    }

    /// Issue a sequence number and publish the `Resolving` phase.
    ///
    /// Both happen under the publish lock, so a call can only mark the state
    /// as resolving before any newer call publishes its result.
    fn begin_resolution(&self) -> u64 {
        let _guard = self.publish.lock().unwrap_or_else(PoisonError::into_inner);
        let sequence = self.issued.fetch_add(1, Ordering::SeqCst) + 1;
        let current = self.current_state();
        if current.phase != EnginePhase::Resolving {
            self.state
                .send_replace(Arc::new(current.with_phase(EnginePhase::Resolving)));
        }
        sequence
    }
}

/// Run blocking file I/O from async code.
///
/// On a multi-thread runtime the worker hands its other tasks off first;
/// elsewhere the closure just runs inline.
fn blocking_io<T>(f: impl FnOnce() -> T) -> T {
    match Handle::try_current() {
        Ok(handle) if handle.runtime_flavor() == RuntimeFlavor::MultiThread => {
            tokio::task::block_in_place(f)
        }
        _ => f(),
    }
}

/// Contexts in first-occurrence order without duplicates.
fn distinct(contexts: &[ContextId]) -> Vec<ContextId> {
    let mut seen = std::collections::HashSet::new();
    let mut out = Vec::with_capacity(contexts.len());
    for ctx in contexts {
        if seen.insert(ctx.as_str()) {
            out.push(ctx.clone());
        }
    }
    out
}
