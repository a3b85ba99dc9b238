//! Configuration resolution and caching engine for ConfigHub
//!
//! Resolves a client's effective configuration from one or more entitlement
//! contexts, each of which publishes its own remote configuration snapshot:
//!
//! - **Context policy**: elevated-tier branding precedence and deterministic
//!   feature union
//! - **Snapshot fetching**: one bounded provider call per context, validated
//!   field by field
//! - **Kill-switch**: any context can force the whole account into a safe,
//!   feature-free configuration
//! - **Last-known-good cache**: atomic JSON persistence for cold start and
//!   offline use, with TTL-based staleness
//!
//! # Architecture
//!
//! ```text
//!          rendering layer
//!                |
//!        ResolutionEngine ---- watch::Receiver<Arc<ResolutionState>>
//!       /        |        \
//! ContextPolicy  |   LkgStore -- hub-fs
//!         SnapshotFetcher
//!           /         \
//! SnapshotProvider  TelemetrySink
//! ```
//!
//! # Example
//!
//! ```ignore
//! use std::sync::Arc;
//! use hub_core::{ContextId, LkgStore, ResolutionEngine};
//!
//! let store = Arc::new(LkgStore::new("/tmp/remote_config_lkg.json"));
//! let engine = ResolutionEngine::builder(provider, store).build();
//! engine
//!     .resolve(&[ContextId::from("acme_personal"), ContextId::from("acme_business")])
//!     .await;
//! println!("{}", engine.current_state().config.display_name);
//! ```

pub mod config;
pub mod context;
pub mod engine;
pub mod error;
pub mod feature;
pub mod fetcher;
pub mod freshness;
pub mod lkg;
pub mod policy;
pub mod provider;
pub mod snapshot;
pub mod state;
pub mod telemetry;

pub use config::{EngineConfig, ThemeFailurePolicy, default_cache_path};
pub use context::ContextId;
pub use engine::{EngineBuilder, ResolutionEngine, ResolveOutcome};
pub use error::{Error, ProviderError, Result};
pub use feature::{Feature, decode_feature_list};
pub use fetcher::SnapshotFetcher;
pub use freshness::{Clock, Freshness, FreshnessCalculator, SystemClock, compute_freshness};
pub use lkg::{LkgRecord, LkgStore};
pub use policy::{ContextPolicy, union_features};
pub use provider::{RemoteValues, SnapshotProvider, keys};
pub use snapshot::{Snapshot, SnapshotSource, is_valid_hex_color};
pub use state::{EnginePhase, FinalConfig, ResolutionState, StateOrigin};
pub use telemetry::{EventParams, NoopTelemetry, TelemetrySink, TracingTelemetry, events};
