//! Shared test utilities for the ConfigHub workspace.
//!
//! Test doubles for the engine's external capabilities plus cache fixtures.
//! It is a dev-dependency only, never published.
//!
//! # Modules
//!
//! - [`provider`]: [`ScriptedProvider`] with canned values, failures and delays
//! - [`telemetry`]: [`RecordingTelemetry`] capturing emitted events
//! - [`clock`]: [`ManualClock`] for deterministic freshness math
//! - [`cache`]: [`TestCache`] temporary cache location

pub mod cache;
pub mod clock;
pub mod provider;
pub mod telemetry;

pub use cache::TestCache;
pub use clock::ManualClock;
pub use provider::{ScriptedProvider, plan_values};
pub use telemetry::RecordingTelemetry;
