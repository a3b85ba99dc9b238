//! Per-context snapshot fetching
//!
//! One provider call per context, bounded by a deadline, validated into a
//! [`Snapshot`]. A context that cannot be fetched degrades to the fallback
//! snapshot instead of blocking or failing resolution.

use std::sync::Arc;
use std::time::{Duration, Instant};

use serde_json::json;

use crate::context::ContextId;
use crate::error::ProviderError;
use crate::provider::SnapshotProvider;
use crate::snapshot::{DEFAULT_TTL_SECONDS, Snapshot};
use crate::telemetry::{TelemetrySink, events, params};

pub const DEFAULT_FETCH_DEADLINE: Duration = Duration::from_secs(10);

/// Fetches and validates snapshots through a [`SnapshotProvider`].
#[derive(Clone)]
pub struct SnapshotFetcher {
    provider: Arc<dyn SnapshotProvider>,
    telemetry: Arc<dyn TelemetrySink>,
    deadline: Duration,
    default_ttl_seconds: i64,
}

impl std::fmt::Debug for SnapshotFetcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SnapshotFetcher")
            .field("provider", &self.provider.id())
            .field("deadline", &self.deadline)
            .field("default_ttl_seconds", &self.default_ttl_seconds)
            .finish()
    }
}

impl SnapshotFetcher {
    pub fn new(provider: Arc<dyn SnapshotProvider>, telemetry: Arc<dyn TelemetrySink>) -> Self {
        Self {
            provider,
            telemetry,
            deadline: DEFAULT_FETCH_DEADLINE,
            default_ttl_seconds: DEFAULT_TTL_SECONDS,
        }
    }

    /// Set the per-context fetch deadline.
    pub fn with_deadline(mut self, deadline: Duration) -> Self {
        self.deadline = deadline;
        self
    }

    /// Set the TTL used when the remote omits one.
    pub fn with_default_ttl(mut self, seconds: i64) -> Self {
        self.default_ttl_seconds = seconds;
        self
    }

    /// Fetch one context. Never fails.
    ///
    /// Emits exactly one latency event per call, whether the fetch
    /// succeeded, failed or timed out.
    pub async fn fetch_snapshot(&self, context: &ContextId) -> Snapshot {
        let started = Instant::now();
        let outcome = self.fetch_bounded(context).await;
        let latency_ms = u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX);

        let status = match &outcome {
            Ok(_) => "ok",
            Err(e) => e.kind(),
        };
        self.telemetry.log_event(
            events::FETCH_LATENCY,
            params([
                ("value", json!(latency_ms)),
                ("context", json!(context.as_str())),
                ("status", json!(status)),
            ]),
        );

        match outcome {
            Ok(values) => {
                let snapshot = Snapshot::from_remote(&values, self.default_ttl_seconds);
                tracing::debug!(
                    %context,
                    latency_ms,
                    name = %snapshot.display_name,
                    color = %snapshot.theme_color,
                    kill_switch = snapshot.kill_switch,
                    features = snapshot.features.len(),
                    "Fetched snapshot"
                );
                snapshot
            }
            Err(error) => {
                tracing::warn!(%context, latency_ms, %error, "Fetch failed; using fallback snapshot");
                Snapshot::fallback(self.default_ttl_seconds)
            }
        }
    }

    async fn fetch_bounded(
        &self,
        context: &ContextId,
    ) -> std::result::Result<crate::provider::RemoteValues, ProviderError> {
        match tokio::time::timeout(self.deadline, self.provider.fetch_and_activate(context)).await
        {
            Ok(result) => result,
            Err(_) => Err(ProviderError::TimedOut {
                context: context.to_string(),
                deadline_ms: u64::try_from(self.deadline.as_millis()).unwrap_or(u64::MAX),
            }),
        }
    }
}
