//! Telemetry sink capability
//!
//! Fire-and-forget analytics events. The engine never inspects the outcome
//! of logging an event.

use std::collections::BTreeMap;

use serde_json::Value;

/// Event parameters, keyed by name.
pub type EventParams = BTreeMap<String, Value>;

/// Event names emitted by the engine.
pub mod events {
    /// One per provider call, carrying `value` = latency in milliseconds
    pub const FETCH_LATENCY: &str = "rc_fetch_latency_ms";
    /// One per published resolution
    pub const ACTIVATION_SUCCESS: &str = "rc_activation_success";
    /// One per published resolution that entered limited mode
    pub const KILL_SWITCH_ACTIVE: &str = "rc_killswitch_active";
}

/// Destination for analytics events.
pub trait TelemetrySink: Send + Sync {
    fn log_event(&self, name: &str, params: EventParams);
}

/// Build an [`EventParams`] map from `(key, value)` pairs.
pub fn params<K, V, I>(pairs: I) -> EventParams
where
    K: Into<String>,
    V: Into<Value>,
    I: IntoIterator<Item = (K, V)>,
{
    pairs
        .into_iter()
        .map(|(k, v)| (k.into(), v.into()))
        .collect()
}

/// Sink that records each event as a structured `tracing` record.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingTelemetry;

impl TelemetrySink for TracingTelemetry {
    fn log_event(&self, name: &str, params: EventParams) {
        let params = Value::Object(params.into_iter().collect());
        tracing::info!(target: "confighub::telemetry", event = name, %params, "telemetry");
    }
}

/// Sink that discards every event.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopTelemetry;

impl TelemetrySink for NoopTelemetry {
    fn log_event(&self, _name: &str, _params: EventParams) {}
}
