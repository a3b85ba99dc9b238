//! [`RecordingTelemetry`]: a [`TelemetrySink`] that keeps every event.

use std::sync::Mutex;

use hub_core::{EventParams, TelemetrySink};

/// Captures events for later assertions.
#[derive(Debug, Default)]
pub struct RecordingTelemetry {
    events: Mutex<Vec<(String, EventParams)>>,
}

impl RecordingTelemetry {
    pub fn new() -> Self {
        Self::default()
    }

    /// All events, in emission order.
    pub fn events(&self) -> Vec<(String, EventParams)> {
        self.events.lock().unwrap().clone()
    }

    /// Names of all events, in emission order.
    pub fn names(&self) -> Vec<String> {
        self.events.lock().unwrap().iter().map(|(n, _)| n.clone()).collect()
    }

    pub fn count(&self, name: &str) -> usize {
        self.events.lock().unwrap().iter().filter(|(n, _)| n == name).count()
    }

    /// Parameters of the most recent event called `name`.
    pub fn last(&self, name: &str) -> Option<EventParams> {
        self.events
            .lock()
            .unwrap()
            .iter()
            .rev()
            .find(|(n, _)| n == name)
            .map(|(_, p)| p.clone())
    }

    pub fn clear(&self) {
        self.events.lock().unwrap().clear();
    }
}

impl TelemetrySink for RecordingTelemetry {
    fn log_event(&self, name: &str, params: EventParams) {
        self.events.lock().unwrap().push((name.to_string(), params));
    }
}
