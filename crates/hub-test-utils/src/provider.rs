//! [`ScriptedProvider`]: a [`SnapshotProvider`] answering from a script.

use std::collections::HashMap;
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use hub_core::{ContextId, Feature, ProviderError, RemoteValues, SnapshotProvider, keys};

#[derive(Debug, Clone)]
enum Reply {
    Values(RemoteValues),
    Fail(ProviderError),
}

#[derive(Debug, Clone)]
struct Script {
    reply: Reply,
    delay: Option<Duration>,
}

/// Provider whose answers are configured per context.
///
/// Contexts without a script answer with `ProviderError::Unavailable`.
/// Every call is recorded, in call order.
///
/// # Example
///
/// ```rust,no_run
/// use hub_test_utils::{ScriptedProvider, plan_values};
/// use hub_core::Feature;
///
/// let provider = ScriptedProvider::new()
///     .with_values("acme_business", plan_values("Acme", "#112233", &[Feature::SupportChat]))
///     .with_failure("acme_personal", "offline");
/// ```
#[derive(Debug, Default)]
pub struct ScriptedProvider {
    scripts: Mutex<HashMap<String, Script>>,
    calls: Mutex<Vec<String>>,
}

impl ScriptedProvider {
    pub fn new() -> Self {
        Self::default()
    }

    /// Answer `context` with `values`.
    pub fn with_values(self, context: &str, values: RemoteValues) -> Self {
        self.set_values(context, values);
        self
    }

    /// Answer `context` with a remote error.
    pub fn with_failure(self, context: &str, message: &str) -> Self {
        self.set_failure(context, message);
        self
    }

    /// Delay every answer for `context`.
    pub fn with_delay(self, context: &str, delay: Duration) -> Self {
        self.set_delay(context, delay);
        self
    }

    /// Replace the answer for `context` on a shared provider.
    pub fn set_values(&self, context: &str, values: RemoteValues) {
        self.set_script(context, Reply::Values(values));
    }

    /// Make `context` fail from now on, on a shared provider.
    pub fn set_failure(&self, context: &str, message: &str) {
        self.set_script(context, Reply::Fail(ProviderError::remote(context, message)));
    }

    pub fn set_delay(&self, context: &str, delay: Duration) {
        let mut scripts = self.scripts.lock().unwrap();
        let script = scripts.entry(context.to_string()).or_insert_with(|| Script {
            reply: Reply::Values(RemoteValues::new()),
            delay: None,
        });
        script.delay = Some(delay);
    }

    fn set_script(&self, context: &str, reply: Reply) {
        let mut scripts = self.scripts.lock().unwrap();
        let delay = scripts.get(context).and_then(|s| s.delay);
        scripts.insert(context.to_string(), Script { reply, delay });
    }

    /// Contexts fetched so far, in call order.
    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    pub fn call_count(&self, context: &str) -> usize {
        self.calls.lock().unwrap().iter().filter(|c| *c == context).count()
    }
}

#[async_trait]
impl SnapshotProvider for ScriptedProvider {
    fn id(&self) -> &str {
        "scripted"
    }

    async fn fetch_and_activate(&self, context: &ContextId) -> Result<RemoteValues, ProviderError> {
        self.calls.lock().unwrap().push(context.to_string());
        let script = self.scripts.lock().unwrap().get(context.as_str()).cloned();

        let Some(script) = script else {
            return Err(ProviderError::unavailable(context.as_str(), "no script for context"));
        };
        if let Some(delay) = script.delay {
            tokio::time::sleep(delay).await;
        }
        match script.reply {
            Reply::Values(values) => Ok(values),
            Reply::Fail(error) => Err(error),
        }
    }
}

/// Remote values for a plan with the given branding and features.
///
/// Data limit 100, no priority support, kill-switch off, TTL 3600 and a
/// metadata version derived from the display name.
pub fn plan_values(display_name: &str, theme_color: &str, features: &[Feature]) -> RemoteValues {
    let tags: Vec<&str> = features.iter().map(Feature::as_str).collect();
    RemoteValues::new()
        .with(keys::DISPLAY_NAME, display_name)
        .with(keys::THEME_COLOR, theme_color)
        .with(keys::DATA_LIMIT, 100)
        .with(keys::PRIORITY_SUPPORT, false)
        .with(keys::KILL_SWITCH, false)
        .with(keys::META_VERSION, format!("{}-v1", display_name.to_lowercase().replace(' ', "-")))
        .with(keys::TTL_SECONDS, 3600)
        .with(keys::FEATURE_LIST, serde_json::to_string(&tags).unwrap())
}
