//! End-to-end resolution flow
//!
//! Exercises the complete path: engine config file -> engine -> scripted
//! provider -> published state -> cache document -> cold start.

use std::sync::Arc;
use std::time::Duration;

use hub_core::{
    ContextId, EngineConfig, Feature, FinalConfig, LkgStore, RemoteValues, ResolutionEngine,
    StateOrigin, ThemeFailurePolicy, events, keys,
};
use hub_test_utils::{ManualClock, RecordingTelemetry, ScriptedProvider, TestCache, plan_values};
use pretty_assertions::assert_eq;
use tempfile::TempDir;

fn ids(raw: &[&str]) -> Vec<ContextId> {
    raw.iter().map(|s| ContextId::from(*s)).collect()
}

fn business() -> RemoteValues {
    plan_values(
        "Acme Business",
        "#0A84FF",
        &[Feature::BillingPortal, Feature::SupportChat],
    )
    .with(keys::META_VERSION, "biz-v7")
    .with(keys::TTL_SECONDS, "7200")
}

fn personal() -> RemoteValues {
    plan_values(
        "Acme Personal",
        "#34C759",
        &[Feature::MultiUserManagement, Feature::SupportChat],
    )
}

/// Write an engine config pointing the cache into `dir`.
fn engine_config(dir: &TempDir, extra: &str) -> EngineConfig {
    let cache = dir.path().join("data").join("remote_config_lkg.json");
    let path = dir.path().join("engine.toml");
    std::fs::write(
        &path,
        format!(
            "{extra}\n[fetch]\ndeadline_ms = 500\n\n[cache]\npath = {:?}\n",
            cache.display().to_string()
        ),
    )
    .unwrap();
    EngineConfig::load(&path).unwrap()
}

#[tokio::test]
async fn combo_user_round_trip_through_config_and_cache() {
    let dir = TempDir::new().unwrap();
    let config = engine_config(&dir, "");
    let provider = Arc::new(
        ScriptedProvider::new()
            .with_values("acme_personal", personal())
            .with_values("acme_business", business()),
    );
    let telemetry = Arc::new(RecordingTelemetry::new());

    let engine = ResolutionEngine::from_config(&config, provider.clone(), telemetry.clone());
    assert_eq!(engine.current_state().origin, StateOrigin::Defaults);

    engine.resolve(&ids(&["acme_personal", "acme_business"])).await;
    let published = engine.current_state();

    assert_eq!(
        published.config.features,
        vec![
            Feature::BillingPortal,
            Feature::MultiUserManagement,
            Feature::SupportChat
        ]
    );
    assert_eq!(published.config.display_name, "Acme Business");
    assert_eq!(published.ttl_seconds, 7200);
    assert!(!published.limited_mode);
    assert_eq!(telemetry.count(events::FETCH_LATENCY), 2);
    assert_eq!(telemetry.count(events::ACTIVATION_SUCCESS), 1);

    // A new process: no network, state comes from the cache document.
    let offline = ResolutionEngine::from_config(
        &config,
        Arc::new(ScriptedProvider::new()),
        Arc::new(RecordingTelemetry::new()),
    );
    let cold = offline.current_state();
    assert_eq!(cold.origin, StateOrigin::Cache);
    assert_eq!(cold.config, published.config);
    assert_eq!(cold.meta_version, "biz-v7");
    assert_eq!(cold.ttl_seconds, 7200);
    assert!(!cold.is_stale);
}

#[tokio::test]
async fn configured_marker_changes_branding_precedence() {
    let dir = TempDir::new().unwrap();
    let config = engine_config(&dir, "[policy]\nelevated_marker = \"_PERSONAL\"\n");
    let provider = Arc::new(
        ScriptedProvider::new()
            .with_values("acme_personal", personal())
            .with_values("acme_business", business()),
    );

    let engine =
        ResolutionEngine::from_config(&config, provider, Arc::new(RecordingTelemetry::new()));
    engine.resolve(&ids(&["acme_business", "acme_personal"])).await;

    assert_eq!(engine.current_state().config.display_name, "Acme Personal");
}

#[tokio::test]
async fn configured_fail_closed_policy_applies() {
    let dir = TempDir::new().unwrap();
    let config = engine_config(&dir, "[policy]\ntheme_failure = \"fail-closed\"\n");
    let provider = Arc::new(
        ScriptedProvider::new()
            .with_values("acme_personal", personal())
            .with_failure("acme_business", "503"),
    );
    assert_eq!(config.policy.theme_failure, ThemeFailurePolicy::FailClosed);

    let engine =
        ResolutionEngine::from_config(&config, provider, Arc::new(RecordingTelemetry::new()));
    engine.resolve(&ids(&["acme_personal", "acme_business"])).await;

    let state = engine.current_state();
    assert!(state.limited_mode);
    assert_eq!(state.config, FinalConfig::default());
}

#[tokio::test]
async fn kill_switch_survives_restart() {
    let cache = TestCache::new();
    let provider = Arc::new(
        ScriptedProvider::new()
            .with_values("acme_personal", personal().with(keys::KILL_SWITCH, "yes"))
            .with_values("acme_business", business()),
    );
    let engine = ResolutionEngine::builder(provider, cache.store()).build();
    engine.resolve(&ids(&["acme_personal", "acme_business"])).await;

    let restarted =
        ResolutionEngine::builder(Arc::new(ScriptedProvider::new()), cache.store()).build();
    let state = restarted.current_state();

    assert_eq!(state.origin, StateOrigin::Cache);
    assert!(state.limited_mode);
    assert!(state.config.is_safe_default());
}

#[tokio::test]
async fn cache_goes_stale_after_ttl() {
    let cache = TestCache::new();
    let provider = Arc::new(ScriptedProvider::new().with_values("acme_business", business()));
    let engine = ResolutionEngine::builder(provider, cache.store()).build();
    engine.resolve(&ids(&["acme_business"])).await;

    let clock = Arc::new(ManualClock::starting_now());
    clock.advance(7200 - 100);
    let early = ResolutionEngine::builder(Arc::new(ScriptedProvider::new()), cache.store())
        .with_clock(clock.clone())
        .build()
        .current_state();
    assert!(!early.is_stale);
    assert!(early.ttl_seconds_remaining > 0 && early.ttl_seconds_remaining <= 100);

    clock.advance(200);
    let late = ResolutionEngine::builder(Arc::new(ScriptedProvider::new()), cache.store())
        .with_clock(clock)
        .build()
        .current_state();
    assert!(late.is_stale);
    assert_eq!(late.ttl_seconds_remaining, 0);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_resolves_leave_cache_matching_state() {
    let cache = TestCache::new();
    let provider = Arc::new(
        ScriptedProvider::new()
            .with_values("acme_personal", personal())
            .with_delay("acme_personal", Duration::from_millis(20))
            .with_values("acme_business", business()),
    );
    let engine = Arc::new(ResolutionEngine::builder(provider, cache.store()).build());

    let mut handles = Vec::new();
    for i in 0..16 {
        let engine = Arc::clone(&engine);
        handles.push(tokio::spawn(async move {
            let request = if i % 2 == 0 {
                ids(&["acme_personal"])
            } else {
                ids(&["acme_business", "acme_personal"])
            };
            engine.resolve(&request).await
        }));
    }
    let outcomes: Vec<_> = join_handles(handles).await;

    let published = outcomes.iter().filter(|o| o.published().is_some()).count();
    assert!(published >= 1);

    let state = engine.current_state();
    assert_eq!(state.sequence, 16);
    let record = LkgStore::new(cache.path()).load().expect("cache document");
    assert_eq!(record.config, state.config);
    assert_eq!(record.meta_version, state.meta_version);
}

async fn join_handles<T>(handles: Vec<tokio::task::JoinHandle<T>>) -> Vec<T> {
    let mut out = Vec::with_capacity(handles.len());
    for handle in handles {
        out.push(handle.await.unwrap());
    }
    out
}
