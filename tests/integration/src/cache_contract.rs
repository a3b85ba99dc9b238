//! On-disk cache document contract
//!
//! The cache document is the only persisted format and must stay readable
//! across versions: documents written by older or newer builds load with
//! per-key defaults instead of being discarded.

use std::sync::Arc;

use hub_core::{
    ContextId, Feature, LkgRecord, LkgStore, ResolutionEngine, StateOrigin, keys,
};
use hub_test_utils::{ScriptedProvider, TestCache, plan_values};
use pretty_assertions::assert_eq;
use serde_json::{Value, json};

const DOCUMENT_KEYS: [&str; 8] = [
    "dataLimit",
    "displayName",
    "features",
    "hasPrioritySupport",
    "limitedMode",
    "meta_config_version",
    "meta_ttl_seconds",
    "themeColor",
];

fn read_document(cache: &TestCache) -> Value {
    let raw = hub_fs::read_locked(&cache.path())
        .unwrap()
        .expect("cache document written");
    serde_json::from_slice(&raw).unwrap()
}

#[tokio::test]
async fn resolution_writes_the_documented_keys() {
    let cache = TestCache::new();
    let provider = Arc::new(ScriptedProvider::new().with_values(
        "acme_business",
        plan_values(
            "Acme Business",
            "#0A84FF",
            &[Feature::SupportChat, Feature::BillingPortal],
        )
        .with(keys::META_VERSION, "biz-v7"),
    ));
    let engine = ResolutionEngine::builder(provider, cache.store()).build();

    engine.resolve(&[ContextId::from("acme_business")]).await;

    let doc = read_document(&cache);
    let mut found: Vec<&str> = doc.as_object().unwrap().keys().map(String::as_str).collect();
    found.sort_unstable();
    assert_eq!(found, DOCUMENT_KEYS.to_vec());

    assert_eq!(
        doc,
        json!({
            "displayName": "Acme Business",
            "themeColor": "#0A84FF",
            "dataLimit": 100,
            "hasPrioritySupport": false,
            "features": ["billing_portal", "support_chat"],
            "meta_config_version": "biz-v7",
            "meta_ttl_seconds": 3600,
            "limitedMode": false
        })
    );
}

#[test]
fn older_document_with_missing_keys_loads_with_defaults() {
    let cache = TestCache::new();
    cache.write_raw(r#"{ "displayName": "Legacy", "features": ["support_chat"] }"#);

    let engine =
        ResolutionEngine::builder(Arc::new(ScriptedProvider::new()), cache.store()).build();
    let state = engine.current_state();

    assert_eq!(state.origin, StateOrigin::Cache);
    assert_eq!(state.config.display_name, "Legacy");
    assert_eq!(state.config.theme_color, "#CCCCCC");
    assert_eq!(state.config.data_limit, 0);
    assert_eq!(state.features, vec![Feature::SupportChat]);
    assert!(!state.limited_mode);
    assert_eq!(state.ttl_seconds, 86_400);
}

#[test]
fn newer_document_with_extra_keys_and_tags_loads() {
    let cache = TestCache::new();
    cache.write_raw(
        &json!({
            "displayName": "Future",
            "themeColor": "#ABCDEF",
            "dataLimit": 42,
            "hasPrioritySupport": true,
            "features": ["hologram_calls", "billing_portal"],
            "meta_config_version": "v99",
            "meta_ttl_seconds": 60,
            "limitedMode": false,
            "someNewField": { "nested": true }
        })
        .to_string(),
    );

    let record = cache.store().load().expect("document should load");

    assert_eq!(record.config.display_name, "Future");
    assert_eq!(record.config.data_limit, 42);
    assert!(record.config.has_priority_support);
    assert_eq!(
        record.config.features,
        vec![Feature::BillingPortal, Feature::Unknown]
    );
    assert_eq!(record.ttl_seconds, 60);
}

#[test]
fn non_object_documents_are_cache_misses() {
    for raw in ["[]", "\"text\"", "42", "{ truncated", ""] {
        let cache = TestCache::new();
        cache.write_raw(raw);

        assert!(cache.store().load().is_none(), "should ignore {raw:?}");
        let engine =
            ResolutionEngine::builder(Arc::new(ScriptedProvider::new()), cache.store()).build();
        assert_eq!(engine.current_state().origin, StateOrigin::Defaults);
    }
}

#[test]
fn store_handles_on_one_path_share_the_document() {
    let cache = TestCache::new();
    let writer = LkgStore::new(cache.path());
    let reader = LkgStore::new(cache.path());
    let record = LkgRecord {
        meta_version: "shared".into(),
        ..LkgRecord::default()
    };

    assert!(writer.save(&record));
    assert_eq!(reader.load(), Some(record));

    reader.reset();
    assert!(writer.load().is_none());
    assert!(writer.last_modified().is_none());
}
