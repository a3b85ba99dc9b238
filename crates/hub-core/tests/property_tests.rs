use hub_core::{ContextId, ContextPolicy, Feature, RemoteValues, Snapshot, keys, union_features};
use hub_core::{compute_freshness, is_valid_hex_color};
use proptest::prelude::*;

fn feature() -> impl Strategy<Value = Feature> {
    prop::sample::select(Feature::ALL.to_vec())
}

fn feature_lists() -> impl Strategy<Value = Vec<Vec<Feature>>> {
    prop::collection::vec(prop::collection::vec(feature(), 0..8), 0..5)
}

fn context_ids() -> impl Strategy<Value = Vec<ContextId>> {
    prop::collection::vec("[a-z]{1,6}(_business|_personal|_family)?", 1..6)
        .prop_map(|raw| raw.into_iter().map(ContextId::from).collect())
}

proptest! {
    #[test]
    fn union_is_sorted_and_duplicate_free(lists in feature_lists()) {
        let union = union_features(lists.clone());

        prop_assert!(union.windows(2).all(|w| w[0] < w[1]));
        for feature in lists.iter().flatten() {
            prop_assert!(union.contains(feature));
        }
    }

    #[test]
    fn union_ignores_input_order(lists in feature_lists()) {
        let mut reversed = lists.clone();
        reversed.reverse();
        for list in &mut reversed {
            list.reverse();
        }

        prop_assert_eq!(union_features(lists), union_features(reversed));
    }

    #[test]
    fn union_is_idempotent(lists in feature_lists()) {
        let once = union_features(lists);
        let twice = union_features([once.clone(), once.clone()]);
        prop_assert_eq!(once, twice);
    }

    #[test]
    fn theme_context_is_a_member(contexts in context_ids()) {
        let policy = ContextPolicy::default();
        let picked = policy.pick_theme_context(&contexts).unwrap();

        prop_assert!(contexts.contains(picked));
        let elevated = contexts.iter().any(|c| c.contains_marker("_business"));
        prop_assert_eq!(picked.contains_marker("_business"), elevated);
    }

    #[test]
    fn theme_context_ignores_position_of_elevated(contexts in context_ids(), at in 0usize..6) {
        let policy = ContextPolicy::default();
        let mut with_business: Vec<ContextId> =
            contexts.into_iter().filter(|c| !c.contains_marker("_business")).collect();
        let at = at.min(with_business.len());
        with_business.insert(at, ContextId::from("acme_business"));

        let picked = policy.pick_theme_context(&with_business).unwrap();
        prop_assert_eq!(picked.as_str(), "acme_business");
    }

    #[test]
    fn snapshot_color_is_always_valid(color in "\\PC{0,10}", name in "\\PC{0,10}") {
        let values = RemoteValues::new()
            .with(keys::THEME_COLOR, color)
            .with(keys::DISPLAY_NAME, name);
        let snapshot = Snapshot::from_remote(&values, 60);

        prop_assert!(is_valid_hex_color(&snapshot.theme_color));
        prop_assert!(!snapshot.display_name.trim().is_empty());
    }

    #[test]
    fn freshness_is_bounded(ttl in 0i64..100_000, age in 0i64..200_000) {
        let now = chrono::Utc::now();
        let modified = now - chrono::Duration::seconds(age);
        let fresh = compute_freshness(ttl, Some(modified), now);

        prop_assert!(fresh.remaining_seconds >= 0);
        prop_assert!(fresh.remaining_seconds <= ttl);
        prop_assert_eq!(fresh.is_stale, age > ttl);
    }
}
