//! Property-based invariant tests for state containers.
//!
//! These verify invariants that must hold for any valid inputs:
//!
//! 1. `version` equals the number of accepted (value-changing) updates.
//! 2. Under `OnChange`, an update equal to the current snapshot never
//!    notifies; under `Always`, every valid update notifies.
//! 3. Shallow merge: patched keys take the patch value, unpatched keys
//!    keep the base value, no keys are lost.
//! 4. Every subscriber observes the same number of notifications, in
//!    subscription order.
//! 5. Shape-mismatched updates on dynamic containers never mutate value,
//!    version, or subscriber list.
//! 6. A dropped subscription stops counting; survivors keep counting.

use proptest::prelude::*;
use serde_json::{Map, Value, json};
use statebus::{NotifyPolicy, StateContainer};
use std::cell::Cell;
use std::rc::Rc;

// ── Strategies ────────────────────────────────────────────────────────────

fn scalar_updates() -> impl Strategy<Value = Vec<i64>> {
    prop::collection::vec(-1000i64..1000, 0..64)
}

fn json_object() -> impl Strategy<Value = Value> {
    prop::collection::btree_map("[a-e]", -100i64..100, 0..6).prop_map(|map| {
        Value::Object(
            map.into_iter()
                .map(|(key, value)| (key, json!(value)))
                .collect::<Map<String, Value>>(),
        )
    })
}

// ── Properties ────────────────────────────────────────────────────────────

proptest! {
    #[test]
    fn version_counts_accepted_updates(updates in scalar_updates()) {
        let container = StateContainer::new(0i64);
        let mut accepted = 0u64;
        let mut current = 0i64;
        for update in updates {
            container.set(update).unwrap();
            if update != current {
                accepted += 1;
                current = update;
            }
        }
        prop_assert_eq!(container.version(), accepted);
        prop_assert_eq!(container.get(), current);
    }

    #[test]
    fn on_change_notifications_match_accepted_updates(updates in scalar_updates()) {
        let container = StateContainer::new(0i64);
        let fired = Rc::new(Cell::new(0u64));
        let counter = Rc::clone(&fired);
        let _sub = container.subscribe_guard(move || counter.set(counter.get() + 1));

        for update in &updates {
            container.set(*update).unwrap();
        }
        prop_assert_eq!(fired.get(), container.version());
    }

    #[test]
    fn always_policy_notifies_every_update(updates in scalar_updates()) {
        let container = StateContainer::with_policy(0i64, NotifyPolicy::Always);
        let fired = Rc::new(Cell::new(0u64));
        let counter = Rc::clone(&fired);
        let _sub = container.subscribe_guard(move || counter.set(counter.get() + 1));

        for update in &updates {
            container.set(*update).unwrap();
        }
        prop_assert_eq!(fired.get() as usize, updates.len());
        prop_assert_eq!(container.version() as usize, updates.len());
    }

    #[test]
    fn shallow_merge_key_semantics(base in json_object(), patch in json_object()) {
        let container = StateContainer::new(base.clone());
        container.patch(patch.clone()).unwrap();
        let merged = container.get();

        let base_map = base.as_object().unwrap();
        let patch_map = patch.as_object().unwrap();
        let merged_map = merged.as_object().unwrap();

        // Patched keys take the patch value; unpatched keys keep the base
        // value; nothing else appears.
        for (key, value) in patch_map {
            prop_assert_eq!(merged_map.get(key), Some(value));
        }
        for (key, value) in base_map {
            if !patch_map.contains_key(key) {
                prop_assert_eq!(merged_map.get(key), Some(value));
            }
        }
        prop_assert!(
            merged_map
                .keys()
                .all(|key| base_map.contains_key(key) || patch_map.contains_key(key))
        );
    }

    #[test]
    fn all_subscribers_see_every_fanout(
        updates in scalar_updates(),
        subscriber_count in 1usize..8,
    ) {
        let container = StateContainer::new(0i64);
        let counters: Vec<Rc<Cell<u64>>> =
            (0..subscriber_count).map(|_| Rc::new(Cell::new(0))).collect();
        let _guards: Vec<_> = counters
            .iter()
            .map(|counter| {
                let counter = Rc::clone(counter);
                container.subscribe_guard(move || counter.set(counter.get() + 1))
            })
            .collect();

        for update in &updates {
            container.set(*update).unwrap();
        }
        let expected = container.version();
        for counter in &counters {
            prop_assert_eq!(counter.get(), expected);
        }
    }

    #[test]
    fn shape_mismatch_never_mutates(base in json_object(), scalar in -100i64..100) {
        let container = StateContainer::new(base.clone());
        let fired = Rc::new(Cell::new(0u64));
        let counter = Rc::clone(&fired);
        let _sub = container.subscribe_guard(move || counter.set(counter.get() + 1));

        prop_assert!(container.set(json!(scalar)).is_err());
        prop_assert!(container.patch(json!(scalar)).is_err());

        prop_assert_eq!(container.get(), base);
        prop_assert_eq!(container.version(), 0);
        prop_assert_eq!(container.subscriber_count(), 1);
        prop_assert_eq!(fired.get(), 0);
    }

    #[test]
    fn dropped_subscription_stops_counting(updates in scalar_updates()) {
        let container = StateContainer::with_policy(0i64, NotifyPolicy::Always);
        let survivor = Rc::new(Cell::new(0u64));
        let doomed = Rc::new(Cell::new(0u64));

        let survivor_counter = Rc::clone(&survivor);
        let _kept = container.subscribe_guard(move || {
            survivor_counter.set(survivor_counter.get() + 1);
        });
        let doomed_counter = Rc::clone(&doomed);
        let dropped = container.subscribe_guard(move || {
            doomed_counter.set(doomed_counter.get() + 1);
        });
        drop(dropped);

        for update in &updates {
            container.set(*update).unwrap();
        }
        prop_assert_eq!(survivor.get() as usize, updates.len());
        prop_assert_eq!(doomed.get(), 0);
    }
}
