//! Property-based invariant tests for values, expression nodes and observe.
//!
//! 1. Observers are notified once per `set` whose contents differ.
//! 2. Notified contents are the sequence of distinct transitions.
//! 3. After `eval`, a node's result equals its operation on current inputs.
//! 4. A value from `observe` always equals the expression on current inputs.
//! 5. A value from `observe_with` lags until `update_all`.

use std::sync::{Arc, Mutex};

use observable::{Updater, Value, max, min, observe, observe_with, select};
use proptest::prelude::*;

// ── Helpers ─────────────────────────────────────────────────────────────

fn small_int() -> impl Strategy<Value = i32> {
    -1000i32..1000
}

fn recorded(value: &Value<i32>) -> Arc<Mutex<Vec<i32>>> {
    let seen = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&seen);
    // The subscription is never detached; it lives as long as the value.
    let _ = value.subscribe(move |v: &i32| sink.lock().unwrap().push(*v));
    seen
}

// ═════════════════════════════════════════════════════════════════════════
// 1-2. Equality gating
// ═════════════════════════════════════════════════════════════════════════

proptest! {
    #[test]
    fn notifications_follow_distinct_transitions(
        initial in 0i32..4,
        writes in proptest::collection::vec(0i32..4, 0..50),
    ) {
        let value = Value::new(initial);
        let seen = recorded(&value);

        let mut expected = Vec::new();
        let mut current = initial;
        for w in &writes {
            value.set(*w).unwrap();
            if *w != current {
                expected.push(*w);
                current = *w;
            }
        }

        prop_assert_eq!(&*seen.lock().unwrap(), &expected);
        prop_assert_eq!(value.get(), current);
    }

    #[test]
    fn always_notify_reports_every_write(writes in proptest::collection::vec(0i32..4, 0..50)) {
        let value = Value::always_notify(0);
        let seen = recorded(&value);
        for w in &writes {
            value.set(*w).unwrap();
        }
        prop_assert_eq!(&*seen.lock().unwrap(), &writes);
    }
}

// ═════════════════════════════════════════════════════════════════════════
// 3. Node evaluation law
// ═════════════════════════════════════════════════════════════════════════

proptest! {
    #[test]
    fn arithmetic_node_matches_direct_computation(
        start in (small_int(), small_int(), small_int()),
        updates in proptest::collection::vec((0usize..3, small_int()), 0..30),
    ) {
        let values = [Value::new(start.0), Value::new(start.1), Value::new(start.2)];
        let node = (&values[0] + &values[1]) * 3 - &values[2];
        let mut model = [start.0, start.1, start.2];

        for (which, v) in updates {
            values[which].set(v).unwrap();
            model[which] = v;
            node.eval();
            prop_assert!(!node.is_dirty());
            prop_assert_eq!(node.get(), (model[0] + model[1]) * 3 - model[2]);
        }
    }

    #[test]
    fn filter_nodes_match_direct_computation(
        a in small_int(),
        b in small_int(),
        flag in any::<bool>(),
    ) {
        let va = Value::new(0);
        let vb = Value::new(0);
        let vflag = Value::new(!flag);
        let low = min(&va, &vb);
        let high = max(&va, &vb);
        let chosen = select(&vflag, &va, &vb);

        va.set(a).unwrap();
        vb.set(b).unwrap();
        vflag.set(flag).unwrap();
        for node in [&low, &high, &chosen] {
            node.eval();
        }

        prop_assert_eq!(low.get(), a.min(b));
        prop_assert_eq!(high.get(), a.max(b));
        prop_assert_eq!(chosen.get(), if flag { a } else { b });
    }
}

// ═════════════════════════════════════════════════════════════════════════
// 4-5. observe / observe_with
// ═════════════════════════════════════════════════════════════════════════

proptest! {
    #[test]
    fn observed_value_tracks_inputs(
        updates in proptest::collection::vec((any::<bool>(), small_int()), 0..30),
    ) {
        let a = Value::new(0);
        let b = Value::new(0);
        let diff = observe(&a - &b);
        let (mut ma, mut mb) = (0, 0);

        for (first, v) in updates {
            if first {
                a.set(v).unwrap();
                ma = v;
            } else {
                b.set(v).unwrap();
                mb = v;
            }
            prop_assert_eq!(diff.get(), ma - mb);
        }
    }

    #[test]
    fn updater_value_lags_until_update_all(
        writes in proptest::collection::vec(small_int(), 1..20),
    ) {
        let source = Value::new(0);
        let updater = Updater::new();
        let mirror = observe_with(&updater, &source);

        let mut last_published = 0;
        for (i, w) in writes.iter().enumerate() {
            source.set(*w).unwrap();
            prop_assert_eq!(mirror.get(), last_published);
            if i % 3 == 2 {
                updater.update_all();
                last_published = *w;
                prop_assert_eq!(mirror.get(), last_published);
            }
        }
        updater.update_all();
        prop_assert_eq!(mirror.get(), *writes.last().unwrap());
    }
}
