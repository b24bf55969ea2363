//! Property-Based Tests for Cache Module
//!
//! Uses proptest to check the cache bound and the eviction choice.

use proptest::prelude::*;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use crate::cache::{CacheEntry, CacheStore, ModuleHandle};

// == Test Configuration ==
const TEST_TTL: Duration = Duration::from_secs(1800);

// == Strategies ==
/// Generates route keys from a small alphabet so collisions happen
fn route_strategy() -> impl Strategy<Value = String> {
    "/[a-f]{1,2}".prop_map(|s| s)
}

#[derive(Debug, Clone)]
enum CacheOp {
    Put { key: String, advance_ms: u64 },
    Get { key: String, advance_ms: u64 },
}

fn cache_op_strategy() -> impl Strategy<Value = CacheOp> {
    prop_oneof![
        (route_strategy(), 0u64..600_000)
            .prop_map(|(key, advance_ms)| CacheOp::Put { key, advance_ms }),
        (route_strategy(), 0u64..600_000)
            .prop_map(|(key, advance_ms)| CacheOp::Get { key, advance_ms }),
    ]
}

fn module() -> ModuleHandle {
    Arc::new(())
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(100))]

    // For any sequence of puts and gets, the store never holds more than
    // its capacity.
    #[test]
    fn prop_size_never_exceeds_capacity(
        capacity in 1usize..8,
        ops in prop::collection::vec(cache_op_strategy(), 1..120)
    ) {
        let mut store = CacheStore::new(capacity, TEST_TTL);
        let mut now = 0u64;

        for op in ops {
            match op {
                CacheOp::Put { key, advance_ms } => {
                    now += advance_ms;
                    store.put_at(key, module(), now);
                }
                CacheOp::Get { key, advance_ms } => {
                    now += advance_ms;
                    let _ = store.get_at(&key, now);
                }
            }
            prop_assert!(store.len() <= capacity, "size {} > capacity {}", store.len(), capacity);
        }
    }

    // A put into a full store evicts exactly the entry with the lowest
    // score, ties going to the oldest load.
    #[test]
    fn prop_eviction_removes_minimum_score(
        entries in prop::collection::vec(
            (0u64..1_000_000, 0u64..1_000_000, 1u64..50),
            2..10
        ),
        now_offset in 0u64..10_000_000
    ) {
        let capacity = entries.len();
        let mut store = CacheStore::new(capacity, Duration::from_secs(365 * 24 * 3600));
        let mut expected: HashMap<String, CacheEntry> = HashMap::new();

        for (i, (loaded_at, idle, access_count)) in entries.iter().enumerate() {
            let key = format!("/route-{}", i);
            store.put_at(key.clone(), module(), *loaded_at);
            let touched_at = loaded_at + idle;
            for _ in 1..*access_count {
                store.get_at(&key, touched_at);
            }
            if let Some(entry) = store.peek(&key) {
                expected.insert(key.clone(), entry.clone());
            }
        }
        prop_assume!(expected.len() == capacity);

        let now = expected.values().map(|e| e.last_accessed_at).max().unwrap_or(0) + now_offset;
        let victim = expected
            .values()
            .min_by(|a, b| {
                a.eviction_score(now)
                    .total_cmp(&b.eviction_score(now))
                    .then_with(|| a.loaded_at.cmp(&b.loaded_at))
                    .then_with(|| a.route_key.cmp(&b.route_key))
            })
            .map(|e| e.route_key.clone());

        let evicted = store.put_at("/incoming".to_string(), module(), now);

        prop_assert_eq!(evicted, victim);
        prop_assert_eq!(store.len(), capacity);
        prop_assert!(store.peek("/incoming").is_some());
    }

    // Replacing an existing key never evicts anything.
    #[test]
    fn prop_replace_never_evicts(keys in prop::collection::vec(route_strategy(), 1..20)) {
        let mut store = CacheStore::new(keys.len(), TEST_TTL);
        for key in &keys {
            store.put_at(key.clone(), module(), 0);
        }
        let before = store.stats().evictions;

        for key in &keys {
            prop_assert!(store.put_at(key.clone(), module(), 1).is_none());
        }
        prop_assert_eq!(store.stats().evictions, before);
    }
}
