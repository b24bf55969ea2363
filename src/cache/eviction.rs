//! Eviction Module
//!
//! Chooses which cached route to drop when the store is full.

use std::cmp::Ordering;
use std::collections::HashMap;

use crate::cache::CacheEntry;

// == Select Victim ==
/// Returns the key with the lowest eviction score at `now`.
///
/// Ties go to the entry loaded first, then to the smaller key so the choice
/// is deterministic. `exclude` is never chosen.
pub fn select_victim<'a>(
    entries: &'a HashMap<String, CacheEntry>,
    now: u64,
    exclude: Option<&str>,
) -> Option<&'a str> {
    entries
        .iter()
        .filter(|(key, _)| Some(key.as_str()) != exclude)
        .min_by(|(ka, a), (kb, b)| compare_for_eviction(ka, a, kb, b, now))
        .map(|(key, _)| key.as_str())
}

fn compare_for_eviction(
    key_a: &str,
    a: &CacheEntry,
    key_b: &str,
    b: &CacheEntry,
    now: u64,
) -> Ordering {
    a.eviction_score(now)
        .total_cmp(&b.eviction_score(now))
        .then_with(|| a.loaded_at.cmp(&b.loaded_at))
        .then_with(|| key_a.cmp(key_b))
}
