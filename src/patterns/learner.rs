//! Navigation pattern learner.
//!
//! A sparse first-order transition table: counts of observed `from -> to`
//! navigations, turned into conditional probabilities on demand.

use std::collections::HashMap;

use tracing::{debug, info, warn};

use crate::cache::RouteKey;
use crate::patterns::{PatternStore, Prediction, TransitionRecord};

#[derive(Debug, Clone, Copy)]
struct Transition {
    count: u64,
    /// Sequence number of the last update, for pruning ties
    last_seq: u64,
}

// == Pattern Learner ==
/// Learns which route tends to follow which.
///
/// Purely in-memory; persisting `records()` is the owner's job.
pub struct PatternLearner {
    transitions: HashMap<RouteKey, HashMap<RouteKey, Transition>>,
    record_count: usize,
    cap: usize,
    seq: u64,
}

impl PatternLearner {
    /// Creates a learner with an empty table.
    pub fn new(cap: usize) -> Self {
        Self {
            transitions: HashMap::new(),
            record_count: 0,
            cap,
            seq: 0,
        }
    }

    // == Load ==
    /// Creates a learner seeded from `store`.
    ///
    /// An unreadable or corrupt store yields an empty model; startup never
    /// fails because of it. Invalid records are skipped and duplicates merged.
    pub fn load(store: &dyn PatternStore, cap: usize) -> Self {
        let mut learner = Self::new(cap);

        let records = match store.read() {
            Ok(records) => records,
            Err(e) => {
                warn!("Starting with no navigation patterns: {}", e);
                return learner;
            }
        };

        let mut skipped = 0usize;
        for record in records {
            if !record.is_valid() || record.from == record.to {
                skipped += 1;
                continue;
            }
            learner.add(record.from, record.to, record.count);
        }
        learner.prune();

        info!(
            "Loaded {} navigation patterns ({} skipped)",
            learner.record_count, skipped
        );
        learner
    }

    // == Record ==
    /// Counts one navigation and prunes to the cap.
    ///
    /// Self-transitions and empty keys are ignored. Returns whether the
    /// transition was counted.
    pub fn record(&mut self, from: &str, to: &str) -> bool {
        if from.is_empty() || to.is_empty() || from == to {
            return false;
        }

        self.add(from.to_string(), to.to_string(), 1);
        self.prune();
        true
    }

    fn add(&mut self, from: RouteKey, to: RouteKey, count: u64) {
        self.seq += 1;
        let seq = self.seq;
        let destinations = self.transitions.entry(from).or_default();
        match destinations.get_mut(&to) {
            Some(transition) => {
                transition.count = transition.count.saturating_add(count);
                transition.last_seq = seq;
            }
            None => {
                destinations.insert(
                    to,
                    Transition {
                        count,
                        last_seq: seq,
                    },
                );
                self.record_count += 1;
            }
        }
    }

    // == Prune ==
    /// Drops the lowest-count transitions until the table fits the cap.
    /// Among equal counts the least recently updated goes first.
    fn prune(&mut self) {
        while self.record_count > self.cap {
            let victim = self
                .transitions
                .iter()
                .flat_map(|(from, destinations)| {
                    destinations
                        .iter()
                        .map(move |(to, t)| ((t.count, t.last_seq), from, to))
                })
                .min_by_key(|(rank, _, _)| *rank)
                .map(|(_, from, to)| (from.clone(), to.clone()));

            let Some((from, to)) = victim else { break };

            if let Some(destinations) = self.transitions.get_mut(&from) {
                destinations.remove(&to);
                if destinations.is_empty() {
                    self.transitions.remove(&from);
                }
            }
            self.record_count -= 1;
            debug!(from = %from, to = %to, "pruned navigation pattern");
        }
    }

    // == Predict ==
    /// Ranks the routes that followed `from`.
    ///
    /// `probability(to | from) = count(from -> to) / sum(count(from -> *))`.
    /// Only candidates at or above `threshold` are kept, highest first
    /// (ties by route key), truncated to `max`. Unknown `from` gives an
    /// empty list.
    pub fn predict(&self, from: &str, threshold: f64, max: usize) -> Vec<Prediction> {
        let Some(destinations) = self.transitions.get(from) else {
            return Vec::new();
        };

        let total: u64 = destinations.values().map(|t| t.count).sum();
        if total == 0 {
            return Vec::new();
        }

        let mut predictions: Vec<Prediction> = destinations
            .iter()
            .map(|(to, t)| Prediction {
                route: to.clone(),
                probability: t.count as f64 / total as f64,
            })
            .filter(|p| p.probability >= threshold)
            .collect();

        predictions.sort_by(|a, b| {
            b.probability
                .total_cmp(&a.probability)
                .then_with(|| a.route.cmp(&b.route))
        });
        predictions.truncate(max);
        predictions
    }

    /// Count for a single transition, zero when never seen.
    pub fn count(&self, from: &str, to: &str) -> u64 {
        self.transitions
            .get(from)
            .and_then(|d| d.get(to))
            .map_or(0, |t| t.count)
    }

    // == Records ==
    /// The table in persisted form, highest count first.
    pub fn records(&self) -> Vec<TransitionRecord> {
        let mut records: Vec<TransitionRecord> = self
            .transitions
            .iter()
            .flat_map(|(from, destinations)| {
                destinations
                    .iter()
                    .map(move |(to, t)| TransitionRecord::new(from.clone(), to.clone(), t.count))
            })
            .collect();

        records.sort_by(|a, b| {
            b.count
                .cmp(&a.count)
                .then_with(|| a.from.cmp(&b.from))
                .then_with(|| a.to.cmp(&b.to))
        });
        records
    }

    /// Number of distinct transitions.
    pub fn len(&self) -> usize {
        self.record_count
    }

    pub fn is_empty(&self) -> bool {
        self.record_count == 0
    }
}

impl std::fmt::Debug for PatternLearner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PatternLearner")
            .field("record_count", &self.record_count)
            .field("cap", &self.cap)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{PreloadError, Result};
    use crate::patterns::MemoryPatternStore;

    struct BrokenStore;

    impl PatternStore for BrokenStore {
        fn read(&self) -> Result<Vec<TransitionRecord>> {
            Err(PreloadError::Persistence("disk on fire".into()))
        }

        fn write(&self, _records: &[TransitionRecord]) -> Result<()> {
            Err(PreloadError::Persistence("disk on fire".into()))
        }
    }

    fn learner(cap: usize) -> PatternLearner {
        PatternLearner::new(cap)
    }

    fn record_times(learner: &mut PatternLearner, from: &str, to: &str, times: usize) {
        for _ in 0..times {
            learner.record(from, to);
        }
    }

    #[test]
    fn test_predict_conditional_probability() {
        let mut learner = learner(100);
        record_times(&mut learner, "/a", "/b", 7);
        record_times(&mut learner, "/a", "/c", 3);

        let predictions = learner.predict("/a", 0.30, 3);
        assert_eq!(predictions.len(), 2);
        assert_eq!(predictions[0].route, "/b");
        assert!((predictions[0].probability - 0.7).abs() < 1e-9);
        assert_eq!(predictions[1].route, "/c");
        assert!((predictions[1].probability - 0.3).abs() < 1e-9);

        let strict = learner.predict("/a", 0.5, 3);
        assert_eq!(strict.len(), 1);
        assert_eq!(strict[0].route, "/b");
    }

    #[test]
    fn test_predict_truncates_to_max() {
        let mut learner = learner(100);
        for to in ["/b", "/c", "/d", "/e"] {
            learner.record("/a", to);
        }

        let predictions = learner.predict("/a", 0.0, 3);
        assert_eq!(predictions.len(), 3);
        // Equal probabilities fall back to key order
        let routes: Vec<_> = predictions.iter().map(|p| p.route.as_str()).collect();
        assert_eq!(routes, vec!["/b", "/c", "/d"]);
    }

    #[test]
    fn test_predict_unknown_route_is_empty() {
        let learner = learner(100);
        assert!(learner.predict("/never-seen", 0.3, 3).is_empty());
    }

    #[test]
    fn test_self_and_empty_transitions_ignored() {
        let mut learner = learner(100);
        assert!(!learner.record("/a", "/a"));
        assert!(!learner.record("", "/a"));
        assert!(!learner.record("/a", ""));
        assert!(learner.is_empty());
        assert!(learner.records().is_empty());
    }

    #[test]
    fn test_records_sorted_by_count() {
        let mut learner = learner(100);
        learner.record("/dashboard", "/users");
        learner.record("/", "/dashboard");
        learner.record("/", "/dashboard");

        assert_eq!(
            learner.records(),
            vec![
                TransitionRecord::new("/", "/dashboard", 2),
                TransitionRecord::new("/dashboard", "/users", 1),
            ]
        );
    }

    #[test]
    fn test_cap_prunes_lowest_count() {
        let mut learner = learner(3);
        record_times(&mut learner, "/a", "/b", 5);
        record_times(&mut learner, "/a", "/c", 2);
        record_times(&mut learner, "/b", "/c", 4);

        learner.record("/c", "/a");
        assert_eq!(learner.len(), 3);
        // Count outranks recency: the newcomer holds the lowest count
        assert_eq!(learner.count("/c", "/a"), 0);
        assert_eq!(learner.count("/a", "/c"), 2);
    }

    #[test]
    fn test_cap_ties_prune_least_recent() {
        let mut learner = learner(2);
        learner.record("/a", "/b");
        learner.record("/b", "/c");
        learner.record("/c", "/d");

        assert_eq!(learner.len(), 2);
        assert_eq!(learner.count("/a", "/b"), 0, "oldest count-1 record pruned");
        assert_eq!(learner.count("/b", "/c"), 1);
        assert_eq!(learner.count("/c", "/d"), 1);
    }

    #[test]
    fn test_load_restores_table() {
        let store = MemoryPatternStore::with_records(vec![
            TransitionRecord::new("/a", "/b", 7),
            TransitionRecord::new("/a", "/c", 3),
        ]);
        let learner = PatternLearner::load(&store, 100);

        assert_eq!(learner.len(), 2);
        assert_eq!(learner.predict("/a", 0.3, 3).len(), 2);
    }

    #[test]
    fn test_load_sanitizes_records() {
        let store = MemoryPatternStore::with_records(vec![
            TransitionRecord::new("/a", "/b", 2),
            TransitionRecord::new("/a", "/b", 3),
            TransitionRecord::new("/a", "/a", 9),
            TransitionRecord::new("/a", "/c", 0),
            TransitionRecord::new("", "/c", 4),
        ]);
        let learner = PatternLearner::load(&store, 100);

        assert_eq!(learner.len(), 1);
        assert_eq!(learner.count("/a", "/b"), 5);
    }

    #[test]
    fn test_load_enforces_cap() {
        let records = (0..10)
            .map(|i| TransitionRecord::new("/a", format!("/r{}", i), 10 - i))
            .collect();
        let store = MemoryPatternStore::with_records(records);
        let learner = PatternLearner::load(&store, 4);

        assert_eq!(learner.len(), 4);
        assert_eq!(learner.count("/a", "/r0"), 10);
        assert_eq!(learner.count("/a", "/r9"), 0);
    }

    #[test]
    fn test_broken_store_degrades_gracefully() {
        let mut learner = PatternLearner::load(&BrokenStore, 100);
        assert!(learner.is_empty());
        assert!(learner.predict("/anything", 0.0, 3).is_empty());

        assert!(learner.record("/a", "/b"));
        assert_eq!(learner.count("/a", "/b"), 1);
    }
}
