//! Transition records and predictions.

use serde::{Deserialize, Serialize};

use crate::cache::RouteKey;

/// Observed navigation count from one route to another.
///
/// This is also the persisted form: the pattern store holds an array of
/// `{from, to, count}` objects.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransitionRecord {
    pub from: RouteKey,
    pub to: RouteKey,
    pub count: u64,
}

impl TransitionRecord {
    pub fn new(from: impl Into<RouteKey>, to: impl Into<RouteKey>, count: u64) -> Self {
        Self {
            from: from.into(),
            to: to.into(),
            count,
        }
    }

    /// Records loaded from storage must name two routes and carry a count.
    pub fn is_valid(&self) -> bool {
        self.count > 0 && !self.from.is_empty() && !self.to.is_empty()
    }
}

/// A predicted next route with its conditional probability.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Prediction {
    pub route: RouteKey,
    pub probability: f64,
}
