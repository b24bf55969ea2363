//! In-flight load table.

use std::collections::HashMap;

use futures::future::{BoxFuture, Shared};

use crate::cache::RouteKey;
use crate::error::Result;

/// One load, awaitable by any number of callers. Every caller observes the
/// same outcome.
pub type SharedLoad = Shared<BoxFuture<'static, Result<()>>>;

/// Routes currently being fetched.
#[derive(Default)]
pub struct InFlightLoads {
    loads: HashMap<RouteKey, SharedLoad>,
}

impl InFlightLoads {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, route: &str) -> Option<SharedLoad> {
        self.loads.get(route).cloned()
    }

    pub fn insert(&mut self, route: RouteKey, load: SharedLoad) {
        self.loads.insert(route, load);
    }

    pub fn remove(&mut self, route: &str) {
        self.loads.remove(route);
    }

    pub fn contains(&self, route: &str) -> bool {
        self.loads.contains_key(route)
    }

    pub fn len(&self) -> usize {
        self.loads.len()
    }

    pub fn is_empty(&self) -> bool {
        self.loads.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::FutureExt;

    #[tokio::test]
    async fn test_shared_load_outcome_seen_by_all() {
        let mut table = InFlightLoads::new();
        let load: SharedLoad = async { Ok(()) }.boxed().shared();
        table.insert("/a".to_string(), load);

        let first = table.get("/a").unwrap();
        let second = table.get("/a").unwrap();
        assert_eq!(first.await, Ok(()));
        assert_eq!(second.await, Ok(()));

        table.remove("/a");
        assert!(table.is_empty());
        assert!(!table.contains("/a"));
    }
}
