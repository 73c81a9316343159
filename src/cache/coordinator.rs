use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use dashmap::DashMap;
use futures::future::join_all;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::debug;

/// Live (real funds) vs paper (simulated) strategy execution. The two are
/// tracked under separate query groups and never cross-invalidated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Environment {
    #[default]
    Live,
    Paper,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MutationKind {
    Created,
    Stopped,
}

/// Semantic identifier of one cached view.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum QueryKey {
    ActiveStrategies(Environment),
    PortfolioOverview,
    RecentActivity,
}

/// Cached value plus bookkeeping. `generation` increments on every
/// successful refetch, so tests and callers can tell whether an entry was
/// touched.
#[derive(Debug, Clone, Default)]
pub struct QueryState {
    pub value: Option<Value>,
    pub generation: u64,
    pub invalidated: bool,
    pub refreshed_at: Option<DateTime<Utc>>,
}

/// Supplies fresh values for invalidated queries.
#[async_trait]
pub trait Refetcher: Send + Sync {
    async fn refetch(&self, key: QueryKey) -> Option<Value>;
}

pub struct QueryCacheCoordinator {
    entries: DashMap<QueryKey, QueryState>,
    refetcher: Arc<dyn Refetcher>,
}

impl QueryCacheCoordinator {
    pub fn new(refetcher: Arc<dyn Refetcher>) -> Self {
        Self {
            entries: DashMap::new(),
            refetcher,
        }
    }

    /// Seed a cached value, e.g. from an initial page load.
    pub fn prime(&self, key: QueryKey, value: Value) {
        self.entries.insert(
            key,
            QueryState {
                value: Some(value),
                generation: 0,
                invalidated: false,
                refreshed_at: Some(Utc::now()),
            },
        );
    }

    pub fn get(&self, key: QueryKey) -> Option<QueryState> {
        self.entries.get(&key).map(|entry| entry.clone())
    }

    /// Query groups affected by a strategy mutation in `environment`:
    /// that environment's active-strategies list, the portfolio overview
    /// aggregate, and the recent-activity feed. The opposite environment's
    /// strategies are deliberately excluded.
    fn affected_keys(environment: Environment) -> [QueryKey; 3] {
        [
            QueryKey::ActiveStrategies(environment),
            QueryKey::PortfolioOverview,
            QueryKey::RecentActivity,
        ]
    }

    /// Invalidate and eagerly refetch the affected query groups after a
    /// mutation resolved. Refetches run concurrently; invalidation happens
    /// strictly after the mutation's promise, with no timer workarounds.
    pub async fn on_strategy_mutated(&self, kind: MutationKind, environment: Environment) {
        let keys = Self::affected_keys(environment);
        debug!(
            "Strategy {:?} in {:?}: invalidating {} query groups",
            kind,
            environment,
            keys.len()
        );

        for key in keys {
            self.entries.entry(key).or_default().invalidated = true;
        }

        let refetches = keys.map(|key| {
            let refetcher = Arc::clone(&self.refetcher);
            async move { (key, refetcher.refetch(key).await) }
        });

        for (key, fresh) in join_all(refetches).await {
            let mut entry = self.entries.entry(key).or_default();
            // A failed refetch leaves the entry flagged stale; only a
            // successful one may clear the flag and bump the generation.
            if let Some(value) = fresh {
                entry.generation += 1;
                entry.invalidated = false;
                entry.refreshed_at = Some(Utc::now());
                entry.value = Some(value);
            }
        }
    }
}
