//! Fetch-or-compute snapshot cache, one instance per iteration.
//!
//! A snapshot is a fully ranked metric list plus its computation time.
//! Readers always get the last fully written snapshot without blocking on
//! an in-flight refresh; refreshes are serialized per iteration so an
//! expired entry triggers exactly one upstream fetch no matter how many
//! callers race it.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use tokio::sync::Mutex;
use tracing::{info, warn};

use crate::errors::LeaderboardError;

use super::metrics::RankedMetric;
use super::sort::{assign_ranks, sort_metrics};
use super::source::MetricSource;

/// How long a computed leaderboard stays servable before the next access
/// recomputes it.
pub const CACHE_TTL_SECONDS: i64 = 60;

/// One fully computed, ranked leaderboard.
pub struct Snapshot<M> {
    pub metrics: Vec<M>,
    pub computed_at: DateTime<Utc>,
}

pub struct Leaderboard<M: RankedMetric> {
    name: &'static str,
    source: Box<dyn MetricSource<M>>,
    /// Last fully written snapshot. Swapped whole, never mutated in place.
    snapshot: RwLock<Option<Arc<Snapshot<M>>>>,
    /// Serializes refreshes. Readers never touch this lock.
    refresh: Mutex<()>,
}

impl<M: RankedMetric> Leaderboard<M> {
    pub fn new(name: &'static str, source: Box<dyn MetricSource<M>>) -> Self {
        Self {
            name,
            source,
            snapshot: RwLock::new(None),
            refresh: Mutex::new(()),
        }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    /// The cached snapshot if still fresh at `now`, otherwise the result of
    /// a refresh through the source.
    ///
    /// Callers that lose the refresh race wait on the guard and reuse the
    /// winner's snapshot. A failed refresh falls back to the previous
    /// snapshot when one exists; only a cold cache surfaces the error.
    pub async fn get(&self, now: DateTime<Utc>) -> Result<Arc<Snapshot<M>>, LeaderboardError> {
        if let Some(snapshot) = self.fresh_snapshot(now) {
            return Ok(snapshot);
        }

        let _guard = self.refresh.lock().await;
        // Re-check: another caller may have refreshed while we waited.
        if let Some(snapshot) = self.fresh_snapshot(now) {
            return Ok(snapshot);
        }

        match self.refresh_snapshot(now).await {
            Ok(snapshot) => Ok(snapshot),
            Err(e) => {
                let stale = self.snapshot.read().clone();
                match stale {
                    Some(snapshot) => {
                        warn!(
                            leaderboard = self.name,
                            error = %e,
                            "refresh failed, serving stale snapshot"
                        );
                        Ok(snapshot)
                    }
                    None => Err(e),
                }
            }
        }
    }

    fn fresh_snapshot(&self, now: DateTime<Utc>) -> Option<Arc<Snapshot<M>>> {
        self.snapshot
            .read()
            .as_ref()
            .filter(|s| (now - s.computed_at).num_seconds() < CACHE_TTL_SECONDS)
            .cloned()
    }

    async fn refresh_snapshot(
        &self,
        now: DateTime<Utc>,
    ) -> Result<Arc<Snapshot<M>>, LeaderboardError> {
        let mut metrics = self.source.fetch().await?;
        sort_metrics(&mut metrics, M::default_sort());
        assign_ranks(&mut metrics);

        info!(
            leaderboard = self.name,
            records = metrics.len(),
            "leaderboard recomputed"
        );

        let snapshot = Arc::new(Snapshot {
            metrics,
            computed_at: now,
        });
        *self.snapshot.write() = Some(snapshot.clone());
        Ok(snapshot)
    }
}
