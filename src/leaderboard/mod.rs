pub mod cache;
pub mod metrics;
pub mod sort;
pub mod source;

pub use cache::{Leaderboard, Snapshot, CACHE_TTL_SECONDS};
pub use metrics::{Direction, RankedMetric, SortValue};
pub use sort::{assign_ranks, sort_metrics, SortSpec};
