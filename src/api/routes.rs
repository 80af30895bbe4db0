//! Leaderboard API routes.
//!
//! One endpoint per iteration. `?sort=` re-orders a copy of the cached list
//! for display; assigned ranks never change. Unknown sort columns are
//! dropped, not rejected, so stale frontend links keep working.

use std::sync::Arc;

use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::Json,
    routing::get,
    Router,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::warn;

use crate::leaderboard::{
    cache::Leaderboard,
    metrics::{It1Metric, It2Metric, It3Metric},
    sort::{sort_metrics, SortSpec},
    Direction, RankedMetric,
};

/// Application state shared across all request handlers.
#[derive(Clone)]
pub struct AppState {
    pub it1: Arc<Leaderboard<It1Metric>>,
    pub it2: Arc<Leaderboard<It2Metric>>,
    pub it3: Arc<Leaderboard<It3Metric>>,
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health_check))
        .route("/api/leaderboard/it1", get(get_it1))
        .route("/api/leaderboard/it2", get(get_it2))
        .route("/api/leaderboard/it3", get(get_it3))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

#[derive(Debug, Deserialize)]
pub struct SortQuery {
    /// Comma-separated column names; prefix with '-' for descending.
    pub sort: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct LeaderboardResponse<M> {
    pub metrics: Vec<M>,
    pub last_updated: DateTime<Utc>,
    /// Columns the caller may sort by, for the rendering layer.
    pub sort_columns: Vec<&'static str>,
}

pub async fn get_it1(
    State(state): State<AppState>,
    Query(params): Query<SortQuery>,
) -> Result<Json<LeaderboardResponse<It1Metric>>, StatusCode> {
    leaderboard_response(&state.it1, &params).await
}

pub async fn get_it2(
    State(state): State<AppState>,
    Query(params): Query<SortQuery>,
) -> Result<Json<LeaderboardResponse<It2Metric>>, StatusCode> {
    leaderboard_response(&state.it2, &params).await
}

pub async fn get_it3(
    State(state): State<AppState>,
    Query(params): Query<SortQuery>,
) -> Result<Json<LeaderboardResponse<It3Metric>>, StatusCode> {
    leaderboard_response(&state.it3, &params).await
}

async fn health_check() -> &'static str {
    "leaderboard backend operational"
}

async fn leaderboard_response<M>(
    board: &Leaderboard<M>,
    params: &SortQuery,
) -> Result<Json<LeaderboardResponse<M>>, StatusCode>
where
    M: RankedMetric + Serialize,
{
    let snapshot = board.get(Utc::now()).await.map_err(|e| {
        warn!(leaderboard = board.name(), error = %e, "leaderboard unavailable");
        StatusCode::SERVICE_UNAVAILABLE
    })?;

    // Display sorting operates on a copy; the canonical ranked list in the
    // cache is never reordered.
    let mut metrics = snapshot.metrics.clone();
    let spec = params
        .sort
        .as_deref()
        .map(parse_sort::<M>)
        .unwrap_or_default();
    if !spec.is_empty() {
        sort_metrics(&mut metrics, &spec);
    }

    Ok(Json(LeaderboardResponse {
        metrics,
        last_updated: snapshot.computed_at,
        sort_columns: M::display_columns()
            .iter()
            .map(|&c| M::column_name(c))
            .collect(),
    }))
}

/// Parse `?sort=col1,-col2` into a validated spec. Columns outside the
/// iteration's whitelist are silently dropped.
fn parse_sort<M: RankedMetric>(raw: &str) -> SortSpec<M::Column> {
    raw.split(',')
        .filter_map(|token| {
            let token = token.trim();
            let (name, direction) = match token.strip_prefix('-') {
                Some(name) => (name, Direction::Descending),
                None => (token, Direction::Ascending),
            };
            M::parse_column(name).map(|column| (column, direction))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::leaderboard::metrics::It2Column;

    #[test]
    fn test_parse_sort_directions() {
        let spec = parse_sort::<It2Metric>("num_votes,-liveness");
        assert_eq!(
            spec,
            vec![
                (It2Column::NumVotes, Direction::Ascending),
                (It2Column::Liveness, Direction::Descending),
            ]
        );
    }

    #[test]
    fn test_parse_sort_drops_unknown_columns() {
        let spec = parse_sort::<It2Metric>("validator,-num_votes,'; drop table--");
        assert_eq!(spec, vec![(It2Column::NumVotes, Direction::Descending)]);
    }

    #[test]
    fn test_parse_sort_of_garbage_is_empty() {
        assert!(parse_sort::<It1Metric>("").is_empty());
        assert!(parse_sort::<It1Metric>(",,").is_empty());
        assert!(parse_sort::<It1Metric>("num_votes").is_empty());
    }
}
