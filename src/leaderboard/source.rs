//! Upstream metric sources and raw-record normalization.
//!
//! Iteration 1 reads a frozen local snapshot; iterations 2 and 3 poll a
//! reporting endpoint. Raw fields arrive as whatever the upstream felt like
//! emitting (numbers as strings, blank timestamps, epoch-zero placeholders),
//! so numeric coercion is best-effort and never fails a record.

use std::marker::PhantomData;
use std::path::Path;

use async_trait::async_trait;
use chrono::DateTime;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer};
use tracing::warn;

use crate::errors::LeaderboardError;

use super::metrics::{It1Metric, It2Metric, It3Metric, RANK_UNASSIGNED};

/// Epoch-zero placeholder the iteration 2 reporting endpoint emits for
/// validators that never reported.
const EPOCH_ZERO_SENTINEL: &str = "1970-01-01 00:00:00+00:00";

/// Produces fresh, normalized, unranked records for one iteration.
#[async_trait]
pub trait MetricSource<M>: Send + Sync {
    async fn fetch(&self) -> Result<Vec<M>, LeaderboardError>;
}

// ---------------------------------------------------------------------------
// Raw record shapes
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
pub struct RawIt1Record {
    pub validator: String,
    #[serde(default, deserialize_with = "lenient_f64")]
    pub liveness: f64,
    #[serde(default, deserialize_with = "lenient_f64")]
    pub participation: f64,
    #[serde(default)]
    pub latest_reported_timestamp: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct RawIt2Record {
    pub validator: String,
    #[serde(default, deserialize_with = "lenient_f64")]
    pub liveness: f64,
    #[serde(default, deserialize_with = "lenient_f64")]
    pub participation: f64,
    #[serde(default, deserialize_with = "lenient_i64")]
    pub num_votes: i64,
    #[serde(default)]
    pub latest_reported_timestamp: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct RawIt3Record {
    pub owner_address: String,
    #[serde(default, deserialize_with = "lenient_f64")]
    pub liveness: f64,
    #[serde(default, deserialize_with = "lenient_f64")]
    pub rewards_growth: f64,
    #[serde(default, deserialize_with = "lenient_i64")]
    pub last_epoch: i64,
    #[serde(default)]
    pub last_epoch_performance: String,
    #[serde(default)]
    pub governance_voting_record: String,
}

impl From<RawIt1Record> for It1Metric {
    fn from(raw: RawIt1Record) -> Self {
        Self {
            rank: RANK_UNASSIGNED,
            validator: raw.validator,
            liveness: raw.liveness,
            participation: raw.participation,
            latest_reported_timestamp: normalize_timestamp(
                raw.latest_reported_timestamp.as_deref(),
                false,
            ),
        }
    }
}

impl From<RawIt2Record> for It2Metric {
    fn from(raw: RawIt2Record) -> Self {
        Self {
            rank: RANK_UNASSIGNED,
            validator: raw.validator,
            liveness: raw.liveness,
            participation: raw.participation,
            num_votes: raw.num_votes,
            // The it2 endpoint reports epoch zero instead of leaving the
            // field blank.
            latest_reported_timestamp: normalize_timestamp(
                raw.latest_reported_timestamp.as_deref(),
                true,
            ),
        }
    }
}

impl From<RawIt3Record> for It3Metric {
    fn from(raw: RawIt3Record) -> Self {
        Self {
            rank: RANK_UNASSIGNED,
            owner_address: raw.owner_address,
            liveness: raw.liveness,
            rewards_growth: raw.rewards_growth,
            last_epoch: raw.last_epoch,
            // Fraction strings pass through untouched; the comparator is
            // the only place that reads them as rationals.
            last_epoch_performance: raw.last_epoch_performance,
            governance_voting_record: raw.governance_voting_record,
        }
    }
}

// ---------------------------------------------------------------------------
// Normalization helpers
// ---------------------------------------------------------------------------

/// Accepts a JSON number or string; blank, absent or unparseable input
/// coerces to zero rather than failing the record.
fn lenient_f64<'de, D>(deserializer: D) -> Result<f64, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(
        match Option::<serde_json::Value>::deserialize(deserializer)? {
            Some(serde_json::Value::Number(n)) => n.as_f64().unwrap_or(0.0),
            Some(serde_json::Value::String(s)) => s.trim().parse().unwrap_or(0.0),
            _ => 0.0,
        },
    )
}

fn lenient_i64<'de, D>(deserializer: D) -> Result<i64, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(
        match Option::<serde_json::Value>::deserialize(deserializer)? {
            Some(serde_json::Value::Number(n)) => n
                .as_i64()
                .or_else(|| n.as_f64().map(|f| f as i64))
                .unwrap_or(0),
            Some(serde_json::Value::String(s)) => {
                let s = s.trim();
                s.parse::<i64>()
                    .ok()
                    .or_else(|| s.parse::<f64>().ok().map(|f| f as i64))
                    .unwrap_or(0)
            }
            _ => 0,
        },
    )
}

/// Blank (and, where the upstream uses it, epoch-zero) timestamps mean the
/// validator never reported. Anything else parses to f64 seconds since
/// epoch with sub-second precision; an unparseable value is isolated to
/// this record rather than failing the refresh.
fn normalize_timestamp(raw: Option<&str>, drop_epoch_zero: bool) -> Option<f64> {
    let raw = raw?.trim();
    if raw.is_empty() {
        return None;
    }
    if drop_epoch_zero && raw == EPOCH_ZERO_SENTINEL {
        return None;
    }
    match parse_datetime(raw) {
        Some(seconds) => Some(seconds),
        None => {
            warn!(value = raw, "unparseable timestamp, treating as unreported");
            None
        }
    }
}

fn parse_datetime(raw: &str) -> Option<f64> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.timestamp_micros() as f64 / 1_000_000.0);
    }
    // The reporting endpoints also emit "2022-05-20 07:00:05.123+00:00".
    if let Ok(dt) = DateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S%.f%:z") {
        return Some(dt.timestamp_micros() as f64 / 1_000_000.0);
    }
    None
}

// ---------------------------------------------------------------------------
// Sources
// ---------------------------------------------------------------------------

/// Local JSON snapshot, parsed once at startup and treated as authoritative
/// and unchanging (iteration 1's final results file).
pub struct SnapshotSource<M> {
    metrics: Vec<M>,
}

impl<M> SnapshotSource<M> {
    pub fn from_file<R>(path: &Path) -> Result<Self, LeaderboardError>
    where
        R: DeserializeOwned,
        M: From<R>,
    {
        let body = std::fs::read_to_string(path).map_err(|e| {
            LeaderboardError::SourceUnavailable(format!("read {}: {e}", path.display()))
        })?;
        Self::from_json::<R>(&body)
    }

    pub fn from_json<R>(body: &str) -> Result<Self, LeaderboardError>
    where
        R: DeserializeOwned,
        M: From<R>,
    {
        let raw: Vec<R> = serde_json::from_str(body)
            .map_err(|e| LeaderboardError::MalformedPayload(format!("snapshot: {e}")))?;
        Ok(Self {
            metrics: raw.into_iter().map(M::from).collect(),
        })
    }
}

#[async_trait]
impl<M: Clone + Send + Sync> MetricSource<M> for SnapshotSource<M> {
    async fn fetch(&self) -> Result<Vec<M>, LeaderboardError> {
        // Fresh clones per refresh; the parsed template is never ranked.
        Ok(self.metrics.clone())
    }
}

/// Remote JSON endpoint polled on every refresh (iterations 2 and 3).
pub struct RemoteSource<R, M> {
    client: reqwest::Client,
    url: String,
    _raw: PhantomData<fn(R) -> M>,
}

impl<R, M> RemoteSource<R, M> {
    pub fn new(client: reqwest::Client, url: String) -> Self {
        Self {
            client,
            url,
            _raw: PhantomData,
        }
    }
}

#[async_trait]
impl<R, M> MetricSource<M> for RemoteSource<R, M>
where
    R: DeserializeOwned + Send + Sync,
    M: From<R> + Send + Sync,
{
    async fn fetch(&self) -> Result<Vec<M>, LeaderboardError> {
        let response = self.client.get(&self.url).send().await.map_err(|e| {
            LeaderboardError::SourceUnavailable(format!("GET {}: {e}", self.url))
        })?;

        let status = response.status();
        if !status.is_success() {
            return Err(LeaderboardError::SourceUnavailable(format!(
                "GET {} returned {status}",
                self.url
            )));
        }

        let raw: Vec<R> = response.json().await.map_err(|e| {
            LeaderboardError::MalformedPayload(format!("GET {}: {e}", self.url))
        })?;

        Ok(raw.into_iter().map(M::from).collect())
    }
}

/// Stand-in for an iteration with no configured source; answers 503 for
/// that iteration only and keeps the rest of the process serving.
pub struct DisabledSource {
    reason: String,
}

impl DisabledSource {
    pub fn new(reason: impl Into<String>) -> Self {
        Self {
            reason: reason.into(),
        }
    }
}

#[async_trait]
impl<M: Send + Sync + 'static> MetricSource<M> for DisabledSource {
    async fn fetch(&self) -> Result<Vec<M>, LeaderboardError> {
        Err(LeaderboardError::SourceUnavailable(self.reason.clone()))
    }
}
