//! Typed metric records for the three leaderboard iterations.
//!
//! Each iteration ran with its own schema, so each gets its own record type
//! and its own column enum. The column enum doubles as the comparator's
//! typed accessor key and as the display-sort whitelist: a column name that
//! doesn't parse is simply not sortable.

use serde::Serialize;

/// Rank value before the default sort has assigned one.
pub const RANK_UNASSIGNED: i64 = -1;

/// Sort direction for a single column.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Ascending,
    Descending,
}

impl Direction {
    #[inline]
    pub fn factor(self) -> f64 {
        match self {
            Direction::Ascending => 1.0,
            Direction::Descending => -1.0,
        }
    }
}

/// What the comparator sees for one column of one record.
#[derive(Debug, Clone, Copy)]
pub enum SortValue<'a> {
    /// The field is unset for this record; sorts below every present value.
    Missing,
    Number(f64),
    /// Raw string, possibly an `"n/d"` fraction; interpreted by the
    /// comparator, never at normalization time.
    Text(&'a str),
}

/// A metric record with a typed column key and an assigned-once rank.
///
/// `rank` is written exactly once, by [`crate::leaderboard::sort::assign_ranks`]
/// right after the default sort during a cache refresh. Display re-sorts
/// reorder copies of the records and leave it alone.
pub trait RankedMetric: Clone + Send + Sync + 'static {
    type Column: Copy + Eq + Send + Sync + 'static;

    /// Fixed ordering used to assign ranks on every refresh.
    fn default_sort() -> &'static [(Self::Column, Direction)];

    /// Columns a caller may sort by for display, in display order.
    fn display_columns() -> &'static [Self::Column];

    /// Parse a caller-supplied column name; `None` for anything not
    /// whitelisted.
    fn parse_column(name: &str) -> Option<Self::Column>;

    fn column_name(column: Self::Column) -> &'static str;

    fn sort_value(&self, column: Self::Column) -> SortValue<'_>;

    fn rank(&self) -> i64;
    fn set_rank(&mut self, rank: i64);
}

/// Iteration 1: the genesis competition. Liveness/participation metrics
/// from a frozen snapshot file.
#[derive(Debug, Clone, Serialize)]
pub struct It1Metric {
    pub rank: i64,
    pub validator: String,
    pub liveness: f64,
    pub participation: f64,
    /// Seconds since epoch; `None` when the validator never reported.
    pub latest_reported_timestamp: Option<f64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum It1Column {
    Rank,
    Liveness,
    Participation,
    LatestReportedTimestamp,
}

impl RankedMetric for It1Metric {
    type Column = It1Column;

    fn default_sort() -> &'static [(It1Column, Direction)] {
        &[
            (It1Column::Participation, Direction::Descending),
            (It1Column::Liveness, Direction::Descending),
            (It1Column::LatestReportedTimestamp, Direction::Descending),
        ]
    }

    fn display_columns() -> &'static [It1Column] {
        &[
            It1Column::Rank,
            It1Column::Liveness,
            It1Column::Participation,
            It1Column::LatestReportedTimestamp,
        ]
    }

    fn parse_column(name: &str) -> Option<It1Column> {
        match name {
            "rank" => Some(It1Column::Rank),
            "liveness" => Some(It1Column::Liveness),
            "participation" => Some(It1Column::Participation),
            "latest_reported_timestamp" => Some(It1Column::LatestReportedTimestamp),
            _ => None,
        }
    }

    fn column_name(column: It1Column) -> &'static str {
        match column {
            It1Column::Rank => "rank",
            It1Column::Liveness => "liveness",
            It1Column::Participation => "participation",
            It1Column::LatestReportedTimestamp => "latest_reported_timestamp",
        }
    }

    fn sort_value(&self, column: It1Column) -> SortValue<'_> {
        match column {
            It1Column::Rank => SortValue::Number(self.rank as f64),
            It1Column::Liveness => SortValue::Number(self.liveness),
            It1Column::Participation => SortValue::Number(self.participation),
            It1Column::LatestReportedTimestamp => match self.latest_reported_timestamp {
                Some(ts) => SortValue::Number(ts),
                None => SortValue::Missing,
            },
        }
    }

    fn rank(&self) -> i64 {
        self.rank
    }

    fn set_rank(&mut self, rank: i64) {
        self.rank = rank;
    }
}

/// Iteration 2: adds governance vote counts on top of the iteration 1
/// metrics; pulled live from the reporting endpoint.
#[derive(Debug, Clone, Serialize)]
pub struct It2Metric {
    pub rank: i64,
    pub validator: String,
    pub liveness: f64,
    pub participation: f64,
    pub num_votes: i64,
    pub latest_reported_timestamp: Option<f64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum It2Column {
    Rank,
    Liveness,
    Participation,
    NumVotes,
    LatestReportedTimestamp,
}

impl RankedMetric for It2Metric {
    type Column = It2Column;

    fn default_sort() -> &'static [(It2Column, Direction)] {
        &[
            (It2Column::NumVotes, Direction::Descending),
            (It2Column::Participation, Direction::Descending),
            (It2Column::Liveness, Direction::Descending),
            (It2Column::LatestReportedTimestamp, Direction::Descending),
        ]
    }

    fn display_columns() -> &'static [It2Column] {
        &[
            It2Column::Rank,
            It2Column::Liveness,
            It2Column::Participation,
            It2Column::NumVotes,
            It2Column::LatestReportedTimestamp,
        ]
    }

    fn parse_column(name: &str) -> Option<It2Column> {
        match name {
            "rank" => Some(It2Column::Rank),
            "liveness" => Some(It2Column::Liveness),
            "participation" => Some(It2Column::Participation),
            "num_votes" => Some(It2Column::NumVotes),
            "latest_reported_timestamp" => Some(It2Column::LatestReportedTimestamp),
            _ => None,
        }
    }

    fn column_name(column: It2Column) -> &'static str {
        match column {
            It2Column::Rank => "rank",
            It2Column::Liveness => "liveness",
            It2Column::Participation => "participation",
            It2Column::NumVotes => "num_votes",
            It2Column::LatestReportedTimestamp => "latest_reported_timestamp",
        }
    }

    fn sort_value(&self, column: It2Column) -> SortValue<'_> {
        match column {
            It2Column::Rank => SortValue::Number(self.rank as f64),
            It2Column::Liveness => SortValue::Number(self.liveness),
            It2Column::Participation => SortValue::Number(self.participation),
            It2Column::NumVotes => SortValue::Number(self.num_votes as f64),
            It2Column::LatestReportedTimestamp => match self.latest_reported_timestamp {
                Some(ts) => SortValue::Number(ts),
                None => SortValue::Missing,
            },
        }
    }

    fn rank(&self) -> i64 {
        self.rank
    }

    fn set_rank(&mut self, rank: i64) {
        self.rank = rank;
    }
}

/// Iteration 3: rewards-based scoring keyed by owner address. Performance
/// and voting record arrive as `"n/d"` strings and stay strings; only the
/// comparator reads them as fractions.
#[derive(Debug, Clone, Serialize)]
pub struct It3Metric {
    pub rank: i64,
    pub owner_address: String,
    pub liveness: f64,
    pub rewards_growth: f64,
    pub last_epoch: i64,
    pub last_epoch_performance: String,
    pub governance_voting_record: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum It3Column {
    Rank,
    Liveness,
    RewardsGrowth,
    LastEpoch,
    LastEpochPerformance,
    GovernanceVotingRecord,
}

impl RankedMetric for It3Metric {
    type Column = It3Column;

    fn default_sort() -> &'static [(It3Column, Direction)] {
        &[
            (It3Column::RewardsGrowth, Direction::Descending),
            (It3Column::Liveness, Direction::Descending),
            (It3Column::LastEpochPerformance, Direction::Descending),
        ]
    }

    fn display_columns() -> &'static [It3Column] {
        &[
            It3Column::Rank,
            It3Column::Liveness,
            It3Column::RewardsGrowth,
            It3Column::LastEpoch,
            It3Column::LastEpochPerformance,
            It3Column::GovernanceVotingRecord,
        ]
    }

    fn parse_column(name: &str) -> Option<It3Column> {
        match name {
            "rank" => Some(It3Column::Rank),
            "liveness" => Some(It3Column::Liveness),
            "rewards_growth" => Some(It3Column::RewardsGrowth),
            "last_epoch" => Some(It3Column::LastEpoch),
            "last_epoch_performance" => Some(It3Column::LastEpochPerformance),
            "governance_voting_record" => Some(It3Column::GovernanceVotingRecord),
            _ => None,
        }
    }

    fn column_name(column: It3Column) -> &'static str {
        match column {
            It3Column::Rank => "rank",
            It3Column::Liveness => "liveness",
            It3Column::RewardsGrowth => "rewards_growth",
            It3Column::LastEpoch => "last_epoch",
            It3Column::LastEpochPerformance => "last_epoch_performance",
            It3Column::GovernanceVotingRecord => "governance_voting_record",
        }
    }

    fn sort_value(&self, column: It3Column) -> SortValue<'_> {
        match column {
            It3Column::Rank => SortValue::Number(self.rank as f64),
            It3Column::Liveness => SortValue::Number(self.liveness),
            It3Column::RewardsGrowth => SortValue::Number(self.rewards_growth),
            It3Column::LastEpoch => SortValue::Number(self.last_epoch as f64),
            It3Column::LastEpochPerformance => SortValue::Text(&self.last_epoch_performance),
            It3Column::GovernanceVotingRecord => SortValue::Text(&self.governance_voting_record),
        }
    }

    fn rank(&self) -> i64 {
        self.rank
    }

    fn set_rank(&mut self, rank: i64) {
        self.rank = rank;
    }
}
