//! Composite sort and rank assignment.
//!
//! Every (column, direction) key folds to one f64 scalar per record, and the
//! keys compare in spec order: earlier keys dominate, later keys break ties.
//! The sort is stable, so ranks are reproducible across refreshes when the
//! upstream data hasn't changed.

use std::cmp::Ordering;

use tracing::warn;

use super::metrics::{Direction, RankedMetric, SortValue};

/// Ordered (column, direction) pairs; earlier pairs dominate.
pub type SortSpec<C> = Vec<(C, Direction)>;

/// Stable in-place sort by the composite spec. An empty spec is a no-op.
pub fn sort_metrics<M: RankedMetric>(metrics: &mut [M], spec: &[(M::Column, Direction)]) {
    if spec.is_empty() {
        return;
    }
    metrics.sort_by(|a, b| {
        for &(column, direction) in spec {
            let ka = scalar_key(a, column, direction);
            let kb = scalar_key(b, column, direction);
            match ka.total_cmp(&kb) {
                Ordering::Equal => continue,
                other => return other,
            }
        }
        Ordering::Equal
    });
}

/// Dense 1-based ranks in the current order of `metrics`.
///
/// Called exactly once per refresh, right after the default sort. Display
/// re-sorts must not call this.
pub fn assign_ranks<M: RankedMetric>(metrics: &mut [M]) {
    for (i, metric) in metrics.iter_mut().enumerate() {
        metric.set_rank(i as i64 + 1);
    }
}

/// One column of one record folded to a scalar: missing fields become
/// negative infinity (last under descending, first under ascending), then
/// the direction factor is multiplied in.
fn scalar_key<M: RankedMetric>(metric: &M, column: M::Column, direction: Direction) -> f64 {
    let value = match metric.sort_value(column) {
        SortValue::Missing => f64::NEG_INFINITY,
        SortValue::Number(n) => n,
        SortValue::Text(s) => text_value(s),
    };
    value * direction.factor()
}

/// Numeric interpretation of a fraction-capable string.
fn text_value(raw: &str) -> f64 {
    if raw.contains('/') {
        return fraction_value(raw);
    }
    match raw.trim().parse::<f64>() {
        Ok(n) => n,
        Err(_) => {
            warn!(value = raw, "non-numeric text in sort key, sorting last");
            f64::NEG_INFINITY
        }
    }
}

/// Comparison value of an `"n/d"` string.
///
/// When n == d the ratio is exactly 1 and the comparison value becomes the
/// raw denominator: among all-1 ratios, `7/7` outranks `3/3`. An
/// unparseable fraction or zero denominator is a data-quality fault and
/// sorts last instead of aborting the ranking.
fn fraction_value(raw: &str) -> f64 {
    let Some((numerator, denominator)) = parse_fraction(raw) else {
        warn!(value = raw, "invalid fraction literal in sort key, sorting last");
        return f64::NEG_INFINITY;
    };
    if numerator == denominator {
        denominator as f64
    } else {
        numerator as f64 / denominator as f64
    }
}

fn parse_fraction(raw: &str) -> Option<(i64, i64)> {
    let (numerator, denominator) = raw.split_once('/')?;
    let numerator: i64 = numerator.trim().parse().ok()?;
    let denominator: i64 = denominator.trim().parse().ok()?;
    if denominator == 0 {
        return None;
    }
    Some((numerator, denominator))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::leaderboard::metrics::{
        It1Column, It1Metric, It3Column, It3Metric, RANK_UNASSIGNED,
    };

    fn it1(validator: &str, liveness: f64, participation: f64, ts: Option<f64>) -> It1Metric {
        It1Metric {
            rank: RANK_UNASSIGNED,
            validator: validator.to_string(),
            liveness,
            participation,
            latest_reported_timestamp: ts,
        }
    }

    fn it3(owner: &str, rewards_growth: f64, performance: &str) -> It3Metric {
        It3Metric {
            rank: RANK_UNASSIGNED,
            owner_address: owner.to_string(),
            liveness: 1.0,
            rewards_growth,
            last_epoch: 100,
            last_epoch_performance: performance.to_string(),
            governance_voting_record: "1/1".to_string(),
        }
    }

    #[test]
    fn test_ranks_are_contiguous_after_default_sort() {
        let mut metrics = vec![
            it1("a", 0.5, 0.1, None),
            it1("b", 0.9, 0.8, Some(100.0)),
            it1("c", 0.7, 0.8, Some(50.0)),
            it1("d", 0.2, 0.4, None),
        ];
        sort_metrics(&mut metrics, It1Metric::default_sort());
        assign_ranks(&mut metrics);

        let ranks: Vec<i64> = metrics.iter().map(|m| m.rank).collect();
        assert_eq!(ranks, vec![1, 2, 3, 4]);
        // participation desc, then liveness desc
        assert_eq!(metrics[0].validator, "b");
        assert_eq!(metrics[1].validator, "c");
        assert_eq!(metrics[2].validator, "d");
        assert_eq!(metrics[3].validator, "a");
    }

    #[test]
    fn test_sort_is_stable_on_full_ties() {
        let mut metrics = vec![
            it1("first", 0.9, 0.5, Some(10.0)),
            it1("second", 0.9, 0.5, Some(10.0)),
            it1("third", 0.9, 0.5, Some(10.0)),
        ];
        sort_metrics(&mut metrics, It1Metric::default_sort());
        let order: Vec<&str> = metrics.iter().map(|m| m.validator.as_str()).collect();
        assert_eq!(order, vec!["first", "second", "third"]);
    }

    #[test]
    fn test_missing_timestamp_sorts_last_descending() {
        let mut metrics = vec![
            it1("never-reported", 0.9, 0.5, None),
            it1("reported", 0.9, 0.5, Some(1.0)),
        ];
        let spec = vec![(It1Column::LatestReportedTimestamp, Direction::Descending)];
        sort_metrics(&mut metrics, &spec);
        assert_eq!(metrics[0].validator, "reported");
        assert_eq!(metrics[1].validator, "never-reported");
    }

    #[test]
    fn test_missing_timestamp_sorts_first_ascending() {
        let mut metrics = vec![
            it1("reported", 0.9, 0.5, Some(1.0)),
            it1("never-reported", 0.9, 0.5, None),
        ];
        let spec = vec![(It1Column::LatestReportedTimestamp, Direction::Ascending)];
        sort_metrics(&mut metrics, &spec);
        assert_eq!(metrics[0].validator, "never-reported");
        assert_eq!(metrics[1].validator, "reported");
    }

    #[test]
    fn test_equal_ratio_fractions_prefer_larger_denominator() {
        let mut metrics = vec![it3("three", 1.0, "3/3"), it3("seven", 1.0, "7/7")];
        let spec = vec![(It3Column::LastEpochPerformance, Direction::Descending)];
        sort_metrics(&mut metrics, &spec);
        assert_eq!(metrics[0].owner_address, "seven");
        assert_eq!(metrics[1].owner_address, "three");
    }

    #[test]
    fn test_fractions_compare_as_rationals() {
        let mut metrics = vec![it3("third", 1.0, "1/3"), it3("half", 1.0, "1/2")];
        let spec = vec![(It3Column::LastEpochPerformance, Direction::Descending)];
        sort_metrics(&mut metrics, &spec);
        assert_eq!(metrics[0].owner_address, "half");
        assert_eq!(metrics[1].owner_address, "third");
    }

    #[test]
    fn test_fraction_values_tolerate_whitespace() {
        assert_eq!(parse_fraction(" 7 / 7 "), Some((7, 7)));
        assert_eq!(fraction_value("7 / 7"), 7.0);
    }

    #[test]
    fn test_invalid_fraction_sorts_last() {
        let mut metrics = vec![
            it3("garbage", 1.0, "n/a"),
            it3("zero-denominator", 1.0, "5/0"),
            it3("valid", 1.0, "1/10"),
        ];
        let spec = vec![(It3Column::LastEpochPerformance, Direction::Descending)];
        sort_metrics(&mut metrics, &spec);
        assert_eq!(metrics[0].owner_address, "valid");
        // The two faulty records keep their relative input order.
        assert_eq!(metrics[1].owner_address, "garbage");
        assert_eq!(metrics[2].owner_address, "zero-denominator");
    }

    #[test]
    fn test_secondary_key_breaks_ties() {
        let mut metrics = vec![
            it3("low-liveness", 2.0, "1/2"),
            it3("high-performance", 2.0, "3/4"),
        ];
        let spec = vec![
            (It3Column::RewardsGrowth, Direction::Descending),
            (It3Column::LastEpochPerformance, Direction::Descending),
        ];
        sort_metrics(&mut metrics, &spec);
        assert_eq!(metrics[0].owner_address, "high-performance");
    }

    #[test]
    fn test_display_resort_leaves_ranks_untouched() {
        let mut metrics = vec![
            it1("b", 0.9, 0.8, Some(100.0)),
            it1("a", 0.5, 0.5, None),
            it1("c", 0.7, 0.2, Some(50.0)),
        ];
        sort_metrics(&mut metrics, It1Metric::default_sort());
        assign_ranks(&mut metrics);
        let by_validator: Vec<(String, i64)> = metrics
            .iter()
            .map(|m| (m.validator.clone(), m.rank))
            .collect();

        // Re-sort a copy the way the query layer does for display.
        let mut display = metrics.clone();
        let spec = vec![(It1Column::Liveness, Direction::Ascending)];
        sort_metrics(&mut display, &spec);

        assert_eq!(display[0].validator, "a");
        for metric in &display {
            let original = by_validator
                .iter()
                .find(|(v, _)| *v == metric.validator)
                .unwrap();
            assert_eq!(metric.rank, original.1);
        }
    }

    #[test]
    fn test_empty_spec_is_a_no_op() {
        let mut metrics = vec![it1("b", 0.1, 0.1, None), it1("a", 0.9, 0.9, Some(1.0))];
        sort_metrics(&mut metrics, &[]);
        assert_eq!(metrics[0].validator, "b");
    }
}
