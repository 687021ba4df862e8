//! Group aggregation of apportioned values.
//!
//! Rolls per-activity bucket values up into named groups and presents
//! them as a matrix: one row per group, one column per bucket, all rows
//! sharing the same chronological bucket axis. An activity appearing in
//! several groups counts fully in each of them; activities in no group
//! do not appear in the report at all.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use tracing::{debug, warn};

use crate::apportion::{active_span, apportion, BucketValue, DistributionCurve};
use crate::error::CpmError;
use crate::models::{Granularity, Network, TimeBucket};

/// One group's values along the shared bucket axis.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GroupRow {
    /// Group name.
    pub group: String,
    /// One value per bucket, aligned to [`ReportMatrix::buckets`].
    pub values: Vec<f64>,
}

/// Apportioned values per group per bucket.
///
/// Buckets are the chronological union of every member activity's
/// buckets; rows are sorted by group name. A group whose activities
/// carry no cost still produces a row of zeros.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ReportMatrix {
    pub buckets: Vec<TimeBucket>,
    pub rows: Vec<GroupRow>,
}

impl ReportMatrix {
    /// The values row for a group, if present.
    pub fn row(&self, group: &str) -> Option<&GroupRow> {
        self.rows.iter().find(|r| r.group == group)
    }

    /// Total across all buckets for a group.
    pub fn group_total(&self, group: &str) -> Option<f64> {
        self.row(group).map(|r| r.values.iter().sum())
    }
}

/// Builds the group-by-bucket report for a solved network.
///
/// Every activity id named in `groups` must exist in the network. The
/// bucket grid is anchored at the earliest span start among all grouped
/// activities, so bucket boundaries line up across groups; `anchor`
/// overrides that when the report must align to an external grid.
pub fn aggregate(
    network: &Network,
    groups: &BTreeMap<String, BTreeSet<String>>,
    granularity: Granularity,
    anchor: Option<NaiveDate>,
    curve: Option<&DistributionCurve>,
) -> Result<ReportMatrix, CpmError> {
    for (group, ids) in groups {
        for id in ids {
            if network.activity(id).is_none() {
                return Err(CpmError::dangling(
                    group,
                    format!("activity `{id}` not found"),
                ));
            }
        }
    }

    let grouped_ids: BTreeSet<&String> = groups.values().flatten().collect();
    let earliest = grouped_ids
        .iter()
        .filter_map(|id| network.activity(id).and_then(active_span))
        .map(|(start, _)| start.date())
        .min();
    // One grid for the whole report: an anchor later than the earliest
    // grouped span is clamped back so every activity buckets on the same
    // axis instead of each pulling the grid to its own start.
    let anchor = match (anchor, earliest) {
        (Some(a), Some(e)) => a.min(e),
        (Some(a), None) => a,
        (None, Some(e)) => e,
        // No schedulable members at all; nothing to report.
        (None, None) => return Ok(ReportMatrix::default()),
    };

    // Apportion each grouped activity once, then roll up per group.
    let mut per_activity: BTreeMap<&String, Vec<BucketValue>> = BTreeMap::new();
    for &id in &grouped_ids {
        let act = match network.activity(id) {
            Some(a) => a,
            None => continue, // checked above
        };
        let Some((start, end)) = active_span(act) else {
            warn!(activity = %act.id, "skipping unscheduled activity in report");
            continue;
        };
        let total = act.cost.unwrap_or(0.0);
        let cal = network.calendar(&act.calendar_id).ok_or_else(|| {
            CpmError::dangling(&act.id, format!("calendar `{}` not found", act.calendar_id))
        })?;
        let values = apportion(cal, start, end, total, granularity, anchor, curve)?;
        per_activity.insert(id, values);
    }

    // Shared axis: chronological union of every bucket seen.
    let axis: BTreeSet<TimeBucket> = per_activity
        .values()
        .flatten()
        .map(|bv| bv.bucket)
        .collect();
    let buckets: Vec<TimeBucket> = axis.into_iter().collect();
    let column: BTreeMap<TimeBucket, usize> = buckets
        .iter()
        .enumerate()
        .map(|(i, b)| (*b, i))
        .collect();

    let mut rows = Vec::with_capacity(groups.len());
    for (group, ids) in groups {
        let mut values = vec![0.0; buckets.len()];
        for id in ids {
            if let Some(bucket_values) = per_activity.get(id) {
                for bv in bucket_values {
                    if let Some(&col) = column.get(&bv.bucket) {
                        values[col] += bv.value;
                    }
                }
            }
        }
        rows.push(GroupRow {
            group: group.clone(),
            values,
        });
    }

    debug!(
        groups = rows.len(),
        buckets = buckets.len(),
        "report matrix assembled"
    );
    Ok(ReportMatrix { buckets, rows })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builder::NetworkBuilder;
    use crate::models::{Activity, Calendar, Relationship};
    use crate::solver::CpmSolver;
    use chrono::{NaiveDate, NaiveDateTime};

    fn dt(d: u32, h: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 6, d)
            .unwrap()
            .and_hms_opt(h, 0, 0)
            .unwrap()
    }

    fn groups(defs: &[(&str, &[&str])]) -> BTreeMap<String, BTreeSet<String>> {
        defs.iter()
            .map(|(name, ids)| {
                (
                    name.to_string(),
                    ids.iter().map(|s| s.to_string()).collect(),
                )
            })
            .collect()
    }

    fn solved_network() -> Network {
        // A runs week 1, B runs week 2; each costs 500.
        let network = NetworkBuilder::new(dt(3, 8))
            .with_calendar(Calendar::five_day("STD", 480, 960).unwrap())
            .with_activity(Activity::new("A", "STD", 2400).with_cost(500.0))
            .with_activity(Activity::new("B", "STD", 2400).with_cost(500.0))
            .with_activity(Activity::new("C", "STD", 480).with_cost(80.0))
            .with_relationship(Relationship::finish_to_start("A", "B"))
            .build()
            .unwrap();
        CpmSolver::new().solve(network).unwrap()
    }

    #[test]
    fn test_rows_sorted_and_buckets_chronological() {
        let network = solved_network();
        let matrix = aggregate(
            &network,
            &groups(&[("zeta", &["B"]), ("alpha", &["A"])]),
            Granularity::Weekly,
            None,
            None,
        )
        .unwrap();
        assert_eq!(matrix.rows[0].group, "alpha");
        assert_eq!(matrix.rows[1].group, "zeta");
        for pair in matrix.buckets.windows(2) {
            assert!(pair[0].start < pair[1].start);
        }
    }

    #[test]
    fn test_shared_axis_spans_both_groups() {
        let network = solved_network();
        let matrix = aggregate(
            &network,
            &groups(&[("first", &["A"]), ("second", &["B"])]),
            Granularity::Weekly,
            None,
            None,
        )
        .unwrap();
        // Two weekly buckets; each row carries zeros outside its own week.
        assert_eq!(matrix.buckets.len(), 2);
        let first = matrix.row("first").unwrap();
        let second = matrix.row("second").unwrap();
        assert_eq!(first.values, vec![500.0, 0.0]);
        assert_eq!(second.values, vec![0.0, 500.0]);
    }

    #[test]
    fn test_multi_membership_counts_fully_in_each_group() {
        let network = solved_network();
        let matrix = aggregate(
            &network,
            &groups(&[("one", &["A"]), ("both", &["A", "B"])]),
            Granularity::Weekly,
            None,
            None,
        )
        .unwrap();
        assert_eq!(matrix.group_total("one"), Some(500.0));
        assert_eq!(matrix.group_total("both"), Some(1000.0));
    }

    #[test]
    fn test_ungrouped_activity_excluded() {
        let network = solved_network();
        let matrix = aggregate(
            &network,
            &groups(&[("only_a", &["A"])]),
            Granularity::Weekly,
            None,
            None,
        )
        .unwrap();
        // C's cost appears nowhere.
        let total: f64 = matrix.rows.iter().flat_map(|r| r.values.iter()).sum();
        assert_eq!(total, 500.0);
    }

    #[test]
    fn test_late_anchor_yields_one_shared_grid() {
        use crate::models::DateConstraint;

        // Span starts two days apart; an anchor set after both must not
        // give each activity its own staggered grid.
        let network = NetworkBuilder::new(dt(3, 8))
            .with_calendar(Calendar::five_day("STD", 480, 960).unwrap())
            .with_activity(Activity::new("A", "STD", 2400).with_cost(100.0))
            .with_activity(
                Activity::new("B", "STD", 2400)
                    .with_cost(100.0)
                    .with_constraint(DateConstraint::StartNoEarlierThan(dt(5, 8))),
            )
            .build()
            .unwrap();
        let network = CpmSolver::new().solve(network).unwrap();
        let matrix = aggregate(
            &network,
            &groups(&[("all", &["A", "B"])]),
            Granularity::Weekly,
            Some(NaiveDate::from_ymd_opt(2024, 7, 1).unwrap()),
            None,
        )
        .unwrap();
        assert_eq!(matrix.buckets[0].start, NaiveDate::from_ymd_opt(2024, 6, 3).unwrap());
        for pair in matrix.buckets.windows(2) {
            assert!(pair[0].end <= pair[1].start, "bucket axis overlaps itself");
        }
        assert_eq!(matrix.group_total("all"), Some(200.0));
    }

    #[test]
    fn test_costless_member_contributes_zero() {
        let network = NetworkBuilder::new(dt(3, 8))
            .with_calendar(Calendar::five_day("STD", 480, 960).unwrap())
            .with_activity(Activity::new("A", "STD", 480))
            .build()
            .unwrap();
        let network = CpmSolver::new().solve(network).unwrap();
        let matrix = aggregate(
            &network,
            &groups(&[("g", &["A"])]),
            Granularity::Weekly,
            None,
            None,
        )
        .unwrap();
        assert_eq!(matrix.group_total("g"), Some(0.0));
    }

    #[test]
    fn test_unknown_member_is_dangling() {
        let network = solved_network();
        let err = aggregate(
            &network,
            &groups(&[("g", &["GHOST"])]),
            Granularity::Weekly,
            None,
            None,
        )
        .unwrap_err();
        assert!(matches!(err, CpmError::DanglingReference { .. }));
        assert_eq!(err.entity(), "g");
    }

    #[test]
    fn test_empty_groups_produce_empty_matrix() {
        let network = solved_network();
        let matrix = aggregate(
            &network,
            &BTreeMap::new(),
            Granularity::Weekly,
            None,
            None,
        )
        .unwrap();
        assert!(matrix.buckets.is_empty());
        assert!(matrix.rows.is_empty());
    }
}
