//! Activity model.
//!
//! An activity is the schedulable unit of work: a duration on a calendar,
//! optional date constraint, optional actual (progressed) dates, and the
//! computed CPM fields the solver fills in.
//!
//! # Computed Fields
//!
//! [`ComputedDates`] is `None` until the solver runs to completion. Once
//! set it is derived purely from network + calendar inputs and is not
//! mutated outside the solver.

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

/// A hard date constraint on an activity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DateConstraint {
    /// The activity may not start before this instant. Raises the early
    /// start during the forward pass; rounds forward if non-working.
    StartNoEarlierThan(NaiveDateTime),
    /// The activity should finish by this instant. Caps the late finish in
    /// the backward pass; a violation surfaces as negative float, not as
    /// an error.
    FinishNoLaterThan(NaiveDateTime),
}

/// CPM results for one activity, written by the solver at finalization.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ComputedDates {
    /// Earliest possible start.
    pub early_start: NaiveDateTime,
    /// Earliest possible finish.
    pub early_finish: NaiveDateTime,
    /// Latest start that does not delay the network anchor.
    pub late_start: NaiveDateTime,
    /// Latest finish that does not delay the network anchor.
    pub late_finish: NaiveDateTime,
    /// Signed working minutes between early and late start. Negative means
    /// the schedule is infeasible against its anchor or constraints.
    pub total_float_min: i64,
    /// Signed working minutes this activity can slip without moving any
    /// successor's early dates. Reported raw; never clipped.
    pub free_float_min: i64,
    /// Whether total float is at or below the critical threshold.
    pub is_critical: bool,
}

/// A schedulable unit of work.
///
/// Durations are in working minutes on the owning calendar. The calendar
/// is referenced by id only — the [`Network`](super::Network) owns the
/// calendar instances.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Activity {
    /// Unique activity identifier.
    pub id: String,
    /// Description.
    pub name: String,
    /// Planned duration (working minutes).
    pub original_duration_min: i64,
    /// Duration still to perform (working minutes). Equals the original
    /// duration for unstarted activities; zero once finished.
    pub remaining_duration_min: i64,
    /// Owning calendar id (lookup only, no ownership).
    pub calendar_id: String,
    /// Optional hard date constraint.
    pub constraint: Option<DateConstraint>,
    /// Actual start, present once the activity has begun.
    pub actual_start: Option<NaiveDateTime>,
    /// Actual finish, present once the activity is complete.
    pub actual_finish: Option<NaiveDateTime>,
    /// WBS code (opaque reporting metadata).
    pub wbs_code: Option<String>,
    /// Activity code string (opaque reporting metadata).
    pub activity_code: Option<String>,
    /// Assigned resource names (opaque reporting metadata).
    pub resources: Vec<String>,
    /// Budgeted cost or quantity total, apportioned at reporting time.
    pub cost: Option<f64>,
    /// Physical percent complete, 0–100.
    pub percent_complete: Option<f64>,
    /// Solver output; `None` until the solve finalizes.
    computed: Option<ComputedDates>,
}

impl Activity {
    /// Creates an unstarted activity with equal original and remaining
    /// duration.
    pub fn new(
        id: impl Into<String>,
        calendar_id: impl Into<String>,
        duration_min: i64,
    ) -> Self {
        Self {
            id: id.into(),
            name: String::new(),
            original_duration_min: duration_min,
            remaining_duration_min: duration_min,
            calendar_id: calendar_id.into(),
            constraint: None,
            actual_start: None,
            actual_finish: None,
            wbs_code: None,
            activity_code: None,
            resources: Vec::new(),
            cost: None,
            percent_complete: None,
            computed: None,
        }
    }

    /// Sets the description.
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// Sets the remaining duration.
    pub fn with_remaining(mut self, remaining_min: i64) -> Self {
        self.remaining_duration_min = remaining_min;
        self
    }

    /// Sets a date constraint.
    pub fn with_constraint(mut self, constraint: DateConstraint) -> Self {
        self.constraint = Some(constraint);
        self
    }

    /// Records the actual start.
    pub fn with_actual_start(mut self, start: NaiveDateTime) -> Self {
        self.actual_start = Some(start);
        self
    }

    /// Records the actual finish and zeroes the remaining duration.
    pub fn with_actual_finish(mut self, finish: NaiveDateTime) -> Self {
        self.actual_finish = Some(finish);
        self.remaining_duration_min = 0;
        self
    }

    /// Sets the budgeted cost.
    pub fn with_cost(mut self, cost: f64) -> Self {
        self.cost = Some(cost);
        self
    }

    /// Sets the WBS code.
    pub fn with_wbs(mut self, wbs: impl Into<String>) -> Self {
        self.wbs_code = Some(wbs.into());
        self
    }

    /// Whether this activity is a zero-duration milestone.
    pub fn is_milestone(&self) -> bool {
        self.original_duration_min == 0
    }

    /// Whether any progress has been recorded.
    pub fn is_progressed(&self) -> bool {
        self.actual_start.is_some() || self.actual_finish.is_some()
    }

    /// The computed CPM dates, if the solver has finalized.
    pub fn computed(&self) -> Option<&ComputedDates> {
        self.computed.as_ref()
    }

    /// Writes the solver output. Crate-internal: only the solver calls this.
    pub(crate) fn set_computed(&mut self, dates: ComputedDates) {
        self.computed = Some(dates);
    }
}
