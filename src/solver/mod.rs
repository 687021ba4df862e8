//! Critical Path Method solver.
//!
//! Runs the two ordered passes over a validated [`Network`]: a forward pass
//! assigning early dates in topological order, then a backward pass
//! assigning late dates in reverse, followed by float computation and
//! criticality marking. All date arithmetic is calendar-aware.
//!
//! # State Machine
//!
//! A solve moves `Unscheduled → ForwardPassDone → BackwardPassDone →
//! Finalized`. There is no partial or retry state: [`CpmSolver::solve`]
//! consumes the network and either returns it finalized or drops it with
//! an error.
//!
//! # Relationship Bounds
//!
//! The early-start bound a relationship imposes on its successor, with lag
//! measured on the successor's calendar:
//!
//! | Kind | Bound on successor |
//! |------|--------------------|
//! | FS   | pred.EF + lag |
//! | SS   | pred.ES + lag |
//! | FF   | pred.EF + lag − duration |
//! | SF   | pred.ES + lag − duration |
//!
//! The backward pass applies the mirrored bounds to late dates.
//!
//! # Reference
//! Kelley & Walker (1959), "Critical-Path Planning and Scheduling"

use chrono::NaiveDateTime;
use tracing::{debug, info};

use crate::error::CpmError;
use crate::models::{
    Activity, Calendar, ComputedDates, DateConstraint, Network, RelationshipKind,
};

/// Progress of a solve run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SolverState {
    /// No pass has run.
    Unscheduled,
    /// Early dates assigned.
    ForwardPassDone,
    /// Late dates assigned.
    BackwardPassDone,
    /// Floats computed and written back; the network may now be read.
    Finalized,
}

/// Solve options.
#[derive(Debug, Clone, Default)]
pub struct SolverOptions {
    /// Total-float threshold at or below which an activity is critical
    /// (working minutes). Default 0.
    pub critical_threshold_min: i64,
    /// Externally imposed completion date. When set it anchors every late
    /// finish in the backward pass; when absent the forecast project
    /// completion anchors the network.
    pub target_completion: Option<NaiveDateTime>,
}

/// Runs CPM passes over a network.
///
/// # Example
///
/// ```
/// use chrono::NaiveDate;
/// use cpm_engine::builder::NetworkBuilder;
/// use cpm_engine::models::{Activity, Calendar, Relationship};
/// use cpm_engine::solver::CpmSolver;
///
/// let data_date = NaiveDate::from_ymd_opt(2024, 6, 3).unwrap().and_hms_opt(8, 0, 0).unwrap();
/// let network = NetworkBuilder::new(data_date)
///     .with_calendar(Calendar::five_day("STD", 480, 960).unwrap())
///     .with_activity(Activity::new("A", "STD", 2400))
///     .with_activity(Activity::new("B", "STD", 2400))
///     .with_relationship(Relationship::finish_to_start("A", "B"))
///     .build()
///     .unwrap();
/// let solved = CpmSolver::new().solve(network).unwrap();
/// assert!(solved.is_scheduled());
/// assert!(solved.activity("A").unwrap().computed().unwrap().is_critical);
/// ```
#[derive(Debug, Clone, Default)]
pub struct CpmSolver {
    options: SolverOptions,
}

impl CpmSolver {
    /// Creates a solver with default options.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets all options.
    pub fn with_options(mut self, options: SolverOptions) -> Self {
        self.options = options;
        self
    }

    /// Sets the critical-float threshold (working minutes).
    pub fn with_critical_threshold(mut self, minutes: i64) -> Self {
        self.options.critical_threshold_min = minutes;
        self
    }

    /// Sets a target completion date anchoring the backward pass.
    pub fn with_target_completion(mut self, target: NaiveDateTime) -> Self {
        self.options.target_completion = Some(target);
        self
    }

    /// Solves the network: both passes, floats, criticality.
    ///
    /// Consumes the network and returns it with every activity's computed
    /// fields populated, or an error with the network discarded — there is
    /// no partially scheduled result.
    pub fn solve(&self, mut network: Network) -> Result<Network, CpmError> {
        precheck(&network)?;
        let order = topological_order(&network)?;

        let mut run = PassState::new(network.len());
        self.forward_pass(&network, &order, &mut run)?;
        run.state = SolverState::ForwardPassDone;

        self.backward_pass(&network, &order, &mut run)?;
        run.state = SolverState::BackwardPassDone;

        let critical = self.finalize(&mut network, &run)?;
        run.state = SolverState::Finalized;
        info!(
            activities = network.len(),
            critical,
            state = ?run.state,
            "cpm solve finalized"
        );
        Ok(network)
    }

    /// Assigns early dates in topological order.
    fn forward_pass(
        &self,
        network: &Network,
        order: &[usize],
        run: &mut PassState,
    ) -> Result<(), CpmError> {
        for &idx in order {
            let act = network.activity_at(idx);
            let cal = calendar_of(network, act)?;

            let es = if let Some(actual) = act.actual_start {
                // Recorded progress pins the start; no rounding of facts.
                actual
            } else {
                let mut candidate = network.data_date();
                for &rel_idx in network.incoming(idx) {
                    let bound = self.forward_bound(network, rel_idx, act, run)?;
                    candidate = candidate.max(bound);
                }
                if let Some(DateConstraint::StartNoEarlierThan(date)) = act.constraint {
                    candidate = candidate.max(date);
                }
                cal.next_working(candidate)
            };

            let ef = if let Some(actual) = act.actual_finish {
                actual
            } else {
                // Remaining work is performed from the data date onward.
                let work_from = es.max(network.data_date());
                cal.add_working_time(work_from, act.remaining_duration_min)
            };

            run.es[idx] = Some(es);
            run.ef[idx] = Some(ef.max(es));
        }
        debug!("forward pass complete");
        Ok(())
    }

    /// The early-start bound one incoming relationship imposes.
    fn forward_bound(
        &self,
        network: &Network,
        rel_idx: usize,
        successor: &Activity,
        run: &PassState,
    ) -> Result<NaiveDateTime, CpmError> {
        let edge = network.edge(rel_idx);
        let rel = network.relationship(rel_idx);
        let cal = calendar_of(network, successor)?;
        let pred_es = run.early_start(edge.pred, &rel.predecessor_id)?;
        let pred_ef = run.early_finish(edge.pred, &rel.predecessor_id)?;
        let bound = match rel.kind {
            RelationshipKind::FinishToStart => cal.offset_working(pred_ef, rel.lag_min),
            RelationshipKind::StartToStart => cal.offset_working(pred_es, rel.lag_min),
            RelationshipKind::FinishToFinish => {
                let finish_bound = cal.offset_working(pred_ef, rel.lag_min);
                cal.subtract_working_time(finish_bound, successor.remaining_duration_min)
            }
            RelationshipKind::StartToFinish => {
                let finish_bound = cal.offset_working(pred_es, rel.lag_min);
                cal.subtract_working_time(finish_bound, successor.remaining_duration_min)
            }
        };
        Ok(bound)
    }

    /// Assigns late dates in reverse topological order.
    fn backward_pass(
        &self,
        network: &Network,
        order: &[usize],
        run: &mut PassState,
    ) -> Result<(), CpmError> {
        if run.state != SolverState::ForwardPassDone {
            return Err(CpmError::internal(
                "network",
                "backward pass requested before the forward pass completed",
            ));
        }
        // Forecast completion: latest early finish across the network.
        let project_finish = run
            .ef
            .iter()
            .flatten()
            .copied()
            .max()
            .unwrap_or(network.data_date());

        for &idx in order.iter().rev() {
            let act = network.activity_at(idx);
            let cal = calendar_of(network, act)?;
            let ef = run.early_finish(idx, &act.id)?;

            let mut lf = if act.actual_finish.is_some() {
                // Completed work has no latitude.
                ef
            } else {
                let outgoing = network.outgoing(idx);
                if outgoing.is_empty() {
                    match self.options.target_completion {
                        Some(target) => target,
                        None => project_finish.max(ef),
                    }
                } else {
                    let mut candidate: Option<NaiveDateTime> = None;
                    for &rel_idx in outgoing {
                        let bound = self.backward_bound(network, rel_idx, act, cal, run)?;
                        candidate = Some(match candidate {
                            Some(c) => c.min(bound),
                            None => bound,
                        });
                    }
                    candidate.unwrap_or(project_finish)
                }
            };
            if let Some(DateConstraint::FinishNoLaterThan(date)) = act.constraint {
                lf = lf.min(date);
            }

            let ls = if act.actual_finish.is_some() {
                run.early_start(idx, &act.id)?
            } else {
                cal.subtract_working_time(lf, act.remaining_duration_min)
            };
            run.lf[idx] = Some(lf);
            run.ls[idx] = Some(ls);
        }
        debug!("backward pass complete");
        Ok(())
    }

    /// The late-finish bound one outgoing relationship imposes on `act`.
    fn backward_bound(
        &self,
        network: &Network,
        rel_idx: usize,
        act: &Activity,
        own_cal: &Calendar,
        run: &PassState,
    ) -> Result<NaiveDateTime, CpmError> {
        let edge = network.edge(rel_idx);
        let rel = network.relationship(rel_idx);
        let successor = network.activity_at(edge.succ);
        // Lag stays on the successor's calendar, mirroring the forward pass.
        let succ_cal = calendar_of(network, successor)?;
        let succ_ls = run.late_start(edge.succ, &rel.successor_id)?;
        let succ_lf = run.late_finish(edge.succ, &rel.successor_id)?;
        let bound = match rel.kind {
            RelationshipKind::FinishToStart => succ_cal.offset_working(succ_ls, -rel.lag_min),
            RelationshipKind::FinishToFinish => succ_cal.offset_working(succ_lf, -rel.lag_min),
            RelationshipKind::StartToStart => {
                let start_bound = succ_cal.offset_working(succ_ls, -rel.lag_min);
                own_cal.add_working_time(start_bound, act.remaining_duration_min)
            }
            RelationshipKind::StartToFinish => {
                let start_bound = succ_cal.offset_working(succ_lf, -rel.lag_min);
                own_cal.add_working_time(start_bound, act.remaining_duration_min)
            }
        };
        Ok(bound)
    }

    /// Computes floats and criticality and writes results into the network.
    ///
    /// Returns the number of critical activities.
    fn finalize(&self, network: &mut Network, run: &PassState) -> Result<usize, CpmError> {
        if run.state != SolverState::BackwardPassDone {
            return Err(CpmError::internal(
                "network",
                "finalize requested before both passes completed",
            ));
        }
        let mut computed = Vec::with_capacity(network.len());
        for idx in 0..network.len() {
            let act = network.activity_at(idx);
            let cal = calendar_of(network, act)?;
            let es = run.early_start(idx, &act.id)?;
            let ef = run.early_finish(idx, &act.id)?;
            let ls = run.late_start(idx, &act.id)?;
            let lf = run.late_finish(idx, &act.id)?;

            // A recorded start pins ES in the past while EF is projected
            // from the data date, so for started work the start side no
            // longer measures slack; the finish side does. Unstarted
            // activities measure identically on either side.
            let total_float = if act.actual_start.is_some() {
                cal.signed_working_duration(ef, lf)
            } else {
                cal.signed_working_duration(es, ls)
            };
            let free_float = self.free_float(network, idx, total_float, run)?;
            computed.push(ComputedDates {
                early_start: es,
                early_finish: ef,
                late_start: ls,
                late_finish: lf,
                total_float_min: total_float,
                free_float_min: free_float,
                is_critical: total_float <= self.options.critical_threshold_min,
            });
        }
        let critical = computed.iter().filter(|c| c.is_critical).count();
        for (idx, dates) in computed.into_iter().enumerate() {
            network.activity_at_mut(idx).set_computed(dates);
        }
        Ok(critical)
    }

    /// Free float: the least signed slack this activity's early dates leave
    /// against each successor's early dates. Equals total float for
    /// open-ended activities. Reported raw, never clipped.
    fn free_float(
        &self,
        network: &Network,
        idx: usize,
        total_float: i64,
        run: &PassState,
    ) -> Result<i64, CpmError> {
        let outgoing = network.outgoing(idx);
        if outgoing.is_empty() {
            return Ok(total_float);
        }
        let act = network.activity_at(idx);
        let es = run.early_start(idx, &act.id)?;
        let ef = run.early_finish(idx, &act.id)?;
        let mut min_slack: Option<i64> = None;
        for &rel_idx in outgoing {
            let edge = network.edge(rel_idx);
            let rel = network.relationship(rel_idx);
            let successor = network.activity_at(edge.succ);
            let cal = calendar_of(network, successor)?;
            let succ_es = run.early_start(edge.succ, &rel.successor_id)?;
            let succ_ef = run.early_finish(edge.succ, &rel.successor_id)?;
            let slack = match rel.kind {
                RelationshipKind::FinishToStart => {
                    cal.signed_working_duration(cal.offset_working(ef, rel.lag_min), succ_es)
                }
                RelationshipKind::StartToStart => {
                    cal.signed_working_duration(cal.offset_working(es, rel.lag_min), succ_es)
                }
                RelationshipKind::FinishToFinish => {
                    cal.signed_working_duration(cal.offset_working(ef, rel.lag_min), succ_ef)
                }
                RelationshipKind::StartToFinish => {
                    cal.signed_working_duration(cal.offset_working(es, rel.lag_min), succ_ef)
                }
            };
            min_slack = Some(match min_slack {
                Some(m) => m.min(slack),
                None => slack,
            });
        }
        Ok(min_slack.unwrap_or(total_float))
    }
}

/// Per-activity date arrays for a single run, plus the state marker.
#[derive(Debug)]
struct PassState {
    state: SolverState,
    es: Vec<Option<NaiveDateTime>>,
    ef: Vec<Option<NaiveDateTime>>,
    ls: Vec<Option<NaiveDateTime>>,
    lf: Vec<Option<NaiveDateTime>>,
}

impl PassState {
    fn new(n: usize) -> Self {
        Self {
            state: SolverState::Unscheduled,
            es: vec![None; n],
            ef: vec![None; n],
            ls: vec![None; n],
            lf: vec![None; n],
        }
    }

    fn early_start(&self, idx: usize, id: &str) -> Result<NaiveDateTime, CpmError> {
        resolved(self.es[idx], id, "early start")
    }

    fn early_finish(&self, idx: usize, id: &str) -> Result<NaiveDateTime, CpmError> {
        resolved(self.ef[idx], id, "early finish")
    }

    fn late_start(&self, idx: usize, id: &str) -> Result<NaiveDateTime, CpmError> {
        resolved(self.ls[idx], id, "late start")
    }

    fn late_finish(&self, idx: usize, id: &str) -> Result<NaiveDateTime, CpmError> {
        resolved(self.lf[idx], id, "late finish")
    }
}

/// An unset date after a completed traversal is a solver bug, not bad input.
fn resolved(
    value: Option<NaiveDateTime>,
    id: &str,
    field: &str,
) -> Result<NaiveDateTime, CpmError> {
    value.ok_or_else(|| CpmError::internal(id, format!("{field} unresolved after traversal")))
}

/// Input checks that must fail before any pass runs.
fn precheck(network: &Network) -> Result<(), CpmError> {
    for act in network.activities() {
        if network.calendar(&act.calendar_id).is_none() {
            return Err(CpmError::malformed(
                &act.id,
                format!("calendar `{}` not found", act.calendar_id),
            ));
        }
        if act.remaining_duration_min < 0 || act.original_duration_min < 0 {
            return Err(CpmError::malformed(&act.id, "negative duration"));
        }
    }
    Ok(())
}

fn calendar_of<'a>(network: &'a Network, act: &Activity) -> Result<&'a Calendar, CpmError> {
    network.calendar(&act.calendar_id).ok_or_else(|| {
        CpmError::malformed(&act.id, format!("calendar `{}` not found", act.calendar_id))
    })
}

/// Kahn's algorithm over the precedence edges.
///
/// The builder has already rejected cycles, so leftover activities here
/// indicate an internal inconsistency rather than bad input.
fn topological_order(network: &Network) -> Result<Vec<usize>, CpmError> {
    let n = network.len();
    let mut in_degree = vec![0usize; n];
    for idx in 0..n {
        in_degree[idx] = network.incoming(idx).len();
    }
    let mut order = Vec::with_capacity(n);
    let mut worklist: std::collections::VecDeque<usize> =
        (0..n).filter(|&i| in_degree[i] == 0).collect();
    while let Some(node) = worklist.pop_front() {
        order.push(node);
        for &rel_idx in network.outgoing(node) {
            let succ = network.edge(rel_idx).succ;
            in_degree[succ] -= 1;
            if in_degree[succ] == 0 {
                worklist.push_back(succ);
            }
        }
    }
    if order.len() != n {
        let leftover = (0..n)
            .find(|&i| in_degree[i] > 0)
            .map(|i| network.activity_at(i).id.clone())
            .unwrap_or_else(|| "<unknown>".to_string());
        return Err(CpmError::internal(
            leftover,
            "activity unresolved after topological traversal",
        ));
    }
    Ok(order)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builder::NetworkBuilder;
    use crate::models::Relationship;
    use chrono::NaiveDate;

    fn dt(y: i32, m: u32, d: u32, h: u32, min: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(y, m, d)
            .unwrap()
            .and_hms_opt(h, min, 0)
            .unwrap()
    }

    fn std_cal() -> Calendar {
        // Mon-Fri 08:00-16:00.
        Calendar::five_day("STD", 480, 960).unwrap()
    }

    // 2024-06-03 is a Monday.
    fn builder() -> NetworkBuilder {
        NetworkBuilder::new(dt(2024, 6, 3, 8, 0)).with_calendar(std_cal())
    }

    fn computed<'a>(network: &'a Network, id: &str) -> &'a ComputedDates {
        network.activity(id).unwrap().computed().unwrap()
    }

    #[test]
    fn test_fs_chain_spans_weekend() {
        let network = builder()
            .with_activity(Activity::new("A", "STD", 2400))
            .with_activity(Activity::new("B", "STD", 2400))
            .with_relationship(Relationship::finish_to_start("A", "B"))
            .build()
            .unwrap();
        let solved = CpmSolver::new().solve(network).unwrap();

        let a = computed(&solved, "A");
        assert_eq!(a.early_start, dt(2024, 6, 3, 8, 0));
        assert_eq!(a.early_finish, dt(2024, 6, 7, 16, 0));

        // B cannot start before the next working instant after A's finish.
        let b = computed(&solved, "B");
        assert_eq!(b.early_start, dt(2024, 6, 10, 8, 0));
        assert_eq!(b.early_finish, dt(2024, 6, 14, 16, 0));

        assert_eq!(a.total_float_min, 0);
        assert_eq!(b.total_float_min, 0);
        assert!(a.is_critical && b.is_critical);
    }

    #[test]
    fn test_target_completion_equal_to_forecast_gives_zero_float() {
        let network = builder()
            .with_activity(Activity::new("A", "STD", 960))
            .build()
            .unwrap();
        let solved = CpmSolver::new()
            .with_target_completion(dt(2024, 6, 4, 16, 0))
            .solve(network)
            .unwrap();
        let a = computed(&solved, "A");
        assert_eq!(a.early_finish, dt(2024, 6, 4, 16, 0));
        assert_eq!(a.total_float_min, 0);
        assert!(a.is_critical);
    }

    #[test]
    fn test_late_target_produces_positive_float() {
        let network = builder()
            .with_activity(Activity::new("A", "STD", 480))
            .build()
            .unwrap();
        let solved = CpmSolver::new()
            .with_target_completion(dt(2024, 6, 4, 16, 0))
            .solve(network)
            .unwrap();
        let a = computed(&solved, "A");
        // One full working day of slack.
        assert_eq!(a.total_float_min, 480);
        assert!(!a.is_critical);
    }

    #[test]
    fn test_tight_target_produces_negative_float() {
        let network = builder()
            .with_activity(Activity::new("A", "STD", 960))
            .build()
            .unwrap();
        let solved = CpmSolver::new()
            .with_target_completion(dt(2024, 6, 3, 16, 0))
            .solve(network)
            .unwrap();
        let a = computed(&solved, "A");
        assert_eq!(a.total_float_min, -480);
        assert!(a.is_critical);
    }

    #[test]
    fn test_float_agrees_between_start_and_finish_sides() {
        let network = builder()
            .with_activity(Activity::new("A", "STD", 960))
            .with_activity(Activity::new("B", "STD", 1920))
            .with_activity(Activity::new("C", "STD", 480))
            .with_relationship(Relationship::finish_to_start("A", "C"))
            .with_relationship(Relationship::finish_to_start("B", "C"))
            .build()
            .unwrap();
        let solved = CpmSolver::new().solve(network).unwrap();
        for id in ["A", "B", "C"] {
            let act = solved.activity(id).unwrap();
            let c = act.computed().unwrap();
            let cal = solved.calendar(&act.calendar_id).unwrap();
            assert_eq!(
                c.total_float_min,
                cal.signed_working_duration(c.early_finish, c.late_finish),
                "start- and finish-side float disagree for {id}"
            );
            assert!(c.early_finish >= c.early_start);
        }
        // A trails B by two working days and has that much room.
        assert_eq!(computed(&solved, "A").total_float_min, 960);
        assert_eq!(computed(&solved, "A").free_float_min, 960);
        assert_eq!(computed(&solved, "B").total_float_min, 0);
    }

    #[test]
    fn test_fs_lag_on_successor_calendar() {
        let network = builder()
            .with_activity(Activity::new("A", "STD", 480))
            .with_activity(Activity::new("B", "STD", 480))
            .with_relationship(Relationship::new(
                "A",
                "B",
                RelationshipKind::FinishToStart,
            ).with_lag(480))
            .build()
            .unwrap();
        let solved = CpmSolver::new().solve(network).unwrap();
        // One working day of lag after Monday's finish skips Tuesday.
        assert_eq!(computed(&solved, "B").early_start, dt(2024, 6, 5, 8, 0));
    }

    #[test]
    fn test_negative_lag_is_a_lead() {
        let network = builder()
            .with_activity(Activity::new("A", "STD", 960))
            .with_activity(Activity::new("B", "STD", 480))
            .with_relationship(Relationship::new(
                "A",
                "B",
                RelationshipKind::FinishToStart,
            ).with_lag(-480))
            .build()
            .unwrap();
        let solved = CpmSolver::new().solve(network).unwrap();
        // B may start one working day before A finishes.
        assert_eq!(computed(&solved, "A").early_finish, dt(2024, 6, 4, 16, 0));
        assert_eq!(computed(&solved, "B").early_start, dt(2024, 6, 4, 8, 0));
    }

    #[test]
    fn test_start_to_start_with_lag() {
        let network = builder()
            .with_activity(Activity::new("A", "STD", 1440))
            .with_activity(Activity::new("B", "STD", 480))
            .with_relationship(Relationship::new(
                "A",
                "B",
                RelationshipKind::StartToStart,
            ).with_lag(480))
            .build()
            .unwrap();
        let solved = CpmSolver::new().solve(network).unwrap();
        assert_eq!(computed(&solved, "B").early_start, dt(2024, 6, 4, 8, 0));
    }

    #[test]
    fn test_finish_to_finish_pulls_successor_finish() {
        let network = builder()
            .with_activity(Activity::new("A", "STD", 1440))
            .with_activity(Activity::new("B", "STD", 480))
            .with_relationship(Relationship::new(
                "A",
                "B",
                RelationshipKind::FinishToFinish,
            ))
            .build()
            .unwrap();
        let solved = CpmSolver::new().solve(network).unwrap();
        // B must not finish before A does: Wed 16:00, so B runs Wednesday.
        let b = computed(&solved, "B");
        assert_eq!(b.early_finish, dt(2024, 6, 5, 16, 0));
        assert_eq!(b.early_start, dt(2024, 6, 5, 8, 0));
    }

    #[test]
    fn test_start_no_earlier_than_pushes_start() {
        let network = builder()
            .with_activity(
                Activity::new("A", "STD", 480)
                    .with_constraint(DateConstraint::StartNoEarlierThan(dt(2024, 6, 5, 8, 0))),
            )
            .build()
            .unwrap();
        let solved = CpmSolver::new().solve(network).unwrap();
        assert_eq!(computed(&solved, "A").early_start, dt(2024, 6, 5, 8, 0));
    }

    #[test]
    fn test_constraint_date_rounds_forward_to_working_time() {
        let network = builder()
            .with_activity(
                Activity::new("A", "STD", 480)
                    // Saturday constraint rounds to Monday's opening.
                    .with_constraint(DateConstraint::StartNoEarlierThan(dt(2024, 6, 8, 12, 0))),
            )
            .build()
            .unwrap();
        let solved = CpmSolver::new().solve(network).unwrap();
        assert_eq!(computed(&solved, "A").early_start, dt(2024, 6, 10, 8, 0));
    }

    #[test]
    fn test_finish_no_later_than_caps_late_finish() {
        let network = builder()
            .with_activity(
                Activity::new("A", "STD", 960)
                    .with_constraint(DateConstraint::FinishNoLaterThan(dt(2024, 6, 3, 16, 0))),
            )
            .build()
            .unwrap();
        let solved = CpmSolver::new().solve(network).unwrap();
        let a = computed(&solved, "A");
        assert_eq!(a.late_finish, dt(2024, 6, 3, 16, 0));
        assert_eq!(a.total_float_min, -480);
        assert!(a.is_critical);
    }

    #[test]
    fn test_critical_threshold_widens_critical_set() {
        let network = builder()
            .with_activity(Activity::new("A", "STD", 480))
            .build()
            .unwrap();
        let solved = CpmSolver::new()
            .with_critical_threshold(480)
            .with_target_completion(dt(2024, 6, 4, 16, 0))
            .solve(network)
            .unwrap();
        let a = computed(&solved, "A");
        assert_eq!(a.total_float_min, 480);
        assert!(a.is_critical);
    }

    #[test]
    fn test_actual_start_pins_early_start() {
        // Started last Friday, half a day of work left at the data date.
        let network = builder()
            .with_activity(
                Activity::new("A", "STD", 960)
                    .with_remaining(240)
                    .with_actual_start(dt(2024, 5, 31, 8, 0)),
            )
            .build()
            .unwrap();
        let solved = CpmSolver::new().solve(network).unwrap();
        let a = computed(&solved, "A");
        assert_eq!(a.early_start, dt(2024, 5, 31, 8, 0));
        // Remaining work runs from the data date, not the actual start.
        assert_eq!(a.early_finish, dt(2024, 6, 3, 12, 0));
    }

    #[test]
    fn test_in_progress_activity_driving_completion_is_critical() {
        // Started the previous Friday with half a day left; the pinned
        // start must not manufacture float on an activity that alone
        // drives project completion.
        let network = builder()
            .with_activity(
                Activity::new("A", "STD", 960)
                    .with_remaining(240)
                    .with_actual_start(dt(2024, 5, 31, 8, 0)),
            )
            .build()
            .unwrap();
        let solved = CpmSolver::new().solve(network).unwrap();
        let a = computed(&solved, "A");
        let cal = solved.calendar("STD").unwrap();
        assert_eq!(a.total_float_min, 0);
        assert_eq!(
            a.total_float_min,
            cal.signed_working_duration(a.early_finish, a.late_finish)
        );
        assert!(a.is_critical);
    }

    #[test]
    fn test_pass_order_is_enforced() {
        let network = builder()
            .with_activity(Activity::new("A", "STD", 480))
            .build()
            .unwrap();
        let order = topological_order(&network).unwrap();
        let solver = CpmSolver::new();

        let mut run = PassState::new(network.len());
        let err = solver.backward_pass(&network, &order, &mut run).unwrap_err();
        assert!(matches!(err, CpmError::InternalInconsistency { .. }));

        let mut network = network;
        let run = PassState::new(network.len());
        let err = solver.finalize(&mut network, &run).unwrap_err();
        assert!(matches!(err, CpmError::InternalInconsistency { .. }));
    }

    #[test]
    fn test_completed_activity_has_no_latitude() {
        let network = builder()
            .with_activity(
                Activity::new("A", "STD", 960)
                    .with_actual_start(dt(2024, 5, 30, 8, 0))
                    .with_actual_finish(dt(2024, 5, 31, 16, 0)),
            )
            .with_activity(Activity::new("B", "STD", 480))
            .with_relationship(Relationship::finish_to_start("A", "B"))
            .build()
            .unwrap();
        let solved = CpmSolver::new().solve(network).unwrap();
        let a = computed(&solved, "A");
        assert_eq!(a.early_finish, dt(2024, 5, 31, 16, 0));
        assert_eq!(a.late_finish, a.early_finish);
        assert_eq!(a.late_start, a.early_start);
        // B starts at the data date, not in the past.
        assert_eq!(computed(&solved, "B").early_start, dt(2024, 6, 3, 8, 0));
    }

    #[test]
    fn test_milestone_zero_duration() {
        let network = builder()
            .with_activity(Activity::new("A", "STD", 480))
            .with_activity(Activity::new("M", "STD", 0))
            .with_relationship(Relationship::finish_to_start("A", "M"))
            .build()
            .unwrap();
        let solved = CpmSolver::new().solve(network).unwrap();
        let m = computed(&solved, "M");
        assert_eq!(m.early_start, m.early_finish);
        assert_eq!(m.total_float_min, 0);
    }

    #[test]
    fn test_free_float_never_exceeds_total_float_on_chain() {
        let network = builder()
            .with_activity(Activity::new("A", "STD", 480))
            .with_activity(Activity::new("B", "STD", 480))
            .with_relationship(Relationship::finish_to_start("A", "B"))
            .build()
            .unwrap();
        let solved = CpmSolver::new()
            .with_target_completion(dt(2024, 6, 7, 16, 0))
            .solve(network)
            .unwrap();
        // All slack sits at the end of the chain; A yields none of it.
        let a = computed(&solved, "A");
        assert_eq!(a.total_float_min, 1440);
        assert_eq!(a.free_float_min, 0);
        let b = computed(&solved, "B");
        assert_eq!(b.free_float_min, b.total_float_min);
    }

    #[test]
    fn test_parallel_branches_share_one_critical_path() {
        let network = builder()
            .with_activity(Activity::new("S", "STD", 0))
            .with_activity(Activity::new("LONG", "STD", 1920))
            .with_activity(Activity::new("SHORT", "STD", 480))
            .with_activity(Activity::new("E", "STD", 0))
            .with_relationship(Relationship::finish_to_start("S", "LONG"))
            .with_relationship(Relationship::finish_to_start("S", "SHORT"))
            .with_relationship(Relationship::finish_to_start("LONG", "E"))
            .with_relationship(Relationship::finish_to_start("SHORT", "E"))
            .build()
            .unwrap();
        let solved = CpmSolver::new().solve(network).unwrap();
        assert!(computed(&solved, "LONG").is_critical);
        assert!(!computed(&solved, "SHORT").is_critical);
        assert_eq!(computed(&solved, "SHORT").total_float_min, 1440);
        assert_eq!(computed(&solved, "SHORT").free_float_min, 1440);
    }
}
