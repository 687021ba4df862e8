//! Network construction and validation.
//!
//! Consumes raw activity, relationship, and calendar records and produces
//! a validated [`Network`], or fails with the first structured error found:
//! duplicate ids, dangling references, self-relationships, malformed
//! durations or calendars, and precedence cycles. On a cycle the builder
//! reports a participating activity and performs no scheduling.
//!
//! # Cycle Detection
//!
//! Every relationship kind induces a precedence edge predecessor → successor
//! for cycle-detection purposes. Detection is a three-coloring DFS: a back
//! edge into the recursion stack names an activity on the cycle.
//!
//! # Reference
//! Cormen et al. (2009), "Introduction to Algorithms", Ch. 22.3 (DFS)

use chrono::NaiveDateTime;
use std::collections::{HashMap, HashSet};
use tracing::debug;

use crate::error::CpmError;
use crate::input::{RawActivity, RawCalendar, RawProject, RawRelationship};
use crate::models::{
    Activity, Calendar, DateConstraint, DayPattern, Edge, Network, Relationship, RelationshipKind,
    WorkWindow,
};

/// Assembles and validates a [`Network`].
///
/// # Example
///
/// ```
/// use chrono::NaiveDate;
/// use cpm_engine::builder::NetworkBuilder;
/// use cpm_engine::models::{Activity, Calendar, Relationship};
///
/// let data_date = NaiveDate::from_ymd_opt(2024, 6, 3).unwrap().and_hms_opt(8, 0, 0).unwrap();
/// let network = NetworkBuilder::new(data_date)
///     .with_calendar(Calendar::five_day("STD", 480, 960).unwrap())
///     .with_activity(Activity::new("A", "STD", 2400))
///     .with_activity(Activity::new("B", "STD", 2400))
///     .with_relationship(Relationship::finish_to_start("A", "B"))
///     .build()
///     .unwrap();
/// assert_eq!(network.len(), 2);
/// ```
#[derive(Debug, Clone)]
pub struct NetworkBuilder {
    data_date: NaiveDateTime,
    calendars: Vec<Calendar>,
    activities: Vec<Activity>,
    relationships: Vec<Relationship>,
}

impl NetworkBuilder {
    /// Creates an empty builder for a project with the given data date.
    pub fn new(data_date: NaiveDateTime) -> Self {
        Self {
            data_date,
            calendars: Vec::new(),
            activities: Vec::new(),
            relationships: Vec::new(),
        }
    }

    /// Converts raw records into a builder, validating calendar definitions
    /// and per-record fields along the way.
    pub fn from_raw(project: &RawProject) -> Result<Self, CpmError> {
        let mut builder = Self::new(project.data_date);
        for raw in &project.calendars {
            builder.calendars.push(convert_calendar(raw)?);
        }
        for raw in &project.activities {
            builder.activities.push(convert_activity(raw)?);
        }
        for raw in &project.relationships {
            builder.relationships.push(convert_relationship(raw)?);
        }
        Ok(builder)
    }

    /// Adds a calendar.
    pub fn with_calendar(mut self, calendar: Calendar) -> Self {
        self.calendars.push(calendar);
        self
    }

    /// Adds an activity.
    pub fn with_activity(mut self, activity: Activity) -> Self {
        self.activities.push(activity);
        self
    }

    /// Adds a relationship.
    pub fn with_relationship(mut self, relationship: Relationship) -> Self {
        self.relationships.push(relationship);
        self
    }

    /// Validates and produces the network.
    ///
    /// Checks, in order: duplicate activity ids, calendar references,
    /// duration fields, relationship endpoints and self-references, then
    /// runs cycle detection over the full precedence graph.
    pub fn build(self) -> Result<Network, CpmError> {
        let mut index: HashMap<String, usize> = HashMap::new();
        for (i, act) in self.activities.iter().enumerate() {
            if index.insert(act.id.clone(), i).is_some() {
                return Err(CpmError::malformed(&act.id, "duplicate activity id"));
            }
        }

        let mut calendars: HashMap<String, Calendar> = HashMap::new();
        let mut calendar_ids: HashSet<String> = HashSet::new();
        for cal in self.calendars {
            if !calendar_ids.insert(cal.id.clone()) {
                return Err(CpmError::ambiguous_calendar(&cal.id, "duplicate calendar id"));
            }
            calendars.insert(cal.id.clone(), cal);
        }

        for act in &self.activities {
            if !calendars.contains_key(&act.calendar_id) {
                return Err(CpmError::dangling(
                    &act.id,
                    format!("calendar `{}` not found", act.calendar_id),
                ));
            }
            if act.original_duration_min < 0 || act.remaining_duration_min < 0 {
                return Err(CpmError::malformed(&act.id, "negative duration"));
            }
        }

        let mut edges = Vec::with_capacity(self.relationships.len());
        for rel in &self.relationships {
            let label = format!("{}->{}", rel.predecessor_id, rel.successor_id);
            if rel.predecessor_id == rel.successor_id {
                return Err(CpmError::malformed(&label, "relationship references itself"));
            }
            let pred = *index.get(&rel.predecessor_id).ok_or_else(|| {
                CpmError::dangling(&label, format!("predecessor `{}` not found", rel.predecessor_id))
            })?;
            let succ = *index.get(&rel.successor_id).ok_or_else(|| {
                CpmError::dangling(&label, format!("successor `{}` not found", rel.successor_id))
            })?;
            edges.push(Edge { pred, succ });
        }

        if let Some(member) = find_cycle_member(self.activities.len(), &edges) {
            return Err(CpmError::cyclic(&self.activities[member].id));
        }

        debug!(
            activities = self.activities.len(),
            relationships = self.relationships.len(),
            calendars = calendars.len(),
            "network validated"
        );
        Ok(Network::from_parts(
            self.activities,
            self.relationships,
            edges,
            calendars,
            self.data_date,
        ))
    }
}

/// Finds one activity participating in a precedence cycle, if any.
///
/// Three-coloring DFS: `in_stack` marks the grey set; a back edge into it
/// identifies a node that lies on a cycle.
fn find_cycle_member(n: usize, edges: &[Edge]) -> Option<usize> {
    let mut adj = vec![Vec::new(); n];
    for e in edges {
        adj[e.pred].push(e.succ);
    }
    let mut visited = vec![false; n];
    let mut in_stack = vec![false; n];
    for start in 0..n {
        if !visited[start] {
            if let Some(member) = dfs(start, &adj, &mut visited, &mut in_stack) {
                return Some(member);
            }
        }
    }
    None
}

fn dfs(
    node: usize,
    adj: &[Vec<usize>],
    visited: &mut [bool],
    in_stack: &mut [bool],
) -> Option<usize> {
    visited[node] = true;
    in_stack[node] = true;
    for &next in &adj[node] {
        if in_stack[next] {
            // Back edge: `next` is on the cycle.
            return Some(next);
        }
        if !visited[next] {
            if let Some(member) = dfs(next, adj, visited, in_stack) {
                return Some(member);
            }
        }
    }
    in_stack[node] = false;
    None
}

fn convert_calendar(raw: &RawCalendar) -> Result<Calendar, CpmError> {
    if raw.weekday_shifts.len() != 7 {
        return Err(CpmError::malformed(
            &raw.id,
            format!("expected 7 weekday entries, got {}", raw.weekday_shifts.len()),
        ));
    }
    let mut week: [DayPattern; 7] = Default::default();
    for (i, shifts) in raw.weekday_shifts.iter().enumerate() {
        week[i] = day_pattern(&raw.id, shifts)?;
    }
    let mut calendar = Calendar::new(&raw.id, week)?;
    for exc in &raw.exceptions {
        let pattern = if !exc.working {
            DayPattern::non_working()
        } else {
            match &exc.shifts {
                Some(shifts) => day_pattern(&raw.id, shifts)?,
                // A working exception without hours only makes sense when
                // the weekday template already works that day.
                None => {
                    let template = calendar.day_pattern(exc.date).clone();
                    if !template.is_working_day() {
                        return Err(CpmError::malformed(
                            &raw.id,
                            format!("working exception {} has no hours", exc.date),
                        ));
                    }
                    template
                }
            }
        };
        calendar = calendar.with_exception(exc.date, pattern)?;
    }
    Ok(calendar)
}

fn day_pattern(calendar_id: &str, shifts: &[crate::input::RawShift]) -> Result<DayPattern, CpmError> {
    let windows = shifts
        .iter()
        .map(|s| WorkWindow::new(s.start_min, s.end_min))
        .collect();
    DayPattern::working(windows).map_err(|detail| CpmError::malformed(calendar_id, detail))
}

fn convert_activity(raw: &RawActivity) -> Result<Activity, CpmError> {
    if raw.original_duration_min < 0 {
        return Err(CpmError::malformed(&raw.id, "negative original duration"));
    }
    let remaining = raw.remaining_duration_min.unwrap_or(raw.original_duration_min);
    if remaining < 0 {
        return Err(CpmError::malformed(&raw.id, "negative remaining duration"));
    }
    if raw.actual_finish.is_some() && raw.actual_start.is_none() {
        return Err(CpmError::malformed(&raw.id, "actual finish without actual start"));
    }

    let constraint = match (&raw.constraint_kind, raw.constraint_date) {
        (None, _) => None,
        (Some(_), None) => {
            return Err(CpmError::malformed(&raw.id, "constraint type without a date"));
        }
        (Some(kind), Some(date)) => match kind.trim().to_ascii_uppercase().as_str() {
            "SNET" => Some(DateConstraint::StartNoEarlierThan(date)),
            "FNLT" => Some(DateConstraint::FinishNoLaterThan(date)),
            other => {
                return Err(CpmError::malformed(
                    &raw.id,
                    format!("unknown constraint type `{other}`"),
                ));
            }
        },
    };

    let mut activity = Activity::new(&raw.id, &raw.calendar_id, raw.original_duration_min)
        .with_name(&raw.name)
        .with_remaining(remaining);
    activity.constraint = constraint;
    activity.actual_start = raw.actual_start;
    if let Some(finish) = raw.actual_finish {
        activity = activity.with_actual_finish(finish);
    }
    activity.cost = raw.cost;
    activity.wbs_code = raw.wbs_code.clone();
    activity.activity_code = raw.activity_code.clone();
    activity.resources = raw.resources.clone();
    activity.percent_complete = raw.percent_complete;
    Ok(activity)
}

fn convert_relationship(raw: &RawRelationship) -> Result<Relationship, CpmError> {
    let label = format!("{}->{}", raw.predecessor_id, raw.successor_id);
    let kind = RelationshipKind::parse(&raw.kind)
        .ok_or_else(|| CpmError::malformed(&label, format!("unknown relationship type `{}`", raw.kind)))?;
    Ok(Relationship::new(&raw.predecessor_id, &raw.successor_id, kind).with_lag(raw.lag_min))
}
