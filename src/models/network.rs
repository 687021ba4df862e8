//! The activity network.
//!
//! Activities live in a dense arena (`Vec` + id→index map) and
//! relationships are resolved to integer endpoints at build time, so the
//! graph has explicit adjacency lists and no pointer cycles. A `Network`
//! can only be obtained from [`NetworkBuilder`](crate::builder::NetworkBuilder),
//! which guarantees referential integrity and acyclicity.

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use super::{Activity, Calendar, Relationship};

/// A relationship with endpoints resolved to arena indices.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub(crate) struct Edge {
    /// Predecessor arena index.
    pub pred: usize,
    /// Successor arena index.
    pub succ: usize,
}

/// A validated activity network for one project.
///
/// Mutated only by the solver writing computed fields; everything else
/// reads it after the solve reaches `Finalized`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Network {
    activities: Vec<Activity>,
    index: HashMap<String, usize>,
    relationships: Vec<Relationship>,
    /// Parallel to `relationships`: resolved endpoints.
    edges: Vec<Edge>,
    /// Relationship indices incoming to each activity.
    preds: Vec<Vec<usize>>,
    /// Relationship indices outgoing from each activity.
    succs: Vec<Vec<usize>>,
    calendars: HashMap<String, Calendar>,
    data_date: NaiveDateTime,
}

impl Network {
    /// Assembles a network from validated parts. Crate-internal: the
    /// builder is the only way to obtain a `Network`.
    pub(crate) fn from_parts(
        activities: Vec<Activity>,
        relationships: Vec<Relationship>,
        edges: Vec<Edge>,
        calendars: HashMap<String, Calendar>,
        data_date: NaiveDateTime,
    ) -> Self {
        let index = activities
            .iter()
            .enumerate()
            .map(|(i, a)| (a.id.clone(), i))
            .collect();
        let mut preds = vec![Vec::new(); activities.len()];
        let mut succs = vec![Vec::new(); activities.len()];
        for (rel_idx, edge) in edges.iter().enumerate() {
            preds[edge.succ].push(rel_idx);
            succs[edge.pred].push(rel_idx);
        }
        Self {
            activities,
            index,
            relationships,
            edges,
            preds,
            succs,
            calendars,
            data_date,
        }
    }

    /// The as-of date separating actual progress from forecast.
    pub fn data_date(&self) -> NaiveDateTime {
        self.data_date
    }

    /// Number of activities.
    pub fn len(&self) -> usize {
        self.activities.len()
    }

    /// Whether the network has no activities.
    pub fn is_empty(&self) -> bool {
        self.activities.is_empty()
    }

    /// Iterates over all activities in arena order.
    pub fn activities(&self) -> impl Iterator<Item = &Activity> {
        self.activities.iter()
    }

    /// Looks up an activity by id.
    pub fn activity(&self, id: &str) -> Option<&Activity> {
        self.index.get(id).map(|&i| &self.activities[i])
    }

    /// All relationships.
    pub fn relationships(&self) -> &[Relationship] {
        &self.relationships
    }

    /// Looks up a calendar by id.
    pub fn calendar(&self, id: &str) -> Option<&Calendar> {
        self.calendars.get(id)
    }

    /// Whether every activity carries computed dates.
    pub fn is_scheduled(&self) -> bool {
        self.activities.iter().all(|a| a.computed().is_some())
    }

    // Arena-level accessors for the solver and the apportionment engine.

    pub(crate) fn activity_at(&self, idx: usize) -> &Activity {
        &self.activities[idx]
    }

    pub(crate) fn activity_at_mut(&mut self, idx: usize) -> &mut Activity {
        &mut self.activities[idx]
    }

    pub(crate) fn index_of(&self, id: &str) -> Option<usize> {
        self.index.get(id).copied()
    }

    pub(crate) fn edge(&self, rel_idx: usize) -> Edge {
        self.edges[rel_idx]
    }

    pub(crate) fn relationship(&self, rel_idx: usize) -> &Relationship {
        &self.relationships[rel_idx]
    }

    pub(crate) fn incoming(&self, idx: usize) -> &[usize] {
        &self.preds[idx]
    }

    pub(crate) fn outgoing(&self, idx: usize) -> &[usize] {
        &self.succs[idx]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Relationship, RelationshipKind};
    use chrono::NaiveDate;

    fn dt(d: u32, h: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 6, d)
            .unwrap()
            .and_hms_opt(h, 0, 0)
            .unwrap()
    }

    fn sample() -> Network {
        let cal = Calendar::five_day("STD", 480, 960).unwrap();
        let mut calendars = HashMap::new();
        calendars.insert("STD".to_string(), cal);
        let activities = vec![
            Activity::new("A", "STD", 480),
            Activity::new("B", "STD", 480),
        ];
        let relationships = vec![Relationship::new("A", "B", RelationshipKind::FinishToStart)];
        let edges = vec![Edge { pred: 0, succ: 1 }];
        Network::from_parts(activities, relationships, edges, calendars, dt(3, 8))
    }

    #[test]
    fn test_lookup_and_adjacency() {
        let n = sample();
        assert_eq!(n.len(), 2);
        assert!(n.activity("A").is_some());
        assert!(n.activity("Z").is_none());
        assert_eq!(n.index_of("B"), Some(1));
        assert_eq!(n.incoming(1), &[0]);
        assert_eq!(n.outgoing(0), &[0]);
        assert!(n.incoming(0).is_empty());
        assert_eq!(n.edge(0), Edge { pred: 0, succ: 1 });
    }

    #[test]
    fn test_not_scheduled_until_solved() {
        let n = sample();
        assert!(!n.is_scheduled());
    }

    #[test]
    fn test_calendar_lookup() {
        let n = sample();
        assert!(n.calendar("STD").is_some());
        assert!(n.calendar("MISSING").is_none());
    }
}
