//! Raw input records.
//!
//! The contract with the upstream ingestion collaborator: plain structured
//! records with no behavior, mirroring the activity, relationship, and
//! calendar tables of the proprietary schedule export. Ingestion parses
//! the export into these records; [`NetworkBuilder`](crate::builder::NetworkBuilder)
//! turns them into a validated [`Network`](crate::models::Network).

use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};

/// A working window in a raw calendar record (minutes from midnight).
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct RawShift {
    pub start_min: u32,
    pub end_min: u32,
}

/// A dated calendar exception.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RawCalendarException {
    /// The overridden date.
    pub date: NaiveDate,
    /// Whether the date is working.
    pub working: bool,
    /// Override windows for a working exception; a working exception with
    /// no shifts reuses the weekday template hours.
    #[serde(default)]
    pub shifts: Option<Vec<RawShift>>,
}

/// A raw calendar record.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RawCalendar {
    pub id: String,
    /// Shifts per weekday, Monday through Sunday. Must have 7 entries;
    /// an empty entry is a non-working day.
    pub weekday_shifts: Vec<Vec<RawShift>>,
    #[serde(default)]
    pub exceptions: Vec<RawCalendarException>,
}

/// A raw activity record.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RawActivity {
    pub id: String,
    #[serde(default)]
    pub name: String,
    pub calendar_id: String,
    /// Planned duration in working minutes.
    pub original_duration_min: i64,
    /// Remaining duration; defaults to the original duration.
    #[serde(default)]
    pub remaining_duration_min: Option<i64>,
    /// Constraint type code: `SNET` (start no earlier than) or `FNLT`
    /// (finish no later than).
    #[serde(default)]
    pub constraint_kind: Option<String>,
    #[serde(default)]
    pub constraint_date: Option<NaiveDateTime>,
    #[serde(default)]
    pub actual_start: Option<NaiveDateTime>,
    #[serde(default)]
    pub actual_finish: Option<NaiveDateTime>,
    /// Budgeted cost or quantity total, apportioned at reporting time.
    #[serde(default)]
    pub cost: Option<f64>,
    #[serde(default)]
    pub wbs_code: Option<String>,
    #[serde(default)]
    pub activity_code: Option<String>,
    #[serde(default)]
    pub resources: Vec<String>,
    #[serde(default)]
    pub percent_complete: Option<f64>,
}

/// A raw relationship record.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RawRelationship {
    pub predecessor_id: String,
    pub successor_id: String,
    /// Type code: `FS`, `SS`, `FF`, or `SF`.
    pub kind: String,
    /// Signed lag in working minutes; negative = lead.
    #[serde(default)]
    pub lag_min: i64,
}

/// One project's worth of raw records plus the data date.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RawProject {
    /// As-of date separating actual progress from forecast.
    pub data_date: NaiveDateTime,
    pub calendars: Vec<RawCalendar>,
    pub activities: Vec<RawActivity>,
    #[serde(default)]
    pub relationships: Vec<RawRelationship>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_deserialize_minimal_project() {
        let json = r#"{
            "data_date": "2024-06-03T08:00:00",
            "calendars": [{
                "id": "STD",
                "weekday_shifts": [
                    [{"start_min": 480, "end_min": 960}],
                    [{"start_min": 480, "end_min": 960}],
                    [{"start_min": 480, "end_min": 960}],
                    [{"start_min": 480, "end_min": 960}],
                    [{"start_min": 480, "end_min": 960}],
                    [],
                    []
                ]
            }],
            "activities": [
                {"id": "A", "calendar_id": "STD", "original_duration_min": 2400, "cost": 1200.0},
                {"id": "B", "calendar_id": "STD", "original_duration_min": 2400}
            ],
            "relationships": [
                {"predecessor_id": "A", "successor_id": "B", "kind": "FS"}
            ]
        }"#;
        let project: RawProject = serde_json::from_str(json).unwrap();
        assert_eq!(project.activities.len(), 2);
        assert_eq!(project.relationships[0].lag_min, 0);
        assert_eq!(project.activities[0].cost, Some(1200.0));
        assert!(project.activities[0].remaining_duration_min.is_none());
        assert_eq!(project.calendars[0].weekday_shifts.len(), 7);
    }

    #[test]
    fn test_deserialize_exception() {
        let json = r#"{"date": "2024-12-25", "working": false}"#;
        let exc: RawCalendarException = serde_json::from_str(json).unwrap();
        assert!(!exc.working);
        assert!(exc.shifts.is_none());
    }
}
