//! Scheduling domain models.
//!
//! Core data types for CPM networks: work calendars, activities with
//! computed date fields, precedence relationships, the validated network
//! arena, and reporting time buckets.

mod activity;
mod bucket;
mod calendar;
mod network;
mod relationship;

pub use activity::{Activity, ComputedDates, DateConstraint};
pub use bucket::{Granularity, TimeBucket};
pub use calendar::{Calendar, DayPattern, WorkWindow};
pub use network::Network;
pub use relationship::{Relationship, RelationshipKind};

pub(crate) use network::Edge;
