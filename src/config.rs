//! Analysis configuration.
//!
//! Deserialized from the caller's settings document; every field has a
//! usable default so an empty document runs a plain analysis.

use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

use crate::models::Granularity;

/// Settings for one analysis run.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalysisConfig {
    /// Reporting bucket width.
    pub granularity: Granularity,
    /// Total-float threshold for criticality (working minutes).
    pub critical_threshold_min: i64,
    /// Externally imposed completion date for the backward pass.
    pub target_completion: Option<NaiveDateTime>,
    /// Overrides the report's bucket-grid anchor date.
    pub bucket_anchor: Option<NaiveDate>,
    /// Relative segment weights of the spread curve; empty means uniform.
    pub curve: Vec<f64>,
    /// Report groups: name to member activity ids.
    pub groups: BTreeMap<String, BTreeSet<String>>,
}
