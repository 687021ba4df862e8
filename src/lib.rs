//! Critical Path Method scheduling and time-phased cost reporting.
//!
//! Takes a project's raw activity, relationship, and calendar records,
//! validates them into a precedence network, computes early/late dates,
//! float, and criticality with calendar-aware forward and backward
//! passes, then spreads activity costs across reporting buckets and
//! rolls them up into named groups.
//!
//! # Modules
//!
//! - **`models`**: Domain types — `Calendar`, `Activity`, `Relationship`,
//!   `Network`, `TimeBucket`
//! - **`input`**: Raw record types deserialized from the upstream export
//! - **`builder`**: Validation and network assembly (ids, references, cycles)
//! - **`solver`**: The CPM forward/backward passes and float computation
//! - **`apportion`**: Working-time-proportional cost spreading over buckets
//! - **`aggregate`**: Group-by-bucket report assembly
//! - **`pipeline`**: The end-to-end run, driven by a [`config::AnalysisConfig`]
//!
//! # References
//!
//! - Kelley & Walker (1959), "Critical-Path Planning and Scheduling"
//! - O'Brien & Plotnick (2015), "CPM in Construction Management"

pub mod aggregate;
pub mod apportion;
pub mod builder;
pub mod config;
pub mod error;
pub mod input;
pub mod models;
pub mod pipeline;
pub mod solver;

pub use error::CpmError;
