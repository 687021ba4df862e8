//! Time-bucket apportionment.
//!
//! Spreads an activity's total cost or quantity across the reporting
//! buckets its active span overlaps, proportional to the *working* time
//! falling in each bucket on the activity's own calendar. A non-working
//! stretch (weekend, holiday) therefore attracts none of the value even
//! when a bucket boundary cuts through it.
//!
//! # Exactness
//!
//! Bucket values are computed as shares of the total, with the final
//! bucket taking the remainder, so the emitted values always sum to the
//! input total exactly. Shares are never rounded before that step.
//!
//! # Curves
//!
//! An optional [`DistributionCurve`] reshapes the spread: the curve is a
//! piecewise-constant density over the activity's normalized working
//! span, resampled onto whatever bucket fractions the span produces. A
//! curve with one segment is equivalent to the uniform spread.

use chrono::{NaiveDate, NaiveDateTime};
use tracing::debug;

use crate::error::CpmError;
use crate::models::{Activity, Calendar, Granularity, Network, TimeBucket};

/// One bucket's share of an apportioned total.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BucketValue {
    pub bucket: TimeBucket,
    pub value: f64,
}

/// A piecewise-constant spread profile over a normalized span.
///
/// Segment `k` of `n` covers the fraction `[k/n, (k+1)/n)` of the
/// activity's working span with relative density `weights[k]`.
#[derive(Debug, Clone, PartialEq)]
pub struct DistributionCurve {
    weights: Vec<f64>,
}

impl DistributionCurve {
    /// Creates a curve from relative segment weights.
    ///
    /// Weights must be finite, non-negative, and not all zero; they need
    /// not sum to one (the spread normalizes).
    pub fn new(weights: Vec<f64>) -> Result<Self, CpmError> {
        if weights.is_empty() {
            return Err(CpmError::malformed("curve", "curve has no segments"));
        }
        if weights.iter().any(|w| !w.is_finite() || *w < 0.0) {
            return Err(CpmError::malformed(
                "curve",
                "curve weights must be finite and non-negative",
            ));
        }
        if weights.iter().sum::<f64>() <= 0.0 {
            return Err(CpmError::malformed("curve", "curve weights sum to zero"));
        }
        Ok(Self { weights })
    }

    /// Curve mass over the fraction interval `[lo, hi]` of the span.
    fn mass(&self, lo: f64, hi: f64) -> f64 {
        let n = self.weights.len() as f64;
        self.weights
            .iter()
            .enumerate()
            .map(|(k, w)| {
                let seg_lo = k as f64 / n;
                let seg_hi = (k as f64 + 1.0) / n;
                let overlap = (hi.min(seg_hi) - lo.max(seg_lo)).max(0.0);
                w * overlap
            })
            .sum()
    }
}

/// A total value to spread over one activity's span.
///
/// Usually derived from the activity's own cost field, but callers may
/// supply standalone records for quantities tracked outside the
/// schedule.
#[derive(Debug, Clone, PartialEq)]
pub struct CostRecord {
    /// The activity whose span carries the value.
    pub activity_id: String,
    /// The total to spread.
    pub total: f64,
    /// Spread profile; `None` means uniform over working time.
    pub curve: Option<DistributionCurve>,
}

impl CostRecord {
    /// Creates a uniform-spread record.
    pub fn new(activity_id: impl Into<String>, total: f64) -> Self {
        Self {
            activity_id: activity_id.into(),
            total,
            curve: None,
        }
    }

    /// Sets the spread curve.
    pub fn with_curve(mut self, curve: DistributionCurve) -> Self {
        self.curve = Some(curve);
        self
    }
}

/// Spreads one cost record over its activity's span in a solved network.
///
/// Resolves the activity, its calendar, and its active span, then
/// delegates to [`apportion`]. Fails with `DanglingReference` if the
/// activity does not exist and `MalformedInput` if it has not been
/// scheduled yet.
pub fn apportion_record(
    network: &Network,
    record: &CostRecord,
    granularity: Granularity,
    anchor: NaiveDate,
) -> Result<Vec<BucketValue>, CpmError> {
    let activity = network.activity(&record.activity_id).ok_or_else(|| {
        CpmError::dangling(
            &record.activity_id,
            "cost record names an unknown activity",
        )
    })?;
    let (start, end) = active_span(activity).ok_or_else(|| {
        CpmError::malformed(&record.activity_id, "activity has no computed dates")
    })?;
    let calendar = network.calendar(&activity.calendar_id).ok_or_else(|| {
        CpmError::dangling(
            &activity.id,
            format!("calendar `{}` not found", activity.calendar_id),
        )
    })?;
    apportion(
        calendar,
        start,
        end,
        record.total,
        granularity,
        anchor,
        record.curve.as_ref(),
    )
}

/// The span an activity's value is spread over: actual dates where
/// recorded, early dates otherwise. `None` until the network is solved.
pub fn active_span(activity: &Activity) -> Option<(NaiveDateTime, NaiveDateTime)> {
    let computed = activity.computed();
    let start = activity
        .actual_start
        .or_else(|| computed.map(|c| c.early_start))?;
    let end = activity
        .actual_finish
        .or_else(|| computed.map(|c| c.early_finish))?;
    Some((start, end))
}

/// Generates the buckets of the given granularity that overlap
/// `[span_start, span_end)`, aligned to `anchor`.
///
/// The anchor fixes the bucket grid; an anchor after the span start is
/// pulled back to the span start so the first bucket always covers it.
/// Buckets are emitted in chronological order.
pub fn generate_buckets(
    granularity: Granularity,
    anchor: NaiveDate,
    span_start: NaiveDateTime,
    span_end: NaiveDateTime,
) -> Vec<TimeBucket> {
    let anchor = anchor.min(span_start.date());
    let mut buckets = Vec::new();
    let mut start = anchor;
    loop {
        let end = granularity.advance(start);
        let bucket = TimeBucket::new(start, end);
        if bucket.start_instant() > span_end
            || (bucket.start_instant() == span_end && !buckets.is_empty())
        {
            break;
        }
        if bucket.end_instant() > span_start {
            buckets.push(bucket);
            if bucket.end_instant() > span_end {
                break;
            }
        }
        start = end;
    }
    buckets
}

/// Spreads `total` across the buckets overlapping the span.
///
/// Shares are proportional to working-time overlap on `calendar`,
/// reshaped by `curve` when given. A span with no working time (a
/// milestone, or one lying wholly in non-working time) books the whole
/// total into the bucket containing the span start. The returned values
/// sum to `total` exactly.
pub fn apportion(
    calendar: &Calendar,
    span_start: NaiveDateTime,
    span_end: NaiveDateTime,
    total: f64,
    granularity: Granularity,
    anchor: NaiveDate,
    curve: Option<&DistributionCurve>,
) -> Result<Vec<BucketValue>, CpmError> {
    if !total.is_finite() {
        return Err(CpmError::malformed(
            &calendar.id,
            "apportioned total must be finite",
        ));
    }
    if span_end < span_start {
        return Err(CpmError::malformed(
            &calendar.id,
            format!("span end {span_end} precedes span start {span_start}"),
        ));
    }

    let buckets = generate_buckets(granularity, anchor, span_start, span_end);
    let span_minutes = calendar.working_duration(span_start, span_end);
    if buckets.is_empty() || span_minutes == 0 {
        // Point-in-time value: the whole total lands where the span starts.
        let bucket = buckets
            .into_iter()
            .find(|b| b.contains(span_start.date()))
            .unwrap_or_else(|| {
                let start = anchor.min(span_start.date());
                TimeBucket::new(start, granularity.advance(start))
            });
        return Ok(vec![BucketValue { bucket, value: total }]);
    }

    let mut weights = Vec::with_capacity(buckets.len());
    for bucket in &buckets {
        let lo = bucket.start_instant().max(span_start);
        let hi = bucket.end_instant().min(span_end);
        let overlap = calendar.working_duration(lo, hi);
        let weight = match curve {
            Some(c) => {
                let f_lo = calendar.working_duration(span_start, lo) as f64 / span_minutes as f64;
                let f_hi = calendar.working_duration(span_start, hi) as f64 / span_minutes as f64;
                c.mass(f_lo, f_hi)
            }
            None => overlap as f64,
        };
        weights.push(weight);
    }

    let weight_sum: f64 = weights.iter().sum();
    let mut values = Vec::with_capacity(buckets.len());
    let mut allocated = 0.0;
    let last = buckets.len() - 1;
    for (i, (bucket, weight)) in buckets.iter().zip(&weights).enumerate() {
        let value = if i == last {
            total - allocated
        } else if weight_sum > 0.0 {
            total * weight / weight_sum
        } else {
            0.0
        };
        allocated += value;
        values.push(BucketValue {
            bucket: *bucket,
            value,
        });
    }
    debug!(
        calendar = %calendar.id,
        buckets = values.len(),
        total,
        "apportioned span"
    );
    Ok(values)
}
