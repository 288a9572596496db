//! Normalizer
//!
//! Raw window rows → chart-ready points: nanosecond timestamps become
//! milliseconds (floor division) and the sequence is sorted ascending.
//! The sort is stable, so rows sharing a timestamp keep their input order.

use types::record::{NormalizedPoint, RawRecord};

/// Convert and sort a window of raw records. Pure.
pub fn normalize(records: &[RawRecord]) -> Vec<NormalizedPoint> {
    let mut points: Vec<NormalizedPoint> = records.iter().map(NormalizedPoint::from_raw).collect();
    sort_points(&mut points);
    points
}

/// Stable ascending sort by timestamp.
pub fn sort_points(points: &mut [NormalizedPoint]) {
    points.sort_by_key(|p| p.timestamp);
}

/// True when timestamps never decrease.
pub fn is_chronological(points: &[NormalizedPoint]) -> bool {
    points.windows(2).all(|w| w[0].timestamp <= w[1].timestamp)
}
