//! Feature extraction: normalize a snapshot plus temporal context into a
//! `FeatureVector`, with trend signals from a least-squares slope over
//! recent history (§4.2, §9 "Trend computation").

use crate::types::{FeatureVector, MetricsSnapshot};
use chrono::{DateTime, Datelike, Timelike, Utc};
use std::time::{Duration, SystemTime};

/// Build the feature vector for `snapshot` at `now`, using `history`
/// (ordered oldest-first, already the caller's `requestRateWindow` slice)
/// for the trend regression.
pub fn extract(
    snapshot: &MetricsSnapshot,
    history: &[std::sync::Arc<MetricsSnapshot>],
    window: Duration,
) -> FeatureVector {
    let now: DateTime<Utc> = snapshot.timestamp.into();
    let windowed = windowed_points(history, snapshot.timestamp, window);

    FeatureVector {
        cpu_utilization: snapshot.cpu_utilization_pct / 100.0,
        memory_utilization: snapshot.memory_utilization_pct / 100.0,
        requests_per_second: snapshot.requests_per_second / 1000.0,
        avg_response_time: snapshot.avg_response_time_ms / 1000.0,
        error_rate: snapshot.error_rate_pct / 100.0,
        network_bandwidth: snapshot.network_bandwidth_mbps,
        io_bandwidth: snapshot.io_bandwidth_mbps,
        hour: now.hour() as f64 / 24.0,
        weekday: now.weekday().num_days_from_monday() as f64 / 7.0,
        cpu_trend: slope(&windowed, |s| s.cpu_utilization_pct),
        memory_trend: slope(&windowed, |s| s.memory_utilization_pct),
        request_rate_trend: slope(&windowed, |s| s.requests_per_second),
    }
}

/// History entries within `window` of `at`, oldest first.
fn windowed_points(
    history: &[std::sync::Arc<MetricsSnapshot>],
    at: SystemTime,
    window: Duration,
) -> Vec<std::sync::Arc<MetricsSnapshot>> {
    let cutoff = at.checked_sub(window).unwrap_or(SystemTime::UNIX_EPOCH);
    history
        .iter()
        .filter(|s| s.timestamp >= cutoff && s.timestamp <= at)
        .cloned()
        .collect()
}

/// Least-squares slope of `field` against elapsed seconds since the first
/// point. Fewer than two points ⇒ 0 (§4.2).
fn slope(points: &[std::sync::Arc<MetricsSnapshot>], field: impl Fn(&MetricsSnapshot) -> f64) -> f64 {
    if points.len() < 2 {
        return 0.0;
    }
    let origin = points[0].timestamp;
    let xs: Vec<f64> = points
        .iter()
        .map(|s| s.timestamp.duration_since(origin).unwrap_or_default().as_secs_f64())
        .collect();
    let ys: Vec<f64> = points.iter().map(|s| field(s)).collect();

    let n = xs.len() as f64;
    let mean_x = xs.iter().sum::<f64>() / n;
    let mean_y = ys.iter().sum::<f64>() / n;

    let mut num = 0.0;
    let mut den = 0.0;
    for (x, y) in xs.iter().zip(&ys) {
        num += (x - mean_x) * (y - mean_y);
        den += (x - mean_x).powi(2);
    }

    if den.abs() < 1e-12 {
        0.0
    } else {
        num / den
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Target;
    use std::sync::Arc;

    fn snapshot(target: &Target, cpu: f64, secs_ago: u64) -> MetricsSnapshot {
        let mut s = MetricsSnapshot::empty(target.clone(), SystemTime::now() - Duration::from_secs(secs_ago));
        s.cpu_utilization_pct = cpu;
        s
    }

    #[test]
    fn fewer_than_two_points_gives_zero_trend() {
        let target = Target::new("ns", "svc");
        let snap = snapshot(&target, 50.0, 0);
        let history = vec![Arc::new(snap.clone())];
        let features = extract(&snap, &history, Duration::from_secs(300));
        assert_eq!(features.cpu_trend, 0.0);
    }

    #[test]
    fn rising_cpu_produces_positive_trend() {
        let target = Target::new("ns", "svc");
        let history: Vec<_> = vec![
            Arc::new(snapshot(&target, 10.0, 120)),
            Arc::new(snapshot(&target, 30.0, 60)),
            Arc::new(snapshot(&target, 50.0, 0)),
        ];
        let latest = (*history.last().unwrap().clone()).clone();
        let features = extract(&latest, &history, Duration::from_secs(300));
        assert!(features.cpu_trend > 0.0);
    }

    #[test]
    fn normalizes_percentages_and_rates() {
        let target = Target::new("ns", "svc");
        let mut snap = snapshot(&target, 80.0, 0);
        snap.requests_per_second = 500.0;
        snap.avg_response_time_ms = 200.0;
        let features = extract(&snap, &[], Duration::from_secs(300));
        assert!((features.cpu_utilization - 0.8).abs() < 1e-9);
        assert!((features.requests_per_second - 0.5).abs() < 1e-9);
        assert!((features.avg_response_time - 0.2).abs() < 1e-9);
    }
}
