//! Precomputed indicator lines (moving averages) drawn over the bars.

use super::value_objects::Timestamp;
use crate::domain::chart::Color;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct OverlayPoint {
    pub time: Timestamp,
    pub value: f64,
}

/// One moving-average line as delivered by the backend, sorted by time.
#[derive(Debug, Clone, PartialEq)]
pub struct OverlaySeries {
    pub period: u32,
    pub color: Color,
    pub points: Vec<OverlayPoint>,
}

impl OverlaySeries {
    pub fn new(period: u32, color: Color, mut points: Vec<OverlayPoint>) -> Self {
        points.sort_by_key(|p| p.time);
        Self { period, color, points }
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Points with `first <= time <= last`.
    pub fn window(&self, first: Timestamp, last: Timestamp) -> &[OverlayPoint] {
        if first > last {
            return &[];
        }
        let lo = self.points.partition_point(|p| p.time < first);
        let hi = self.points.partition_point(|p| p.time <= last);
        &self.points[lo..hi]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn line() -> OverlaySeries {
        let points = [40u64, 10, 30, 20]
            .iter()
            .map(|&t| OverlayPoint { time: Timestamp::from_millis(t), value: t as f64 })
            .collect();
        OverlaySeries::new(17, Color::from_hex(0xFF6B6B), points)
    }

    #[test]
    fn points_are_sorted_on_construction() {
        let times: Vec<u64> = line().points.iter().map(|p| p.time.value()).collect();
        assert_eq!(times, vec![10, 20, 30, 40]);
    }

    #[test]
    fn window_is_inclusive() {
        let l = line();
        let w = l.window(Timestamp::from_millis(20), Timestamp::from_millis(30));
        assert_eq!(w.len(), 2);
        assert_eq!(w[0].value, 20.0);
        assert!(l.window(Timestamp::from_millis(31), Timestamp::from_millis(39)).is_empty());
        assert!(l.window(Timestamp::from_millis(40), Timestamp::from_millis(10)).is_empty());
    }
}
