//! Graph coordinates.
//!
//! Maps samples into the unit square of their day panel: `x` is the elapsed
//! fraction of the day and `y` grows downward, so a value of 1 sits at the
//! top. The functions here are pure and only borrow the days they read.

use crate::bucket::SECONDS_PER_DAY;
use crate::models::{Day, Sample};

/// A position relative to a day panel
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct UnitPoint {
    pub x: f64,
    pub y: f64,
}

impl UnitPoint {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// Point on the segment `self -> other` at horizontal position `x`
    pub fn lerp_at_x(self, other: UnitPoint, x: f64) -> UnitPoint {
        let dx = other.x - self.x;
        if dx.abs() < f64::EPSILON {
            return UnitPoint::new(x, self.y);
        }
        let t = (x - self.x) / dx;
        UnitPoint::new(x, self.y + (other.y - self.y) * t)
    }
}

/// Map a sample into `day`'s frame.
///
/// `x` is not clamped: a sample from a later day lands past 1.0.
pub fn map(sample: &Sample, day: &Day) -> UnitPoint {
    let elapsed = sample.timestamp - day.start_of_day;
    let seconds = elapsed.num_milliseconds() as f64 / 1000.0;
    UnitPoint {
        x: seconds / SECONDS_PER_DAY as f64,
        y: 1.0 - sample.value,
    }
}

/// A line segment to draw inside a day panel
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Edge {
    pub from: UnitPoint,
    pub to: UnitPoint,
    /// The segment runs into the following day's first sample
    pub crosses_day: bool,
}

impl Edge {
    /// Cut the segment at the panel's right edge
    pub fn clipped(self) -> Edge {
        if self.to.x <= 1.0 {
            return self;
        }
        Edge {
            to: self.from.lerp_at_x(self.to, 1.0),
            ..self
        }
    }
}

/// Points of a day in its own frame
pub fn points(day: &Day) -> impl Iterator<Item = UnitPoint> + '_ {
    day.values.iter().map(move |s| map(s, day))
}

/// Segments of a day: each consecutive pair of samples, plus the edge into
/// `next_first`, the first sample of the following day, when there is one.
pub fn edges<'a>(day: &'a Day, next_first: Option<&'a Sample>) -> impl Iterator<Item = Edge> + 'a {
    let inner = day
        .values
        .iter()
        .zip(day.values.iter().skip(1))
        .map(move |(a, b)| Edge {
            from: map(a, day),
            to: map(b, day),
            crosses_day: false,
        });

    let trailing = day
        .last()
        .zip(next_first)
        .map(move |(last, first)| Edge {
            from: map(last, day),
            to: map(first, day),
            crosses_day: true,
        });

    inner.chain(trailing)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{DateTime, TimeZone, Utc};

    fn at(day: u32, hour: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 6, day, hour, 0, 0).unwrap()
    }

    fn day(d: u32, samples: &[(u32, f64)]) -> Day {
        Day {
            start_of_day: at(d, 0),
            values: samples.iter().map(|&(h, v)| Sample::new(at(d, h), v)).collect(),
        }
    }

    #[test]
    fn test_map_midday() {
        let d = day(1, &[(12, 0.25)]);
        let p = map(&d.values[0], &d);
        assert!((p.x - 0.5).abs() < 1e-9);
        assert!((p.y - 0.75).abs() < 1e-9);
    }

    #[test]
    fn test_value_one_is_top() {
        let d = day(1, &[(0, 1.0)]);
        assert_eq!(map(&d.values[0], &d), UnitPoint::new(0.0, 0.0));
    }

    #[test]
    fn test_next_day_sample_maps_past_one() {
        let d = day(1, &[(6, 0.5)]);
        let next = day(2, &[(6, 0.5)]);
        let p = map(&next.values[0], &d);
        assert!((p.x - 1.25).abs() < 1e-9);
    }

    #[test]
    fn test_edges_without_next_day() {
        let d = day(1, &[(1, 0.1), (2, 0.2), (3, 0.3)]);
        let edges: Vec<_> = edges(&d, None).collect();
        assert_eq!(edges.len(), 2);
        assert!(edges.iter().all(|e| !e.crosses_day));
    }

    #[test]
    fn test_edges_with_next_day() {
        let d = day(1, &[(1, 0.1), (18, 0.2)]);
        let next = day(2, &[(6, 0.6), (7, 0.7)]);
        let edges: Vec<_> = edges(&d, next.first()).collect();

        assert_eq!(edges.len(), 2);
        let trailing = edges[1];
        assert!(trailing.crosses_day);
        assert!((trailing.from.x - 0.75).abs() < 1e-9);
        assert!((trailing.to.x - 1.25).abs() < 1e-9);
    }

    #[test]
    fn test_single_sample_day_only_has_trailing_edge() {
        let d = day(1, &[(12, 0.5)]);
        let next = day(3, &[(0, 0.5)]);
        assert_eq!(edges(&d, None).count(), 0);
        assert_eq!(edges(&d, next.first()).count(), 1);
    }

    #[test]
    fn test_clip_continuation_edge() {
        let edge = Edge {
            from: UnitPoint::new(0.5, 0.0),
            to: UnitPoint::new(1.5, 1.0),
            crosses_day: true,
        };
        let clipped = edge.clipped();
        assert_eq!(clipped.to, UnitPoint::new(1.0, 0.5));
        assert_eq!(clipped.from, edge.from);
    }
}
