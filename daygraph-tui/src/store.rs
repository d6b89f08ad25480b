//! Point store.
//!
//! Owns the raw sample sequence until it is bucketed, and produces
//! synthetic data: samples spaced by a random gap, values uniform in `[0, 1]`.

use std::ops::RangeInclusive;

use chrono::{DateTime, TimeDelta, Utc};
use rand::Rng;

use crate::models::{DayList, Sample};

/// Shape of generated data
#[derive(Debug, Clone, PartialEq)]
pub struct SyntheticSpec {
    pub count: usize,
    /// Hours between consecutive samples
    pub gap_hours: RangeInclusive<f64>,
}

impl Default for SyntheticSpec {
    fn default() -> Self {
        Self {
            count: 100_000,
            gap_hours: 0.5..=3.0,
        }
    }
}

/// Chronologically sorted samples, owned until bucketing takes them
#[derive(Debug, Clone)]
pub struct PointStore {
    samples: Vec<Sample>,
}

impl PointStore {
    /// Generate `spec.count` samples ending at `end`, walking backwards in time
    pub fn generate<R: Rng + ?Sized>(rng: &mut R, spec: &SyntheticSpec, end: DateTime<Utc>) -> Self {
        let mut last = end;
        let mut samples: Vec<Sample> = (0..spec.count)
            .map(|_| {
                last -= random_gap(rng, &spec.gap_hours);
                Sample::new(last, rng.gen_range(0.0..=1.0))
            })
            .collect();
        samples.reverse();
        Self { samples }
    }

    /// Generate `count` samples that continue a series whose latest sample
    /// is at `after`
    pub fn generate_after<R: Rng + ?Sized>(
        rng: &mut R,
        count: usize,
        gap_hours: &RangeInclusive<f64>,
        after: DateTime<Utc>,
    ) -> Self {
        let mut last = after;
        let samples = (0..count)
            .map(|_| {
                last += random_gap(rng, gap_hours);
                Sample::new(last, rng.gen_range(0.0..=1.0))
            })
            .collect();
        Self { samples }
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    pub fn last_timestamp(&self) -> Option<DateTime<Utc>> {
        self.samples.last().map(|s| s.timestamp)
    }

    /// Give up the samples, ascending by timestamp
    pub fn into_sorted_samples(self) -> Vec<Sample> {
        self.samples
    }

    /// Bucket the samples into days, consuming the store
    pub fn into_day_list(self) -> DayList {
        DayList::from_samples(self.into_sorted_samples())
    }
}

fn random_gap<R: Rng + ?Sized>(rng: &mut R, hours: &RangeInclusive<f64>) -> TimeDelta {
    let hours = if hours.start() < hours.end() {
        rng.gen_range(hours.clone())
    } else {
        *hours.start()
    };
    TimeDelta::milliseconds((hours * 3_600_000.0) as i64)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn end() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap()
    }

    #[test]
    fn test_generate_is_sorted_and_bounded() {
        let mut rng = StdRng::seed_from_u64(7);
        let spec = SyntheticSpec {
            count: 500,
            gap_hours: 0.5..=3.0,
        };
        let store = PointStore::generate(&mut rng, &spec, end());

        assert_eq!(store.len(), 500);
        assert!(store.last_timestamp().unwrap() < end());
        let samples = store.into_sorted_samples();
        assert!(samples.windows(2).all(|w| w[0].timestamp <= w[1].timestamp));
        assert!(samples.iter().all(|s| (0.0..=1.0).contains(&s.value)));

        for pair in samples.windows(2) {
            let gap = (pair[1].timestamp - pair[0].timestamp).num_minutes();
            assert!((30..=180).contains(&gap), "gap of {} minutes", gap);
        }
    }

    #[test]
    fn test_generate_is_deterministic_for_a_seed() {
        let spec = SyntheticSpec {
            count: 50,
            gap_hours: 1.0..=2.0,
        };
        let ts = |s: PointStore| {
            s.into_sorted_samples()
                .iter()
                .map(|x| x.timestamp)
                .collect::<Vec<_>>()
        };
        let a = PointStore::generate(&mut StdRng::seed_from_u64(3), &spec, end());
        let b = PointStore::generate(&mut StdRng::seed_from_u64(3), &spec, end());
        assert_eq!(ts(a), ts(b));
    }

    #[test]
    fn test_generate_empty() {
        let spec = SyntheticSpec {
            count: 0,
            gap_hours: 0.5..=3.0,
        };
        let store = PointStore::generate(&mut StdRng::seed_from_u64(1), &spec, end());
        assert!(store.is_empty());
        assert!(store.into_day_list().is_empty());
    }

    #[test]
    fn test_into_day_list_moves_every_sample() {
        let spec = SyntheticSpec {
            count: 300,
            gap_hours: 0.5..=3.0,
        };
        let store = PointStore::generate(&mut StdRng::seed_from_u64(2), &spec, end());
        let last = store.last_timestamp();

        let days = store.into_day_list();
        assert_eq!(days.sample_count(), 300);
        assert_eq!(days.last_timestamp(), last);
    }

    #[test]
    fn test_generate_after_continues_sequence() {
        let mut rng = StdRng::seed_from_u64(11);
        let spec = SyntheticSpec {
            count: 10,
            gap_hours: 0.5..=3.0,
        };
        let mut days = PointStore::generate(&mut rng, &spec, end()).into_day_list();
        let before = days.last_timestamp().unwrap();

        let fresh = PointStore::generate_after(&mut rng, 5, &spec.gap_hours, before);
        assert_eq!(fresh.len(), 5);
        let fresh = fresh.into_sorted_samples();
        assert!(fresh[0].timestamp > before);

        days.extend(fresh).unwrap();
        assert_eq!(days.sample_count(), 15);
    }
}
