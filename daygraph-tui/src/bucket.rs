//! Day bucketing.
//!
//! Splits a sorted sample stream into per-day buckets. Boundaries are UTC
//! midnights so the partition does not depend on the viewer's time zone.

use chrono::{DateTime, NaiveTime, TimeDelta, Utc};

use crate::models::{Day, DayId, DayList, Sample};

/// Seconds in one bucket
pub const SECONDS_PER_DAY: i64 = 24 * 60 * 60;

/// Length of one bucket
pub fn day_length() -> TimeDelta {
    TimeDelta::seconds(SECONDS_PER_DAY)
}

/// UTC midnight at or before `instant`
pub fn start_of_day(instant: DateTime<Utc>) -> DayId {
    instant
        .date_naive()
        .and_time(NaiveTime::MIN)
        .and_utc()
}

/// Incremental bucketizer.
///
/// Samples must arrive in ascending timestamp order. A sample past the end
/// of the open bucket closes it and opens the bucket of the sample's own
/// day, so empty days in between never produce a `Day`.
#[derive(Debug, Default)]
pub struct DayBucketizer {
    current: Option<DayId>,
    values: Vec<Sample>,
    days: Vec<Day>,
}

impl DayBucketizer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Continue filling an already built day
    pub fn resume(day: Day) -> Self {
        Self {
            current: Some(day.start_of_day),
            values: day.values,
            days: Vec::new(),
        }
    }

    pub fn push(&mut self, sample: Sample) {
        match self.current {
            Some(current) if sample.timestamp < current + day_length() => {}
            Some(_) => {
                self.close();
                self.current = Some(start_of_day(sample.timestamp));
            }
            None => self.current = Some(start_of_day(sample.timestamp)),
        }
        self.values.push(sample);
    }

    pub fn finish(mut self) -> DayList {
        self.close();
        DayList::from_days(self.days)
    }

    fn close(&mut self) {
        if let Some(start_of_day) = self.current {
            if !self.values.is_empty() {
                self.days.push(Day {
                    start_of_day,
                    values: std::mem::take(&mut self.values),
                });
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use proptest::prelude::*;

    fn at(day: u32, hour: u32, minute: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 1, day, hour, minute, 0).unwrap()
    }

    #[test]
    fn test_start_of_day() {
        assert_eq!(start_of_day(at(5, 13, 45)), at(5, 0, 0));
        assert_eq!(start_of_day(at(5, 0, 0)), at(5, 0, 0));
        assert_eq!(start_of_day(at(5, 23, 59)), at(5, 0, 0));
    }

    #[test]
    fn test_two_days() {
        let samples = vec![
            Sample::new(at(1, 8, 0), 0.2),
            Sample::new(at(1, 20, 0), 0.8),
            Sample::new(at(2, 9, 0), 0.5),
        ];
        let days = DayList::from_samples(samples);

        assert_eq!(days.len(), 2);
        assert_eq!(days.get(0).unwrap().start_of_day, at(1, 0, 0));
        assert_eq!(days.get(0).unwrap().values.len(), 2);
        assert_eq!(days.get(1).unwrap().start_of_day, at(2, 0, 0));
        assert_eq!(days.get(1).unwrap().values.len(), 1);
    }

    #[test]
    fn test_empty_input() {
        let days = DayList::from_samples(Vec::new());
        assert!(days.is_empty());
    }

    #[test]
    fn test_single_sample() {
        let days = DayList::from_samples(vec![Sample::new(at(3, 12, 0), 0.5)]);
        assert_eq!(days.len(), 1);
        assert_eq!(days.first().unwrap().values.len(), 1);
    }

    #[test]
    fn test_multi_day_gap_has_no_empty_days() {
        let samples = vec![
            Sample::new(at(1, 10, 0), 0.1),
            Sample::new(at(4, 10, 0), 0.9),
        ];
        let days = DayList::from_samples(samples);

        let ids: Vec<_> = days.iter().map(Day::id).collect();
        assert_eq!(ids, vec![at(1, 0, 0), at(4, 0, 0)]);
        assert!(days.find(at(2, 0, 0)).is_none());
        assert!(days.find(at(3, 0, 0)).is_none());
    }

    #[test]
    fn test_midnight_sample_opens_new_day() {
        let samples = vec![
            Sample::new(at(1, 23, 59), 0.1),
            Sample::new(at(2, 0, 0), 0.2),
        ];
        let days = DayList::from_samples(samples);
        assert_eq!(days.len(), 2);
        assert_eq!(days.get(1).unwrap().values[0].timestamp, at(2, 0, 0));
    }

    #[test]
    fn test_resume_keeps_existing_values() {
        let day = Day {
            start_of_day: at(1, 0, 0),
            values: vec![Sample::new(at(1, 3, 0), 0.3)],
        };
        let mut bucketizer = DayBucketizer::resume(day);
        bucketizer.push(Sample::new(at(1, 5, 0), 0.4));
        bucketizer.push(Sample::new(at(2, 5, 0), 0.4));
        assert_eq!(bucketizer.days.len(), 1);

        let days = bucketizer.finish();
        assert_eq!(days.len(), 2);
        assert_eq!(days.first().unwrap().values.len(), 2);
    }

    /// Sorted samples spread over roughly two months, with gaps up to 4 days
    fn sorted_samples() -> impl Strategy<Value = Vec<Sample>> {
        prop::collection::vec((0i64..4 * SECONDS_PER_DAY, 0.0f64..=1.0), 0..200).prop_map(
            |steps| {
                let mut t = at(1, 0, 0);
                steps
                    .into_iter()
                    .map(|(gap, value)| {
                        t += TimeDelta::seconds(gap);
                        Sample::new(t, value)
                    })
                    .collect()
            },
        )
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(100))]

        #[test]
        fn prop_bucketing_keeps_every_sample_in_order(samples in sorted_samples()) {
            let days = DayList::from_samples(samples.clone());
            let flattened: Vec<Sample> = days.iter().flat_map(|d| d.values.iter().copied()).collect();
            prop_assert_eq!(flattened, samples);
        }

        #[test]
        fn prop_samples_fall_inside_their_day(samples in sorted_samples()) {
            let days = DayList::from_samples(samples);
            for day in &days {
                prop_assert!(!day.values.is_empty());
                for sample in &day.values {
                    prop_assert!(sample.timestamp >= day.start_of_day);
                    prop_assert!(sample.timestamp < day.start_of_day + day_length());
                }
            }
        }

        #[test]
        fn prop_days_strictly_increase(samples in sorted_samples()) {
            let days = DayList::from_samples(samples);
            for pair in days.days().windows(2) {
                prop_assert!(pair[0].start_of_day < pair[1].start_of_day);
            }
        }

        #[test]
        fn prop_extend_matches_bucketing_everything(
            samples in sorted_samples(),
            split in 0usize..200,
        ) {
            let split = split.min(samples.len());
            let mut days = DayList::from_samples(samples[..split].to_vec());
            days.extend(samples[split..].to_vec()).unwrap();
            prop_assert_eq!(days, DayList::from_samples(samples));
        }
    }
}
