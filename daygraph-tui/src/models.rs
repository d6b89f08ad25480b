//! Domain models for the day graph.
//!
//! Samples are timestamped scalars in `[0, 1]`. Days own the samples that
//! fall inside one UTC calendar day, and a `DayList` keeps the days in
//! ascending order for the whole session.

use chrono::{DateTime, NaiveDate, Utc};
use uuid::Uuid;

use crate::bucket::DayBucketizer;
use crate::error::{GraphError, GraphResult};

/// Identity of a day: the UTC midnight it starts at
pub type DayId = DateTime<Utc>;

// ============================================
// Samples
// ============================================

/// A single data point of the series
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Sample {
    pub id: Uuid,
    pub timestamp: DateTime<Utc>,
    /// Between 0 and 1
    pub value: f64,
}

impl Sample {
    pub fn new(timestamp: DateTime<Utc>, value: f64) -> Self {
        Self {
            id: Uuid::new_v4(),
            timestamp,
            value,
        }
    }
}

// ============================================
// Days
// ============================================

/// All samples recorded during one UTC day
#[derive(Debug, Clone, PartialEq)]
pub struct Day {
    pub start_of_day: DayId,
    /// Sorted by timestamp, never empty
    pub values: Vec<Sample>,
}

impl Day {
    pub fn id(&self) -> DayId {
        self.start_of_day
    }

    /// Calendar date of the day
    pub fn date(&self) -> NaiveDate {
        self.start_of_day.date_naive()
    }

    pub fn first(&self) -> Option<&Sample> {
        self.values.first()
    }

    pub fn last(&self) -> Option<&Sample> {
        self.values.last()
    }
}

// ============================================
// Day list
// ============================================

/// Days in strictly ascending order, built once from a sorted sample stream.
///
/// The list only ever grows at the end (see [`DayList::extend`]).
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DayList {
    days: Vec<Day>,
}

impl DayList {
    pub fn new() -> Self {
        Self::default()
    }

    /// Bucket a sorted sample stream into days
    pub fn from_samples(samples: impl IntoIterator<Item = Sample>) -> Self {
        let mut bucketizer = DayBucketizer::new();
        for sample in samples {
            bucketizer.push(sample);
        }
        bucketizer.finish()
    }

    pub(crate) fn from_days(days: Vec<Day>) -> Self {
        Self { days }
    }

    pub fn days(&self) -> &[Day] {
        &self.days
    }

    pub fn len(&self) -> usize {
        self.days.len()
    }

    pub fn is_empty(&self) -> bool {
        self.days.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&Day> {
        self.days.get(index)
    }

    pub fn first(&self) -> Option<&Day> {
        self.days.first()
    }

    pub fn last(&self) -> Option<&Day> {
        self.days.last()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Day> {
        self.days.iter()
    }

    /// Total number of samples across all days
    pub fn sample_count(&self) -> usize {
        self.days.iter().map(|d| d.values.len()).sum()
    }

    /// Position of the day with the given identity
    pub fn index_of(&self, id: DayId) -> Option<usize> {
        self.days.binary_search_by_key(&id, |d| d.start_of_day).ok()
    }

    pub fn find(&self, id: DayId) -> Option<&Day> {
        self.index_of(id).and_then(|i| self.days.get(i))
    }

    /// Position of the loaded day closest to `id`; earlier day wins a tie
    pub fn nearest_index(&self, id: DayId) -> Option<usize> {
        if self.days.is_empty() {
            return None;
        }
        match self.days.binary_search_by_key(&id, |d| d.start_of_day) {
            Ok(i) => Some(i),
            Err(0) => Some(0),
            Err(i) if i == self.days.len() => Some(i - 1),
            Err(i) => {
                let before = id - self.days[i - 1].start_of_day;
                let after = self.days[i].start_of_day - id;
                Some(if after < before { i } else { i - 1 })
            }
        }
    }

    /// First sample of the day after `index`, used for the connecting edge
    pub fn first_point_of_next_day(&self, index: usize) -> Option<&Sample> {
        self.days.get(index + 1).and_then(Day::first)
    }

    /// Timestamp of the most recent sample
    pub fn last_timestamp(&self) -> Option<DateTime<Utc>> {
        self.last().and_then(Day::last).map(|s| s.timestamp)
    }

    /// Append samples that continue the series forward in time.
    ///
    /// The last day is reopened so samples landing on it join that bucket.
    /// Nothing is appended if any sample is older than its predecessor.
    pub fn extend(&mut self, samples: impl IntoIterator<Item = Sample>) -> GraphResult<usize> {
        let samples: Vec<Sample> = samples.into_iter().collect();

        let mut last = self.last_timestamp();
        for sample in &samples {
            if let Some(prev) = last {
                if sample.timestamp < prev {
                    return Err(GraphError::OutOfOrder {
                        last: prev,
                        got: sample.timestamp,
                    });
                }
            }
            last = Some(sample.timestamp);
        }

        let added = samples.len();
        let mut bucketizer = match self.days.pop() {
            Some(day) => DayBucketizer::resume(day),
            None => DayBucketizer::new(),
        };
        for sample in samples {
            bucketizer.push(sample);
        }
        self.days.extend(bucketizer.finish().days);
        Ok(added)
    }
}

impl<'a> IntoIterator for &'a DayList {
    type Item = &'a Day;
    type IntoIter = std::slice::Iter<'a, Day>;

    fn into_iter(self) -> Self::IntoIter {
        self.days.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn at(day: u32, hour: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, day, hour, 0, 0).unwrap()
    }

    fn list(points: &[(u32, u32, f64)]) -> DayList {
        DayList::from_samples(points.iter().map(|&(d, h, v)| Sample::new(at(d, h), v)))
    }

    #[test]
    fn test_index_lookup() {
        let days = list(&[(1, 8, 0.1), (3, 9, 0.2), (4, 10, 0.3)]);
        assert_eq!(days.index_of(at(3, 0)), Some(1));
        assert_eq!(days.index_of(at(2, 0)), None);
        assert_eq!(days.find(at(4, 0)).map(|d| d.values.len()), Some(1));
    }

    #[test]
    fn test_nearest_index() {
        let days = list(&[(1, 8, 0.1), (5, 9, 0.2)]);
        assert_eq!(days.nearest_index(at(2, 0)), Some(0));
        assert_eq!(days.nearest_index(at(4, 0)), Some(1));
        // Equidistant: the earlier day wins
        assert_eq!(days.nearest_index(at(3, 0)), Some(0));
        assert_eq!(days.nearest_index(at(28, 0)), Some(1));
        assert_eq!(DayList::new().nearest_index(at(1, 0)), None);
    }

    #[test]
    fn test_first_point_of_next_day() {
        let days = list(&[(1, 8, 0.1), (1, 20, 0.9), (2, 3, 0.4)]);
        let next = days.first_point_of_next_day(0).unwrap();
        assert_eq!(next.timestamp, at(2, 3));
        assert!(days.first_point_of_next_day(1).is_none());
    }

    #[test]
    fn test_extend_joins_last_day() {
        let mut days = list(&[(1, 8, 0.1), (2, 8, 0.2)]);
        let added = days
            .extend(vec![Sample::new(at(2, 12), 0.5), Sample::new(at(4, 1), 0.6)])
            .unwrap();
        assert_eq!(added, 2);
        assert_eq!(days.len(), 3);
        assert_eq!(days.get(1).unwrap().values.len(), 2);
        assert_eq!(days.last().unwrap().id(), at(4, 0));
    }

    #[test]
    fn test_extend_rejects_older_samples() {
        let mut days = list(&[(2, 8, 0.2)]);
        let before = days.clone();
        let err = days.extend(vec![Sample::new(at(1, 8), 0.5)]).unwrap_err();
        assert!(matches!(err, GraphError::OutOfOrder { .. }));
        assert_eq!(days, before);
    }
}
