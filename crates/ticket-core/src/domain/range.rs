//! Date Range
//!
//! Half-open interval [start, end) used for loaded and visible windows.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DateRange {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

impl DateRange {
    /// Creates a range, swapping the bounds if they arrive reversed
    pub fn new(start: DateTime<Utc>, end: DateTime<Utc>) -> Self {
        if end < start {
            Self { start: end, end: start }
        } else {
            Self { start, end }
        }
    }

    /// Range of `days` whole days centred on `center`
    pub fn around(center: DateTime<Utc>, days: i64) -> Self {
        let half = Duration::days(days) / 2;
        Self::new(center - half, center + half)
    }

    #[inline]
    pub fn duration(&self) -> Duration {
        self.end - self.start
    }

    #[inline]
    pub fn contains(&self, time: DateTime<Utc>) -> bool {
        time >= self.start && time < self.end
    }

    pub fn intersects(&self, start: DateTime<Utc>, end: DateTime<Utc>) -> bool {
        self.start < end && start < self.end
    }

    /// Whether `other` lies entirely inside this range
    pub fn covers(&self, other: &DateRange) -> bool {
        other.start >= self.start && other.end <= self.end
    }

    /// Smallest range covering both
    pub fn union(&self, other: &DateRange) -> DateRange {
        DateRange {
            start: self.start.min(other.start),
            end: self.end.max(other.end),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_range_basics() {
        let a = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        let b = Utc.with_ymd_and_hms(2024, 1, 8, 0, 0, 0).unwrap();
        let range = DateRange::new(b, a);
        assert_eq!(range.start, a);
        assert!(range.contains(a));
        assert!(!range.contains(b));
        assert!(!range.intersects(b, b + Duration::days(1)));

        let later = DateRange::new(b, b + Duration::days(7));
        let joined = range.union(&later);
        assert_eq!(joined.duration(), Duration::days(14));
        assert!(joined.covers(&range));
        assert!(!range.covers(&joined));
    }
}
