//! Time Axis Markers
//!
//! Major and minor ticks for the time axis. The pair of units depends on
//! the zoom level and ticks fall on local calendar boundaries, so a day
//! marker sits at local midnight rather than UTC midnight. The zone's
//! offset is looked up per boundary, so ranges crossing a daylight-saving
//! change keep their ticks on the local hour.

use chrono::{DateTime, Datelike, Duration, Months, NaiveDateTime, NaiveTime, TimeZone, Timelike, Utc};
use serde::{Deserialize, Serialize};
use ticket_core::DateRange;

use crate::scale::TimeScale;

/// Upper bound on markers produced for one range
pub const MAX_MARKERS: usize = 2_000;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MarkerKind {
    Major,
    Minor,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Marker {
    pub time: DateTime<Utc>,
    pub x: f64,
    pub kind: MarkerKind,
    pub label: String,
}

/// Calendar unit a tick falls on
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickUnit {
    Minutes(u32),
    Hour,
    Day,
    /// Weeks start on Monday
    Week,
    Month,
}

impl TickUnit {
    /// Start of the unit containing `t`
    fn floor(self, t: NaiveDateTime) -> NaiveDateTime {
        let date = t.date();
        match self {
            TickUnit::Minutes(step) => {
                let step = step.max(1);
                let minute = t.minute() - t.minute() % step;
                date.and_time(NaiveTime::from_hms_opt(t.hour(), minute, 0).unwrap_or(NaiveTime::MIN))
            }
            TickUnit::Hour => date.and_time(NaiveTime::from_hms_opt(t.hour(), 0, 0).unwrap_or(NaiveTime::MIN)),
            TickUnit::Day => date.and_time(NaiveTime::MIN),
            TickUnit::Week => {
                let monday = date - Duration::days(date.weekday().num_days_from_monday() as i64);
                monday.and_time(NaiveTime::MIN)
            }
            TickUnit::Month => date.with_day(1).unwrap_or(date).and_time(NaiveTime::MIN),
        }
    }

    fn next(self, t: NaiveDateTime) -> Option<NaiveDateTime> {
        match self {
            TickUnit::Minutes(step) => t.checked_add_signed(Duration::minutes(step.max(1) as i64)),
            TickUnit::Hour => t.checked_add_signed(Duration::hours(1)),
            TickUnit::Day => t.checked_add_signed(Duration::days(1)),
            TickUnit::Week => t.checked_add_signed(Duration::weeks(1)),
            TickUnit::Month => t.checked_add_months(Months::new(1)),
        }
    }

    fn label(self, t: NaiveDateTime, kind: MarkerKind) -> String {
        let format = match (self, kind) {
            (TickUnit::Minutes(_), _) | (TickUnit::Hour, _) => "%H:%M",
            (TickUnit::Day, MarkerKind::Major) => "%a %d %b",
            (TickUnit::Day, MarkerKind::Minor) => "%a %d",
            (TickUnit::Week, _) => "%d %b",
            (TickUnit::Month, _) => "%B %Y",
        };
        t.format(format).to_string()
    }
}

/// Minor and major units for a zoom level
pub fn tick_units(pixels_per_minute: f64) -> (TickUnit, TickUnit) {
    if pixels_per_minute >= 2.0 {
        (TickUnit::Minutes(15), TickUnit::Hour)
    } else if pixels_per_minute >= 0.5 {
        (TickUnit::Hour, TickUnit::Day)
    } else if pixels_per_minute >= 0.05 {
        (TickUnit::Day, TickUnit::Week)
    } else {
        (TickUnit::Week, TickUnit::Month)
    }
}

/// Boundaries of `unit` inside `range`, in local time. A boundary inside
/// a spring-forward gap is skipped; an ambiguous one takes the earlier
/// instant.
fn boundaries<Tz: TimeZone>(unit: TickUnit, range: DateRange, tz: &Tz) -> Vec<DateTime<Utc>> {
    let local_start = range.start.with_timezone(tz).naive_local();

    let mut out = Vec::new();
    let mut cursor = Some(unit.floor(local_start));
    while let Some(local) = cursor {
        cursor = unit.next(local);
        let Some(time) = tz.from_local_datetime(&local).earliest().map(|t| t.with_timezone(&Utc)) else {
            continue;
        };
        if time > range.end || out.len() >= MAX_MARKERS {
            break;
        }
        if time >= range.start && out.last().map_or(true, |last| *last < time) {
            out.push(time);
        }
    }
    out
}

/// Markers for `range`, sorted by time. A minor tick that coincides with
/// a major one is dropped.
pub fn generate_markers<Tz: TimeZone>(scale: &TimeScale, range: DateRange, tz: &Tz) -> Vec<Marker> {
    let (minor, major) = tick_units(scale.pixels_per_minute);
    let make = |unit: TickUnit, kind: MarkerKind, time: DateTime<Utc>| Marker {
        time,
        x: scale.time_to_x(time),
        kind,
        label: unit.label(time.with_timezone(tz).naive_local(), kind),
    };

    let majors = boundaries(major, range, tz);
    let mut markers: Vec<Marker> = boundaries(minor, range, tz)
        .into_iter()
        .filter(|t| majors.binary_search(t).is_err())
        .map(|t| make(minor, MarkerKind::Minor, t))
        .collect();
    markers.extend(majors.into_iter().map(|t| make(major, MarkerKind::Major, t)));
    markers.sort_by_key(|m| m.time);
    markers.truncate(MAX_MARKERS);
    markers
}

/// The live "now" line
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NowMarker {
    pub at: DateTime<Utc>,
    pub refresh: Duration,
}

impl NowMarker {
    pub fn new(now: DateTime<Utc>, refresh: Duration) -> Self {
        Self { at: now, refresh }
    }

    /// Move to `now` once the refresh interval has elapsed, or if the clock
    /// went backwards. Returns whether the marker moved.
    pub fn tick(&mut self, now: DateTime<Utc>) -> bool {
        if now - self.at >= self.refresh || now < self.at {
            self.at = now;
            true
        } else {
            false
        }
    }

    pub fn x(&self, scale: &TimeScale) -> f64 {
        scale.time_to_x(self.at)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{FixedOffset, LocalResult, NaiveDate};

    /// Central European time for 2024: CEST from 31 Mar 01:00 UTC to
    /// 27 Oct 01:00 UTC, CET otherwise
    #[derive(Debug, Clone, Copy)]
    struct Cet2024;

    impl Cet2024 {
        fn cet() -> FixedOffset {
            FixedOffset::east_opt(3600).unwrap()
        }

        fn cest() -> FixedOffset {
            FixedOffset::east_opt(2 * 3600).unwrap()
        }
    }

    impl TimeZone for Cet2024 {
        type Offset = FixedOffset;

        fn from_offset(_offset: &FixedOffset) -> Self {
            Cet2024
        }

        fn offset_from_local_date(&self, local: &NaiveDate) -> LocalResult<FixedOffset> {
            self.offset_from_local_datetime(&local.and_time(NaiveTime::MIN))
        }

        fn offset_from_local_datetime(&self, local: &NaiveDateTime) -> LocalResult<FixedOffset> {
            let valid: Vec<FixedOffset> = [Self::cest(), Self::cet()]
                .into_iter()
                .filter(|off| {
                    let utc = *local - Duration::seconds(off.local_minus_utc() as i64);
                    self.offset_from_utc_datetime(&utc) == *off
                })
                .collect();
            match valid.as_slice() {
                [one] => LocalResult::Single(*one),
                [early, late] => LocalResult::Ambiguous(*early, *late),
                _ => LocalResult::None,
            }
        }

        fn offset_from_utc_date(&self, utc: &NaiveDate) -> FixedOffset {
            self.offset_from_utc_datetime(&utc.and_time(NaiveTime::MIN))
        }

        fn offset_from_utc_datetime(&self, utc: &NaiveDateTime) -> FixedOffset {
            let summer_from = utc_naive(2024, 3, 31, 1);
            let summer_to = utc_naive(2024, 10, 27, 1);
            if *utc >= summer_from && *utc < summer_to {
                Self::cest()
            } else {
                Self::cet()
            }
        }
    }

    fn utc_naive(y: i32, mo: u32, d: u32, h: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(y, mo, d).unwrap().and_hms_opt(h, 0, 0).unwrap()
    }

    fn utc(y: i32, mo: u32, d: u32, h: u32, mi: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, mo, d, h, mi, 0).unwrap()
    }

    fn utc_offset() -> FixedOffset {
        FixedOffset::east_opt(0).unwrap()
    }

    #[test]
    fn test_hour_and_day_ticks() {
        let scale = TimeScale::new(utc(2024, 7, 1, 0, 0), 1.0, 40.0);
        let range = DateRange::new(utc(2024, 7, 1, 22, 30), utc(2024, 7, 2, 2, 10));
        let markers = generate_markers(&scale, range, &utc_offset());

        let summary: Vec<(MarkerKind, &str)> = markers.iter().map(|m| (m.kind, m.label.as_str())).collect();
        assert_eq!(
            summary,
            vec![
                (MarkerKind::Minor, "23:00"),
                (MarkerKind::Major, "Tue 02 Jul"),
                (MarkerKind::Minor, "01:00"),
                (MarkerKind::Minor, "02:00"),
            ]
        );
        assert_eq!(markers[1].time, utc(2024, 7, 2, 0, 0));
        assert_eq!(markers[1].x, 24.0 * 60.0);
    }

    #[test]
    fn test_day_boundary_follows_local_offset() {
        let scale = TimeScale::new(utc(2024, 7, 1, 0, 0), 1.0, 40.0);
        let range = DateRange::new(utc(2024, 7, 1, 12, 0), utc(2024, 7, 2, 12, 0));
        let cest = FixedOffset::east_opt(2 * 3600).unwrap();
        let majors: Vec<DateTime<Utc>> = generate_markers(&scale, range, &cest)
            .into_iter()
            .filter(|m| m.kind == MarkerKind::Major)
            .map(|m| m.time)
            .collect();
        assert_eq!(majors, vec![utc(2024, 7, 1, 22, 0)]);
    }

    #[test]
    fn test_quarter_hours_when_zoomed_in() {
        let scale = TimeScale::new(utc(2024, 7, 1, 0, 0), 4.0, 40.0);
        let range = DateRange::new(utc(2024, 7, 1, 9, 50), utc(2024, 7, 1, 10, 35));
        let labels: Vec<String> = generate_markers(&scale, range, &utc_offset()).into_iter().map(|m| m.label).collect();
        assert_eq!(labels, vec!["10:00", "10:15", "10:30"]);
    }

    #[test]
    fn test_weeks_start_monday() {
        let scale = TimeScale::new(utc(2024, 7, 1, 0, 0), 0.1, 40.0);
        let range = DateRange::new(utc(2024, 7, 3, 0, 0), utc(2024, 7, 10, 0, 0));
        let markers = generate_markers(&scale, range, &utc_offset());
        let majors: Vec<&Marker> = markers.iter().filter(|m| m.kind == MarkerKind::Major).collect();
        assert_eq!(majors.len(), 1);
        assert_eq!(majors[0].time, utc(2024, 7, 8, 0, 0));
        assert_eq!(markers.iter().filter(|m| m.kind == MarkerKind::Minor).count(), 7);
    }

    #[test]
    fn test_month_ticks_when_zoomed_out() {
        let scale = TimeScale::new(utc(2024, 1, 1, 0, 0), 0.01, 40.0);
        let range = DateRange::new(utc(2024, 1, 15, 0, 0), utc(2024, 3, 15, 0, 0));
        let majors: Vec<String> = generate_markers(&scale, range, &utc_offset())
            .into_iter()
            .filter(|m| m.kind == MarkerKind::Major)
            .map(|m| m.label)
            .collect();
        assert_eq!(majors, vec!["February 2024", "March 2024"]);
    }

    #[test]
    fn test_marker_count_is_capped() {
        let scale = TimeScale::new(utc(2024, 1, 1, 0, 0), 4.0, 40.0);
        let range = DateRange::new(utc(2020, 1, 1, 0, 0), utc(2024, 1, 1, 0, 0));
        assert!(generate_markers(&scale, range, &utc_offset()).len() <= MAX_MARKERS);
    }

    #[test]
    fn test_now_marker_refreshes_every_interval() {
        let start = utc(2024, 7, 1, 12, 0);
        let mut now = NowMarker::new(start, Duration::seconds(30));
        assert!(!now.tick(start + Duration::seconds(29)));
        assert_eq!(now.at, start);
        assert!(now.tick(start + Duration::seconds(30)));
        assert_eq!(now.at, start + Duration::seconds(30));
        assert!(now.tick(start));

        let scale = TimeScale::new(start - Duration::hours(1), 1.0, 40.0);
        assert_eq!(now.x(&scale), 60.0);
    }

    #[test]
    fn test_ticks_follow_daylight_saving_change() {
        let scale = TimeScale::new(utc(2024, 3, 30, 0, 0), 1.0, 40.0);
        let range = DateRange::new(utc(2024, 3, 30, 12, 0), utc(2024, 4, 1, 12, 0));
        let markers = generate_markers(&scale, range, &Cet2024);

        let majors: Vec<DateTime<Utc>> = markers.iter().filter(|m| m.kind == MarkerKind::Major).map(|m| m.time).collect();
        // Local midnight is 23:00 UTC before the change and 22:00 UTC after
        assert_eq!(majors, vec![utc(2024, 3, 30, 23, 0), utc(2024, 3, 31, 22, 0)]);

        let label_at = |t: DateTime<Utc>| markers.iter().find(|m| m.time == t).map(|m| m.label.clone());
        assert_eq!(label_at(utc(2024, 3, 31, 0, 0)).as_deref(), Some("01:00"));
        assert_eq!(label_at(utc(2024, 3, 31, 1, 0)).as_deref(), Some("03:00"));
        assert!(markers.windows(2).all(|w| w[0].time < w[1].time));
    }
}
