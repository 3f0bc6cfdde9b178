//! Day/Night Overlay
//!
//! Sunrise and sunset from the standard sunrise equation, accurate to
//! roughly a minute away from the poles. The timeline shades the
//! complement of daylight as night bands.

use chrono::{DateTime, Duration, NaiveDate, NaiveTime, Utc};
use serde::{Deserialize, Serialize};
use ticket_core::DateRange;

/// Julian date of the Unix epoch
const JD_UNIX_EPOCH: f64 = 2_440_587.5;
/// Julian date of J2000.0
const JD_2000: f64 = 2_451_545.0;
const MS_PER_DAY: f64 = 86_400_000.0;
/// Earth's axial tilt in degrees
const OBLIQUITY: f64 = 23.4397;
/// Sun altitude at rise/set, accounting for refraction and disc size
const HORIZON: f64 = -0.833;
/// Gaps between daylight spans shorter than this are not night
const MERGE_SLACK_SECS: i64 = 120;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Daylight {
    Interval { sunrise: DateTime<Utc>, sunset: DateTime<Utc> },
    /// Sun never sets
    PolarDay,
    /// Sun never rises
    PolarNight,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SunTimes {
    pub date: NaiveDate,
    pub solar_noon: DateTime<Utc>,
    pub daylight: Daylight,
}

impl SunTimes {
    /// Daylight span for the day; polar day is the 24 h around solar noon
    pub fn daylight_range(&self) -> Option<DateRange> {
        match self.daylight {
            Daylight::Interval { sunrise, sunset } => Some(DateRange::new(sunrise, sunset)),
            Daylight::PolarDay => Some(DateRange::new(
                self.solar_noon - Duration::hours(12),
                self.solar_noon + Duration::hours(12),
            )),
            Daylight::PolarNight => None,
        }
    }

    pub fn day_length(&self) -> Duration {
        self.daylight_range().map(|r| r.duration()).unwrap_or_else(Duration::zero)
    }
}

fn julian_to_utc(jd: f64) -> DateTime<Utc> {
    let ms = ((jd - JD_UNIX_EPOCH) * MS_PER_DAY).round() as i64;
    DateTime::from_timestamp_millis(ms).unwrap_or_default()
}

fn sin_deg(deg: f64) -> f64 {
    deg.to_radians().sin()
}

/// Sun times for a UTC calendar date at a location (degrees, east and
/// north positive)
pub fn sun_times(date: NaiveDate, latitude: f64, longitude: f64) -> SunTimes {
    let midnight = date.and_time(NaiveTime::MIN).and_utc();
    let jd_midnight = midnight.timestamp() as f64 / 86_400.0 + JD_UNIX_EPOCH;

    // Mean solar time
    let n = (jd_midnight - JD_2000 + 0.0008).ceil();
    let mean_solar = n - longitude / 360.0;

    let anomaly = (357.5291 + 0.985_600_28 * mean_solar).rem_euclid(360.0);
    let center = 1.9148 * sin_deg(anomaly) + 0.02 * sin_deg(2.0 * anomaly) + 0.0003 * sin_deg(3.0 * anomaly);
    let ecliptic_lon = (anomaly + center + 180.0 + 102.9372).rem_euclid(360.0);

    let transit = JD_2000 + mean_solar + 0.0053 * sin_deg(anomaly) - 0.0069 * sin_deg(2.0 * ecliptic_lon);

    let sin_decl = sin_deg(ecliptic_lon) * sin_deg(OBLIQUITY);
    let cos_decl = sin_decl.asin().cos();
    let lat = latitude.to_radians();
    let cos_hour_angle = (sin_deg(HORIZON) - lat.sin() * sin_decl) / (lat.cos() * cos_decl);

    let daylight = if cos_hour_angle > 1.0 {
        Daylight::PolarNight
    } else if cos_hour_angle < -1.0 {
        Daylight::PolarDay
    } else {
        let hour_angle = cos_hour_angle.acos().to_degrees();
        Daylight::Interval {
            sunrise: julian_to_utc(transit - hour_angle / 360.0),
            sunset: julian_to_utc(transit + hour_angle / 360.0),
        }
    };

    SunTimes {
        date,
        solar_noon: julian_to_utc(transit),
        daylight,
    }
}

/// Night intervals intersecting `range`, clipped to it and in order
pub fn night_bands(range: DateRange, latitude: f64, longitude: f64) -> Vec<DateRange> {
    let first = range.start.date_naive() - Duration::days(1);
    let last = range.end.date_naive() + Duration::days(1);

    let mut daylight: Vec<DateRange> = first
        .iter_days()
        .take_while(|d| *d <= last)
        .filter_map(|d| sun_times(d, latitude, longitude).daylight_range())
        .collect();
    daylight.sort_by_key(|r| r.start);

    let mut merged: Vec<DateRange> = Vec::with_capacity(daylight.len());
    for day in daylight {
        match merged.last_mut() {
            Some(prev) if day.start <= prev.end + Duration::seconds(MERGE_SLACK_SECS) => *prev = prev.union(&day),
            _ => merged.push(day),
        }
    }

    let mut bands = Vec::new();
    let mut cursor = range.start;
    for day in merged {
        if day.end <= cursor {
            continue;
        }
        if day.start >= range.end {
            break;
        }
        if day.start > cursor {
            bands.push(DateRange::new(cursor, day.start));
        }
        cursor = day.end;
    }
    if cursor < range.end {
        bands.push(DateRange::new(cursor, range.end));
    }
    bands
}
