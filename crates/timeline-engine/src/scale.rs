//! Time Scale
//!
//! Converts between absolute time and horizontal pixels, and between lane
//! indices and vertical pixels. X is measured from a fixed origin so
//! positions stay stable while more data is loaded on either side; it may
//! be negative.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use ticket_core::DateRange;

const MS_PER_MINUTE: f64 = 60_000.0;

/// Named zoom levels offered in the toolbar
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ZoomPreset {
    /// 240 px per hour
    Hour,
    /// 60 px per hour
    Day,
    /// 216 px per day
    Week,
    /// ~43 px per day
    Month,
}

impl ZoomPreset {
    pub const ALL: [ZoomPreset; 4] = [ZoomPreset::Hour, ZoomPreset::Day, ZoomPreset::Week, ZoomPreset::Month];

    pub fn pixels_per_minute(&self) -> f64 {
        match self {
            ZoomPreset::Hour => 4.0,
            ZoomPreset::Day => 1.0,
            ZoomPreset::Week => 0.15,
            ZoomPreset::Month => 0.03,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            ZoomPreset::Hour => "Hour",
            ZoomPreset::Day => "Day",
            ZoomPreset::Week => "Week",
            ZoomPreset::Month => "Month",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TimeScale {
    /// Time at x = 0
    pub origin: DateTime<Utc>,
    pub pixels_per_minute: f64,
    /// Height of one lane
    pub row_height: f64,
}

impl TimeScale {
    pub fn new(origin: DateTime<Utc>, pixels_per_minute: f64, row_height: f64) -> Self {
        Self {
            origin,
            pixels_per_minute,
            row_height,
        }
    }

    #[inline]
    pub fn time_to_x(&self, time: DateTime<Utc>) -> f64 {
        self.width_of(time - self.origin)
    }

    pub fn x_to_time(&self, x: f64) -> DateTime<Utc> {
        self.origin + self.duration_of(x)
    }

    /// Pixel width of a duration
    #[inline]
    pub fn width_of(&self, duration: Duration) -> f64 {
        duration.num_milliseconds() as f64 / MS_PER_MINUTE * self.pixels_per_minute
    }

    /// Duration covered by a pixel width (millisecond precision)
    pub fn duration_of(&self, width: f64) -> Duration {
        Duration::milliseconds((width / self.pixels_per_minute * MS_PER_MINUTE).round() as i64)
    }

    #[inline]
    pub fn lane_to_y(&self, lane: usize) -> f64 {
        lane as f64 * self.row_height
    }

    /// Lane under a vertical offset; anything above the first lane is lane 0
    pub fn y_to_lane(&self, y: f64) -> usize {
        if y <= 0.0 || !y.is_finite() {
            0
        } else {
            (y / self.row_height).floor() as usize
        }
    }

    /// Time range shown by a viewport scrolled to `scroll_x`
    pub fn visible_range(&self, scroll_x: f64, width: f64) -> DateRange {
        DateRange::new(self.x_to_time(scroll_x), self.x_to_time(scroll_x + width.max(0.0)))
    }

    /// Zoom by `factor` keeping the time under `anchor_offset` (pixels from
    /// the viewport's left edge) in place. Returns the new scale and the
    /// scroll position that keeps the anchor fixed.
    pub fn zoom_at(&self, scroll_x: f64, anchor_offset: f64, factor: f64, min_ppm: f64, max_ppm: f64) -> (TimeScale, f64) {
        let anchor_time = self.x_to_time(scroll_x + anchor_offset);
        let ppm = (self.pixels_per_minute * factor).clamp(min_ppm, max_ppm);
        let zoomed = TimeScale { pixels_per_minute: ppm, ..*self };
        let scroll = zoomed.time_to_x(anchor_time) - anchor_offset;
        (zoomed, scroll)
    }
}

/// Round a time to the nearest multiple of `minutes` (epoch aligned)
pub fn snap(time: DateTime<Utc>, minutes: i64) -> DateTime<Utc> {
    if minutes <= 0 {
        return time;
    }
    let step = minutes * 60_000;
    let ms = time.timestamp_millis();
    let floored = ms.div_euclid(step) * step;
    let snapped = if ms - floored >= step / 2 { floored + step } else { floored };
    DateTime::from_timestamp_millis(snapped).unwrap_or(time)
}
