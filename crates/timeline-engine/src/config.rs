//! Timeline Configuration
//!
//! Tunables for layout, gestures and the overlays. Every field has a
//! default, so a JSON override only needs the keys it changes.

use chrono::Duration;
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("config is not valid JSON: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("invalid config value for {field}: {reason}")]
    Invalid { field: &'static str, reason: String },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TimelineConfig {
    /// Height of one lane in pixels
    pub row_height: f64,
    /// Vertical gap between ticket boxes in adjacent lanes
    pub lane_gap: f64,
    /// Initial zoom
    pub pixels_per_minute: f64,
    pub min_pixels_per_minute: f64,
    pub max_pixels_per_minute: f64,
    /// Pointer travel before a press turns into a drag
    pub drag_threshold_px: f64,
    /// Width of the resize handles at either end of a ticket
    pub resize_handle_px: f64,
    /// Drag results snap to this many minutes (0 disables snapping)
    pub snap_minutes: i64,
    /// Resizing never shrinks a ticket below this
    pub min_duration_minutes: i64,
    /// How often the "now" marker is recomputed
    pub now_refresh_secs: i64,
    /// Pixels per wheel line (DOM_DELTA_LINE)
    pub wheel_line_px: f64,
    /// Pixels per wheel page (DOM_DELTA_PAGE)
    pub wheel_page_px: f64,
    /// Zoom factor per pixel of ctrl+wheel delta, applied exponentially
    pub zoom_sensitivity: f64,
    /// Velocity kept per 16 ms frame of momentum
    pub momentum_friction: f64,
    /// Momentum stops below this speed (px/ms)
    pub momentum_min_velocity: f64,
    /// Prefetch when the visible window is this close to the loaded edge
    pub prefetch_threshold_px: f64,
    /// Days fetched per prefetch
    pub prefetch_days: i64,
    /// Days loaded around "now" on start-up
    pub initial_days: i64,
    /// Location used for the day/night overlay
    pub latitude: f64,
    pub longitude: f64,
}

impl Default for TimelineConfig {
    fn default() -> Self {
        Self {
            row_height: 44.0,
            lane_gap: 4.0,
            pixels_per_minute: 1.0,
            min_pixels_per_minute: 0.01,
            max_pixels_per_minute: 8.0,
            drag_threshold_px: 5.0,
            resize_handle_px: 8.0,
            snap_minutes: 5,
            min_duration_minutes: 5,
            now_refresh_secs: 30,
            wheel_line_px: 40.0,
            wheel_page_px: 800.0,
            zoom_sensitivity: 0.002,
            momentum_friction: 0.95,
            momentum_min_velocity: 0.02,
            prefetch_threshold_px: 400.0,
            prefetch_days: 14,
            initial_days: 14,
            latitude: 51.4779,
            longitude: 0.0,
        }
    }
}

impl TimelineConfig {
    /// Parse a (possibly partial) JSON override and validate it
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        fn positive(field: &'static str, value: f64) -> Result<(), ConfigError> {
            if value.is_finite() && value > 0.0 {
                Ok(())
            } else {
                Err(ConfigError::Invalid {
                    field,
                    reason: format!("must be a positive number, got {}", value),
                })
            }
        }

        positive("row_height", self.row_height)?;
        positive("min_pixels_per_minute", self.min_pixels_per_minute)?;
        positive("max_pixels_per_minute", self.max_pixels_per_minute)?;
        positive("wheel_line_px", self.wheel_line_px)?;
        positive("wheel_page_px", self.wheel_page_px)?;

        if self.min_pixels_per_minute > self.max_pixels_per_minute {
            return Err(ConfigError::Invalid {
                field: "min_pixels_per_minute",
                reason: "must not exceed max_pixels_per_minute".to_string(),
            });
        }
        if !(self.min_pixels_per_minute..=self.max_pixels_per_minute).contains(&self.pixels_per_minute) {
            return Err(ConfigError::Invalid {
                field: "pixels_per_minute",
                reason: "must lie between the zoom bounds".to_string(),
            });
        }
        if self.lane_gap < 0.0 || self.lane_gap >= self.row_height {
            return Err(ConfigError::Invalid {
                field: "lane_gap",
                reason: "must be non-negative and smaller than row_height".to_string(),
            });
        }
        if !(0.0..1.0).contains(&self.momentum_friction) {
            return Err(ConfigError::Invalid {
                field: "momentum_friction",
                reason: "must be in [0, 1)".to_string(),
            });
        }
        if self.min_duration_minutes < 1 {
            return Err(ConfigError::Invalid {
                field: "min_duration_minutes",
                reason: "must be at least 1".to_string(),
            });
        }
        if self.snap_minutes < 0 || self.now_refresh_secs < 1 || self.prefetch_days < 1 || self.initial_days < 1 {
            return Err(ConfigError::Invalid {
                field: "intervals",
                reason: "snap must be >= 0; refresh, prefetch and initial spans must be >= 1".to_string(),
            });
        }
        if !(-90.0..=90.0).contains(&self.latitude) || !(-180.0..=180.0).contains(&self.longitude) {
            return Err(ConfigError::Invalid {
                field: "latitude/longitude",
                reason: format!("({}, {}) is not a location", self.latitude, self.longitude),
            });
        }
        Ok(())
    }

    pub fn min_duration(&self) -> Duration {
        Duration::minutes(self.min_duration_minutes)
    }

    pub fn now_refresh(&self) -> Duration {
        Duration::seconds(self.now_refresh_secs)
    }

    pub fn prefetch_span(&self) -> Duration {
        Duration::days(self.prefetch_days)
    }

    /// Clamp a zoom level to the configured bounds
    pub fn clamp_zoom(&self, pixels_per_minute: f64) -> f64 {
        pixels_per_minute.clamp(self.min_pixels_per_minute, self.max_pixels_per_minute)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        let config = TimelineConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.min_duration(), Duration::minutes(5));
        assert_eq!(config.now_refresh(), Duration::seconds(30));
    }

    #[test]
    fn test_partial_override() {
        let config = TimelineConfig::from_json(r#"{ "row_height": 60, "latitude": 59.3 }"#).unwrap();
        assert_eq!(config.row_height, 60.0);
        assert_eq!(config.latitude, 59.3);
        assert_eq!(config.snap_minutes, 5);
    }

    #[test]
    fn test_rejects_bad_values() {
        assert!(matches!(TimelineConfig::from_json("{ not json"), Err(ConfigError::Parse(_))));
        assert!(matches!(
            TimelineConfig::from_json(r#"{ "row_height": 0 }"#),
            Err(ConfigError::Invalid { field: "row_height", .. })
        ));
        assert!(matches!(
            TimelineConfig::from_json(r#"{ "pixels_per_minute": 100 }"#),
            Err(ConfigError::Invalid { field: "pixels_per_minute", .. })
        ));
        assert!(matches!(
            TimelineConfig::from_json(r#"{ "momentum_friction": 1.0 }"#),
            Err(ConfigError::Invalid { field: "momentum_friction", .. })
        ));
    }

    #[test]
    fn test_clamp_zoom() {
        let config = TimelineConfig::default();
        assert_eq!(config.clamp_zoom(100.0), 8.0);
        assert_eq!(config.clamp_zoom(0.0), 0.01);
    }
}
