//! Wheel Scrolling and Viewport
//!
//! Wheel events arrive in pixels, lines or pages depending on the device.
//! They are normalised to pixels and turned into a scroll or, with Ctrl
//! held (which is also how trackpad pinch is reported), a zoom.

use serde::{Deserialize, Serialize};
use ticket_core::DateRange;

use crate::config::TimelineConfig;
use crate::scale::TimeScale;

/// `WheelEvent.deltaMode`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum DeltaMode {
    #[default]
    Pixel,
    Line,
    Page,
}

impl DeltaMode {
    pub fn from_dom(mode: u32) -> Self {
        match mode {
            1 => DeltaMode::Line,
            2 => DeltaMode::Page,
            _ => DeltaMode::Pixel,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct WheelInput {
    pub delta_x: f64,
    pub delta_y: f64,
    pub mode: DeltaMode,
    pub ctrl: bool,
    pub shift: bool,
    /// Pointer offset from the viewport's left edge
    pub offset_x: f64,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum WheelAction {
    Scroll { dx: f64, dy: f64 },
    /// Multiply pixels-per-minute by `factor`, keeping `anchor_x` fixed
    Zoom { factor: f64, anchor_x: f64 },
}

impl WheelInput {
    /// Deltas in pixels
    pub fn pixels(&self, config: &TimelineConfig) -> (f64, f64) {
        let unit = match self.mode {
            DeltaMode::Pixel => 1.0,
            DeltaMode::Line => config.wheel_line_px,
            DeltaMode::Page => config.wheel_page_px,
        };
        (self.delta_x * unit, self.delta_y * unit)
    }

    pub fn action(&self, config: &TimelineConfig) -> WheelAction {
        let (dx, dy) = self.pixels(config);
        if self.ctrl {
            return WheelAction::Zoom {
                factor: (-dy * config.zoom_sensitivity).exp(),
                anchor_x: self.offset_x,
            };
        }
        if self.shift {
            // Shift turns a vertical wheel horizontal
            let horizontal = if dx.abs() > dy.abs() { dx } else { dy };
            return WheelAction::Scroll { dx: horizontal, dy: 0.0 };
        }
        // Follow the dominant axis so trackpad swipes don't drift
        if dx.abs() > dy.abs() {
            WheelAction::Scroll { dx, dy: 0.0 }
        } else {
            WheelAction::Scroll { dx: 0.0, dy }
        }
    }
}

/// Scroll limits in content pixels
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScrollBounds {
    pub min_x: f64,
    pub max_x: f64,
    pub max_y: f64,
}

impl ScrollBounds {
    /// Horizontal limits from the loaded range, vertical from the lane
    /// content height
    pub fn for_content(loaded: DateRange, scale: &TimeScale, viewport: &Viewport, content_height: f64) -> Self {
        let min_x = scale.time_to_x(loaded.start);
        let max_x = (scale.time_to_x(loaded.end) - viewport.width).max(min_x);
        Self {
            min_x,
            max_x,
            max_y: (content_height - viewport.height).max(0.0),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Viewport {
    pub scroll_x: f64,
    pub scroll_y: f64,
    pub width: f64,
    pub height: f64,
}

impl Viewport {
    pub fn new(scroll_x: f64, width: f64, height: f64) -> Self {
        Self {
            scroll_x,
            scroll_y: 0.0,
            width,
            height,
        }
    }

    pub fn clamp(&mut self, bounds: &ScrollBounds) {
        self.scroll_x = self.scroll_x.clamp(bounds.min_x, bounds.max_x);
        self.scroll_y = self.scroll_y.clamp(0.0, bounds.max_y);
    }

    /// Scroll within the bounds, returning the distance actually moved
    pub fn scroll_by(&mut self, dx: f64, dy: f64, bounds: &ScrollBounds) -> (f64, f64) {
        let (x, y) = (self.scroll_x, self.scroll_y);
        self.scroll_x += dx;
        self.scroll_y += dy;
        self.clamp(bounds);
        (self.scroll_x - x, self.scroll_y - y)
    }

    pub fn visible_range(&self, scale: &TimeScale) -> DateRange {
        scale.visible_range(self.scroll_x, self.width)
    }

    /// Centre the viewport on an x position
    pub fn center_on(&mut self, x: f64, bounds: &ScrollBounds) {
        self.scroll_x = x - self.width / 2.0;
        self.clamp(bounds);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone, Utc};

    fn config() -> TimelineConfig {
        TimelineConfig::default()
    }

    #[test]
    fn test_line_and_page_deltas_become_pixels() {
        let line = WheelInput { delta_y: 3.0, mode: DeltaMode::from_dom(1), ..Default::default() };
        assert_eq!(line.action(&config()), WheelAction::Scroll { dx: 0.0, dy: 120.0 });
        let page = WheelInput { delta_x: 1.0, mode: DeltaMode::from_dom(2), ..Default::default() };
        assert_eq!(page.action(&config()), WheelAction::Scroll { dx: 800.0, dy: 0.0 });
    }

    #[test]
    fn test_shift_scrolls_horizontally() {
        let input = WheelInput { delta_y: 50.0, shift: true, ..Default::default() };
        assert_eq!(input.action(&config()), WheelAction::Scroll { dx: 50.0, dy: 0.0 });
    }

    #[test]
    fn test_trackpad_follows_dominant_axis() {
        let swipe = WheelInput { delta_x: -30.0, delta_y: 4.0, ..Default::default() };
        assert_eq!(swipe.action(&config()), WheelAction::Scroll { dx: -30.0, dy: 0.0 });
    }

    #[test]
    fn test_ctrl_wheel_zooms() {
        let zoom_in = WheelInput { delta_y: -100.0, ctrl: true, offset_x: 250.0, ..Default::default() };
        match zoom_in.action(&config()) {
            WheelAction::Zoom { factor, anchor_x } => {
                assert!(factor > 1.0);
                assert!((factor - 0.2f64.exp()).abs() < 1e-12);
                assert_eq!(anchor_x, 250.0);
            }
            other => panic!("expected zoom, got {:?}", other),
        }
        let zoom_out = WheelInput { delta_y: 100.0, ctrl: true, ..Default::default() };
        assert!(matches!(zoom_out.action(&config()), WheelAction::Zoom { factor, .. } if factor < 1.0));
    }

    #[test]
    fn test_scroll_is_clamped_to_bounds() {
        let origin = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        let scale = TimeScale::new(origin, 1.0, 40.0);
        let loaded = DateRange::new(origin, origin + Duration::hours(10));
        let mut viewport = Viewport::new(0.0, 300.0, 200.0);
        let bounds = ScrollBounds::for_content(loaded, &scale, &viewport, 500.0);
        assert_eq!(bounds.max_x, 300.0);
        assert_eq!(bounds.max_y, 300.0);

        assert_eq!(viewport.scroll_by(1000.0, 50.0, &bounds), (300.0, 50.0));
        assert_eq!(viewport.scroll_by(-50.0, -80.0, &bounds), (-50.0, -50.0));
        assert_eq!(viewport.scroll_x, 250.0);
        assert_eq!(viewport.scroll_y, 0.0);

        let range = viewport.visible_range(&scale);
        assert_eq!(range.start, origin + Duration::minutes(250));
        assert_eq!(range.duration(), Duration::minutes(300));
    }

    #[test]
    fn test_short_content_pins_to_start() {
        let origin = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        let scale = TimeScale::new(origin, 1.0, 40.0);
        let loaded = DateRange::new(origin, origin + Duration::minutes(100));
        let mut viewport = Viewport::new(40.0, 300.0, 200.0);
        let bounds = ScrollBounds::for_content(loaded, &scale, &viewport, 80.0);
        viewport.clamp(&bounds);
        assert_eq!(viewport.scroll_x, 0.0);
        assert_eq!(bounds.max_y, 0.0);

        viewport.center_on(50.0, &bounds);
        assert_eq!(viewport.scroll_x, 0.0);
    }
}
