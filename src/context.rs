//! Application Context
//!
//! Shared state provided via Leptos Context API.

use chrono::{DateTime, Utc};
use leptos::prelude::*;
use ticket_core::DateRange;
use timeline_engine::{NowMarker, Point, ScrollBounds, TimeScale, TimelineConfig, Viewport, ZoomPreset};

use crate::storage::{LocalStorageRepository, LocalStorageTypeRepository};

/// App-wide signals provided via context
#[derive(Clone, Copy)]
pub struct AppContext {
    pub config: ReadSignal<TimelineConfig>,
    /// The live "now" line
    pub now: ReadSignal<NowMarker>,
    set_now: WriteSignal<NowMarker>,
    /// Trigger to reload tickets from storage - read
    pub reload_trigger: ReadSignal<u32>,
    /// Trigger to reload tickets from storage - write
    set_reload_trigger: WriteSignal<u32>,
    pub repo: LocalStorageRepository,
    pub types_repo: LocalStorageTypeRepository,
}

impl AppContext {
    pub fn new(
        config: ReadSignal<TimelineConfig>,
        now: (ReadSignal<NowMarker>, WriteSignal<NowMarker>),
        reload_trigger: (ReadSignal<u32>, WriteSignal<u32>),
    ) -> Self {
        Self {
            config,
            now: now.0,
            set_now: now.1,
            reload_trigger: reload_trigger.0,
            set_reload_trigger: reload_trigger.1,
            repo: LocalStorageRepository,
            types_repo: LocalStorageTypeRepository,
        }
    }

    /// Trigger a reload of tickets
    pub fn reload(&self) {
        self.set_reload_trigger.update(|v| *v += 1);
    }

    /// Advance the now marker; true when it moved
    pub fn tick_now(&self, now: DateTime<Utc>) -> bool {
        let mut moved = false;
        self.set_now.update(|marker| moved = marker.tick(now));
        moved
    }
}

/// Timeline geometry shared by the timeline, the toolbar and the pool
/// (for drops onto the timeline)
#[derive(Clone, Copy)]
pub struct TimelineContext {
    pub scale: ReadSignal<TimeScale>,
    set_scale: WriteSignal<TimeScale>,
    pub viewport: ReadSignal<Viewport>,
    set_viewport: WriteSignal<Viewport>,
    /// Client position of the lane area's top-left corner
    pub surface: ReadSignal<(f64, f64)>,
    set_surface: WriteSignal<(f64, f64)>,
    /// Range fetched so far
    pub loaded: ReadSignal<DateRange>,
    set_loaded: WriteSignal<DateRange>,
    /// Height of all lanes
    pub content_height: ReadSignal<f64>,
    set_content_height: WriteSignal<f64>,
}

impl TimelineContext {
    pub fn new(scale: TimeScale, viewport: Viewport, loaded: DateRange) -> Self {
        let (scale, set_scale) = signal(scale);
        let (viewport, set_viewport) = signal(viewport);
        let (surface, set_surface) = signal((0.0, 0.0));
        let (loaded, set_loaded) = signal(loaded);
        let (content_height, set_content_height) = signal(0.0);
        Self {
            scale,
            set_scale,
            viewport,
            set_viewport,
            surface,
            set_surface,
            loaded,
            set_loaded,
            content_height,
            set_content_height,
        }
    }

    pub fn bounds(&self, scale: &TimeScale) -> ScrollBounds {
        ScrollBounds::for_content(
            self.loaded.get_untracked(),
            scale,
            &self.viewport.get_untracked(),
            self.content_height.get_untracked(),
        )
    }

    /// Client coordinates to content coordinates
    pub fn client_to_point(&self, client_x: f64, client_y: f64) -> Point {
        let (left, top) = self.surface.get_untracked();
        let viewport = self.viewport.get_untracked();
        Point::new(client_x - left + viewport.scroll_x, client_y - top + viewport.scroll_y)
    }

    pub fn time_at_client_x(&self, client_x: f64) -> DateTime<Utc> {
        let point = self.client_to_point(client_x, 0.0);
        self.scale.get_untracked().x_to_time(point.x)
    }

    /// Scroll within bounds, returning the distance moved
    pub fn scroll_by(&self, dx: f64, dy: f64) -> (f64, f64) {
        let bounds = self.bounds(&self.scale.get_untracked());
        let mut moved = (0.0, 0.0);
        self.set_viewport.update(|v| moved = v.scroll_by(dx, dy, &bounds));
        moved
    }

    /// Zoom around a point `anchor_offset` pixels from the left edge
    pub fn zoom_by(&self, factor: f64, anchor_offset: f64, config: &TimelineConfig) {
        let viewport = self.viewport.get_untracked();
        let (scale, scroll_x) = self.scale.get_untracked().zoom_at(
            viewport.scroll_x,
            anchor_offset,
            factor,
            config.min_pixels_per_minute,
            config.max_pixels_per_minute,
        );
        self.apply_zoom(scale, scroll_x);
    }

    /// Jump to a preset, keeping the centre of the view in place
    pub fn zoom_to(&self, preset: ZoomPreset, config: &TimelineConfig) {
        let current = self.scale.get_untracked().pixels_per_minute;
        let target = config.clamp_zoom(preset.pixels_per_minute());
        let width = self.viewport.get_untracked().width;
        self.zoom_by(target / current, width / 2.0, config);
    }

    fn apply_zoom(&self, scale: TimeScale, scroll_x: f64) {
        let bounds = self.bounds(&scale);
        self.set_scale.set(scale);
        self.set_viewport.update(|v| {
            v.scroll_x = scroll_x;
            v.clamp(&bounds);
        });
        log::debug!("[TIMELINE] zoom {:.3} px/min", scale.pixels_per_minute);
    }

    pub fn center_on(&self, time: DateTime<Utc>) {
        let scale = self.scale.get_untracked();
        let bounds = self.bounds(&scale);
        self.set_viewport.update(|v| v.center_on(scale.time_to_x(time), &bounds));
    }

    pub fn set_size(&self, width: f64, height: f64) {
        self.set_viewport.update(|v| {
            v.width = width;
            v.height = height;
        });
        let bounds = self.bounds(&self.scale.get_untracked());
        self.set_viewport.update(|v| v.clamp(&bounds));
    }

    pub fn set_surface(&self, left: f64, top: f64) {
        self.set_surface.set((left, top));
    }

    pub fn set_loaded(&self, loaded: DateRange) {
        self.set_loaded.set(loaded);
    }

    pub fn set_content_height(&self, height: f64) {
        if self.content_height.get_untracked() != height {
            self.set_content_height.set(height);
        }
    }
}
