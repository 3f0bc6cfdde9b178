//! Timeline Engine
//!
//! Geometry and interaction for the ticket timeline, independent of the
//! DOM:
//! - config: tunables with JSON overrides
//! - scale: time/lane to pixel transforms and zoom
//! - layout: lane assignment and ticket boxes
//! - markers: time axis ticks and the now line
//! - sun: sunrise/sunset and night bands
//! - gesture: drag, wheel, touch momentum and prefetch

pub mod config;
pub mod gesture;
pub mod layout;
pub mod markers;
pub mod scale;
pub mod sun;

pub use config::{ConfigError, TimelineConfig};
pub use gesture::{
    hit_test, DeltaMode, Direction, DragMode, DragOutcome, DragPreview, DragSession, Momentum, PanTracker, Point,
    PrefetchPolicy, PrefetchRequest, PrefetchTracker, ScrollBounds, Viewport, WheelAction, WheelInput,
};
pub use layout::{assign_lanes, layout, LaneAssignment, TicketBox, TimelineLayout};
pub use markers::{generate_markers, Marker, MarkerKind, NowMarker, TickUnit};
pub use scale::{snap, TimeScale, ZoomPreset};
pub use sun::{night_bands, sun_times, Daylight, SunTimes};
