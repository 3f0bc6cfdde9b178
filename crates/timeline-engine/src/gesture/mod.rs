//! Gestures
//!
//! Pointer, wheel and touch handling for the timeline, kept free of DOM
//! types so it can be driven from event handlers and tested natively.
//!
//! - drag: move and resize tickets
//! - scroll: wheel input and the clamped viewport
//! - momentum: touch panning with inertia
//! - prefetch: loading adjacent ranges as the viewport nears an edge

pub mod drag;
pub mod momentum;
pub mod prefetch;
pub mod scroll;

pub use drag::{hit_test, DragMode, DragOutcome, DragPreview, DragSession, Point};
pub use momentum::{Momentum, PanTracker};
pub use prefetch::{Direction, PrefetchPolicy, PrefetchRequest, PrefetchTracker};
pub use scroll::{DeltaMode, ScrollBounds, Viewport, WheelAction, WheelInput};
