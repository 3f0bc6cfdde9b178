//! Touch Panning with Momentum
//!
//! Velocities are in scroll pixels per millisecond. Dragging a finger left
//! scrolls right, so finger deltas are negated on the way in.

use super::drag::Point;
use crate::config::TimelineConfig;

/// Releases later than this after the last move carry no momentum
const STALE_RELEASE_MS: f64 = 100.0;
/// Weight of the newest sample in the velocity estimate
const VELOCITY_SMOOTHING: f64 = 0.8;
/// Friction is specified per frame of this length
const FRAME_MS: f64 = 16.0;

#[derive(Debug, Clone, Default)]
pub struct PanTracker {
    last: Option<(Point, f64)>,
    velocity: (f64, f64),
    samples: usize,
}

impl PanTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_tracking(&self) -> bool {
        self.last.is_some()
    }

    /// Finger down at `time_ms`
    pub fn start(&mut self, point: Point, time_ms: f64) {
        self.last = Some((point, time_ms));
        self.velocity = (0.0, 0.0);
        self.samples = 0;
    }

    /// Finger moved; returns the scroll delta to apply
    pub fn move_to(&mut self, point: Point, time_ms: f64) -> (f64, f64) {
        let Some((prev, prev_time)) = self.last else {
            return (0.0, 0.0);
        };
        let delta = (prev.x - point.x, prev.y - point.y);
        let dt = time_ms - prev_time;
        if dt > 0.0 {
            let instant = (delta.0 / dt, delta.1 / dt);
            self.velocity = if self.samples == 0 {
                instant
            } else {
                (
                    VELOCITY_SMOOTHING * instant.0 + (1.0 - VELOCITY_SMOOTHING) * self.velocity.0,
                    VELOCITY_SMOOTHING * instant.1 + (1.0 - VELOCITY_SMOOTHING) * self.velocity.1,
                )
            };
            self.samples += 1;
        }
        self.last = Some((point, time_ms));
        delta
    }

    /// Finger lifted; returns the momentum to continue with, if any
    pub fn release(&mut self, time_ms: f64, config: &TimelineConfig) -> Option<Momentum> {
        let (_, last_time) = self.last.take()?;
        if time_ms - last_time > STALE_RELEASE_MS {
            return None;
        }
        let momentum = Momentum {
            vx: self.velocity.0,
            vy: self.velocity.1,
            friction: config.momentum_friction,
            min_velocity: config.momentum_min_velocity,
        };
        (momentum.speed() >= momentum.min_velocity).then_some(momentum)
    }

    /// Abandon tracking without momentum (e.g. a second finger landed)
    pub fn cancel(&mut self) {
        self.last = None;
        self.velocity = (0.0, 0.0);
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Momentum {
    pub vx: f64,
    pub vy: f64,
    pub friction: f64,
    pub min_velocity: f64,
}

impl Momentum {
    pub fn speed(&self) -> f64 {
        self.vx.hypot(self.vy)
    }

    /// Advance by `dt_ms`, returning the scroll delta for this frame, or
    /// None once the motion has died out
    pub fn step(&mut self, dt_ms: f64) -> Option<(f64, f64)> {
        if self.speed() < self.min_velocity || dt_ms <= 0.0 {
            return None;
        }
        let delta = (self.vx * dt_ms, self.vy * dt_ms);
        let decay = self.friction.powf(dt_ms / FRAME_MS);
        self.vx *= decay;
        self.vy *= decay;
        Some(delta)
    }

    /// Stop motion along an axis that hit a scroll bound
    pub fn stop_axes(&mut self, stop_x: bool, stop_y: bool) {
        if stop_x {
            self.vx = 0.0;
        }
        if stop_y {
            self.vy = 0.0;
        }
    }
}
