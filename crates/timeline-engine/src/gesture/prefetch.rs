//! Boundary Prefetch
//!
//! Watches how close the visible window is to the edges of the loaded
//! range and asks for the adjacent range before the user reaches it. At
//! most one request per direction is in flight.

use chrono::Duration;
use serde::{Deserialize, Serialize};
use ticket_core::DateRange;

use crate::config::TimelineConfig;
use crate::scale::TimeScale;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Direction {
    Earlier,
    Later,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PrefetchRequest {
    pub direction: Direction,
    pub range: DateRange,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PrefetchPolicy {
    /// Distance from a loaded edge that triggers a fetch
    pub threshold_px: f64,
    /// Length of each fetched range
    pub span: Duration,
}

impl PrefetchPolicy {
    pub fn from_config(config: &TimelineConfig) -> Self {
        Self {
            threshold_px: config.prefetch_threshold_px,
            span: config.prefetch_span(),
        }
    }

    /// Ranges to load given what is visible and what is already loaded
    pub fn check(&self, visible: DateRange, loaded: DateRange, scale: &TimeScale) -> Vec<PrefetchRequest> {
        let mut requests = Vec::new();
        if scale.width_of(visible.start - loaded.start) < self.threshold_px {
            requests.push(PrefetchRequest {
                direction: Direction::Earlier,
                range: DateRange::new(loaded.start - self.span, loaded.start),
            });
        }
        if scale.width_of(loaded.end - visible.end) < self.threshold_px {
            requests.push(PrefetchRequest {
                direction: Direction::Later,
                range: DateRange::new(loaded.end, loaded.end + self.span),
            });
        }
        requests
    }
}

/// Loaded range plus the requests currently in flight
#[derive(Debug, Clone, PartialEq)]
pub struct PrefetchTracker {
    loaded: DateRange,
    in_flight: Vec<PrefetchRequest>,
}

impl PrefetchTracker {
    pub fn new(loaded: DateRange) -> Self {
        Self {
            loaded,
            in_flight: Vec::new(),
        }
    }

    pub fn loaded(&self) -> DateRange {
        self.loaded
    }

    pub fn is_loading(&self) -> bool {
        !self.in_flight.is_empty()
    }

    /// New requests to issue; each is marked in flight
    pub fn poll(&mut self, policy: &PrefetchPolicy, visible: DateRange, scale: &TimeScale) -> Vec<PrefetchRequest> {
        let fresh: Vec<PrefetchRequest> = policy
            .check(visible, self.loaded, scale)
            .into_iter()
            .filter(|r| !self.in_flight.iter().any(|f| f.direction == r.direction))
            .collect();
        for request in &fresh {
            log::debug!("[PREFETCH] {:?} {} .. {}", request.direction, request.range.start, request.range.end);
        }
        self.in_flight.extend(fresh.iter().copied());
        fresh
    }

    /// A request finished; the loaded range grows to include it.
    /// Returns false for requests this tracker no longer knows about.
    pub fn complete(&mut self, request: &PrefetchRequest) -> bool {
        if !self.take(request) {
            return false;
        }
        self.loaded = self.loaded.union(&request.range);
        true
    }

    /// A request failed; the next poll may retry it
    pub fn fail(&mut self, request: &PrefetchRequest) -> bool {
        let known = self.take(request);
        if known {
            log::warn!("[PREFETCH] {:?} failed, will retry", request.direction);
        }
        known
    }

    /// Start over around a new range, forgetting in-flight requests
    pub fn reset(&mut self, loaded: DateRange) {
        self.loaded = loaded;
        self.in_flight.clear();
    }

    fn take(&mut self, request: &PrefetchRequest) -> bool {
        let before = self.in_flight.len();
        self.in_flight.retain(|r| r != request);
        self.in_flight.len() != before
    }
}
