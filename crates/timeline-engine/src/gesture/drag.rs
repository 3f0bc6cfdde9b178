//! Ticket Drag and Resize
//!
//! A press on a ticket records a pending session. Movement beyond the
//! threshold turns it into a drag; until then releasing counts as a click.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use ticket_core::{DomainResult, Ticket, TicketId};

use crate::config::TimelineConfig;
use crate::layout::TicketBox;
use crate::scale::{snap, TimeScale};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum DragMode {
    #[default]
    None,
    Move,
    ResizeStart,
    ResizeEnd,
}

/// Pointer position in timeline content coordinates
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

/// Mode a press at `point` starts. The handles shrink on narrow boxes so
/// the middle third always moves.
pub fn hit_test(ticket_box: &TicketBox, point: Point, handle_px: f64) -> DragMode {
    if !ticket_box.contains(point.x, point.y) {
        return DragMode::None;
    }
    let handle = handle_px.min(ticket_box.width / 3.0);
    if point.x - ticket_box.x <= handle {
        DragMode::ResizeStart
    } else if ticket_box.x + ticket_box.width - point.x <= handle {
        DragMode::ResizeEnd
    } else {
        DragMode::Move
    }
}

/// Where the dragged ticket would land
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DragPreview {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
    /// Lane under the pointer, only drawn in the preview. Layout repacks
    /// lanes by first fit once the drag is committed.
    pub lane: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DragOutcome {
    /// Released before crossing the threshold
    Click(TicketId),
    /// Dragged but landed where it started
    Unchanged(TicketId),
    Changed {
        id: TicketId,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
        lane: usize,
    },
}

impl DragOutcome {
    pub fn id(&self) -> TicketId {
        match self {
            DragOutcome::Click(id) | DragOutcome::Unchanged(id) => *id,
            DragOutcome::Changed { id, .. } => *id,
        }
    }

    /// Write a changed span into the ticket. Returns whether it changed.
    pub fn apply(&self, ticket: &mut Ticket) -> DomainResult<bool> {
        match *self {
            DragOutcome::Changed { id, start, end, .. } if id == ticket.id => {
                ticket.reschedule(start, end)?;
                Ok(true)
            }
            _ => Ok(false),
        }
    }
}

#[derive(Debug, Clone)]
pub struct DragSession {
    id: TicketId,
    mode: DragMode,
    origin: Point,
    original: DragPreview,
    preview: DragPreview,
    active: bool,
    threshold: f64,
    snap_minutes: i64,
    min_duration: Duration,
}

impl DragSession {
    /// Record a press. Returns None for `DragMode::None`.
    pub fn begin(ticket: &Ticket, lane: usize, mode: DragMode, origin: Point, config: &TimelineConfig) -> Option<Self> {
        if mode == DragMode::None {
            return None;
        }
        let original = DragPreview {
            start: ticket.start,
            end: ticket.end,
            lane,
        };
        Some(Self {
            id: ticket.id,
            mode,
            origin,
            original,
            preview: original,
            active: false,
            threshold: config.drag_threshold_px,
            snap_minutes: config.snap_minutes,
            min_duration: config.min_duration(),
        })
    }

    pub fn id(&self) -> TicketId {
        self.id
    }

    pub fn mode(&self) -> DragMode {
        self.mode
    }

    /// Whether the pointer has crossed the threshold
    pub fn is_active(&self) -> bool {
        self.active
    }

    pub fn preview(&self) -> &DragPreview {
        &self.preview
    }

    /// Track the pointer. Returns the preview once the drag is active.
    pub fn update(&mut self, pointer: Point, scale: &TimeScale) -> Option<&DragPreview> {
        let dx = pointer.x - self.origin.x;
        let dy = pointer.y - self.origin.y;
        if !self.active {
            if dx.abs() <= self.threshold && dy.abs() <= self.threshold {
                return None;
            }
            self.active = true;
            log::debug!("[DRAG] ticket {} {:?} started", self.id, self.mode);
        }

        let delta = scale.duration_of(dx);
        let original = self.original;
        self.preview = match self.mode {
            DragMode::Move => {
                let start = snap(original.start + delta, self.snap_minutes);
                let lane_shift = (dy / scale.row_height).round();
                DragPreview {
                    start,
                    end: start + (original.end - original.start),
                    lane: (original.lane as f64 + lane_shift).max(0.0) as usize,
                }
            }
            DragMode::ResizeStart => DragPreview {
                start: snap(original.start + delta, self.snap_minutes).min(original.end - self.min_duration),
                ..original
            },
            DragMode::ResizeEnd => DragPreview {
                end: snap(original.end + delta, self.snap_minutes).max(original.start + self.min_duration),
                ..original
            },
            DragMode::None => original,
        };
        Some(&self.preview)
    }

    /// Pointer released
    pub fn finish(self) -> DragOutcome {
        if !self.active {
            DragOutcome::Click(self.id)
        } else if self.preview == self.original {
            DragOutcome::Unchanged(self.id)
        } else {
            log::debug!(
                "[DRAG] ticket {} -> {} .. {} lane {}",
                self.id,
                self.preview.start,
                self.preview.end,
                self.preview.lane
            );
            DragOutcome::Changed {
                id: self.id,
                start: self.preview.start,
                end: self.preview.end,
                lane: self.preview.lane,
            }
        }
    }

    /// Abandon the drag, returning where the ticket was
    pub fn cancel(self) -> DragPreview {
        log::debug!("[DRAG] ticket {} cancelled", self.id);
        self.original
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn t0() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 5, 6, 9, 0, 0).unwrap()
    }

    fn scale() -> TimeScale {
        // 1 px per minute, origin at t0
        TimeScale::new(t0(), 1.0, 40.0)
    }

    fn ticket() -> Ticket {
        Ticket::new(7, 1, "Standup", t0() + Duration::minutes(60), t0() + Duration::minutes(90)).unwrap()
    }

    fn session(mode: DragMode) -> DragSession {
        DragSession::begin(&ticket(), 1, mode, Point::new(70.0, 50.0), &TimelineConfig::default()).unwrap()
    }

    fn ticket_box() -> TicketBox {
        TicketBox {
            id: 7,
            lane: 1,
            x: 60.0,
            y: 42.0,
            width: 30.0,
            height: 36.0,
            status: Default::default(),
        }
    }

    #[test]
    fn test_hit_test_handles() {
        let b = ticket_box();
        // handle is capped at a third of the 30 px width
        assert_eq!(hit_test(&b, Point::new(62.0, 50.0), 12.0), DragMode::ResizeStart);
        assert_eq!(hit_test(&b, Point::new(75.0, 50.0), 12.0), DragMode::Move);
        assert_eq!(hit_test(&b, Point::new(88.0, 50.0), 12.0), DragMode::ResizeEnd);
        assert_eq!(hit_test(&b, Point::new(75.0, 10.0), 12.0), DragMode::None);
    }

    #[test]
    fn test_small_movement_is_a_click() {
        let mut s = session(DragMode::Move);
        assert!(s.update(Point::new(74.0, 53.0), &scale()).is_none());
        assert!(!s.is_active());
        assert_eq!(s.finish(), DragOutcome::Click(7));
    }

    #[test]
    fn test_move_snaps_and_changes_lane() {
        let mut s = session(DragMode::Move);
        let preview = *s.update(Point::new(70.0 + 32.0, 50.0 + 45.0), &scale()).unwrap();
        // +32 min snaps to +30, duration kept
        assert_eq!(preview.start, t0() + Duration::minutes(90));
        assert_eq!(preview.end, t0() + Duration::minutes(120));
        assert_eq!(preview.lane, 2);

        let preview = *s.update(Point::new(70.0, 50.0 - 200.0), &scale()).unwrap();
        assert_eq!(preview.lane, 0);
        assert_eq!(preview.start, t0() + Duration::minutes(60));
    }

    #[test]
    fn test_resize_respects_minimum_duration() {
        let mut s = session(DragMode::ResizeEnd);
        let preview = *s.update(Point::new(70.0 - 100.0, 50.0), &scale()).unwrap();
        assert_eq!(preview.end - preview.start, Duration::minutes(5));
        assert_eq!(preview.start, t0() + Duration::minutes(60));

        let mut s = session(DragMode::ResizeStart);
        let preview = *s.update(Point::new(70.0 + 500.0, 50.0), &scale()).unwrap();
        assert_eq!(preview.start, t0() + Duration::minutes(85));
        assert_eq!(preview.end, t0() + Duration::minutes(90));
        assert_eq!(preview.lane, 1);

        let preview = *s.update(Point::new(70.0 - 21.0, 50.0), &scale()).unwrap();
        assert_eq!(preview.start, t0() + Duration::minutes(40));
    }

    #[test]
    fn test_finish_and_apply() {
        let mut s = session(DragMode::ResizeEnd);
        s.update(Point::new(70.0 + 60.0, 50.0), &scale());
        let outcome = s.finish();
        assert_eq!(
            outcome,
            DragOutcome::Changed {
                id: 7,
                start: t0() + Duration::minutes(60),
                end: t0() + Duration::minutes(150),
                lane: 1,
            }
        );

        let mut t = ticket();
        assert!(outcome.apply(&mut t).unwrap());
        assert_eq!(t.duration(), Duration::minutes(90));
        assert!(!DragOutcome::Click(7).apply(&mut t).unwrap());
    }

    #[test]
    fn test_drag_back_to_origin_is_unchanged() {
        let mut s = session(DragMode::Move);
        s.update(Point::new(150.0, 50.0), &scale());
        s.update(Point::new(71.0, 50.0), &scale());
        assert_eq!(s.finish(), DragOutcome::Unchanged(7));
    }

    #[test]
    fn test_cancel_restores_original() {
        let mut s = session(DragMode::Move);
        s.update(Point::new(300.0, 200.0), &scale());
        let restored = s.cancel();
        assert_eq!(restored.start, ticket().start);
        assert_eq!(restored.lane, 1);
        assert!(DragSession::begin(&ticket(), 0, DragMode::None, Point::default(), &TimelineConfig::default()).is_none());
    }
}
