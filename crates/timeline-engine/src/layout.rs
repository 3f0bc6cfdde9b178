//! Lane Layout
//!
//! Assigns every timeline ticket a lane so overlapping tickets never share
//! one, then turns lanes and spans into pixel boxes.
//!
//! Placement is first-fit: tickets sorted by (start, end, id) go to the
//! lowest lane whose last ticket has already ended.

use chrono::{DateTime, Utc};
use std::collections::HashMap;
use ticket_core::{DateRange, Ticket, TicketId, TicketStatus};

use crate::scale::TimeScale;

/// Lane per ticket plus the number of lanes used
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LaneAssignment {
    lanes: HashMap<TicketId, usize>,
    lane_count: usize,
}

impl LaneAssignment {
    pub fn lane_of(&self, id: TicketId) -> Option<usize> {
        self.lanes.get(&id).copied()
    }

    pub fn lane_count(&self) -> usize {
        self.lane_count
    }

    pub fn len(&self) -> usize {
        self.lanes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lanes.is_empty()
    }
}

/// First-fit lowest-lane assignment. Pool tickets are skipped.
pub fn assign_lanes<'a, I>(tickets: I) -> LaneAssignment
where
    I: IntoIterator<Item = &'a Ticket>,
{
    let mut ordered: Vec<&Ticket> = tickets.into_iter().filter(|t| !t.in_pool).collect();
    ordered.sort_by_key(|t| (t.start, t.end, t.id));

    // End of the last ticket placed in each lane
    let mut lane_ends: Vec<DateTime<Utc>> = Vec::new();
    let mut lanes = HashMap::with_capacity(ordered.len());

    for ticket in ordered {
        let lane = match lane_ends.iter().position(|end| *end <= ticket.start) {
            Some(free) => {
                lane_ends[free] = ticket.end;
                free
            }
            None => {
                lane_ends.push(ticket.end);
                lane_ends.len() - 1
            }
        };
        lanes.insert(ticket.id, lane);
    }

    LaneAssignment {
        lane_count: lane_ends.len(),
        lanes,
    }
}

/// A ticket positioned in pixels
#[derive(Debug, Clone, PartialEq)]
pub struct TicketBox {
    pub id: TicketId,
    pub lane: usize,
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
    pub status: TicketStatus,
}

impl TicketBox {
    pub fn contains(&self, x: f64, y: f64) -> bool {
        x >= self.x && x <= self.x + self.width && y >= self.y && y <= self.y + self.height
    }
}

/// Laid-out contents of the visible window
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TimelineLayout {
    pub boxes: Vec<TicketBox>,
    pub lane_count: usize,
}

impl TimelineLayout {
    pub fn get(&self, id: TicketId) -> Option<&TicketBox> {
        self.boxes.iter().find(|b| b.id == id)
    }

    /// Topmost box under a content-space point
    pub fn hit(&self, x: f64, y: f64) -> Option<&TicketBox> {
        self.boxes.iter().rev().find(|b| b.contains(x, y))
    }

    /// Total content height
    pub fn height(&self, scale: &TimeScale) -> f64 {
        scale.lane_to_y(self.lane_count)
    }
}

/// Lay out the timeline tickets intersecting `window`
pub fn layout(tickets: &[Ticket], scale: &TimeScale, window: DateRange, lane_gap: f64) -> TimelineLayout {
    let visible: Vec<&Ticket> = tickets
        .iter()
        .filter(|t| !t.in_pool && window.intersects(t.start, t.end))
        .collect();
    let lanes = assign_lanes(visible.iter().copied());

    let height = (scale.row_height - lane_gap).max(1.0);
    let boxes = visible
        .iter()
        .filter_map(|t| {
            let lane = lanes.lane_of(t.id)?;
            Some(TicketBox {
                id: t.id,
                lane,
                x: scale.time_to_x(t.start),
                y: scale.lane_to_y(lane) + lane_gap / 2.0,
                width: scale.width_of(t.duration()),
                height,
                status: t.status,
            })
        })
        .collect();

    log::trace!("[LAYOUT] {} tickets in {} lanes", visible.len(), lanes.lane_count());
    TimelineLayout {
        boxes,
        lane_count: lanes.lane_count(),
    }
}
