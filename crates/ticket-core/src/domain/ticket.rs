//! Ticket Entity
//!
//! A time-boxed activity placed on the timeline or waiting in the pool.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::entity::{DomainError, DomainResult, Entity};
use super::recurrence::RecurrencePattern;

pub type TicketId = u32;

/// Lifecycle status derived from the ticket's span and the current time
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TicketStatus {
    /// Not started yet
    #[default]
    Future,
    /// Running right now
    Active,
    /// Ended and confirmed by the user
    PastConfirmed,
    /// Ended without confirmation
    PastUntouched,
}

impl TicketStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            TicketStatus::Future => "FUTURE",
            TicketStatus::Active => "ACTIVE",
            TicketStatus::PastConfirmed => "PAST_CONFIRMED",
            TicketStatus::PastUntouched => "PAST_UNTOUCHED",
        }
    }

    pub fn is_past(&self) -> bool {
        matches!(self, TicketStatus::PastConfirmed | TicketStatus::PastUntouched)
    }
}

/// A scheduled activity with a time range
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Ticket {
    /// Unique identifier
    pub id: TicketId,
    /// Owning user
    pub user_id: u32,
    pub title: String,
    /// Markdown description
    pub description: Option<String>,
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
    /// Ticket type defining the custom-field schema
    pub type_id: Option<u32>,
    /// Custom field values keyed by field name
    #[serde(default)]
    pub properties: Map<String, Value>,
    #[serde(default)]
    pub status: TicketStatus,

    // Pool fields:
    /// Waiting in the pool rather than placed on the timeline
    #[serde(default)]
    pub in_pool: bool,
    /// Position within the pool (Some iff in_pool)
    pub pool_position: Option<i32>,

    // Hierarchy:
    /// Parent ticket ID (None = root level)
    pub parent_id: Option<TicketId>,

    pub recurrence: Option<RecurrencePattern>,

    pub created_at: Option<i64>,
    pub updated_at: Option<i64>,
}

impl Ticket {
    /// Create a new root ticket on the timeline
    pub fn new(
        id: TicketId,
        user_id: u32,
        title: impl Into<String>,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> DomainResult<Self> {
        check_span(start, end)?;
        Ok(Self {
            id,
            user_id,
            title: title.into(),
            description: None,
            start,
            end,
            type_id: None,
            properties: Map::new(),
            status: TicketStatus::Future,
            in_pool: false,
            pool_position: None,
            parent_id: None,
            recurrence: None,
            created_at: None,
            updated_at: None,
        })
    }

    /// Create a new child ticket under a parent
    pub fn new_child(
        id: TicketId,
        user_id: u32,
        title: impl Into<String>,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
        parent_id: TicketId,
    ) -> DomainResult<Self> {
        let mut ticket = Self::new(id, user_id, title, start, end)?;
        ticket.parent_id = Some(parent_id);
        Ok(ticket)
    }

    pub fn duration(&self) -> Duration {
        self.end - self.start
    }

    /// Whether two tickets share any instant of the half-open span [start, end)
    pub fn overlaps(&self, other: &Ticket) -> bool {
        self.start < other.end && other.start < self.end
    }

    /// Whether the ticket intersects [from, to)
    pub fn intersects(&self, from: DateTime<Utc>, to: DateTime<Utc>) -> bool {
        self.start < to && from < self.end
    }

    /// Check if this is a root ticket (no parent)
    pub fn is_root(&self) -> bool {
        self.parent_id.is_none()
    }

    /// Place the ticket at a new span. Leaves the pool and drops any
    /// earlier confirmation, since the old span no longer applies.
    pub fn reschedule(&mut self, start: DateTime<Utc>, end: DateTime<Utc>) -> DomainResult<()> {
        check_span(start, end)?;
        self.start = start;
        self.end = end;
        self.in_pool = false;
        self.pool_position = None;
        if self.status == TicketStatus::PastConfirmed {
            self.status = TicketStatus::PastUntouched;
        }
        Ok(())
    }

    /// Move to a new start keeping the duration
    pub fn move_to(&mut self, start: DateTime<Utc>) -> DomainResult<()> {
        let duration = self.duration();
        self.reschedule(start, start + duration)
    }

    /// Status this ticket has at `now`
    pub fn status_at(&self, now: DateTime<Utc>) -> TicketStatus {
        if now < self.start {
            TicketStatus::Future
        } else if now < self.end {
            TicketStatus::Active
        } else if self.status == TicketStatus::PastConfirmed {
            TicketStatus::PastConfirmed
        } else {
            TicketStatus::PastUntouched
        }
    }

    /// Recompute the status, returning true when it changed
    pub fn refresh_status(&mut self, now: DateTime<Utc>) -> bool {
        let next = self.status_at(now);
        let changed = next != self.status;
        self.status = next;
        changed
    }

    /// Confirm an ended ticket
    pub fn confirm(&mut self, now: DateTime<Utc>) -> DomainResult<()> {
        if self.in_pool {
            return Err(DomainError::InvalidInput(format!(
                "ticket {} is in the pool and cannot be confirmed",
                self.id
            )));
        }
        if now < self.end {
            return Err(DomainError::InvalidInput(format!(
                "ticket {} has not ended yet",
                self.id
            )));
        }
        self.status = TicketStatus::PastConfirmed;
        Ok(())
    }
}

impl Entity for Ticket {
    type Id = TicketId;

    fn id(&self) -> Self::Id {
        self.id
    }
}

fn check_span(start: DateTime<Utc>, end: DateTime<Utc>) -> DomainResult<()> {
    if end <= start {
        return Err(DomainError::InvalidInput(format!(
            "end {} must be after start {}",
            end.to_rfc3339(),
            start.to_rfc3339()
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn at(hour: u32, min: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, 4, hour, min, 0).unwrap()
    }

    #[test]
    fn test_ticket_creation() {
        let ticket = Ticket::new(1, 7, "Standup", at(9, 0), at(9, 15)).unwrap();
        assert_eq!(ticket.id(), 1);
        assert_eq!(ticket.duration(), Duration::minutes(15));
        assert!(ticket.is_root());
        assert!(!ticket.in_pool);
    }

    #[test]
    fn test_end_must_follow_start() {
        assert!(Ticket::new(1, 7, "Empty", at(9, 0), at(9, 0)).is_err());
        assert!(Ticket::new(1, 7, "Backwards", at(10, 0), at(9, 0)).is_err());
    }

    #[test]
    fn test_child_ticket_creation() {
        let child = Ticket::new_child(2, 7, "Prep", at(8, 0), at(8, 30), 1).unwrap();
        assert_eq!(child.parent_id, Some(1));
        assert!(!child.is_root());
    }

    #[test]
    fn test_overlap_is_half_open() {
        let a = Ticket::new(1, 7, "A", at(9, 0), at(10, 0)).unwrap();
        let b = Ticket::new(2, 7, "B", at(10, 0), at(11, 0)).unwrap();
        let c = Ticket::new(3, 7, "C", at(9, 59), at(10, 30)).unwrap();
        assert!(!a.overlaps(&b));
        assert!(a.overlaps(&c));
        assert!(b.overlaps(&c));
    }

    #[test]
    fn test_status_lifecycle() {
        let mut ticket = Ticket::new(1, 7, "Review", at(9, 0), at(10, 0)).unwrap();
        assert_eq!(ticket.status_at(at(8, 0)), TicketStatus::Future);
        assert_eq!(ticket.status_at(at(9, 0)), TicketStatus::Active);
        assert_eq!(ticket.status_at(at(10, 0)), TicketStatus::PastUntouched);

        assert!(ticket.refresh_status(at(9, 30)));
        assert!(!ticket.refresh_status(at(9, 45)));
        assert!(ticket.confirm(at(9, 45)).is_err());

        ticket.confirm(at(10, 5)).unwrap();
        assert_eq!(ticket.status, TicketStatus::PastConfirmed);
        assert!(!ticket.refresh_status(at(12, 0)));
        assert_eq!(ticket.status, TicketStatus::PastConfirmed);
    }

    #[test]
    fn test_reschedule_drops_confirmation() {
        let mut ticket = Ticket::new(1, 7, "Review", at(9, 0), at(10, 0)).unwrap();
        ticket.confirm(at(11, 0)).unwrap();
        ticket.move_to(at(13, 0)).unwrap();
        assert_eq!(ticket.end, at(14, 0));
        assert_eq!(ticket.status_at(at(12, 0)), TicketStatus::Future);
    }

    #[test]
    fn test_status_serialization() {
        let json = serde_json::to_string(&TicketStatus::PastUntouched).unwrap();
        assert_eq!(json, "\"PAST_UNTOUCHED\"");
        assert_eq!(TicketStatus::PastConfirmed.as_str(), "PAST_CONFIRMED");
    }
}
