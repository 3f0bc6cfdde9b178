//! Domain Layer
//!
//! Entities and the rules they enforce on themselves.

mod entity;
mod ticket;
mod ticket_type;
mod recurrence;
mod range;
pub mod hierarchy;

pub use entity::{DomainError, DomainResult, Entity, FieldError};
pub use ticket::{Ticket, TicketId, TicketStatus};
pub use ticket_type::{FieldDefinition, FieldKind, TicketType};
pub use recurrence::{Frequency, Occurrence, RecurrenceEnd, RecurrencePattern};
pub use range::DateRange;
