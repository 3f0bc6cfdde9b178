//! Ticket Core
//!
//! Layered like the app's former backend:
//! - domain: tickets, ticket types, recurrence and hierarchy rules
//! - repository: storage abstractions and an in-memory implementation
//! - pool: the FIFO of unscheduled tickets with optimistic persistence

pub mod domain;
pub mod repository;
pub mod pool;

pub use domain::hierarchy;
pub use domain::{
    DateRange, DomainError, DomainResult, Entity, FieldDefinition, FieldError, FieldKind, Frequency,
    Occurrence, RecurrenceEnd, RecurrencePattern, Ticket, TicketId, TicketStatus, TicketType,
};
pub use pool::{commit, PoolOp, PoolTransaction, TicketPool};
pub use repository::{InMemoryTicketRepository, InMemoryTypeRepository, Repository, TicketRepository};
