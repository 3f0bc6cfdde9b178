//! Repository Layer
//!
//! Data access abstractions and an in-memory implementation.

mod traits;
mod memory;

pub use traits::{Repository, TicketRepository};
pub use memory::{InMemoryTicketRepository, InMemoryTypeRepository};
