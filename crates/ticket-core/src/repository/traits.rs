//! Repository Layer - Core Traits
//!
//! Abstract interfaces for ticket storage. The browser front end backs them
//! with localStorage; tests use the in-memory implementation.
//!
//! Everything runs on a single-threaded event loop, so futures are `?Send`.

use async_trait::async_trait;

use crate::domain::{DateRange, DomainResult, Entity, Ticket, TicketId};

/// Core repository trait for CRUD operations
#[async_trait(?Send)]
pub trait Repository<T: Entity> {
    /// Create a new entity; the repository assigns its ID
    async fn create(&self, entity: &T) -> DomainResult<T>;

    /// Find entity by ID
    async fn find_by_id(&self, id: T::Id) -> DomainResult<Option<T>>;

    /// List all entities
    async fn list(&self) -> DomainResult<Vec<T>>;

    /// Update an existing entity
    async fn update(&self, entity: &T) -> DomainResult<T>;

    /// Delete entity by ID
    async fn delete(&self, id: T::Id) -> DomainResult<()>;
}

/// Ticket-specific queries: timeline ranges, the pool and hierarchy
#[async_trait(?Send)]
pub trait TicketRepository: Repository<Ticket> {
    /// Timeline tickets intersecting the range, ordered by start
    async fn list_in_range(&self, range: DateRange) -> DomainResult<Vec<Ticket>>;

    /// Pool tickets ordered by pool position
    async fn list_pool(&self) -> DomainResult<Vec<Ticket>>;

    /// Direct children of a ticket
    async fn children(&self, id: TicketId) -> DomainResult<Vec<Ticket>>;

    /// Persist the pool order; `ids[i]` gets position `i`
    async fn save_pool_order(&self, ids: &[TicketId]) -> DomainResult<()>;
}
