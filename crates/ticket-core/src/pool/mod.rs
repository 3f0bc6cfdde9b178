//! Tickets Pool
//!
//! FIFO holding area for tickets not yet placed on the timeline. New
//! tickets join at the back, the front ticket is the next to schedule, and
//! the user may reorder freely.
//!
//! Mutations are optimistic: [`TicketPool::begin`] applies an operation
//! locally and hands back a [`PoolTransaction`] that persists it and can
//! restore the previous state if the backend rejects the change. A
//! rejected persist writes the pre-operation tickets back, so the backend
//! does not keep half of the change.

use chrono::{DateTime, Utc};

use crate::domain::{DomainError, DomainResult, Ticket, TicketId};
use crate::repository::{Repository, TicketRepository};

#[cfg(test)]
mod tests;

/// A pool mutation
#[derive(Debug, Clone, PartialEq)]
pub enum PoolOp {
    /// Append a ticket at the back
    Push(Ticket),
    /// Move a pool ticket to a new position (clamped to the pool length)
    Move { id: TicketId, to: usize },
    /// Take the front ticket out, keeping its stored span
    PopFront,
    /// Take a ticket out, keeping its stored span
    Remove(TicketId),
    /// Take the front ticket out and place it on the timeline at `start`
    ScheduleNext { start: DateTime<Utc> },
    /// Take a specific ticket out and place it on the timeline at `start`
    Schedule { id: TicketId, start: DateTime<Utc> },
}

/// Ordered pool of tickets; positions are always 0..len
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TicketPool {
    tickets: Vec<Ticket>,
}

impl TicketPool {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build from stored tickets, ordering by their saved positions
    pub fn from_tickets(mut tickets: Vec<Ticket>) -> Self {
        tickets.retain(|t| t.in_pool);
        tickets.sort_by_key(|t| (t.pool_position.unwrap_or(i32::MAX), t.id));
        let mut pool = Self { tickets };
        pool.reindex();
        pool
    }

    pub fn len(&self) -> usize {
        self.tickets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tickets.is_empty()
    }

    pub fn tickets(&self) -> &[Ticket] {
        &self.tickets
    }

    pub fn iter(&self) -> impl Iterator<Item = &Ticket> {
        self.tickets.iter()
    }

    /// The next ticket to schedule
    pub fn front(&self) -> Option<&Ticket> {
        self.tickets.first()
    }

    pub fn get(&self, id: TicketId) -> Option<&Ticket> {
        self.tickets.iter().find(|t| t.id == id)
    }

    pub fn position_of(&self, id: TicketId) -> Option<usize> {
        self.tickets.iter().position(|t| t.id == id)
    }

    /// Ticket IDs in pool order
    pub fn ids(&self) -> Vec<TicketId> {
        self.tickets.iter().map(|t| t.id).collect()
    }

    /// Append at the back
    pub fn push(&mut self, mut ticket: Ticket) -> DomainResult<()> {
        if self.position_of(ticket.id).is_some() {
            return Err(DomainError::Conflict(format!("ticket {} is already in the pool", ticket.id)));
        }
        ticket.in_pool = true;
        self.tickets.push(ticket);
        self.reindex();
        Ok(())
    }

    /// Move a ticket to `to`, clamped to the last slot
    pub fn move_to(&mut self, id: TicketId, to: usize) -> DomainResult<()> {
        let from = self.require(id)?;
        let ticket = self.tickets.remove(from);
        let to = to.min(self.tickets.len());
        self.tickets.insert(to, ticket);
        self.reindex();
        Ok(())
    }

    /// Remove the front ticket
    pub fn pop_front(&mut self) -> Option<Ticket> {
        if self.tickets.is_empty() {
            return None;
        }
        Some(self.take(0))
    }

    /// Remove a ticket by ID
    pub fn remove(&mut self, id: TicketId) -> DomainResult<Ticket> {
        let index = self.require(id)?;
        Ok(self.take(index))
    }

    /// Pop the front ticket and place it at `start`, keeping its duration
    pub fn schedule_next(&mut self, start: DateTime<Utc>) -> DomainResult<Ticket> {
        let front = self
            .front()
            .map(|t| t.id)
            .ok_or_else(|| DomainError::NotFound("pool is empty".to_string()))?;
        self.schedule(front, start)
    }

    /// Take a ticket out and place it at `start`, keeping its duration
    pub fn schedule(&mut self, id: TicketId, start: DateTime<Utc>) -> DomainResult<Ticket> {
        let index = self.require(id)?;
        let mut placed = self.tickets[index].clone();
        placed.move_to(start)?;
        self.take(index);
        Ok(placed)
    }

    /// Apply an operation locally and return the transaction that
    /// persists or reverts it
    pub fn begin(&mut self, op: PoolOp) -> DomainResult<PoolTransaction> {
        let snapshot = self.clone();
        let released = match op {
            PoolOp::Push(ticket) => {
                let id = ticket.id;
                let original = ticket.clone();
                self.push(ticket)?;
                let pushed = self.get(id).cloned();
                return Ok(PoolTransaction {
                    snapshot,
                    changed: pushed.into_iter().collect(),
                    originals: vec![original],
                    released: None,
                    order: self.ids(),
                });
            }
            PoolOp::Move { id, to } => {
                self.move_to(id, to)?;
                None
            }
            PoolOp::PopFront => Some(
                self.pop_front()
                    .ok_or_else(|| DomainError::NotFound("pool is empty".to_string()))?,
            ),
            PoolOp::Remove(id) => Some(self.remove(id)?),
            PoolOp::ScheduleNext { start } => Some(self.schedule_next(start)?),
            PoolOp::Schedule { id, start } => Some(self.schedule(id, start)?),
        };

        let originals = released
            .iter()
            .filter_map(|t| snapshot.get(t.id).cloned())
            .collect();
        Ok(PoolTransaction {
            snapshot,
            changed: released.iter().cloned().collect(),
            originals,
            released,
            order: self.ids(),
        })
    }

    fn require(&self, id: TicketId) -> DomainResult<usize> {
        self.position_of(id)
            .ok_or_else(|| DomainError::NotFound(format!("ticket {} is not in the pool", id)))
    }

    fn take(&mut self, index: usize) -> Ticket {
        let mut ticket = self.tickets.remove(index);
        ticket.in_pool = false;
        ticket.pool_position = None;
        self.reindex();
        ticket
    }

    /// Reindex tickets to be sequential (0, 1, 2, ...)
    fn reindex(&mut self) {
        for (position, ticket) in self.tickets.iter_mut().enumerate() {
            ticket.pool_position = Some(position as i32);
        }
    }
}

/// A locally applied pool change awaiting backend confirmation
#[derive(Debug, Clone)]
pub struct PoolTransaction {
    snapshot: TicketPool,
    changed: Vec<Ticket>,
    /// `changed` as they were before the operation
    originals: Vec<Ticket>,
    released: Option<Ticket>,
    order: Vec<TicketId>,
}

impl PoolTransaction {
    /// Ticket that left the pool, if the operation released one
    pub fn released(&self) -> Option<&Ticket> {
        self.released.as_ref()
    }

    /// Pool order the backend should end up with
    pub fn order(&self) -> &[TicketId] {
        &self.order
    }

    /// Write the changed tickets, then the new pool order. If any write
    /// fails, tickets already written are restored to their pre-operation
    /// state before the error is returned.
    pub async fn persist<R>(&self, repo: &R) -> DomainResult<()>
    where
        R: TicketRepository + ?Sized,
    {
        let mut written = 0;
        let result = async {
            for ticket in &self.changed {
                repo.update(ticket).await?;
                written += 1;
            }
            repo.save_pool_order(&self.order).await
        }
        .await;

        if result.is_err() {
            self.restore(repo, written).await;
        }
        result
    }

    async fn restore<R>(&self, repo: &R, written: usize)
    where
        R: TicketRepository + ?Sized,
    {
        for changed in self.changed.iter().take(written) {
            let Some(original) = self.originals.iter().find(|t| t.id == changed.id) else {
                continue;
            };
            if let Err(e) = repo.update(original).await {
                log::warn!("[POOL] could not restore ticket {}: {}", original.id, e);
            }
        }
    }

    /// Restore the pool to its state before the operation
    pub fn rollback(self, pool: &mut TicketPool) {
        *pool = self.snapshot;
    }

    /// Finish the transaction with the result of [`persist`](Self::persist):
    /// keep the change and hand back the released ticket, or roll the pool
    /// back and return the error.
    pub fn settle(self, outcome: DomainResult<()>, pool: &mut TicketPool) -> DomainResult<Option<Ticket>> {
        match outcome {
            Ok(()) => {
                log::debug!("[POOL] committed, order now {:?}", self.order);
                Ok(self.released)
            }
            Err(e) => {
                log::warn!("[POOL] backend rejected change, rolling back: {}", e);
                self.rollback(pool);
                Err(e)
            }
        }
    }
}

/// Apply `op` optimistically, persist it, and roll back on failure.
/// Returns the ticket released from the pool, if any.
pub async fn commit<R>(pool: &mut TicketPool, repo: &R, op: PoolOp) -> DomainResult<Option<Ticket>>
where
    R: TicketRepository + ?Sized,
{
    let tx = pool.begin(op)?;
    let outcome = tx.persist(repo).await;
    tx.settle(outcome, pool)
}
