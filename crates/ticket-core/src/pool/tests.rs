//! Pool Tests
//!
//! Local FIFO behaviour plus optimistic commit against the in-memory
//! repository, including rollback when the backend refuses a write.

use async_trait::async_trait;
use chrono::{DateTime, Duration, TimeZone, Utc};
use std::cell::Cell;

use super::*;
use crate::domain::DateRange;
use crate::repository::InMemoryTicketRepository;

fn t0() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 9, 2, 9, 0, 0).unwrap()
}

fn make_ticket(id: TicketId, minutes: i64) -> Ticket {
    Ticket::new(id, 1, format!("Ticket {}", id), t0(), t0() + Duration::minutes(minutes)).unwrap()
}

fn pool_of(ids: &[TicketId]) -> TicketPool {
    let mut pool = TicketPool::new();
    for id in ids {
        pool.push(make_ticket(*id, 30)).unwrap();
    }
    pool
}

/// Repository wrapper whose writes fail once `fail` is set. `fail_order`
/// fails only the pool order write, after ticket updates went through.
struct FlakyRepository {
    inner: InMemoryTicketRepository,
    fail: Cell<bool>,
    fail_order: Cell<bool>,
}

impl FlakyRepository {
    fn new(tickets: Vec<Ticket>) -> Self {
        Self {
            inner: InMemoryTicketRepository::with_tickets(tickets),
            fail: Cell::new(false),
            fail_order: Cell::new(false),
        }
    }

    fn check(&self) -> DomainResult<()> {
        if self.fail.get() {
            Err(DomainError::Backend("503 Service Unavailable".to_string()))
        } else {
            Ok(())
        }
    }
}

#[async_trait(?Send)]
impl Repository<Ticket> for FlakyRepository {
    async fn create(&self, entity: &Ticket) -> DomainResult<Ticket> {
        self.check()?;
        self.inner.create(entity).await
    }

    async fn find_by_id(&self, id: TicketId) -> DomainResult<Option<Ticket>> {
        self.inner.find_by_id(id).await
    }

    async fn list(&self) -> DomainResult<Vec<Ticket>> {
        self.inner.list().await
    }

    async fn update(&self, entity: &Ticket) -> DomainResult<Ticket> {
        self.check()?;
        self.inner.update(entity).await
    }

    async fn delete(&self, id: TicketId) -> DomainResult<()> {
        self.check()?;
        self.inner.delete(id).await
    }
}

#[async_trait(?Send)]
impl TicketRepository for FlakyRepository {
    async fn list_in_range(&self, range: DateRange) -> DomainResult<Vec<Ticket>> {
        self.inner.list_in_range(range).await
    }

    async fn list_pool(&self) -> DomainResult<Vec<Ticket>> {
        self.inner.list_pool().await
    }

    async fn children(&self, id: TicketId) -> DomainResult<Vec<Ticket>> {
        self.inner.children(id).await
    }

    async fn save_pool_order(&self, ids: &[TicketId]) -> DomainResult<()> {
        self.check()?;
        if self.fail_order.get() {
            return Err(DomainError::Backend("order write timed out".to_string()));
        }
        self.inner.save_pool_order(ids).await
    }
}

#[test]
fn test_push_appends_in_fifo_order() {
    let pool = pool_of(&[3, 1, 2]);
    assert_eq!(pool.ids(), vec![3, 1, 2]);
    assert_eq!(pool.front().map(|t| t.id), Some(3));
    let positions: Vec<Option<i32>> = pool.iter().map(|t| t.pool_position).collect();
    assert_eq!(positions, vec![Some(0), Some(1), Some(2)]);
    assert!(pool.iter().all(|t| t.in_pool));
}

#[test]
fn test_push_rejects_duplicates() {
    let mut pool = pool_of(&[1]);
    assert!(matches!(pool.push(make_ticket(1, 30)), Err(DomainError::Conflict(_))));
    assert_eq!(pool.len(), 1);
}

#[test]
fn test_move_reorders_and_clamps() {
    let mut pool = pool_of(&[1, 2, 3, 4]);
    pool.move_to(4, 0).unwrap();
    assert_eq!(pool.ids(), vec![4, 1, 2, 3]);
    pool.move_to(4, 99).unwrap();
    assert_eq!(pool.ids(), vec![1, 2, 3, 4]);
    assert!(pool.move_to(9, 0).is_err());
}

#[test]
fn test_pop_front_releases_ticket() {
    let mut pool = pool_of(&[1, 2]);
    let popped = pool.pop_front().unwrap();
    assert_eq!(popped.id, 1);
    assert!(!popped.in_pool);
    assert_eq!(popped.pool_position, None);
    assert_eq!(pool.front().and_then(|t| t.pool_position), Some(0));
    pool.pop_front();
    assert!(pool.pop_front().is_none());
}

#[test]
fn test_schedule_next_keeps_duration() {
    let mut pool = TicketPool::new();
    pool.push(make_ticket(1, 45)).unwrap();
    pool.push(make_ticket(2, 30)).unwrap();

    let start = t0() + Duration::days(1);
    let placed = pool.schedule_next(start).unwrap();
    assert_eq!(placed.id, 1);
    assert_eq!(placed.start, start);
    assert_eq!(placed.duration(), Duration::minutes(45));
    assert!(!placed.in_pool);
    assert_eq!(pool.ids(), vec![2]);

    pool.remove(2).unwrap();
    assert!(pool.schedule_next(start).is_err());
}

#[test]
fn test_from_tickets_orders_by_saved_position() {
    let mut a = make_ticket(1, 30);
    a.in_pool = true;
    a.pool_position = Some(5);
    let mut b = make_ticket(2, 30);
    b.in_pool = true;
    b.pool_position = Some(1);
    let timeline = make_ticket(3, 30);

    let pool = TicketPool::from_tickets(vec![a, b, timeline]);
    assert_eq!(pool.ids(), vec![2, 1]);
    assert_eq!(pool.get(1).and_then(|t| t.pool_position), Some(1));
}

#[tokio::test]
async fn test_commit_persists_order() {
    let repo = FlakyRepository::new(vec![make_ticket(1, 30), make_ticket(2, 30), make_ticket(3, 30)]);
    let mut pool = TicketPool::new();
    for id in [1, 2, 3] {
        let ticket = repo.find_by_id(id).await.unwrap().unwrap();
        commit(&mut pool, &repo, PoolOp::Push(ticket)).await.unwrap();
    }
    commit(&mut pool, &repo, PoolOp::Move { id: 3, to: 0 }).await.unwrap();

    let stored: Vec<TicketId> = repo.list_pool().await.unwrap().iter().map(|t| t.id).collect();
    assert_eq!(stored, vec![3, 1, 2]);
    assert_eq!(pool.ids(), stored);
}

#[tokio::test]
async fn test_commit_schedule_next_moves_ticket_to_timeline() {
    let repo = FlakyRepository::new(vec![make_ticket(1, 60)]);
    let mut pool = TicketPool::new();
    let ticket = repo.find_by_id(1).await.unwrap().unwrap();
    commit(&mut pool, &repo, PoolOp::Push(ticket)).await.unwrap();

    let start = t0() + Duration::hours(3);
    let placed = commit(&mut pool, &repo, PoolOp::ScheduleNext { start }).await.unwrap().unwrap();
    assert_eq!(placed.start, start);

    let stored = repo.find_by_id(1).await.unwrap().unwrap();
    assert!(!stored.in_pool);
    assert_eq!(stored.end, start + Duration::hours(1));
    let range = DateRange::new(start, start + Duration::hours(1));
    assert_eq!(repo.list_in_range(range).await.unwrap().len(), 1);
}

#[tokio::test]
async fn test_failed_commit_rolls_back() {
    let repo = FlakyRepository::new(vec![make_ticket(1, 30), make_ticket(2, 30)]);
    let mut pool = TicketPool::new();
    for id in [1, 2] {
        let ticket = repo.find_by_id(id).await.unwrap().unwrap();
        commit(&mut pool, &repo, PoolOp::Push(ticket)).await.unwrap();
    }
    let before = pool.clone();

    repo.fail.set(true);
    let err = commit(&mut pool, &repo, PoolOp::Move { id: 2, to: 0 }).await.unwrap_err();
    assert!(matches!(err, DomainError::Backend(_)));
    assert_eq!(pool, before);

    let err = commit(&mut pool, &repo, PoolOp::PopFront).await.unwrap_err();
    assert!(matches!(err, DomainError::Backend(_)));
    assert_eq!(pool, before);
}

#[tokio::test]
async fn test_invalid_op_leaves_pool_untouched() {
    let repo = FlakyRepository::new(vec![]);
    let mut pool = TicketPool::new();
    assert!(matches!(
        commit(&mut pool, &repo, PoolOp::Remove(7)).await,
        Err(DomainError::NotFound(_))
    ));
    assert!(pool.is_empty());
}

#[test]
fn test_manual_transaction_rollback() {
    let mut pool = pool_of(&[1, 2, 3]);
    let tx = pool.begin(PoolOp::Remove(2)).unwrap();
    assert_eq!(tx.released().map(|t| t.id), Some(2));
    assert_eq!(tx.order(), &[1, 3]);
    assert_eq!(pool.ids(), vec![1, 3]);
    tx.rollback(&mut pool);
    assert_eq!(pool.ids(), vec![1, 2, 3]);
}

#[tokio::test]
async fn test_push_commit_reports_no_released_ticket() {
    let repo = FlakyRepository::new(vec![make_ticket(1, 30)]);
    let mut pool = TicketPool::new();
    let ticket = repo.find_by_id(1).await.unwrap().unwrap();
    assert_eq!(commit(&mut pool, &repo, PoolOp::Push(ticket)).await, Ok(None));
    assert_eq!(pool.ids(), vec![1]);
}

#[tokio::test]
async fn test_failed_order_write_restores_scheduled_ticket() {
    let repo = FlakyRepository::new(vec![make_ticket(1, 30)]);
    let mut pool = TicketPool::new();
    let ticket = repo.find_by_id(1).await.unwrap().unwrap();
    commit(&mut pool, &repo, PoolOp::Push(ticket)).await.unwrap();

    repo.fail_order.set(true);
    let start = t0() + Duration::days(2);
    let err = commit(&mut pool, &repo, PoolOp::Schedule { id: 1, start }).await.unwrap_err();
    assert!(matches!(err, DomainError::Backend(_)));
    assert_eq!(pool.ids(), vec![1]);

    // Backend agrees with the rolled back pool
    let stored = repo.find_by_id(1).await.unwrap().unwrap();
    assert!(stored.in_pool);
    assert_eq!(stored.pool_position, Some(0));
    assert_eq!(stored.start, t0());
    let stored_pool: Vec<TicketId> = repo.list_pool().await.unwrap().iter().map(|t| t.id).collect();
    assert_eq!(stored_pool, pool.ids());
}

#[tokio::test]
async fn test_failed_order_write_restores_pushed_ticket() {
    let repo = FlakyRepository::new(vec![make_ticket(1, 30)]);
    let mut pool = TicketPool::new();
    let ticket = repo.find_by_id(1).await.unwrap().unwrap();

    repo.fail_order.set(true);
    assert!(commit(&mut pool, &repo, PoolOp::Push(ticket)).await.is_err());
    assert!(pool.is_empty());

    let stored = repo.find_by_id(1).await.unwrap().unwrap();
    assert!(!stored.in_pool);
    assert_eq!(stored.pool_position, None);
    assert!(repo.list_pool().await.unwrap().is_empty());
}

#[tokio::test]
async fn test_settle_keeps_or_reverts_change() {
    let repo = FlakyRepository::new(vec![make_ticket(1, 30), make_ticket(2, 30)]);
    let mut pool = TicketPool::new();
    for id in [1, 2] {
        let ticket = repo.find_by_id(id).await.unwrap().unwrap();
        commit(&mut pool, &repo, PoolOp::Push(ticket)).await.unwrap();
    }

    let tx = pool.begin(PoolOp::PopFront).unwrap();
    let outcome = tx.persist(&repo).await;
    let released = tx.settle(outcome, &mut pool).unwrap();
    assert_eq!(released.map(|t| t.id), Some(1));
    assert_eq!(pool.ids(), vec![2]);

    let tx = pool.begin(PoolOp::Remove(2)).unwrap();
    let rejected: DomainResult<()> = Err(DomainError::Backend("offline".to_string()));
    assert_eq!(tx.settle(rejected.clone(), &mut pool), rejected.map(|_| None));
    assert_eq!(pool.ids(), vec![2]);
}
