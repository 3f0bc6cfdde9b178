//! In-Memory Repositories
//!
//! BTreeMap-backed storage for tests and offline use.

use async_trait::async_trait;
use std::cell::{Cell, RefCell};
use std::collections::BTreeMap;

use super::traits::{Repository, TicketRepository};
use crate::domain::{hierarchy, DateRange, DomainError, DomainResult, Ticket, TicketId, TicketType};

fn now_millis() -> i64 {
    chrono::Utc::now().timestamp_millis()
}

/// In-memory implementation of the ticket repository
#[derive(Debug, Default)]
pub struct InMemoryTicketRepository {
    tickets: RefCell<BTreeMap<TicketId, Ticket>>,
    last_id: Cell<TicketId>,
}

impl InMemoryTicketRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed the repository, keeping the tickets' own IDs
    pub fn with_tickets(tickets: impl IntoIterator<Item = Ticket>) -> Self {
        let repo = Self::new();
        {
            let mut map = repo.tickets.borrow_mut();
            for ticket in tickets {
                repo.last_id.set(repo.last_id.get().max(ticket.id));
                map.insert(ticket.id, ticket);
            }
        }
        repo
    }

    pub fn len(&self) -> usize {
        self.tickets.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.tickets.borrow().is_empty()
    }
}

#[async_trait(?Send)]
impl Repository<Ticket> for InMemoryTicketRepository {
    async fn create(&self, entity: &Ticket) -> DomainResult<Ticket> {
        let id = self.last_id.get() + 1;
        self.last_id.set(id);

        let mut created = entity.clone();
        created.id = id;
        let now = now_millis();
        created.created_at = Some(now);
        created.updated_at = Some(now);

        self.tickets.borrow_mut().insert(id, created.clone());
        log::debug!("[REPO] created ticket {}", id);
        Ok(created)
    }

    async fn find_by_id(&self, id: TicketId) -> DomainResult<Option<Ticket>> {
        Ok(self.tickets.borrow().get(&id).cloned())
    }

    async fn list(&self) -> DomainResult<Vec<Ticket>> {
        Ok(self.tickets.borrow().values().cloned().collect())
    }

    async fn update(&self, entity: &Ticket) -> DomainResult<Ticket> {
        let mut tickets = self.tickets.borrow_mut();
        let stored = tickets
            .get_mut(&entity.id)
            .ok_or_else(|| DomainError::NotFound(format!("ticket {}", entity.id)))?;
        *stored = entity.clone();
        stored.updated_at = Some(now_millis());
        Ok(stored.clone())
    }

    async fn delete(&self, id: TicketId) -> DomainResult<()> {
        let mut tickets = self.tickets.borrow_mut();
        if !tickets.contains_key(&id) {
            return Err(DomainError::NotFound(format!("ticket {}", id)));
        }
        // Manual cascade: descendants go with their parent
        let all: Vec<Ticket> = tickets.values().cloned().collect();
        let doomed: Vec<TicketId> = all
            .iter()
            .filter(|t| t.id == id || hierarchy::ancestors(&all, t.id).contains(&id))
            .map(|t| t.id)
            .collect();
        for tid in &doomed {
            tickets.remove(tid);
        }
        log::debug!("[REPO] deleted ticket {} ({} with descendants)", id, doomed.len());
        Ok(())
    }
}

#[async_trait(?Send)]
impl TicketRepository for InMemoryTicketRepository {
    async fn list_in_range(&self, range: DateRange) -> DomainResult<Vec<Ticket>> {
        let mut result: Vec<Ticket> = self
            .tickets
            .borrow()
            .values()
            .filter(|t| !t.in_pool && range.intersects(t.start, t.end))
            .cloned()
            .collect();
        result.sort_by_key(|t| (t.start, t.id));
        Ok(result)
    }

    async fn list_pool(&self) -> DomainResult<Vec<Ticket>> {
        let mut result: Vec<Ticket> = self
            .tickets
            .borrow()
            .values()
            .filter(|t| t.in_pool)
            .cloned()
            .collect();
        result.sort_by_key(|t| (t.pool_position.unwrap_or(i32::MAX), t.id));
        Ok(result)
    }

    async fn children(&self, id: TicketId) -> DomainResult<Vec<Ticket>> {
        let all: Vec<Ticket> = self.tickets.borrow().values().cloned().collect();
        Ok(hierarchy::children(&all, id))
    }

    async fn save_pool_order(&self, ids: &[TicketId]) -> DomainResult<()> {
        let mut tickets = self.tickets.borrow_mut();
        if let Some(missing) = ids.iter().find(|id| !tickets.contains_key(id)) {
            return Err(DomainError::NotFound(format!("ticket {}", missing)));
        }
        let now = now_millis();
        for (position, id) in ids.iter().enumerate() {
            if let Some(ticket) = tickets.get_mut(id) {
                ticket.in_pool = true;
                ticket.pool_position = Some(position as i32);
                ticket.updated_at = Some(now);
            }
        }
        Ok(())
    }
}

/// In-memory implementation of the ticket type repository
#[derive(Debug, Default)]
pub struct InMemoryTypeRepository {
    types: RefCell<BTreeMap<u32, TicketType>>,
    last_id: Cell<u32>,
}

impl InMemoryTypeRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed with already-stored types, keeping their IDs
    pub fn with_types(types: impl IntoIterator<Item = TicketType>) -> Self {
        let repo = Self::new();
        {
            let mut map = repo.types.borrow_mut();
            for ticket_type in types {
                repo.last_id.set(repo.last_id.get().max(ticket_type.id));
                map.insert(ticket_type.id, ticket_type);
            }
        }
        repo
    }
}

#[async_trait(?Send)]
impl Repository<TicketType> for InMemoryTypeRepository {
    async fn create(&self, entity: &TicketType) -> DomainResult<TicketType> {
        entity.validate()?;
        let duplicate = self
            .types
            .borrow()
            .values()
            .any(|t| t.name.eq_ignore_ascii_case(&entity.name));
        if duplicate {
            return Err(DomainError::Conflict(format!("ticket type '{}' already exists", entity.name)));
        }

        let id = self.last_id.get() + 1;
        self.last_id.set(id);
        let mut created = entity.clone();
        created.id = id;
        self.types.borrow_mut().insert(id, created.clone());
        Ok(created)
    }

    async fn find_by_id(&self, id: u32) -> DomainResult<Option<TicketType>> {
        Ok(self.types.borrow().get(&id).cloned())
    }

    async fn list(&self) -> DomainResult<Vec<TicketType>> {
        Ok(self.types.borrow().values().cloned().collect())
    }

    async fn update(&self, entity: &TicketType) -> DomainResult<TicketType> {
        entity.validate()?;
        let mut types = self.types.borrow_mut();
        let stored = types
            .get_mut(&entity.id)
            .ok_or_else(|| DomainError::NotFound(format!("ticket type {}", entity.id)))?;
        *stored = entity.clone();
        Ok(stored.clone())
    }

    async fn delete(&self, id: u32) -> DomainResult<()> {
        self.types
            .borrow_mut()
            .remove(&id)
            .map(|_| ())
            .ok_or_else(|| DomainError::NotFound(format!("ticket type {}", id)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone, Utc};

    fn make_ticket(title: &str, day: u32) -> Ticket {
        let start = Utc.with_ymd_and_hms(2024, 6, day, 9, 0, 0).unwrap();
        Ticket::new(0, 1, title, start, start + Duration::hours(2)).unwrap()
    }

    #[tokio::test]
    async fn test_create_and_find() {
        let repo = InMemoryTicketRepository::new();
        let created = repo.create(&make_ticket("Write report", 3)).await.unwrap();
        assert_eq!(created.id, 1);
        assert!(created.created_at.is_some());

        let found = repo.find_by_id(created.id).await.unwrap();
        assert_eq!(found.map(|t| t.title), Some("Write report".to_string()));
    }

    #[tokio::test]
    async fn test_update_missing_ticket() {
        let repo = InMemoryTicketRepository::new();
        let mut ghost = make_ticket("Ghost", 3);
        ghost.id = 42;
        assert!(matches!(repo.update(&ghost).await, Err(DomainError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_list_in_range_skips_pool() {
        let repo = InMemoryTicketRepository::new();
        repo.create(&make_ticket("Mon", 3)).await.unwrap();
        repo.create(&make_ticket("Tue", 4)).await.unwrap();
        let mut pooled = make_ticket("Someday", 4);
        pooled.in_pool = true;
        pooled.pool_position = Some(0);
        repo.create(&pooled).await.unwrap();

        let from = Utc.with_ymd_and_hms(2024, 6, 4, 0, 0, 0).unwrap();
        let found = repo.list_in_range(DateRange::new(from, from + Duration::days(1))).await.unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].title, "Tue");
        assert_eq!(repo.list_pool().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_delete_cascades_to_descendants() {
        let repo = InMemoryTicketRepository::new();
        let parent = repo.create(&make_ticket("Project", 3)).await.unwrap();
        let mut child = make_ticket("Task", 3);
        child.parent_id = Some(parent.id);
        let child = repo.create(&child).await.unwrap();
        let mut grandchild = make_ticket("Subtask", 3);
        grandchild.parent_id = Some(child.id);
        repo.create(&grandchild).await.unwrap();
        repo.create(&make_ticket("Unrelated", 4)).await.unwrap();

        assert_eq!(repo.children(parent.id).await.unwrap().len(), 1);
        repo.delete(parent.id).await.unwrap();
        assert_eq!(repo.len(), 1);
    }

    #[tokio::test]
    async fn test_save_pool_order() {
        let repo = InMemoryTicketRepository::new();
        let a = repo.create(&make_ticket("A", 3)).await.unwrap();
        let b = repo.create(&make_ticket("B", 3)).await.unwrap();

        repo.save_pool_order(&[b.id, a.id]).await.unwrap();
        let pool: Vec<String> = repo.list_pool().await.unwrap().into_iter().map(|t| t.title).collect();
        assert_eq!(pool, vec!["B", "A"]);

        assert!(repo.save_pool_order(&[a.id, 99]).await.is_err());
    }

    #[tokio::test]
    async fn test_type_repository_rejects_duplicates_and_invalid() {
        let repo = InMemoryTypeRepository::new();
        repo.create(&TicketType::new(0, "Meeting", "#123456")).await.unwrap();
        assert!(matches!(
            repo.create(&TicketType::new(0, "meeting", "#654321")).await,
            Err(DomainError::Conflict(_))
        ));
        assert!(matches!(
            repo.create(&TicketType::new(0, "Errand", "green")).await,
            Err(DomainError::Validation(_))
        ));
        assert_eq!(repo.list().await.unwrap().len(), 1);
    }
}
