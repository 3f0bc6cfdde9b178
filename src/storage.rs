//! Browser Persistence
//!
//! Repositories over `window.localStorage`. Each call loads the stored JSON
//! into the in-memory repository, runs the operation there and writes the
//! result back, so both share the same rules (id assignment, cascading
//! deletes, pool ordering).

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::Serialize;
use ticket_core::{
    DateRange, DomainError, DomainResult, InMemoryTicketRepository, InMemoryTypeRepository, Repository, Ticket,
    TicketId, TicketRepository, TicketType,
};
use timeline_engine::TimelineConfig;

const TICKETS_KEY: &str = "ticket-timeline.tickets";
const TYPES_KEY: &str = "ticket-timeline.types";
const CONFIG_KEY: &str = "ticket-timeline.config";

/// Owner recorded on tickets created in this browser
pub const LOCAL_USER_ID: u32 = 1;

fn local_storage() -> DomainResult<web_sys::Storage> {
    web_sys::window()
        .and_then(|w| w.local_storage().ok().flatten())
        .ok_or_else(|| DomainError::Backend("localStorage is not available".to_string()))
}

/// Raw string value of a key, if present
pub fn read_key(key: &str) -> Option<String> {
    local_storage().ok()?.get_item(key).ok().flatten()
}

fn load_json<T: DeserializeOwned + Default>(key: &str) -> DomainResult<T> {
    let raw = local_storage()?
        .get_item(key)
        .map_err(|_| DomainError::Backend(format!("cannot read {}", key)))?;
    match raw {
        Some(raw) => serde_json::from_str(&raw).map_err(|e| DomainError::Backend(format!("{} is corrupt: {}", key, e))),
        None => Ok(T::default()),
    }
}

fn save_json<T: Serialize + ?Sized>(key: &str, value: &T) -> DomainResult<()> {
    let raw = serde_json::to_string(value).map_err(|e| DomainError::Backend(e.to_string()))?;
    local_storage()?
        .set_item(key, &raw)
        .map_err(|_| DomainError::Backend(format!("cannot write {} (storage full?)", key)))
}

/// Timeline settings, with any stored overrides applied
pub fn load_config() -> TimelineConfig {
    match read_key(CONFIG_KEY) {
        Some(raw) => TimelineConfig::from_json(&raw).unwrap_or_else(|e| {
            log::warn!("[STORAGE] ignoring stored config: {}", e);
            TimelineConfig::default()
        }),
        None => TimelineConfig::default(),
    }
}

/// Tickets stored in localStorage
#[derive(Debug, Clone, Copy, Default)]
pub struct LocalStorageRepository;

impl LocalStorageRepository {
    fn open(&self) -> DomainResult<InMemoryTicketRepository> {
        let tickets: Vec<Ticket> = load_json(TICKETS_KEY)?;
        Ok(InMemoryTicketRepository::with_tickets(tickets))
    }

    async fn save(&self, repo: &InMemoryTicketRepository) -> DomainResult<()> {
        let tickets = repo.list().await?;
        save_json(TICKETS_KEY, &tickets)?;
        log::debug!("[STORAGE] saved {} tickets", tickets.len());
        Ok(())
    }
}

#[async_trait(?Send)]
impl Repository<Ticket> for LocalStorageRepository {
    async fn create(&self, entity: &Ticket) -> DomainResult<Ticket> {
        let repo = self.open()?;
        let created = repo.create(entity).await?;
        self.save(&repo).await?;
        Ok(created)
    }

    async fn find_by_id(&self, id: TicketId) -> DomainResult<Option<Ticket>> {
        let repo = self.open()?;
        repo.find_by_id(id).await
    }

    async fn list(&self) -> DomainResult<Vec<Ticket>> {
        let repo = self.open()?;
        repo.list().await
    }

    async fn update(&self, entity: &Ticket) -> DomainResult<Ticket> {
        let repo = self.open()?;
        let updated = repo.update(entity).await?;
        self.save(&repo).await?;
        Ok(updated)
    }

    async fn delete(&self, id: TicketId) -> DomainResult<()> {
        let repo = self.open()?;
        repo.delete(id).await?;
        self.save(&repo).await
    }
}

#[async_trait(?Send)]
impl TicketRepository for LocalStorageRepository {
    async fn list_in_range(&self, range: DateRange) -> DomainResult<Vec<Ticket>> {
        let repo = self.open()?;
        repo.list_in_range(range).await
    }

    async fn list_pool(&self) -> DomainResult<Vec<Ticket>> {
        let repo = self.open()?;
        repo.list_pool().await
    }

    async fn children(&self, id: TicketId) -> DomainResult<Vec<Ticket>> {
        let repo = self.open()?;
        repo.children(id).await
    }

    async fn save_pool_order(&self, ids: &[TicketId]) -> DomainResult<()> {
        let repo = self.open()?;
        repo.save_pool_order(ids).await?;
        self.save(&repo).await
    }
}

/// Ticket types stored in localStorage
#[derive(Debug, Clone, Copy, Default)]
pub struct LocalStorageTypeRepository;

impl LocalStorageTypeRepository {
    fn open(&self) -> DomainResult<InMemoryTypeRepository> {
        let types: Vec<TicketType> = load_json(TYPES_KEY)?;
        Ok(InMemoryTypeRepository::with_types(types))
    }

    async fn save(&self, repo: &InMemoryTypeRepository) -> DomainResult<()> {
        save_json(TYPES_KEY, &repo.list().await?)
    }
}

#[async_trait(?Send)]
impl Repository<TicketType> for LocalStorageTypeRepository {
    async fn create(&self, entity: &TicketType) -> DomainResult<TicketType> {
        let repo = self.open()?;
        let created = repo.create(entity).await?;
        self.save(&repo).await?;
        Ok(created)
    }

    async fn find_by_id(&self, id: u32) -> DomainResult<Option<TicketType>> {
        let repo = self.open()?;
        repo.find_by_id(id).await
    }

    async fn list(&self) -> DomainResult<Vec<TicketType>> {
        let repo = self.open()?;
        repo.list().await
    }

    async fn update(&self, entity: &TicketType) -> DomainResult<TicketType> {
        let repo = self.open()?;
        let updated = repo.update(entity).await?;
        self.save(&repo).await?;
        Ok(updated)
    }

    async fn delete(&self, id: u32) -> DomainResult<()> {
        let repo = self.open()?;
        repo.delete(id).await?;
        self.save(&repo).await
    }
}
