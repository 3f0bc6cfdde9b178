//! Global Application State Store
//!
//! Uses Leptos reactive_stores for fine-grained reactivity.

use chrono::{DateTime, Utc};
use leptos::prelude::*;
use reactive_stores::Store;
use ticket_core::{hierarchy, DomainError, DomainResult, PoolOp, Ticket, TicketId, TicketPool, TicketType};

use crate::storage::LocalStorageRepository;

/// Global application state with field-level reactivity
#[derive(Clone, Debug, Default, Store)]
pub struct AppState {
    /// Timeline tickets in the loaded range
    pub tickets: Vec<Ticket>,
    /// All ticket types
    pub types: Vec<TicketType>,
    /// Unscheduled tickets, front first
    pub pool: TicketPool,
    /// Ticket shown in the details panel
    pub selected: Option<TicketId>,
    /// Last failed operation, shown inline until dismissed
    pub error: Option<String>,
}

/// Type alias for the store
pub type AppStore = Store<AppState>;

/// Get the app store from context
pub fn use_app_store() -> AppStore {
    expect_context::<AppStore>()
}

// ========================
// Store Helper Functions
// ========================

/// Insert or replace a timeline ticket
pub fn store_upsert_ticket(store: &AppStore, ticket: Ticket) {
    let tickets_field = store.tickets();
    let mut tickets = tickets_field.write();
    match tickets.iter_mut().find(|t| t.id == ticket.id) {
        Some(existing) => *existing = ticket,
        None => tickets.push(ticket),
    }
}

/// Merge freshly fetched tickets, replacing stale copies
pub fn store_merge_tickets(store: &AppStore, fetched: Vec<Ticket>) {
    let tickets_field = store.tickets();
    let mut tickets = tickets_field.write();
    for ticket in fetched {
        match tickets.iter_mut().find(|t| t.id == ticket.id) {
            Some(existing) => *existing = ticket,
            None => tickets.push(ticket),
        }
    }
}

/// Remove a ticket and its descendants from the timeline
pub fn store_remove_ticket(store: &AppStore, ticket_id: TicketId) {
    let tickets_field = store.tickets();
    let mut tickets = tickets_field.write();
    let doomed: Vec<TicketId> = tickets
        .iter()
        .filter(|t| t.id == ticket_id || hierarchy::ancestors(&tickets, t.id).contains(&ticket_id))
        .map(|t| t.id)
        .collect();
    tickets.retain(|t| !doomed.contains(&t.id));
}

/// Look up a ticket on the timeline or in the pool
pub fn store_find_ticket(store: &AppStore, ticket_id: TicketId) -> Option<Ticket> {
    let on_timeline = store.tickets().read().iter().find(|t| t.id == ticket_id).cloned();
    on_timeline.or_else(|| store.pool().read().get(ticket_id).cloned())
}

pub fn store_type_color(store: &AppStore, type_id: Option<u32>) -> Option<String> {
    let type_id = type_id?;
    store.types().read().iter().find(|t| t.id == type_id).map(|t| t.color.clone())
}

/// Recompute statuses at `now`; returns the tickets whose status changed
pub fn store_refresh_statuses(store: &AppStore, now: DateTime<Utc>) -> Vec<Ticket> {
    let mut changed = Vec::new();
    for ticket in store.tickets().write().iter_mut() {
        if ticket.refresh_status(now) {
            changed.push(ticket.clone());
        }
    }
    changed
}

pub fn store_set_error(store: &AppStore, err: &DomainError) {
    store.error().set(Some(err.to_string()));
}

pub fn store_clear_error(store: &AppStore) {
    store.error().set(None);
}

/// Apply a pool operation optimistically and persist it. On failure the
/// pool is restored, the error shown and returned. A ticket released from
/// the pool lands on the timeline and is handed back.
pub async fn apply_pool_op(store: AppStore, repo: LocalStorageRepository, op: PoolOp) -> DomainResult<Option<Ticket>> {
    let pushed = match &op {
        PoolOp::Push(ticket) => Some(ticket.clone()),
        _ => None,
    };
    let begun = store.pool().write().begin(op);
    let tx = match begun {
        Ok(tx) => tx,
        Err(e) => {
            log::warn!("[POOL] rejected locally: {}", e);
            store_set_error(&store, &e);
            return Err(e);
        }
    };

    // Reflect the change before the backend answers
    if let Some(ticket) = &pushed {
        store.tickets().write().retain(|t| t.id != ticket.id);
    }
    let released_id = tx.released().map(|t| t.id);
    if let Some(released) = tx.released() {
        store_upsert_ticket(&store, released.clone());
    }

    let outcome = tx.persist(&repo).await;
    let settled = tx.settle(outcome, &mut store.pool().write());
    if let Err(e) = &settled {
        if let Some(id) = released_id {
            store.tickets().write().retain(|t| t.id != id);
        }
        if let Some(ticket) = pushed {
            store_upsert_ticket(&store, ticket);
        }
        store_set_error(&store, e);
    }
    settled
}
