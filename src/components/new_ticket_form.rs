//! New Ticket Form Component
//!
//! Creates a ticket and drops it at the back of the pool.

use chrono::{Duration, Utc};
use leptos::prelude::*;
use leptos::task::spawn_local;
use ticket_core::{DomainError, PoolOp, Repository, Ticket};
use timeline_engine::snap;

use crate::context::AppContext;
use crate::storage::LOCAL_USER_ID;
use crate::store::{apply_pool_op, store_clear_error, store_set_error, use_app_store, AppStateStoreFields};

const DEFAULT_MINUTES: i64 = 30;

/// Form for adding tickets to the pool
#[component]
pub fn NewTicketForm() -> impl IntoView {
    let ctx = use_context::<AppContext>().expect("AppContext should be provided");
    let store = use_app_store();

    let (title, set_title) = signal(String::new());
    let (minutes, set_minutes) = signal(DEFAULT_MINUTES);
    let (type_id, set_type_id) = signal(None::<u32>);

    let create_ticket = move |ev: web_sys::SubmitEvent| {
        ev.prevent_default();
        let text = title.get_untracked().trim().to_string();
        if text.is_empty() {
            return;
        }
        let config = ctx.config.get_untracked();
        let duration = Duration::minutes(minutes.get_untracked().max(config.min_duration_minutes));
        let start = snap(Utc::now(), config.snap_minutes);

        let mut ticket = match Ticket::new(0, LOCAL_USER_ID, text, start, start + duration) {
            Ok(t) => t,
            Err(e) => {
                store_set_error(&store, &e);
                return;
            }
        };
        ticket.type_id = type_id.get_untracked();
        if let Some(ticket_type) = ticket
            .type_id
            .and_then(|id| store.types().read_untracked().iter().find(|t| t.id == id).cloned())
        {
            ticket_type.apply_defaults(&mut ticket.properties);
            if let Err(e) = ticket_type.validate_properties(&ticket.properties) {
                store_set_error(&store, &e);
                return;
            }
        }

        spawn_local(async move {
            let created = match ctx.repo.create(&ticket).await {
                Ok(t) => t,
                Err(e) => {
                    log::warn!("[FORM] create failed: {}", e);
                    store_set_error(&store, &e);
                    return;
                }
            };
            log::info!("[FORM] created ticket {}", created.id);
            if apply_pool_op(store, ctx.repo, PoolOp::Push(created)).await.is_err() {
                return;
            }
            set_title.set(String::new());
            store_clear_error(&store);
        });
    };

    view! {
        <form class="new-ticket-form" on:submit=create_ticket>
            <input
                type="text"
                placeholder="New ticket..."
                prop:value=move || title.get()
                on:input=move |ev| set_title.set(event_target_value(&ev))
            />
            <div class="new-ticket-row">
                <input
                    type="number"
                    class="minutes"
                    min="1"
                    step="5"
                    prop:value=move || minutes.get().to_string()
                    on:change=move |ev| {
                        let value = event_target_value(&ev);
                        match value.trim().parse::<i64>() {
                            Ok(m) if m > 0 => set_minutes.set(m),
                            _ => store_set_error(
                                &store,
                                &DomainError::InvalidInput(format!("'{}' is not a number of minutes", value)),
                            ),
                        }
                    }
                />
                <span>"min"</span>
                <select on:change=move |ev| set_type_id.set(event_target_value(&ev).parse().ok())>
                    <option value="" selected=move || type_id.get().is_none()>"No type"</option>
                    <For
                        each=move || store.types().get()
                        key=|t| (t.id, t.name.clone())
                        children=move |t| {
                            let id = t.id;
                            view! {
                                <option value=id.to_string() selected=move || type_id.get() == Some(id)>{t.name}</option>
                            }
                        }
                    />
                </select>
                <button type="submit">"Add"</button>
            </div>
        </form>
    }
}
