//! Ticket Timeline App
//!
//! Main application component: timeline in the middle, pool on the left,
//! details on the right.

use chrono::{Duration, Utc};
use gloo_timers::callback::Interval;
use leptos::prelude::*;
use leptos::task::spawn_local;
use leptos_dragdrop::create_dnd_signals;
use reactive_stores::Store;
use ticket_core::{DateRange, Repository, Ticket, TicketPool, TicketRepository, TicketType};
use timeline_engine::{NowMarker, TimeScale, Viewport};

use crate::components::{ErrorBanner, PoolColumn, TicketDetails, TimelineView, ZoomBar};
use crate::context::{AppContext, TimelineContext};
use crate::storage::{load_config, LocalStorageRepository};
use crate::store::{store_refresh_statuses, store_set_error, AppState, AppStateStoreFields, AppStore};

const DEFAULT_TYPE_NAME: &str = "Task";
const DEFAULT_TYPE_COLOR: &str = "#3498db";

/// Save tickets whose status moved on; failures are only logged
fn persist_statuses(repo: LocalStorageRepository, changed: Vec<Ticket>) {
    if changed.is_empty() {
        return;
    }
    spawn_local(async move {
        for ticket in changed {
            if let Err(e) = repo.update(&ticket).await {
                log::warn!("[APP] could not save status of ticket {}: {}", ticket.id, e);
            }
        }
    });
}

#[component]
pub fn App() -> impl IntoView {
    let config = load_config();
    let now = Utc::now();

    // State
    let (config, _set_config) = signal(config);
    let (now_marker, set_now_marker) = signal(NowMarker::new(now, config.get_untracked().now_refresh()));
    let (reload_trigger, set_reload_trigger) = signal(0u32);
    let store: AppStore = Store::new(AppState::default());

    let ctx = AppContext::new(config, (now_marker, set_now_marker), (reload_trigger, set_reload_trigger));
    let tl = {
        let config = config.get_untracked();
        let origin = now.date_naive().and_hms_opt(0, 0, 0).map(|t| t.and_utc()).unwrap_or(now);
        TimelineContext::new(
            TimeScale::new(origin, config.pixels_per_minute, config.row_height),
            Viewport::new(0.0, 0.0, 0.0),
            DateRange::around(now, config.initial_days),
        )
    };
    let dnd = create_dnd_signals(config.get_untracked().drag_threshold_px.round() as i32);

    // Provide context to all children
    provide_context(ctx);
    provide_context(tl);
    provide_context(store);
    provide_context(dnd);

    // Load types, pool and the visible window when the trigger changes
    Effect::new(move |_| {
        let trigger = reload_trigger.get();
        let window = tl.loaded.get_untracked();
        log::info!("[APP] loading tickets, trigger={}", trigger);
        spawn_local(async move {
            let mut types = match ctx.types_repo.list().await {
                Ok(types) => types,
                Err(e) => {
                    store_set_error(&store, &e);
                    Vec::new()
                }
            };
            if types.is_empty() {
                match ctx.types_repo.create(&TicketType::new(0, DEFAULT_TYPE_NAME, DEFAULT_TYPE_COLOR)).await {
                    Ok(created) => types.push(created),
                    Err(e) => log::warn!("[APP] could not seed default type: {}", e),
                }
            }
            types.sort_by_key(|t| t.id);
            store.types().set(types);

            match ctx.repo.list_pool().await {
                Ok(pool) => store.pool().set(TicketPool::from_tickets(pool)),
                Err(e) => store_set_error(&store, &e),
            }

            match ctx.repo.list_in_range(window).await {
                Ok(tickets) => {
                    log::info!("[APP] loaded {} tickets", tickets.len());
                    store.tickets().set(tickets);
                    let changed = store_refresh_statuses(&store, Utc::now());
                    persist_statuses(ctx.repo, changed);
                }
                Err(e) => store_set_error(&store, &e),
            }
        });
    });

    // Keep the now line and ticket statuses current
    let refresh_ms = config
        .get_untracked()
        .now_refresh()
        .num_milliseconds()
        .clamp(1_000, Duration::hours(1).num_milliseconds()) as u32;
    Interval::new(refresh_ms, move || {
        let now = Utc::now();
        if ctx.tick_now(now) {
            let changed = store_refresh_statuses(&store, now);
            persist_statuses(ctx.repo, changed);
        }
    })
    .forget();

    view! {
        <div class="app-layout">
            // Left: Tickets Pool
            <PoolColumn />

            // Center: Timeline
            <main class="main-content">
                <header class="toolbar">
                    <h1>"Timeline"</h1>
                    <ZoomBar />
                </header>
                <ErrorBanner />
                <TimelineView />
            </main>

            // Right: details of the selected ticket
            <TicketDetails />
        </div>
    }
}
