//! Pool Column Component
//!
//! The Tickets Pool: unscheduled tickets, front first. Cards can be dragged
//! between slots to reorder or onto the timeline to schedule.

use chrono::Utc;
use leptos::prelude::*;
use leptos::task::spawn_local;
use leptos_dragdrop::{
    bind_global_mouseup, make_on_mousedown, make_on_mouseleave, make_on_slot_mouseenter, DndSignals, DropTarget,
};
use ticket_core::{PoolOp, TicketId};
use timeline_engine::snap;

use crate::components::NewTicketForm;
use crate::context::{AppContext, TimelineContext};
use crate::markdown::summary;
use crate::store::{apply_pool_op, store_type_color, use_app_store, AppStateStoreFields};

const SUMMARY_CHARS: usize = 60;

/// Gap between cards that accepts a drop
#[component]
fn PoolSlot(position: usize) -> impl IntoView {
    let dnd = use_context::<DndSignals>().expect("DndSignals should be provided");
    let slot = position as i32;
    let active = move || dnd.drop_target_read.get() == Some(DropTarget::PoolSlot(slot));

    view! {
        <div
            class="pool-slot"
            class:active=active
            on:mouseenter=make_on_slot_mouseenter(dnd, slot)
            on:mouseleave=make_on_mouseleave(dnd)
        />
    }
}

#[component]
pub fn PoolColumn() -> impl IntoView {
    let ctx = use_context::<AppContext>().expect("AppContext should be provided");
    let tl = use_context::<TimelineContext>().expect("TimelineContext should be provided");
    let dnd = use_context::<DndSignals>().expect("DndSignals should be provided");
    let store = use_app_store();

    let run = move |op: PoolOp| {
        spawn_local(async move {
            if let Ok(Some(placed)) = apply_pool_op(store, ctx.repo, op).await {
                log::info!("[POOL] ticket {} placed at {}", placed.id, placed.start);
                store.selected().set(Some(placed.id));
            }
        });
    };

    bind_global_mouseup(dnd, move |dragged: u32, target: DropTarget, (client_x, _): (i32, i32)| {
        let Some(current) = store.pool().read_untracked().position_of(dragged) else { return };
        match target {
            DropTarget::PoolSlot(slot) => {
                let slot = slot.max(0) as usize;
                // Slots count the dragged card itself
                let to = if slot > current { slot - 1 } else { slot };
                if to != current {
                    run(PoolOp::Move { id: dragged, to });
                }
            }
            DropTarget::Timeline => {
                let snap_minutes = ctx.config.with_untracked(|c| c.snap_minutes);
                let start = snap(tl.time_at_client_x(client_x as f64), snap_minutes);
                run(PoolOp::Schedule { id: dragged, start });
            }
        }
    });

    let schedule_next = move |_| {
        let snap_minutes = ctx.config.with_untracked(|c| c.snap_minutes);
        run(PoolOp::ScheduleNext { start: snap(Utc::now(), snap_minutes) });
    };

    let remove = move |id: TicketId| run(PoolOp::Remove(id));

    let entries = move || {
        store
            .pool()
            .read()
            .iter()
            .enumerate()
            .map(|(i, t)| (i, t.clone()))
            .collect::<Vec<_>>()
    };

    // Card following the pointer while dragging
    let floating = move || {
        let id = dnd.dragging_id_read.get()?;
        let title = store.pool().read().get(id).map(|t| t.title.clone())?;
        let (x, y) = dnd.pointer_read.get();
        Some(view! {
            <div class="pool-card floating" style=format!("left: {}px; top: {}px;", x + 8, y + 8)>
                {title}
            </div>
        })
    };

    view! {
        <aside class="pool-column">
            {floating}
            <div class="pool-header">
                <h2>"Pool"</h2>
                <span class="pool-count">{move || store.pool().read().len()}</span>
                <button
                    class="schedule-next"
                    disabled=move || store.pool().read().is_empty()
                    on:click=schedule_next
                >
                    "Schedule next"
                </button>
            </div>

            <NewTicketForm />

            <div class="pool-list">
                <PoolSlot position=0 />
                <For
                    each=entries
                    key=|(i, t)| (*i, t.id, t.title.clone(), t.type_id, t.end - t.start)
                    children=move |(position, ticket)| {
                        let id = ticket.id;
                        let minutes = (ticket.end - ticket.start).num_minutes();
                        let color = store_type_color(&store, ticket.type_id).unwrap_or_default();
                        let note = ticket.description.as_deref().map(|d| summary(d, SUMMARY_CHARS)).unwrap_or_default();
                        let is_dragged = move || dnd.dragging_id_read.get() == Some(id);
                        let is_selected = move || store.selected().get() == Some(id);
                        view! {
                            <div
                                class="pool-card"
                                class:dragging=is_dragged
                                class:selected=is_selected
                                style=format!("--ticket-color: {};", color)
                                on:mousedown=make_on_mousedown(dnd, id)
                                on:click=move |_| {
                                    if !dnd.drag_just_ended_read.get_untracked() {
                                        store.selected().set(Some(id));
                                    }
                                }
                            >
                                <span class="pool-position">{position + 1}</span>
                                <span class="pool-title">{ticket.title.clone()}</span>
                                <span class="pool-duration">{format!("{} min", minutes)}</span>
                                {(!note.is_empty()).then(|| view! { <p class="pool-note">{note}</p> })}
                                <button
                                    class="pool-remove"
                                    title="Take out of the pool"
                                    on:click=move |ev| {
                                        ev.stop_propagation();
                                        remove(id);
                                    }
                                >
                                    "↩"
                                </button>
                            </div>
                            <PoolSlot position={position + 1} />
                        }
                    }
                />
            </div>
        </aside>
    }
}
