//! Timeline View Component
//!
//! The scrollable lane surface: ticket blocks, the time axis, night shading
//! and the now line. Owns every pointer, wheel and touch gesture on it.

use chrono::Local;
use leptos::html::Div;
use leptos::prelude::*;
use leptos::task::spawn_local;
use leptos_dragdrop::{make_on_mouseleave, make_on_timeline_mouseenter, DndSignals, DropTarget};
use ticket_core::{Repository, TicketId, TicketRepository};
use timeline_engine::{
    generate_markers, hit_test, layout, night_bands, DeltaMode, DragOutcome, DragPreview, DragSession, MarkerKind,
    PanTracker, Point, PrefetchPolicy, PrefetchTracker, TicketBox, WheelAction, WheelInput,
};
use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;

use crate::components::{SunOverlay, TicketBlock, TimeAxis};
use crate::context::{AppContext, TimelineContext};
use crate::store::{
    store_find_ticket, store_merge_tickets, store_set_error, store_type_color, store_upsert_ticket, use_app_store,
    AppStateStoreFields,
};

const FRAME_MS: u32 = 16;

#[component]
pub fn TimelineView() -> impl IntoView {
    let ctx = use_context::<AppContext>().expect("AppContext should be provided");
    let tl = use_context::<TimelineContext>().expect("TimelineContext should be provided");
    let dnd = use_context::<DndSignals>().expect("DndSignals should be provided");
    let store = use_app_store();

    let surface_ref = NodeRef::<Div>::new();

    // Gesture state, mutated from event handlers only
    let drag = StoredValue::new(None::<DragSession>);
    let pan = StoredValue::new(PanTracker::new());
    let momentum_gen = StoredValue::new(0u32);
    let prefetch = StoredValue::new(PrefetchTracker::new(tl.loaded.get_untracked()));

    let (preview, set_preview) = signal(None::<(TicketId, DragPreview)>);

    let visible = Memo::new(move |_| {
        let scale = tl.scale.get();
        tl.viewport.with(|v| v.visible_range(&scale))
    });

    let boxes = Memo::new(move |_| {
        let scale = tl.scale.get();
        let window = tl.loaded.get();
        let gap = ctx.config.with(|c| c.lane_gap);
        let tickets = store.tickets().read();
        layout(&tickets, &scale, window, gap)
    });

    Effect::new(move |_| {
        let scale = tl.scale.get();
        let height = boxes.with(|l| l.height(&scale));
        tl.set_content_height(height);
    });

    let markers = Memo::new(move |_| {
        let scale = tl.scale.get();
        generate_markers(&scale, visible.get(), &Local)
    });

    let bands = Memo::new(move |_| {
        let (lat, lon) = ctx.config.with(|c| (c.latitude, c.longitude));
        night_bands(visible.get(), lat, lon)
    });

    let scroll_x = Signal::derive(move || tl.viewport.with(|v| v.scroll_x));

    // ========================
    // Prefetch at the edges
    // ========================

    Effect::new(move |_| {
        let scale = tl.scale.get();
        let visible = visible.get();
        let loaded = tl.loaded.get();
        let policy = PrefetchPolicy::from_config(&ctx.config.get_untracked());

        let mut requests = Vec::new();
        prefetch.update_value(|tracker| {
            // A reload replaced the window under us
            if !tracker.is_loading() && tracker.loaded() != loaded {
                tracker.reset(loaded);
            }
            requests = tracker.poll(&policy, visible, &scale);
        });

        for request in requests {
            spawn_local(async move {
                match ctx.repo.list_in_range(request.range).await {
                    Ok(fetched) => {
                        log::debug!("[PREFETCH] {:?}: {} tickets", request.direction, fetched.len());
                        store_merge_tickets(&store, fetched);
                        let mut grew = None;
                        prefetch.update_value(|tracker| {
                            if tracker.complete(&request) {
                                grew = Some(tracker.loaded());
                            }
                        });
                        if let Some(loaded) = grew {
                            tl.set_loaded(loaded);
                        }
                    }
                    Err(e) => {
                        log::warn!("[PREFETCH] {:?} failed: {}", request.direction, e);
                        prefetch.update_value(|tracker| {
                            tracker.fail(&request);
                        });
                        store_set_error(&store, &e);
                    }
                }
            });
        }
    });

    // ========================
    // Size tracking
    // ========================

    let measure = move || {
        let Some(el) = surface_ref.get_untracked() else { return };
        let rect = el.get_bounding_client_rect();
        tl.set_surface(rect.left(), rect.top());
        tl.set_size(rect.width(), rect.height());
    };

    Effect::new(move |prev: Option<bool>| {
        if surface_ref.get().is_none() {
            return false;
        }
        measure();
        if prev != Some(true) {
            tl.center_on(ctx.now.get_untracked().at);
        }
        true
    });

    let on_resize = Closure::<dyn FnMut()>::new(move || measure());
    if let Some(window) = web_sys::window() {
        let _ = window.add_event_listener_with_callback("resize", on_resize.as_ref().unchecked_ref());
    }
    on_resize.forget();

    // ========================
    // Drag to move / resize
    // ========================

    let cancel_drag = move || {
        let mut taken = None;
        drag.update_value(|s| taken = s.take());
        if let Some(session) = taken {
            session.cancel();
            set_preview.set(None);
        }
    };

    let on_keydown = Closure::<dyn FnMut(web_sys::KeyboardEvent)>::new(move |ev: web_sys::KeyboardEvent| {
        if ev.key() == "Escape" {
            cancel_drag();
        }
    });
    if let Some(doc) = web_sys::window().and_then(|w| w.document()) {
        let _ = doc.add_event_listener_with_callback("keydown", on_keydown.as_ref().unchecked_ref());
    }
    on_keydown.forget();

    let on_pointerdown = move |ev: web_sys::PointerEvent| {
        if ev.pointer_type() == "touch" || ev.button() != 0 {
            return;
        }
        let config = ctx.config.get_untracked();
        let point = tl.client_to_point(ev.client_x() as f64, ev.client_y() as f64);
        let hit = boxes.with_untracked(|l| l.hit(point.x, point.y).cloned());
        let Some(ticket_box) = hit else {
            store.selected().set(None);
            return;
        };
        let Some(ticket) = store_find_ticket(&store, ticket_box.id) else { return };

        let mode = hit_test(&ticket_box, point, config.resize_handle_px);
        if let Some(session) = DragSession::begin(&ticket, ticket_box.lane, mode, point, &config) {
            drag.set_value(Some(session));
            if let Some(el) = surface_ref.get_untracked() {
                let _ = el.set_pointer_capture(ev.pointer_id());
            }
            ev.prevent_default();
        }
    };

    let on_pointermove = move |ev: web_sys::PointerEvent| {
        if ev.pointer_type() == "touch" {
            return;
        }
        let point = tl.client_to_point(ev.client_x() as f64, ev.client_y() as f64);
        let scale = tl.scale.get_untracked();
        let mut moved = None;
        drag.update_value(|s| {
            if let Some(session) = s.as_mut() {
                let id = session.id();
                moved = session.update(point, &scale).map(|p| (id, *p));
            }
        });
        if moved.is_some() {
            set_preview.set(moved);
        }
    };

    let on_pointerup = move |ev: web_sys::PointerEvent| {
        if ev.pointer_type() == "touch" {
            return;
        }
        let mut taken = None;
        drag.update_value(|s| taken = s.take());
        let Some(session) = taken else { return };
        set_preview.set(None);

        let outcome = session.finish();
        match outcome {
            DragOutcome::Click(id) => store.selected().set(Some(id)),
            DragOutcome::Unchanged(_) => {}
            DragOutcome::Changed { id, .. } => {
                let Some(original) = store_find_ticket(&store, id) else { return };
                let mut updated = original.clone();
                match outcome.apply(&mut updated) {
                    Ok(true) => {
                        store_upsert_ticket(&store, updated.clone());
                        spawn_local(async move {
                            if let Err(e) = ctx.repo.update(&updated).await {
                                log::warn!("[DRAG] save failed for ticket {}: {}", id, e);
                                store_upsert_ticket(&store, original);
                                store_set_error(&store, &e);
                            }
                        });
                    }
                    Ok(false) => {}
                    Err(e) => store_set_error(&store, &e),
                }
            }
        }
    };

    // ========================
    // Wheel scroll and zoom
    // ========================

    let on_wheel = move |ev: web_sys::WheelEvent| {
        ev.prevent_default();
        let config = ctx.config.get_untracked();
        let (left, _) = tl.surface.get_untracked();
        let input = WheelInput {
            delta_x: ev.delta_x(),
            delta_y: ev.delta_y(),
            mode: DeltaMode::from_dom(ev.delta_mode()),
            ctrl: ev.ctrl_key() || ev.meta_key(),
            shift: ev.shift_key(),
            offset_x: ev.client_x() as f64 - left,
        };
        match input.action(&config) {
            WheelAction::Scroll { dx, dy } => {
                tl.scroll_by(dx, dy);
            }
            WheelAction::Zoom { factor, anchor_x } => tl.zoom_by(factor, anchor_x, &config),
        }
    };

    // ========================
    // Touch pan with momentum
    // ========================

    let first_touch = |ev: &web_sys::TouchEvent| {
        ev.touches()
            .get(0)
            .map(|t| Point::new(t.client_x() as f64, t.client_y() as f64))
    };

    let on_touchstart = move |ev: web_sys::TouchEvent| {
        // Stops any glide in flight
        momentum_gen.update_value(|g| *g = g.wrapping_add(1));
        if ev.touches().length() != 1 {
            pan.update_value(|p| p.cancel());
            return;
        }
        if let Some(point) = first_touch(&ev) {
            pan.update_value(|p| p.start(point, ev.time_stamp()));
        }
    };

    let on_touchmove = move |ev: web_sys::TouchEvent| {
        if !pan.with_value(|p| p.is_tracking()) {
            return;
        }
        let Some(point) = first_touch(&ev) else { return };
        ev.prevent_default();
        let mut delta = (0.0, 0.0);
        pan.update_value(|p| delta = p.move_to(point, ev.time_stamp()));
        tl.scroll_by(delta.0, delta.1);
    };

    let on_touchend = move |ev: web_sys::TouchEvent| {
        let config = ctx.config.get_untracked();
        let mut released = None;
        pan.update_value(|p| released = p.release(ev.time_stamp(), &config));
        let Some(mut momentum) = released else { return };

        let generation = momentum_gen.get_value();
        spawn_local(async move {
            loop {
                gloo_timers::future::TimeoutFuture::new(FRAME_MS).await;
                if momentum_gen.try_get_value() != Some(generation) {
                    break;
                }
                let Some((dx, dy)) = momentum.step(FRAME_MS as f64) else { break };
                let (moved_x, moved_y) = tl.scroll_by(dx, dy);
                momentum.stop_axes(moved_x == 0.0 && dx != 0.0, moved_y == 0.0 && dy != 0.0);
            }
        });
    };

    let on_touchcancel = move |_ev: web_sys::TouchEvent| {
        pan.update_value(|p| p.cancel());
    };

    // ========================
    // Rendering
    // ========================

    let rows = Memo::new(move |_| {
        let layout = boxes.get();
        let tickets = store.tickets().read();
        layout
            .boxes
            .into_iter()
            .filter_map(|b| {
                let ticket = tickets.iter().find(|t| t.id == b.id)?;
                Some((b, ticket.title.clone(), ticket.type_id))
            })
            .collect::<Vec<_>>()
    });

    let lanes_transform = move || {
        tl.viewport.with(|v| format!("transform: translate({}px, {}px);", -v.scroll_x, -v.scroll_y))
    };
    let x_transform = move || format!("transform: translateX({}px);", -scroll_x.get());

    let now_x = move || {
        let scale = tl.scale.get();
        ctx.now.with(|n| n.x(&scale))
    };

    let ghost = move || {
        let (id, p) = preview.get()?;
        let scale = tl.scale.get();
        let gap = ctx.config.with_untracked(|c| c.lane_gap);
        let (status, title, type_id) = rows.with_untracked(|rows| {
            rows.iter()
                .find(|(b, _, _)| b.id == id)
                .map(|(b, title, type_id)| (b.status, title.clone(), *type_id))
        })?;
        let ticket_box = TicketBox {
            id,
            lane: p.lane,
            x: scale.time_to_x(p.start),
            y: scale.lane_to_y(p.lane) + gap / 2.0,
            width: scale.width_of(p.end - p.start),
            height: scale.row_height - gap,
            status,
        };
        let color = store_type_color(&store, type_id);
        Some(view! {
            <TicketBlock ticket_box=ticket_box title=title color=color selected=true dragging=true />
        })
    };

    let drop_here = move || dnd.drop_target_read.get() == Some(DropTarget::Timeline);

    view! {
        <section class="timeline">
            <TimeAxis markers=markers scroll_x=scroll_x />
            <div
                class="timeline-surface"
                class=("drop-target", drop_here)
                node_ref=surface_ref
                on:pointerdown=on_pointerdown
                on:pointermove=on_pointermove
                on:pointerup=on_pointerup
                on:pointercancel=move |_| cancel_drag()
                on:wheel=on_wheel
                on:touchstart=on_touchstart
                on:touchmove=on_touchmove
                on:touchend=on_touchend
                on:touchcancel=on_touchcancel
                on:mouseenter=make_on_timeline_mouseenter(dnd)
                on:mouseleave=make_on_mouseleave(dnd)
            >
                <div class="timeline-x-layer" style=x_transform>
                    <SunOverlay bands=bands scale=tl.scale />
                    {move || markers.get().into_iter().filter(|m| m.kind == MarkerKind::Major).map(|m| {
                        view! { <div class="gridline" style=format!("left: {}px;", m.x) /> }
                    }).collect_view()}
                    <div class="now-line" style=move || format!("left: {}px;", now_x()) />
                </div>
                <div class="timeline-lanes" style=lanes_transform>
                    <For
                        each=move || rows.get()
                        key=|(b, title, type_id)| (b.id, b.lane, b.x.to_bits(), b.width.to_bits(), b.status, title.clone(), *type_id)
                        children=move |(ticket_box, title, type_id)| {
                            let id = ticket_box.id;
                            let color = store_type_color(&store, type_id);
                            let selected = Signal::derive(move || store.selected().get() == Some(id));
                            view! { <TicketBlock ticket_box=ticket_box title=title color=color selected=selected /> }
                        }
                    />
                    {ghost}
                </div>
                <Show when=drop_here>
                    <div class="drop-hint">"Drop to schedule here"</div>
                </Show>
            </div>
        </section>
    }
}
