//! Ticket Details Component
//!
//! Side panel for the selected ticket: description, custom fields,
//! upcoming occurrences and children, plus confirm / pool / delete actions.

use chrono::{Duration, Utc};
use leptos::prelude::*;
use leptos::task::spawn_local;
use serde_json::Value;
use ticket_core::{hierarchy, PoolOp, Repository, Ticket, TicketStatus, TicketType};

use crate::clock::format_span;
use crate::components::DeleteConfirmButton;
use crate::context::AppContext;
use crate::markdown::parse_markdown;
use crate::store::{
    apply_pool_op, store_find_ticket, store_remove_ticket, store_set_error, store_upsert_ticket, use_app_store,
    AppStateStoreFields,
};

const UPCOMING: usize = 5;
/// How far ahead to look for upcoming occurrences
const UPCOMING_HORIZON_DAYS: i64 = 400;

fn render_value(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Bool(true) => "yes".to_string(),
        Value::Bool(false) => "no".to_string(),
        Value::Null => "-".to_string(),
        other => other.to_string(),
    }
}

#[component]
pub fn TicketDetails() -> impl IntoView {
    let ctx = use_context::<AppContext>().expect("AppContext should be provided");
    let store = use_app_store();

    let ticket = Memo::new(move |_| {
        let id = store.selected().get()?;
        store_find_ticket(&store, id)
    });

    let ticket_type = move |t: &Ticket| -> Option<TicketType> {
        let id = t.type_id?;
        store.types().read().iter().find(|ty| ty.id == id).cloned()
    };

    let confirm = move |original: Ticket| {
        let mut updated = original.clone();
        if let Err(e) = updated.confirm(Utc::now()) {
            store_set_error(&store, &e);
            return;
        }
        store_upsert_ticket(&store, updated.clone());
        spawn_local(async move {
            if let Err(e) = ctx.repo.update(&updated).await {
                log::warn!("[DETAILS] confirm failed for ticket {}: {}", updated.id, e);
                store_upsert_ticket(&store, original);
                store_set_error(&store, &e);
            }
        });
    };

    let send_to_pool = move |t: Ticket| {
        spawn_local(async move {
            let _ = apply_pool_op(store, ctx.repo, PoolOp::Push(t)).await;
        });
    };

    let delete = move |id: u32| {
        spawn_local(async move {
            match ctx.repo.delete(id).await {
                Ok(()) => {
                    store_remove_ticket(&store, id);
                    store.selected().set(None);
                    // Pool tickets are not in the timeline list
                    ctx.reload();
                }
                Err(e) => {
                    log::warn!("[DETAILS] delete failed for ticket {}: {}", id, e);
                    store_set_error(&store, &e);
                }
            }
        });
    };

    view! {
        <aside class="ticket-details">
            {move || match ticket.get() {
                None => view! { <p class="placeholder">"Select a ticket to see its details"</p> }.into_any(),
                Some(t) => {
                    let ty = ticket_type(&t);
                    let color = ty.as_ref().map(|ty| ty.color.clone()).unwrap_or_default();
                    let type_name = ty.as_ref().map(|ty| ty.name.clone()).unwrap_or_else(|| "No type".to_string());
                    let status_class = format!("status-badge status-{}", t.status.as_str().to_lowercase().replace('_', "-"));
                    let span = if t.in_pool {
                        format!("In pool, {} min", t.duration().num_minutes())
                    } else {
                        format_span(t.start, t.end)
                    };
                    let description = t.description.as_deref().map(parse_markdown);

                    // Custom fields, with problems flagged inline
                    let field_errors = ty
                        .as_ref()
                        .and_then(|ty| ty.validate_properties(&t.properties).err())
                        .map(|e| e.field_errors().to_vec())
                        .unwrap_or_default();
                    let fields = ty
                        .as_ref()
                        .map(|ty| ty.fields.clone())
                        .unwrap_or_default()
                        .into_iter()
                        .map(|f| {
                            let value = t.properties.get(&f.name).map(render_value).unwrap_or_else(|| "-".to_string());
                            let problem = field_errors.iter().find(|e| e.field == f.name).map(|e| e.message.clone());
                            let invalid = problem.is_some();
                            view! {
                                <tr class:invalid=invalid>
                                    <th>{f.name.clone()}</th>
                                    <td>{value} {problem.map(|m| view! { <span class="field-error">{m}</span> })}</td>
                                </tr>
                            }
                        })
                        .collect_view();

                    let upcoming = t
                        .recurrence
                        .as_ref()
                        .map(|r| {
                            let now = Utc::now();
                            r.occurrences(t.start, t.end, now, now + Duration::days(UPCOMING_HORIZON_DAYS), UPCOMING)
                        })
                        .unwrap_or_default();
                    let upcoming_view = (!upcoming.is_empty()).then(|| view! {
                        <h3>"Upcoming"</h3>
                        <ul class="occurrences">
                            {upcoming.into_iter().map(|o| view! { <li>{format_span(o.start, o.end)}</li> }).collect_view()}
                        </ul>
                    });

                    let children = hierarchy::children(&store.tickets().read(), t.id);
                    let children_view = (!children.is_empty()).then(|| view! {
                        <h3>"Children"</h3>
                        <ul class="children">
                            {children.into_iter().map(|c| {
                                let cid = c.id;
                                view! {
                                    <li on:click=move |_| store.selected().set(Some(cid))>{c.title}</li>
                                }
                            }).collect_view()}
                        </ul>
                    });

                    let can_confirm = !t.in_pool && t.status == TicketStatus::PastUntouched;
                    let in_pool = t.in_pool;
                    let id = t.id;
                    let for_confirm = t.clone();
                    let for_pool = t.clone();

                    view! {
                        <div class="details-card" style=format!("--ticket-color: {};", color)>
                            <header>
                                <h2>{t.title.clone()}</h2>
                                <span class=status_class>{t.status.as_str()}</span>
                            </header>
                            <div class="details-meta">
                                <span class="type-chip">{type_name}</span>
                                <span class="details-span">{span}</span>
                            </div>
                            {description.map(|html| view! { <div class="markdown-body" inner_html=html /> })}
                            <table class="details-fields">{fields}</table>
                            {upcoming_view}
                            {children_view}
                            <div class="details-actions">
                                <Show when=move || can_confirm>
                                    <button on:click={let t = for_confirm.clone(); move |_| confirm(t.clone())}>"Confirm"</button>
                                </Show>
                                <Show when=move || !in_pool>
                                    <button on:click={let t = for_pool.clone(); move |_| send_to_pool(t.clone())}>"Send to pool"</button>
                                </Show>
                                <DeleteConfirmButton
                                    button_class="danger"
                                    prompt="Delete ticket and its children?"
                                    on_confirm=Callback::new(move |_| delete(id))
                                />
                            </div>
                        </div>
                    }.into_any()
                }
            }}
        </aside>
    }
}
