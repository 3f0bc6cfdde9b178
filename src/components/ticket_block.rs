//! Ticket Block Component
//!
//! One ticket on the timeline. Pointer handling lives on the surface, so
//! the block only renders position, colour and state.

use leptos::prelude::*;
use timeline_engine::TicketBox;

#[component]
pub fn TicketBlock(
    ticket_box: TicketBox,
    title: String,
    color: Option<String>,
    #[prop(into)] selected: Signal<bool>,
    #[prop(default = false)] dragging: bool,
) -> impl IntoView {
    let status = ticket_box.status.as_str().to_lowercase().replace('_', "-");
    let class = move || {
        let mut c = format!("ticket-block status-{}", status);
        if selected.get() { c.push_str(" selected"); }
        if dragging { c.push_str(" dragging"); }
        c
    };
    let mut style = format!(
        "left: {}px; top: {}px; width: {}px; height: {}px;",
        ticket_box.x,
        ticket_box.y,
        ticket_box.width.max(2.0),
        ticket_box.height
    );
    if let Some(color) = color {
        style.push_str(&format!(" --ticket-color: {};", color));
    }

    let title_attr = title.clone();
    view! {
        <div class=class style=style title=title_attr>
            <div class="handle handle-start" />
            <span class="ticket-title">{title}</span>
            <div class="handle handle-end" />
        </div>
    }
}
