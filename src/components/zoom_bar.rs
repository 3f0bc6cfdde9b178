//! Zoom Bar Component
//!
//! Zoom presets and a jump back to now.

use leptos::prelude::*;
use timeline_engine::ZoomPreset;

use crate::clock::format_local;
use crate::context::{AppContext, TimelineContext};

#[component]
pub fn ZoomBar() -> impl IntoView {
    let ctx = use_context::<AppContext>().expect("AppContext should be provided");
    let tl = use_context::<TimelineContext>().expect("TimelineContext should be provided");

    // Closest preset to the current zoom, for highlighting
    let active = Memo::new(move |_| {
        let ppm = tl.scale.get().pixels_per_minute;
        ZoomPreset::ALL.into_iter().min_by(|a, b| {
            let da = (a.pixels_per_minute().ln() - ppm.ln()).abs();
            let db = (b.pixels_per_minute().ln() - ppm.ln()).abs();
            da.total_cmp(&db)
        })
    });

    view! {
        <div class="zoom-bar">
            {ZoomPreset::ALL.into_iter().map(|preset| {
                view! {
                    <button
                        class=move || if active.get() == Some(preset) { "zoom-btn active" } else { "zoom-btn" }
                        on:click=move |_| tl.zoom_to(preset, &ctx.config.get_untracked())
                    >
                        {preset.label()}
                    </button>
                }
            }).collect_view()}
            <button class="today-btn" on:click=move |_| tl.center_on(ctx.now.get_untracked().at)>
                "Now"
            </button>
            <span class="clock">{move || format_local(ctx.now.get().at, "%a %d %b %H:%M")}</span>
        </div>
    }
}
