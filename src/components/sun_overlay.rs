//! Sun Overlay Component
//!
//! Shades night over the lanes.

use leptos::prelude::*;
use ticket_core::DateRange;
use timeline_engine::TimeScale;

#[component]
pub fn SunOverlay(bands: Memo<Vec<DateRange>>, scale: ReadSignal<TimeScale>) -> impl IntoView {
    view! {
        <div class="sun-overlay">
            {move || {
                let scale = scale.get();
                bands
                    .get()
                    .into_iter()
                    .map(|band| {
                        let left = scale.time_to_x(band.start);
                        let width = scale.width_of(band.duration());
                        view! { <div class="night-band" style=format!("left: {}px; width: {}px;", left, width) /> }
                    })
                    .collect_view()
            }}
        </div>
    }
}
