//! Time Axis Component
//!
//! Major and minor ticks above the lanes, scrolled horizontally with them.

use leptos::prelude::*;
use timeline_engine::{Marker, MarkerKind};

#[component]
pub fn TimeAxis(markers: Memo<Vec<Marker>>, scroll_x: Signal<f64>) -> impl IntoView {
    view! {
        <div class="time-axis">
            <div class="time-axis-track" style=move || format!("transform: translateX({}px);", -scroll_x.get())>
                <For
                    each=move || markers.get()
                    key=|m| (m.time, m.x.to_bits())
                    children=move |marker| {
                        let class = match marker.kind {
                            MarkerKind::Major => "tick major",
                            MarkerKind::Minor => "tick minor",
                        };
                        view! {
                            <div class=class style=format!("left: {}px;", marker.x)>
                                <span class="tick-label">{marker.label}</span>
                            </div>
                        }
                    }
                />
            </div>
        </div>
    }
}
