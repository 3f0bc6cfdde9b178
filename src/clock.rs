//! Local Time Helpers
//!
//! Formatting in the browser's time zone. `chrono::Local` asks the JS
//! `Date` for the offset at each instant, so labels stay right across
//! daylight-saving changes.

use chrono::{DateTime, Local, Utc};

pub fn format_local(time: DateTime<Utc>, format: &str) -> String {
    time.with_timezone(&Local).format(format).to_string()
}

/// "Mon 03 Jun 09:30 – 10:15"
pub fn format_span(start: DateTime<Utc>, end: DateTime<Utc>) -> String {
    let (start, end) = (start.with_timezone(&Local), end.with_timezone(&Local));
    if start.date_naive() == end.date_naive() {
        format!("{} – {}", start.format("%a %d %b %H:%M"), end.format("%H:%M"))
    } else {
        format!("{} – {}", start.format("%a %d %b %H:%M"), end.format("%a %d %b %H:%M"))
    }
}
