//! Console Logging
//!
//! Routes the `log` facade to the browser console. Library crates log with
//! `[TAG] message` prefixes, which are kept as they are.

use log::{Level, LevelFilter, Log, Metadata, Record};

struct ConsoleLogger;

static LOGGER: ConsoleLogger = ConsoleLogger;

impl Log for ConsoleLogger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        metadata.level() <= log::max_level()
    }

    fn log(&self, record: &Record) {
        if !self.enabled(record.metadata()) {
            return;
        }
        let line = format!("{}", record.args()).into();
        match record.level() {
            Level::Error => web_sys::console::error_1(&line),
            Level::Warn => web_sys::console::warn_1(&line),
            Level::Info => web_sys::console::info_1(&line),
            Level::Debug | Level::Trace => web_sys::console::log_1(&line),
        }
    }

    fn flush(&self) {}
}

/// Install the console logger. Debug builds log at debug level; a
/// `log_level` entry in localStorage overrides either.
pub fn init() {
    let default = if cfg!(debug_assertions) { LevelFilter::Debug } else { LevelFilter::Info };
    let level = crate::storage::read_key("log_level")
        .and_then(|raw| raw.parse::<LevelFilter>().ok())
        .unwrap_or(default);

    if log::set_logger(&LOGGER).is_ok() {
        log::set_max_level(level);
    }
}
