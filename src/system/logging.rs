//! Stderr logging for the CLI.
//!
//! Installs a compact logger on the `log` facade so that all
//! `log::info!()`, `log::warn!()` and `log::error!()` calls across the
//! pipeline end up on stderr with a timestamp and level tag. Diagnostic
//! output stays on stderr; stdout is reserved for machine-consumable
//! output such as the build listing.

use chrono::Local;
use log::{LevelFilter, Metadata, Record};

struct StderrLogger;

impl log::Log for StderrLogger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        metadata.level() <= log::max_level()
    }

    fn log(&self, record: &Record) {
        if !self.enabled(record.metadata()) {
            return;
        }
        eprintln!(
            "{} [{:<5}] {}",
            Local::now().format("%H:%M:%S%.3f"),
            record.level(),
            record.args()
        );
    }

    fn flush(&self) {}
}

/// Wire the stderr logger as the global logger for the `log` crate.
///
/// Must be called once, before any pipeline step runs. A second call is a
/// no-op (the facade rejects re-registration), which keeps test runs safe.
pub fn initialize_logging(verbose: bool) {
    let level = if verbose {
        LevelFilter::Debug
    } else {
        LevelFilter::Info
    };

    if log::set_boxed_logger(Box::new(StderrLogger)).is_ok() {
        log::set_max_level(level);
    }
}
