#![deny(missing_docs)]
//! Log macros for the sync client crates.
//!
//! The core, the engine and the console all log through `sync_*!` so the
//! backend (simplelog in the console, the test logger here) is chosen once by
//! the host. Dropped frames and stale attempts go to `debug`/`trace`;
//! reconnects and failed hydrations go to `warn`.

/// Per-frame detail such as reconciliations that left a cache unchanged.
#[macro_export]
macro_rules! sync_trace {
    ($($arg:tt)*) => {{
        log::trace!($($arg)*);
    }};
}

/// Lifecycle milestones: hydration counts, engine start and stop.
#[macro_export]
macro_rules! sync_info {
    ($($arg:tt)*) => {{
        log::info!($($arg)*);
    }};
}

/// Diagnostics: debug tap entries, stale attempts, released caches.
#[macro_export]
macro_rules! sync_debug {
    ($($arg:tt)*) => {{
        log::debug!($($arg)*);
    }};
}

/// Recoverable trouble: transport drops, rejected payloads, failed requests.
#[macro_export]
macro_rules! sync_warn {
    ($($arg:tt)*) => {{
        log::warn!($($arg)*);
    }};
}

/// Failures the host should surface.
#[macro_export]
macro_rules! sync_error {
    ($($arg:tt)*) => {{
        log::error!($($arg)*);
    }};
}

/// Installs a stderr logger for tests. Later calls, or a logger installed by
/// another test in the same binary, leave the first one in place.
pub fn initialize_for_tests() {
    use simplelog::{ColorChoice, CombinedLogger, Config, TermLogger, TerminalMode};

    // Trace in debug builds so dropped frames show up while a test runs.
    let level = if cfg!(debug_assertions) {
        log::LevelFilter::Trace
    } else {
        log::LevelFilter::Info
    };

    let _ = CombinedLogger::init(vec![TermLogger::new(
        level,
        Config::default(),
        TerminalMode::Mixed,
        ColorChoice::Auto,
    )]);
}
