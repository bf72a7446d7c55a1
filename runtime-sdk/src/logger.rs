//! Logging.
use once_cell::sync::OnceCell;
use slog::{o, Discard, Logger};

static ROOT_LOGGER: OnceCell<Logger> = OnceCell::new();

/// Install the process-wide root logger.
///
/// Returns `false` if a root logger has already been installed or used.
pub fn init(root: Logger) -> bool {
    ROOT_LOGGER.set(root).is_ok()
}

/// Get a logger for the given module.
///
/// Until a root logger is installed all records are discarded.
pub fn get_logger(module: &'static str) -> Logger {
    ROOT_LOGGER
        .get_or_init(|| Logger::root(Discard, o!()))
        .new(o!("module" => module))
}
