//! Structured logging and tracing for Orrery bodies.
//!
//! Console output with uptime timestamps and module paths, plus JSON file
//! logging in debug builds. The configured `debug.log_level` is the default
//! filter; `RUST_LOG` overrides it.

use std::fs::File;
use std::path::Path;

use orrery_config::Config;
use tracing_subscriber::util::{SubscriberInitExt, TryInitError};
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt};

/// Filter used when neither `RUST_LOG` nor the config provide one.
pub const DEFAULT_FILTER: &str = "info,orrery_body=info,orrery_lod=info";

/// Name of the JSON log file written in debug builds.
pub const LOG_FILE_NAME: &str = "orrery.log";

/// Resolve the filter string from an optional config.
pub fn filter_string(config: Option<&Config>) -> String {
    match config {
        Some(config) if !config.debug.log_level.is_empty() => config.debug.log_level.clone(),
        _ => DEFAULT_FILTER.to_string(),
    }
}

/// Filter for the subscriber: `RUST_LOG` if set, otherwise [`filter_string`].
pub fn env_filter(config: Option<&Config>) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter_string(config)))
}

/// Create `log_dir` and the JSON log file inside it.
///
/// Returns `None` outside debug builds or when the file cannot be created;
/// file logging is optional and never stops initialization.
pub fn open_log_file(log_dir: Option<&Path>, debug_build: bool) -> Option<File> {
    let log_dir = log_dir.filter(|_| debug_build)?;
    std::fs::create_dir_all(log_dir).ok()?;
    File::create(log_dir.join(LOG_FILE_NAME)).ok()
}

/// Install the global tracing subscriber.
///
/// Console events carry uptime, target, thread name and level. In debug
/// builds with a `log_dir`, events are also written as JSON lines to
/// [`LOG_FILE_NAME`]. Fails if a global subscriber is already installed.
///
/// ```no_run
/// use orrery_config::Config;
/// use orrery_log::init_logging;
///
/// let config = Config::default();
/// init_logging(Some(std::path::Path::new("./logs")), true, Some(&config)).ok();
/// ```
pub fn init_logging(
    log_dir: Option<&Path>,
    debug_build: bool,
    config: Option<&Config>,
) -> Result<(), TryInitError> {
    let console = fmt::layer()
        .with_timer(fmt::time::uptime())
        .with_target(true)
        .with_thread_names(true)
        .with_level(true);

    let json_file = open_log_file(log_dir, debug_build).map(|file| {
        fmt::layer()
            .json()
            .with_timer(fmt::time::uptime())
            .with_target(true)
            .with_ansi(false)
            .with_writer(file)
    });

    tracing_subscriber::registry()
        .with(env_filter(config))
        .with(console)
        .with(json_file)
        .try_init()
}

/// `EnvFilter` built from [`DEFAULT_FILTER`].
pub fn default_env_filter() -> EnvFilter {
    EnvFilter::new(DEFAULT_FILTER)
}
