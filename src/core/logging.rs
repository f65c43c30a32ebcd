//! Logging setup: every event goes to the console and to the run's log file.

use std::fs::File;
use std::path::Path;
use std::sync::Mutex;
use tracing_subscriber::{
    fmt::{self, time::ChronoLocal},
    layer::SubscriberExt,
    util::SubscriberInitExt,
    EnvFilter,
};

use super::error::{BatchSigCheckError, Result};

const TIME_FORMAT: &str = "[%Y-%m-%d %H:%M:%S]";

/// Install the global subscriber, writing INFO and above to stderr and to
/// `log_path`. `RUST_LOG` overrides the level.
pub fn init_logging(log_path: &Path) -> Result<()> {
    let file = File::create(log_path).map_err(|e| BatchSigCheckError::io(log_path, e))?;

    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    let console_layer = fmt::layer()
        .with_timer(ChronoLocal::new(TIME_FORMAT.to_string()))
        .with_target(false)
        .with_writer(std::io::stderr);

    let file_layer = fmt::layer()
        .with_timer(ChronoLocal::new(TIME_FORMAT.to_string()))
        .with_target(false)
        .with_ansi(false)
        .with_writer(Mutex::new(file));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(console_layer)
        .with(file_layer)
        .try_init()
        .map_err(|e| BatchSigCheckError::Config(format!("logging already initialised: {}", e)))
}
