//! Logger setup and the fatal severity
//!
//! Everything logs through the `log` facade. Messages that precede the end
//! of a run are logged with [`fatal!`](crate::fatal), which is an error
//! under the `tickwork::fatal` target so it can be filtered separately.

use env_logger::{Builder, Env};

use crate::config::{ConfigError, LoggingConfig};

/// Log target used by [`fatal!`](crate::fatal).
pub const FATAL_TARGET: &str = "tickwork::fatal";

/// Logs at error level under the fatal target.
#[macro_export]
macro_rules! fatal {
    ($($arg:tt)+) => {
        ::log::error!(target: $crate::logging::FATAL_TARGET, $($arg)+)
    };
}

#[derive(Debug, thiserror::Error)]
pub enum LoggingError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("a logger is already installed")]
    AlreadyInstalled(#[from] log::SetLoggerError),
}

/// Installs the process logger. `RUST_LOG`, when set, overrides the
/// configured level.
pub fn init(config: &LoggingConfig) -> Result<(), LoggingError> {
    config.level_filter()?;
    Builder::from_env(Env::default().default_filter_or(config.level.as_str()))
        .format_timestamp_millis()
        .try_init()?;
    Ok(())
}

/// Logger for tests; output is captured per test and repeat calls are
/// ignored.
pub fn init_for_tests() {
    let _ = Builder::from_env(Env::default().default_filter_or("debug"))
        .is_test(true)
        .try_init();
}
