//! Настройка `tracing`-подписчика для бинарей и тестов.
//!
//! Библиотека сама подписчика не ставит, она только эмитит события.

pub mod config;
mod filters;
mod formatter;

pub use config::{LogFormat, LoggingConfig, LoggingError};
pub use filters::build_filter;
pub use formatter::build_formatter;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Инициализация логирования с конфигурацией. События пишутся в stderr,
/// stdout остаётся для данных.
pub fn init_logging(config: &LoggingConfig) -> Result<(), LoggingError> {
    config.validate()?;

    let env_filter = build_filter(config);
    let formatter = build_formatter(config, std::io::stderr);

    tracing_subscriber::registry()
        .with(env_filter)
        .with(formatter)
        .try_init()
        .map_err(|e| LoggingError::Install(e.to_string()))?;

    tracing::info!(
        version = env!("CARGO_PKG_VERSION"),
        log_level = %config.level,
        format = %config.format,
        "Logging system initialized"
    );

    Ok(())
}
