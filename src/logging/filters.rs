use tracing_subscriber::EnvFilter;

use super::config::LoggingConfig;

/// Собирает фильтр событий.
///
/// `RUST_LOG` имеет приоритет над конфигурацией. Некорректная директива из
/// конфигурации заменяется на `info`.
pub fn build_filter(config: &LoggingConfig) -> EnvFilter {
    if let Ok(env_filter) = EnvFilter::try_from_default_env() {
        return env_filter;
    }
    build_filter_from_directive(&config.build_filter_directive())
}

fn build_filter_from_directive(directive: &str) -> EnvFilter {
    match EnvFilter::try_new(directive) {
        Ok(filter) => filter,
        Err(e) => {
            // Подписчика ещё нет, поэтому пишем напрямую в stderr
            eprintln!("Invalid log filter directive '{directive}': {e}; falling back to 'info'");
            EnvFilter::new("info")
        }
    }
}
