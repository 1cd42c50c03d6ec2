use crate::config::{Config, LogLevel};
use tracing_subscriber::{filter, fmt::format, prelude::*, reload};

fn level(log_level: &LogLevel) -> (filter::LevelFilter, &'static str) {
    match log_level {
        LogLevel::Trace => (filter::LevelFilter::TRACE, "trace"),
        LogLevel::Debug => (filter::LevelFilter::DEBUG, "debug"),
        LogLevel::Info  => (filter::LevelFilter::INFO, "info"),
        LogLevel::Warn  => (filter::LevelFilter::WARN, "warn"),
        LogLevel::Error => (filter::LevelFilter::ERROR, "error"),
    }
}

/// Installs the global subscriber. Events go to stderr so reports printed to
/// stdout stay clean. `RUST_LOG`, when set, replaces the crate-scoped filter.
pub fn setup_trace(config: &Config) {
    let (level_filter, level_str) = level(&config.log_level);
    let crate_name = env!("CARGO_CRATE_NAME");
    let env_filter = filter::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| filter::EnvFilter::new(format!("{crate_name}={level_str}")));

    let (level_filter, _reload_handle) = reload::Layer::new(level_filter);
    let time_format = time::macros::format_description!(
        "[hour]:[minute]:[second].[subsecond digits:5]"
    );
    let time_offset = time::UtcOffset::current_local_offset()
        .unwrap_or(time::UtcOffset::UTC);
    let timer = tracing_subscriber::fmt::time::OffsetTime::new(time_offset, time_format);
    let formatted_layer = tracing_subscriber::fmt::layer()
        .event_format(format().compact())
        .with_timer(timer)
        .with_writer(std::io::stderr);
    tracing_subscriber::registry()
        .with(level_filter)
        .with(env_filter)
        .with(formatted_layer)
        .init();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_level_strings_match_filters() {
        for log_level in [LogLevel::Trace, LogLevel::Debug, LogLevel::Info, LogLevel::Warn, LogLevel::Error] {
            let (filter, name) = level(&log_level);
            assert!(filter.to_string().eq_ignore_ascii_case(name));
        }
    }
}
