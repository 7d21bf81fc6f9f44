//! Tracing setup for the binary. Logs go to stderr so command output on
//! stdout stays clean.

use shared::config::{LogFormat, LoggingConfig};
use tracing::level_filters::LevelFilter;
use tracing_subscriber::{EnvFilter, fmt};

/// Install the global subscriber. `RUST_LOG` wins over the configured level.
pub fn initialize_tracing(logging: &LoggingConfig) {
    let env_filter = build_env_filter(logging);

    let fmt_builder = fmt::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_level(true)
        .with_thread_ids(false)
        .with_thread_names(false);

    if matches!(logging.format, LogFormat::Json) {
        fmt_builder.json().with_ansi(false).init();
    } else {
        fmt_builder.with_ansi(true).init();
    }
}

fn default_level(logging: &LoggingConfig) -> LevelFilter {
    logging.level.parse::<LevelFilter>().unwrap_or(LevelFilter::INFO)
}

fn build_env_filter(logging: &LoggingConfig) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::builder()
            .with_default_directive(default_level(logging).into())
            .from_env_lossy()
    })
}
